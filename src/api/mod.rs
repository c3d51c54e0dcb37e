pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::indexing::{ActionQueue, IndexSynchronizer};
use crate::registry::Registries;
use crate::search::SearchService;
use crate::state::SearchStore;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SearchStore>,
    pub registries: Arc<Registries>,
    pub search: Arc<SearchService>,
    pub synchronizer: Arc<IndexSynchronizer>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        store: Arc<dyn SearchStore>,
        registries: Arc<Registries>,
        search: Arc<SearchService>,
        synchronizer: Arc<IndexSynchronizer>,
    ) -> Self {
        Self {
            store,
            registries,
            search,
            synchronizer,
            started_at: Instant::now(),
        }
    }

    pub fn queue(&self) -> &ActionQueue {
        self.synchronizer.queue()
    }
}
