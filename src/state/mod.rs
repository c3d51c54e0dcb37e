pub mod factory;
pub mod sled_store;
pub mod store;

pub use factory::{create_in_memory_store, create_store};
pub use sled_store::SledStore;
pub use store::InMemoryStore;

use crate::error::Result;
use crate::models::{ContentChange, FacetIntersection, Field, IndexerAction};
use async_trait::async_trait;

/// Persistence for search configuration and the indexer action log.
///
/// Plain CRUD; no caching or invalidation happens at this layer.
#[async_trait]
pub trait SearchStore: Send + Sync {
    /// All fields, ordered by id
    async fn list_fields(&self) -> Result<Vec<Field>>;

    async fn get_field(&self, id: u64) -> Result<Option<Field>>;

    /// Persist a new field, returning it with its assigned id
    async fn create_field(&self, field: &Field) -> Result<Field>;

    async fn update_field(&self, field: &Field) -> Result<()>;

    async fn delete_field(&self, id: u64) -> Result<()>;

    /// All facet intersections, ordered by id
    async fn list_intersections(&self) -> Result<Vec<FacetIntersection>>;

    async fn create_intersection(&self, intersection: &FacetIntersection) -> Result<FacetIntersection>;

    async fn delete_intersection(&self, id: u64) -> Result<()>;

    /// Record a content change as a pending action with a fresh monotonic id
    async fn append_action(&self, change: &ContentChange) -> Result<IndexerAction>;

    /// Pending actions in insertion order
    async fn list_actions(&self) -> Result<Vec<IndexerAction>>;

    async fn delete_action(&self, id: u64) -> Result<()>;

    /// Remove every pending action, returning how many were dropped
    async fn truncate_actions(&self) -> Result<u64>;
}
