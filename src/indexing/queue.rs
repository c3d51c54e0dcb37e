//! Durable queue of pending content mutations

use crate::error::{AppError, Result};
use crate::models::{ContentChange, IndexerAction};
use crate::state::SearchStore;
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

/// Pending index mutations, backed by the store's action log.
///
/// Entries are only ever appended by producers and removed by the
/// synchronizer once applied; nothing rewrites an entry in place.
#[derive(Clone)]
pub struct ActionQueue {
    store: Arc<dyn SearchStore>,
}

impl ActionQueue {
    pub fn new(store: Arc<dyn SearchStore>) -> Self {
        Self { store }
    }

    /// Record a content change reported by a producer
    pub async fn notify(&self, change: &ContentChange) -> Result<IndexerAction> {
        change
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let action = self.store.append_action(change).await?;
        debug!(
            action_id = action.id,
            document_id = %action.document_id,
            task = %action.task,
            resource_type = %action.resource_type,
            portlet = %action.portlet,
            "Content change queued"
        );
        Ok(action)
    }

    /// Pending actions in insertion order
    pub async fn pending(&self) -> Result<Vec<IndexerAction>> {
        self.store.list_actions().await
    }

    /// Remove an action after its index mutation succeeded
    pub async fn complete(&self, action_id: u64) -> Result<()> {
        self.store.delete_action(action_id).await
    }

    /// Drop every pending action
    pub async fn truncate(&self) -> Result<u64> {
        let removed = self.store.truncate_actions().await?;
        info!(removed = removed, "Action queue truncated");
        Ok(removed)
    }
}
