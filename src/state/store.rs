use crate::error::{AppError, Result};
use crate::models::{ActionRecord, ContentChange, FacetIntersection, Field, IndexerAction};
use crate::state::SearchStore;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// In-memory store (for development and testing)
#[derive(Clone, Default)]
pub struct InMemoryStore {
    fields: Arc<DashMap<u64, Field>>,
    intersections: Arc<DashMap<u64, FacetIntersection>>,
    actions: Arc<DashMap<u64, ActionRecord>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl SearchStore for InMemoryStore {
    async fn list_fields(&self) -> Result<Vec<Field>> {
        let mut fields: Vec<Field> = self.fields.iter().map(|entry| entry.value().clone()).collect();
        fields.sort_by_key(|field| field.id);
        Ok(fields)
    }

    async fn get_field(&self, id: u64) -> Result<Option<Field>> {
        Ok(self.fields.get(&id).map(|entry| entry.clone()))
    }

    async fn create_field(&self, field: &Field) -> Result<Field> {
        let mut created = field.clone();
        created.id = self.allocate_id();
        self.fields.insert(created.id, created.clone());
        tracing::debug!(field_id = created.id, name = %created.name, "Field created");
        Ok(created)
    }

    async fn update_field(&self, field: &Field) -> Result<()> {
        match self.fields.get_mut(&field.id) {
            Some(mut entry) => {
                *entry = field.clone();
                tracing::debug!(field_id = field.id, "Field updated");
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Field {} not found", field.id))),
        }
    }

    async fn delete_field(&self, id: u64) -> Result<()> {
        self.fields
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Field {} not found", id)))
    }

    async fn list_intersections(&self) -> Result<Vec<FacetIntersection>> {
        let mut intersections: Vec<FacetIntersection> =
            self.intersections.iter().map(|entry| *entry.value()).collect();
        intersections.sort_by_key(|intersection| intersection.id);
        Ok(intersections)
    }

    async fn create_intersection(&self, intersection: &FacetIntersection) -> Result<FacetIntersection> {
        let mut created = *intersection;
        created.id = self.allocate_id();
        self.intersections.insert(created.id, created);
        Ok(created)
    }

    async fn delete_intersection(&self, id: u64) -> Result<()> {
        self.intersections
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Facet intersection {} not found", id)))
    }

    async fn append_action(&self, change: &ContentChange) -> Result<IndexerAction> {
        let action = IndexerAction {
            id: self.allocate_id(),
            document_id: change.document_id.clone(),
            task: change.task,
            resource_type: change.resource_type.clone(),
            portlet: change.portlet,
        };
        self.actions.insert(action.id, ActionRecord::from(&action));
        Ok(action)
    }

    async fn list_actions(&self) -> Result<Vec<IndexerAction>> {
        let mut records: Vec<ActionRecord> =
            self.actions.iter().map(|entry| entry.value().clone()).collect();
        records.sort_by_key(|record| record.id);

        Ok(records
            .into_iter()
            .filter_map(|record| match IndexerAction::try_from(record) {
                Ok(action) => Some(action),
                Err(e) => {
                    tracing::error!(error = %e, "Skipping unreadable action record");
                    None
                }
            })
            .collect())
    }

    async fn delete_action(&self, id: u64) -> Result<()> {
        self.actions
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Action {} not found", id)))
    }

    async fn truncate_actions(&self) -> Result<u64> {
        let count = self.actions.len() as u64;
        self.actions.clear();
        Ok(count)
    }
}
