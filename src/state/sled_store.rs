use crate::error::{AppError, Result};
use crate::models::{ActionRecord, ContentChange, FacetIntersection, Field, IndexerAction};
use crate::state::SearchStore;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use sled::Db;
use std::path::Path;
use std::sync::Arc;

/// Persistent store using the Sled embedded database.
///
/// Keys are big-endian ids so tree iteration follows insertion order.
#[derive(Clone)]
pub struct SledStore {
    db: Arc<Db>,
    fields_tree: sled::Tree,
    intersections_tree: sled::Tree,
    actions_tree: sled::Tree,
}

impl SledStore {
    /// Create a new Sled store at the specified path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path.as_ref())
            .map_err(|e| AppError::Database(format!("Failed to open Sled database: {}", e)))?;

        let fields_tree = db.open_tree("fields")?;
        let intersections_tree = db.open_tree("intersections")?;
        let actions_tree = db.open_tree("actions")?;

        tracing::info!("Initialized Sled store at {:?}", path.as_ref());

        Ok(Self {
            db: Arc::new(db),
            fields_tree,
            intersections_tree,
            actions_tree,
        })
    }

    fn key(id: u64) -> [u8; 8] {
        id.to_be_bytes()
    }

    fn next_id(&self) -> Result<u64> {
        Ok(self.db.generate_id()? + 1)
    }

    fn put<T: Serialize>(tree: &sled::Tree, id: u64, value: &T) -> Result<()> {
        let bytes = bincode::serialize(value)?;
        tree.insert(Self::key(id), bytes)?;
        tree.flush()?;
        Ok(())
    }

    fn get<T: DeserializeOwned>(tree: &sled::Tree, id: u64) -> Result<Option<T>> {
        match tree.get(Self::key(id))? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn scan<T: DeserializeOwned>(tree: &sled::Tree) -> Result<Vec<T>> {
        tree.iter()
            .values()
            .map(|value| -> Result<T> {
                let bytes = value?;
                Ok(bincode::deserialize(&bytes)?)
            })
            .collect()
    }

    fn remove(tree: &sled::Tree, id: u64, what: &str) -> Result<()> {
        match tree.remove(Self::key(id))? {
            Some(_) => {
                tree.flush()?;
                Ok(())
            }
            None => Err(AppError::NotFound(format!("{} {} not found", what, id))),
        }
    }

    /// Flush pending writes to disk
    pub async fn flush(&self) -> Result<()> {
        self.db
            .flush_async()
            .await
            .map_err(|e| AppError::Database(format!("Failed to flush database: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl SearchStore for SledStore {
    async fn list_fields(&self) -> Result<Vec<Field>> {
        Self::scan(&self.fields_tree)
    }

    async fn get_field(&self, id: u64) -> Result<Option<Field>> {
        Self::get(&self.fields_tree, id)
    }

    async fn create_field(&self, field: &Field) -> Result<Field> {
        let mut created = field.clone();
        created.id = self.next_id()?;
        Self::put(&self.fields_tree, created.id, &created)?;
        tracing::debug!(field_id = created.id, name = %created.name, "Field saved to Sled");
        Ok(created)
    }

    async fn update_field(&self, field: &Field) -> Result<()> {
        if !self.fields_tree.contains_key(Self::key(field.id))? {
            return Err(AppError::NotFound(format!("Field {} not found", field.id)));
        }
        Self::put(&self.fields_tree, field.id, field)
    }

    async fn delete_field(&self, id: u64) -> Result<()> {
        Self::remove(&self.fields_tree, id, "Field")
    }

    async fn list_intersections(&self) -> Result<Vec<FacetIntersection>> {
        Self::scan(&self.intersections_tree)
    }

    async fn create_intersection(&self, intersection: &FacetIntersection) -> Result<FacetIntersection> {
        let mut created = *intersection;
        created.id = self.next_id()?;
        Self::put(&self.intersections_tree, created.id, &created)?;
        Ok(created)
    }

    async fn delete_intersection(&self, id: u64) -> Result<()> {
        Self::remove(&self.intersections_tree, id, "Facet intersection")
    }

    async fn append_action(&self, change: &ContentChange) -> Result<IndexerAction> {
        let action = IndexerAction {
            id: self.next_id()?,
            document_id: change.document_id.clone(),
            task: change.task,
            resource_type: change.resource_type.clone(),
            portlet: change.portlet,
        };
        Self::put(&self.actions_tree, action.id, &ActionRecord::from(&action))?;
        tracing::debug!(action_id = action.id, document_id = %action.document_id, "Action saved to Sled");
        Ok(action)
    }

    async fn list_actions(&self) -> Result<Vec<IndexerAction>> {
        let records: Vec<ActionRecord> = Self::scan(&self.actions_tree)?;
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
        Self::remove(&self.actions_tree, id, "Action")
    }

    async fn truncate_actions(&self) -> Result<u64> {
        let count = self.actions_tree.len() as u64;
        self.actions_tree.clear()?;
        self.actions_tree.flush()?;
        Ok(count)
    }
}
