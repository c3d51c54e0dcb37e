//! Field registry: cached catalog of searchable attributes

use crate::error::Result;
use crate::models::Field;
use crate::state::SearchStore;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

/// Immutable view of the field set at one point in time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSnapshot {
    fields: Vec<Field>,
}

impl FieldSnapshot {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Case-insensitive lookup by engine name
    pub fn find(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name_matches(name))
    }

    pub fn find_by_id(&self, id: u64) -> Option<&Field> {
        self.fields.iter().find(|field| field.id == id)
    }

    /// Fields with faceting available and switched on, in catalog order
    pub fn facet_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|field| field.is_facet_enabled())
    }

    pub fn facet_fields_by_name(&self) -> HashMap<String, Field> {
        self.facet_fields()
            .map(|field| (field.name.clone(), field.clone()))
            .collect()
    }

    pub fn sort_fields(&self) -> Vec<&Field> {
        self.fields.iter().filter(|field| field.is_sort_enabled()).collect()
    }

    pub fn default_sort(&self) -> Option<&Field> {
        self.fields.iter().find(|field| field.default_sort)
    }

    /// Lower-cased names, for set comparisons
    pub fn names(&self) -> BTreeSet<String> {
        self.fields
            .iter()
            .map(|field| field.name.to_ascii_lowercase())
            .collect()
    }
}

/// Read-mostly cache of the persisted fields.
///
/// Readers take an `Arc` to the current snapshot; `reload` builds a complete
/// replacement before swapping it in, so a reader never observes a partial
/// field set. Writes to the store are not visible until the next reload.
pub struct FieldRegistry {
    store: Arc<dyn SearchStore>,
    current: RwLock<Arc<FieldSnapshot>>,
}

impl FieldRegistry {
    /// Load the registry from the store
    pub async fn load(store: Arc<dyn SearchStore>) -> Result<Self> {
        let registry = Self {
            store,
            current: RwLock::new(Arc::new(FieldSnapshot::default())),
        };
        registry.reload().await?;
        Ok(registry)
    }

    pub fn snapshot(&self) -> Arc<FieldSnapshot> {
        self.current.read().clone()
    }

    pub fn field_list(&self) -> Vec<Field> {
        self.snapshot().fields().to_vec()
    }

    pub fn facet_fields_by_name(&self) -> HashMap<String, Field> {
        self.snapshot().facet_fields_by_name()
    }

    pub fn sort_fields(&self) -> Vec<Field> {
        self.snapshot().sort_fields().into_iter().cloned().collect()
    }

    pub fn default_sort(&self) -> Option<Field> {
        self.snapshot().default_sort().cloned()
    }

    /// Re-read every field from the store and publish the new snapshot
    pub async fn reload(&self) -> Result<Arc<FieldSnapshot>> {
        let snapshot = Arc::new(FieldSnapshot::new(self.store.list_fields().await?));
        *self.current.write() = snapshot.clone();
        debug!(fields = snapshot.fields().len(), "Field registry reloaded");
        Ok(snapshot)
    }

    /// Persist externally declared fields whose name is not already known.
    ///
    /// Matching is case-insensitive and the existing field always wins, so
    /// applying the same candidates repeatedly never creates duplicates.
    /// Returns the number of fields created.
    pub async fn update_fields(&self, candidates: &[Field]) -> Result<usize> {
        let mut known: BTreeSet<String> = self
            .store
            .list_fields()
            .await?
            .iter()
            .map(|field| field.name.to_ascii_lowercase())
            .collect();

        let mut created = 0;
        for candidate in candidates {
            if !known.insert(candidate.name.to_ascii_lowercase()) {
                continue;
            }
            let mut field = candidate.clone();
            field.id = 0;
            self.store.create_field(&field).await?;
            created += 1;
        }

        if created > 0 {
            info!(created = created, "Registered additional fields");
        }
        self.reload().await?;
        Ok(created)
    }
}
