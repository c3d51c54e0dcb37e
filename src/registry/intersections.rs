//! Facet intersection registry

use crate::error::Result;
use crate::models::FacetPair;
use crate::registry::FieldSnapshot;
use crate::state::SearchStore;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};

/// Pairs of fields cross-tabulated into two-level facet trees
pub struct IntersectionRegistry {
    store: Arc<dyn SearchStore>,
    current: RwLock<Arc<Vec<FacetPair>>>,
}

impl IntersectionRegistry {
    pub async fn load(store: Arc<dyn SearchStore>, fields: &FieldSnapshot) -> Result<Self> {
        let registry = Self {
            store,
            current: RwLock::new(Arc::new(Vec::new())),
        };
        registry.reload(fields).await?;
        Ok(registry)
    }

    pub fn intersections(&self) -> Arc<Vec<FacetPair>> {
        self.current.read().clone()
    }

    /// Re-read the persisted pairs and resolve their field ids to names.
    ///
    /// Pairs pointing at a field that no longer exists are skipped.
    pub async fn reload(&self, fields: &FieldSnapshot) -> Result<Arc<Vec<FacetPair>>> {
        let mut pairs = Vec::new();
        for intersection in self.store.list_intersections().await? {
            match (
                fields.find_by_id(intersection.field1_id),
                fields.find_by_id(intersection.field2_id),
            ) {
                (Some(field1), Some(field2)) => pairs.push(FacetPair {
                    id: intersection.id,
                    field1: field1.name.clone(),
                    field2: field2.name.clone(),
                }),
                _ => warn!(
                    intersection_id = intersection.id,
                    field1_id = intersection.field1_id,
                    field2_id = intersection.field2_id,
                    "Facet intersection references an unknown field"
                ),
            }
        }

        let pairs = Arc::new(pairs);
        *self.current.write() = pairs.clone();
        debug!(intersections = pairs.len(), "Intersection registry reloaded");
        Ok(pairs)
    }
}
