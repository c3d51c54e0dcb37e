//! In-memory catalogs consulted by the query builder and result aggregator

mod fields;
mod intersections;

pub use fields::{FieldRegistry, FieldSnapshot};
pub use intersections::IntersectionRegistry;

use crate::error::Result;
use crate::models::FacetPair;
use crate::state::SearchStore;
use std::sync::Arc;

/// Both registries, loaded together and reloaded together
pub struct Registries {
    pub fields: FieldRegistry,
    pub intersections: IntersectionRegistry,
}

impl Registries {
    pub async fn load(store: Arc<dyn SearchStore>) -> Result<Self> {
        let fields = FieldRegistry::load(store.clone()).await?;
        let intersections = IntersectionRegistry::load(store, &fields.snapshot()).await?;
        Ok(Self {
            fields,
            intersections,
        })
    }

    /// Reload fields, then re-resolve intersections against the new field set
    pub async fn reload(&self) -> Result<()> {
        let fields = self.fields.reload().await?;
        self.intersections.reload(&fields).await?;
        Ok(())
    }

    /// Consistent pair of snapshots for one query
    pub fn snapshot(&self) -> (Arc<FieldSnapshot>, Arc<Vec<FacetPair>>) {
        (self.fields.snapshot(), self.intersections.intersections())
    }
}
