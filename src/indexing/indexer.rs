//! Indexer plugin contract and registry

use crate::indexing::error::IndexingResult;
use crate::models::{Document, Field};
use async_trait::async_trait;
use std::sync::Arc;

/// Everything an indexer produced during a full rebuild
#[derive(Debug, Default)]
pub struct DocumentBatch {
    pub documents: Vec<Document>,
    /// Per-item failures; the batch is still written
    pub errors: Vec<String>,
}

impl DocumentBatch {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents,
            errors: Vec::new(),
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.errors.push(error.into());
        self
    }
}

/// Content-type integration producing engine documents.
///
/// Implementations own text extraction; the synchronizer owns writing to the
/// engine and the action queue.
#[async_trait]
pub trait Indexer: Send + Sync {
    fn name(&self) -> &str;

    fn version(&self) -> &str;

    fn description(&self) -> &str;

    fn is_enabled(&self) -> bool;

    /// Every document this indexer owns, for a full rebuild
    async fn index_documents(&self) -> IndexingResult<DocumentBatch>;

    /// Documents materialized for one content id, for incremental apply
    async fn get_documents(&self, document_id: &str) -> IndexingResult<Vec<Document>>;

    /// Resource types whose actions are routed here
    fn resource_names(&self) -> Vec<String>;

    /// Engine-side uid of a resource, before site prefixing
    fn resource_uid(&self, resource_id: &str, resource_type: &str) -> String;

    /// Fields contributed to the field registry
    fn additional_fields(&self) -> Vec<Field> {
        Vec::new()
    }
}

/// The indexers known to this process, in registration order
#[derive(Default, Clone)]
pub struct IndexerRegistry {
    indexers: Vec<Arc<dyn Indexer>>,
}

impl IndexerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, indexer: Arc<dyn Indexer>) {
        self.indexers.push(indexer);
    }

    pub fn with(mut self, indexer: Arc<dyn Indexer>) -> Self {
        self.register(indexer);
        self
    }

    pub fn enabled(&self) -> impl Iterator<Item = &Arc<dyn Indexer>> {
        self.indexers.iter().filter(|indexer| indexer.is_enabled())
    }

    pub fn by_name(&self, name: &str) -> Option<&Arc<dyn Indexer>> {
        self.indexers.iter().find(|indexer| indexer.name() == name)
    }

    /// Enabled indexer claiming `resource_type`
    pub fn for_resource(&self, resource_type: &str) -> Option<&Arc<dyn Indexer>> {
        self.enabled().find(|indexer| {
            indexer
                .resource_names()
                .iter()
                .any(|name| name == resource_type)
        })
    }

    /// Fields declared by every registered indexer
    pub fn additional_fields(&self) -> Vec<Field> {
        self.indexers
            .iter()
            .flat_map(|indexer| indexer.additional_fields())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.indexers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        name: &'static str,
        enabled: bool,
        resources: &'static [&'static str],
    }

    #[async_trait]
    impl Indexer for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn version(&self) -> &str {
            "1.0.0"
        }

        fn description(&self) -> &str {
            "fixed"
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }

        async fn index_documents(&self) -> IndexingResult<DocumentBatch> {
            Ok(DocumentBatch::default())
        }

        async fn get_documents(&self, _document_id: &str) -> IndexingResult<Vec<Document>> {
            Ok(Vec::new())
        }

        fn resource_names(&self) -> Vec<String> {
            self.resources.iter().map(|r| r.to_string()).collect()
        }

        fn resource_uid(&self, resource_id: &str, resource_type: &str) -> String {
            format!("{}_{}", resource_id, resource_type)
        }

        fn additional_fields(&self) -> Vec<Field> {
            vec![Field::new(format!("{}_text", self.name))]
        }
    }

    #[test]
    fn test_dispatch_skips_disabled_indexers() {
        let registry = IndexerRegistry::new()
            .with(Arc::new(Fixed {
                name: "legacy",
                enabled: false,
                resources: &["DOCUMENT"],
            }))
            .with(Arc::new(Fixed {
                name: "docs",
                enabled: true,
                resources: &["DOCUMENT", "DOCUMENT_PORTLET"],
            }));

        assert_eq!(registry.for_resource("DOCUMENT_PORTLET").unwrap().name(), "docs");
        assert_eq!(registry.for_resource("DOCUMENT").unwrap().name(), "docs");
        assert!(registry.for_resource("PAGE").is_none());
        assert_eq!(registry.enabled().count(), 1);
        assert_eq!(registry.additional_fields().len(), 2);
    }
}
