//! Shared fixtures: a recording engine, scriptable indexers and metric parsing helpers

#![allow(dead_code)]

use async_trait::async_trait;
use cms_search::engine::{
    EngineDocument, EngineError, EngineQuery, EngineResponse, EngineResult, SearchEngine,
};
use cms_search::indexing::{DocumentBatch, Indexer, IndexingError, IndexingResult};
use cms_search::models::{Document, Field};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// One call received by [`MockEngine`]
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Query(EngineQuery),
    Add(Vec<EngineDocument>),
    DeleteByQuery(String),
    Commit,
    Optimize,
}

/// In-process engine that records every call.
///
/// Queries return scripted responses first, then a default response whose
/// `numFound` is [`MockEngine::set_num_found`].
#[derive(Default)]
pub struct MockEngine {
    calls: Mutex<Vec<EngineCall>>,
    responses: Mutex<VecDeque<EngineResponse>>,
    num_found: AtomicU64,
    fail_queries: AtomicBool,
    fail_deletes: AtomicBool,
    fail_adds_for: Mutex<HashSet<String>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine whose site probe reports existing documents, so incremental runs stay incremental
    pub fn populated() -> Self {
        let engine = Self::new();
        engine.set_num_found(10);
        engine
    }

    pub fn set_num_found(&self, count: u64) {
        self.num_found.store(count, Ordering::SeqCst);
    }

    pub fn push_response(&self, body: Value) {
        let response = serde_json::from_value(body).expect("scripted engine response");
        self.responses.lock().push_back(response);
    }

    pub fn fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Reject any add carrying a document with this engine uid
    pub fn fail_add_for(&self, uid: impl Into<String>) {
        self.fail_adds_for.lock().insert(uid.into());
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().clone()
    }

    pub fn queries(&self) -> Vec<EngineQuery> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::Query(query) => Some(query),
                _ => None,
            })
            .collect()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::DeleteByQuery(query) => Some(query),
                _ => None,
            })
            .collect()
    }

    /// Engine uids of every document added, in order
    pub fn added_uids(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::Add(docs) => Some(docs),
                _ => None,
            })
            .flatten()
            .filter_map(|doc| doc.get("uid").and_then(Value::as_str).map(str::to_string))
            .collect()
    }

    pub fn count(&self, expected: &EngineCall) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| std::mem::discriminant(*call) == std::mem::discriminant(expected))
            .count()
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().push(call);
    }

    fn unavailable() -> EngineError {
        EngineError::Transport("connection refused".to_string())
    }
}

#[async_trait]
impl SearchEngine for MockEngine {
    async fn query(&self, query: &EngineQuery) -> EngineResult<EngineResponse> {
        self.record(EngineCall::Query(query.clone()));
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }

        if let Some(response) = self.responses.lock().pop_front() {
            return Ok(response);
        }

        let body = json!({
            "response": { "numFound": self.num_found.load(Ordering::SeqCst), "start": 0, "docs": [] }
        });
        serde_json::from_value(body).map_err(|e| EngineError::Decode(e.to_string()))
    }

    async fn add(&self, documents: Vec<EngineDocument>) -> EngineResult<()> {
        let rejected = {
            let fail_for = self.fail_adds_for.lock();
            documents.iter().any(|doc| {
                doc.get("uid")
                    .and_then(Value::as_str)
                    .is_some_and(|uid| fail_for.contains(uid))
            })
        };
        if rejected {
            return Err(EngineError::Status {
                status: 400,
                message: "document rejected".to_string(),
            });
        }

        self.record(EngineCall::Add(documents));
        Ok(())
    }

    async fn delete_by_query(&self, query: &str) -> EngineResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.record(EngineCall::DeleteByQuery(query.to_string()));
        Ok(())
    }

    async fn commit(&self) -> EngineResult<()> {
        self.record(EngineCall::Commit);
        Ok(())
    }

    async fn optimize(&self) -> EngineResult<()> {
        self.record(EngineCall::Optimize);
        Ok(())
    }
}

/// Indexer serving documents from memory.
///
/// `resource_uid` yields `<id>_<TYPE>`, and documents are keyed by content id.
pub struct TestIndexer {
    name: String,
    resource_types: Vec<String>,
    enabled: bool,
    documents: Mutex<HashMap<String, Vec<Document>>>,
    failing: Mutex<HashSet<String>>,
    fail_rebuild: AtomicBool,
    batch_errors: Mutex<Vec<String>>,
    fields: Vec<Field>,
    pub rebuilds: AtomicUsize,
    pub delay: Mutex<Option<std::time::Duration>>,
}

impl TestIndexer {
    pub fn new(name: &str, resource_type: &str) -> Self {
        Self {
            name: name.to_string(),
            resource_types: vec![resource_type.to_string()],
            enabled: true,
            documents: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            fail_rebuild: AtomicBool::new(false),
            batch_errors: Mutex::new(Vec::new()),
            fields: Vec::new(),
            rebuilds: AtomicUsize::new(0),
            delay: Mutex::new(None),
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn with_fields(mut self, fields: Vec<Field>) -> Self {
        self.fields = fields;
        self
    }

    /// Serve a document for `document_id`; its uid follows `resource_uid`
    pub fn with_document(self, document_id: &str, title: &str) -> Self {
        let resource_type = self.resource_types[0].clone();
        let document = Document::new(self.resource_uid(document_id, &resource_type), resource_type)
            .with_title(title);
        self.documents
            .lock()
            .entry(document_id.to_string())
            .or_default()
            .push(document);
        self
    }

    pub fn with_documents(self, document_id: &str, documents: Vec<Document>) -> Self {
        self.documents
            .lock()
            .entry(document_id.to_string())
            .or_default()
            .extend(documents);
        self
    }

    /// Make `get_documents` fail for this content id
    pub fn fail_on(&self, document_id: &str) {
        self.failing.lock().insert(document_id.to_string());
    }

    pub fn fail_rebuild(&self) {
        self.fail_rebuild.store(true, Ordering::SeqCst);
    }

    /// Report a per-item failure alongside the rebuilt documents
    pub fn report_batch_error(&self, message: &str) {
        self.batch_errors.lock().push(message.to_string());
    }

    pub fn slow(self, delay: std::time::Duration) -> Self {
        *self.delay.lock() = Some(delay);
        self
    }
}

#[async_trait]
impl Indexer for TestIndexer {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        "1.0"
    }

    fn description(&self) -> &str {
        "In-memory test indexer"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn index_documents(&self) -> IndexingResult<DocumentBatch> {
        self.rebuilds.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_rebuild.load(Ordering::SeqCst) {
            return Err(IndexingError::Extraction(format!("{} backend offline", self.name)));
        }

        let mut documents: Vec<(String, Vec<Document>)> = self
            .documents
            .lock()
            .iter()
            .map(|(id, docs)| (id.clone(), docs.clone()))
            .collect();
        documents.sort_by(|a, b| a.0.cmp(&b.0));

        let batch = DocumentBatch::new(documents.into_iter().flat_map(|(_, docs)| docs).collect());
        Ok(self
            .batch_errors
            .lock()
            .iter()
            .fold(batch, |batch, message| batch.with_error(message.clone())))
    }

    async fn get_documents(&self, document_id: &str) -> IndexingResult<Vec<Document>> {
        if self.failing.lock().contains(document_id) {
            return Err(IndexingError::Extraction(format!(
                "cannot extract {}",
                document_id
            )));
        }
        Ok(self
            .documents
            .lock()
            .get(document_id)
            .cloned()
            .unwrap_or_default())
    }

    fn resource_names(&self) -> Vec<String> {
        self.resource_types.clone()
    }

    fn resource_uid(&self, resource_id: &str, resource_type: &str) -> String {
        format!("{}_{}", resource_id, resource_type.to_uppercase())
    }

    fn additional_fields(&self) -> Vec<Field> {
        self.fields.clone()
    }
}

/// Parse Prometheus exposition text into metric name → lines
pub fn parse_prometheus_output(output: &str) -> HashMap<String, Vec<String>> {
    let mut metrics = HashMap::new();
    let mut current_metric = String::new();

    for line in output.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if line.starts_with("# HELP") || line.starts_with("# TYPE") {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 3 {
                current_metric = parts[2].to_string();
                metrics
                    .entry(current_metric.clone())
                    .or_insert_with(Vec::new)
                    .push(line.to_string());
            }
        } else if !line.starts_with('#') && !current_metric.is_empty() {
            metrics
                .entry(current_metric.clone())
                .or_insert_with(Vec::new)
                .push(line.to_string());
        }
    }

    metrics
}
