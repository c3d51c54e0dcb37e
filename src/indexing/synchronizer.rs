//! Replays queued content changes against the engine

use crate::config::IndexingConfig;
use crate::engine::{escape_query_chars, EngineQuery, SearchEngine};
use crate::indexing::error::{IndexingError, IndexingResult};
use crate::indexing::indexer::{Indexer, IndexerRegistry};
use crate::indexing::queue::ActionQueue;
use crate::indexing::run::{RunGuard, RunHandle, RunMode, RunReport, RunTracker};
use crate::metrics::{
    ERRORS_TOTAL, INDEXING_ACTIONS_TOTAL, INDEXING_DOCUMENTS_WRITTEN_TOTAL,
    INDEXING_RUNS_TOTAL, INDEXING_RUN_DURATION_SECONDS,
};
use crate::models::document::fields;
use crate::models::{document_portlet_id, site_uid, IndexerAction, PortletScope, TaskType};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Drives full rebuilds and incremental drains of the action queue.
///
/// Runs are single-flight: the scheduled job and on-demand triggers share one
/// [`RunTracker`], and a run requested while another is active fails with
/// [`IndexingError::AlreadyRunning`].
pub struct IndexSynchronizer {
    engine: Arc<dyn SearchEngine>,
    queue: ActionQueue,
    indexers: Arc<IndexerRegistry>,
    site: String,
    config: IndexingConfig,
    runs: RunTracker,
}

impl IndexSynchronizer {
    pub fn new(
        engine: Arc<dyn SearchEngine>,
        queue: ActionQueue,
        indexers: Arc<IndexerRegistry>,
        site: impl Into<String>,
        config: IndexingConfig,
    ) -> Self {
        Self {
            engine,
            queue,
            indexers,
            site: site.into(),
            config,
            runs: RunTracker::new(),
        }
    }

    pub fn queue(&self) -> &ActionQueue {
        &self.queue
    }

    pub fn indexers(&self) -> &IndexerRegistry {
        &self.indexers
    }

    pub fn runs(&self) -> &RunTracker {
        &self.runs
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    /// Run to completion on the current task
    pub async fn run(&self, mode: RunMode) -> IndexingResult<RunReport> {
        let guard = self.runs.try_start(mode)?;
        Ok(self.execute(guard).await)
    }

    /// Start a run in the background and return its handle immediately
    pub fn spawn(self: &Arc<Self>, mode: RunMode) -> IndexingResult<Arc<RunHandle>> {
        let guard = self.runs.try_start(mode)?;
        let handle = guard.handle().clone();
        let synchronizer = Arc::clone(self);

        tokio::spawn(async move {
            synchronizer.execute(guard).await;
        });

        Ok(handle)
    }

    async fn execute(&self, guard: RunGuard) -> RunReport {
        let handle = guard.handle().clone();
        let start = Instant::now();
        let mut report = RunReport::new(handle.mode());

        info!(run_id = %handle.id(), mode = %handle.mode(), site = %self.site, "Indexing run started");
        handle.append(format!("Indexing started ({}) at {}", handle.mode(), report.started_at));

        let outcome = self.execute_mode(&handle, &mut report).await;
        let outcome = match outcome {
            Ok(()) => self.finalize().await,
            Err(e) => Err(e),
        };

        report.duration_ms = start.elapsed().as_millis() as u64;
        report.finished_at = Some(Utc::now());

        let mode_label = report.mode.to_string();
        match outcome {
            Ok(()) => {
                info!(
                    run_id = %handle.id(),
                    mode = %report.mode,
                    applied = report.actions_applied,
                    failed = report.actions_failed,
                    skipped = report.actions_skipped,
                    documents = report.documents_written,
                    duration_ms = report.duration_ms,
                    "Indexing run completed"
                );
                INDEXING_RUNS_TOTAL.with_label_values(&[&mode_label, "completed"]).inc();
            }
            Err(e) => {
                error!(
                    run_id = %handle.id(),
                    mode = %report.mode,
                    applied = report.actions_applied,
                    failed = report.actions_failed,
                    error = %e,
                    "Indexing run failed"
                );
                handle.append(format!("Indexing failed: {}", e));
                report.failure = Some(e.to_string());
                INDEXING_RUNS_TOTAL.with_label_values(&[&mode_label, "failed"]).inc();
                ERRORS_TOTAL.with_label_values(&["indexing", "run_failed"]).inc();
            }
        }

        INDEXING_RUN_DURATION_SECONDS
            .with_label_values(&[&mode_label])
            .observe(start.elapsed().as_secs_f64());
        handle.append(format!("Indexing took {} ms", report.duration_ms));

        handle.complete(report.clone());
        drop(guard);
        report
    }

    async fn execute_mode(&self, handle: &RunHandle, report: &mut RunReport) -> IndexingResult<()> {
        match handle.mode() {
            RunMode::Full => self.full(handle, report).await,
            RunMode::Incremental => {
                if self.config.auto_full_rebuild && self.site_is_empty().await? {
                    info!(site = %self.site, "No documents indexed for site, switching to full rebuild");
                    handle.append("Index is empty, running a full rebuild instead");
                    report.mode = RunMode::Full;
                    self.full(handle, report).await
                } else {
                    self.incremental(handle, report).await
                }
            }
        }
    }

    async fn site_is_empty(&self) -> IndexingResult<bool> {
        let mut probe = EngineQuery::new(format!(
            "{}:\"{}\"",
            fields::SITE,
            self.site.replace('"', "\\\"")
        ));
        probe.set_rows(0);
        Ok(self.engine.query(&probe).await?.num_found() == 0)
    }

    async fn finalize(&self) -> IndexingResult<()> {
        self.engine.commit().await?;
        self.engine.optimize().await?;
        Ok(())
    }

    async fn full(&self, handle: &RunHandle, report: &mut RunReport) -> IndexingResult<()> {
        let site_query = format!("{}:{}_*", fields::UID, escape_query_chars(&self.site));
        self.engine.delete_by_query(&site_query).await?;
        handle.append(format!("Removed every document of site {}", self.site));

        for indexer in self.indexers.enabled() {
            self.rebuild(indexer.as_ref(), handle, report).await;
        }

        report.actions_truncated = self.queue.truncate().await?;
        Ok(())
    }

    /// Write everything one indexer produces; failures are recorded, not raised
    async fn rebuild(&self, indexer: &dyn Indexer, handle: &RunHandle, report: &mut RunReport) {
        handle.append(format!("Indexer {} {} starting", indexer.name(), indexer.version()));

        let batch = match indexer.index_documents().await {
            Ok(batch) => batch,
            Err(e) => {
                error!(indexer = %indexer.name(), error = %e, "Indexer failed to produce documents");
                self.record_error(handle, report, format!("{}: {}", indexer.name(), e));
                return;
            }
        };

        for message in batch.errors {
            warn!(indexer = %indexer.name(), error = %message, "Indexer reported an error");
            self.record_error(handle, report, format!("{}: {}", indexer.name(), message));
        }

        let count = batch.documents.len();
        let documents = batch
            .documents
            .iter()
            .map(|doc| doc.to_engine_document(&self.site))
            .collect();

        match self.engine.add(documents).await {
            Ok(()) => {
                report.documents_written += count;
                INDEXING_DOCUMENTS_WRITTEN_TOTAL.inc_by(count as u64);
                handle.append(format!("Indexer {}: {} documents written", indexer.name(), count));
            }
            Err(e) => {
                error!(indexer = %indexer.name(), error = %e, "Failed to write documents");
                self.record_error(handle, report, format!("{}: {}", indexer.name(), e));
            }
        }
    }

    async fn incremental(&self, handle: &RunHandle, report: &mut RunReport) -> IndexingResult<()> {
        let actions = self.queue.pending().await?;
        handle.append(format!("{} pending actions", actions.len()));

        for action in &actions {
            let task = action.task.to_string();

            let Some(indexer) = self.indexers.for_resource(&action.resource_type) else {
                let e = IndexingError::UnknownResourceType(action.resource_type.clone());
                warn!(action_id = action.id, resource_type = %action.resource_type, "Action left pending");
                self.record_error(handle, report, format!("Action {}: {}", action.id, e));
                report.actions_skipped += 1;
                INDEXING_ACTIONS_TOTAL.with_label_values(&[&task, "skipped"]).inc();
                continue;
            };

            let applied = match self.apply(indexer.as_ref(), action).await {
                Ok(written) => self.queue.complete(action.id).await.map(|()| written).map_err(IndexingError::from),
                Err(e) => Err(e),
            };

            match applied {
                Ok(written) => {
                    report.actions_applied += 1;
                    report.documents_written += written;
                    INDEXING_ACTIONS_TOTAL.with_label_values(&[&task, "applied"]).inc();
                }
                Err(e) => {
                    error!(
                        indexer = %indexer.name(),
                        action_id = action.id,
                        document_id = %action.document_id,
                        task = %action.task,
                        error = %e,
                        "Failed to apply indexer action"
                    );
                    self.record_error(
                        handle,
                        report,
                        format!("Indexer {} action {}: {}", indexer.name(), action.id, e),
                    );
                    report.actions_failed += 1;
                    INDEXING_ACTIONS_TOTAL.with_label_values(&[&task, "failed"]).inc();
                }
            }
        }

        handle.append(format!(
            "{} actions applied, {} failed, {} skipped",
            report.actions_applied, report.actions_failed, report.actions_skipped
        ));

        // Pages change without emitting actions, so they are always re-indexed
        match self.indexers.by_name(&self.config.page_indexer) {
            Some(pages) if pages.is_enabled() => self.rebuild(pages.as_ref(), handle, report).await,
            _ => {}
        }

        Ok(())
    }

    /// Apply one action, returning the number of documents written
    async fn apply(&self, indexer: &dyn Indexer, action: &IndexerAction) -> IndexingResult<usize> {
        match action.task {
            TaskType::Delete => {
                let query = match action.portlet {
                    PortletScope::Portlet(portlet_id) => format!(
                        "{}:\"{}\"",
                        fields::DOCUMENT_PORTLET_ID,
                        document_portlet_id(&action.document_id, portlet_id)
                    ),
                    PortletScope::All => {
                        let uid = indexer.resource_uid(&action.document_id, &action.resource_type);
                        format!("{}:{}*", fields::UID, escape_query_chars(&site_uid(&self.site, &uid)))
                    }
                };
                self.engine.delete_by_query(&query).await?;
                if self.config.commit_per_document {
                    self.engine.commit().await?;
                }
                Ok(0)
            }
            TaskType::Create | TaskType::Modify => {
                let documents = indexer.get_documents(&action.document_id).await?;
                let mut written = 0;

                for document in documents
                    .iter()
                    .filter(|doc| action.covers(doc.document_portlet_id.as_deref()))
                {
                    self.engine
                        .add(vec![document.to_engine_document(&self.site)])
                        .await?;
                    if self.config.commit_per_document {
                        self.engine.commit().await?;
                    }
                    written += 1;
                    INDEXING_DOCUMENTS_WRITTEN_TOTAL.inc();
                }

                Ok(written)
            }
        }
    }

    fn record_error(&self, handle: &RunHandle, report: &mut RunReport, message: String) {
        handle.append(&message);
        report.errors.push(message);
    }
}
