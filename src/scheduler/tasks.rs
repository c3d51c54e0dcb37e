//! Scheduled indexing tasks

use super::config::JobsConfig;
use super::jobs::{Job, JobMetadata};
use crate::indexing::{IndexSynchronizer, IndexingError, RunMode};
use std::sync::Arc;
use tracing::{info, warn};

/// Drain the action queue
///
/// Default schedule: every 5 minutes (`0 */5 * * * *`)
pub async fn run_incremental_indexing(synchronizer: Arc<IndexSynchronizer>) -> Result<(), String> {
    run_indexing(synchronizer, RunMode::Incremental).await
}

/// Wipe and rebuild the site index
///
/// Default schedule: disabled; `0 0 3 * * Sun` when switched on
pub async fn run_full_rebuild(synchronizer: Arc<IndexSynchronizer>) -> Result<(), String> {
    run_indexing(synchronizer, RunMode::Full).await
}

async fn run_indexing(synchronizer: Arc<IndexSynchronizer>, mode: RunMode) -> Result<(), String> {
    match synchronizer.run(mode).await {
        Ok(report) => match report.failure {
            Some(failure) => Err(failure),
            None => {
                info!(
                    mode = %report.mode,
                    applied = report.actions_applied,
                    documents = report.documents_written,
                    "Scheduled indexing finished"
                );
                Ok(())
            }
        },
        Err(IndexingError::AlreadyRunning) => {
            warn!(mode = %mode, "Indexing already in progress, skipping scheduled run");
            Ok(())
        }
        Err(e) => Err(e.to_string()),
    }
}

/// Build the enabled indexing jobs
pub fn indexing_jobs(config: &JobsConfig, synchronizer: Arc<IndexSynchronizer>) -> Vec<Job> {
    let mut jobs = Vec::new();

    if config.incremental_indexing.enabled {
        let synchronizer = synchronizer.clone();
        jobs.push(Job::new(
            JobMetadata::new("incremental_indexing", &config.incremental_indexing.schedule)
                .with_description("Apply pending content changes to the search index"),
            move || run_incremental_indexing(synchronizer.clone()),
        ));
    }

    if config.full_rebuild.enabled {
        jobs.push(Job::new(
            JobMetadata::new("full_rebuild", &config.full_rebuild.schedule)
                .with_description("Rebuild every document of the site"),
            move || run_full_rebuild(synchronizer.clone()),
        ));
    }

    jobs
}
