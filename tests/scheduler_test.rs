//! Scheduler service and indexing job tests

mod common;

use common::{EngineCall, MockEngine, TestIndexer};
use cms_search::config::IndexingConfig;
use cms_search::indexing::{ActionQueue, IndexSynchronizer, IndexerRegistry, RunMode};
use cms_search::models::{ContentChange, TaskType};
use cms_search::scheduler::{
    indexing_jobs, Job, JobMetadata, SchedulerConfig, SchedulerConfigBuilder,
    SchedulerError, SchedulerService,
};
use cms_search::state::create_in_memory_store;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn synchronizer(engine: Arc<MockEngine>, indexer: TestIndexer) -> Arc<IndexSynchronizer> {
    Arc::new(IndexSynchronizer::new(
        engine,
        ActionQueue::new(create_in_memory_store()),
        Arc::new(IndexerRegistry::new().with(Arc::new(indexer))),
        "intranet",
        IndexingConfig::default(),
    ))
}

fn counting_job(name: &str, counter: Arc<AtomicUsize>) -> Job {
    Job::new(JobMetadata::new(name, "0 0 * * * *"), move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    })
}

#[tokio::test]
async fn test_scheduler_start_stop() {
    let mut scheduler = SchedulerService::new(SchedulerConfig::default())
        .await
        .unwrap();

    scheduler.start().await.unwrap();
    assert!(scheduler.is_running().await);

    scheduler.shutdown().await.unwrap();
    assert!(!scheduler.is_running().await);
}

#[tokio::test]
async fn test_disabled_scheduler_does_not_start() {
    let config = SchedulerConfigBuilder::new().enabled(false).build();
    let mut scheduler = SchedulerService::new(config).await.unwrap();

    scheduler.start().await.unwrap();

    assert!(!scheduler.is_running().await);
}

#[tokio::test]
async fn test_add_list_and_remove_jobs() {
    let scheduler = SchedulerService::new(SchedulerConfig::default())
        .await
        .unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    let second = scheduler
        .add_job(counting_job("second", counter.clone()))
        .await
        .unwrap();
    scheduler
        .add_job(counting_job("first", counter.clone()))
        .await
        .unwrap();

    let names: Vec<String> = scheduler.list_jobs().await.into_iter().map(|j| j.name).collect();
    assert_eq!(names, vec!["first", "second"]);
    assert_eq!(scheduler.get_job_metadata(&second).await.unwrap().name, "second");

    scheduler.remove_job(&second).await.unwrap();
    assert_eq!(scheduler.list_jobs().await.len(), 1);
    assert!(matches!(
        scheduler.remove_job(&second).await,
        Err(SchedulerError::JobNotFound(_))
    ));
}

#[tokio::test]
async fn test_invalid_cron_expression_is_rejected() {
    let scheduler = SchedulerService::new(SchedulerConfig::default())
        .await
        .unwrap();
    let job = Job::new(JobMetadata::new("broken", "every tuesday"), || async { Ok(()) });

    assert!(matches!(
        scheduler.add_job(job).await,
        Err(SchedulerError::JobCreationFailed(_))
    ));
}

#[tokio::test]
async fn test_indexing_jobs_follow_config() {
    let sync = synchronizer(Arc::new(MockEngine::populated()), TestIndexer::new("Docs", "DOCUMENT"));

    let defaults = SchedulerConfig::default();
    let jobs = indexing_jobs(&defaults.jobs, sync.clone());
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].get_metadata().await.name, "incremental_indexing");

    let config = SchedulerConfigBuilder::new()
        .incremental_enabled(false)
        .full_rebuild_schedule("0 0 4 * * *")
        .build();
    let jobs = indexing_jobs(&config.jobs, sync);
    assert_eq!(jobs.len(), 1);
    let metadata = jobs[0].get_metadata().await;
    assert_eq!(metadata.name, "full_rebuild");
    assert_eq!(metadata.schedule, "0 0 4 * * *");
}

#[tokio::test]
async fn test_incremental_job_drains_queue() {
    let engine = Arc::new(MockEngine::populated());
    let sync = synchronizer(
        engine.clone(),
        TestIndexer::new("Docs", "DOCUMENT").with_document("1", "Annual report"),
    );
    sync.queue()
        .notify(&ContentChange::new("1", TaskType::Create, "DOCUMENT"))
        .await
        .unwrap();

    let jobs = indexing_jobs(&SchedulerConfig::default().jobs, sync.clone());
    jobs[0].execute().await.unwrap();

    assert!(sync.queue().pending().await.unwrap().is_empty());
    assert_eq!(engine.added_uids(), vec!["intranet_1_DOCUMENT"]);
    assert!(engine.count(&EngineCall::Commit) >= 1);
}

#[tokio::test]
async fn test_job_skips_when_run_in_progress() {
    let engine = Arc::new(MockEngine::populated());
    let sync = synchronizer(
        engine,
        TestIndexer::new("Docs", "DOCUMENT")
            .with_document("1", "Annual report")
            .slow(Duration::from_millis(200)),
    );
    let handle = sync.spawn(RunMode::Full).unwrap();

    let jobs = indexing_jobs(&SchedulerConfig::default().jobs, sync.clone());
    assert!(jobs[0].execute().await.is_ok());

    let last = jobs[0].get_metadata().await;
    assert_eq!(last.success_count, 1);
    assert!(handle.wait().await.unwrap().succeeded());
}
