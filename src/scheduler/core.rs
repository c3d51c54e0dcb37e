//! Core scheduler service implementation

use super::{
    config::SchedulerConfig,
    error::{SchedulerError, SchedulerResult},
    jobs::{Job, JobId, JobMetadata, JobStatus},
    metrics::SCHEDULER_METRICS,
};
use dashmap::DashMap;
use std::sync::Arc;
use tokio_cron_scheduler::{JobScheduler, JobSchedulerError};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

struct ScheduledJob {
    job: Arc<Job>,
    cron_id: Uuid,
}

/// Main scheduler service that manages all scheduled jobs
pub struct SchedulerService {
    config: SchedulerConfig,

    /// Underlying tokio-cron-scheduler instance
    scheduler: JobScheduler,

    jobs: Arc<DashMap<JobId, ScheduledJob>>,

    running: Arc<tokio::sync::RwLock<bool>>,
}

impl SchedulerService {
    /// Create a new scheduler service
    pub async fn new(config: SchedulerConfig) -> SchedulerResult<Self> {
        info!("Initializing scheduler service");

        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| SchedulerError::StartupFailed(e.to_string()))?;

        Ok(Self {
            config,
            scheduler,
            jobs: Arc::new(DashMap::new()),
            running: Arc::new(tokio::sync::RwLock::new(false)),
        })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Start the scheduler
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if !self.config.enabled {
            info!("Scheduler is disabled in configuration");
            return Ok(());
        }

        {
            let mut running = self.running.write().await;
            if *running {
                warn!("Scheduler is already running");
                return Ok(());
            }
            *running = true;
        }

        info!(jobs = self.jobs.len(), "Starting scheduler service");

        self.scheduler
            .start()
            .await
            .map_err(|e| SchedulerError::StartupFailed(e.to_string()))?;

        Ok(())
    }

    /// Stop the scheduler
    pub async fn shutdown(&mut self) -> SchedulerResult<()> {
        {
            let mut running = self.running.write().await;
            if !*running {
                debug!("Scheduler is not running");
                return Ok(());
            }
            *running = false;
        }

        info!("Shutting down scheduler service");

        self.scheduler
            .shutdown()
            .await
            .map_err(|e| SchedulerError::ShutdownFailed(e.to_string()))?;

        Ok(())
    }

    /// Add a new job to the scheduler
    pub async fn add_job(&self, job: Job) -> SchedulerResult<JobId> {
        let metadata = job.get_metadata().await;
        let job_id = metadata.id;
        let job_name = metadata.name.clone();

        let job = Arc::new(job);
        let scheduled = job.clone();
        let cron_job =
            tokio_cron_scheduler::Job::new_async(metadata.schedule.as_str(), move |_uuid, _l| {
                let job = scheduled.clone();
                Box::pin(async move {
                    let job_name = job.get_metadata().await.name;
                    debug!(job_id = %job_id, job_name = %job_name, "Executing scheduled job");

                    SCHEDULER_METRICS.record_execution_start(&job_name);
                    let start = std::time::Instant::now();
                    let result = job.execute().await;
                    let duration = start.elapsed();
                    SCHEDULER_METRICS.record_execution_complete(
                        &job_name,
                        result.is_ok(),
                        duration.as_secs_f64(),
                    );

                    match result {
                        Ok(()) => debug!(
                            job_id = %job_id,
                            job_name = %job_name,
                            duration_ms = duration.as_millis() as u64,
                            "Job executed successfully"
                        ),
                        Err(e) => error!(
                            job_id = %job_id,
                            job_name = %job_name,
                            error = %e,
                            duration_ms = duration.as_millis() as u64,
                            "Job execution failed"
                        ),
                    }
                })
            })
            .map_err(|e: JobSchedulerError| SchedulerError::JobCreationFailed(e.to_string()))?;

        let cron_id = self
            .scheduler
            .add(cron_job)
            .await
            .map_err(|e| SchedulerError::JobCreationFailed(e.to_string()))?;

        self.jobs.insert(job_id, ScheduledJob { job, cron_id });
        SCHEDULER_METRICS.update_job_count("scheduled", self.jobs.len() as f64);

        info!(job_id = %job_id, job_name = %job_name, schedule = %metadata.schedule, "Job added");

        Ok(job_id)
    }

    /// Remove a job from the scheduler
    pub async fn remove_job(&self, job_id: &JobId) -> SchedulerResult<()> {
        let (_, scheduled) = self
            .jobs
            .remove(job_id)
            .ok_or_else(|| SchedulerError::JobNotFound(job_id.to_string()))?;

        self.scheduler.remove(&scheduled.cron_id).await?;
        SCHEDULER_METRICS.update_job_count("scheduled", self.jobs.len() as f64);

        info!(job_id = %job_id, "Job removed");

        Ok(())
    }

    pub async fn get_job_metadata(&self, job_id: &JobId) -> SchedulerResult<JobMetadata> {
        let job = self
            .jobs
            .get(job_id)
            .map(|entry| entry.job.clone())
            .ok_or_else(|| SchedulerError::JobNotFound(job_id.to_string()))?;

        Ok(job.get_metadata().await)
    }

    pub async fn list_jobs(&self) -> Vec<JobMetadata> {
        let jobs: Vec<Arc<Job>> = self.jobs.iter().map(|entry| entry.job.clone()).collect();

        let mut metadata = Vec::with_capacity(jobs.len());
        for job in jobs {
            metadata.push(job.get_metadata().await);
        }
        metadata.sort_by(|a, b| a.name.cmp(&b.name));
        metadata
    }

    pub async fn get_stats(&self) -> SchedulerStats {
        let jobs = self.list_jobs().await;

        let total_executions: u64 = jobs.iter().map(|j| j.run_count).sum();
        let total_successes: u64 = jobs.iter().map(|j| j.success_count).sum();
        let total_failures: u64 = jobs.iter().map(|j| j.failure_count).sum();

        let success_rate = if total_executions > 0 {
            (total_successes as f64 / total_executions as f64) * 100.0
        } else {
            0.0
        };

        SchedulerStats {
            total_jobs: jobs.len(),
            running_jobs: jobs.iter().filter(|j| j.status == JobStatus::Running).count(),
            total_executions,
            total_successes,
            total_failures,
            success_rate,
        }
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }
}

/// Statistics about the scheduler
#[derive(Debug, Clone, serde::Serialize)]
pub struct SchedulerStats {
    pub total_jobs: usize,
    pub running_jobs: usize,
    pub total_executions: u64,
    pub total_successes: u64,
    pub total_failures: u64,
    pub success_rate: f64,
}
