//! Job definitions and management

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for a scheduled job
pub type JobId = Uuid;

/// Status of a scheduled job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Job is scheduled and will run
    Scheduled,
    /// Job is currently running
    Running,
    /// Last run completed successfully
    Completed,
    /// Last run failed
    Failed,
}

/// Metadata about a scheduled job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobMetadata {
    pub id: JobId,

    pub name: String,

    pub description: Option<String>,

    /// Cron expression
    pub schedule: String,

    pub status: JobStatus,

    pub created_at: DateTime<Utc>,

    pub last_run: Option<DateTime<Utc>>,

    pub run_count: u64,

    pub success_count: u64,

    pub failure_count: u64,

    /// Average execution duration in milliseconds
    pub avg_duration_ms: f64,

    /// Error of the last failed run
    pub last_error: Option<String>,
}

impl JobMetadata {
    pub fn new(name: impl Into<String>, schedule: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            schedule: schedule.into(),
            status: JobStatus::Scheduled,
            created_at: Utc::now(),
            last_run: None,
            run_count: 0,
            success_count: 0,
            failure_count: 0,
            avg_duration_ms: 0.0,
            last_error: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn update_execution(&mut self, result: &Result<(), String>, duration_ms: u64) {
        self.run_count += 1;
        match result {
            Ok(()) => self.success_count += 1,
            Err(e) => {
                self.failure_count += 1;
                self.last_error = Some(e.clone());
            }
        }

        // Incremental mean
        self.avg_duration_ms = ((self.avg_duration_ms * (self.run_count - 1) as f64)
            + duration_ms as f64)
            / self.run_count as f64;

        self.last_run = Some(Utc::now());
    }
}

type JobFn = dyn Fn() -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), String>> + Send>>
    + Send
    + Sync;

/// A scheduled job
pub struct Job {
    pub metadata: Arc<tokio::sync::RwLock<JobMetadata>>,

    execute: Arc<JobFn>,
}

impl Job {
    pub fn new<F, Fut>(metadata: JobMetadata, execute: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), String>> + Send + 'static,
    {
        Self {
            metadata: Arc::new(tokio::sync::RwLock::new(metadata)),
            execute: Arc::new(move || Box::pin(execute())),
        }
    }

    pub async fn get_metadata(&self) -> JobMetadata {
        self.metadata.read().await.clone()
    }

    pub async fn execute(&self) -> Result<(), String> {
        let start = std::time::Instant::now();

        self.metadata.write().await.status = JobStatus::Running;

        let result = (self.execute)().await;

        let duration_ms = start.elapsed().as_millis() as u64;
        {
            let mut metadata = self.metadata.write().await;
            metadata.update_execution(&result, duration_ms);
            metadata.status = if result.is_ok() {
                JobStatus::Completed
            } else {
                JobStatus::Failed
            };
        }

        result
    }
}
