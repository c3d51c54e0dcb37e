//! Prometheus metrics for the scheduler module

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge_vec, register_histogram_vec, CounterVec, GaugeVec,
    HistogramVec,
};

/// Scheduler metrics collection
pub struct SchedulerMetrics {
    /// Number of scheduled jobs
    pub jobs_total: GaugeVec,

    /// Job executions by outcome
    pub executions_total: CounterVec,

    /// Job execution duration in seconds
    pub execution_duration: HistogramVec,

    /// Number of currently running jobs
    pub running_jobs: GaugeVec,

    /// Last execution timestamp (Unix timestamp)
    pub last_execution: GaugeVec,
}

impl SchedulerMetrics {
    pub fn new() -> Self {
        Self {
            jobs_total: register_gauge_vec!(
                "cms_search_scheduler_jobs_total",
                "Total number of scheduled jobs",
                &["status"]
            )
            .expect("Failed to register scheduler_jobs_total"),

            executions_total: register_counter_vec!(
                "cms_search_scheduler_executions_total",
                "Total number of job executions",
                &["job_name", "outcome"]
            )
            .expect("Failed to register scheduler_executions_total"),

            execution_duration: register_histogram_vec!(
                "cms_search_scheduler_execution_duration_seconds",
                "Job execution duration in seconds",
                &["job_name"],
                vec![0.01, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0, 900.0, 3600.0]
            )
            .expect("Failed to register scheduler_execution_duration_seconds"),

            running_jobs: register_gauge_vec!(
                "cms_search_scheduler_running_jobs",
                "Number of currently running jobs",
                &["job_name"]
            )
            .expect("Failed to register scheduler_running_jobs"),

            last_execution: register_gauge_vec!(
                "cms_search_scheduler_last_execution_timestamp",
                "Unix timestamp of last job execution",
                &["job_name"]
            )
            .expect("Failed to register scheduler_last_execution_timestamp"),
        }
    }

    /// Record job execution start
    pub fn record_execution_start(&self, job_name: &str) {
        self.running_jobs.with_label_values(&[job_name]).inc();
    }

    /// Record job execution completion
    pub fn record_execution_complete(&self, job_name: &str, success: bool, duration_secs: f64) {
        self.running_jobs.with_label_values(&[job_name]).dec();

        let outcome = if success { "success" } else { "failure" };
        self.executions_total
            .with_label_values(&[job_name, outcome])
            .inc();

        self.execution_duration
            .with_label_values(&[job_name])
            .observe(duration_secs);

        self.last_execution
            .with_label_values(&[job_name])
            .set(chrono::Utc::now().timestamp() as f64);
    }

    /// Update job count by status
    pub fn update_job_count(&self, status: &str, count: f64) {
        self.jobs_total.with_label_values(&[status]).set(count);
    }
}

impl Default for SchedulerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static! {
    /// Global scheduler metrics instance
    pub static ref SCHEDULER_METRICS: SchedulerMetrics = SchedulerMetrics::new();
}

/// Initialize scheduler metrics (idempotent)
pub fn init_scheduler_metrics() {
    lazy_static::initialize(&SCHEDULER_METRICS);
}
