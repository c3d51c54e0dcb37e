//! Cron-driven background indexing
//!
//! Jobs are executed by tokio-cron-scheduler. The indexing jobs go through
//! [`IndexSynchronizer::run`](crate::indexing::IndexSynchronizer::run), so a tick
//! that lands while another run is active is skipped rather than queued.
//!
//! # Example
//!
//! ```no_run
//! use cms_search::scheduler::{SchedulerConfig, SchedulerService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut scheduler = SchedulerService::new(SchedulerConfig::default()).await?;
//!     scheduler.start().await?;
//!
//!     tokio::time::sleep(tokio::time::Duration::from_secs(60)).await;
//!
//!     scheduler.shutdown().await?;
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod jobs;
mod metrics;
mod tasks;

pub use config::{JobConfig, JobsConfig, SchedulerConfig, SchedulerConfigBuilder};
pub use core::{SchedulerService, SchedulerStats};
pub use error::{SchedulerError, SchedulerResult};
pub use jobs::{Job, JobId, JobMetadata, JobStatus};
pub use metrics::{init_scheduler_metrics, SCHEDULER_METRICS};
pub use tasks::{indexing_jobs, run_full_rebuild, run_incremental_indexing};
