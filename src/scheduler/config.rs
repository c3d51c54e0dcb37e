//! Configuration for the scheduler module

use serde::{Deserialize, Serialize};

/// Configuration for the scheduler service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Whether the scheduler is enabled
    pub enabled: bool,

    /// Predefined jobs configuration
    pub jobs: JobsConfig,
}

/// Configuration for predefined scheduled jobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    /// Drain the action queue
    pub incremental_indexing: JobConfig,

    /// Rebuild the whole site index
    pub full_rebuild: JobConfig,
}

/// Configuration for a single scheduled job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Whether this job is enabled
    pub enabled: bool,

    /// Cron expression with a leading seconds field
    pub schedule: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            jobs: JobsConfig::default(),
        }
    }
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            incremental_indexing: JobConfig {
                enabled: true,
                schedule: "0 */5 * * * *".to_string(), // Every 5 minutes
            },
            full_rebuild: JobConfig {
                enabled: false,
                schedule: "0 0 3 * * Sun".to_string(), // Weekly on Sunday at 3 AM
            },
        }
    }
}

/// Builder for SchedulerConfig
pub struct SchedulerConfigBuilder {
    config: SchedulerConfig,
}

impl SchedulerConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SchedulerConfig::default(),
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    pub fn incremental_schedule(mut self, schedule: impl Into<String>) -> Self {
        self.config.jobs.incremental_indexing.schedule = schedule.into();
        self
    }

    pub fn incremental_enabled(mut self, enabled: bool) -> Self {
        self.config.jobs.incremental_indexing.enabled = enabled;
        self
    }

    pub fn full_rebuild_schedule(mut self, schedule: impl Into<String>) -> Self {
        self.config.jobs.full_rebuild.schedule = schedule.into();
        self.config.jobs.full_rebuild.enabled = true;
        self
    }

    pub fn build(self) -> SchedulerConfig {
        self.config
    }
}

impl Default for SchedulerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
