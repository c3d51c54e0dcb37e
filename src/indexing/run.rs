//! Single-flight guard and progress handle for indexing runs

use crate::indexing::error::{IndexingError, IndexingResult};
use crate::metrics::INDEXING_RUNNING;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use strum::Display;
use tokio::sync::watch;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunMode {
    /// Wipe the site's documents and re-index everything
    Full,
    /// Drain the action queue
    Incremental,
}

impl RunMode {
    pub fn from_full_flag(full: bool) -> Self {
        if full {
            RunMode::Full
        } else {
            RunMode::Incremental
        }
    }
}

/// Outcome of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Mode actually executed (an incremental run may escalate to full)
    pub mode: RunMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_ms: u64,
    pub actions_applied: usize,
    pub actions_failed: usize,
    pub actions_skipped: usize,
    pub documents_written: usize,
    pub actions_truncated: u64,
    pub errors: Vec<String>,
    /// Set when the run stopped before finishing
    pub failure: Option<String>,
}

impl RunReport {
    pub fn new(mode: RunMode) -> Self {
        Self {
            mode,
            started_at: Utc::now(),
            finished_at: None,
            duration_ms: 0,
            actions_applied: 0,
            actions_failed: 0,
            actions_skipped: 0,
            documents_written: 0,
            actions_truncated: 0,
            errors: Vec::new(),
            failure: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

/// Live view of one run, readable while it executes
#[derive(Debug)]
pub struct RunHandle {
    id: Uuid,
    mode: RunMode,
    started_at: DateTime<Utc>,
    running: AtomicBool,
    log: Mutex<String>,
    report: Mutex<Option<RunReport>>,
    done: watch::Sender<bool>,
}

impl RunHandle {
    fn new(mode: RunMode) -> Self {
        let (done, _) = watch::channel(false);
        Self {
            id: Uuid::new_v4(),
            mode,
            started_at: Utc::now(),
            running: AtomicBool::new(true),
            log: Mutex::new(String::new()),
            report: Mutex::new(None),
            done,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Mode requested when the run started
    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Log text accumulated so far
    pub fn log(&self) -> String {
        self.log.lock().clone()
    }

    pub fn report(&self) -> Option<RunReport> {
        self.report.lock().clone()
    }

    pub(crate) fn append(&self, line: impl AsRef<str>) {
        let mut log = self.log.lock();
        log.push_str(line.as_ref());
        log.push('\n');
    }

    pub(crate) fn complete(&self, report: RunReport) {
        *self.report.lock() = Some(report);
    }

    fn finish(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.done.send_replace(true);
    }

    /// Wait for the run to end; `None` if it ended without a report
    pub async fn wait(&self) -> Option<RunReport> {
        let mut done = self.done.subscribe();
        // The sender lives in `self`, so the channel cannot close while waiting
        let _ = done.wait_for(|finished| *finished).await;
        self.report()
    }

    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            id: self.id,
            mode: self.mode,
            started_at: self.started_at,
            running: self.is_running(),
            log: self.log(),
            report: self.report(),
        }
    }
}

/// Serializable copy of a handle's state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub id: Uuid,
    pub mode: RunMode,
    pub started_at: DateTime<Utc>,
    pub running: bool,
    pub log: String,
    pub report: Option<RunReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStatus {
    pub running: bool,
    pub current: Option<RunSnapshot>,
    pub last: Option<RunSnapshot>,
}

#[derive(Debug, Default)]
enum RunState {
    #[default]
    Idle,
    Running(Arc<RunHandle>),
}

#[derive(Debug, Default)]
struct RunSlot {
    state: RunState,
    last: Option<Arc<RunHandle>>,
}

/// Owner of the run state shared by the scheduler and on-demand triggers
#[derive(Debug, Clone, Default)]
pub struct RunTracker {
    slot: Arc<Mutex<RunSlot>>,
}

impl RunTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the run slot, failing if a run is already in flight
    pub fn try_start(&self, mode: RunMode) -> IndexingResult<RunGuard> {
        let mut slot = self.slot.lock();
        if let RunState::Running(_) = slot.state {
            return Err(IndexingError::AlreadyRunning);
        }

        let handle = Arc::new(RunHandle::new(mode));
        slot.state = RunState::Running(handle.clone());
        INDEXING_RUNNING.set(1.0);

        Ok(RunGuard {
            slot: self.slot.clone(),
            handle,
        })
    }

    pub fn is_running(&self) -> bool {
        matches!(self.slot.lock().state, RunState::Running(_))
    }

    /// Most recently finished run
    pub fn last(&self) -> Option<Arc<RunHandle>> {
        self.slot.lock().last.clone()
    }

    pub fn status(&self) -> RunStatus {
        let (current, last) = {
            let slot = self.slot.lock();
            let current = match &slot.state {
                RunState::Running(handle) => Some(handle.clone()),
                RunState::Idle => None,
            };
            (current, slot.last.clone())
        };

        RunStatus {
            running: current.is_some(),
            current: current.map(|handle| handle.snapshot()),
            last: last.map(|handle| handle.snapshot()),
        }
    }
}

/// Holds the run slot; dropping it returns the tracker to idle, including on panic
pub struct RunGuard {
    slot: Arc<Mutex<RunSlot>>,
    handle: Arc<RunHandle>,
}

impl RunGuard {
    pub fn handle(&self) -> &Arc<RunHandle> {
        &self.handle
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        {
            let mut slot = self.slot.lock();
            slot.state = RunState::Idle;
            slot.last = Some(self.handle.clone());
        }
        INDEXING_RUNNING.set(0.0);
        self.handle.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_start_is_rejected_until_guard_drops() {
        let tracker = RunTracker::new();

        let guard = tracker.try_start(RunMode::Incremental).unwrap();
        assert!(tracker.is_running());
        assert!(matches!(
            tracker.try_start(RunMode::Full),
            Err(IndexingError::AlreadyRunning)
        ));

        drop(guard);
        assert!(!tracker.is_running());
        assert!(tracker.try_start(RunMode::Full).is_ok());
    }

    #[test]
    fn test_guard_released_on_panic() {
        let tracker = RunTracker::new();
        let inner = tracker.clone();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = inner.try_start(RunMode::Full).unwrap();
            panic!("indexer blew up");
        }));

        assert!(result.is_err());
        assert!(!tracker.is_running());
        let last = tracker.last().unwrap();
        assert!(!last.is_running());
        assert!(last.report().is_none());
    }

    #[test]
    fn test_handle_exposes_log_while_running() {
        let tracker = RunTracker::new();
        let guard = tracker.try_start(RunMode::Incremental).unwrap();

        guard.handle().append("Indexer PageIndexer starting");
        let status = tracker.status();
        assert!(status.running);
        let current = status.current.unwrap();
        assert!(current.running);
        assert!(current.log.contains("PageIndexer"));

        guard.handle().complete(RunReport::new(RunMode::Incremental));
        drop(guard);

        let status = tracker.status();
        assert!(!status.running);
        assert!(status.last.unwrap().report.unwrap().succeeded());
    }

    #[tokio::test]
    async fn test_wait_returns_report() {
        let tracker = RunTracker::new();
        let guard = tracker.try_start(RunMode::Full).unwrap();
        let handle = guard.handle().clone();

        tokio::spawn(async move {
            guard.handle().complete(RunReport::new(RunMode::Full));
            drop(guard);
        });

        let report = handle.wait().await.unwrap();
        assert_eq!(report.mode, RunMode::Full);
        assert!(!handle.is_running());
    }
}
