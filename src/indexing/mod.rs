//! Index synchronization
//!
//! Content producers record mutations in the [`ActionQueue`]; the
//! [`IndexSynchronizer`] replays them through the [`Indexer`] that claims each
//! resource type, removing an action only after its engine write succeeded.
//! A failed action stays queued and is retried by the next incremental run.

mod error;
mod indexer;
mod queue;
mod run;
mod synchronizer;

pub use error::{IndexingError, IndexingResult};
pub use indexer::{DocumentBatch, Indexer, IndexerRegistry};
pub use queue::ActionQueue;
pub use run::{RunGuard, RunHandle, RunMode, RunReport, RunSnapshot, RunStatus, RunTracker};
pub use synchronizer::IndexSynchronizer;
