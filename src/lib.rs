//! Faceted search over CMS content backed by an external Solr-compatible
//! engine, plus the action queue and synchronizer that keep the engine index
//! consistent with content changes.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod indexing;
pub mod metrics;
pub mod models;
pub mod registry;
pub mod scheduler;
pub mod search;
pub mod state;

pub use error::{AppError, Result};
