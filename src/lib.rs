// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod analyze;
pub mod api;
pub mod cache;
pub mod config;
pub mod ingest;
pub mod metrics;
pub mod model;
pub mod oracle;
pub mod pipeline;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::cache::SnapshotStore;
pub use crate::config::AppConfig;
pub use crate::model::{IntelligenceSnapshot, ScoredItem};
pub use crate::pipeline::{Pipeline, RefreshError, Stage};
