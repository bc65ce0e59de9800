// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;

// Listing discovery (snapshot diff) and the in-process scheduler
pub mod ingest;

// Per-listing enrichment and classification
pub mod analyze;
pub mod listing;

// Outbound alerts
pub mod notify;

// ---- Re-exports for stable public API ----
pub use crate::analyze::classifier::{Classifier, Confidence, Verdict};
pub use crate::api::router;
pub use crate::error::PipelineError;
pub use crate::ingest::SnapshotDiffer;
pub use crate::notify::{ListingAlert, Notifier, NotifierMux};
pub use crate::pipeline::{PipelineRunner, PipelineSettings, RunSummary};
