// src/error.rs
//! Error taxonomy for one pipeline run.
//!
//! Only [`PipelineError::SourceUnavailable`] ever leaves a run. The per-item
//! kinds ([`DetailUnavailable`], [`ClassificationFailure`],
//! [`NotificationFailure`]) are handled inside the loop and end up in logs and
//! counters.

use thiserror::Error;

/// A snapshot could not be obtained from the listing source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("snapshot request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("snapshot endpoint returned HTTP {0}")]
    Status(u16),
    #[error("malformed snapshot payload: {0}")]
    Malformed(String),
}

/// Run-level failure. A run either returns a summary or exactly one of these.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("listing source unavailable: {0}")]
    SourceUnavailable(#[source] SourceError),
}

/// Fetching or parsing a single listing page failed.
#[derive(Debug, Error)]
pub enum DetailUnavailable {
    #[error("detail request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("detail page returned HTTP {0}")]
    Status(u16),
}

#[derive(Debug, Error)]
pub enum ClassificationFailure {
    #[error("classifier request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("classifier returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unparseable classifier response: {0}")]
    Unparseable(String),
}

#[derive(Debug, Error)]
pub enum NotificationFailure {
    #[error("notification request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("notification channel returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("no notification channel configured")]
    NotConfigured,
}
