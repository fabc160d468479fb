//! Error types for synchronization runs

use crate::model::Field;
use thiserror::Error;

/// Errors produced by one source during a run
#[derive(Debug, Error)]
pub enum SourceError {
    /// Malformed per-run configuration, fatal to this source only
    #[error("invalid configuration: {message}")]
    Configuration { message: String },

    /// The target's network/API call failed, recoverable at run level
    #[error("fetch failed: {0}")]
    Fetch(#[from] anyhow::Error),

    /// The run's cancellation token fired before the fetch completed
    #[error("fetch cancelled")]
    Cancelled,
}

/// A failure from one fetch target, tagged with the source that produced it
///
/// Failures never terminate sibling fetch tasks; the synchronizer collects
/// one entry per failing target and reports them alongside the catalog.
#[derive(Debug, Error)]
#[error("source '{source}': {error}")]
pub struct SourceFailure {
    /// Registry key of the failing source
    pub source: String,
    #[source]
    pub error: SourceError,
}

/// Fatal errors for a whole synchronization run
#[derive(Debug, Error)]
pub enum SyncError {
    /// Lookup of an unregistered source key
    #[error("unknown source: {id}")]
    SourceNotFound { id: String },

    /// Two authority declarations claim the same field
    #[error("conflicting authority declarations for field '{field}'")]
    AuthorityConflict { field: Field },

    /// The run was cancelled and strict cancellation was requested
    #[error("synchronization cancelled")]
    Cancelled,
}

/// Join per-source failures into one displayable summary
///
/// Returns `None` when there are no failures, so an all-success (or
/// all-skipped) run reports no error at all.
pub fn join_failures(failures: &[SourceFailure]) -> Option<String> {
    if failures.is_empty() {
        return None;
    }
    let joined = failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ");
    Some(joined)
}
