//! Source registry: the process-wide table of registered sources

use crate::error::SyncError;
use crate::source::Source;
use dashmap::DashMap;

/// Table mapping a source key to its registered prototype
///
/// Constructed once at process start and injected into the orchestrator
/// (never ambient global state, so the engine stays testable with fake
/// sources). Registration is append-only after init; steady-state reads are
/// concurrent and lock-free. Runs clone prototypes out rather than sharing
/// them, so no client state crosses task boundaries.
#[derive(Default)]
pub struct SourceRegistry {
    sources: DashMap<String, Box<dyn Source>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self {
            sources: DashMap::new(),
        }
    }

    /// Register a source under its key; the last registration wins
    pub fn register(&self, source: Box<dyn Source>) {
        let id = source.id().to_string();
        let replaced = self.sources.insert(id.clone(), source).is_some();
        tracing::debug!(source = id, replaced = replaced, "Source registered");
    }

    /// Stable enumeration of registered keys
    ///
    /// Sorted lexicographically, NOT by priority; callers sort by priority
    /// before merging. The position in this list is the deterministic
    /// tie-breaker for equal priorities.
    pub fn list(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.sources.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Clone the registered prototype for a key
    pub fn get(&self, id: &str) -> Result<Box<dyn Source>, SyncError> {
        self.sources
            .get(id)
            .map(|entry| entry.clone_source())
            .ok_or_else(|| SyncError::SourceNotFound { id: id.to_string() })
    }

    /// Adjust a registered source's priority at runtime
    pub fn set_priority(&self, id: &str, priority: i32) -> Result<(), SyncError> {
        let mut entry = self
            .sources
            .get_mut(id)
            .ok_or_else(|| SyncError::SourceNotFound { id: id.to_string() })?;
        entry.set_priority(priority);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
