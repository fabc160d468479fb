//! Source abstraction
//!
//! A source is one origin of model data: the locally persisted catalog or
//! one provider's live API. Sources are registered once at process start
//! and cloned per run; a clone shares no mutable state with its origin, so
//! concurrent runs never contend on source internals.

pub mod api;
pub mod local;

pub use api::{ApiSource, HttpAdapter, ProviderAdapter};
pub use local::{LOCAL_SOURCE_ID, LocalCatalogSource};

use crate::authority::{AuthorityTable, FieldAuthority};
use crate::config::SyncConfig;
use crate::error::SourceError;
use crate::model::{Model, Provider};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Coarse source type tag referenced by authority declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    LocalCatalog,
    ProviderApi,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LocalCatalog => write!(f, "local_catalog"),
            Self::ProviderApi => write!(f, "provider_api"),
        }
    }
}

/// One origin of model data
#[async_trait]
pub trait Source: Send + Sync {
    /// Stable registry key (e.g., "local", "openai")
    fn id(&self) -> &str;

    /// Human-readable name
    fn name(&self) -> &str;

    fn kind(&self) -> SourceKind;

    /// Merge priority; higher wins ties
    fn priority(&self) -> i32;

    fn set_priority(&mut self, priority: i32);

    /// Apply per-run configuration
    ///
    /// Must not fail merely because the source is inapplicable (missing API
    /// key, no catalog file); in that case the source silently marks itself
    /// unavailable. May fail for malformed configuration.
    fn configure(&mut self, config: &SyncConfig) -> Result<(), SourceError>;

    /// Clear per-run configuration
    fn reset(&mut self);

    /// Cheap, side-effect-free check that the source can answer this run
    fn is_available(&self) -> bool;

    /// The global authority declarations claimed by this source's kind
    fn field_authorities(&self, table: &AuthorityTable) -> Vec<FieldAuthority> {
        table.for_kind(self.kind())
    }

    /// Retrieve the current model list
    ///
    /// `provider` filters to one provider namespace. A source holding no
    /// models for that namespace returns an empty list, not an error.
    async fn fetch(
        &self,
        cancel: &CancellationToken,
        provider: Option<&str>,
    ) -> Result<Vec<Model>, SourceError>;

    /// Retrieve provider-level descriptive metadata
    async fn fetch_provider_metadata(
        &self,
        cancel: &CancellationToken,
        provider: Option<&str>,
    ) -> Result<Vec<Provider>, SourceError>;

    /// Independent copy with no shared mutable state, safe for use by a
    /// concurrent run
    fn clone_source(&self) -> Box<dyn Source>;
}

impl std::fmt::Debug for dyn Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source")
            .field("id", &self.id())
            .field("kind", &self.kind())
            .field("priority", &self.priority())
            .finish()
    }
}
