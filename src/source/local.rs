//! Locally persisted catalog source

use super::{Source, SourceKind};
use crate::catalog::Catalog;
use crate::config::SyncConfig;
use crate::error::SourceError;
use crate::model::{Model, Provider};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Registry key of the local catalog source
pub const LOCAL_SOURCE_ID: &str = "local";

/// Source backed by a catalog JSON file on disk
///
/// Unavailable until `configure` finds a readable catalog file, or until a
/// previously loaded catalog is handed in via [`LocalCatalogSource::with_catalog`].
#[derive(Debug, Clone)]
pub struct LocalCatalogSource {
    priority: i32,
    path: Option<PathBuf>,
    catalog: Option<Catalog>,
}

impl LocalCatalogSource {
    pub fn new() -> Self {
        Self {
            priority: 80,
            path: None,
            catalog: None,
        }
    }

    /// Seed the source from an already loaded catalog, avoiding a redundant
    /// read during `configure`
    pub fn with_catalog(catalog: Catalog, priority: i32) -> Self {
        Self {
            priority,
            path: None,
            catalog: Some(catalog),
        }
    }
}

impl Default for LocalCatalogSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Source for LocalCatalogSource {
    fn id(&self) -> &str {
        LOCAL_SOURCE_ID
    }

    fn name(&self) -> &str {
        "Local catalog"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::LocalCatalog
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    fn configure(&mut self, config: &SyncConfig) -> Result<(), SourceError> {
        self.priority = config.local_priority;

        let Some(path) = &config.local_catalog_path else {
            // No catalog configured: silently unavailable, not an error
            return Ok(());
        };
        self.path = Some(path.clone());

        if !path.exists() {
            tracing::debug!(path = ?path, "Local catalog file not found, source unavailable");
            return Ok(());
        }

        let content = std::fs::read_to_string(path).map_err(|e| SourceError::Configuration {
            message: format!("cannot read catalog file {:?}: {}", path, e),
        })?;
        let catalog: Catalog =
            serde_json::from_str(&content).map_err(|e| SourceError::Configuration {
                message: format!("malformed catalog file {:?}: {}", path, e),
            })?;

        tracing::debug!(
            path = ?path,
            models = catalog.len(),
            "Local catalog loaded"
        );
        self.catalog = Some(catalog);
        Ok(())
    }

    fn reset(&mut self) {
        self.path = None;
        self.catalog = None;
    }

    fn is_available(&self) -> bool {
        self.catalog.is_some()
    }

    async fn fetch(
        &self,
        cancel: &CancellationToken,
        provider: Option<&str>,
    ) -> Result<Vec<Model>, SourceError> {
        if cancel.is_cancelled() {
            return Err(SourceError::Cancelled);
        }
        let Some(catalog) = &self.catalog else {
            return Ok(Vec::new());
        };
        let models = catalog
            .models
            .values()
            .filter(|m| provider.is_none_or(|p| m.provider == p))
            .cloned()
            .collect();
        Ok(models)
    }

    async fn fetch_provider_metadata(
        &self,
        cancel: &CancellationToken,
        provider: Option<&str>,
    ) -> Result<Vec<Provider>, SourceError> {
        if cancel.is_cancelled() {
            return Err(SourceError::Cancelled);
        }
        let Some(catalog) = &self.catalog else {
            return Ok(Vec::new());
        };
        let providers = catalog
            .providers
            .values()
            .filter(|p| provider.is_none_or(|id| p.id == id))
            .cloned()
            .collect();
        Ok(providers)
    }

    fn clone_source(&self) -> Box<dyn Source> {
        Box::new(self.clone())
    }
}
