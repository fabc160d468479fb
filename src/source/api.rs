//! Live provider API source
//!
//! `ApiSource` handles availability, priority, and cancellation; the
//! vendor-specific HTTP call and JSON mapping live behind the
//! [`ProviderAdapter`] trait. The bundled [`HttpAdapter`] speaks the
//! OpenAI-compatible `GET /models` shape that most vendors expose.

use super::{Source, SourceKind};
use crate::config::{ProviderConfig, SyncConfig};
use crate::error::SourceError;
use crate::model::{Model, Provider};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Vendor adapter contract
///
/// Adapters are opaque, possibly-failing operations with no internal retry;
/// the orchestrator treats a failure as recoverable at the run level.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Provider namespace this adapter answers for
    fn provider_id(&self) -> &str;

    /// Environment variables that must be set before a fetch is attempted
    fn required_env_keys(&self) -> Vec<String>;

    /// Required keys currently absent from the environment
    fn missing_config_keys(&self) -> Vec<String> {
        self.required_env_keys()
            .into_iter()
            .filter(|key| std::env::var(key).is_err())
            .collect()
    }

    fn has_required_credentials(&self) -> bool {
        self.missing_config_keys().is_empty()
    }

    /// List the models the provider currently serves
    async fn list_models(&self) -> Result<Vec<Model>>;

    /// Provider-level descriptive metadata
    async fn provider_metadata(&self) -> Result<Provider>;

    fn clone_adapter(&self) -> Box<dyn ProviderAdapter>;
}

/// Source wrapping one provider's adapter
pub struct ApiSource {
    adapter: Box<dyn ProviderAdapter>,
    display_name: String,
    priority: i32,
    available: bool,
}

impl ApiSource {
    pub fn new(adapter: Box<dyn ProviderAdapter>) -> Self {
        let display_name = adapter.provider_id().to_string();
        Self {
            adapter,
            display_name,
            priority: 90,
            available: false,
        }
    }
}

#[async_trait]
impl Source for ApiSource {
    fn id(&self) -> &str {
        self.adapter.provider_id()
    }

    fn name(&self) -> &str {
        &self.display_name
    }

    fn kind(&self) -> SourceKind {
        SourceKind::ProviderApi
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    fn configure(&mut self, config: &SyncConfig) -> Result<(), SourceError> {
        self.priority = config.api_priority;
        self.available = false;

        let Some(provider) = config.provider(self.adapter.provider_id()) else {
            // Not configured this run: deactivate without error
            return Ok(());
        };
        if provider.disabled {
            return Ok(());
        }
        if let Some(priority) = provider.priority {
            self.priority = priority;
        }

        let missing = self.adapter.missing_config_keys();
        if !missing.is_empty() {
            tracing::debug!(
                provider = provider.id,
                missing_keys = ?missing,
                "Provider credentials missing, source unavailable"
            );
            return Ok(());
        }

        self.available = true;
        Ok(())
    }

    fn reset(&mut self) {
        self.available = false;
        self.priority = 90;
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn fetch(
        &self,
        cancel: &CancellationToken,
        provider: Option<&str>,
    ) -> Result<Vec<Model>, SourceError> {
        if !self.available {
            return Ok(Vec::new());
        }
        // Another provider's namespace holds none of our models
        if let Some(p) = provider
            && p != self.adapter.provider_id()
        {
            return Ok(Vec::new());
        }

        tokio::select! {
            _ = cancel.cancelled() => Err(SourceError::Cancelled),
            result = self.adapter.list_models() => Ok(result?),
        }
    }

    async fn fetch_provider_metadata(
        &self,
        cancel: &CancellationToken,
        provider: Option<&str>,
    ) -> Result<Vec<Provider>, SourceError> {
        if !self.available {
            return Ok(Vec::new());
        }
        if let Some(p) = provider
            && p != self.adapter.provider_id()
        {
            return Ok(Vec::new());
        }

        tokio::select! {
            _ = cancel.cancelled() => Err(SourceError::Cancelled),
            result = self.adapter.provider_metadata() => Ok(vec![result?]),
        }
    }

    fn clone_source(&self) -> Box<dyn Source> {
        Box::new(Self {
            adapter: self.adapter.clone_adapter(),
            display_name: self.display_name.clone(),
            priority: self.priority,
            available: self.available,
        })
    }
}

/// OpenAI-compatible `GET /models` adapter
#[derive(Debug, Clone)]
pub struct HttpAdapter {
    provider_id: String,
    base_url: String,
    key_env: String,
    key_required: bool,
    client: reqwest::Client,
}

impl HttpAdapter {
    pub fn new(provider: &ProviderConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            provider_id: provider.id.clone(),
            base_url: provider.base_url.trim_end_matches('/').to_string(),
            key_env: provider.key_env(),
            key_required: provider.key_required,
            client,
        })
    }
}

/// Wire shape of an OpenAI-compatible model list response
#[derive(Debug, Deserialize)]
struct ModelsResponse {
    data: Vec<WireModel>,
}

#[derive(Debug, Deserialize)]
struct WireModel {
    id: String,
    #[serde(default)]
    owned_by: String,
    #[serde(default)]
    created: Option<i64>,
}

fn map_models(provider_id: &str, response: ModelsResponse) -> Vec<Model> {
    response
        .data
        .into_iter()
        .map(|wire| {
            let mut model = Model::new(wire.id, provider_id);
            if !wire.owned_by.is_empty() {
                model.authors = vec![wire.owned_by];
            }
            model.created_at = wire.created.and_then(|ts| DateTime::from_timestamp(ts, 0));
            model
        })
        .collect()
}

#[async_trait]
impl ProviderAdapter for HttpAdapter {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    fn required_env_keys(&self) -> Vec<String> {
        if self.key_required {
            vec![self.key_env.clone()]
        } else {
            Vec::new()
        }
    }

    async fn list_models(&self) -> Result<Vec<Model>> {
        let url = format!("{}/models", self.base_url);
        let mut request = self.client.get(&url);
        if let Ok(key) = std::env::var(&self.key_env) {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("{} returned status {}", url, status);
        }

        let body: ModelsResponse = response
            .json()
            .await
            .with_context(|| format!("invalid model list from {}", url))?;

        Ok(map_models(&self.provider_id, body))
    }

    async fn provider_metadata(&self) -> Result<Provider> {
        Ok(Provider {
            id: self.provider_id.clone(),
            name: self.provider_id.clone(),
            env_keys: self.required_env_keys(),
            ..Default::default()
        })
    }

    fn clone_adapter(&self) -> Box<dyn ProviderAdapter> {
        Box::new(self.clone())
    }
}
