//! Configuration structures and loading logic

use crate::catalog::MergeStrategy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Run configuration for the synchronizer
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Path to the locally persisted catalog (JSON); the local source is
    /// unavailable when unset
    pub local_catalog_path: Option<PathBuf>,
    /// Merge priority of the local catalog source
    pub local_priority: i32,
    /// Default merge priority for provider API sources
    pub api_priority: i32,
    /// Merge strategy applied when no per-run override is given
    pub merge_strategy: MergeStrategy,
    /// Per-request timeout for provider HTTP calls
    pub fetch_timeout_secs: u64,
    pub providers: Vec<ProviderConfig>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            local_catalog_path: None,
            local_priority: default_local_priority(),
            api_priority: default_api_priority(),
            merge_strategy: MergeStrategy::default(),
            fetch_timeout_secs: default_fetch_timeout(),
            providers: Vec::new(),
        }
    }
}

impl SyncConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content).context("Failed to parse TOML config")?
        } else {
            Self::default()
        };

        // Environment variable overrides
        if let Ok(catalog_path) = std::env::var("CATALOG_SYNC_LOCAL_CATALOG") {
            config.local_catalog_path = Some(PathBuf::from(catalog_path));
        }
        if let Ok(timeout) = std::env::var("CATALOG_SYNC_FETCH_TIMEOUT") {
            config.fetch_timeout_secs = timeout
                .parse()
                .context("Invalid CATALOG_SYNC_FETCH_TIMEOUT value")?;
        }

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();

        for provider in &self.providers {
            if provider.id.is_empty() {
                anyhow::bail!("Provider ID cannot be empty");
            }
            if !ids.insert(&provider.id) {
                anyhow::bail!("Duplicate provider ID: {}", provider.id);
            }
            if !provider.base_url.starts_with("http://") && !provider.base_url.starts_with("https://")
            {
                anyhow::bail!(
                    "Provider '{}' base URL must be http(s): {}",
                    provider.id,
                    provider.base_url
                );
            }
        }

        if self.fetch_timeout_secs == 0 {
            anyhow::bail!("fetch_timeout_secs must be > 0");
        }

        Ok(())
    }

    /// Look up one provider's configuration
    pub fn provider(&self, id: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.id == id)
    }
}

/// Configuration for a single provider API source
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ProviderConfig {
    /// Stable provider identifier (e.g., "openai")
    pub id: String,
    /// Base URL of the provider's OpenAI-compatible API
    pub base_url: String,

    /// Environment variable holding the API key
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// Whether a key must be present for the source to be available.
    /// Local endpoints (Ollama, vLLM) typically set this to false.
    #[serde(default = "default_key_required")]
    pub key_required: bool,

    /// Disable this provider without removing its configuration
    #[serde(default)]
    pub disabled: bool,

    /// Merge priority override; falls back to the global API priority
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

impl ProviderConfig {
    /// The environment variable this provider reads its key from
    ///
    /// Defaults to `<ID>_API_KEY` with the ID upper-cased.
    pub fn key_env(&self) -> String {
        match &self.api_key_env {
            Some(env) => env.clone(),
            None => format!("{}_API_KEY", self.id.to_uppercase().replace('-', "_")),
        }
    }
}

fn default_local_priority() -> i32 {
    80
}

fn default_api_priority() -> i32 {
    90
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_key_required() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(id: &str) -> ProviderConfig {
        ProviderConfig {
            id: id.to_string(),
            base_url: "https://api.example.com/v1".to_string(),
            api_key_env: None,
            key_required: true,
            disabled: false,
            priority: None,
        }
    }

    #[test]
    fn test_default_config_validates() {
        SyncConfig::default().validate().unwrap();
    }

    #[test]
    fn test_duplicate_provider_rejected() {
        let config = SyncConfig {
            providers: vec![provider("openai"), provider("openai")],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_base_url_rejected() {
        let mut bad = provider("openai");
        bad.base_url = "ftp://example.com".to_string();
        let config = SyncConfig {
            providers: vec![bad],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_key_env_default() {
        assert_eq!(provider("openai").key_env(), "OPENAI_API_KEY");
        assert_eq!(provider("github-copilot").key_env(), "GITHUB_COPILOT_API_KEY");

        let mut custom = provider("gemini");
        custom.api_key_env = Some("GOOGLE_API_KEY".to_string());
        assert_eq!(custom.key_env(), "GOOGLE_API_KEY");
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            local_catalog_path = "/var/lib/catalog.json"
            merge_strategy = "replace_all"

            [[providers]]
            id = "openai"
            base_url = "https://api.openai.com/v1"

            [[providers]]
            id = "ollama"
            base_url = "http://localhost:11434/v1"
            key_required = false
        "#;

        let config: SyncConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.providers.len(), 2);
        assert_eq!(config.merge_strategy, MergeStrategy::ReplaceAll);
        assert!(!config.providers[1].key_required);
        config.validate().unwrap();
    }
}
