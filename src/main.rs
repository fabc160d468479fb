//! Catalog Sync - main entry point

use anyhow::{Context, Result};
use catalog_sync::{
    ApiSource, AuthorityTable, HttpAdapter, LocalCatalogSource, MergeStrategy, SourceRegistry,
    SyncOptions, Synchronizer, config::SyncConfig,
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(name = "catalog-sync")]
#[command(about = "Multi-source AI model catalog synchronizer", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Synchronize only this provider
    #[arg(short, long)]
    provider: Option<String>,

    /// Disable a source by registry key (repeatable)
    #[arg(long = "disable")]
    disabled: Vec<String>,

    /// Merge strategy override (replace_all or field_authority)
    #[arg(long)]
    strategy: Option<String>,

    /// Where to write the merged catalog
    #[arg(short, long, default_value = "catalog.json")]
    output: PathBuf,

    /// Abort the whole run on this timeout instead of per-request timeouts
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log format (json or pretty)
    #[arg(long, default_value = "pretty")]
    log_format: String,
}

fn parse_strategy(value: &str) -> Result<MergeStrategy> {
    match value {
        "replace_all" => Ok(MergeStrategy::ReplaceAll),
        "field_authority" => Ok(MergeStrategy::FieldAuthority),
        other => anyhow::bail!("Unknown merge strategy: {}", other),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    match cli.log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(&cli.log_level)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(&cli.log_level)
                .init();
        }
    }

    tracing::info!("Starting catalog sync");

    let config = SyncConfig::load(cli.config)?;
    config.validate()?;

    tracing::info!(
        providers = config.providers.len(),
        local_catalog = ?config.local_catalog_path,
        "Configuration loaded"
    );

    // Build the registry: the local catalog plus one API source per
    // configured provider
    let registry = Arc::new(SourceRegistry::new());
    registry.register(Box::new(LocalCatalogSource::new()));

    let timeout = Duration::from_secs(config.fetch_timeout_secs);
    for provider in &config.providers {
        let adapter = HttpAdapter::new(provider, timeout)
            .with_context(|| format!("Failed to build adapter for '{}'", provider.id))?;
        registry.register(Box::new(ApiSource::new(Box::new(adapter))));
    }

    let synchronizer = Synchronizer::new(registry, AuthorityTable::default(), config);

    let options = SyncOptions {
        provider: cli.provider,
        disabled_sources: cli.disabled.into_iter().collect(),
        strategy: cli.strategy.as_deref().map(parse_strategy).transpose()?,
        seed: None,
        strict_cancellation: false,
    };

    // One cancellable token governs the whole run
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            tracing::warn!("Received Ctrl+C, cancelling run");
            signal_cancel.cancel();
        }
    });
    if let Some(secs) = cli.timeout_secs {
        let deadline_cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            tracing::warn!(timeout_secs = secs, "Run timeout reached, cancelling");
            deadline_cancel.cancel();
        });
    }

    let report = synchronizer.synchronize(&cancel, options).await?;

    for failure in &report.failures {
        tracing::warn!(source = failure.source, error = %failure.error, "Source failed");
    }

    let json = serde_json::to_string_pretty(&report.catalog)
        .context("Failed to serialize catalog")?;
    std::fs::write(&cli.output, json)
        .with_context(|| format!("Failed to write catalog to {:?}", cli.output))?;

    tracing::info!(
        output = ?cli.output,
        models = report.catalog.len(),
        providers = report.catalog.providers.len(),
        failed_sources = report.failures.len(),
        skipped_sources = report.skipped.len(),
        "Catalog written"
    );

    if let Some(summary) = report.error_summary() {
        tracing::warn!(summary = summary, "Run completed with source failures");
    }

    Ok(())
}
