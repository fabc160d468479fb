//! Top-level synchronization run

use crate::authority::AuthorityTable;
use crate::catalog::{Catalog, CatalogBuilder, MergeIssue, MergeStrategy};
use crate::config::SyncConfig;
use crate::error::{SourceFailure, SyncError, join_failures};
use crate::orchestrator::FetchOrchestrator;
use crate::registry::SourceRegistry;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Per-run options for [`Synchronizer::synchronize`]
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Narrow the run to one provider namespace
    pub provider: Option<String>,
    /// Sources to exclude by registry key
    pub disabled_sources: BTreeSet<String>,
    /// Merge strategy override; falls back to the configured default
    pub strategy: Option<MergeStrategy>,
    /// Seed the run from a previously loaded catalog instead of re-reading
    /// it from disk
    pub seed: Option<Catalog>,
    /// Fail the run with [`SyncError::Cancelled`] instead of returning the
    /// partial results collected before cancellation
    pub strict_cancellation: bool,
}

/// Outcome of one synchronization run
///
/// A run with N sources configured and M < N succeeding still yields a
/// usable catalog built from the M successes; `failures` enumerates which
/// sources failed and why.
#[derive(Debug)]
pub struct SyncReport {
    pub catalog: Catalog,
    /// One entry per failing source
    pub failures: Vec<SourceFailure>,
    /// Non-fatal per-model merge problems
    pub issues: Vec<MergeIssue>,
    /// Sources skipped as unavailable or disabled
    pub skipped: Vec<String>,
}

impl SyncReport {
    /// Joined summary of all source failures, `None` when everything that
    /// ran succeeded
    pub fn error_summary(&self) -> Option<String> {
        join_failures(&self.failures)
    }
}

/// Drives one catalog synchronization: fan-out, reconciliation, assembly
pub struct Synchronizer {
    registry: Arc<SourceRegistry>,
    authority: AuthorityTable,
    config: SyncConfig,
}

impl Synchronizer {
    pub fn new(registry: Arc<SourceRegistry>, authority: AuthorityTable, config: SyncConfig) -> Self {
        Self {
            registry,
            authority,
            config,
        }
    }

    /// Run one synchronization under the given cancellation token
    ///
    /// Individual source failures are collected into the report, never
    /// propagated as run errors. The catalog is assembled single-threaded
    /// after all fetch tasks have been joined, in an order derived from
    /// source priority alone.
    pub async fn synchronize(
        &self,
        cancel: &CancellationToken,
        options: SyncOptions,
    ) -> Result<SyncReport, SyncError> {
        let strategy = options.strategy.unwrap_or(self.config.merge_strategy);
        tracing::info!(
            strategy = %strategy,
            provider = ?options.provider,
            sources = self.registry.len(),
            "Synchronization started"
        );

        let orchestrator = FetchOrchestrator::new(self.registry.clone());
        let results = orchestrator
            .fetch_all(
                cancel,
                &self.config,
                options.provider.as_deref(),
                &options.disabled_sources,
            )
            .await;

        if cancel.is_cancelled() && options.strict_cancellation {
            return Err(SyncError::Cancelled);
        }

        let mut builder = CatalogBuilder::new(strategy, self.authority.clone());
        if let Some(seed) = options.seed {
            builder = builder.with_seed(seed, self.config.local_priority);
        }

        // Successes arrive pre-sorted by (priority, registry order)
        for success in results.successes {
            for provider in success.providers {
                builder.add_provider(provider);
            }
            builder.apply(
                &success.source_id,
                success.kind,
                success.priority,
                success.order,
                success.models,
            );
        }
        let (catalog, issues) = builder.finish();

        tracing::info!(
            models = catalog.len(),
            providers = catalog.providers.len(),
            failures = results.failures.len(),
            skipped = results.skipped.len(),
            merge_issues = issues.len(),
            "Synchronization finished"
        );

        Ok(SyncReport {
            catalog,
            failures: results.failures,
            issues,
            skipped: results.skipped,
        })
    }
}
