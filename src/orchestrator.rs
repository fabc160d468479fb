//! Concurrent fetch fan-out with per-source failure isolation

use crate::config::SyncConfig;
use crate::error::SourceFailure;
use crate::model::{Model, Provider};
use crate::registry::SourceRegistry;
use crate::source::SourceKind;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// One successful fetch, tagged with its merge-ordering metadata
#[derive(Debug)]
pub struct FetchSuccess {
    pub source_id: String,
    pub kind: SourceKind,
    pub priority: i32,
    /// Position in the registry's stable enumeration; priority tie-breaker
    pub order: usize,
    pub models: Vec<Model>,
    pub providers: Vec<Provider>,
}

/// Everything collected from one fan-out
#[derive(Debug, Default)]
pub struct FetchResults {
    /// Sorted by (priority ascending, registry order ascending), so folding
    /// front to back lets higher-priority sources override
    pub successes: Vec<FetchSuccess>,
    /// One entry per failing target
    pub failures: Vec<SourceFailure>,
    /// Sources skipped because they were unavailable or disabled this run
    pub skipped: Vec<String>,
}

/// Runs one fetch per applicable source concurrently
///
/// Each task owns an exclusive clone of its source; a failure in one target
/// never discards sibling results, and every task observes the run's
/// cancellation token. All tasks are joined before results are read, so no
/// task outlives [`FetchOrchestrator::fetch_all`].
pub struct FetchOrchestrator {
    registry: Arc<SourceRegistry>,
}

impl FetchOrchestrator {
    pub fn new(registry: Arc<SourceRegistry>) -> Self {
        Self { registry }
    }

    /// Fan out fetches and collect the partitioned results
    ///
    /// `provider` narrows the run to one provider namespace; `disabled`
    /// excludes sources by registry key.
    pub async fn fetch_all(
        &self,
        cancel: &CancellationToken,
        config: &SyncConfig,
        provider: Option<&str>,
        disabled: &BTreeSet<String>,
    ) -> FetchResults {
        let mut results = FetchResults::default();
        let mut tasks: JoinSet<Result<FetchSuccess, SourceFailure>> = JoinSet::new();

        for (order, id) in self.registry.list().into_iter().enumerate() {
            if disabled.contains(&id) {
                tracing::debug!(source = id, "Source disabled for this run, skipped");
                results.skipped.push(id);
                continue;
            }

            // Registry keys come from list(), so lookup cannot miss
            let Ok(mut source) = self.registry.get(&id) else {
                continue;
            };

            if let Err(error) = source.configure(config) {
                tracing::warn!(source = id, error = %error, "Source configuration failed");
                results.failures.push(SourceFailure { source: id, error });
                continue;
            }
            if !source.is_available() {
                tracing::debug!(source = id, "Source unavailable, skipped");
                results.skipped.push(id);
                continue;
            }

            let task_cancel = cancel.child_token();
            let provider = provider.map(str::to_string);
            tasks.spawn(async move {
                fetch_one(source, task_cancel, provider.as_deref(), order).await
            });
        }

        // Wait-all barrier: results are consumed only after every task has
        // returned or observed cancellation
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(success)) => {
                    tracing::debug!(
                        source = success.source_id,
                        models = success.models.len(),
                        "Source fetch succeeded"
                    );
                    results.successes.push(success);
                }
                Ok(Err(failure)) => {
                    tracing::warn!(
                        source = failure.source,
                        error = %failure.error,
                        "Source fetch failed"
                    );
                    results.failures.push(failure);
                }
                Err(join_error) => {
                    tracing::error!(error = %join_error, "Fetch task aborted");
                }
            }
        }

        // Deterministic merge order, independent of network completion order
        results.successes.sort_by_key(|s| (s.priority, s.order));
        results.failures.sort_by(|a, b| a.source.cmp(&b.source));
        results
    }
}

async fn fetch_one(
    source: Box<dyn crate::source::Source>,
    cancel: CancellationToken,
    provider: Option<&str>,
    order: usize,
) -> Result<FetchSuccess, SourceFailure> {
    let source_id = source.id().to_string();
    let kind = source.kind();
    let priority = source.priority();

    let models = source
        .fetch(&cancel, provider)
        .await
        .map_err(|error| SourceFailure {
            source: source_id.clone(),
            error,
        })?;

    // Metadata is enrichment; its failure never fails the target
    let providers = match source.fetch_provider_metadata(&cancel, provider).await {
        Ok(providers) => providers,
        Err(error) => {
            tracing::debug!(
                source = source_id,
                error = %error,
                "Provider metadata fetch failed"
            );
            Vec::new()
        }
    };

    Ok(FetchSuccess {
        source_id,
        kind,
        priority,
        order,
        models,
        providers,
    })
}
