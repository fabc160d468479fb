//! Synchronization integration tests
//!
//! Exercises the full fan-out / reconcile / assemble pipeline with fake
//! sources: failure isolation, merge determinism under network timing,
//! authority precedence, deduplication, and cancellation.

use async_trait::async_trait;
use catalog_sync::{
    AuthorityTable, Field, FieldAuthority, Model, Provider, SourceError, SourceKind,
    SourceRegistry, SyncConfig, SyncOptions, Synchronizer, source::Source,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// In-memory source with scriptable behavior
#[derive(Clone)]
struct FakeSource {
    id: String,
    kind: SourceKind,
    priority: i32,
    models: Vec<Model>,
    providers: Vec<Provider>,
    fail: bool,
    delay: Duration,
    hang_until_cancelled: bool,
}

impl FakeSource {
    fn new(id: &str, kind: SourceKind, priority: i32, models: Vec<Model>) -> Self {
        Self {
            id: id.to_string(),
            kind,
            priority,
            models,
            providers: Vec::new(),
            fail: false,
            delay: Duration::ZERO,
            hang_until_cancelled: false,
        }
    }

    fn failing(id: &str, priority: i32) -> Self {
        let mut source = Self::new(id, SourceKind::ProviderApi, priority, Vec::new());
        source.fail = true;
        source
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn hanging(id: &str) -> Self {
        let mut source = Self::new(id, SourceKind::ProviderApi, 90, Vec::new());
        source.hang_until_cancelled = true;
        source
    }
}

#[async_trait]
impl Source for FakeSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    fn configure(&mut self, _config: &SyncConfig) -> Result<(), SourceError> {
        Ok(())
    }

    fn reset(&mut self) {}

    fn is_available(&self) -> bool {
        true
    }

    async fn fetch(
        &self,
        cancel: &CancellationToken,
        provider: Option<&str>,
    ) -> Result<Vec<Model>, SourceError> {
        if self.hang_until_cancelled {
            cancel.cancelled().await;
            return Err(SourceError::Cancelled);
        }
        if !self.delay.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => return Err(SourceError::Cancelled),
                _ = tokio::time::sleep(self.delay) => {}
            }
        }
        if self.fail {
            return Err(SourceError::Fetch(anyhow::anyhow!("simulated outage")));
        }
        Ok(self
            .models
            .iter()
            .filter(|m| provider.is_none_or(|p| m.provider == p))
            .cloned()
            .collect())
    }

    async fn fetch_provider_metadata(
        &self,
        _cancel: &CancellationToken,
        provider: Option<&str>,
    ) -> Result<Vec<Provider>, SourceError> {
        Ok(self
            .providers
            .iter()
            .filter(|p| provider.is_none_or(|id| p.id == id))
            .cloned()
            .collect())
    }

    fn clone_source(&self) -> Box<dyn Source> {
        Box::new(self.clone())
    }
}

fn model(id: &str, provider: &str, name: &str, context_window: u64) -> Model {
    let mut m = Model::new(id, provider);
    m.name = name.to_string();
    m.context_window = context_window;
    m
}

fn synchronizer(sources: Vec<FakeSource>, authority: AuthorityTable) -> Synchronizer {
    let registry = Arc::new(SourceRegistry::new());
    for source in sources {
        registry.register(Box::new(source));
    }
    Synchronizer::new(registry, authority, SyncConfig::default())
}

#[tokio::test]
async fn failures_are_isolated_and_enumerated() {
    let sync = synchronizer(
        vec![
            FakeSource::new(
                "anthropic",
                SourceKind::ProviderApi,
                90,
                vec![model("claude", "anthropic", "Claude", 200_000)],
            ),
            FakeSource::failing("openai", 90),
            FakeSource::failing("mistral", 85),
        ],
        AuthorityTable::empty(),
    );

    let cancel = CancellationToken::new();
    let report = sync
        .synchronize(&cancel, SyncOptions::default())
        .await
        .unwrap();

    // Successes survive regardless of how many siblings failed
    assert_eq!(report.catalog.len(), 1);
    assert!(report.catalog.get("claude").is_some());

    // Exactly one failure entry per failing provider, each identifying it
    assert_eq!(report.failures.len(), 2);
    let failed: Vec<&str> = report.failures.iter().map(|f| f.source.as_str()).collect();
    assert_eq!(failed, vec!["mistral", "openai"]);

    let summary = report.error_summary().unwrap();
    assert!(summary.contains("openai"));
    assert!(summary.contains("mistral"));
}

#[tokio::test]
async fn merge_is_deterministic_under_network_timing() {
    let make = |delay_a: u64, delay_b: u64| {
        synchronizer(
            vec![
                FakeSource::new(
                    "local",
                    SourceKind::LocalCatalog,
                    80,
                    vec![
                        model("m1", "openai", "Curated One", 0),
                        model("m2", "openai", "Curated Two", 4096),
                    ],
                )
                .with_delay(Duration::from_millis(delay_a)),
                FakeSource::new(
                    "openai",
                    SourceKind::ProviderApi,
                    90,
                    vec![
                        model("m1", "openai", "API One", 8192),
                        model("m3", "openai", "API Three", 16_384),
                    ],
                )
                .with_delay(Duration::from_millis(delay_b)),
            ],
            AuthorityTable::default(),
        )
    };

    let cancel = CancellationToken::new();
    // Reverse which source finishes first between the two runs
    let first = make(40, 0)
        .synchronize(&cancel, SyncOptions::default())
        .await
        .unwrap();
    let second = make(0, 40)
        .synchronize(&cancel, SyncOptions::default())
        .await
        .unwrap();

    let a = serde_json::to_vec(&first.catalog).unwrap();
    let b = serde_json::to_vec(&second.catalog).unwrap();
    assert_eq!(a, b, "catalog must not depend on fetch completion order");
}

#[tokio::test]
async fn declared_authority_beats_higher_priority() {
    // Source A: priority 80, authoritative for name. Source B: priority 90,
    // no declared authority. The merged record keeps A's name and gains
    // B's context window.
    let authority = AuthorityTable::new(vec![FieldAuthority {
        field: Field::Name,
        kind: SourceKind::LocalCatalog,
    }])
    .unwrap();

    let sync = synchronizer(
        vec![
            FakeSource::new(
                "local",
                SourceKind::LocalCatalog,
                80,
                vec![model("m1", "openai", "Local Name", 0)],
            ),
            FakeSource::new(
                "openai",
                SourceKind::ProviderApi,
                90,
                vec![model("m1", "openai", "API Name", 8192)],
            ),
        ],
        authority,
    );

    let cancel = CancellationToken::new();
    let report = sync
        .synchronize(&cancel, SyncOptions::default())
        .await
        .unwrap();

    let merged = report.catalog.get("m1").unwrap();
    assert_eq!(merged.name, "Local Name");
    assert_eq!(merged.context_window, 8192);
}

#[tokio::test]
async fn same_model_id_never_duplicates() {
    let sync = synchronizer(
        vec![
            FakeSource::new(
                "local",
                SourceKind::LocalCatalog,
                80,
                vec![model("m1", "openai", "One", 0)],
            ),
            FakeSource::new(
                "openai",
                SourceKind::ProviderApi,
                90,
                vec![model("m1", "openai", "One Again", 8192)],
            ),
        ],
        AuthorityTable::empty(),
    );

    let cancel = CancellationToken::new();
    let report = sync
        .synchronize(&cancel, SyncOptions::default())
        .await
        .unwrap();

    assert_eq!(report.catalog.len(), 1);
}

#[tokio::test]
async fn disabled_source_is_excluded() {
    let sync = synchronizer(
        vec![
            FakeSource::new(
                "local",
                SourceKind::LocalCatalog,
                80,
                vec![model("m1", "openai", "One", 0)],
            ),
            FakeSource::new(
                "openai",
                SourceKind::ProviderApi,
                90,
                vec![model("m2", "openai", "Two", 0)],
            ),
        ],
        AuthorityTable::empty(),
    );

    let cancel = CancellationToken::new();
    let report = sync
        .synchronize(
            &cancel,
            SyncOptions {
                disabled_sources: ["openai".to_string()].into_iter().collect(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(report.catalog.len(), 1);
    assert!(report.catalog.get("m2").is_none());
    assert!(report.skipped.contains(&"openai".to_string()));
}

#[tokio::test]
async fn cancellation_returns_promptly() {
    let sync = synchronizer(
        vec![
            FakeSource::hanging("openai"),
            FakeSource::new(
                "local",
                SourceKind::LocalCatalog,
                80,
                vec![model("m1", "openai", "One", 0)],
            ),
        ],
        AuthorityTable::empty(),
    );

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    // The hanging source blocks until its task observes cancellation; the
    // run must return promptly afterward, never hang
    let report = tokio::time::timeout(
        Duration::from_secs(2),
        sync.synchronize(&cancel, SyncOptions::default()),
    )
    .await
    .expect("synchronize must not outlive cancellation")
    .unwrap();

    // Partial results collected before cancellation are still returned
    assert_eq!(report.catalog.len(), 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].source, "openai");
    assert!(matches!(report.failures[0].error, SourceError::Cancelled));
}

#[tokio::test]
async fn provider_metadata_is_merged() {
    let mut api = FakeSource::new(
        "openai",
        SourceKind::ProviderApi,
        90,
        vec![model("m1", "openai", "One", 0)],
    );
    api.providers = vec![Provider {
        id: "openai".to_string(),
        name: "OpenAI".to_string(),
        ..Default::default()
    }];

    let sync = synchronizer(vec![api], AuthorityTable::empty());
    let cancel = CancellationToken::new();
    let report = sync
        .synchronize(&cancel, SyncOptions::default())
        .await
        .unwrap();

    assert_eq!(report.catalog.providers.len(), 1);
    assert_eq!(report.catalog.providers["openai"].name, "OpenAI");
}

#[tokio::test]
async fn runtime_priority_change_affects_merge() {
    let registry = Arc::new(SourceRegistry::new());
    registry.register(Box::new(FakeSource::new(
        "a",
        SourceKind::ProviderApi,
        50,
        vec![model("m1", "openai", "From A", 0)],
    )));
    registry.register(Box::new(FakeSource::new(
        "b",
        SourceKind::ProviderApi,
        60,
        vec![model("m1", "openai", "From B", 0)],
    )));

    // B outranks A initially
    let sync = Synchronizer::new(
        registry.clone(),
        AuthorityTable::empty(),
        SyncConfig::default(),
    );
    let cancel = CancellationToken::new();
    let report = sync
        .synchronize(&cancel, SyncOptions::default())
        .await
        .unwrap();
    assert_eq!(report.catalog.get("m1").unwrap().name, "From B");

    // Promote A above B and rerun
    registry.set_priority("a", 70).unwrap();
    let report = sync
        .synchronize(&cancel, SyncOptions::default())
        .await
        .unwrap();
    assert_eq!(report.catalog.get("m1").unwrap().name, "From A");
}
