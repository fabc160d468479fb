//! Catalog assembly: dedup by model ID and authority-aware merging

use crate::authority::{AuthorityTable, FieldOrigin};
use crate::model::{Field, Model, Provider};
use crate::source::SourceKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// How an incoming source's data combines with accumulated catalog data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// The incoming record fully replaces any existing record for that model
    /// ID, regardless of field-level authority. Used for freshly
    /// synchronized API data where staleness must never leak through.
    ReplaceAll,
    /// Field-by-field resolution through the authority table
    #[default]
    FieldAuthority,
}

impl std::fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReplaceAll => write!(f, "replace_all"),
            Self::FieldAuthority => write!(f, "field_authority"),
        }
    }
}

/// Non-fatal problem encountered while merging one model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeIssue {
    /// Registry key of the source that supplied the record
    pub source: String,
    pub model_id: String,
    pub message: String,
}

/// The deduplicated, merged collection of models from one run
///
/// Owned exclusively by the [`CatalogBuilder`] during assembly and handed to
/// the caller afterward. Maps are BTreeMaps so iteration and serialization
/// are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Strategy this catalog was built with
    pub strategy: MergeStrategy,
    pub models: BTreeMap<String, Model>,
    pub providers: BTreeMap<String, Provider>,
}

impl Catalog {
    pub fn new(strategy: MergeStrategy) -> Self {
        Self {
            strategy,
            models: BTreeMap::new(),
            providers: BTreeMap::new(),
        }
    }

    pub fn get(&self, model_id: &str) -> Option<&Model> {
        self.models.get(model_id)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Folds ordered fetch results into one [`Catalog`]
///
/// The caller applies sources in deterministic merge order (priority
/// ascending, registry order ascending); the builder tracks per-field
/// provenance so authority decisions do not depend on fetch timing.
pub struct CatalogBuilder {
    catalog: Catalog,
    authority: AuthorityTable,
    /// Source kinds that have contributed so far; a declared authority only
    /// claims a field while its kind is in this set
    participants: BTreeSet<SourceKind>,
    /// Per-model, per-field origin of the currently held value
    provenance: HashMap<String, HashMap<Field, FieldOrigin>>,
    /// Per-model origin of the whole record, for the replace-all strategy
    record_origin: HashMap<String, FieldOrigin>,
    issues: Vec<MergeIssue>,
}

impl CatalogBuilder {
    pub fn new(strategy: MergeStrategy, authority: AuthorityTable) -> Self {
        Self {
            catalog: Catalog::new(strategy),
            authority,
            participants: BTreeSet::new(),
            provenance: HashMap::new(),
            record_origin: HashMap::new(),
            issues: Vec::new(),
        }
    }

    /// Seed the builder from a previously loaded catalog
    ///
    /// The seed participates as a local-catalog contribution at the given
    /// priority, so a run can reuse an already loaded catalog instead of
    /// re-reading it from disk.
    pub fn with_seed(mut self, seed: Catalog, priority: i32) -> Self {
        for provider in seed.providers.into_values() {
            self.add_provider(provider);
        }
        let models: Vec<Model> = seed.models.into_values().collect();
        self.apply("seed", SourceKind::LocalCatalog, priority, 0, models);
        self
    }

    /// Merge one source's models into the catalog
    ///
    /// `order` is the source's position in the registry's stable enumeration
    /// and breaks priority ties.
    pub fn apply(
        &mut self,
        source_id: &str,
        kind: SourceKind,
        priority: i32,
        order: usize,
        models: Vec<Model>,
    ) {
        self.participants.insert(kind);
        let origin = FieldOrigin {
            kind,
            priority,
            order,
        };

        for model in models {
            if model.id.is_empty() {
                self.issue(source_id, "", "model with empty ID skipped");
                continue;
            }

            match self.catalog.models.get(&model.id) {
                None => self.insert_new(model, origin),
                Some(existing) => {
                    if existing.provider != model.provider {
                        let message = format!(
                            "provider mismatch: '{}' already held by '{}'",
                            model.provider, existing.provider
                        );
                        self.issue(source_id, &model.id, &message);
                        continue;
                    }
                    match self.catalog.strategy {
                        MergeStrategy::ReplaceAll => self.replace_record(model, origin),
                        MergeStrategy::FieldAuthority => self.merge_fields(model, origin),
                    }
                }
            }
        }
    }

    /// Record provider metadata, filling gaps left by earlier sources
    pub fn add_provider(&mut self, provider: Provider) {
        match self.catalog.providers.get_mut(&provider.id) {
            None => {
                self.catalog.providers.insert(provider.id.clone(), provider);
            }
            Some(existing) => {
                if existing.name.is_empty() {
                    existing.name = provider.name;
                }
                if existing.description.is_empty() {
                    existing.description = provider.description;
                }
                if existing.docs_url.is_none() {
                    existing.docs_url = provider.docs_url;
                }
                if existing.env_keys.is_empty() {
                    existing.env_keys = provider.env_keys;
                }
                if existing.authors.is_empty() {
                    existing.authors = provider.authors;
                }
            }
        }
    }

    /// Finish assembly, handing the catalog and collected issues to the caller
    pub fn finish(self) -> (Catalog, Vec<MergeIssue>) {
        (self.catalog, self.issues)
    }

    fn insert_new(&mut self, model: Model, origin: FieldOrigin) {
        let mut fields = HashMap::new();
        for field in Field::ALL {
            if !model.field_is_empty(field) {
                fields.insert(field, origin);
            }
        }
        self.provenance.insert(model.id.clone(), fields);
        self.record_origin.insert(model.id.clone(), origin);
        self.catalog.models.insert(model.id.clone(), model);
    }

    fn replace_record(&mut self, model: Model, origin: FieldOrigin) {
        // Whole-record precedence follows the same priority rule as fields
        let wins = match self.record_origin.get(&model.id) {
            Some(held) => {
                origin.priority > held.priority
                    || (origin.priority == held.priority && origin.order >= held.order)
            }
            None => true,
        };
        if wins {
            self.insert_new(model, origin);
        }
    }

    fn merge_fields(&mut self, incoming: Model, origin: FieldOrigin) {
        let id = incoming.id.clone();
        let fields = self.provenance.entry(id.clone()).or_default();
        let Some(existing) = self.catalog.models.get_mut(&id) else {
            return;
        };

        for field in Field::ALL {
            // An empty value is never authoritative by presence
            if incoming.field_is_empty(field) {
                continue;
            }
            let take = match fields.get(&field) {
                None => true,
                Some(&held) => {
                    self.authority
                        .incoming_wins(field, &self.participants, held, origin)
                }
            };
            if take {
                existing.copy_field(field, &incoming);
                fields.insert(field, origin);
            }
        }
    }

    fn issue(&mut self, source_id: &str, model_id: &str, message: &str) {
        tracing::warn!(
            source = source_id,
            model_id = model_id,
            message = message,
            "Merge issue"
        );
        self.issues.push(MergeIssue {
            source: source_id.to_string(),
            model_id: model_id.to_string(),
            message: message.to_string(),
        });
    }
}
