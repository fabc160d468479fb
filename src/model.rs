//! Common model and provider schema shared by all sources

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Input or output modality supported by a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Text,
    Image,
    Audio,
    Video,
    Embedding,
}

/// Capability flags reported for a model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelFeatures {
    pub tools: bool,
    pub vision: bool,
    pub streaming: bool,
    pub reasoning: bool,
}

impl ModelFeatures {
    /// True when no capability flag is set
    pub fn is_empty(&self) -> bool {
        !(self.tools || self.vision || self.streaming || self.reasoning)
    }
}

/// Input/output modalities of a model
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modalities {
    pub input: Vec<Modality>,
    pub output: Vec<Modality>,
}

impl Modalities {
    pub fn is_empty(&self) -> bool {
        self.input.is_empty() && self.output.is_empty()
    }
}

/// Default generation parameters advertised for a model
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationDefaults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
}

impl GenerationDefaults {
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.top_p.is_none()
    }
}

/// A single model record as reported by one source
///
/// Models from different sources are matched by `id` within the provider
/// namespace; field values may disagree between sources and are reconciled
/// by the catalog builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// Model identifier, unique within the provider namespace
    pub id: String,
    /// Provider this model belongs to (e.g., "openai")
    pub provider: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub features: ModelFeatures,
    #[serde(default)]
    pub modalities: Modalities,
    /// Context window in tokens (0 = unknown)
    #[serde(default)]
    pub context_window: u64,
    /// Maximum output tokens (0 = unknown)
    #[serde(default)]
    pub max_output_tokens: u64,
    #[serde(default)]
    pub generation: GenerationDefaults,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// Create an empty model record for a provider
    pub fn new(id: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            provider: provider.into(),
            name: String::new(),
            description: String::new(),
            features: ModelFeatures::default(),
            modalities: Modalities::default(),
            context_window: 0,
            max_output_tokens: 0,
            generation: GenerationDefaults::default(),
            authors: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Whether a field carries no semantically meaningful value
    ///
    /// An empty field never wins a merge, regardless of source priority.
    pub fn field_is_empty(&self, field: Field) -> bool {
        match field {
            Field::Name => self.name.is_empty(),
            Field::Description => self.description.is_empty(),
            Field::Features => self.features.is_empty(),
            Field::Modalities => self.modalities.is_empty(),
            Field::ContextWindow => self.context_window == 0,
            Field::MaxOutputTokens => self.max_output_tokens == 0,
            Field::Generation => self.generation.is_empty(),
            Field::Authors => self.authors.is_empty(),
            Field::Timestamps => self.created_at.is_none() && self.updated_at.is_none(),
        }
    }

    /// Copy one field's value from another record
    pub fn copy_field(&mut self, field: Field, from: &Model) {
        match field {
            Field::Name => self.name = from.name.clone(),
            Field::Description => self.description = from.description.clone(),
            Field::Features => self.features = from.features,
            Field::Modalities => self.modalities = from.modalities.clone(),
            Field::ContextWindow => self.context_window = from.context_window,
            Field::MaxOutputTokens => self.max_output_tokens = from.max_output_tokens,
            Field::Generation => self.generation = from.generation,
            Field::Authors => self.authors = from.authors.clone(),
            Field::Timestamps => {
                self.created_at = from.created_at;
                self.updated_at = from.updated_at;
            }
        }
    }
}

/// A mergeable field of a [`Model`]
///
/// The authority table and the catalog builder operate on this fixed set
/// rather than on string paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Description,
    Features,
    Modalities,
    ContextWindow,
    MaxOutputTokens,
    Generation,
    Authors,
    Timestamps,
}

impl Field {
    /// All mergeable fields, in merge-application order
    pub const ALL: [Field; 9] = [
        Field::Name,
        Field::Description,
        Field::Features,
        Field::Modalities,
        Field::ContextWindow,
        Field::MaxOutputTokens,
        Field::Generation,
        Field::Authors,
        Field::Timestamps,
    ];
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::Features => "features",
            Self::Modalities => "modalities",
            Self::ContextWindow => "context_window",
            Self::MaxOutputTokens => "max_output_tokens",
            Self::Generation => "generation",
            Self::Authors => "authors",
            Self::Timestamps => "timestamps",
        };
        write!(f, "{}", name)
    }
}

/// Provider-level descriptive metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs_url: Option<String>,
    /// Environment variables that hold this provider's credentials
    #[serde(default)]
    pub env_keys: Vec<String>,
    #[serde(default)]
    pub authors: Vec<String>,
}
