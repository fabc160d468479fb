//! Catalog Sync - multi-source AI model catalog synchronizer
//!
//! Aggregates model metadata from a locally persisted catalog and live
//! provider APIs into one consistent, deduplicated catalog snapshot, with
//! per-field authority reconciliation and isolated per-source failures.

pub mod authority;
pub mod catalog;
pub mod config;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod registry;
pub mod source;
pub mod sync;

pub use authority::{AuthorityTable, FieldAuthority, FieldOrigin};
pub use catalog::{Catalog, CatalogBuilder, MergeIssue, MergeStrategy};
pub use config::{ProviderConfig, SyncConfig};
pub use error::{SourceError, SourceFailure, SyncError};
pub use model::{Field, Model, Provider};
pub use orchestrator::{FetchOrchestrator, FetchResults, FetchSuccess};
pub use registry::SourceRegistry;
pub use source::{
    ApiSource, HttpAdapter, LOCAL_SOURCE_ID, LocalCatalogSource, ProviderAdapter, Source,
    SourceKind,
};
pub use sync::{SyncOptions, SyncReport, Synchronizer};
