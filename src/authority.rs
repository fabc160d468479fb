//! Field authority declarations and the merge resolution rule

use crate::error::SyncError;
use crate::model::Field;
use crate::source::SourceKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Declaration that one source kind is the source of truth for a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAuthority {
    pub field: Field,
    pub kind: SourceKind,
}

/// Where a merged field value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldOrigin {
    pub kind: SourceKind,
    /// Source priority at fetch time
    pub priority: i32,
    /// Position in the registry's stable enumeration, used as tie-breaker
    pub order: usize,
}

/// Declaration-ordered table of field authorities
///
/// The table expresses domain knowledge such as "the curated local catalog
/// owns hand-edited descriptive fields, the live provider API owns current
/// capability limits". Order is declaration order, never runtime priority.
#[derive(Debug, Clone)]
pub struct AuthorityTable {
    entries: Vec<FieldAuthority>,
}

impl AuthorityTable {
    /// Build a table, rejecting conflicting declarations
    ///
    /// At most one source kind may claim a given field; a duplicate is a
    /// construction-time error rather than a silent last-wins.
    pub fn new(entries: Vec<FieldAuthority>) -> Result<Self, SyncError> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.field) {
                return Err(SyncError::AuthorityConflict { field: entry.field });
            }
        }
        Ok(Self { entries })
    }

    /// Table with no declarations; every field falls to the priority rule
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// The declared authority for a field, if any
    pub fn authority_for(&self, field: Field) -> Option<SourceKind> {
        self.entries
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.kind)
    }

    /// The subset of declarations claimed by one source kind
    pub fn for_kind(&self, kind: SourceKind) -> Vec<FieldAuthority> {
        self.entries
            .iter()
            .filter(|e| e.kind == kind)
            .copied()
            .collect()
    }

    pub fn entries(&self) -> &[FieldAuthority] {
        &self.entries
    }

    /// Decide whether an incoming field value replaces the held one
    ///
    /// A declared authority wins only while its kind is among the
    /// participating sources of this run; an unavailable authority falls
    /// back to the priority rule. Emptiness is checked by the caller, so
    /// this only ever compares two non-empty values.
    pub fn incoming_wins(
        &self,
        field: Field,
        participants: &BTreeSet<SourceKind>,
        held: FieldOrigin,
        incoming: FieldOrigin,
    ) -> bool {
        if let Some(kind) = self.authority_for(field)
            && participants.contains(&kind)
        {
            match (held.kind == kind, incoming.kind == kind) {
                (true, false) => return false,
                (false, true) => return true,
                // Both or neither match the authority: priority decides
                _ => {}
            }
        }

        incoming.priority > held.priority
            || (incoming.priority == held.priority && incoming.order >= held.order)
    }
}

impl Default for AuthorityTable {
    /// The built-in authority declarations
    ///
    /// The local curated catalog owns descriptive fields a human maintains;
    /// the live API owns the limits the vendor currently advertises.
    fn default() -> Self {
        Self {
            entries: vec![
                FieldAuthority {
                    field: Field::Name,
                    kind: SourceKind::LocalCatalog,
                },
                FieldAuthority {
                    field: Field::Description,
                    kind: SourceKind::LocalCatalog,
                },
                FieldAuthority {
                    field: Field::Generation,
                    kind: SourceKind::LocalCatalog,
                },
                FieldAuthority {
                    field: Field::ContextWindow,
                    kind: SourceKind::ProviderApi,
                },
                FieldAuthority {
                    field: Field::MaxOutputTokens,
                    kind: SourceKind::ProviderApi,
                },
            ],
        }
    }
}
