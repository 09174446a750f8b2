//! Core scanner data types
//!
//! - `EntityCategory` - what kind of thing a mention names
//! - `GenerationHint` - which generator template a Novel mention would use
//! - `RawCandidate` - one recognizer hit, positioned in the source text
//! - `AnnotatedEntity` - a candidate plus its knowledge-store outcome

use serde::{Deserialize, Serialize};

// =============================================================================
// Category
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityCategory {
    Character,
    Place,
    Item,
    Organization,
}

impl EntityCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityCategory::Character => "character",
            EntityCategory::Place => "place",
            EntityCategory::Item => "item",
            EntityCategory::Organization => "organization",
        }
    }

    /// Generator template used when a pattern carries no explicit hint
    pub fn default_hint(&self) -> GenerationHint {
        let template = match self {
            EntityCategory::Character => "npc",
            EntityCategory::Place => "location",
            EntityCategory::Item => "item",
            EntityCategory::Organization => "organization",
        };
        GenerationHint::new(template)
    }

    /// Parse a loose category name ("npc", "LOCATION", "faction", ...)
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "character" | "npc" | "person" => Some(EntityCategory::Character),
            "place" | "location" | "landmark" => Some(EntityCategory::Place),
            "item" | "object" | "artifact" => Some(EntityCategory::Item),
            "organization" | "organisation" | "faction" | "group" => {
                Some(EntityCategory::Organization)
            }
            _ => None,
        }
    }
}

// =============================================================================
// Generation Hint
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenerationHint {
    /// Generator template ("npc", "location", "item", "organization")
    pub template: String,
    /// Finer-grained kind, mostly for places ("tavern", "temple", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
}

impl GenerationHint {
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
            subtype: None,
        }
    }

    pub fn with_subtype(template: &str, subtype: &str) -> Self {
        Self {
            template: template.to_string(),
            subtype: Some(subtype.to_string()),
        }
    }
}

// =============================================================================
// Candidates
// =============================================================================

/// A single recognizer hit.
///
/// `start`/`end` are byte offsets into the scanned text, half-open, and
/// always fall on char boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCandidate {
    /// Matched substring, exactly as it appears in the source
    pub text: String,
    /// Canonical display name
    pub name: String,
    pub category: EntityCategory,
    pub generation_hint: Option<GenerationHint>,
    pub start: usize,
    pub end: usize,
    /// Index in the flattened, registry-ordered scan
    pub priority_rank: usize,
    /// Id of the rule that produced this candidate
    pub rule: String,
}

impl RawCandidate {
    pub fn overlaps(&self, other: &RawCandidate) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Case-folded name used for uniqueness checks and store lookups
    pub fn name_key(&self) -> String {
        self.name.to_lowercase()
    }
}

/// Engine output unit: a surviving candidate plus its reconciliation outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedEntity {
    pub text: String,
    pub name: String,
    pub category: EntityCategory,
    pub generation_hint: Option<GenerationHint>,
    /// Byte offsets into the source text
    pub start: usize,
    pub end: usize,
    /// Unicode scalar offsets, for consumers that index by character
    pub char_start: usize,
    pub char_end: usize,
    pub priority_rank: usize,
    pub rule: String,
    pub exists_in_store: bool,
    pub store_record_id: Option<String>,
    pub store_record_type: Option<String>,
}

impl AnnotatedEntity {
    /// Known entity, linked to an existing store record
    pub fn known(candidate: RawCandidate, record_id: String, record_type: String) -> Self {
        let mut entity = Self::from_candidate(candidate);
        entity.exists_in_store = true;
        entity.store_record_id = Some(record_id);
        entity.store_record_type = Some(record_type);
        entity
    }

    /// Novel entity, a candidate for on-demand generation
    pub fn novel(candidate: RawCandidate) -> Self {
        Self::from_candidate(candidate)
    }

    fn from_candidate(candidate: RawCandidate) -> Self {
        Self {
            text: candidate.text,
            name: candidate.name,
            category: candidate.category,
            generation_hint: candidate.generation_hint,
            start: candidate.start,
            end: candidate.end,
            // filled in by the assembler
            char_start: 0,
            char_end: 0,
            priority_rank: candidate.priority_rank,
            rule: candidate.rule,
            exists_in_store: false,
            store_record_id: None,
            store_record_type: None,
        }
    }
}
