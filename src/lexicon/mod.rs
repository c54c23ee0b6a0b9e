//! Lexicons: names, the entities bearing them, and name weights.
//!
//! Matchers read lexicons through the [`Lexicon`] and [`MediatorLexicon`]
//! traits. In-memory implementations are provided for embedded use and
//! tests; loading lexicons from ontology files happens elsewhere.

mod memory;
mod traits;

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, EntityType};

pub use memory::{InMemoryLexicon, InMemoryMediatorLexicon};
pub use traits::{Lexicon, MediatorLexicon};

/// Provenance of a lexical entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LexicalType {
    /// Derived from the entity's URI fragment.
    LocalName,
    /// An rdfs:label or equivalent.
    Label,
    /// An exact synonym annotation.
    ExactSynonym,
    /// A broad, narrow or related synonym annotation.
    OtherSynonym,
    /// A formula or symbol.
    FormulaName,
    /// Imported from a matching external vocabulary.
    ExternalMatch,
}

impl LexicalType {
    /// Default weight for entries of this provenance.
    #[must_use]
    pub const fn default_weight(self) -> f64 {
        match self {
            Self::LocalName => 1.0,
            Self::Label => 0.95,
            Self::ExactSynonym => 0.9,
            Self::OtherSynonym => 0.85,
            Self::FormulaName => 0.8,
            Self::ExternalMatch => 0.7,
        }
    }
}

impl fmt::Display for LexicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalName => write!(f, "local name"),
            Self::Label => write!(f, "label"),
            Self::ExactSynonym => write!(f, "exact synonym"),
            Self::OtherSynonym => write!(f, "other synonym"),
            Self::FormulaName => write!(f, "formula"),
            Self::ExternalMatch => write!(f, "external match"),
        }
    }
}

/// A name attached to an entity, with its provenance and weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexicalEntry {
    /// Entity bearing the name.
    pub entity: EntityId,
    /// Type the entity is filed under.
    pub entity_type: EntityType,
    /// The name; normalized when stored.
    pub name: String,
    /// Language tag.
    pub language: String,
    /// Where the name came from.
    pub provenance: LexicalType,
    /// Vocabulary the name was imported from, for external matches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,
    /// Name weight before frequency correction.
    pub weight: f64,
}

impl LexicalEntry {
    /// English entry with the provenance's default weight.
    #[must_use]
    pub fn new(
        entity: EntityId,
        entity_type: EntityType,
        name: impl Into<String>,
        provenance: LexicalType,
    ) -> Self {
        Self {
            entity,
            entity_type,
            name: name.into(),
            language: "en".to_string(),
            provenance,
            source_uri: None,
            weight: provenance.default_weight(),
        }
    }

    /// Overrides the weight.
    #[must_use]
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Overrides the language tag.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Records the URI of the vocabulary the name came from.
    #[must_use]
    pub fn with_source_uri(mut self, uri: impl Into<String>) -> Self {
        self.source_uri = Some(uri.into());
        self
    }
}

struct NamePatterns {
    camel: Regex,
    separators: Regex,
}

fn name_patterns() -> &'static NamePatterns {
    static PATTERNS: OnceLock<NamePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| NamePatterns {
        camel: Regex::new(r"([a-z0-9])([A-Z])").expect("invalid camel case regex"),
        separators: Regex::new(r"[\s_\-]+").expect("invalid separator regex"),
    })
}

/// Normalizes a name for lexical comparison.
///
/// camelCase boundaries become spaces, the result is lowercased, and runs
/// of whitespace, underscores and hyphens collapse to a single space.
///
/// ```
/// use ontalign::lexicon::normalize_name;
///
/// assert_eq!(normalize_name("HeartValve"), "heart valve");
/// assert_eq!(normalize_name(" heart__valve-"), "heart valve");
/// ```
#[must_use]
pub fn normalize_name(name: &str) -> String {
    let patterns = name_patterns();
    let split = patterns.camel.replace_all(name, "$1 $2");
    let lowered = split.to_lowercase();
    patterns
        .separators
        .replace_all(&lowered, " ")
        .trim()
        .to_string()
}
