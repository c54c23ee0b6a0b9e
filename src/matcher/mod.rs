//! Matchers: algorithms that produce alignments from lexicons.
//!
//! Matchers receive the source and target lexicons explicitly; there is
//! no ambient session. A matcher that can also enrich lexicons implements
//! [`LexiconExtender`].

mod mediating;

use serde::{Deserialize, Serialize};

use crate::alignment::Alignment;
use crate::entity::EntityType;
use crate::error::{AlignResult, MatchError, ValidationError};
use crate::lexicon::Lexicon;

pub use mediating::{compose_relations, MediatingMatcher};

/// Produces an alignment between a source and a target lexicon.
pub trait Matcher {
    /// Short display name.
    fn name(&self) -> &'static str;

    /// One-paragraph description of the algorithm.
    fn description(&self) -> &'static str;

    /// Entity types this matcher can align.
    fn supported_entity_types(&self) -> &'static [EntityType];

    /// Fails with `UnsupportedEntityType` unless `entity_type` is supported.
    ///
    /// # Errors
    /// - `UnsupportedEntityType`: if the type is not in
    ///   [`supported_entity_types`](Matcher::supported_entity_types)
    fn check_entity_type(&self, entity_type: EntityType) -> Result<(), MatchError> {
        if self.supported_entity_types().contains(&entity_type) {
            Ok(())
        } else {
            Err(MatchError::UnsupportedEntityType { entity_type })
        }
    }

    /// Aligns entities of `entity_type`.
    ///
    /// # Errors
    /// - `UnsupportedEntityType`: for unsupported types
    /// - `ThresholdOutOfRange`: if `threshold` is outside `[0, 1]`
    fn match_entities(
        &self,
        source: &dyn Lexicon,
        target: &dyn Lexicon,
        entity_type: EntityType,
        threshold: f64,
    ) -> AlignResult<Alignment>;
}

/// Enriches lexicons with names harvested from an external source.
pub trait LexiconExtender {
    /// Extends both lexicons and returns the number of new names added.
    ///
    /// Extension is append-only; it needs exclusive access to each lexicon,
    /// so it cannot overlap with matching that reads the same lexicon.
    ///
    /// # Errors
    /// Propagates lexicon validation failures.
    fn extend_lexicons(
        &self,
        source: &mut dyn Lexicon,
        target: &mut dyn Lexicon,
    ) -> AlignResult<usize>;
}

/// Matcher tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatcherConfig {
    workers: usize,
}

impl MatcherConfig {
    /// Validated configuration.
    ///
    /// # Errors
    /// - `InvalidWorkerCount`: if `workers` is 0
    pub fn new(workers: usize) -> Result<Self, ValidationError> {
        if workers == 0 {
            return Err(ValidationError::InvalidWorkerCount { workers });
        }
        Ok(Self { workers })
    }

    /// Threads used to score lexicon names. 1 scores on the calling thread.
    #[must_use]
    pub const fn workers(&self) -> usize {
        self.workers
    }
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self { workers: 1 }
    }
}

impl<'de> Deserialize<'de> for MatcherConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            #[serde(default = "default_workers")]
            workers: usize,
        }

        fn default_workers() -> usize {
            1
        }

        let raw = Raw::deserialize(deserializer)?;
        MatcherConfig::new(raw.workers).map_err(serde::de::Error::custom)
    }
}
