//! Scored correspondences between two entities.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, EntityRegistry};
use crate::error::ValidationError;

/// Validation status of a mapping.
///
/// `Correct` and `Incorrect` record a judgment (manual or automatic) that
/// selection must honour; `Flagged` marks a mapping that is part of an
/// unresolved cardinality conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingStatus {
    /// Not yet judged.
    #[default]
    Unknown,
    /// In conflict with another mapping; needs review.
    Flagged,
    /// Judged correct.
    Correct,
    /// Judged incorrect.
    Incorrect,
}

impl fmt::Display for MappingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Flagged => write!(f, "flagged"),
            Self::Correct => write!(f, "correct"),
            Self::Incorrect => write!(f, "incorrect"),
        }
    }
}

/// A correspondence between a source entity and a target entity.
///
/// Identity is the `(entity1, entity2)` pair: two mappings between the
/// same entities compare equal regardless of similarity or status.
#[derive(Debug, Clone, Serialize)]
pub struct Mapping {
    entity1: EntityId,
    entity2: EntityId,
    similarity: f64,
    status: MappingStatus,
}

impl Mapping {
    /// Creates an `Unknown` mapping; similarity is clamped into `[0, 1]`.
    #[must_use]
    pub fn new(entity1: EntityId, entity2: EntityId, similarity: f64) -> Self {
        Self::with_status(entity1, entity2, similarity, MappingStatus::Unknown)
    }

    /// Creates a mapping with an explicit status.
    #[must_use]
    pub fn with_status(
        entity1: EntityId,
        entity2: EntityId,
        similarity: f64,
        status: MappingStatus,
    ) -> Self {
        Self {
            entity1,
            entity2,
            similarity: clamp_similarity(similarity),
            status,
        }
    }

    /// Creates a mapping, rejecting similarities outside `[0, 1]`.
    pub fn checked(
        entity1: EntityId,
        entity2: EntityId,
        similarity: f64,
    ) -> Result<Self, ValidationError> {
        if !(0.0..=1.0).contains(&similarity) {
            return Err(ValidationError::SimilarityOutOfRange { value: similarity });
        }
        Ok(Self::new(entity1, entity2, similarity))
    }

    /// The source-side entity.
    #[must_use]
    pub const fn entity1(&self) -> EntityId {
        self.entity1
    }

    /// The target-side entity.
    #[must_use]
    pub const fn entity2(&self) -> EntityId {
        self.entity2
    }

    /// The `(entity1, entity2)` identity key.
    #[must_use]
    pub const fn key(&self) -> (EntityId, EntityId) {
        (self.entity1, self.entity2)
    }

    /// Similarity in `[0, 1]`.
    #[must_use]
    pub const fn similarity(&self) -> f64 {
        self.similarity
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> MappingStatus {
        self.status
    }

    /// Returns true if the two mappings share a source or a target entity.
    #[must_use]
    pub fn shares_endpoint(&self, other: &Self) -> bool {
        self.entity1 == other.entity1 || self.entity2 == other.entity2
    }

    /// Renders the mapping with local names from the registry.
    #[must_use]
    pub fn describe(&self, registry: &dyn EntityRegistry) -> String {
        let left = registry
            .local_name(self.entity1)
            .map_or_else(|| self.entity1.to_string(), str::to_string);
        let right = registry
            .local_name(self.entity2)
            .map_or_else(|| self.entity2.to_string(), str::to_string);
        format!("{left} = {right} ({:.3}, {})", self.similarity, self.status)
    }

    // Only the owning alignment mutates these.
    pub(crate) fn set_status(&mut self, status: MappingStatus) {
        self.status = status;
    }

    pub(crate) fn raise_similarity(&mut self, similarity: f64) {
        let similarity = clamp_similarity(similarity);
        if similarity > self.similarity {
            self.similarity = similarity;
        }
    }
}

fn clamp_similarity(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

impl<'de> Deserialize<'de> for Mapping {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            entity1: EntityId,
            entity2: EntityId,
            similarity: f64,
            #[serde(default)]
            status: MappingStatus,
        }

        let raw = Raw::deserialize(deserializer)?;
        Ok(Mapping::with_status(
            raw.entity1,
            raw.entity2,
            raw.similarity,
            raw.status,
        ))
    }
}

impl PartialEq for Mapping {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Mapping {}

impl Hash for Mapping {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} = {} ({:.3}, {})",
            self.entity1, self.entity2, self.similarity, self.status
        )
    }
}
