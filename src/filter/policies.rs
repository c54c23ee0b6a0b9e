use std::fmt;

use serde::{Deserialize, Serialize};

use crate::alignment::Alignment;
use crate::error::ValidationError;

/// Similarity above which HYBRID selection tolerates a second mapping per entity.
pub const HYBRID_SIMILARITY: f64 = 0.75;

/// HYBRID keeps a high-similarity mapping only while both endpoints have
/// fewer than this many selected mappings.
pub const HYBRID_MAX_CARDINALITY: usize = 2;

/// Mean cardinality at or above which [`SelectionPolicy::infer`] picks HYBRID.
pub const AUTO_HYBRID_CARDINALITY: f64 = 1.4;

/// Multiplicity policy applied during selection.
///
/// Policies are pure functions of the candidate and the mappings selected
/// so far, so selection over the same alignment is reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// One-to-one: a mapping is rejected if either endpoint is already used.
    #[default]
    Strict,

    /// Mappings tied with the best mapping of an endpoint may coexist.
    Permissive,

    /// Up to two mappings per entity above [`HYBRID_SIMILARITY`];
    /// permissive below it.
    Hybrid,
}

impl SelectionPolicy {
    /// Returns a short stable identifier suitable for logging/debugging.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Permissive => "permissive",
            Self::Hybrid => "hybrid",
        }
    }

    /// Picks a policy from the shape of a candidate alignment.
    ///
    /// Alignments where entities average [`AUTO_HYBRID_CARDINALITY`] or more
    /// mappings get HYBRID; everything else gets STRICT.
    #[must_use]
    pub fn infer(alignment: &Alignment) -> Self {
        if alignment.mean_cardinality() >= AUTO_HYBRID_CARDINALITY {
            Self::Hybrid
        } else {
            Self::Strict
        }
    }
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Selection settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectorConfig {
    threshold: f64,
    policy: SelectionPolicy,
    reject_incompatible: bool,
}

impl SelectorConfig {
    /// Default similarity threshold.
    pub const DEFAULT_THRESHOLD: f64 = 0.6;

    /// Construct a validated configuration that passes complex alignments
    /// through.
    ///
    /// # Errors
    /// - `ThresholdOutOfRange`: if `threshold` is outside `[0, 1]`
    pub fn new(threshold: f64, policy: SelectionPolicy) -> Result<Self, ValidationError> {
        Ok(Self {
            threshold: ValidationError::check_threshold(threshold)?,
            policy,
            reject_incompatible: false,
        })
    }

    /// Refuse complex alignments with an error.
    #[must_use]
    pub fn rejecting_incompatible(mut self) -> Self {
        self.reject_incompatible = true;
        self
    }

    /// Minimum similarity for a non-`Correct` mapping to be selected.
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Multiplicity policy.
    #[must_use]
    pub const fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    /// Whether complex alignments are refused instead of passed through.
    #[must_use]
    pub const fn reject_incompatible(&self) -> bool {
        self.reject_incompatible
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            threshold: Self::DEFAULT_THRESHOLD,
            policy: SelectionPolicy::default(),
            reject_incompatible: false,
        }
    }
}

impl<'de> Deserialize<'de> for SelectorConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            #[serde(default = "default_threshold")]
            threshold: f64,
            #[serde(default)]
            policy: SelectionPolicy,
            #[serde(default)]
            reject_incompatible: bool,
        }

        fn default_threshold() -> f64 {
            SelectorConfig::DEFAULT_THRESHOLD
        }

        let raw = Raw::deserialize(deserializer)?;
        let config =
            SelectorConfig::new(raw.threshold, raw.policy).map_err(serde::de::Error::custom)?;
        Ok(if raw.reject_incompatible {
            config.rejecting_incompatible()
        } else {
            config
        })
    }
}
