//! Error types for ontalign.
//!
//! All errors are strongly typed using thiserror so callers can match on
//! the specific condition. Matching and selection are deterministic,
//! in-memory computations: none of these errors is transient.

use thiserror::Error;

use crate::entity::EntityType;

/// Validation errors raised while building configuration or data values.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Similarity value {value} is out of range [0.0, 1.0]")]
    SimilarityOutOfRange {
        value: f64,
    },

    #[error("Threshold {value} is out of range [0.0, 1.0]")]
    ThresholdOutOfRange {
        value: f64,
    },

    #[error("Worker count must be at least 1 (got {workers})")]
    InvalidWorkerCount {
        workers: usize,
    },

    #[error("Lexical name cannot be empty")]
    EmptyName,
}

impl ValidationError {
    /// Accepts thresholds in `[0, 1]`.
    pub(crate) fn check_threshold(value: f64) -> Result<f64, Self> {
        if (0.0..=1.0).contains(&value) {
            Ok(value)
        } else {
            Err(Self::ThresholdOutOfRange { value })
        }
    }
}

/// Errors raised by matchers, filters and flaggers.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Entity type '{entity_type}' is not supported by this matcher")]
    UnsupportedEntityType {
        entity_type: EntityType,
    },

    #[error("Cannot process a {representation} alignment; a simple alignment is required")]
    IncompatibleAlignment {
        representation: &'static str,
    },
}

/// Top-level error type for ontalign.
#[derive(Debug, Error)]
pub enum AlignError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Match error: {0}")]
    Match(#[from] MatchError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl AlignError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a matcher/filter error.
    #[must_use]
    pub const fn is_match(&self) -> bool {
        matches!(self, Self::Match(_))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }
}

/// Result type alias for ontalign operations.
pub type AlignResult<T> = Result<T, AlignError>;
