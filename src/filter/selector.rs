//! Cardinality-based selection and conflict flagging.

use std::time::Instant;

use tracing::{info, warn};

use crate::alignment::{Alignment, AnyAlignment};
use crate::diagnostics::elapsed_ms;
use crate::error::{AlignResult, MatchError, ValidationError};
use crate::filter::policies::{
    SelectionPolicy, SelectorConfig, HYBRID_MAX_CARDINALITY, HYBRID_SIMILARITY,
};
use crate::filter::{Filterer, Flagger};
use crate::mapping::{Mapping, MappingStatus};

/// Greedy selector over similarity-ranked mappings.
///
/// Candidates are visited in descending similarity order and each one is
/// judged against the mappings already selected:
///
/// - `Correct` mappings are always selected.
/// - `Incorrect` mappings and mappings below the threshold never are.
/// - Everything else must satisfy the [`SelectionPolicy`].
///
/// If anything was discarded, mappings left `Flagged` in the output are
/// reset to `Unknown`: the conflicts they were flagged for are resolved.
#[derive(Debug, Clone, Default)]
pub struct Selector {
    config: SelectorConfig,
}

impl Selector {
    /// Selector with the given threshold and policy.
    ///
    /// # Errors
    /// - `ThresholdOutOfRange`: if `threshold` is outside `[0, 1]`
    pub fn new(threshold: f64, policy: SelectionPolicy) -> Result<Self, ValidationError> {
        Ok(Self::from_config(SelectorConfig::new(threshold, policy)?))
    }

    /// Selector from an already validated configuration.
    #[must_use]
    pub fn from_config(config: SelectorConfig) -> Self {
        Self { config }
    }

    /// Selector whose policy is inferred from `alignment`.
    ///
    /// # Errors
    /// - `ThresholdOutOfRange`: if `threshold` is outside `[0, 1]`
    pub fn automatic(threshold: f64, alignment: &Alignment) -> Result<Self, ValidationError> {
        Self::new(threshold, SelectionPolicy::infer(alignment))
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Selects from a simple alignment.
    ///
    /// The result does not depend on the order of the input.
    #[must_use]
    pub fn select(&self, alignment: Alignment) -> Alignment {
        let started = Instant::now();
        let (threshold, policy) = (self.config.threshold(), self.config.policy());
        info!(policy = %policy, threshold, candidates = alignment.len(), "performing selection");

        let total = alignment.len();
        let mut ranked = alignment;
        ranked.sort_descending();

        let mut out = Alignment::new();
        for m in ranked {
            if self.accepts(&out, &m) {
                out.insert(m);
            }
        }

        if out.len() < total {
            let flagged: Vec<_> = out
                .iter()
                .filter(|m| m.status() == MappingStatus::Flagged)
                .map(Mapping::key)
                .collect();
            for (entity1, entity2) in flagged {
                out.set_status(entity1, entity2, MappingStatus::Unknown);
            }
        }

        info!(
            policy = %policy,
            kept = out.len(),
            discarded = total - out.len(),
            elapsed_ms = elapsed_ms(started),
            "selection finished"
        );
        out
    }

    /// Flags conflicting `Unknown` mappings. See [`flag_conflicts`].
    pub fn flag_alignment(&self, alignment: &mut Alignment) -> usize {
        let started = Instant::now();
        info!(mappings = alignment.len(), "running cardinality flagger");
        let flagged = flag_conflicts(alignment);
        info!(flagged, elapsed_ms = elapsed_ms(started), "cardinality flagger finished");
        flagged
    }

    fn accepts(&self, out: &Alignment, m: &Mapping) -> bool {
        match m.status() {
            MappingStatus::Correct => return true,
            MappingStatus::Incorrect => return false,
            MappingStatus::Unknown | MappingStatus::Flagged => {}
        }
        if m.similarity() < self.config.threshold() {
            return false;
        }
        match self.config.policy() {
            SelectionPolicy::Strict => !out.contains_conflict(m),
            SelectionPolicy::Permissive => !out.contains_better_mapping(m),
            SelectionPolicy::Hybrid => {
                if m.similarity() > HYBRID_SIMILARITY {
                    out.cardinality(m.entity1()) < HYBRID_MAX_CARDINALITY
                        && out.cardinality(m.entity2()) < HYBRID_MAX_CARDINALITY
                } else {
                    !out.contains_better_mapping(m)
                }
            }
        }
    }

    // Ok when a non-simple alignment may be passed through untouched.
    fn check_incompatible(&self, alignment: &AnyAlignment, operation: &str) -> AlignResult<()> {
        let representation = alignment.representation();
        if self.config.reject_incompatible() {
            return Err(MatchError::IncompatibleAlignment { representation }.into());
        }
        warn!(representation, operation, "cannot process non-simple alignment; passing through");
        Ok(())
    }
}

/// Marks every `Unknown` mapping that conflicts with another mapping of
/// the same alignment as `Flagged`.
///
/// Other statuses are left alone and nothing is added or removed, so a
/// second call flags nothing. Returns the number of mappings flagged.
pub fn flag_conflicts(alignment: &mut Alignment) -> usize {
    let conflicting: Vec<_> = alignment
        .iter()
        .filter(|m| m.status() == MappingStatus::Unknown && alignment.contains_conflict(m))
        .map(Mapping::key)
        .collect();
    for &(entity1, entity2) in &conflicting {
        alignment.set_status(entity1, entity2, MappingStatus::Flagged);
    }
    conflicting.len()
}

impl Filterer for Selector {
    fn filter(&self, alignment: AnyAlignment) -> AlignResult<AnyAlignment> {
        match alignment {
            AnyAlignment::Simple(simple) => Ok(AnyAlignment::Simple(self.select(simple))),
            complex @ AnyAlignment::Complex(_) => {
                self.check_incompatible(&complex, "filter")?;
                Ok(complex)
            }
        }
    }
}

impl Flagger for Selector {
    fn flag(&self, alignment: &mut AnyAlignment) -> AlignResult<usize> {
        if let AnyAlignment::Simple(simple) = alignment {
            return Ok(self.flag_alignment(simple));
        }
        self.check_incompatible(alignment, "flag")?;
        Ok(0)
    }
}
