//! Filtering and flagging of alignments.
//!
//! A [`Filterer`] removes mappings; a [`Flagger`] only changes statuses.
//! Both accept any alignment representation but only operate on simple
//! alignments. [`Selector`] implements both roles.

mod policies;
mod selector;

use crate::alignment::AnyAlignment;
use crate::error::AlignResult;

pub use policies::{
    SelectionPolicy, SelectorConfig, AUTO_HYBRID_CARDINALITY, HYBRID_MAX_CARDINALITY,
    HYBRID_SIMILARITY,
};
pub use selector::{flag_conflicts, Selector};

/// Removes mappings from an alignment.
pub trait Filterer {
    /// Returns the filtered alignment.
    ///
    /// # Errors
    /// - `IncompatibleAlignment`: if the representation is not supported and
    ///   the filterer is configured to refuse it
    fn filter(&self, alignment: AnyAlignment) -> AlignResult<AnyAlignment>;
}

/// Marks suspicious mappings without removing any.
pub trait Flagger {
    /// Flags mappings in place and returns how many were newly flagged.
    ///
    /// # Errors
    /// - `IncompatibleAlignment`: if the representation is not supported and
    ///   the flagger is configured to refuse it
    fn flag(&self, alignment: &mut AnyAlignment) -> AlignResult<usize>;
}
