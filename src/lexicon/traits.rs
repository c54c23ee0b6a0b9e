//! Read and extension contracts for lexicons.
//!
//! All lookups normalize the queried name with
//! [`normalize_name`](super::normalize_name), so callers may pass names in
//! any surface form.

use crate::entity::{EntityId, EntityType, TermId};
use crate::error::ValidationError;
use crate::lexicon::LexicalEntry;

/// Lexicon of a source or target ontology.
///
/// Lexicons are append-only: [`add`](Lexicon::add) never removes or
/// rewrites an existing entry.
pub trait Lexicon: Send + Sync {
    /// Distinct normalized names borne by entities of `entity_type`, ascending.
    fn names(&self, entity_type: EntityType) -> Vec<&str>;

    /// Entities of `entity_type` bearing `name`, ascending. Empty if none.
    fn entities(&self, entity_type: EntityType, name: &str) -> Vec<EntityId>;

    /// Weight of `name` for `entity`, corrected for name specificity.
    ///
    /// Returns 0.0 when the entity does not bear the name.
    fn corrected_weight(&self, name: &str, entity: EntityId) -> f64;

    /// Appends an entry.
    ///
    /// Returns true if the `(name, entity)` pair is new. Re-adding an
    /// existing pair records the entry alongside the existing ones; the
    /// pair's weight is the highest among them.
    ///
    /// # Errors
    /// - `EmptyName`: if the name normalizes to the empty string
    fn add(&mut self, entry: LexicalEntry) -> Result<bool, ValidationError>;
}

/// Lexicon of a mediating (background) vocabulary.
pub trait MediatorLexicon: Send + Sync {
    /// Terms bearing `name`, ascending. Empty if none.
    fn entities(&self, name: &str) -> Vec<TermId>;

    /// Weight of `name` for `term`; 0.0 when the term does not bear it.
    fn weight(&self, name: &str, term: TermId) -> f64;

    /// Every name of `term`, ascending.
    fn names(&self, term: TermId) -> Vec<String>;
}
