//! Alignments: ordered sets of mappings with cardinality queries.
//!
//! An [`Alignment`] never holds two mappings for the same
//! `(entity1, entity2)` pair. Re-adding a pair keeps the higher similarity,
//! so a matcher that reaches the same pair through several paths reports
//! its best evidence rather than an accumulated sum.

use std::collections::HashMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, EntityRegistry};
use crate::expression::ComplexAlignment;
use crate::mapping::{Mapping, MappingStatus};

/// Simple (entity-to-entity) alignment.
///
/// Iteration follows insertion order until [`sort_descending`] is called.
///
/// [`sort_descending`]: Alignment::sort_descending
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Mapping>", into = "Vec<Mapping>")]
pub struct Alignment {
    mappings: Vec<Mapping>,
    index: HashMap<(EntityId, EntityId), usize>,
    by_source: HashMap<EntityId, Vec<usize>>,
    by_target: HashMap<EntityId, Vec<usize>>,
}

impl Alignment {
    /// Creates an empty alignment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates and inserts an `Unknown` mapping.
    ///
    /// If `(entity1, entity2)` is already present its similarity becomes the
    /// maximum of the two values and its status is left untouched. Returns
    /// true if a new mapping was added.
    pub fn add(&mut self, entity1: EntityId, entity2: EntityId, similarity: f64) -> bool {
        self.insert(Mapping::new(entity1, entity2, similarity))
    }

    /// Inserts a mapping, merging with an existing one as [`add`](Self::add) does.
    pub fn insert(&mut self, mapping: Mapping) -> bool {
        if let Some(&pos) = self.index.get(&mapping.key()) {
            self.mappings[pos].raise_similarity(mapping.similarity());
            return false;
        }

        let pos = self.mappings.len();
        self.index.insert(mapping.key(), pos);
        self.by_source.entry(mapping.entity1()).or_default().push(pos);
        self.by_target.entry(mapping.entity2()).or_default().push(pos);
        self.mappings.push(mapping);
        true
    }

    /// Removes the mapping for `(entity1, entity2)`, preserving the order of
    /// the remaining mappings.
    pub fn remove(&mut self, entity1: EntityId, entity2: EntityId) -> Option<Mapping> {
        let pos = self.index.get(&(entity1, entity2)).copied()?;
        let removed = self.mappings.remove(pos);
        self.reindex();
        Some(removed)
    }

    /// Mapping for `(entity1, entity2)`.
    #[must_use]
    pub fn get(&self, entity1: EntityId, entity2: EntityId) -> Option<&Mapping> {
        self.index.get(&(entity1, entity2)).map(|&pos| &self.mappings[pos])
    }

    /// Returns true if `(entity1, entity2)` is mapped.
    #[must_use]
    pub fn contains(&self, entity1: EntityId, entity2: EntityId) -> bool {
        self.index.contains_key(&(entity1, entity2))
    }

    /// Similarity of `(entity1, entity2)`.
    #[must_use]
    pub fn similarity(&self, entity1: EntityId, entity2: EntityId) -> Option<f64> {
        self.get(entity1, entity2).map(Mapping::similarity)
    }

    /// Sets the status of a contained mapping. Returns false if absent.
    pub fn set_status(
        &mut self,
        entity1: EntityId,
        entity2: EntityId,
        status: MappingStatus,
    ) -> bool {
        match self.index.get(&(entity1, entity2)) {
            Some(&pos) => {
                self.mappings[pos].set_status(status);
                true
            }
            None => false,
        }
    }

    /// Number of mappings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Returns true if there are no mappings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Iterates mappings in the current order.
    pub fn iter(&self) -> std::slice::Iter<'_, Mapping> {
        self.mappings.iter()
    }

    /// Mappings whose source entity is `entity`.
    pub fn source_mappings(&self, entity: EntityId) -> impl Iterator<Item = &Mapping> + '_ {
        self.positions(&self.by_source, entity)
    }

    /// Mappings whose target entity is `entity`.
    pub fn target_mappings(&self, entity: EntityId) -> impl Iterator<Item = &Mapping> + '_ {
        self.positions(&self.by_target, entity)
    }

    /// Distinct source entities, ascending.
    #[must_use]
    pub fn source_entities(&self) -> Vec<EntityId> {
        let mut entities: Vec<EntityId> = self.by_source.keys().copied().collect();
        entities.sort_unstable();
        entities
    }

    /// Distinct target entities, ascending.
    #[must_use]
    pub fn target_entities(&self) -> Vec<EntityId> {
        let mut entities: Vec<EntityId> = self.by_target.keys().copied().collect();
        entities.sort_unstable();
        entities
    }

    /// Number of distinct source entities.
    #[must_use]
    pub fn source_count(&self) -> usize {
        self.by_source.len()
    }

    /// Number of distinct target entities.
    #[must_use]
    pub fn target_count(&self) -> usize {
        self.by_target.len()
    }

    /// Number of mappings in which `entity` appears on either side.
    #[must_use]
    pub fn cardinality(&self, entity: EntityId) -> usize {
        self.by_source.get(&entity).map_or(0, Vec::len)
            + self.by_target.get(&entity).map_or(0, Vec::len)
    }

    /// Average number of mappings per mapped entity.
    ///
    /// `2 * len / (sources + targets)`; 0 for an empty alignment.
    #[must_use]
    pub fn mean_cardinality(&self) -> f64 {
        let entities = self.by_source.len() + self.by_target.len();
        if entities == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = (2 * self.mappings.len()) as f64 / entities as f64;
        ratio
    }

    /// Returns true if another mapping shares `mapping`'s source or target.
    ///
    /// A contained mapping with the same key as `mapping` is not a conflict.
    #[must_use]
    pub fn contains_conflict(&self, mapping: &Mapping) -> bool {
        self.rivals(mapping).next().is_some()
    }

    /// Returns true if another mapping shares an endpoint with `mapping`
    /// and has a strictly higher similarity.
    ///
    /// Ties do not dominate: two mappings of equal similarity on the same
    /// entity can both survive permissive selection.
    #[must_use]
    pub fn contains_better_mapping(&self, mapping: &Mapping) -> bool {
        self.rivals(mapping)
            .any(|m| m.similarity() > mapping.similarity())
    }

    /// Number of mappings with the given status.
    #[must_use]
    pub fn status_count(&self, status: MappingStatus) -> usize {
        self.mappings.iter().filter(|m| m.status() == status).count()
    }

    /// Sorts by similarity descending.
    ///
    /// Ties are broken by `entity1` then `entity2` ascending, which makes the
    /// order a strict total order: the result does not depend on the order in
    /// which mappings were inserted.
    pub fn sort_descending(&mut self) {
        self.mappings.sort_by(|a, b| {
            b.similarity()
                .total_cmp(&a.similarity())
                .then_with(|| a.entity1().cmp(&b.entity1()))
                .then_with(|| a.entity2().cmp(&b.entity2()))
        });
        self.reindex();
    }

    /// One line per mapping, rendered with registry local names.
    #[must_use]
    pub fn describe(&self, registry: &dyn EntityRegistry) -> String {
        let mut out = String::new();
        for m in &self.mappings {
            let _ = writeln!(out, "{}", m.describe(registry));
        }
        out
    }

    fn positions<'a>(
        &'a self,
        index: &'a HashMap<EntityId, Vec<usize>>,
        entity: EntityId,
    ) -> impl Iterator<Item = &'a Mapping> + 'a {
        index
            .get(&entity)
            .into_iter()
            .flatten()
            .map(move |&pos| &self.mappings[pos])
    }

    fn rivals<'a>(&'a self, mapping: &'a Mapping) -> impl Iterator<Item = &'a Mapping> + 'a {
        self.source_mappings(mapping.entity1())
            .chain(self.target_mappings(mapping.entity2()))
            .filter(move |m| m.key() != mapping.key())
    }

    fn reindex(&mut self) {
        self.index.clear();
        self.by_source.clear();
        self.by_target.clear();
        for (pos, m) in self.mappings.iter().enumerate() {
            self.index.insert(m.key(), pos);
            self.by_source.entry(m.entity1()).or_default().push(pos);
            self.by_target.entry(m.entity2()).or_default().push(pos);
        }
    }
}

impl From<Vec<Mapping>> for Alignment {
    fn from(mappings: Vec<Mapping>) -> Self {
        mappings.into_iter().collect()
    }
}

impl From<Alignment> for Vec<Mapping> {
    fn from(alignment: Alignment) -> Self {
        alignment.mappings
    }
}

impl FromIterator<Mapping> for Alignment {
    fn from_iter<I: IntoIterator<Item = Mapping>>(iter: I) -> Self {
        let mut alignment = Self::new();
        for m in iter {
            alignment.insert(m);
        }
        alignment
    }
}

impl<'a> IntoIterator for &'a Alignment {
    type Item = &'a Mapping;
    type IntoIter = std::slice::Iter<'a, Mapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.mappings.iter()
    }
}

impl IntoIterator for Alignment {
    type Item = Mapping;
    type IntoIter = std::vec::IntoIter<Mapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.mappings.into_iter()
    }
}

/// Any alignment representation a pipeline may carry.
///
/// Filters and flaggers operate on [`Alignment`] only; complex
/// alignments are recognised so they can be refused or passed through.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "representation", content = "mappings", rename_all = "snake_case")]
pub enum AnyAlignment {
    /// Entity-to-entity mappings.
    Simple(Alignment),
    /// Expression-based correspondences.
    Complex(ComplexAlignment),
}

impl AnyAlignment {
    /// Short name of the representation, for diagnostics.
    #[must_use]
    pub const fn representation(&self) -> &'static str {
        match self {
            Self::Simple(_) => "simple",
            Self::Complex(_) => "complex",
        }
    }

    /// Number of correspondences.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Simple(a) => a.len(),
            Self::Complex(c) => c.len(),
        }
    }

    /// Returns true if there are no correspondences.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The simple alignment, if this is one.
    #[must_use]
    pub const fn as_simple(&self) -> Option<&Alignment> {
        match self {
            Self::Simple(a) => Some(a),
            Self::Complex(_) => None,
        }
    }

    /// Consumes `self`, returning the simple alignment if this is one.
    #[must_use]
    pub fn into_simple(self) -> Option<Alignment> {
        match self {
            Self::Simple(a) => Some(a),
            Self::Complex(_) => None,
        }
    }
}

impl From<Alignment> for AnyAlignment {
    fn from(alignment: Alignment) -> Self {
        Self::Simple(alignment)
    }
}

impl From<ComplexAlignment> for AnyAlignment {
    fn from(alignment: ComplexAlignment) -> Self {
        Self::Complex(alignment)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn id(i: u32) -> EntityId {
        EntityId::new(i)
    }

    fn keys(a: &Alignment) -> Vec<(u32, u32)> {
        a.iter()
            .map(|m| (m.entity1().index(), m.entity2().index()))
            .collect()
    }

    #[test]
    fn add_keeps_max_similarity_on_duplicate() {
        let mut a = Alignment::new();
        assert!(a.add(id(1), id(10), 0.5));
        assert!(!a.add(id(1), id(10), 0.4));
        assert_eq!(a.similarity(id(1), id(10)), Some(0.5));
        assert!(!a.add(id(1), id(10), 0.7));
        assert_eq!(a.similarity(id(1), id(10)), Some(0.7));
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn insert_duplicate_keeps_existing_status() {
        let mut a = Alignment::new();
        a.insert(Mapping::with_status(id(1), id(10), 0.3, MappingStatus::Correct));
        a.insert(Mapping::with_status(id(1), id(10), 0.8, MappingStatus::Incorrect));
        let m = a.get(id(1), id(10)).unwrap();
        assert_eq!(m.status(), MappingStatus::Correct);
        assert_eq!(m.similarity(), 0.8);
    }

    #[test]
    fn cardinality_counts_both_sides() {
        let mut a = Alignment::new();
        a.add(id(1), id(10), 0.9);
        a.add(id(1), id(11), 0.8);
        a.add(id(2), id(10), 0.7);
        assert_eq!(a.cardinality(id(1)), 2);
        assert_eq!(a.cardinality(id(10)), 2);
        assert_eq!(a.cardinality(id(11)), 1);
        assert_eq!(a.cardinality(id(99)), 0);
        assert_eq!(a.source_count(), 2);
        assert_eq!(a.target_count(), 2);
        assert_eq!(a.source_entities(), vec![id(1), id(2)]);
        assert_eq!(a.target_entities(), vec![id(10), id(11)]);
        assert_relative_eq!(a.mean_cardinality(), 1.5);
    }

    #[test]
    fn conflict_queries_exclude_same_key() {
        let mut a = Alignment::new();
        a.add(id(1), id(10), 0.6);

        // The same pair is never its own rival.
        assert!(!a.contains_conflict(&Mapping::new(id(1), id(10), 0.2)));
        assert!(!a.contains_better_mapping(&Mapping::new(id(1), id(10), 0.2)));

        let tied = Mapping::new(id(1), id(11), 0.6);
        assert!(a.contains_conflict(&tied));
        assert!(!a.contains_better_mapping(&tied));

        let weaker = Mapping::new(id(1), id(12), 0.59);
        assert!(a.contains_better_mapping(&weaker));

        let stronger = Mapping::new(id(2), id(10), 0.61);
        assert!(a.contains_conflict(&stronger));
        assert!(!a.contains_better_mapping(&stronger));

        let unrelated = Mapping::new(id(2), id(11), 0.1);
        assert!(!a.contains_conflict(&unrelated));
    }

    #[test]
    fn sort_descending_breaks_ties_by_entities() {
        let mut a = Alignment::new();
        a.add(id(3), id(30), 0.5);
        a.add(id(2), id(21), 0.9);
        a.add(id(1), id(10), 0.5);
        a.add(id(2), id(20), 0.9);
        a.sort_descending();
        assert_eq!(keys(&a), vec![(2, 20), (2, 21), (1, 10), (3, 30)]);

        // Indexes follow the new order.
        assert_eq!(a.similarity(id(3), id(30)), Some(0.5));
        assert_eq!(a.source_mappings(id(2)).count(), 2);
    }

    #[test]
    fn sort_is_insertion_order_independent() {
        let mut forward = Alignment::new();
        let mut backward = Alignment::new();
        let pairs = [(1, 10, 0.5), (2, 10, 0.5), (1, 11, 0.5), (3, 12, 0.7)];
        for &(s, t, w) in &pairs {
            forward.add(id(s), id(t), w);
        }
        for &(s, t, w) in pairs.iter().rev() {
            backward.add(id(s), id(t), w);
        }
        forward.sort_descending();
        backward.sort_descending();
        assert_eq!(keys(&forward), keys(&backward));
    }

    #[test]
    fn remove_reindexes() {
        let mut a = Alignment::new();
        a.add(id(1), id(10), 0.9);
        a.add(id(2), id(20), 0.8);
        a.add(id(3), id(30), 0.7);
        let removed = a.remove(id(1), id(10)).unwrap();
        assert_eq!(removed.key(), (id(1), id(10)));
        assert!(a.remove(id(1), id(10)).is_none());
        assert_eq!(keys(&a), vec![(2, 20), (3, 30)]);
        assert_eq!(a.similarity(id(3), id(30)), Some(0.7));
        assert_eq!(a.cardinality(id(1)), 0);
    }

    #[test]
    fn set_status_goes_through_alignment() {
        let mut a = Alignment::new();
        a.add(id(1), id(10), 0.9);
        assert!(a.set_status(id(1), id(10), MappingStatus::Flagged));
        assert!(!a.set_status(id(2), id(10), MappingStatus::Flagged));
        assert_eq!(a.status_count(MappingStatus::Flagged), 1);
        assert_eq!(a.status_count(MappingStatus::Unknown), 0);
    }

    #[test]
    fn empty_alignment_has_zero_mean_cardinality() {
        let a = Alignment::new();
        assert!(a.is_empty());
        assert_eq!(a.mean_cardinality(), 0.0);
    }

    #[test]
    fn serde_rebuilds_indexes_and_uniqueness() {
        let json = r#"[
            {"entity1": 1, "entity2": 10, "similarity": 0.4},
            {"entity1": 1, "entity2": 10, "similarity": 0.6, "status": "correct"},
            {"entity1": 2, "entity2": 10, "similarity": 0.5}
        ]"#;
        let a: Alignment = serde_json::from_str(json).unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(a.similarity(id(1), id(10)), Some(0.6));
        assert_eq!(a.cardinality(id(10)), 2);

        let back = serde_json::to_value(&a).unwrap();
        assert_eq!(back.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn serde_clamps_out_of_range_similarity() {
        let json = r#"[
            {"entity1": 1, "entity2": 10, "similarity": -3.0},
            {"entity1": 2, "entity2": 20, "similarity": 7.5}
        ]"#;
        let a: Alignment = serde_json::from_str(json).unwrap();
        assert_eq!(a.similarity(id(1), id(10)), Some(0.0));
        assert_eq!(a.similarity(id(2), id(20)), Some(1.0));
    }

    #[test]
    fn any_alignment_representation() {
        let simple = AnyAlignment::from(Alignment::new());
        assert_eq!(simple.representation(), "simple");
        assert!(simple.as_simple().is_some());
        assert!(simple.is_empty());

        let complex = AnyAlignment::from(ComplexAlignment::new());
        assert_eq!(complex.representation(), "complex");
        assert!(complex.as_simple().is_none());
        assert!(complex.into_simple().is_none());
    }
}
