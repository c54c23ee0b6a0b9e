//! Sparse, double-keyed weight tables.
//!
//! A [`ScoredRelation`] maps a left key and a right key to a single `f64`
//! weight. Matchers use it to accumulate intermediate entity-to-term scores
//! before they are composed into an [`Alignment`](crate::Alignment).
//!
//! Keys are kept in ordered maps so every iteration is deterministic.

use std::collections::btree_map::{self, BTreeMap};

use serde::{Deserialize, Serialize};

/// Sparse two-level weighted mapping `K1 -> K2 -> f64`.
///
/// A cell holds at most one value. [`add`](Self::add) overwrites an
/// existing cell, while [`add_max`](Self::add_max) keeps the larger of the
/// two weights; callers pick the policy per call site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRelation<K1: Ord, K2: Ord> {
    rows: BTreeMap<K1, BTreeMap<K2, f64>>,
}

impl<K1: Ord, K2: Ord> Default for ScoredRelation<K1, K2> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }
}

impl<K1: Ord + Copy, K2: Ord + Copy> ScoredRelation<K1, K2> {
    /// Creates an empty relation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the cell `(k1, k2)`.
    pub fn add(&mut self, k1: K1, k2: K2, value: f64) {
        self.rows.entry(k1).or_default().insert(k2, value);
    }

    /// Inserts `(k1, k2)` unless the cell already holds a weight `>= value`.
    ///
    /// Returns true if the cell was written.
    pub fn add_max(&mut self, k1: K1, k2: K2, value: f64) -> bool {
        match self.rows.entry(k1).or_default().entry(k2) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
            btree_map::Entry::Occupied(mut slot) => {
                if value > *slot.get() {
                    slot.insert(value);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Returns true if the cell `(k1, k2)` exists.
    #[must_use]
    pub fn contains(&self, k1: K1, k2: K2) -> bool {
        self.rows.get(&k1).is_some_and(|row| row.contains_key(&k2))
    }

    /// Returns true if any cell exists for the left key.
    #[must_use]
    pub fn contains_key(&self, k1: K1) -> bool {
        self.rows.contains_key(&k1)
    }

    /// Weight of the cell `(k1, k2)`.
    #[must_use]
    pub fn get(&self, k1: K1, k2: K2) -> Option<f64> {
        self.rows.get(&k1).and_then(|row| row.get(&k2)).copied()
    }

    /// All right keys and weights reachable from `k1`.
    #[must_use]
    pub fn row(&self, k1: K1) -> Option<&BTreeMap<K2, f64>> {
        self.rows.get(&k1)
    }

    /// Left keys, ascending.
    pub fn keys(&self) -> impl Iterator<Item = K1> + '_ {
        self.rows.keys().copied()
    }

    /// Right keys reachable from `k1`, ascending. Empty if `k1` is absent.
    pub fn keys_of(&self, k1: K1) -> impl Iterator<Item = K2> + '_ {
        self.rows.get(&k1).into_iter().flat_map(|row| row.keys().copied())
    }

    /// Number of cells in the row of `k1`.
    #[must_use]
    pub fn entry_count(&self, k1: K1) -> usize {
        self.rows.get(&k1).map_or(0, BTreeMap::len)
    }

    /// Iterates every cell as `(k1, k2, weight)`.
    pub fn iter(&self) -> impl Iterator<Item = (K1, K2, f64)> + '_ {
        self.rows
            .iter()
            .flat_map(|(k1, row)| row.iter().map(move |(k2, v)| (*k1, *k2, *v)))
    }

    /// Total number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum()
    }

    /// Returns true if the relation holds no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the relation with left and right keys swapped.
    #[must_use]
    pub fn transpose(&self) -> ScoredRelation<K2, K1> {
        let mut out = ScoredRelation::new();
        for (k1, k2, v) in self.iter() {
            out.add(k2, k1, v);
        }
        out
    }

    /// Folds `other` into `self`, keeping the larger weight per cell.
    pub fn merge_max(&mut self, other: Self) {
        for (k1, row) in other.rows {
            for (k2, v) in row {
                self.add_max(k1, k2, v);
            }
        }
    }
}
