//! In-memory lexicon backends.
//!
//! Both lexicons keep names in ordered maps so that every iteration, and
//! hence every matcher run over them, is deterministic.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::entity::{EntityId, EntityType, TermId};
use crate::error::ValidationError;
use crate::lexicon::traits::{Lexicon, MediatorLexicon};
use crate::lexicon::{normalize_name, LexicalEntry, LexicalType};

fn normalized_non_empty(name: &str) -> Result<String, ValidationError> {
    let normalized = normalize_name(name);
    if normalized.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(normalized)
}

#[derive(Debug, Clone)]
struct NameRecord {
    weight: f64,
    language: String,
    provenance: LexicalType,
    source_uri: Option<String>,
}

impl NameRecord {
    fn same_origin(&self, other: &Self) -> bool {
        self.provenance == other.provenance
            && self.language == other.language
            && self.source_uri == other.source_uri
    }
}

// First record with the highest weight.
fn best_record(records: &[NameRecord]) -> Option<&NameRecord> {
    records
        .iter()
        .reduce(|best, r| if r.weight > best.weight { r } else { best })
}

/// In-memory lexicon for a source or target ontology.
///
/// A `(name, entity)` pair keeps one record per origin (provenance,
/// language and source URI). Records are only ever appended; the weight of
/// the pair is the highest weight among its records.
///
/// An entity keeps the type it was first added with; later entries for
/// the same entity are filed under that type.
#[derive(Debug, Default, Clone)]
pub struct InMemoryLexicon {
    by_name: BTreeMap<EntityType, BTreeMap<String, BTreeMap<EntityId, Vec<NameRecord>>>>,
    types: HashMap<EntityId, EntityType>,
    names_by_entity: HashMap<EntityId, BTreeSet<String>>,
}

impl InMemoryLexicon {
    /// Creates an empty lexicon.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an English name with the provenance's default weight.
    ///
    /// # Errors
    /// - `EmptyName`: if the name normalizes to the empty string
    pub fn add_name(
        &mut self,
        entity: EntityId,
        entity_type: EntityType,
        name: &str,
        provenance: LexicalType,
    ) -> Result<bool, ValidationError> {
        self.add(LexicalEntry::new(entity, entity_type, name, provenance))
    }

    /// Names of an entity, ascending.
    #[must_use]
    pub fn names_of(&self, entity: EntityId) -> Vec<&str> {
        self.names_by_entity
            .get(&entity)
            .map(|names| names.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// The highest-weighted entry for `(name, entity)`.
    ///
    /// Ties go to the entry that was added first.
    #[must_use]
    pub fn entry(&self, name: &str, entity: EntityId) -> Option<LexicalEntry> {
        let name = normalize_name(name);
        let entity_type = *self.types.get(&entity)?;
        let (record, _) = self.record(&name, entity)?;
        Some(to_entry(entity, entity_type, name, record))
    }

    /// Every entry recorded for `(name, entity)`, in insertion order.
    #[must_use]
    pub fn entries(&self, name: &str, entity: EntityId) -> Vec<LexicalEntry> {
        let name = normalize_name(name);
        let Some(&entity_type) = self.types.get(&entity) else {
            return Vec::new();
        };
        self.by_name
            .get(&entity_type)
            .and_then(|names| names.get(&name))
            .and_then(|bearers| bearers.get(&entity))
            .map(|records| {
                records
                    .iter()
                    .map(|r| to_entry(entity, entity_type, name.clone(), r))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Uncorrected weight of `name` for `entity`; 0.0 if absent.
    #[must_use]
    pub fn weight(&self, name: &str, entity: EntityId) -> f64 {
        self.record(&normalize_name(name), entity)
            .map_or(0.0, |(record, _)| record.weight)
    }

    /// Number of `(name, entity)` pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names_by_entity.values().map(BTreeSet::len).sum()
    }

    /// Returns true if the lexicon holds no names.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names_by_entity.is_empty()
    }

    /// Number of entities of the given type.
    #[must_use]
    pub fn entity_count(&self, entity_type: EntityType) -> usize {
        self.types.values().filter(|t| **t == entity_type).count()
    }

    // Returns the record and the number of same-typed entities bearing the name.
    fn record(&self, normalized: &str, entity: EntityId) -> Option<(&NameRecord, usize)> {
        let entity_type = self.types.get(&entity)?;
        let bearers = self.by_name.get(entity_type)?.get(normalized)?;
        let record = best_record(bearers.get(&entity)?)?;
        Some((record, bearers.len()))
    }
}

fn to_entry(entity: EntityId, entity_type: EntityType, name: String, record: &NameRecord) -> LexicalEntry {
    LexicalEntry {
        entity,
        entity_type,
        name,
        language: record.language.clone(),
        provenance: record.provenance,
        source_uri: record.source_uri.clone(),
        weight: record.weight,
    }
}

impl Lexicon for InMemoryLexicon {
    fn names(&self, entity_type: EntityType) -> Vec<&str> {
        self.by_name
            .get(&entity_type)
            .map(|names| names.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    fn entities(&self, entity_type: EntityType, name: &str) -> Vec<EntityId> {
        self.by_name
            .get(&entity_type)
            .and_then(|names| names.get(&normalize_name(name)))
            .map(|bearers| bearers.keys().copied().collect())
            .unwrap_or_default()
    }

    #[allow(clippy::cast_precision_loss)]
    fn corrected_weight(&self, name: &str, entity: EntityId) -> f64 {
        self.record(&normalize_name(name), entity)
            .map_or(0.0, |(record, bearers)| record.weight / bearers as f64)
    }

    fn add(&mut self, entry: LexicalEntry) -> Result<bool, ValidationError> {
        let name = normalized_non_empty(&entry.name)?;
        let entity_type = *self.types.entry(entry.entity).or_insert(entry.entity_type);
        let record = NameRecord {
            weight: entry.weight,
            language: entry.language,
            provenance: entry.provenance,
            source_uri: entry.source_uri,
        };

        let records = self
            .by_name
            .entry(entity_type)
            .or_default()
            .entry(name.clone())
            .or_default()
            .entry(entry.entity)
            .or_default();
        let is_new = records.is_empty();
        if !records.iter().any(|r| r.same_origin(&record)) {
            records.push(record);
        }

        self.names_by_entity
            .entry(entry.entity)
            .or_default()
            .insert(name);
        Ok(is_new)
    }
}

/// In-memory lexicon for a mediating vocabulary.
#[derive(Debug, Default, Clone)]
pub struct InMemoryMediatorLexicon {
    by_name: BTreeMap<String, BTreeMap<TermId, f64>>,
    by_term: BTreeMap<TermId, BTreeSet<String>>,
}

impl InMemoryMediatorLexicon {
    /// Creates an empty mediator lexicon.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `name` to `term`. Re-adding keeps the higher weight.
    ///
    /// Returns true if the `(name, term)` pair is new.
    ///
    /// # Errors
    /// - `EmptyName`: if the name normalizes to the empty string
    pub fn add(&mut self, term: TermId, name: &str, weight: f64) -> Result<bool, ValidationError> {
        let name = normalized_non_empty(name)?;
        let terms = self.by_name.entry(name.clone()).or_default();
        let is_new = match terms.get_mut(&term) {
            None => {
                terms.insert(term, weight);
                true
            }
            Some(existing) => {
                if weight > *existing {
                    *existing = weight;
                }
                false
            }
        };
        self.by_term.entry(term).or_default().insert(name);
        Ok(is_new)
    }

    /// Number of distinct terms.
    #[must_use]
    pub fn term_count(&self) -> usize {
        self.by_term.len()
    }
}

impl MediatorLexicon for InMemoryMediatorLexicon {
    fn entities(&self, name: &str) -> Vec<TermId> {
        self.by_name
            .get(&normalize_name(name))
            .map(|terms| terms.keys().copied().collect())
            .unwrap_or_default()
    }

    fn weight(&self, name: &str, term: TermId) -> f64 {
        self.by_name
            .get(&normalize_name(name))
            .and_then(|terms| terms.get(&term))
            .copied()
            .unwrap_or(0.0)
    }

    fn names(&self, term: TermId) -> Vec<String> {
        self.by_term
            .get(&term)
            .map(|names| names.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn id(i: u32) -> EntityId {
        EntityId::new(i)
    }

    #[test]
    fn names_and_entities_are_normalized() {
        let mut lex = InMemoryLexicon::new();
        lex.add_name(id(1), EntityType::Class, "HeartValve", LexicalType::LocalName)
            .unwrap();
        lex.add_name(id(2), EntityType::Class, "heart valve", LexicalType::Label)
            .unwrap();
        lex.add_name(id(3), EntityType::ObjectProperty, "has_part", LexicalType::LocalName)
            .unwrap();

        assert_eq!(lex.names(EntityType::Class), vec!["heart valve"]);
        assert_eq!(lex.entities(EntityType::Class, "Heart_Valve"), vec![id(1), id(2)]);
        assert!(lex.entities(EntityType::Class, "has part").is_empty());
        assert_eq!(lex.names(EntityType::ObjectProperty), vec!["has part"]);
        assert_eq!(lex.entity_count(EntityType::Class), 2);
    }

    #[test]
    fn corrected_weight_divides_by_bearer_count() {
        let mut lex = InMemoryLexicon::new();
        lex.add(LexicalEntry::new(id(1), EntityType::Class, "valve", LexicalType::Label).with_weight(0.8))
            .unwrap();
        assert_relative_eq!(lex.corrected_weight("valve", id(1)), 0.8);

        lex.add(LexicalEntry::new(id(2), EntityType::Class, "valve", LexicalType::Label).with_weight(0.6))
            .unwrap();
        assert_relative_eq!(lex.corrected_weight("valve", id(1)), 0.4);
        assert_relative_eq!(lex.corrected_weight("valve", id(2)), 0.3);
        assert_relative_eq!(lex.weight("valve", id(1)), 0.8);
        assert_eq!(lex.corrected_weight("valve", id(9)), 0.0);
        assert_eq!(lex.corrected_weight("aorta", id(1)), 0.0);
    }

    #[test]
    fn re_adding_appends_records_and_never_rewrites() {
        let mut lex = InMemoryLexicon::new();
        assert!(lex.add_name(id(1), EntityType::Class, "aorta", LexicalType::OtherSynonym).unwrap());
        assert!(!lex.add_name(id(1), EntityType::Class, "aorta", LexicalType::LocalName).unwrap());
        assert_eq!(lex.entry("aorta", id(1)).unwrap().provenance, LexicalType::LocalName);

        assert!(!lex
            .add(LexicalEntry::new(id(1), EntityType::Class, "aorta", LexicalType::ExternalMatch).with_weight(0.1))
            .unwrap());
        let entry = lex.entry("aorta", id(1)).unwrap();
        assert_eq!(entry.provenance, LexicalType::LocalName);
        assert_eq!(entry.weight, 1.0);
        assert_eq!(lex.len(), 1);

        let provenances: Vec<_> = lex.entries("aorta", id(1)).iter().map(|e| e.provenance).collect();
        assert_eq!(
            provenances,
            vec![LexicalType::OtherSynonym, LexicalType::LocalName, LexicalType::ExternalMatch]
        );
    }

    #[test]
    fn higher_weight_entry_does_not_replace_existing_record() {
        let mut lex = InMemoryLexicon::new();
        lex.add(LexicalEntry::new(id(1), EntityType::Class, "cor", LexicalType::OtherSynonym).with_weight(0.1))
            .unwrap();
        lex.add(
            LexicalEntry::new(id(1), EntityType::Class, "cor", LexicalType::ExternalMatch)
                .with_weight(1.0)
                .with_source_uri("http://example.org/uberon"),
        )
        .unwrap();

        let entries = lex.entries("cor", id(1));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].provenance, LexicalType::OtherSynonym);
        assert_eq!(entries[0].weight, 0.1);
        assert!(entries[0].source_uri.is_none());
        assert_eq!(lex.entry("cor", id(1)).unwrap().provenance, LexicalType::ExternalMatch);
        assert_eq!(lex.weight("cor", id(1)), 1.0);
    }

    #[test]
    fn same_origin_is_recorded_once() {
        let mut lex = InMemoryLexicon::new();
        lex.add(LexicalEntry::new(id(1), EntityType::Class, "aorta", LexicalType::Label).with_weight(0.5))
            .unwrap();
        lex.add(LexicalEntry::new(id(1), EntityType::Class, "aorta", LexicalType::Label).with_weight(0.9))
            .unwrap();
        let entries = lex.entries("aorta", id(1));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].weight, 0.5);
        assert!(lex.entries("aorta", id(2)).is_empty());
    }

    #[test]
    fn entity_keeps_first_type() {
        let mut lex = InMemoryLexicon::new();
        lex.add_name(id(1), EntityType::Class, "aorta", LexicalType::Label).unwrap();
        lex.add_name(id(1), EntityType::Individual, "main artery", LexicalType::Label)
            .unwrap();
        assert_eq!(lex.entities(EntityType::Class, "main artery"), vec![id(1)]);
        assert!(lex.names(EntityType::Individual).is_empty());
        assert_eq!(lex.names_of(id(1)), vec!["aorta", "main artery"]);
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut lex = InMemoryLexicon::new();
        let err = lex
            .add_name(id(1), EntityType::Class, " _ ", LexicalType::Label)
            .unwrap_err();
        assert!(matches!(err, ValidationError::EmptyName));
        assert!(lex.is_empty());

        let mut med = InMemoryMediatorLexicon::new();
        assert!(med.add(TermId::new(1), "", 1.0).is_err());
    }

    #[test]
    fn mediator_lookups() {
        let mut med = InMemoryMediatorLexicon::new();
        assert!(med.add(TermId::new(7), "Cardiac Valve", 0.9).unwrap());
        assert!(med.add(TermId::new(7), "heart valve", 1.0).unwrap());
        assert!(med.add(TermId::new(3), "heart valve", 0.5).unwrap());
        assert!(!med.add(TermId::new(3), "heart valve", 0.4).unwrap());

        assert_eq!(med.entities("HeartValve"), vec![TermId::new(3), TermId::new(7)]);
        assert_eq!(med.weight("heart valve", TermId::new(3)), 0.5);
        assert_eq!(med.weight("heart valve", TermId::new(9)), 0.0);
        assert_eq!(med.names(TermId::new(7)), vec!["cardiac valve", "heart valve"]);
        assert!(med.names(TermId::new(9)).is_empty());
        assert_eq!(med.term_count(), 2);
    }
}
