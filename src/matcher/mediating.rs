//! Two-hop lexical matching through a mediating vocabulary.
//!
//! Source and target are each matched against the mediator by exact
//! (normalized) name equality. A source entity and a target entity that
//! reach the same mediator term are aligned with the weaker of their two
//! scores. No lexical overlap between source and target is required.

use std::collections::BTreeMap;
use std::thread;
use std::time::Instant;

use crossbeam_channel::bounded;
use tracing::{debug, info};

use crate::alignment::Alignment;
use crate::diagnostics::elapsed_ms;
use crate::entity::{EntityId, EntityType, TermId};
use crate::error::{AlignError, AlignResult, ValidationError};
use crate::lexicon::{LexicalEntry, LexicalType, Lexicon, MediatorLexicon};
use crate::matcher::{LexiconExtender, Matcher, MatcherConfig};
use crate::relation::ScoredRelation;

const NAME: &str = "Mediating Matcher";
const DESCRIPTION: &str = "Matches entities that have one or more exact string matches \
                           between their lexicon entries and a common lexicon entry of a \
                           background knowledge source.";
const SUPPORT: &[EntityType] = &[EntityType::Class];
const EXTENSION_LANGUAGE: &str = "en";

/// Matcher and lexicon extender backed by a mediator lexicon.
#[derive(Debug, Clone)]
pub struct MediatingMatcher<M> {
    mediator: M,
    uri: String,
    config: MatcherConfig,
}

impl<M: MediatorLexicon> MediatingMatcher<M> {
    /// Creates a single-threaded matcher over `mediator`, identified by `uri`.
    pub fn new(mediator: M, uri: impl Into<String>) -> Self {
        Self::with_config(mediator, uri, MatcherConfig::default())
    }

    /// Creates a matcher with explicit tuning.
    pub fn with_config(mediator: M, uri: impl Into<String>, config: MatcherConfig) -> Self {
        Self {
            mediator,
            uri: uri.into(),
            config,
        }
    }

    /// The mediator lexicon.
    pub fn mediator(&self) -> &M {
        &self.mediator
    }

    /// URI of the mediating vocabulary.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Scores every class of `lexicon` against the mediator terms.
    ///
    /// The score of `(entity, term)` is the best, over all names they share,
    /// of the entity's corrected name weight times the term's name weight.
    /// Cells scoring below `threshold` are not retained.
    ///
    /// # Errors
    /// - `Internal`: if a scoring worker panics
    pub fn match_one_side(
        &self,
        lexicon: &dyn Lexicon,
        threshold: f64,
    ) -> AlignResult<ScoredRelation<EntityId, TermId>> {
        let names = lexicon.names(EntityType::Class);
        let workers = self.config.workers().min(names.len()).max(1);
        if workers == 1 {
            return Ok(score_names(&self.mediator, lexicon, &names, threshold));
        }

        let chunk_size = names.len().div_ceil(workers);
        let mediator = &self.mediator;
        let partials = thread::scope(|scope| {
            let (jobs, queue) = bounded::<&[&str]>(workers);
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    let queue = queue.clone();
                    scope.spawn(move || {
                        let mut partial = ScoredRelation::new();
                        for chunk in queue.iter() {
                            partial.merge_max(score_names(mediator, lexicon, chunk, threshold));
                        }
                        partial
                    })
                })
                .collect();
            drop(queue);

            for chunk in names.chunks(chunk_size) {
                // Fails only once every worker has exited early.
                if jobs.send(chunk).is_err() {
                    break;
                }
            }
            drop(jobs);

            handles
                .into_iter()
                .map(thread::ScopedJoinHandle::join)
                .collect::<Result<Vec<_>, _>>()
        })
        .map_err(|_| AlignError::internal("lexical scoring worker panicked"))?;

        let mut maps = ScoredRelation::new();
        for partial in partials {
            maps.merge_max(partial);
        }
        Ok(maps)
    }

    /// Extends one lexicon with the names of each class's best mediator term.
    ///
    /// Classes whose two best terms score exactly the same are skipped.
    /// Returns the number of `(name, class)` pairs that were new.
    ///
    /// # Errors
    /// Propagates lexicon validation failures.
    pub fn extend_lexicon(&self, lexicon: &mut dyn Lexicon) -> AlignResult<usize> {
        let maps = self.match_one_side(&*lexicon, 0.0)?;
        let mut added = 0;
        for entity in maps.keys() {
            let Some(row) = maps.row(entity) else {
                continue;
            };
            let Some((term, similarity)) = unique_best_hit(row) else {
                debug!(%entity, hits = row.len(), "tied mediator hits; skipping");
                continue;
            };
            for name in self.mediator.names(term) {
                let entry = LexicalEntry::new(entity, EntityType::Class, name, LexicalType::ExternalMatch)
                    .with_language(EXTENSION_LANGUAGE)
                    .with_source_uri(self.uri.as_str())
                    .with_weight(similarity);
                if lexicon.add(entry)? {
                    added += 1;
                }
            }
        }
        Ok(added)
    }
}

impl<M: MediatorLexicon> Matcher for MediatingMatcher<M> {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        DESCRIPTION
    }

    fn supported_entity_types(&self) -> &'static [EntityType] {
        SUPPORT
    }

    fn match_entities(
        &self,
        source: &dyn Lexicon,
        target: &dyn Lexicon,
        entity_type: EntityType,
        threshold: f64,
    ) -> AlignResult<Alignment> {
        self.check_entity_type(entity_type)?;
        let threshold = ValidationError::check_threshold(threshold)?;

        let started = Instant::now();
        info!(mediator = %self.uri, %entity_type, threshold, "running mediating matcher");

        let src = self.match_one_side(source, threshold)?;
        let tgt = self.match_one_side(target, threshold)?;
        let maps = compose_relations(&src, &tgt.transpose());

        info!(
            mediator = %self.uri,
            source_hits = src.len(),
            target_hits = tgt.len(),
            mappings = maps.len(),
            elapsed_ms = elapsed_ms(started),
            "mediating matcher finished"
        );
        Ok(maps)
    }
}

impl<M: MediatorLexicon> LexiconExtender for MediatingMatcher<M> {
    fn extend_lexicons(
        &self,
        source: &mut dyn Lexicon,
        target: &mut dyn Lexicon,
    ) -> AlignResult<usize> {
        let started = Instant::now();
        info!(mediator = %self.uri, "extending lexicons with mediating matcher");

        let source_added = self.extend_lexicon(source)?;
        let target_added = self.extend_lexicon(target)?;

        info!(
            mediator = %self.uri,
            source_added,
            target_added,
            elapsed_ms = elapsed_ms(started),
            "lexicon extension finished"
        );
        Ok(source_added + target_added)
    }
}

/// Joins `src` (entity -> term) with `rev` (term -> entity) into an alignment.
///
/// Each path `s -> med -> t` scores `min(src[s, med], rev[med, t])`. When
/// several mediator terms connect the same pair the best path wins, through
/// the max-merge of [`Alignment::add`]. No threshold is applied here.
#[must_use]
pub fn compose_relations(
    src: &ScoredRelation<EntityId, TermId>,
    rev: &ScoredRelation<TermId, EntityId>,
) -> Alignment {
    let mut maps = Alignment::new();
    for s in src.keys() {
        let Some(row) = src.row(s) else {
            continue;
        };
        for (&med, &left) in row {
            let Some(targets) = rev.row(med) else {
                continue;
            };
            for (&t, &right) in targets {
                maps.add(s, t, left.min(right));
            }
        }
    }
    maps
}

fn score_names<M: MediatorLexicon + ?Sized>(
    mediator: &M,
    lexicon: &dyn Lexicon,
    names: &[&str],
    threshold: f64,
) -> ScoredRelation<EntityId, TermId> {
    let mut maps = ScoredRelation::new();
    for &name in names {
        let entities = lexicon.entities(EntityType::Class, name);
        let terms = mediator.entities(name);
        if entities.is_empty() || terms.is_empty() {
            continue;
        }
        for &entity in &entities {
            let weight = lexicon.corrected_weight(name, entity);
            for &term in &terms {
                let similarity = weight * mediator.weight(name, term);
                if similarity >= threshold {
                    maps.add_max(entity, term, similarity);
                }
            }
        }
    }
    maps
}

// Best-scoring term, or None when the top two scores are exactly equal.
#[allow(clippy::float_cmp)]
fn unique_best_hit(row: &BTreeMap<TermId, f64>) -> Option<(TermId, f64)> {
    let mut ranked: Vec<(TermId, f64)> = row.iter().map(|(t, w)| (*t, *w)).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    match ranked.as_slice() {
        [] => None,
        [only] => Some(*only),
        [first, second, ..] => (first.1 != second.1).then_some(*first),
    }
}
