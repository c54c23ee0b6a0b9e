//! # ontalign - Mediated Ontology Matching and Cardinality Selection
//!
//! ontalign discovers correspondences between the entities of two
//! ontologies and cleans them up into an alignment that obeys a chosen
//! multiplicity policy.
//!
//! ## Core Concepts
//!
//! - **Lexicon**: names of entities, with provenance and inverse-frequency weights
//! - **Mediator**: a background vocabulary both ontologies can be matched against
//! - **Mapping**: a scored correspondence with a validation status
//! - **Alignment**: a set of mappings with cardinality and conflict queries
//! - **Selector**: STRICT / PERMISSIVE / HYBRID selection and conflict flagging
//!
//! ## Usage
//!
//! ```rust
//! use ontalign::{
//!     EntityType, InMemoryEntityRegistry, InMemoryLexicon, InMemoryMediatorLexicon,
//!     LexicalType, Matcher, MediatingMatcher, SelectionPolicy, Selector, TermId,
//! };
//!
//! # fn main() -> Result<(), ontalign::AlignError> {
//! let mut registry = InMemoryEntityRegistry::new();
//! let heart = registry.register("http://example.org/mouse#Heart", EntityType::Class);
//! let cor = registry.register("http://example.org/human#Cor", EntityType::Class);
//!
//! let mut source = InMemoryLexicon::new();
//! source.add_name(heart, EntityType::Class, "Heart", LexicalType::LocalName)?;
//! let mut target = InMemoryLexicon::new();
//! target.add_name(cor, EntityType::Class, "Cor", LexicalType::LocalName)?;
//!
//! let mut mediator = InMemoryMediatorLexicon::new();
//! mediator.add(TermId::new(0), "heart", 1.0)?;
//! mediator.add(TermId::new(0), "cor", 0.9)?;
//!
//! let matcher = MediatingMatcher::new(mediator, "http://example.org/uberon");
//! let candidates = matcher.match_entities(&source, &target, EntityType::Class, 0.5)?;
//!
//! let selected = Selector::new(0.6, SelectionPolicy::Strict)?.select(candidates);
//! assert_eq!(selected.similarity(heart, cor), Some(0.9));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod alignment;
pub mod entity;
pub mod error;
pub mod expression;
pub mod mapping;
pub mod relation;

// Lexicons, matching and selection
pub mod filter;
pub mod lexicon;
pub mod matcher;

mod diagnostics;

// Re-export primary types at crate root for convenience
pub use alignment::{Alignment, AnyAlignment};
pub use entity::{EntityId, EntityRegistry, EntityType, InMemoryEntityRegistry, TermId};
pub use error::{AlignError, AlignResult, MatchError, ValidationError};
pub use expression::{ComplexAlignment, ComplexMapping, ValueExpression};
pub use mapping::{Mapping, MappingStatus};
pub use relation::ScoredRelation;

pub use filter::{flag_conflicts, Filterer, Flagger, SelectionPolicy, Selector, SelectorConfig};
pub use lexicon::{
    InMemoryLexicon, InMemoryMediatorLexicon, LexicalEntry, LexicalType, Lexicon, MediatorLexicon,
};
pub use matcher::{compose_relations, LexiconExtender, Matcher, MatcherConfig, MediatingMatcher};
