//! Entity identifiers and the entity registry.
//!
//! Every class, property and individual of a loaded ontology is referenced
//! by an opaque [`EntityId`] handed out by an [`EntityRegistry`]. Ids are
//! stable for the session and unique across the source and target
//! ontologies, so a single id space serves both sides of an alignment.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque, session-stable entity handle.
///
/// # Examples
///
/// ```
/// use ontalign::EntityId;
///
/// let id = EntityId::new(7);
/// assert_eq!(id.index(), 7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u32);

impl EntityId {
    /// Wraps a raw registry index.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw registry index.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

impl From<u32> for EntityId {
    fn from(index: u32) -> Self {
        Self(index)
    }
}

/// Handle of a term in a mediating vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermId(u32);

impl TermId {
    /// Wraps a raw mediator index.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw mediator index.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

impl From<u32> for TermId {
    fn from(index: u32) -> Self {
        Self(index)
    }
}

/// Kind of ontology entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// An OWL class
    Class,
    /// A datatype property
    DataProperty,
    /// An object property
    ObjectProperty,
    /// An annotation property
    AnnotationProperty,
    /// A named individual
    Individual,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class => write!(f, "class"),
            Self::DataProperty => write!(f, "data_property"),
            Self::ObjectProperty => write!(f, "object_property"),
            Self::AnnotationProperty => write!(f, "annotation_property"),
            Self::Individual => write!(f, "individual"),
        }
    }
}

/// Read-only view of the session's entities.
///
/// Used for diagnostics and human-readable rendering only; matching and
/// selection work on ids alone.
pub trait EntityRegistry: Send + Sync {
    /// Full URI of the entity, if registered.
    fn uri(&self, id: EntityId) -> Option<&str>;

    /// Local name (URI fragment) of the entity, if registered.
    fn local_name(&self, id: EntityId) -> Option<&str>;

    /// Kind of the entity, if registered.
    fn entity_type(&self, id: EntityId) -> Option<EntityType>;
}

#[derive(Debug, Clone)]
struct RegisteredEntity {
    uri: String,
    local_name_start: usize,
    entity_type: EntityType,
}

/// In-memory entity registry assigning sequential ids.
#[derive(Debug, Default, Clone)]
pub struct InMemoryEntityRegistry {
    entities: Vec<RegisteredEntity>,
    by_uri: HashMap<String, EntityId>,
}

impl InMemoryEntityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entity and returns its id.
    ///
    /// Registering the same URI twice returns the existing id; the first
    /// registered type wins.
    pub fn register(&mut self, uri: impl Into<String>, entity_type: EntityType) -> EntityId {
        let uri = uri.into();
        if let Some(id) = self.by_uri.get(&uri) {
            return *id;
        }

        #[allow(clippy::cast_possible_truncation)]
        let id = EntityId::new(self.entities.len() as u32);
        let local_name_start = uri.rfind(|c: char| c == '#' || c == '/').map_or(0, |i| i + 1);
        self.by_uri.insert(uri.clone(), id);
        self.entities.push(RegisteredEntity {
            uri,
            local_name_start,
            entity_type,
        });
        id
    }

    /// Looks up the id registered for a URI.
    #[must_use]
    pub fn id_of(&self, uri: &str) -> Option<EntityId> {
        self.by_uri.get(uri).copied()
    }

    /// Number of registered entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn lookup(&self, id: EntityId) -> Option<&RegisteredEntity> {
        self.entities.get(id.index() as usize)
    }
}

impl EntityRegistry for InMemoryEntityRegistry {
    fn uri(&self, id: EntityId) -> Option<&str> {
        self.lookup(id).map(|e| e.uri.as_str())
    }

    fn local_name(&self, id: EntityId) -> Option<&str> {
        self.lookup(id).map(|e| &e.uri[e.local_name_start..])
    }

    fn entity_type(&self, id: EntityId) -> Option<EntityType> {
        self.lookup(id).map(|e| e.entity_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_assigns_sequential_ids() {
        let mut registry = InMemoryEntityRegistry::new();
        let a = registry.register("http://example.org/anatomy#Heart", EntityType::Class);
        let b = registry.register("http://example.org/anatomy#Lung", EntityType::Class);
        assert_eq!(a, EntityId::new(0));
        assert_eq!(b, EntityId::new(1));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn register_is_idempotent_per_uri() {
        let mut registry = InMemoryEntityRegistry::new();
        let a = registry.register("http://example.org/a#Heart", EntityType::Class);
        let again = registry.register("http://example.org/a#Heart", EntityType::Individual);
        assert_eq!(a, again);
        assert_eq!(registry.entity_type(a), Some(EntityType::Class));
        assert_eq!(registry.id_of("http://example.org/a#Heart"), Some(a));
    }

    #[test]
    fn local_name_uses_fragment_or_last_segment() {
        let mut registry = InMemoryEntityRegistry::new();
        let hash = registry.register("http://example.org/onto#Heart", EntityType::Class);
        let slash = registry.register("http://purl.org/obo/UBERON_0000948", EntityType::Class);
        let bare = registry.register("Heart", EntityType::Class);
        assert_eq!(registry.local_name(hash), Some("Heart"));
        assert_eq!(registry.local_name(slash), Some("UBERON_0000948"));
        assert_eq!(registry.local_name(bare), Some("Heart"));
    }

    #[test]
    fn unknown_id_resolves_to_none() {
        let registry = InMemoryEntityRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.uri(EntityId::new(3)), None);
        assert_eq!(registry.local_name(EntityId::new(3)), None);
    }

    #[test]
    fn entity_type_display() {
        assert_eq!(EntityType::Class.to_string(), "class");
        assert_eq!(EntityType::DataProperty.to_string(), "data_property");
        assert_eq!(EntityId::new(4).to_string(), "e4");
        assert_eq!(TermId::new(9).to_string(), "m9");
    }
}
