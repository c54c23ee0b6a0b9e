//! Value expressions and expression-based (complex) correspondences.
//!
//! Complex alignments relate expressions rather than single entities, for
//! example an aggregate over several properties on one side and a single
//! property on the other. Cardinality selection is undefined for them; the
//! types exist so pipelines can carry them and filters can refuse them.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, EntityRegistry};
use crate::mapping::MappingStatus;

/// An expression over ontology entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValueExpression {
    /// A single entity (property, class or individual).
    Entity {
        /// The referenced entity.
        id: EntityId,
    },

    /// A literal value.
    Literal {
        /// Lexical form.
        value: String,
        /// Datatype URI, if typed.
        #[serde(skip_serializing_if = "Option::is_none")]
        datatype: Option<String>,
    },

    /// Aggregation of argument values by an operator.
    ///
    /// Argument order is preserved and is significant for equality.
    Aggregate {
        /// Entity naming the aggregation operator.
        operator: EntityId,
        /// Operator arguments.
        arguments: Vec<ValueExpression>,
    },
}

impl ValueExpression {
    /// Expression referencing a single entity.
    #[must_use]
    pub const fn entity(id: EntityId) -> Self {
        Self::Entity { id }
    }

    /// Untyped literal.
    #[must_use]
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            datatype: None,
        }
    }

    /// Aggregate of `arguments` under `operator`.
    #[must_use]
    pub fn aggregate(operator: EntityId, arguments: Vec<ValueExpression>) -> Self {
        Self::Aggregate {
            operator,
            arguments,
        }
    }

    /// Direct sub-expressions.
    #[must_use]
    pub fn components(&self) -> &[ValueExpression] {
        match self {
            Self::Aggregate { arguments, .. } => arguments,
            Self::Entity { .. } | Self::Literal { .. } => &[],
        }
    }

    /// Entities referenced anywhere in the expression.
    ///
    /// The operator of an aggregate is not an element; its arguments'
    /// elements are.
    #[must_use]
    pub fn elements(&self) -> BTreeSet<EntityId> {
        let mut out = BTreeSet::new();
        self.collect_elements(&mut out);
        out
    }

    fn collect_elements(&self, out: &mut BTreeSet<EntityId>) {
        match self {
            Self::Entity { id } => {
                out.insert(*id);
            }
            Self::Literal { .. } => {}
            Self::Aggregate { arguments, .. } => {
                for arg in arguments {
                    arg.collect_elements(out);
                }
            }
        }
    }

    /// Human-readable form using registry local names.
    #[must_use]
    pub fn render(&self, registry: &dyn EntityRegistry) -> String {
        let name = |id: EntityId| {
            registry
                .local_name(id)
                .map_or_else(|| id.to_string(), str::to_string)
        };
        match self {
            Self::Entity { id } => name(*id),
            Self::Literal { value, .. } => format!("\"{value}\""),
            Self::Aggregate {
                operator,
                arguments,
            } => {
                let args: Vec<String> = arguments.iter().map(|a| a.render(registry)).collect();
                format!("{} [{}]", name(*operator), args.join(", "))
            }
        }
    }
}

impl fmt::Display for ValueExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity { id } => write!(f, "{id}"),
            Self::Literal { value, .. } => write!(f, "\"{value}\""),
            Self::Aggregate {
                operator,
                arguments,
            } => {
                write!(f, "{operator} [")?;
                for (i, arg) in arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// A scored correspondence between two expressions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexMapping {
    /// Source-side expression.
    pub entity1: ValueExpression,
    /// Target-side expression.
    pub entity2: ValueExpression,
    /// Similarity in `[0, 1]`.
    pub similarity: f64,
    /// Validation status.
    #[serde(default)]
    pub status: MappingStatus,
}

/// Ordered collection of complex mappings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComplexAlignment {
    mappings: Vec<ComplexMapping>,
}

impl ComplexAlignment {
    /// Creates an empty complex alignment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a mapping unless an equal one (same expressions) exists.
    pub fn add(&mut self, mapping: ComplexMapping) -> bool {
        let exists = self
            .mappings
            .iter()
            .any(|m| m.entity1 == mapping.entity1 && m.entity2 == mapping.entity2);
        if exists {
            return false;
        }
        self.mappings.push(mapping);
        true
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

    /// Iterates mappings in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, ComplexMapping> {
        self.mappings.iter()
    }
}

#[cfg(test)]
mod tests {
    use crate::entity::{EntityType, InMemoryEntityRegistry};

    use super::*;

    fn id(i: u32) -> EntityId {
        EntityId::new(i)
    }

    #[test]
    fn aggregate_elements_are_union_of_arguments() {
        let inner = ValueExpression::aggregate(id(9), vec![ValueExpression::entity(id(3))]);
        let expr = ValueExpression::aggregate(
            id(8),
            vec![
                ValueExpression::entity(id(2)),
                inner,
                ValueExpression::literal("42"),
                ValueExpression::entity(id(2)),
            ],
        );
        let elements: Vec<u32> = expr.elements().into_iter().map(EntityId::index).collect();
        assert_eq!(elements, vec![2, 3]);
        assert_eq!(expr.components().len(), 4);
    }

    #[test]
    fn aggregate_equality_respects_argument_order() {
        let a = ValueExpression::aggregate(
            id(1),
            vec![ValueExpression::entity(id(2)), ValueExpression::entity(id(3))],
        );
        let b = ValueExpression::aggregate(
            id(1),
            vec![ValueExpression::entity(id(3)), ValueExpression::entity(id(2))],
        );
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn render_uses_operator_local_name() {
        let mut registry = InMemoryEntityRegistry::new();
        let sum = registry.register("http://example.org/ops#sum", EntityType::Individual);
        let width = registry.register("http://example.org/o#width", EntityType::DataProperty);
        let height = registry.register("http://example.org/o#height", EntityType::DataProperty);
        let expr = ValueExpression::aggregate(
            sum,
            vec![ValueExpression::entity(width), ValueExpression::entity(height)],
        );
        assert_eq!(expr.render(&registry), "sum [width, height]");
        assert_eq!(expr.to_string(), "e0 [e1, e2]");
    }

    #[test]
    fn complex_alignment_rejects_duplicates() {
        let mut c = ComplexAlignment::new();
        let m = ComplexMapping {
            entity1: ValueExpression::aggregate(id(1), vec![ValueExpression::entity(id(2))]),
            entity2: ValueExpression::entity(id(5)),
            similarity: 0.8,
            status: MappingStatus::Unknown,
        };
        assert!(c.add(m.clone()));
        assert!(!c.add(m));
        assert_eq!(c.len(), 1);
        assert_eq!(c.iter().count(), 1);
    }

    #[test]
    fn expression_serde_is_tagged() {
        let expr = ValueExpression::aggregate(id(1), vec![ValueExpression::entity(id(2))]);
        let json = serde_json::to_value(&expr).unwrap();
        assert_eq!(json["type"], "aggregate");
        assert_eq!(json["arguments"][0]["type"], "entity");
        let back: ValueExpression = serde_json::from_value(json).unwrap();
        assert_eq!(back, expr);
    }
}
