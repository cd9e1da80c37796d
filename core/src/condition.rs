use serde::{Deserialize, Serialize};

use crate::value::AttributeValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparator {
    Equal,              // =
    NotEqual,           // <>
    LessThan,           // <
    LessThanOrEqual,    // <=
    GreaterThan,        // >
    GreaterThanOrEqual, // >=
}

impl Comparator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparator::Equal => "=",
            Comparator::NotEqual => "<>",
            Comparator::LessThan => "<",
            Comparator::LessThanOrEqual => "<=",
            Comparator::GreaterThan => ">",
            Comparator::GreaterThanOrEqual => ">=",
        }
    }
}

/// A boolean condition over item attributes.
///
/// Compiled key and filter clauses are expressed as conditions, and callers use the same type for the
/// extra predicates the per-attribute expression API cannot express (disjunctions, negations, existence).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    Comparison { attribute: String, comparator: Comparator, value: AttributeValue },
    Between { attribute: String, low: AttributeValue, high: AttributeValue },
    BeginsWith { attribute: String, prefix: String },
    In { attribute: String, values: Vec<AttributeValue> },
    Contains { attribute: String, value: AttributeValue },
    AttributeExists(String),
    AttributeNotExists(String),
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    fn comparison(attribute: impl Into<String>, comparator: Comparator, value: impl Into<AttributeValue>) -> Self {
        Condition::Comparison { attribute: attribute.into(), comparator, value: value.into() }
    }

    pub fn eq(attribute: impl Into<String>, value: impl Into<AttributeValue>) -> Self { Self::comparison(attribute, Comparator::Equal, value) }
    pub fn ne(attribute: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self::comparison(attribute, Comparator::NotEqual, value)
    }
    pub fn lt(attribute: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self::comparison(attribute, Comparator::LessThan, value)
    }
    pub fn lte(attribute: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self::comparison(attribute, Comparator::LessThanOrEqual, value)
    }
    pub fn gt(attribute: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self::comparison(attribute, Comparator::GreaterThan, value)
    }
    pub fn gte(attribute: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self::comparison(attribute, Comparator::GreaterThanOrEqual, value)
    }

    pub fn between(attribute: impl Into<String>, low: impl Into<AttributeValue>, high: impl Into<AttributeValue>) -> Self {
        Condition::Between { attribute: attribute.into(), low: low.into(), high: high.into() }
    }

    pub fn begins_with(attribute: impl Into<String>, prefix: impl Into<String>) -> Self {
        Condition::BeginsWith { attribute: attribute.into(), prefix: prefix.into() }
    }

    pub fn is_in<V: Into<AttributeValue>>(attribute: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Condition::In { attribute: attribute.into(), values: values.into_iter().map(Into::into).collect() }
    }

    pub fn contains(attribute: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Condition::Contains { attribute: attribute.into(), value: value.into() }
    }

    pub fn exists(attribute: impl Into<String>) -> Self { Condition::AttributeExists(attribute.into()) }
    pub fn not_exists(attribute: impl Into<String>) -> Self { Condition::AttributeNotExists(attribute.into()) }

    pub fn and(self, other: Condition) -> Self { Condition::And(vec![self, other]) }
    pub fn or(self, other: Condition) -> Self { Condition::Or(vec![self, other]) }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self { Condition::Not(Box::new(self)) }

    /// Conjoin a list of conditions, flattening nested conjunctions.
    /// Returns None for an empty list and the condition itself for a single-element list.
    pub fn all(conditions: impl IntoIterator<Item = Condition>) -> Option<Condition> {
        let mut conjuncts = Vec::new();
        for condition in conditions {
            Self::extract_conjuncts(condition, &mut conjuncts);
        }
        match conjuncts.len() {
            0 => None,
            1 => conjuncts.pop(),
            _ => Some(Condition::And(conjuncts)),
        }
    }

    fn extract_conjuncts(condition: Condition, conjuncts: &mut Vec<Condition>) {
        match condition {
            Condition::And(inner) => {
                for c in inner {
                    Self::extract_conjuncts(c, conjuncts);
                }
            }
            other => conjuncts.push(other),
        }
    }
}
