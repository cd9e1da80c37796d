//! Condition evaluation against stored items. Used for both key conditions and filters.

use std::cmp::Ordering;

use autoquery_core::{
    condition::{Comparator, Condition},
    value::{AttributeMap, AttributeValue},
};

/// Items that can provide attribute values for condition evaluation.
pub trait Filterable {
    fn value(&self, name: &str) -> Option<&AttributeValue>;
}

impl Filterable for AttributeMap {
    fn value(&self, name: &str) -> Option<&AttributeValue> { self.get(name) }
}

fn equals(a: &AttributeValue, b: &AttributeValue) -> bool {
    match a.compare(b) {
        Some(ordering) => ordering == Ordering::Equal,
        None => a == b,
    }
}

fn compare(actual: &AttributeValue, comparator: Comparator, expected: &AttributeValue) -> bool {
    match comparator {
        Comparator::Equal => equals(actual, expected),
        Comparator::NotEqual => !equals(actual, expected),
        Comparator::LessThan => actual.compare(expected) == Some(Ordering::Less),
        Comparator::LessThanOrEqual => matches!(actual.compare(expected), Some(Ordering::Less | Ordering::Equal)),
        Comparator::GreaterThan => actual.compare(expected) == Some(Ordering::Greater),
        Comparator::GreaterThanOrEqual => matches!(actual.compare(expected), Some(Ordering::Greater | Ordering::Equal)),
    }
}

fn contains(haystack: &AttributeValue, needle: &AttributeValue) -> bool {
    match (haystack, needle) {
        (AttributeValue::String(s), AttributeValue::String(sub)) => s.contains(sub.as_str()),
        (AttributeValue::List(items), needle) => items.iter().any(|item| equals(item, needle)),
        _ => false,
    }
}

/// Evaluate `condition` against `item`. Conditions on missing attributes are false, except `<>` and
/// attribute-not-exists.
pub fn evaluate<I: Filterable + ?Sized>(item: &I, condition: &Condition) -> bool {
    match condition {
        Condition::Comparison { attribute, comparator, value } => match item.value(attribute) {
            Some(actual) => compare(actual, *comparator, value),
            None => *comparator == Comparator::NotEqual,
        },
        Condition::Between { attribute, low, high } => item.value(attribute).is_some_and(|actual| {
            matches!(actual.compare(low), Some(Ordering::Greater | Ordering::Equal))
                && matches!(actual.compare(high), Some(Ordering::Less | Ordering::Equal))
        }),
        Condition::BeginsWith { attribute, prefix } => item.value(attribute).is_some_and(|actual| actual.begins_with(prefix)),
        Condition::In { attribute, values } => item.value(attribute).is_some_and(|actual| values.iter().any(|v| equals(actual, v))),
        Condition::Contains { attribute, value } => item.value(attribute).is_some_and(|actual| contains(actual, value)),
        Condition::AttributeExists(attribute) => item.value(attribute).is_some(),
        Condition::AttributeNotExists(attribute) => item.value(attribute).is_none(),
        Condition::And(inner) => inner.iter().all(|c| evaluate(item, c)),
        Condition::Or(inner) => inner.iter().any(|c| evaluate(item, c)),
        Condition::Not(inner) => !evaluate(item, inner),
    }
}
