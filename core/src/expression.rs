//! Logical query expressions.
//!
//! An [`Expression`] records at most one [`FilterCondition`] per attribute, an optional ordering, an optional
//! projection, a consistency flag, and any number of extra [`Condition`]s. Nothing is validated here; whether
//! an expression can be served by a given index is decided by the selector.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{condition::Condition, value::AttributeValue};

/// A condition on a single attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterCondition {
    Equal(AttributeValue),
    LessThan(AttributeValue),
    GreaterThan(AttributeValue),
    LessThanOrEqual(AttributeValue),
    GreaterThanOrEqual(AttributeValue),
    Between { low: AttributeValue, high: AttributeValue },
    BeginsWith(String),
}

/// The kind of a [`FilterCondition`], without its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterKind {
    Equal,
    LessThan,
    GreaterThan,
    LessThanOrEqual,
    GreaterThanOrEqual,
    Between,
    BeginsWith,
}

impl FilterCondition {
    pub fn kind(&self) -> FilterKind {
        match self {
            FilterCondition::Equal(_) => FilterKind::Equal,
            FilterCondition::LessThan(_) => FilterKind::LessThan,
            FilterCondition::GreaterThan(_) => FilterKind::GreaterThan,
            FilterCondition::LessThanOrEqual(_) => FilterKind::LessThanOrEqual,
            FilterCondition::GreaterThanOrEqual(_) => FilterKind::GreaterThanOrEqual,
            FilterCondition::Between { .. } => FilterKind::Between,
            FilterCondition::BeginsWith(_) => FilterKind::BeginsWith,
        }
    }

    pub fn is_equal(&self) -> bool { matches!(self, FilterCondition::Equal(_)) }

    /// Express this filter as a [`Condition`] on `attribute`.
    pub fn to_condition(&self, attribute: &str) -> Condition {
        match self {
            FilterCondition::Equal(v) => Condition::eq(attribute, v.clone()),
            FilterCondition::LessThan(v) => Condition::lt(attribute, v.clone()),
            FilterCondition::GreaterThan(v) => Condition::gt(attribute, v.clone()),
            FilterCondition::LessThanOrEqual(v) => Condition::lte(attribute, v.clone()),
            FilterCondition::GreaterThanOrEqual(v) => Condition::gte(attribute, v.clone()),
            FilterCondition::Between { low, high } => Condition::between(attribute, low.clone(), high.clone()),
            FilterCondition::BeginsWith(prefix) => Condition::begins_with(attribute, prefix.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub attribute: String,
    pub ascending: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expression {
    filters: IndexMap<String, FilterCondition>,
    attributes_specified: bool,
    attributes: Vec<String>,
    order: Option<OrderBy>,
    consistent_read: bool,
    predicates: Vec<Condition>,
}

impl Expression {
    pub fn new() -> Self { Self::default() }

    fn set_filter(mut self, attr: impl Into<String>, filter: FilterCondition) -> Self {
        self.filters.insert(attr.into(), filter);
        self
    }

    /// Only items whose `attr` equals `v` are returned. Every query needs an equal condition on the partition
    /// key of the index that ends up serving it.
    ///
    /// Like every per-attribute condition, this replaces any earlier condition on `attr`.
    pub fn equal(self, attr: impl Into<String>, v: impl Into<AttributeValue>) -> Self { self.set_filter(attr, FilterCondition::Equal(v.into())) }

    pub fn less_than(self, attr: impl Into<String>, v: impl Into<AttributeValue>) -> Self {
        self.set_filter(attr, FilterCondition::LessThan(v.into()))
    }

    pub fn greater_than(self, attr: impl Into<String>, v: impl Into<AttributeValue>) -> Self {
        self.set_filter(attr, FilterCondition::GreaterThan(v.into()))
    }

    pub fn less_than_equal(self, attr: impl Into<String>, v: impl Into<AttributeValue>) -> Self {
        self.set_filter(attr, FilterCondition::LessThanOrEqual(v.into()))
    }

    pub fn greater_than_equal(self, attr: impl Into<String>, v: impl Into<AttributeValue>) -> Self {
        self.set_filter(attr, FilterCondition::GreaterThanOrEqual(v.into()))
    }

    pub fn between(self, attr: impl Into<String>, low: impl Into<AttributeValue>, high: impl Into<AttributeValue>) -> Self {
        self.set_filter(attr, FilterCondition::Between { low: low.into(), high: high.into() })
    }

    pub fn begins_with(self, attr: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.set_filter(attr, FilterCondition::BeginsWith(prefix.into()))
    }

    /// Sort results by `attr`. Only indexes whose sort key is `attr` can serve an ordered expression.
    pub fn order_by(mut self, attr: impl Into<String>, ascending: bool) -> Self {
        self.order = Some(OrderBy { attribute: attr.into(), ascending });
        self
    }

    /// Project the given attributes. Repeated calls append.
    ///
    /// Without any call to `select`, items are returned with every attribute and only all-projecting indexes
    /// are usable. `select` with no attributes still counts as a projection.
    pub fn select<I, S>(mut self, attrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes_specified = true;
        self.attributes.extend(attrs.into_iter().map(Into::into));
        self
    }

    /// Request strongly consistent page reads. Consistency holds within each page, not across pages, and
    /// globally distributed indexes cannot serve it.
    pub fn consistent_read(mut self, val: bool) -> Self {
        self.consistent_read = val;
        self
    }

    /// AND an arbitrary condition into the final filter, whichever index is chosen.
    pub fn filter_by(mut self, condition: Condition) -> Self {
        self.predicates.push(condition);
        self
    }

    /// Begin a condition on `attr` that continues this expression.
    pub fn and(self, attr: impl Into<String>) -> ConditionKey { ConditionKey { expr: self, attr: attr.into() } }

    pub fn condition_on(&self, attr: &str) -> Option<&FilterCondition> { self.filters.get(attr) }

    /// Per-attribute conditions in insertion order.
    pub fn filters(&self) -> impl Iterator<Item = (&str, &FilterCondition)> { self.filters.iter().map(|(k, v)| (k.as_str(), v)) }

    /// The selected attributes, or None if `select` was never called.
    pub fn selected_attributes(&self) -> Option<&[String]> {
        if self.attributes_specified {
            Some(&self.attributes)
        } else {
            None
        }
    }

    pub fn order(&self) -> Option<&OrderBy> { self.order.as_ref() }

    pub fn is_consistent_read(&self) -> bool { self.consistent_read }

    pub fn predicates(&self) -> &[Condition] { &self.predicates }
}

/// The attribute half of a condition; finish it with one of the comparison methods.
#[derive(Debug, Clone)]
pub struct ConditionKey {
    expr: Expression,
    attr: String,
}

/// Begin a new expression with a condition on `attr`.
pub fn key(attr: impl Into<String>) -> ConditionKey { ConditionKey { expr: Expression::new(), attr: attr.into() } }

impl ConditionKey {
    pub fn equal(self, v: impl Into<AttributeValue>) -> Expression { self.expr.equal(self.attr, v) }
    pub fn less_than(self, v: impl Into<AttributeValue>) -> Expression { self.expr.less_than(self.attr, v) }
    pub fn greater_than(self, v: impl Into<AttributeValue>) -> Expression { self.expr.greater_than(self.attr, v) }
    pub fn less_than_equal(self, v: impl Into<AttributeValue>) -> Expression { self.expr.less_than_equal(self.attr, v) }
    pub fn greater_than_equal(self, v: impl Into<AttributeValue>) -> Expression { self.expr.greater_than_equal(self.attr, v) }
    pub fn between(self, low: impl Into<AttributeValue>, high: impl Into<AttributeValue>) -> Expression { self.expr.between(self.attr, low, high) }
    pub fn begins_with(self, prefix: impl Into<String>) -> Expression { self.expr.begins_with(self.attr, prefix) }
}
