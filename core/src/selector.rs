//! Index selection.
//!
//! Each index of a catalog is checked for viability against an expression. Viable indexes are scored, and the
//! highest score wins; ties go to the index that appears first in the catalog.

use std::fmt;

use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use crate::{
    catalog::{IndexCatalog, SparsityMultiplier, TableIndex},
    error::{IndexNotViable, NoViableIndexes},
    expression::{Expression, FilterKind},
};

/// One reason an index cannot serve an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Infraction {
    /// The partition key has no Equal condition.
    MissingPartitionEquality(String),
    ConsistentReadUnsupported,
    /// The expression orders by an attribute other than the index's sort key.
    OrderRequiresSortKey(String),
    MissingAttributes(Vec<String>),
    RequiresFullProjection,
    /// A sparse index whose sort key the expression never mentions.
    SparseSortKeyUnused(String),
}

impl fmt::Display for Infraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Infraction::MissingPartitionEquality(attr) => write!(f, "missing Equal condition on attribute: {}", attr),
            Infraction::ConsistentReadUnsupported => write!(f, "global secondary index does not support consistent read"),
            Infraction::OrderRequiresSortKey(attr) => write!(f, "expression specifies order, so it requires an index with sort key: {}", attr),
            Infraction::MissingAttributes(attrs) => write!(f, "index does not include attributes: {}", attrs.join(", ")),
            Infraction::RequiresFullProjection => write!(f, "expression does not select attributes, so it requires an index that projects all"),
            Infraction::SparseSortKeyUnused(attr) => write!(f, "expression does not filter on sparse secondary index's sort key: {}", attr),
        }
    }
}

impl Serialize for Infraction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> { serializer.collect_str(self) }
}

/// List every reason `index` cannot serve `expr`. Empty means viable.
pub fn infractions(index: &TableIndex, expr: &Expression) -> Vec<Infraction> {
    let mut out = Vec::new();

    if !expr.condition_on(&index.partition_key).is_some_and(|c| c.is_equal()) {
        out.push(Infraction::MissingPartitionEquality(index.partition_key.clone()));
    }

    if expr.is_consistent_read() && !index.consistent_readable {
        out.push(Infraction::ConsistentReadUnsupported);
    }

    if let Some(order) = expr.order() {
        if index.sort_key.as_deref() != Some(order.attribute.as_str()) {
            out.push(Infraction::OrderRequiresSortKey(order.attribute.clone()));
        }
    }

    if !index.includes_all_attributes {
        match expr.selected_attributes() {
            Some(selected) => {
                let missing: Vec<String> = selected.iter().filter(|a| !index.includes_attribute(a)).cloned().collect();
                if !missing.is_empty() {
                    out.push(Infraction::MissingAttributes(missing));
                }
            }
            None => out.push(Infraction::RequiresFullProjection),
        }
    }

    if index.is_sparse {
        if let Some(sort_key) = &index.sort_key {
            let filtered = expr.condition_on(sort_key).is_some();
            let ordered = expr.order().is_some_and(|o| &o.attribute == sort_key);
            if !filtered && !ordered {
                out.push(Infraction::SparseSortKeyUnused(sort_key.clone()));
            }
        }
    }

    out
}

/// Preference factor for the kind of condition on a composite index's sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKeyMultiplier {
    Equal,
    Between,
    BeginsWith,
    Unfiltered,
    Neutral,
}

impl SortKeyMultiplier {
    pub fn for_index(index: &TableIndex, expr: &Expression) -> Self {
        let Some(sort_key) = &index.sort_key else { return SortKeyMultiplier::Neutral };
        match expr.condition_on(sort_key).map(|c| c.kind()) {
            None => SortKeyMultiplier::Unfiltered,
            Some(FilterKind::Equal) => SortKeyMultiplier::Equal,
            Some(FilterKind::Between) => SortKeyMultiplier::Between,
            Some(FilterKind::BeginsWith) => SortKeyMultiplier::BeginsWith,
            Some(FilterKind::LessThan | FilterKind::GreaterThan | FilterKind::LessThanOrEqual | FilterKind::GreaterThanOrEqual) => {
                SortKeyMultiplier::Neutral
            }
        }
    }

    pub fn factor(&self) -> f64 {
        match self {
            SortKeyMultiplier::Equal => 2.5,
            SortKeyMultiplier::Between => 1.8,
            SortKeyMultiplier::BeginsWith => 1.5,
            SortKeyMultiplier::Unfiltered => 0.2,
            SortKeyMultiplier::Neutral => 1.0,
        }
    }
}

/// Desirability of a viable index. Indexes with no items score `f64::MAX`.
pub fn score(index: &TableIndex, expr: &Expression) -> f64 {
    match index.sparsity_multiplier {
        SparsityMultiplier::Maximal => f64::MAX,
        SparsityMultiplier::Finite(multiplier) => multiplier * SortKeyMultiplier::for_index(index, expr).factor(),
    }
}

/// Score `index` if it is viable, otherwise report why not.
pub fn evaluate(index: &TableIndex, expr: &Expression) -> Result<f64, IndexNotViable> {
    let infractions = infractions(index, expr);
    if !infractions.is_empty() {
        return Err(IndexNotViable { index_name: index.name.clone(), infractions });
    }
    Ok(score(index, expr))
}

/// Pick the best viable index for `expr`.
pub fn choose_index<'a>(catalog: &'a IndexCatalog, expr: &Expression) -> Result<&'a TableIndex, NoViableIndexes> {
    let mut best: Option<(&TableIndex, f64)> = None;
    let mut rejected = Vec::new();

    for index in catalog.indexes() {
        match evaluate(index, expr) {
            Err(not_viable) => rejected.push(not_viable),
            Ok(score) => {
                if best.map_or(true, |(_, best_score)| score > best_score) {
                    best = Some((index, score));
                }
            }
        }
    }

    match best {
        Some((index, score)) => {
            if index.sparsity_multiplier == SparsityMultiplier::Maximal {
                warn!("Index {} on table {} chosen because it reported zero items; its metadata may be stale", index.name, catalog.table_name);
            }
            debug!("Chose index {} on table {} with score {}", index.name, catalog.table_name, score);
            Ok(index)
        }
        None => Err(NoViableIndexes { indexes: rejected }),
    }
}
