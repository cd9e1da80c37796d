//! Lowering an expression onto a chosen index.

use serde::{Deserialize, Serialize};

use crate::{
    catalog::TableIndex,
    condition::Condition,
    error::{IndexNotViable, NoViableIndexes, QueryError},
    expression::{Expression, FilterCondition},
    selector::Infraction,
    value::{AttributeMap, AttributeValue},
};

/// The key condition of a query: an equality on the partition key, optionally narrowed on the sort key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyCondition {
    pub partition_key: String,
    pub partition_value: AttributeValue,
    pub sort: Option<(String, FilterCondition)>,
}

impl KeyCondition {
    pub fn to_condition(&self) -> Condition {
        let partition = Condition::eq(self.partition_key.clone(), self.partition_value.clone());
        match &self.sort {
            None => partition,
            Some((attribute, filter)) => partition.and(filter.to_condition(attribute)),
        }
    }
}

/// A store-native query against one index of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub table_name: String,
    /// None addresses the table's primary index.
    pub index_name: Option<String>,
    pub key_condition: KeyCondition,
    pub filter: Option<Condition>,
    pub projection: Option<Vec<String>>,
    pub scan_forward: bool,
    pub consistent_read: bool,
    /// Maximum number of items the store evaluates for one page.
    pub limit: Option<u32>,
    pub exclusive_start_key: Option<AttributeMap>,
}

/// Compile `expr` into a request against `index`, which the selector has already accepted.
///
/// The partition key condition, and the sort key condition when the index is composite, become the key
/// condition. Every other attribute condition and every extra predicate is ANDed into the filter.
pub fn compile(table_name: &str, index: &TableIndex, expr: &Expression) -> Result<QueryRequest, QueryError> {
    let partition_value = match expr.condition_on(&index.partition_key) {
        Some(FilterCondition::Equal(v)) => v.clone(),
        _ => {
            return Err(NoViableIndexes {
                indexes: vec![IndexNotViable {
                    index_name: index.name.clone(),
                    infractions: vec![Infraction::MissingPartitionEquality(index.partition_key.clone())],
                }],
            }
            .into())
        }
    };

    let sort = index.sort_key.as_ref().and_then(|sk| expr.condition_on(sk).map(|f| (sk.clone(), f.clone())));

    let mut clauses: Vec<Condition> = expr
        .filters()
        .filter(|(attr, _)| *attr != index.partition_key && Some(*attr) != index.sort_key.as_deref())
        .map(|(attr, filter)| filter.to_condition(attr))
        .collect();
    clauses.extend(expr.predicates().iter().cloned());

    Ok(QueryRequest {
        table_name: table_name.to_string(),
        index_name: if index.is_primary() { None } else { Some(index.name.clone()) },
        key_condition: KeyCondition { partition_key: index.partition_key.clone(), partition_value, sort },
        filter: Condition::all(clauses),
        // an empty selection still restricts index choice but projects nothing away
        projection: expr.selected_attributes().filter(|attrs| !attrs.is_empty()).map(|attrs| attrs.to_vec()),
        scan_forward: expr.order().map_or(true, |o| o.ascending),
        consistent_read: expr.is_consistent_read(),
        limit: None,
        exclusive_start_key: None,
    })
}
