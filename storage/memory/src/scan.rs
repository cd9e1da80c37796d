//! Index scans over a table's items.

use std::cmp::Ordering;

use autoquery_core::{
    catalog::Projection,
    compiler::QueryRequest,
    value::{AttributeMap, AttributeValue, ValueType},
};

use crate::{filtering::evaluate, schema::KeyDefinition};

fn type_rank(value: &AttributeValue) -> u8 {
    match value.value_type() {
        ValueType::Null => 0,
        ValueType::Boolean => 1,
        ValueType::Number => 2,
        ValueType::String => 3,
        ValueType::Binary => 4,
        ValueType::List => 5,
        ValueType::Map => 6,
    }
}

/// Total order used for index sorting. Values of different types order by type.
pub fn key_cmp(a: Option<&AttributeValue>, b: Option<&AttributeValue>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a.compare(b).unwrap_or_else(|| type_rank(a).cmp(&type_rank(b))),
    }
}

/// Sort position of an item within an index: index sort key, then the table's primary key.
fn position<'a>(item: &'a AttributeMap, index: &'a KeyDefinition, table: &'a KeyDefinition) -> Vec<Option<&'a AttributeValue>> {
    index.sort_key.iter().chain(std::iter::once(&table.partition_key)).chain(table.sort_key.iter()).map(|attr| item.get(attr)).collect()
}

fn position_cmp(a: &[Option<&AttributeValue>], b: &[Option<&AttributeValue>]) -> Ordering {
    a.iter().zip(b).map(|(x, y)| key_cmp(*x, *y)).find(|o| o.is_ne()).unwrap_or(Ordering::Equal)
}

/// Key of an item as reported in continuation keys: index keys plus the table's keys.
pub fn item_key(item: &AttributeMap, index: &KeyDefinition, table: &KeyDefinition) -> AttributeMap {
    index.attributes().chain(table.attributes()).filter_map(|attr| item.get(attr).map(|v| (attr.to_string(), v.clone()))).collect()
}

fn project(mut item: AttributeMap, attributes: impl Fn(&str) -> bool) -> AttributeMap {
    item.retain(|name, _| attributes(name.as_str()));
    item
}

pub struct ScanOutcome {
    pub items: Vec<AttributeMap>,
    pub last_evaluated_key: Option<AttributeMap>,
}

/// Run one page of `request` over `items`, which all belong to the addressed index.
///
/// At most `max_evaluated` rows are evaluated; the filter applies to evaluated rows only, so a page may come back
/// short or empty while a continuation key is still reported.
pub fn scan<'a>(
    items: impl Iterator<Item = &'a AttributeMap>,
    request: &QueryRequest,
    index: &KeyDefinition,
    table: &KeyDefinition,
    index_projection: Option<&Projection>,
    max_evaluated: usize,
) -> ScanOutcome {
    let key_condition = request.key_condition.to_condition();
    let mut rows: Vec<&AttributeMap> = items.filter(|item| index.covers(item) && evaluate(*item, &key_condition)).collect();

    rows.sort_by(|a, b| position_cmp(&position(a, index, table), &position(b, index, table)));
    if !request.scan_forward {
        rows.reverse();
    }

    if let Some(start) = &request.exclusive_start_key {
        let start_position = position(start, index, table);
        let after_start = |row: &&AttributeMap| {
            let ordering = position_cmp(&position(row, index, table), &start_position);
            if request.scan_forward {
                ordering.is_gt()
            } else {
                ordering.is_lt()
            }
        };
        rows.retain(after_start);
    }

    let remaining = rows.len();
    let evaluated: Vec<&AttributeMap> = rows.into_iter().take(max_evaluated).collect();
    let last_evaluated_key = match evaluated.last() {
        Some(last) if evaluated.len() < remaining => Some(item_key(last, index, table)),
        _ => None,
    };

    let items = evaluated
        .into_iter()
        .filter(|item| request.filter.as_ref().map_or(true, |filter| evaluate(*item, filter)))
        .map(|item| {
            let item = match index_projection {
                None | Some(Projection::All) => item.clone(),
                Some(Projection::KeysOnly) => project(item.clone(), |name| index.attributes().chain(table.attributes()).any(|k| k == name)),
                Some(Projection::Include(extra)) => project(item.clone(), |name| {
                    index.attributes().chain(table.attributes()).any(|k| k == name) || extra.iter().any(|e| e == name)
                }),
            };
            match &request.projection {
                Some(attributes) if !attributes.is_empty() => project(item, |name| attributes.iter().any(|a| a == name)),
                _ => item,
            }
        })
        .collect();

    ScanOutcome { items, last_evaluated_key }
}
