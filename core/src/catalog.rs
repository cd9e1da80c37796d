//! Table descriptors and the index catalog derived from them.
//!
//! A [`TableDescriptor`] is what the metadata collaborator reports about a table. [`IndexCatalog::build`] turns it
//! into an ordered list of [`TableIndex`] values (primary first, then secondaries in descriptor order) carrying
//! the derived properties the selector works with: consistency, projected attribute set, sparsity.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// Name carried by the primary index. Real index names cannot contain angle brackets.
pub const PRIMARY_INDEX_NAME: &str = "<primary>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyRole {
    Partition,
    Sort,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySchemaElement {
    pub attribute: String,
    pub role: KeyRole,
}

impl KeySchemaElement {
    pub fn partition(attribute: impl Into<String>) -> Self { Self { attribute: attribute.into(), role: KeyRole::Partition } }
    pub fn sort(attribute: impl Into<String>) -> Self { Self { attribute: attribute.into(), role: KeyRole::Sort } }
}

/// Which non-key attributes a secondary index carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Projection {
    All,
    KeysOnly,
    Include(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexDistribution {
    /// Partitioned independently of the table; cannot serve consistent reads.
    Global,
    /// Shares the table's partition key.
    Local,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondaryIndexDescriptor {
    pub name: String,
    pub key_schema: Vec<KeySchemaElement>,
    pub projection: Projection,
    pub distribution: IndexDistribution,
    pub item_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub name: String,
    pub key_schema: Vec<KeySchemaElement>,
    pub item_count: u64,
    pub secondary_indexes: Vec<SecondaryIndexDescriptor>,
}

/// Inverse of an index's sparsity. Indexes holding no items at all are maximally preferred.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SparsityMultiplier {
    Finite(f64),
    Maximal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableIndex {
    pub name: String,
    pub partition_key: String,
    pub sort_key: Option<String>,
    pub distribution: Option<IndexDistribution>,
    pub size: u64,
    pub consistent_readable: bool,
    pub includes_all_attributes: bool,
    /// Attributes available from the index. Only present when the index does not project everything.
    pub attribute_set: Option<BTreeSet<String>>,
    pub is_sparse: bool,
    pub sparsity: f64,
    pub sparsity_multiplier: SparsityMultiplier,
}

impl TableIndex {
    pub fn is_primary(&self) -> bool { self.name == PRIMARY_INDEX_NAME }

    pub fn is_composite(&self) -> bool { self.sort_key.is_some() }

    /// Whether items served from this index carry `attribute`.
    pub fn includes_attribute(&self, attribute: &str) -> bool {
        match &self.attribute_set {
            None => self.includes_all_attributes,
            Some(set) => set.contains(attribute),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexCatalog {
    pub table_name: String,
    indexes: Vec<TableIndex>,
}

struct KeyPair {
    partition: String,
    sort: Option<String>,
}

fn resolve_keys(index_name: &str, schema: &[KeySchemaElement]) -> Result<KeyPair, CatalogError> {
    let mut partition = None;
    let mut sort = None;
    for element in schema {
        let slot = match element.role {
            KeyRole::Partition => &mut partition,
            KeyRole::Sort => &mut sort,
        };
        if slot.is_some() {
            return Err(CatalogError::DuplicateKeyRole { index: index_name.to_string(), role: element.role });
        }
        *slot = Some(element.attribute.clone());
    }
    let partition = partition.ok_or_else(|| CatalogError::MissingPartitionKey { index: index_name.to_string() })?;
    Ok(KeyPair { partition, sort })
}

impl IndexCatalog {
    /// Derive the catalog for a table.
    ///
    /// Secondary composite indexes are sparse when they hold fewer than `sparsity_threshold` times the table's
    /// item count, unless their sort key is one of the table's own key attributes. A threshold at or below 0
    /// disables sparseness; one above 1 makes every composite secondary index sparse.
    pub fn build(descriptor: &TableDescriptor, sparsity_threshold: f64) -> Result<Self, CatalogError> {
        let primary_keys = resolve_keys(PRIMARY_INDEX_NAME, &descriptor.key_schema)?;
        let table_size = descriptor.item_count;

        let mut indexes = Vec::with_capacity(descriptor.secondary_indexes.len() + 1);
        indexes.push(TableIndex {
            name: PRIMARY_INDEX_NAME.to_string(),
            partition_key: primary_keys.partition.clone(),
            sort_key: primary_keys.sort.clone(),
            distribution: None,
            size: table_size,
            consistent_readable: true,
            includes_all_attributes: true,
            attribute_set: None,
            is_sparse: false,
            sparsity: 1.0,
            sparsity_multiplier: SparsityMultiplier::Finite(1.0),
        });

        let mut seen = BTreeSet::new();
        for secondary in &descriptor.secondary_indexes {
            if secondary.name == PRIMARY_INDEX_NAME {
                return Err(CatalogError::ReservedIndexName(secondary.name.clone()));
            }
            if !seen.insert(secondary.name.as_str()) {
                return Err(CatalogError::DuplicateIndexName(secondary.name.clone()));
            }

            let keys = resolve_keys(&secondary.name, &secondary.key_schema)?;

            let (includes_all_attributes, attribute_set) = match &secondary.projection {
                Projection::All => (true, None),
                Projection::KeysOnly | Projection::Include(_) => {
                    let mut set = BTreeSet::new();
                    set.insert(keys.partition.clone());
                    set.extend(keys.sort.clone());
                    set.insert(primary_keys.partition.clone());
                    set.extend(primary_keys.sort.clone());
                    if let Projection::Include(extra) = &secondary.projection {
                        set.extend(extra.iter().cloned());
                    }
                    (false, Some(set))
                }
            };

            let sparsity = if table_size == 0 { 0.0 } else { secondary.item_count as f64 / table_size as f64 };
            let sparsity_multiplier = if secondary.item_count == 0 {
                SparsityMultiplier::Maximal
            } else {
                SparsityMultiplier::Finite(table_size as f64 / secondary.item_count as f64)
            };

            let is_sparse = match &keys.sort {
                // sparseness is about sort-key presence; partition-key presence is already enforced by the selector
                None => false,
                Some(sort) if *sort == primary_keys.partition || Some(sort) == primary_keys.sort.as_ref() => false,
                Some(_) if sparsity_threshold <= 0.0 => false,
                Some(_) if sparsity_threshold > 1.0 => true,
                Some(_) => sparsity < sparsity_threshold,
            };

            indexes.push(TableIndex {
                name: secondary.name.clone(),
                partition_key: keys.partition,
                sort_key: keys.sort,
                distribution: Some(secondary.distribution),
                size: secondary.item_count,
                consistent_readable: secondary.distribution != IndexDistribution::Global,
                includes_all_attributes,
                attribute_set,
                is_sparse,
                sparsity,
                sparsity_multiplier,
            });
        }

        Ok(Self { table_name: descriptor.name.clone(), indexes })
    }

    pub fn primary(&self) -> &TableIndex { &self.indexes[0] }

    pub fn indexes(&self) -> &[TableIndex] { &self.indexes }

    pub fn secondary(&self) -> &[TableIndex] { &self.indexes[1..] }

    pub fn get(&self, name: &str) -> Option<&TableIndex> { self.indexes.iter().find(|i| i.name == name) }
}
