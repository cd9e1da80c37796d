use autoquery_core::{
    catalog::{IndexDistribution, KeySchemaElement, Projection, SecondaryIndexDescriptor, TableDescriptor},
    value::AttributeMap,
};

/// Key attributes of a table or index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDefinition {
    pub partition_key: String,
    pub sort_key: Option<String>,
}

impl KeyDefinition {
    pub fn new(partition_key: impl Into<String>, sort_key: Option<&str>) -> Self {
        Self { partition_key: partition_key.into(), sort_key: sort_key.map(str::to_string) }
    }

    pub fn attributes(&self) -> impl Iterator<Item = &str> { std::iter::once(self.partition_key.as_str()).chain(self.sort_key.as_deref()) }

    /// An item belongs to an index only if it carries every key attribute of that index.
    pub fn covers(&self, item: &AttributeMap) -> bool { self.attributes().all(|attr| item.contains_key(attr)) }

    pub fn key_schema(&self) -> Vec<KeySchemaElement> {
        let mut schema = vec![KeySchemaElement::partition(self.partition_key.clone())];
        schema.extend(self.sort_key.clone().map(KeySchemaElement::sort));
        schema
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexSchema {
    pub name: String,
    pub keys: KeyDefinition,
    pub distribution: IndexDistribution,
    pub projection: Projection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub name: String,
    pub keys: KeyDefinition,
    pub indexes: Vec<IndexSchema>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, partition_key: &str, sort_key: Option<&str>) -> Self {
        Self { name: name.into(), keys: KeyDefinition::new(partition_key, sort_key), indexes: Vec::new() }
    }

    pub fn global_index(self, name: &str, partition_key: &str, sort_key: Option<&str>, projection: Projection) -> Self {
        self.index(name, KeyDefinition::new(partition_key, sort_key), IndexDistribution::Global, projection)
    }

    /// Local indexes share the table's partition key.
    pub fn local_index(self, name: &str, sort_key: &str, projection: Projection) -> Self {
        let keys = KeyDefinition::new(self.keys.partition_key.clone(), Some(sort_key));
        self.index(name, keys, IndexDistribution::Local, projection)
    }

    fn index(mut self, name: &str, keys: KeyDefinition, distribution: IndexDistribution, projection: Projection) -> Self {
        self.indexes.push(IndexSchema { name: name.to_string(), keys, distribution, projection });
        self
    }

    pub fn find_index(&self, name: &str) -> Option<&IndexSchema> { self.indexes.iter().find(|i| i.name == name) }

    /// Describe the table with live item counts.
    pub fn describe<'a>(&self, items: impl Iterator<Item = &'a AttributeMap> + Clone) -> TableDescriptor {
        TableDescriptor {
            name: self.name.clone(),
            key_schema: self.keys.key_schema(),
            item_count: items.clone().count() as u64,
            secondary_indexes: self
                .indexes
                .iter()
                .map(|index| SecondaryIndexDescriptor {
                    name: index.name.clone(),
                    key_schema: index.keys.key_schema(),
                    projection: index.projection.clone(),
                    distribution: index.distribution,
                    item_count: items.clone().filter(|item| index.keys.covers(item)).count() as u64,
                })
                .collect(),
        }
    }
}
