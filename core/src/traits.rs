use async_trait::async_trait;

use crate::{catalog::TableDescriptor, compiler::QueryRequest, error::StoreError, value::AttributeMap};

/// One page of query results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<AttributeMap>,
    /// Key to resume after. None or empty once the query has evaluated everything.
    pub last_evaluated_key: Option<AttributeMap>,
}

impl Page {
    pub fn new(items: Vec<AttributeMap>, last_evaluated_key: Option<AttributeMap>) -> Self { Self { items, last_evaluated_key } }
}

#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Describe a table's key schema, secondary indexes and item counts.
    async fn describe(&self, table_name: &str) -> Result<TableDescriptor, StoreError>;
}

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Fetch one page for `request`. Implementations must not retry.
    async fn execute(&self, request: &QueryRequest) -> Result<Page, StoreError>;
}

#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn get_item(&self, table_name: &str, key: &AttributeMap) -> Result<Option<AttributeMap>, StoreError>;

    /// Insert the item, replacing any item with the same primary key.
    async fn put_item(&self, table_name: &str, item: AttributeMap) -> Result<(), StoreError>;
}
