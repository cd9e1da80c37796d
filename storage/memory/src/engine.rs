use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        RwLock,
    },
    time::Duration,
};

use async_trait::async_trait;
use autoquery_core::{
    catalog::{IndexDistribution, TableDescriptor},
    compiler::QueryRequest,
    error::StoreError,
    traits::{ItemStore, MetadataProvider, Page, QueryExecutor},
    value::AttributeMap,
};
use tracing::debug;

use crate::{
    scan::{item_key, scan},
    schema::TableSchema,
};

/// Page size used when a request carries no limit, standing in for the store's per-page byte budget.
pub const DEFAULT_PAGE_SIZE: usize = 100;

struct MemoryTable {
    schema: TableSchema,
    items: Vec<AttributeMap>,
}

impl MemoryTable {
    fn position_of(&self, key: &AttributeMap) -> Option<usize> {
        self.items.iter().position(|item| self.schema.keys.attributes().all(|attr| item.get(attr) == key.get(attr)))
    }
}

/// In-process wide-column store with per-table secondary indexes.
///
/// Locks are held only for the duration of a single operation and never across an await.
pub struct MemoryStore {
    tables: RwLock<BTreeMap<String, MemoryTable>>,
    page_size: usize,
    latency: RwLock<Option<Duration>>,
    failures_pending: AtomicUsize,
    describe_calls: AtomicUsize,
    execute_calls: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self { Self::new() }
}

impl MemoryStore {
    pub fn new() -> Self { Self::with_page_size(DEFAULT_PAGE_SIZE) }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            tables: RwLock::new(BTreeMap::new()),
            page_size: page_size.max(1),
            latency: RwLock::new(None),
            failures_pending: AtomicUsize::new(0),
            describe_calls: AtomicUsize::new(0),
            execute_calls: AtomicUsize::new(0),
        }
    }

    fn read_tables(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, MemoryTable>> { self.tables.read().unwrap_or_else(|e| e.into_inner()) }

    fn write_tables(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, MemoryTable>> {
        self.tables.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Create a table, replacing any existing table of the same name.
    pub fn create_table(&self, schema: TableSchema) {
        debug!("MemoryStore.create_table {}", schema.name);
        self.write_tables().insert(schema.name.clone(), MemoryTable { schema, items: Vec::new() });
    }

    /// Insert items without going through the async interface.
    pub fn load(&self, table_name: &str, items: impl IntoIterator<Item = AttributeMap>) -> Result<(), StoreError> {
        let mut tables = self.write_tables();
        let table = tables.get_mut(table_name).ok_or_else(|| StoreError::TableNotFound(table_name.to_string()))?;
        for item in items {
            Self::upsert(table, item)?;
        }
        Ok(())
    }

    fn upsert(table: &mut MemoryTable, item: AttributeMap) -> Result<(), StoreError> {
        if let Some(missing) = table.schema.keys.attributes().find(|attr| !item.contains_key(*attr)) {
            return Err(StoreError::Validation(format!("item is missing key attribute {}", missing)));
        }
        match table.position_of(&item) {
            Some(i) => table.items[i] = item,
            None => table.items.push(item),
        }
        Ok(())
    }

    /// Delay every subsequent describe and page fetch.
    pub fn set_latency(&self, latency: Option<Duration>) { *self.latency.write().unwrap_or_else(|e| e.into_inner()) = latency; }

    /// Fail the next `count` page fetches with a throttling error.
    pub fn throttle_next_pages(&self, count: usize) { self.failures_pending.store(count, Ordering::SeqCst); }

    pub fn describe_calls(&self) -> usize { self.describe_calls.load(Ordering::SeqCst) }

    pub fn execute_calls(&self) -> usize { self.execute_calls.load(Ordering::SeqCst) }

    async fn simulate_latency(&self) {
        let latency = *self.latency.read().unwrap_or_else(|e| e.into_inner());
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn take_failure(&self) -> bool { self.failures_pending.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok() }

    fn run_query(&self, request: &QueryRequest) -> Result<Page, StoreError> {
        let tables = self.read_tables();
        let table = tables.get(&request.table_name).ok_or_else(|| StoreError::TableNotFound(request.table_name.clone()))?;

        let (index_keys, projection) = match &request.index_name {
            None => (&table.schema.keys, None),
            Some(name) => {
                let index = table.schema.find_index(name).ok_or_else(|| StoreError::Validation(format!("table {} has no index {}", table.schema.name, name)))?;
                if request.consistent_read && index.distribution == IndexDistribution::Global {
                    return Err(StoreError::Validation(format!("consistent reads are not supported on global index {}", name)));
                }
                (&index.keys, Some(&index.projection))
            }
        };

        let max_evaluated = match request.limit {
            Some(0) => return Err(StoreError::Validation("limit must be at least 1".to_string())),
            Some(limit) => (limit as usize).min(self.page_size),
            None => self.page_size,
        };

        let outcome = scan(table.items.iter(), request, index_keys, &table.schema.keys, projection, max_evaluated);
        Ok(Page::new(outcome.items, outcome.last_evaluated_key))
    }
}

#[async_trait]
impl MetadataProvider for MemoryStore {
    async fn describe(&self, table_name: &str) -> Result<TableDescriptor, StoreError> {
        self.simulate_latency().await;
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        let tables = self.read_tables();
        let table = tables.get(table_name).ok_or_else(|| StoreError::TableNotFound(table_name.to_string()))?;
        Ok(table.schema.describe(table.items.iter()))
    }
}

#[async_trait]
impl QueryExecutor for MemoryStore {
    async fn execute(&self, request: &QueryRequest) -> Result<Page, StoreError> {
        self.simulate_latency().await;
        self.execute_calls.fetch_add(1, Ordering::SeqCst);
        if self.take_failure() {
            return Err(StoreError::Throttled(format!("query on {} throttled", request.table_name)));
        }
        debug!(
            "MemoryStore.execute {} index={} key={}",
            request.table_name,
            request.index_name.as_deref().unwrap_or("<primary>"),
            request.render().key_condition_expression
        );
        self.run_query(request)
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn get_item(&self, table_name: &str, key: &AttributeMap) -> Result<Option<AttributeMap>, StoreError> {
        let tables = self.read_tables();
        let table = tables.get(table_name).ok_or_else(|| StoreError::TableNotFound(table_name.to_string()))?;
        if let Some(missing) = table.schema.keys.attributes().find(|attr| !key.contains_key(*attr)) {
            return Err(StoreError::Validation(format!("key is missing attribute {}", missing)));
        }
        Ok(table.position_of(key).map(|i| table.items[i].clone()))
    }

    async fn put_item(&self, table_name: &str, item: AttributeMap) -> Result<(), StoreError> {
        let mut tables = self.write_tables();
        let table = tables.get_mut(table_name).ok_or_else(|| StoreError::TableNotFound(table_name.to_string()))?;
        debug!("MemoryStore.put_item {} {:?}", table_name, item_key(&item, &table.schema.keys, &table.schema.keys));
        Self::upsert(table, item)
    }
}
