use std::{future::Future, sync::Arc};

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::{
    action_debug,
    catalog::{IndexCatalog, TableIndex},
    codec::{from_item, to_item, ItemCodec, SerdeCodec},
    compiler::{compile, QueryRequest},
    config::ClientConfig,
    cursor::PaginatedCursor,
    error::{QueryError, StoreError},
    expression::Expression,
    render::RenderedRequest,
    selector,
    traits::{ItemStore, MetadataProvider, Page, QueryExecutor},
    util::safemap::SafeMap,
};

/// Querying client with automatic index selection.
///
/// Table catalogs are fetched on the first query against a table and cached for the life of the client (and its
/// clones). Cached catalogs are never refreshed automatically; see [`Client::forget_table`].
#[derive(Clone)]
pub struct Client(Arc<Inner>);

struct Inner {
    metadata: Arc<dyn MetadataProvider>,
    executor: Arc<dyn QueryExecutor>,
    items: Arc<dyn ItemStore>,
    config: ClientConfig,
    catalogs: SafeMap<String, Arc<IndexCatalog>>,
}

/// The outcome of planning a query without running it.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub index: TableIndex,
    pub score: f64,
    pub request: QueryRequest,
}

impl QueryPlan {
    pub fn rendered(&self) -> RenderedRequest { self.request.render() }
}

impl Client {
    /// A client backed by a single store implementing every collaborator.
    pub fn new<S>(store: Arc<S>, config: ClientConfig) -> Self
    where S: MetadataProvider + QueryExecutor + ItemStore + 'static {
        Self::with_collaborators(store.clone(), store.clone(), store, config)
    }

    pub fn with_collaborators(
        metadata: Arc<dyn MetadataProvider>,
        executor: Arc<dyn QueryExecutor>,
        items: Arc<dyn ItemStore>,
        config: ClientConfig,
    ) -> Self {
        Self(Arc::new(Inner { metadata, executor, items, config, catalogs: SafeMap::new() }))
    }

    pub fn config(&self) -> &ClientConfig { &self.0.config }

    pub fn table(&self, name: impl Into<String>) -> Table { Table { client: self.clone(), name: name.into() } }

    async fn within<R>(&self, fut: impl Future<Output = Result<R, StoreError>>) -> Result<R, QueryError> {
        match self.0.config.fetch_timeout {
            None => Ok(fut.await?),
            Some(deadline) => match tokio::time::timeout(deadline, fut).await {
                Ok(result) => Ok(result?),
                Err(_) => Err(QueryError::Timeout),
            },
        }
    }

    /// The index catalog for `table_name`, fetching and caching it on first use.
    pub async fn catalog(&self, table_name: &str) -> Result<Arc<IndexCatalog>, QueryError> {
        let key = table_name.to_string();
        if let Some(catalog) = self.0.catalogs.get(&key) {
            debug!("Catalog cache hit for table {}", table_name);
            return Ok(catalog);
        }

        action_debug!("Client", "describe", "{}", table_name);
        let descriptor = self.within(self.0.metadata.describe(table_name)).await?;
        let catalog = Arc::new(IndexCatalog::build(&descriptor, self.0.config.sparsity_threshold)?);

        // a concurrent first query may have populated the entry meanwhile; keep whichever landed first
        Ok(self.0.catalogs.insert_if_absent(key, catalog))
    }

    /// Drop the cached catalog for a table so the next query describes it again.
    pub fn forget_table(&self, table_name: &str) -> bool { self.0.catalogs.remove(&table_name.to_string()).is_some() }

    pub fn cached_tables(&self) -> usize { self.0.catalogs.len() }

    /// Choose an index for `expr` and compile the request, without fetching any page.
    pub async fn plan(&self, table_name: &str, expr: &Expression) -> Result<QueryPlan, QueryError> {
        let catalog = self.catalog(table_name).await?;
        let index = selector::choose_index(&catalog, expr)?;
        let request = compile(table_name, index, expr)?;
        Ok(QueryPlan { index: index.clone(), score: selector::score(index, expr), request })
    }

    pub(crate) async fn fetch_page(&self, request: &QueryRequest) -> Result<Page, QueryError> { self.within(self.0.executor.execute(request)).await }

    /// Start a query. Nothing is fetched until the cursor is first pulled.
    pub fn query<T>(&self, table_name: impl Into<String>, expr: Expression) -> PaginatedCursor<T>
    where T: Serialize + DeserializeOwned {
        self.query_with_codec(table_name, expr, SerdeCodec::new())
    }

    pub fn query_with_codec<T, C: ItemCodec<T>>(&self, table_name: impl Into<String>, expr: Expression, codec: C) -> PaginatedCursor<T, C> {
        PaginatedCursor::new(self.clone(), table_name.into(), expr, codec)
    }

    /// Fetch one item by primary key. `key` must serialize to a map of the table's key attributes.
    pub async fn get<K, T>(&self, table_name: &str, key: &K) -> Result<T, QueryError>
    where
        K: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let key = to_item(key)?;
        match self.within(self.0.items.get_item(table_name, &key)).await? {
            Some(item) => Ok(from_item(item)?),
            None => Err(QueryError::ItemNotFound),
        }
    }

    /// Insert a record, replacing any item with the same primary key.
    pub async fn put<T: Serialize + ?Sized>(&self, table_name: &str, record: &T) -> Result<(), QueryError> {
        let item = to_item(record)?;
        self.within(self.0.items.put_item(table_name, item)).await
    }
}

/// A handle on one table of a [`Client`].
#[derive(Clone)]
pub struct Table {
    client: Client,
    name: String,
}

impl Table {
    pub fn name(&self) -> &str { &self.name }

    pub fn query<T>(&self, expr: Expression) -> PaginatedCursor<T>
    where T: Serialize + DeserializeOwned {
        self.client.query(self.name.clone(), expr)
    }

    pub async fn plan(&self, expr: &Expression) -> Result<QueryPlan, QueryError> { self.client.plan(&self.name, expr).await }

    pub async fn get<K, T>(&self, key: &K) -> Result<T, QueryError>
    where
        K: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.client.get(&self.name, key).await
    }

    pub async fn put<T: Serialize + ?Sized>(&self, record: &T) -> Result<(), QueryError> { self.client.put(&self.name, record).await }
}
