//! Paginated retrieval.
//!
//! A [`PaginatedCursor`] turns repeated page fetches into a flat, one-item-at-a-time stream of decoded records.
//! The index is chosen and the request compiled on the first fetch; every later fetch reuses that request with
//! the latest continuation key and page limit.
//!
//! State only changes after a page fetch succeeds, so a failed, timed out or dropped pull leaves the cursor
//! exactly as it was and the next pull retries the same page.

use std::{marker::PhantomData, time::Duration};

use futures::Stream;

use crate::{
    action_debug,
    client::Client,
    codec::{ItemCodec, SerdeCodec},
    compiler::QueryRequest,
    error::{CompletionReason, QueryError},
    expression::Expression,
    value::AttributeMap,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Nothing fetched yet.
    Fresh,
    /// At least one page fetched and more items may follow, either still buffered
    /// or behind a continuation key that the next pull will fetch.
    Filled,
    /// Every item has been returned.
    Exhausted,
    /// The page cap was reached.
    Capped,
}

pub struct PaginatedCursor<T, C = SerdeCodec<T>> {
    client: Client,
    table_name: String,
    expr: Expression,
    codec: C,

    max_pages: Option<usize>,
    limit_per_page: Option<u32>,
    exclusive_start_key: Option<AttributeMap>,

    request: Option<QueryRequest>,
    pages_fetched: usize,
    buffer: Vec<AttributeMap>,
    position: usize,

    _record: PhantomData<fn() -> T>,
}

impl<T, C: ItemCodec<T>> PaginatedCursor<T, C> {
    pub(crate) fn new(client: Client, table_name: String, expr: Expression, codec: C) -> Self {
        Self {
            client,
            table_name,
            expr,
            codec,
            max_pages: None,
            limit_per_page: None,
            exclusive_start_key: None,
            request: None,
            pages_fetched: 0,
            buffer: Vec::new(),
            position: 0,
            _record: PhantomData,
        }
    }

    /// Stop after `max_pages` pages have been fetched. By default pages are fetched until the query is exhausted.
    pub fn set_max_pagination(&mut self, max_pages: usize) -> &mut Self {
        self.max_pages = Some(max_pages);
        self
    }

    pub fn unset_max_pagination(&mut self) -> &mut Self {
        self.max_pages = None;
        self
    }

    /// Limit the number of items the store evaluates per page. Items removed by the filter still count, so a page
    /// may return fewer items than the limit, or none at all.
    pub fn set_limit_per_page(&mut self, limit: u32) -> &mut Self {
        self.limit_per_page = Some(limit);
        self
    }

    pub fn unset_limit_per_page(&mut self) -> &mut Self {
        self.limit_per_page = None;
        self
    }

    /// Resume the next page fetch strictly after `key`.
    pub fn set_exclusive_start_key(&mut self, key: AttributeMap) -> &mut Self {
        self.exclusive_start_key = if key.is_empty() { None } else { Some(key) };
        self
    }

    /// Continuation key recorded from the last fetched page, or the key set by the caller before the first fetch.
    /// Passing it to a new cursor over the same expression resumes after the last fetched page.
    pub fn continuation_key(&self) -> Option<&AttributeMap> { self.exclusive_start_key.as_ref() }

    pub fn pages_fetched(&self) -> usize { self.pages_fetched }

    /// The compiled request, once the first page has been fetched.
    pub fn request(&self) -> Option<&QueryRequest> { self.request.as_ref() }

    fn all_items_parsed(&self) -> bool { self.pages_fetched > 0 && self.exclusive_start_key.is_none() }

    fn max_pagination_reached(&self) -> bool { self.max_pages.is_some_and(|max| self.pages_fetched >= max) }

    pub fn state(&self) -> CursorState {
        if self.position < self.buffer.len() {
            CursorState::Filled
        } else if self.all_items_parsed() {
            CursorState::Exhausted
        } else if self.max_pagination_reached() {
            CursorState::Capped
        } else if self.pages_fetched == 0 {
            CursorState::Fresh
        } else {
            CursorState::Filled
        }
    }

    /// Return the next record.
    ///
    /// Fails with [`QueryError::ParsingComplete`] once every item has been returned or the page cap is reached.
    /// A decode failure consumes the offending item; the following call moves on to the next one.
    pub async fn next(&mut self) -> Result<T, QueryError> {
        while self.position == self.buffer.len() {
            if self.all_items_parsed() {
                action_debug!("Cursor", "complete", "{} after {} pages", self.table_name, self.pages_fetched);
                return Err(QueryError::ParsingComplete(CompletionReason::AllItemsParsed));
            }
            if self.max_pagination_reached() {
                action_debug!("Cursor", "capped", "{} after {} pages", self.table_name, self.pages_fetched);
                return Err(QueryError::ParsingComplete(CompletionReason::MaxPaginationReached));
            }
            self.fetch_page().await?;
        }

        let item = std::mem::take(&mut self.buffer[self.position]);
        self.position += 1;
        Ok(self.codec.decode(item)?)
    }

    /// [`next`](Self::next) bounded by a deadline. On expiry the cursor is left untouched.
    pub async fn next_within(&mut self, deadline: Duration) -> Result<T, QueryError> {
        match tokio::time::timeout(deadline, self.next()).await {
            Ok(result) => result,
            Err(_) => Err(QueryError::Timeout),
        }
    }

    async fn fetch_page(&mut self) -> Result<(), QueryError> {
        let mut request = match &self.request {
            Some(request) => request.clone(),
            None => self.client.plan(&self.table_name, &self.expr).await?.request,
        };
        request.limit = self.limit_per_page;
        request.exclusive_start_key = self.exclusive_start_key.clone();

        let page = self.client.fetch_page(&request).await?;

        self.pages_fetched += 1;
        action_debug!("Cursor", "page", "{} #{} returned {} items", self.table_name, self.pages_fetched, page.items.len());
        self.exclusive_start_key = page.last_evaluated_key.filter(|key| !key.is_empty());
        self.buffer = page.items;
        self.position = 0;
        self.request = Some(request);
        Ok(())
    }

    /// Stream the remaining records. The stream ends cleanly when the cursor completes and right after the first
    /// error it yields.
    pub fn into_stream(self) -> impl Stream<Item = Result<T, QueryError>> {
        futures::stream::unfold(Some(self), |cursor| async move {
            let mut cursor = cursor?;
            match cursor.next().await {
                Ok(record) => Some((Ok(record), Some(cursor))),
                Err(QueryError::ParsingComplete(_)) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }
}
