//! Client-side query planning for wide-column stores with multiple indexes per table.
//!
//! Build an [`Expression`], hand it to a [`Client`] (or a [`Table`] handle), and pull records from the returned
//! [`PaginatedCursor`]. The client picks the index, compiles the request and drives pagination.

pub mod catalog;
pub mod client;
pub mod codec;
pub mod compiler;
pub mod condition;
pub mod config;
pub mod cursor;
pub mod error;
pub mod expression;
pub mod render;
pub mod selector;
pub mod traits;
pub mod util;
pub mod value;

pub use catalog::{IndexCatalog, TableDescriptor, TableIndex};
pub use client::{Client, QueryPlan, Table};
pub use codec::{ItemCodec, RawCodec, SerdeCodec};
pub use compiler::QueryRequest;
pub use condition::Condition;
pub use config::ClientConfig;
pub use cursor::{CursorState, PaginatedCursor};
pub use error::{CompletionReason, QueryError, StoreError};
pub use expression::{key, Expression};
pub use traits::{ItemStore, MetadataProvider, Page, QueryExecutor};
pub use value::{AttributeMap, AttributeValue};
