//! In-memory wide-column store for autoquery.
//!
//! Implements the metadata, query and item collaborators of [`autoquery_core::Client`] over plain vectors of items,
//! with key-condition evaluation, index ordering, continuation keys, projections and post-limit filtering.

pub mod engine;
pub mod filtering;
pub mod scan;
pub mod schema;

pub use engine::{MemoryStore, DEFAULT_PAGE_SIZE};
pub use schema::{IndexSchema, KeyDefinition, TableSchema};
