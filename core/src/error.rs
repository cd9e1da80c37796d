use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::{catalog::KeyRole, selector::Infraction};

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("{0}")]
    NoViableIndex(NoViableIndexes),
    /// Not a failure: the cursor has nothing more to return.
    #[error("parsing complete: {0}")]
    ParsingComplete(CompletionReason),
    #[error("item not found")]
    ItemNotFound,
    #[error("invalid table descriptor: {0}")]
    InvalidDescriptor(#[from] CatalogError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("fetch deadline elapsed")]
    Timeout,
}

impl QueryError {
    pub fn is_parsing_complete(&self) -> bool { matches!(self, QueryError::ParsingComplete(_)) }
}

impl From<NoViableIndexes> for QueryError {
    fn from(err: NoViableIndexes) -> Self { QueryError::NoViableIndex(err) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionReason {
    AllItemsParsed,
    MaxPaginationReached,
}

impl fmt::Display for CompletionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionReason::AllItemsParsed => write!(f, "all items parsed"),
            CompletionReason::MaxPaginationReached => write!(f, "max pagination reached"),
        }
    }
}

/// Why one index cannot serve an expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexNotViable {
    pub index_name: String,
    #[serde(rename = "notViableReasons", skip_serializing_if = "Vec::is_empty")]
    pub infractions: Vec<Infraction>,
}

impl fmt::Display for IndexNotViable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "index not viable for expression: {}", serde_json::to_string(self).map_err(|_| fmt::Error)?)
    }
}

impl std::error::Error for IndexNotViable {}

/// Every index of the table was rejected. Carries each index's infractions in catalog order.
#[derive(Debug, Clone, PartialEq)]
pub struct NoViableIndexes {
    pub indexes: Vec<IndexNotViable>,
}

impl fmt::Display for NoViableIndexes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.indexes.is_empty() {
            return write!(f, "no viable indexes found for expression");
        }
        write!(f, "no viable indexes found for expression: {}", serde_json::to_string(&self.indexes).map_err(|_| fmt::Error)?)
    }
}

impl std::error::Error for NoViableIndexes {}

/// Failures reported by the metadata, page and item collaborators.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("table not found: {0}")]
    TableNotFound(String),
    #[error("request throttled: {0}")]
    Throttled(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("store unavailable: {0}")]
    Unavailable(Box<dyn std::error::Error + Send + Sync + 'static>),
}

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("failed to serialize item: {0}")]
    Serialize(String),
    #[error("failed to deserialize item: {0}")]
    Deserialize(String),
    #[error("unsupported value: {0}")]
    UnsupportedValue(String),
}

impl From<serde_json::Error> for CodecError {
    fn from(e: serde_json::Error) -> Self {
        if e.is_data() || e.is_syntax() || e.is_eof() {
            CodecError::Deserialize(e.to_string())
        } else {
            CodecError::Serialize(e.to_string())
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    #[error("index {index} has no partition key")]
    MissingPartitionKey { index: String },
    #[error("index {index} declares more than one {role:?} key")]
    DuplicateKeyRole { index: String, role: KeyRole },
    #[error("duplicate index name: {0}")]
    DuplicateIndexName(String),
    #[error("index name is reserved: {0}")]
    ReservedIndexName(String),
}
