use std::fmt;

use plume_query::QueryError;

/// Hand-rolled error type, matching the rest of the storage stack rather
/// than deriving via `thiserror`.
#[derive(Debug)]
pub enum PlumeError {
    /// A predicate or projection could not be parsed or constructed.
    Query(QueryError),
    /// Any failure surfaced by the backing SQLite engine: constraint
    /// violation, I/O, schema conflict. Propagated unchanged.
    Storage(rusqlite::Error),
    /// A document or catalog row failed to encode/decode as JSON.
    Encoding(serde_json::Error),
    /// `find`/`find_one`/`replace_one` addressed a collection that has
    /// never been registered (no table, no catalog row).
    CollectionNotFound(String),
}

impl fmt::Display for PlumeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlumeError::Query(e) => write!(f, "{e}"),
            PlumeError::Storage(e) => write!(f, "storage error: {e}"),
            PlumeError::Encoding(e) => write!(f, "encoding error: {e}"),
            PlumeError::CollectionNotFound(name) => write!(f, "collection not found: {name}"),
        }
    }
}

impl std::error::Error for PlumeError {}

impl From<QueryError> for PlumeError {
    fn from(e: QueryError) -> Self {
        PlumeError::Query(e)
    }
}

impl From<rusqlite::Error> for PlumeError {
    fn from(e: rusqlite::Error) -> Self {
        PlumeError::Storage(e)
    }
}

impl From<serde_json::Error> for PlumeError {
    fn from(e: serde_json::Error) -> Self {
        PlumeError::Encoding(e)
    }
}

pub type Result<T> = std::result::Result<T, PlumeError>;
