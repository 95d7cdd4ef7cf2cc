use std::fmt;

/// Errors raised while parsing a predicate mapping or constructing a
/// projection. Hand-rolled rather than derived, matching the rest of the
/// storage stack.
#[derive(Debug)]
pub enum QueryError {
    /// The predicate mapping could not be parsed: an unrecognized
    /// `$`-operator at the top level, or a malformed shape (e.g. `$and`
    /// given a non-array value).
    BadQuery(String),
    /// A projection mixed inclusion (`1`) and exclusion (`0`) entries.
    BadProjection(String),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::BadQuery(msg) => write!(f, "bad query: {msg}"),
            QueryError::BadProjection(msg) => write!(f, "bad projection: {msg}"),
        }
    }
}

impl std::error::Error for QueryError {}
