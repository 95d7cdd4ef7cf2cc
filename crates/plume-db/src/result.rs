//! Small result payloads, matching `slate-db`'s `result.rs` shape (plain
//! structs rather than bare tuples, so call sites read `result.id` instead
//! of `result.0`).

/// Returned by [`crate::Collection::insert_one`]: the new row's auto-assigned
/// `id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertResult {
    pub id: i64,
}

/// Returned by [`crate::Collection::replace_one`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaceResult {
    /// Whether an existing row was found and updated in place.
    pub matched: bool,
    /// The `id` of the row that was inserted to satisfy `upsert`, if any.
    pub upserted_id: Option<i64>,
}
