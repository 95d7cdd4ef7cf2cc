//! The `plume_master` system table: one row per user collection, recording
//! its serialized [`IndexCatalog`].

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::index::IndexCatalog;

pub(crate) fn bootstrap(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS plume_master (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            collection_name TEXT UNIQUE NOT NULL,
            indexes TEXT DEFAULT '{}'
        );",
    )?;
    Ok(())
}

/// Every collection name known to the catalog, in row order.
pub(crate) fn list_collections(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT collection_name FROM plume_master ORDER BY id")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    let mut names = Vec::new();
    for row in rows {
        names.push(row?);
    }
    Ok(names)
}

/// Loads a collection's persisted index catalog, if it has been registered.
pub(crate) fn load(conn: &Connection, collection: &str) -> Result<Option<IndexCatalog>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT indexes FROM plume_master WHERE collection_name = ?1",
            params![collection],
            |row| row.get(0),
        )
        .optional()?;
    match raw {
        Some(text) => Ok(Some(serde_json::from_str(&text)?)),
        None => Ok(None),
    }
}

/// Inserts the initial catalog row for a newly registered collection.
pub(crate) fn insert(conn: &Connection, collection: &str, catalog: &IndexCatalog) -> Result<()> {
    let encoded = serde_json::to_string(catalog)?;
    conn.execute(
        "INSERT INTO plume_master (collection_name, indexes) VALUES (?1, ?2)",
        params![collection, encoded],
    )?;
    Ok(())
}

/// Persists an updated catalog row for an already-registered collection.
pub(crate) fn update(conn: &Connection, collection: &str, catalog: &IndexCatalog) -> Result<()> {
    let encoded = serde_json::to_string(catalog)?;
    conn.execute(
        "UPDATE plume_master SET indexes = ?2 WHERE collection_name = ?1",
        params![collection, encoded],
    )?;
    Ok(())
}
