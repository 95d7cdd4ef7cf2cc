//! Opens the backing SQLite file, bootstraps `plume_master`, and hands out
//! [`Collection`] handles.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

use rusqlite::Connection;

use crate::catalog;
use crate::collection::Collection;
use crate::error::Result;
use crate::index::IndexCatalog;
use crate::options::Options;
use crate::transaction;

/// A schemaless document store backed by a single SQLite file.
///
/// Holds one `rusqlite::Connection` for the lifetime of the database, per
/// the single-connection, single-thread concurrency model: nothing here
/// supports sharing a `Database` across threads.
pub struct Database {
    conn: Connection,
    /// Cache of each registered collection's persisted index state, keyed by
    /// collection name. Populated at `open` from `plume_master` and kept in
    /// sync by every write path. `RefCell` rather than `&mut self` because
    /// `Collection` handles borrow `&Database` and are meant to be cheap to
    /// obtain repeatedly (`db.collection("x")` inside a loop is normal).
    registry: RefCell<HashMap<String, IndexCatalog>>,
}

impl Database {
    /// Opens (or creates) the database file at `path`, bootstraps the
    /// `plume_master` catalog table, and loads every already-registered
    /// collection's index state.
    pub fn open(path: impl AsRef<Path>, options: Options) -> Result<Self> {
        let conn = Connection::open(path)?;
        options.apply(&conn)?;
        transaction::run(&conn, || {
            catalog::bootstrap(&conn)?;
            Ok(())
        })?;

        let mut registry = HashMap::new();
        for name in catalog::list_collections(&conn)? {
            let loaded = catalog::load(&conn, &name)?.unwrap_or_default();
            registry.insert(name, loaded);
        }
        tracing::debug!(collections = registry.len(), "opened database");

        Ok(Database {
            conn,
            registry: RefCell::new(registry),
        })
    }

    /// Opens an in-memory database, primarily for tests.
    pub fn open_in_memory(options: Options) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        options.apply(&conn)?;
        catalog::bootstrap(&conn)?;
        Ok(Database {
            conn,
            registry: RefCell::new(HashMap::new()),
        })
    }

    /// Returns a handle to `name`, lazily — the collection's table and
    /// catalog row are not created until the first write or `create_index`.
    pub fn collection(&self, name: &str) -> Collection<'_> {
        Collection::new(self, name.to_string())
    }

    /// Every collection name currently registered.
    pub fn collection_names(&self) -> Vec<String> {
        self.registry.borrow().keys().cloned().collect()
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn registered_catalog(&self, name: &str) -> Option<IndexCatalog> {
        self.registry.borrow().get(name).cloned()
    }

    pub(crate) fn cache_catalog(&self, name: &str, catalog: IndexCatalog) {
        self.registry.borrow_mut().insert(name.to_string(), catalog);
    }

    /// Runs `f` inside the Transaction Scope (§4.7): `BEGIN IMMEDIATE` on
    /// entry, `COMMIT` on success, `ROLLBACK` on failure, reentrant across
    /// nested calls.
    pub(crate) fn transaction<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        transaction::run(&self.conn, f)
    }
}
