//! Collection: coordinates inserts, reads, and index materialization for one
//! named table in the backing database.

use std::collections::HashSet;

use rusqlite::types::Value as SqlValue;
use rusqlite::Connection;

use plume_query::{parse_query, quote_ident, Document, Projection, Value};

use crate::catalog;
use crate::codec;
use crate::database::Database;
use crate::error::{PlumeError, Result};
use crate::index::{IndexCatalog, IndexDefinition, IndexKey, IntoIndexKeys};
use crate::planner;
use crate::result::{InsertResult, ReplaceResult};
use crate::sqlval;

/// A lazy handle onto one named collection. Cheap to construct —
/// `Database::collection` can be called repeatedly without registering
/// anything; the backing table and catalog row are only materialized on the
/// first write or `create_index` (registration, §3/§4.5).
pub struct Collection<'db> {
    db: &'db Database,
    name: String,
}

impl<'db> Collection<'db> {
    pub(crate) fn new(db: &'db Database, name: String) -> Self {
        Collection { db, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ── Index management ────────────────────────────────────────

    /// Creates an index over `keys` (a single bare [`IndexKey`] or an
    /// ordered list for a compound index). Registers the collection first if
    /// needed. A no-op, on disk and in memory, if an existing index already
    /// covers the identical ordered key list.
    pub fn create_index<K: IntoIndexKeys>(&self, keys: K, name: Option<String>) -> Result<()> {
        let keys = keys.into_index_keys();
        // `cache_catalog` only ever runs after this closure returns `Ok` —
        // never from inside it — so a failure anywhere in the transaction
        // (including the final `COMMIT` itself) can't leave the in-memory
        // registry ahead of what was actually persisted (§4.7).
        let pending = self.db.transaction(|| {
            let conn = self.db.connection();
            let (mut catalog, is_new) = self.ensure_registered(conn)?;

            if catalog.has_equivalent_index(&keys) {
                tracing::debug!(collection = %self.name, "create_index: equivalent index exists, no-op");
                return Ok(if is_new { Some(catalog) } else { None });
            }

            let new_keys: Vec<&IndexKey> = keys
                .iter()
                .filter(|k| !catalog.indexed_fields.contains(&k.field))
                .collect();

            for key in &new_keys {
                conn.execute_batch(&format!(
                    "ALTER TABLE {} ADD COLUMN {} {}",
                    self.name,
                    quote_ident(&key.field),
                    key.sql_type.as_sql()
                ))?;
            }

            if !new_keys.is_empty() {
                self.backfill(conn, &new_keys)?;
            }

            let index_name = name.unwrap_or_else(|| IndexDefinition::default_name(&self.name, &keys));
            let columns = keys
                .iter()
                .map(|k| format!("{} {}", quote_ident(&k.field), k.direction.as_str()))
                .collect::<Vec<_>>()
                .join(", ");
            conn.execute_batch(&format!(
                "CREATE INDEX IF NOT EXISTS {} ON {}({})",
                quote_ident(&index_name),
                self.name,
                columns
            ))?;

            catalog.add_index(IndexDefinition {
                keys,
                name: index_name,
            });
            catalog::update(conn, &self.name, &catalog)?;
            Ok(Some(catalog))
        })?;

        if let Some(catalog) = pending {
            self.db.cache_catalog(&self.name, catalog);
            tracing::info!(collection = %self.name, "created index");
        }
        Ok(())
    }

    /// Streams every existing row and writes the get-at-path value of each
    /// newly-indexed field into its shadow column (null if the path is
    /// absent), per the back-fill step of §4.4.
    fn backfill(&self, conn: &Connection, new_fields: &[&IndexKey]) -> Result<()> {
        let rows: Vec<(i64, Value)> = {
            let mut stmt = conn.prepare(&format!("SELECT id, _data FROM {}", self.name))?;
            let mut cursor = stmt.query([])?;
            let mut collected = Vec::new();
            while let Some(row) = cursor.next()? {
                let id: i64 = row.get(0)?;
                let text: String = row.get(1)?;
                collected.push((id, codec::decode(&text)?));
            }
            collected
        };

        if rows.is_empty() {
            return Ok(());
        }

        let set_clause = new_fields
            .iter()
            .map(|k| format!("{} = ?", quote_ident(&k.field)))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("UPDATE {} SET {} WHERE id = ?", self.name, set_clause);

        for (id, doc) in &rows {
            let mut params: Vec<SqlValue> = new_fields
                .iter()
                .map(|k| sqlval::to_sql_value(&plume_query::get(doc, &k.field)))
                .collect();
            params.push(SqlValue::Integer(*id));
            conn.execute(&sql, rusqlite::params_from_iter(params.iter()))?;
        }
        tracing::debug!(collection = %self.name, rows = rows.len(), "backfilled shadow columns");
        Ok(())
    }

    // ── Writes ───────────────────────────────────────────────────

    /// Inserts one document, materializing every currently-indexed field's
    /// shadow column. Registers the collection first if needed.
    pub fn insert_one(&self, doc: Value) -> Result<InsertResult> {
        let (id, pending) = self.db.transaction(|| {
            let conn = self.db.connection();
            let (catalog, is_new) = self.ensure_registered(conn)?;
            let id = self.insert_row(conn, &catalog, &doc)?;
            Ok((id, if is_new { Some(catalog) } else { None }))
        })?;
        if let Some(catalog) = pending {
            self.db.cache_catalog(&self.name, catalog);
        }
        Ok(InsertResult { id })
    }

    /// Inserts every document in `docs` as a single transaction.
    pub fn insert_many(&self, docs: Vec<Value>) -> Result<Vec<InsertResult>> {
        let (results, pending) = self.db.transaction(|| {
            let conn = self.db.connection();
            let (catalog, is_new) = self.ensure_registered(conn)?;
            let mut results = Vec::with_capacity(docs.len());
            for doc in &docs {
                results.push(InsertResult {
                    id: self.insert_row(conn, &catalog, doc)?,
                });
            }
            Ok((results, if is_new { Some(catalog) } else { None }))
        })?;
        if let Some(catalog) = pending {
            self.db.cache_catalog(&self.name, catalog);
        }
        Ok(results)
    }

    fn insert_row(&self, conn: &Connection, catalog: &IndexCatalog, doc: &Value) -> Result<i64> {
        let data = codec::encode(doc)?;
        let mut columns = vec!["_data".to_string()];
        let mut placeholders = vec!["?1".to_string()];
        let mut values = vec![SqlValue::Text(data)];

        for (i, field) in catalog.indexed_fields.iter().enumerate() {
            columns.push(quote_ident(field));
            placeholders.push(format!("?{}", i + 2));
            values.push(sqlval::to_sql_value(&plume_query::get(doc, field)));
        }

        let sql = format!(
            "INSERT INTO {}({}) VALUES ({})",
            self.name,
            columns.join(", "),
            placeholders.join(", ")
        );
        conn.execute(&sql, rusqlite::params_from_iter(values.iter()))?;
        Ok(conn.last_insert_rowid())
    }

    fn update_row(&self, conn: &Connection, catalog: &IndexCatalog, id: i64, doc: &Value) -> Result<()> {
        let data = codec::encode(doc)?;
        let mut sets = vec!["_data = ?1".to_string()];
        let mut values = vec![SqlValue::Text(data)];

        for (i, field) in catalog.indexed_fields.iter().enumerate() {
            sets.push(format!("{} = ?{}", quote_ident(field), i + 2));
            values.push(sqlval::to_sql_value(&plume_query::get(doc, field)));
        }
        values.push(SqlValue::Integer(id));
        let id_placeholder = values.len();

        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            self.name,
            sets.join(", "),
            id_placeholder
        );
        conn.execute(&sql, rusqlite::params_from_iter(values.iter()))?;
        Ok(())
    }

    /// Replaces the first document matching `query` with `replacement`. If
    /// no row matches and `upsert` is true, inserts `replacement` instead.
    pub fn replace_one(&self, query: &Document, replacement: Value, upsert: bool) -> Result<ReplaceResult> {
        let (result, pending) = self.db.transaction(|| {
            let conn = self.db.connection();
            let (catalog, is_new) = self.ensure_registered(conn)?;
            let found = self.find_first_matching(conn, &catalog, query)?;

            let result = match found {
                Some((id, _)) => {
                    self.update_row(conn, &catalog, id, &replacement)?;
                    ReplaceResult {
                        matched: true,
                        upserted_id: None,
                    }
                }
                None if upsert => {
                    let id = self.insert_row(conn, &catalog, &replacement)?;
                    ReplaceResult {
                        matched: false,
                        upserted_id: Some(id),
                    }
                }
                None => ReplaceResult {
                    matched: false,
                    upserted_id: None,
                },
            };

            Ok((result, if is_new { Some(catalog) } else { None }))
        })?;

        if let Some(catalog) = pending {
            self.db.cache_catalog(&self.name, catalog);
        }
        Ok(result)
    }

    /// Finds the first row whose document satisfies `query`, returning its
    /// row id alongside the decoded document. Always selects `(id, _data)`
    /// rather than using the index-only plan, since the caller needs the id
    /// to update in place.
    fn find_first_matching(
        &self,
        conn: &Connection,
        catalog: &IndexCatalog,
        query: &Document,
    ) -> Result<Option<(i64, Value)>> {
        let mut predicate = parse_query(query)?;
        let indexed: HashSet<String> = catalog.indexed_fields.iter().cloned().collect();
        let where_fragment = predicate.push_down(&indexed);
        let residual_empty = planner::residual_is_empty(&predicate);

        let mut sql = format!("SELECT id, _data FROM {}", self.name);
        if let Some(frag) = &where_fragment {
            sql.push_str(" WHERE ");
            sql.push_str(frag);
        }

        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let id: i64 = row.get(0)?;
            let text: String = row.get(1)?;
            let doc = codec::decode(&text)?;
            if residual_empty || predicate.matches(&doc) {
                return Ok(Some((id, doc)));
            }
        }
        Ok(None)
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Runs `query`/`projection`/`limit` through the Query Planner and
    /// returns every matching document.
    ///
    /// Fails with [`PlumeError::CollectionNotFound`] if this collection has
    /// never been written to or indexed — there is no table to query.
    pub fn find(
        &self,
        query: &Document,
        projection: Option<&Document>,
        limit: Option<usize>,
    ) -> Result<Vec<Value>> {
        let catalog = self.require_registered()?;
        let predicate = parse_query(query)?;
        let projection = match projection {
            Some(p) => Projection::parse(p)?,
            None => Projection::None,
        };
        let indexed: HashSet<String> = catalog.indexed_fields.iter().cloned().collect();

        let compiled = planner::compile(&self.name, &indexed, predicate, &projection, limit);
        planner::execute(self.db.connection(), &compiled, &projection, limit)
    }

    /// `find` with an implicit `limit(1)`, returning the first match (or
    /// `None`).
    pub fn find_one(&self, query: &Document, projection: Option<&Document>) -> Result<Option<Value>> {
        let mut results = self.find(query, projection, Some(1))?;
        Ok(if results.is_empty() {
            None
        } else {
            Some(results.remove(0))
        })
    }

    // ── Registration ─────────────────────────────────────────────

    /// Ensures this collection's table and catalog row exist, creating them
    /// on first reference. Must be called from inside the Transaction Scope
    /// (every write entry point already is).
    ///
    /// Returns `(catalog, true)` when a fresh table + catalog row was just
    /// created inside the current transaction — the caller must cache that
    /// catalog itself, and only once the enclosing transaction has actually
    /// committed, so a later failure in the same transaction can't leave the
    /// in-memory registry ahead of what was persisted.
    fn ensure_registered(&self, conn: &Connection) -> Result<(IndexCatalog, bool)> {
        if let Some(catalog) = self.db.registered_catalog(&self.name) {
            return Ok((catalog, false));
        }

        conn.execute_batch(&format!(
            "CREATE TABLE {}(id INTEGER PRIMARY KEY AUTOINCREMENT, _data BLOB NOT NULL)",
            self.name
        ))?;
        let catalog = IndexCatalog::default();
        catalog::insert(conn, &self.name, &catalog)?;
        tracing::info!(collection = %self.name, "registered collection");
        Ok((catalog, true))
    }

    /// Read-path equivalent of `ensure_registered`: never creates anything,
    /// fails if the collection has no catalog row yet.
    fn require_registered(&self) -> Result<IndexCatalog> {
        self.db
            .registered_catalog(&self.name)
            .ok_or_else(|| PlumeError::CollectionNotFound(self.name.clone()))
    }
}
