//! Transaction Scope: a reentrant `BEGIN IMMEDIATE` / `COMMIT` / `ROLLBACK`
//! wrapper around every write entry point.
//!
//! Single-level, not savepoint-based: a write method called from inside a
//! closure that's already running inside [`run`] executes directly, with no
//! inner `BEGIN`. Only the outermost scope commits or rolls back, so a
//! failure anywhere in a nested call unwinds to one `ROLLBACK` at the top.

use rusqlite::Connection;

use crate::error::Result;

/// Runs `f` inside a reserved-lock transaction, committing on success and
/// rolling back on failure. If `conn` is already inside a transaction (not
/// in autocommit mode), `f` runs directly with no new `BEGIN`/`COMMIT`.
pub(crate) fn run<T>(conn: &Connection, f: impl FnOnce() -> Result<T>) -> Result<T> {
    if !conn.is_autocommit() {
        return f();
    }

    conn.execute_batch("BEGIN IMMEDIATE")?;
    tracing::trace!("began transaction");
    match f() {
        Ok(value) => {
            conn.execute_batch("COMMIT")?;
            tracing::trace!("committed transaction");
            Ok(value)
        }
        Err(err) => {
            // Best-effort: if ROLLBACK itself fails the connection is in
            // worse shape than this error describes, but the original error
            // is still the more useful one to surface.
            let _ = conn.execute_batch("ROLLBACK");
            tracing::trace!("rolled back transaction");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlumeError;

    fn open() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn commits_on_success() {
        let conn = open();
        conn.execute_batch("CREATE TABLE t (id INTEGER)").unwrap();
        run(&conn, || {
            conn.execute("INSERT INTO t (id) VALUES (1)", [])?;
            Ok(())
        })
        .unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn rolls_back_on_failure() {
        let conn = open();
        conn.execute_batch("CREATE TABLE t (id INTEGER)").unwrap();
        let result = run(&conn, || {
            conn.execute("INSERT INTO t (id) VALUES (1)", [])?;
            Err(PlumeError::CollectionNotFound("boom".to_string()))
        });
        assert!(result.is_err());
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn reentrant_nested_call_has_no_inner_begin() {
        let conn = open();
        conn.execute_batch("CREATE TABLE t (id INTEGER)").unwrap();
        run(&conn, || {
            assert!(!conn.is_autocommit());
            run(&conn, || {
                conn.execute("INSERT INTO t (id) VALUES (1)", [])?;
                Ok(())
            })
        })
        .unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 1);
    }
}
