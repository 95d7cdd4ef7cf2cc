//! Connection-level pragma configuration applied once at [`crate::Database::open`].
//!
//! Mirrors `derive-sqlite`'s `dbutil::set_optimal_journal_mode` bootstrap block:
//! these are knobs for how SQLite manages its journal and lock contention, not
//! document-model behavior, so they live in their own small struct rather than
//! leaking into `Database`'s API.

use std::time::Duration;

use rusqlite::Connection;

use crate::error::Result;

/// Pragma configuration for a newly opened [`crate::Database`].
#[derive(Debug, Clone)]
pub struct Options {
    /// `PRAGMA journal_mode`. `"WAL"` by default, matching the write-ahead
    /// log preference `derive-sqlite` falls back to when the SQLite build
    /// doesn't support batch atomic writes.
    pub journal_mode: String,
    /// `PRAGMA busy_timeout`, in milliseconds. How long a write waits on the
    /// reserved lock before giving up, rather than failing immediately.
    pub busy_timeout_ms: u32,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            journal_mode: "WAL".to_string(),
            busy_timeout_ms: 5_000,
        }
    }
}

impl Options {
    pub(crate) fn apply(&self, conn: &Connection) -> Result<()> {
        conn.busy_timeout(Duration::from_millis(self.busy_timeout_ms as u64))?;
        // rusqlite wants query_row for this pragma rather than execute.
        conn.query_row(&format!("PRAGMA journal_mode={}", self.journal_mode), [], |_row| {
            Ok(())
        })?;
        tracing::debug!(
            journal_mode = %self.journal_mode,
            busy_timeout_ms = self.busy_timeout_ms,
            "applied database pragmas"
        );
        Ok(())
    }
}
