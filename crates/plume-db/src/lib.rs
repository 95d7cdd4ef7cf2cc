//! `plume-db`: a schemaless document store layered over SQLite.
//!
//! A [`Database`] owns one [`rusqlite::Connection`] and hands out
//! [`Collection`] handles by name. Collections are created lazily on first
//! write or [`Collection::create_index`] call. Reads and writes are planned
//! and compiled by the query layer in [`plume_query`], and every write runs
//! inside the reentrant Transaction Scope in [`transaction`].

mod catalog;
mod codec;
mod collection;
mod database;
mod error;
mod index;
mod options;
mod planner;
mod result;
mod sqlval;
mod transaction;

pub use collection::Collection;
pub use database::Database;
pub use error::{PlumeError, Result};
pub use index::{Direction, IndexCatalog, IndexDefinition, IndexKey, IntoIndexKeys, SqlType};
pub use options::Options;
pub use result::{InsertResult, ReplaceResult};

pub use plume_query::{get, pop, set, Document, Value};
