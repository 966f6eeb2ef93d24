//! SQLite backend for the Coffer record store.
//!
//! Each collection is a table of JSON documents. Wraps [`tokio_rusqlite`] so
//! all database access runs on a dedicated thread without blocking the async
//! runtime, and opens a fresh connection for every session.

mod query;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{SqliteSession, SqliteStore};
