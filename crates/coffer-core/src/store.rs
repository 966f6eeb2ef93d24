//! The `DocumentStore` and `Session` traits.
//!
//! The traits are implemented by storage backends (e.g.
//! `coffer-store-sqlite`). The engine opens one session per operation and
//! drops it on every exit path; sessions are never shared between calls.
//!
//! Documents are JSON objects. Collections are addressed by name and come
//! into existence on first use.

use std::future::Future;

use serde_json::{Map, Value};

use crate::filter::Filter;

/// A handle to one database that hands out independent sessions.
pub trait DocumentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;
  type Session: Session<Error = Self::Error>;

  /// Open a dedicated session. It is released when dropped.
  fn session(
    &self,
  ) -> impl Future<Output = Result<Self::Session, Self::Error>> + Send + '_;
}

/// A single connection to the store.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait Session: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Number of documents matching `filter`.
  fn count<'a>(
    &'a self,
    collection: &'a str,
    filter: &'a Filter,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Matching documents in insertion order, after skipping `skip` and
  /// returning at most `limit`.
  fn find<'a>(
    &'a self,
    collection: &'a str,
    filter: &'a Filter,
    skip: u64,
    limit: Option<u64>,
  ) -> impl Future<Output = Result<Vec<Value>, Self::Error>> + Send + 'a;

  fn insert<'a>(
    &'a self,
    collection: &'a str,
    doc: Value,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Replace the first matching document with `doc`, keeping the stored
  /// values of the `preserve` fields. Returns the number of documents
  /// matched.
  fn replace<'a>(
    &'a self,
    collection: &'a str,
    filter: &'a Filter,
    doc: Value,
    preserve: &'a [&'a str],
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Overwrite the given top-level fields of the first matching document.
  /// Returns the number of documents matched.
  fn set_fields<'a>(
    &'a self,
    collection: &'a str,
    filter: &'a Filter,
    fields: Map<String, Value>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Remove the first matching document. Returns the number removed.
  fn remove<'a>(
    &'a self,
    collection: &'a str,
    filter: &'a Filter,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  fn create_collection<'a>(
    &'a self,
    collection: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Declare that `field` is unique within `collection`. Idempotent.
  fn ensure_unique_index<'a>(
    &'a self,
    collection: &'a str,
    field: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Remove every collection in the database.
  fn drop_database(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
