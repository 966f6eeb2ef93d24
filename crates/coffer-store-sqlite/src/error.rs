//! Error type for `coffer-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// Collection names become table names and must match `[A-Za-z0-9_]+`.
  #[error("invalid collection name: {0:?}")]
  InvalidCollection(String),

  /// Field names must match `[A-Za-z0-9_]+`, optionally joined by dots.
  #[error("invalid field name: {0:?}")]
  InvalidField(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
