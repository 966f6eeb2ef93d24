//! Error types for `coffer-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid identifier: {0:?}")]
  InvalidIdentifier(String),

  /// Covers both a missing record and one the caller may not see.
  #[error("not found")]
  NotFound,

  #[error("not permitted outside debug mode")]
  NotPermitted,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
