//! Administrative handlers. Both refuse with 403 unless the engine runs in
//! debug mode.
//!
//! | Method   | Path              | Notes |
//! |----------|-------------------|-------|
//! | `POST`   | `/admin/database` | Creates every mounted collection and its identifier index |
//! | `DELETE` | `/admin/database` | Removes every collection |

use axum::{extract::State, http::StatusCode};
use coffer_core::{engine::Engine, record::RecordMeta, store::DocumentStore};

use crate::{AdminState, error::ApiError, scope::CallerScope};

/// `POST /admin/database`
pub async fn create_database<S>(
  State(state): State<AdminState<S>>,
  scope: CallerScope,
) -> Result<StatusCode, ApiError>
where
  S: DocumentStore + 'static,
{
  let scope = state.app.authorize(scope)?;
  for collection in state.collections.iter() {
    Engine::<S, RecordMeta>::new(
      state.app.store.clone(),
      state.app.config.clone(),
      collection.as_str(),
      scope.clone(),
    )
    .create_database()
    .await?;
  }
  Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /admin/database`
pub async fn drop_database<S>(
  State(state): State<AdminState<S>>,
  scope: CallerScope,
) -> Result<StatusCode, ApiError>
where
  S: DocumentStore + 'static,
{
  Engine::<S, RecordMeta>::new(
    state.app.store.clone(),
    state.app.config.clone(),
    "",
    state.app.authorize(scope)?,
  )
  .drop_database()
  .await?;
  Ok(StatusCode::NO_CONTENT)
}
