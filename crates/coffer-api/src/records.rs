//! Handlers for one record collection.
//!
//! | Method   | Path               | Notes |
//! |----------|--------------------|-------|
//! | `GET`    | `/{collection}`      | `?page_size&start`; any other param is an equality filter |
//! | `POST`   | `/{collection}`      | Body: record; returns 201 + stored record |
//! | `GET`    | `/{collection}/{id}` | 404 if missing or not visible |
//! | `PUT`    | `/{collection}/{id}` | Full replace |
//! | `PATCH`  | `/{collection}/{id}` | Writes only the non-empty fields of the body |
//! | `DELETE` | `/{collection}/{id}` | Returns `{"id": ...}` |

use std::collections::HashMap;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use coffer_core::{
  engine::Engine,
  filter::{Filter, Page, Search},
  record::Record,
  store::DocumentStore,
};
use serde_json::{Value, json};

use crate::{CollectionState, error::ApiError, scope::CallerScope};

/// Page size used when the query does not name one.
pub const DEFAULT_PAGE_SIZE: u64 = 20;

fn engine<S, T>(state: &CollectionState<S>, scope: CallerScope) -> Result<Engine<S, T>, ApiError>
where
  S: DocumentStore,
  T: Record,
{
  Ok(Engine::new(
    state.app.store.clone(),
    state.app.config.clone(),
    state.collection.as_ref(),
    state.app.authorize(scope)?,
  ))
}

// ─── List ─────────────────────────────────────────────────────────────────────

fn parse_count(params: &HashMap<String, String>, key: &str, default: u64) -> Result<u64, ApiError> {
  params
    .get(key)
    .map(|v| {
      v.parse()
        .map_err(|_| ApiError::BadRequest(format!("{key} must be a non-negative integer")))
    })
    .transpose()
    .map(|v| v.unwrap_or(default))
}

/// Dot-separated segments of `[A-Za-z0-9_]`.
fn is_field_name(field: &str) -> bool {
  field.split('.').all(|segment| {
    !segment.is_empty()
      && segment.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
  })
}

/// Build a [`Search`] from query parameters. Values that parse as JSON
/// scalars (`true`, `3`) are compared as such; anything else as a string.
pub fn search_from_params(params: &HashMap<String, String>) -> Result<Search, ApiError> {
  let mut search = Search::new(
    parse_count(params, "page_size", DEFAULT_PAGE_SIZE)?,
    parse_count(params, "start", 0)?,
  );

  let mut filters: Vec<_> = params
    .iter()
    .filter(|(k, _)| !matches!(k.as_str(), "page_size" | "start"))
    .collect();
  filters.sort();
  for (field, raw) in filters {
    if !is_field_name(field) {
      return Err(ApiError::BadRequest(format!("invalid filter field: {field:?}")));
    }
    let value = match serde_json::from_str::<Value>(raw) {
      Ok(v @ (Value::Bool(_) | Value::Number(_) | Value::Null)) => v,
      _ => Value::String(raw.clone()),
    };
    search = search.with(Filter::eq(field.as_str(), value));
  }
  Ok(search)
}

/// `GET /{collection}[?page_size=..][&start=..][&field=value...]`
pub async fn list<S, T>(
  State(state): State<CollectionState<S>>,
  scope: CallerScope,
  Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Page<T>>, ApiError>
where
  S: DocumentStore + 'static,
  T: Record,
{
  let search = search_from_params(&params)?;
  let page = engine::<S, T>(&state, scope)?.find_all(&search).await?;
  Ok(Json(page))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /{collection}` — returns 201 + the stored record.
pub async fn create<S, T>(
  State(state): State<CollectionState<S>>,
  scope: CallerScope,
  Json(mut record): Json<T>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore + 'static,
  T: Record,
{
  let stored = engine::<S, T>(&state, scope)?.insert(&mut record).await?;
  Ok((StatusCode::CREATED, Json(stored)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /{collection}/{id}`
pub async fn get_one<S, T>(
  State(state): State<CollectionState<S>>,
  scope: CallerScope,
  Path(id): Path<String>,
) -> Result<Json<T>, ApiError>
where
  S: DocumentStore + 'static,
  T: Record,
{
  let record = engine::<S, T>(&state, scope)?.find_one(&id).await?;
  Ok(Json(record))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /{collection}/{id}` — replaces the record.
pub async fn replace<S, T>(
  State(state): State<CollectionState<S>>,
  scope: CallerScope,
  Path(id): Path<String>,
  Json(record): Json<T>,
) -> Result<Json<T>, ApiError>
where
  S: DocumentStore + 'static,
  T: Record,
{
  let stored = engine::<S, T>(&state, scope)?.update(&id, record).await?;
  Ok(Json(stored))
}

/// `PATCH /{collection}/{id}` — writes the non-empty fields of the body.
pub async fn patch<S, T>(
  State(state): State<CollectionState<S>>,
  scope: CallerScope,
  Path(id): Path<String>,
  Json(record): Json<T>,
) -> Result<Json<T>, ApiError>
where
  S: DocumentStore + 'static,
  T: Record,
{
  let stored = engine::<S, T>(&state, scope)?.set(&id, &record).await?;
  Ok(Json(stored))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /{collection}/{id}`
pub async fn delete<S, T>(
  State(state): State<CollectionState<S>>,
  scope: CallerScope,
  Path(id): Path<String>,
) -> Result<Json<Value>, ApiError>
where
  S: DocumentStore + 'static,
  T: Record,
{
  let id = engine::<S, T>(&state, scope)?.drop_one(&id).await?;
  Ok(Json(json!({ "id": id.to_string() })))
}
