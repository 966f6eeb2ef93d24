//! JSON REST API for Coffer.
//!
//! Exposes axum [`Router`]s backed by any [`coffer_core::store::DocumentStore`].
//! Authentication happens upstream; the caller's identity arrives in request
//! headers (see [`scope`]).
//!
//! # Mounting
//!
//! ```rust,ignore
//! let state = coffer_api::AppState::new(store, config);
//! Router::new()
//!   .merge(coffer_api::collection_router::<_, Note>(state.clone(), "notes"))
//!   .merge(coffer_api::admin_router(state, vec!["notes".into()]))
//! ```

pub mod admin;
pub mod config;
pub mod error;
pub mod note;
pub mod records;
pub mod scope;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use coffer_core::{
  engine::EngineConfig, record::Record, scope::Scope, store::DocumentStore,
};

use crate::scope::{CallerScope, USER_HEADER};

pub use error::ApiError;

// ─── State ───────────────────────────────────────────────────────────────────

/// Shared by every router built from the same store.
pub struct AppState<S> {
  pub store:          Arc<S>,
  pub config:         Arc<EngineConfig>,
  /// Whether requests without an identity run unscoped. Off by default:
  /// they are refused with 403.
  pub allow_unscoped: bool,
}

impl<S> AppState<S> {
  pub fn new(store: Arc<S>, config: EngineConfig) -> Self {
    Self { store, config: Arc::new(config), allow_unscoped: false }
  }

  pub fn allow_unscoped(mut self, allow: bool) -> Self {
    self.allow_unscoped = allow;
    self
  }

  /// The scope a request may run under.
  pub fn authorize(&self, caller: CallerScope) -> Result<Scope, ApiError> {
    if caller.0.is_unscoped() && !self.allow_unscoped {
      return Err(ApiError::Forbidden(format!("missing {USER_HEADER} header")));
    }
    Ok(caller.0)
  }
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:          self.store.clone(),
      config:         self.config.clone(),
      allow_unscoped: self.allow_unscoped,
    }
  }
}

/// State for the handlers of one collection.
pub struct CollectionState<S> {
  pub app:        AppState<S>,
  pub collection: Arc<str>,
}

impl<S> Clone for CollectionState<S> {
  fn clone(&self) -> Self {
    Self { app: self.app.clone(), collection: self.collection.clone() }
  }
}

/// State for the administrative handlers.
pub struct AdminState<S> {
  pub app:         AppState<S>,
  pub collections: Arc<[String]>,
}

impl<S> Clone for AdminState<S> {
  fn clone(&self) -> Self {
    Self { app: self.app.clone(), collections: self.collections.clone() }
  }
}

// ─── Routers ─────────────────────────────────────────────────────────────────

/// CRUD routes for records of type `T` stored in `collection`, mounted at
/// `/{collection}`.
pub fn collection_router<S, T>(state: AppState<S>, collection: &str) -> Router<()>
where
  S: DocumentStore + 'static,
  T: Record,
{
  let state = CollectionState { app: state, collection: Arc::from(collection) };
  Router::new()
    .route(
      &format!("/{collection}"),
      get(records::list::<S, T>).post(records::create::<S, T>),
    )
    .route(
      &format!("/{collection}/{{id}}"),
      get(records::get_one::<S, T>)
        .put(records::replace::<S, T>)
        .patch(records::patch::<S, T>)
        .delete(records::delete::<S, T>),
    )
    .with_state(state)
}

/// `/admin/database`. `collections` are the ones created on `POST`.
pub fn admin_router<S>(state: AppState<S>, collections: Vec<String>) -> Router<()>
where
  S: DocumentStore + 'static,
{
  let state = AdminState { app: state, collections: collections.into() };
  Router::new()
    .route(
      "/admin/database",
      post(admin::create_database::<S>).delete(admin::drop_database::<S>),
    )
    .with_state(state)
}
