//! Caller scope extractor.
//!
//! Authentication happens upstream. A gateway that has verified the caller
//! forwards the identity in `x-user-login` and, optionally, `x-group-id`.
//! The gateway must overwrite or strip both headers on every request it
//! forwards; a client that can set them can act as any user.
//!
//! Requests without a login carry an unscoped [`Scope`]. Handlers refuse
//! them unless [`crate::AppState::allow_unscoped`] was enabled, in which
//! case they run with administrative, unfiltered access.

use axum::{extract::FromRequestParts, http::request::Parts};
use coffer_core::scope::Scope;

use crate::error::ApiError;

pub const USER_HEADER: &str = "x-user-login";
pub const GROUP_HEADER: &str = "x-group-id";

/// The [`Scope`] a request runs under.
#[derive(Debug, Clone)]
pub struct CallerScope(pub Scope);

fn header(parts: &Parts, name: &str) -> Result<Option<String>, ApiError> {
  let Some(value) = parts.headers.get(name) else {
    return Ok(None);
  };
  let value = value
    .to_str()
    .map_err(|_| ApiError::BadRequest(format!("{name} is not valid ASCII")))?
    .trim();
  Ok((!value.is_empty()).then(|| value.to_owned()))
}

impl<St> FromRequestParts<St> for CallerScope
where
  St: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &St,
  ) -> Result<Self, Self::Rejection> {
    let scope = match header(parts, USER_HEADER)? {
      None => Scope::unscoped(),
      Some(login) => {
        let scope = Scope::user(login);
        match header(parts, GROUP_HEADER)? {
          Some(group) => scope.with_group(group),
          None => scope,
        }
      }
    };
    Ok(CallerScope(scope))
  }
}
