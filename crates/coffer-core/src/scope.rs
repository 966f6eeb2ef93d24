//! The caller context every engine operation runs under.
//!
//! Identities arrive already authenticated. A scope without a user is the
//! administrative mode used by system and debug paths: no rights filter is
//! applied to anything it does.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub login: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
  pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
  pub user:  Option<User>,
  pub group: Option<Group>,
}

impl Scope {
  pub fn unscoped() -> Self { Self::default() }

  pub fn user(login: impl Into<String>) -> Self {
    Self {
      user:  Some(User { login: login.into() }),
      group: None,
    }
  }

  pub fn with_group(mut self, id: impl Into<String>) -> Self {
    self.group = Some(Group { id: id.into() });
    self
  }

  pub fn is_unscoped(&self) -> bool { self.user.is_none() }

  pub fn login(&self) -> Option<&str> { self.user.as_ref().map(|u| u.login.as_str()) }

  pub fn group_id(&self) -> Option<&str> {
    self.group.as_ref().map(|g| g.id.as_str())
  }
}
