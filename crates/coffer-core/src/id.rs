//! Record identifiers.
//!
//! A [`RecordId`] is a random 128-bit value. Externally it is always a
//! 32-character hex string; anything else is rejected with
//! [`Error::InvalidIdentifier`] before a store is consulted.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Length of the external hex representation.
pub const HEX_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(Uuid);

impl RecordId {
  /// Generate a fresh identifier.
  pub fn new() -> Self { Self(Uuid::new_v4()) }

  /// Parse the external hex form.
  pub fn parse(s: &str) -> Result<Self> {
    if s.len() != HEX_LEN || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
      return Err(Error::InvalidIdentifier(s.to_owned()));
    }
    Uuid::try_parse(s)
      .map(Self)
      .map_err(|_| Error::InvalidIdentifier(s.to_owned()))
  }

  /// True if `s` would parse.
  pub fn is_valid(s: &str) -> bool { Self::parse(s).is_ok() }

  pub fn as_uuid(&self) -> Uuid { self.0 }
}

impl Default for RecordId {
  fn default() -> Self { Self::new() }
}

impl fmt::Display for RecordId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.simple())
  }
}

impl FromStr for RecordId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

impl TryFrom<String> for RecordId {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { Self::parse(&s) }
}

impl From<RecordId> for String {
  fn from(id: RecordId) -> Self { id.to_string() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn display_is_32_lowercase_hex() {
    let id = RecordId::new();
    let s = id.to_string();
    assert_eq!(s.len(), HEX_LEN);
    assert!(s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')));
    assert_eq!(RecordId::parse(&s).unwrap(), id);
  }

  #[test]
  fn uppercase_hex_is_accepted() {
    let id = RecordId::new();
    let upper = id.to_string().to_uppercase();
    assert_eq!(RecordId::parse(&upper).unwrap(), id);
  }

  #[test]
  fn malformed_ids_are_rejected() {
    for bad in [
      "",
      "not-an-id",
      "0123456789abcdef0123456789abcde",   // 31 chars
      "0123456789abcdef0123456789abcdef0", // 33 chars
      "0123456789abcdef0123456789abcdeg",
    ] {
      assert!(
        matches!(RecordId::parse(bad), Err(Error::InvalidIdentifier(ref s)) if s == bad),
        "{bad:?} should be rejected"
      );
    }
  }

  #[test]
  fn hyphenated_uuid_is_not_an_identifier() {
    let hyphenated = Uuid::new_v4().hyphenated().to_string();
    assert!(!RecordId::is_valid(&hyphenated));
  }

  #[test]
  fn serializes_as_hex_string() {
    let id = RecordId::new();
    let json = serde_json::to_value(id).unwrap();
    assert_eq!(json, serde_json::Value::String(id.to_string()));
    let back: RecordId = serde_json::from_value(json).unwrap();
    assert_eq!(back, id);
    assert!(serde_json::from_str::<RecordId>("\"zz\"").is_err());
  }
}
