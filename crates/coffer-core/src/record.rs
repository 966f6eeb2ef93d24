//! The record model: the common attributes every record embeds and the
//! contract the engine drives records through.
//!
//! A concrete record type is any serde struct that flattens a [`RecordMeta`]
//! into itself and exposes it through [`Record::meta`] and
//! [`Record::meta_mut`]. Everything else the engine needs has a provided
//! implementation:
//!
//! ```rust,ignore
//! #[derive(Debug, Clone, Default, Serialize, Deserialize)]
//! pub struct Note {
//!   #[serde(flatten)]
//!   pub meta:  RecordMeta,
//!   pub title: String,
//! }
//!
//! impl Record for Note {
//!   fn meta(&self) -> &RecordMeta { &self.meta }
//!   fn meta_mut(&mut self) -> &mut RecordMeta { &mut self.meta }
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::{id::RecordId, rights::Rights, Result};

/// Document field names of the common attributes.
pub mod fields {
  pub const GROUP_PATH: &str = "group_path";
  pub const OWNER_LOGIN: &str = "owner_login";
  pub const RIGHTS: &str = "rights";
  pub const EXTRA: &str = "extra";
  pub const RECORD_ID: &str = "record_id";
  pub const CREATED_AT: &str = "created_at";

  /// Stamped by the engine at insertion; updates never overwrite them.
  pub const MANAGED: [&str; 4] = [RECORD_ID, CREATED_AT, OWNER_LOGIN, GROUP_PATH];
}

/// Terminates each entry of a group path.
pub const GROUP_SEPARATOR: char = ',';

// ─── Common attributes ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordMeta {
  /// Accumulated chain of owning groups, e.g. `"G0,G1,"`.
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub group_path:  String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub owner_login: String,
  #[serde(default)]
  pub rights:      Rights,
  /// Free-form payload; never interpreted.
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub extra:       String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub record_id:   Option<RecordId>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub created_at:  Option<DateTime<Utc>>,
}

// ─── Contract ────────────────────────────────────────────────────────────────

/// Behaviour the engine requires from every record type.
///
/// Mutators take `&mut self`: whatever the engine stamps during insertion is
/// exactly what gets persisted and handed back.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
  fn meta(&self) -> &RecordMeta;

  fn meta_mut(&mut self) -> &mut RecordMeta;

  /// Set a fresh identifier. Unguarded; the engine calls it once per insert.
  fn assign_identity(&mut self) { self.meta_mut().record_id = Some(RecordId::new()); }

  fn set_owner_login(&mut self, login: &str) {
    self.meta_mut().owner_login = login.to_owned();
  }

  /// Append `group_id` and a separator to the group path.
  fn set_group_path(&mut self, group_id: &str) {
    let path = &mut self.meta_mut().group_path;
    path.push_str(group_id);
    path.push(GROUP_SEPARATOR);
  }

  fn set_rights(&mut self, rights: Rights) { self.meta_mut().rights = rights; }

  fn rights(&self) -> Rights { self.meta().rights }

  /// Stamp the current time as the creation time, unless one is already set.
  fn set_created_at(&mut self) {
    let meta = self.meta_mut();
    if meta.created_at.is_none() {
      meta.created_at = Some(Utc::now());
    }
  }

  /// An owned snapshot of the fully typed value.
  fn value(&self) -> Self { self.clone() }

  fn record_id(&self) -> Option<RecordId> { self.meta().record_id }

  fn created_at(&self) -> Option<DateTime<Utc>> { self.meta().created_at }
}

/// A record with nothing but the common attributes.
impl Record for RecordMeta {
  fn meta(&self) -> &RecordMeta { self }

  fn meta_mut(&mut self) -> &mut RecordMeta { self }
}

// ─── Documents ───────────────────────────────────────────────────────────────

/// Serialise a record into a store document.
pub fn to_document<T: Record>(record: &T) -> Result<Value> {
  Ok(serde_json::to_value(record)?)
}

/// Materialise a record from a store document.
pub fn from_document<T: Record>(doc: Value) -> Result<T> {
  Ok(serde_json::from_value(doc)?)
}

/// The fields of `record` a partial update should write: every top-level
/// attribute holding a non-empty value, minus the engine-managed ones.
pub fn explicit_fields<T: Record>(record: &T) -> Result<Map<String, Value>> {
  let Value::Object(map) = to_document(record)? else {
    return Ok(Map::new());
  };
  Ok(
    map
      .into_iter()
      .filter(|(k, v)| !fields::MANAGED.contains(&k.as_str()) && !is_empty_value(v))
      .collect(),
  )
}

/// Zero values: null, `""`, `0`, `false`, `[]` and `{}`.
pub fn is_empty_value(v: &Value) -> bool {
  match v {
    Value::Null => true,
    Value::Bool(b) => !b,
    Value::Number(n) => n.as_f64() == Some(0.0),
    Value::String(s) => s.is_empty(),
    Value::Array(a) => a.is_empty(),
    Value::Object(o) => o.is_empty(),
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[derive(Debug, Clone, Default, Serialize, Deserialize)]
  struct Task {
    #[serde(flatten)]
    meta:  RecordMeta,
    title: String,
    done:  bool,
    #[serde(default)]
    tags:  Vec<String>,
  }

  impl Record for Task {
    fn meta(&self) -> &RecordMeta { &self.meta }

    fn meta_mut(&mut self) -> &mut RecordMeta { &mut self.meta }
  }

  #[test]
  fn mutators_act_in_place() {
    let mut t = Task::default();
    t.assign_identity();
    t.set_owner_login("alice");
    t.set_rights(Rights::new(5));
    t.set_created_at();

    assert!(t.record_id().is_some());
    assert_eq!(t.meta.owner_login, "alice");
    assert_eq!(t.rights(), Rights::new(5));
    assert!(t.created_at().is_some());
    assert_eq!(t.value().record_id(), t.record_id());
  }

  #[test]
  fn group_path_accumulates() {
    let mut t = Task::default();
    t.set_group_path("G0");
    t.set_group_path("G1");
    assert_eq!(t.meta.group_path, "G0,G1,");
  }

  #[test]
  fn created_at_is_stamped_with_now() {
    let before = Utc::now();
    let mut t = Task::default();
    t.set_created_at();
    let at = t.created_at().unwrap();
    assert!(at >= before && at <= Utc::now());
  }

  #[test]
  fn created_at_is_stamped_once() {
    let mut t = Task::default();
    t.set_created_at();
    let first = t.created_at();
    std::thread::sleep(std::time::Duration::from_millis(5));
    t.set_created_at();
    assert_eq!(t.created_at(), first);
  }

  #[test]
  fn document_flattens_common_attributes() {
    let mut t = Task { title: "write".into(), ..Default::default() };
    t.set_owner_login("alice");
    let doc = to_document(&t).unwrap();
    assert_eq!(doc["title"], "write");
    assert_eq!(doc["owner_login"], "alice");
    assert_eq!(doc["rights"], 0);
    assert!(doc.get("record_id").is_none());
    assert!(doc.get("group_path").is_none());
  }

  #[test]
  fn document_round_trips_identity() {
    let mut t = Task { title: "x".into(), ..Default::default() };
    t.assign_identity();
    t.set_created_at();
    let back: Task = from_document(to_document(&t).unwrap()).unwrap();
    assert_eq!(back.record_id(), t.record_id());
    assert_eq!(back.created_at(), t.created_at());
    assert_eq!(back.title, "x");
  }

  #[test]
  fn explicit_fields_skip_empty_and_managed() {
    let mut t = Task { title: "renamed".into(), ..Default::default() };
    t.assign_identity();
    t.set_created_at();
    t.set_owner_login("mallory");
    t.meta.extra = "payload".into();

    let fields = explicit_fields(&t).unwrap();
    assert_eq!(fields.get("title"), Some(&json!("renamed")));
    assert_eq!(fields.get("extra"), Some(&json!("payload")));
    for absent in ["done", "tags", "rights", "record_id", "created_at", "owner_login"] {
      assert!(!fields.contains_key(absent), "{absent} should be omitted");
    }
  }

  #[test]
  fn empty_values() {
    for v in [json!(null), json!(""), json!(0), json!(0.0), json!(false), json!([]), json!({})] {
      assert!(is_empty_value(&v), "{v} should be empty");
    }
    for v in [json!("a"), json!(1), json!(-3), json!(true), json!([0]), json!({"a": 0})] {
      assert!(!is_empty_value(&v), "{v} should not be empty");
    }
  }
}
