//! `Note` — the record type served by the bundled server.

use coffer_core::record::{Record, RecordMeta};
use serde::{Deserialize, Serialize};

/// A short titled note. Every field defaults, so a partial JSON body
/// deserialises into a `Note` with only the supplied fields set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Note {
  #[serde(flatten)]
  pub meta:   RecordMeta,
  pub title:  String,
  pub body:   String,
  pub pinned: bool,
  pub tags:   Vec<String>,
}

impl Record for Note {
  fn meta(&self) -> &RecordMeta { &self.meta }

  fn meta_mut(&mut self) -> &mut RecordMeta { &mut self.meta }
}
