//! Store-level filter predicates, search parameters and result pages.
//!
//! Field names address top-level document attributes; a dotted name reaches
//! into nested objects. Backends translate [`Filter`] into their own query
//! language.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::rights::Rights;

// ─── Filter ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Filter {
  /// The field equals `value`.
  Eq { field: String, value: Value },
  /// The integer field shares at least one bit with `mask`.
  BitsAnySet { field: String, mask: i32 },
  /// All of the inner filters match. Empty matches every document.
  And { filters: Vec<Filter> },
  /// Any of the inner filters matches. Empty matches nothing.
  Or { filters: Vec<Filter> },
}

impl Filter {
  pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
    Self::Eq { field: field.into(), value: value.into() }
  }

  pub fn bits_any_set(field: impl Into<String>, mask: Rights) -> Self {
    Self::BitsAnySet { field: field.into(), mask: mask.bits() }
  }

  pub fn and(filters: Vec<Filter>) -> Self { Self::And { filters } }

  pub fn or(filters: Vec<Filter>) -> Self { Self::Or { filters } }

  /// Matches every document.
  pub fn all() -> Self { Self::and(Vec::new()) }

  /// True for a filter that restricts nothing.
  pub fn is_trivial(&self) -> bool {
    match self {
      Self::And { filters } => filters.iter().all(Filter::is_trivial),
      _ => false,
    }
  }
}

// ─── Search ──────────────────────────────────────────────────────────────────

/// Parameters for [`crate::engine::Engine::find_all`].
#[derive(Debug, Clone, Default)]
pub struct Search {
  /// Maximum number of values per page; `0` means no limit.
  pub page_size: u64,
  pub start:     u64,
  /// Caller-supplied predicates; the engine adds the rights scope.
  pub criteria:  Vec<Filter>,
}

impl Search {
  pub fn new(page_size: u64, start: u64) -> Self {
    Self { page_size, start, criteria: Vec::new() }
  }

  pub fn with(mut self, filter: Filter) -> Self {
    self.criteria.push(filter);
    self
  }

  pub fn limit(&self) -> Option<u64> { (self.page_size > 0).then_some(self.page_size) }
}

// ─── Page ────────────────────────────────────────────────────────────────────

/// One page of a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
  pub page_size: u64,
  pub start:     u64,
  /// Matches across all pages.
  pub count:     u64,
  pub has_next:  bool,
  pub values:    Vec<T>,
}

impl<T> Page<T> {
  pub fn new(search: &Search, count: u64, values: Vec<T>) -> Self {
    Self {
      page_size: search.page_size,
      start: search.start,
      count,
      has_next: search.page_size > 0
        && search.start.saturating_add(search.page_size) < count,
      values,
    }
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn trivial_filters() {
    assert!(Filter::all().is_trivial());
    assert!(Filter::and(vec![Filter::all(), Filter::all()]).is_trivial());
    assert!(!Filter::or(Vec::new()).is_trivial());
    assert!(!Filter::and(vec![Filter::eq("a", 1)]).is_trivial());
  }

  #[test]
  fn filter_serializes_tagged() {
    let f = Filter::bits_any_set("rights", Rights::DEFAULT);
    assert_eq!(
      serde_json::to_value(&f).unwrap(),
      json!({"op": "bits_any_set", "field": "rights", "mask": 7})
    );
  }

  #[test]
  fn has_next_is_computed() {
    let s = Search::new(10, 0);
    assert!(Page::<()>::new(&s, 11, vec![]).has_next);
    assert!(!Page::<()>::new(&s, 10, vec![]).has_next);

    let s = Search::new(10, 10);
    assert!(!Page::<()>::new(&s, 15, vec![]).has_next);
    assert!(Page::<()>::new(&s, 21, vec![]).has_next);
  }

  #[test]
  fn unlimited_page_never_has_next() {
    let s = Search::new(0, 0);
    assert_eq!(s.limit(), None);
    assert!(!Page::<()>::new(&s, 1_000, vec![]).has_next);
  }

  #[test]
  fn page_uses_camel_case() {
    let page = Page::new(&Search::new(2, 0), 3, vec![1, 2]);
    assert_eq!(
      serde_json::to_value(&page).unwrap(),
      json!({"pageSize": 2, "start": 0, "count": 3, "hasNext": true, "values": [1, 2]})
    );
  }
}
