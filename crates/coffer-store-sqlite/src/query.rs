//! Translation of [`Filter`] trees into SQL `WHERE` clauses over JSON
//! documents.
//!
//! Field paths are validated and inlined so that expression indexes on
//! `json_extract(doc, '$.field')` can be used; values are always bound.

use coffer_core::filter::Filter;
use rusqlite::types::Value as SqlValue;
use serde_json::Value;

use crate::{Result, schema::path};

/// A clause plus its positional parameters, in order.
#[derive(Debug, Default, Clone)]
pub struct Clause {
  pub sql:    String,
  pub params: Vec<SqlValue>,
}

pub fn compile(filter: &Filter) -> Result<Clause> {
  let mut params = Vec::new();
  let sql = compile_into(filter, &mut params)?;
  Ok(Clause { sql, params })
}

fn compile_into(filter: &Filter, params: &mut Vec<SqlValue>) -> Result<String> {
  match filter {
    Filter::Eq { field, value } => {
      let path = path(field)?;
      Ok(match value {
        Value::Null => format!("json_extract(doc, {path}) IS NULL"),
        Value::Array(_) | Value::Object(_) => {
          params.push(SqlValue::Text(value.to_string()));
          format!("json_extract(doc, {path}) = json(?)")
        }
        scalar => {
          params.push(scalar_param(scalar));
          format!("json_extract(doc, {path}) = ?")
        }
      })
    }
    Filter::BitsAnySet { field, mask } => {
      let path = path(field)?;
      params.push(SqlValue::Integer(i64::from(*mask)));
      Ok(format!("(json_extract(doc, {path}) & ?) != 0"))
    }
    Filter::And { filters } => join(filters, " AND ", "1", params),
    Filter::Or { filters } => join(filters, " OR ", "0", params),
  }
}

fn join(
  filters: &[Filter],
  op: &str,
  empty: &str,
  params: &mut Vec<SqlValue>,
) -> Result<String> {
  if filters.is_empty() {
    return Ok(empty.to_owned());
  }
  let parts = filters
    .iter()
    .map(|f| compile_into(f, params))
    .collect::<Result<Vec<_>>>()?;
  Ok(format!("({})", parts.join(op)))
}

/// JSON scalars as `json_extract` returns them: booleans are integers.
fn scalar_param(value: &Value) -> SqlValue {
  match value {
    Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
    Value::Number(n) => match n.as_i64() {
      Some(i) => SqlValue::Integer(i),
      None => SqlValue::Real(n.as_f64().unwrap_or(f64::NAN)),
    },
    Value::String(s) => SqlValue::Text(s.clone()),
    _ => SqlValue::Null,
  }
}
