//! DDL and identifier handling for collection tables.
//!
//! Collection and field names cannot be bound as parameters in DDL, so they
//! are validated here before being spliced into SQL text.

use crate::{Error, Result};

/// Applied to every new connection to a file database.
pub const CONNECTION_PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
";

fn is_ident(s: &str) -> bool {
  !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// A validated collection name, safe to use as a quoted table name.
pub fn table(collection: &str) -> Result<String> {
  // SQLite reserves the prefix in any letter case.
  if is_ident(collection) && !collection.to_ascii_lowercase().starts_with("sqlite_") {
    Ok(format!("\"{collection}\""))
  } else {
    Err(Error::InvalidCollection(collection.to_owned()))
  }
}

/// A validated JSON path literal for `field`, e.g. `'$.owner_login'`.
pub fn path(field: &str) -> Result<String> {
  if field.split('.').all(is_ident) {
    Ok(format!("'$.{field}'"))
  } else {
    Err(Error::InvalidField(field.to_owned()))
  }
}

/// Documents are stored whole; everything else is derived with JSON
/// functions.
pub fn create_table(table: &str) -> String {
  format!("CREATE TABLE IF NOT EXISTS {table} (doc TEXT NOT NULL)")
}

pub fn create_unique_index(collection: &str, field: &str) -> Result<String> {
  let table = table(collection)?;
  let path = path(field)?;
  let name = format!("\"{collection}__{}_unique\"", field.replace('.', "_"));
  Ok(format!(
    "CREATE UNIQUE INDEX IF NOT EXISTS {name} ON {table} (json_extract(doc, {path}))"
  ))
}

/// Quote a table name read back from `sqlite_master`.
pub fn quote(name: &str) -> String { format!("\"{}\"", name.replace('"', "\"\"")) }

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn collection_names() {
    assert_eq!(table("notes").unwrap(), "\"notes\"");
    assert_eq!(table("Notes_2").unwrap(), "\"Notes_2\"");
    for bad in ["", "a-b", "a b", "x\";DROP", "sqlite_master", "SQLITE_x", "Sqlite_stat1"] {
      assert!(matches!(table(bad), Err(Error::InvalidCollection(_))), "{bad:?}");
    }
  }

  #[test]
  fn field_paths() {
    assert_eq!(path("rights").unwrap(), "'$.rights'");
    assert_eq!(path("address.city").unwrap(), "'$.address.city'");
    for bad in ["", "a..b", ".a", "a'", "a b"] {
      assert!(matches!(path(bad), Err(Error::InvalidField(_))), "{bad:?}");
    }
  }

  #[test]
  fn unique_index_ddl() {
    assert_eq!(
      create_unique_index("notes", "record_id").unwrap(),
      "CREATE UNIQUE INDEX IF NOT EXISTS \"notes__record_id_unique\" \
       ON \"notes\" (json_extract(doc, '$.record_id'))"
    );
  }
}
