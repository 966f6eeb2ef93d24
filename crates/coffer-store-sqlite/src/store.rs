//! [`SqliteStore`] — the SQLite implementation of [`DocumentStore`].

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use coffer_core::{
  filter::Filter,
  store::{DocumentStore, Session},
};
use rusqlite::types::Value as SqlValue;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{
  Error, Result,
  query::{Clause, compile},
  schema::{CONNECTION_PRAGMAS, create_table, create_unique_index, path, quote, table},
};

/// How long a session waits on a locked file database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Store ───────────────────────────────────────────────────────────────────

#[derive(Debug)]
enum Target {
  File(PathBuf),
  /// A shared-cache URI; the database lives as long as one connection does.
  Memory(String),
}

/// A document database backed by one SQLite file (or shared in-memory
/// database).
///
/// Every [`DocumentStore::session`] opens its own connection. Cloning is
/// cheap and clones address the same database.
#[derive(Clone)]
pub struct SqliteStore {
  target:  Arc<Target>,
  /// Keeps an in-memory database alive between sessions.
  _anchor: Option<tokio_rusqlite::Connection>,
}

impl SqliteStore {
  /// Open (or create) a database file at `path`.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_path_buf();
    let conn = tokio_rusqlite::Connection::open(&path).await?;
    conn
      .call(|conn| {
        conn.execute_batch(CONNECTION_PRAGMAS)?;
        Ok(())
      })
      .await?;

    tracing::debug!(?path, "opened sqlite store");
    Ok(Self { target: Arc::new(Target::File(path)), _anchor: None })
  }

  /// Open a private in-memory database — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let uri = format!(
      "file:coffer-{}?mode=memory&cache=shared",
      Uuid::new_v4().simple()
    );
    let anchor = tokio_rusqlite::Connection::open(&uri).await?;
    Ok(Self {
      target:  Arc::new(Target::Memory(uri)),
      _anchor: Some(anchor),
    })
  }

  async fn connect(&self) -> Result<tokio_rusqlite::Connection> {
    let conn = match &*self.target {
      Target::File(path) => tokio_rusqlite::Connection::open(path).await?,
      Target::Memory(uri) => tokio_rusqlite::Connection::open(uri).await?,
    };
    conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(())
      })
      .await?;
    Ok(conn)
  }
}

impl DocumentStore for SqliteStore {
  type Error = Error;
  type Session = SqliteSession;

  async fn session(&self) -> Result<SqliteSession> {
    Ok(SqliteSession { conn: self.connect().await? })
  }
}

// ─── Session ─────────────────────────────────────────────────────────────────

/// One connection. Closed when dropped.
pub struct SqliteSession {
  conn: tokio_rusqlite::Connection,
}

/// Selects the first matching row, so single-document writes stay single.
fn first_match(table: &str, clause: &str) -> String {
  format!("rowid = (SELECT rowid FROM {table} WHERE {clause} ORDER BY rowid LIMIT 1)")
}

fn to_i64(n: u64) -> i64 { i64::try_from(n).unwrap_or(i64::MAX) }

fn to_u64(n: i64) -> u64 { u64::try_from(n).unwrap_or(0) }

impl Session for SqliteSession {
  type Error = Error;

  async fn count<'a>(&'a self, collection: &'a str, filter: &'a Filter) -> Result<u64> {
    let table = table(collection)?;
    let Clause { sql: clause, params } = compile(filter)?;

    let n: i64 = self
      .conn
      .call(move |conn| {
        conn.execute_batch(&create_table(&table))?;
        let n = conn.query_row(
          &format!("SELECT COUNT(*) FROM {table} WHERE {clause}"),
          rusqlite::params_from_iter(params),
          |row| row.get(0),
        )?;
        Ok(n)
      })
      .await?;

    Ok(to_u64(n))
  }

  async fn find<'a>(
    &'a self,
    collection: &'a str,
    filter: &'a Filter,
    skip: u64,
    limit: Option<u64>,
  ) -> Result<Vec<Value>> {
    let table = table(collection)?;
    let Clause { sql: clause, mut params } = compile(filter)?;
    params.push(SqlValue::Integer(limit.map_or(-1, to_i64)));
    params.push(SqlValue::Integer(to_i64(skip)));

    let rows: Vec<String> = self
      .conn
      .call(move |conn| {
        conn.execute_batch(&create_table(&table))?;
        let mut stmt = conn.prepare(&format!(
          "SELECT doc FROM {table} WHERE {clause} ORDER BY rowid LIMIT ? OFFSET ?"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .iter()
      .map(|raw| serde_json::from_str(raw).map_err(Error::from))
      .collect()
  }

  async fn insert<'a>(&'a self, collection: &'a str, doc: Value) -> Result<()> {
    let table = table(collection)?;
    let doc_str = doc.to_string();

    self
      .conn
      .call(move |conn| {
        conn.execute_batch(&create_table(&table))?;
        conn.execute(
          &format!("INSERT INTO {table} (doc) VALUES (?1)"),
          rusqlite::params![doc_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn replace<'a>(
    &'a self,
    collection: &'a str,
    filter: &'a Filter,
    doc: Value,
    preserve: &'a [&'a str],
  ) -> Result<u64> {
    let table = table(collection)?;
    let Clause { sql: clause, params: where_params } = compile(filter)?;

    // Drop the preserved fields from the new document, then patch the stored
    // values back in. A field missing from the stored document patches as
    // null, which removes it.
    let mut paths = Vec::with_capacity(preserve.len());
    for field in preserve {
      if field.contains('.') {
        return Err(Error::InvalidField((*field).to_owned()));
      }
      paths.push(path(field)?);
    }
    let new_doc = if paths.is_empty() {
      "json(?)".to_owned()
    } else {
      format!("json_remove(?, {})", paths.join(", "))
    };
    let carried = preserve
      .iter()
      .zip(&paths)
      .map(|(field, path)| format!("'{field}', json(doc -> {path})"))
      .collect::<Vec<_>>()
      .join(", ");

    let mut params = vec![SqlValue::Text(doc.to_string())];
    params.extend(where_params);

    let changed = self
      .conn
      .call(move |conn| {
        conn.execute_batch(&create_table(&table))?;
        let n = conn.execute(
          &format!(
            "UPDATE {table} SET doc = json_patch({new_doc}, json_object({carried})) \
             WHERE {}",
            first_match(&table, &clause)
          ),
          rusqlite::params_from_iter(params),
        )?;
        Ok(n)
      })
      .await?;

    Ok(changed as u64)
  }

  async fn set_fields<'a>(
    &'a self,
    collection: &'a str,
    filter: &'a Filter,
    fields: Map<String, Value>,
  ) -> Result<u64> {
    let table = table(collection)?;
    let Clause { sql: clause, params: where_params } = compile(filter)?;

    let mut assignments = Vec::with_capacity(fields.len());
    let mut params = Vec::with_capacity(fields.len() + where_params.len());
    for (field, value) in &fields {
      assignments.push(format!("{}, json(?)", path(field)?));
      params.push(SqlValue::Text(value.to_string()));
    }
    params.extend(where_params);
    let expr = if assignments.is_empty() {
      "doc".to_owned()
    } else {
      format!("json_set(doc, {})", assignments.join(", "))
    };

    let changed = self
      .conn
      .call(move |conn| {
        conn.execute_batch(&create_table(&table))?;
        let n = conn.execute(
          &format!("UPDATE {table} SET doc = {expr} WHERE {}", first_match(&table, &clause)),
          rusqlite::params_from_iter(params),
        )?;
        Ok(n)
      })
      .await?;

    Ok(changed as u64)
  }

  async fn remove<'a>(&'a self, collection: &'a str, filter: &'a Filter) -> Result<u64> {
    let table = table(collection)?;
    let Clause { sql: clause, params } = compile(filter)?;

    let removed = self
      .conn
      .call(move |conn| {
        conn.execute_batch(&create_table(&table))?;
        let n = conn.execute(
          &format!("DELETE FROM {table} WHERE {}", first_match(&table, &clause)),
          rusqlite::params_from_iter(params),
        )?;
        Ok(n)
      })
      .await?;

    Ok(removed as u64)
  }

  async fn create_collection<'a>(&'a self, collection: &'a str) -> Result<()> {
    let table = table(collection)?;
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(&create_table(&table))?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn ensure_unique_index<'a>(&'a self, collection: &'a str, field: &'a str) -> Result<()> {
    let table = table(collection)?;
    let index = create_unique_index(collection, field)?;
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(&create_table(&table))?;
        conn.execute_batch(&index)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn drop_database(&self) -> Result<()> {
    let dropped = self
      .conn
      .call(|conn| {
        let names = {
          let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
          )?;
          let rows = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
          rows
        };
        for name in &names {
          conn.execute_batch(&format!("DROP TABLE IF EXISTS {}", quote(name)))?;
        }
        Ok(names.len())
      })
      .await?;

    tracing::info!(tables = dropped, "dropped all collections");
    Ok(())
  }
}
