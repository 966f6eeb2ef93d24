//! The scoped CRUD engine.
//!
//! One [`Engine`] is built per call site from a store handle, the injected
//! [`EngineConfig`], a collection name and the caller's [`Scope`]. The record
//! type is a type parameter, so the same code serves every record schema.
//!
//! Every read, update and delete is conjoined with
//! [`Engine::authorization_criteria`]. A record the caller may not see is
//! reported exactly like a record that does not exist: [`Error::NotFound`].

use std::{marker::PhantomData, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  filter::{Filter, Page, Search},
  id::RecordId,
  record::{Record, explicit_fields, fields, from_document, to_document},
  rights::Rights,
  scope::Scope,
  store::{DocumentStore, Session},
};

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  /// Enables the schema-destructive administrative operations.
  pub debug:          bool,
  /// Assigned to records inserted without rights; also the mask a record
  /// must intersect to be visible to a scoped caller.
  pub default_rights: Rights,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self { debug: false, default_rights: Rights::DEFAULT }
  }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

pub struct Engine<S, T> {
  store:      Arc<S>,
  config:     Arc<EngineConfig>,
  collection: String,
  scope:      Scope,
  _record:    PhantomData<fn() -> T>,
}

impl<S, T> Engine<S, T>
where
  S: DocumentStore,
  T: Record,
{
  pub fn new(
    store: Arc<S>,
    config: Arc<EngineConfig>,
    collection: impl Into<String>,
    scope: Scope,
  ) -> Self {
    Self {
      store,
      config,
      collection: collection.into(),
      scope,
      _record: PhantomData,
    }
  }

  pub fn collection(&self) -> &str { &self.collection }

  pub fn scope(&self) -> &Scope { &self.scope }

  /// The predicates restricting this caller to the records it may see.
  ///
  /// Unscoped callers get none. A user must own the record and the record's
  /// rights must share at least one bit with the default mask.
  pub fn authorization_criteria(&self) -> Vec<Filter> {
    match self.scope.login() {
      None => Vec::new(),
      Some(login) => vec![
        Filter::eq(fields::OWNER_LOGIN, login),
        Filter::bits_any_set(fields::RIGHTS, self.config.default_rights),
      ],
    }
  }

  fn by_id(id: &RecordId) -> Filter { Filter::eq(fields::RECORD_ID, id.to_string()) }

  fn scoped_by_id(&self, id: &RecordId) -> Filter {
    let mut filters = vec![Self::by_id(id)];
    filters.extend(self.authorization_criteria());
    Filter::and(filters)
  }

  async fn session(&self) -> Result<S::Session> {
    self.store.session().await.map_err(Error::store)
  }

  async fn fetch(&self, session: &S::Session, filter: &Filter) -> Result<T> {
    let doc = session
      .find(&self.collection, filter, 0, Some(1))
      .await
      .map_err(Error::store)?
      .into_iter()
      .next()
      .ok_or(Error::NotFound)?;
    from_document(doc)
  }

  fn require_debug(&self) -> Result<()> {
    if self.config.debug { Ok(()) } else { Err(Error::NotPermitted) }
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// Fetch one record by its hex identifier.
  pub async fn find_one(&self, id: &str) -> Result<T> {
    let id = RecordId::parse(id)?;
    tracing::debug!(
      collection = %self.collection,
      %id,
      scoped = !self.scope.is_unscoped(),
      "find_one"
    );

    let session = self.session().await?;
    self.fetch(&session, &self.scoped_by_id(&id)).await
  }

  /// List one page of records matching `search` and the caller's scope.
  pub async fn find_all(&self, search: &Search) -> Result<Page<T>> {
    let mut criteria = search.criteria.clone();
    criteria.extend(self.authorization_criteria());
    let filter = Filter::and(criteria);
    tracing::debug!(
      collection = %self.collection,
      page_size = search.page_size,
      start = search.start,
      scoped = !self.scope.is_unscoped(),
      "find_all"
    );

    let session = self.session().await?;
    let count = session
      .count(&self.collection, &filter)
      .await
      .map_err(Error::store)?;
    let values = session
      .find(&self.collection, &filter, search.start, search.limit())
      .await
      .map_err(Error::store)?
      .into_iter()
      .map(from_document)
      .collect::<Result<Vec<T>>>()?;

    Ok(Page::new(search, count, values))
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  /// Stamp `record` with identity, rights, creation time and (for a scoped
  /// caller) ownership, then persist it.
  ///
  /// The stamps stay on `record` even when the store rejects the write.
  pub async fn insert(&self, record: &mut T) -> Result<T> {
    record.assign_identity();
    record.set_rights(record.rights().or_default(self.config.default_rights));
    // A caller-supplied creation time is not trusted.
    record.meta_mut().created_at = None;
    record.set_created_at();
    if let Some(login) = self.scope.login() {
      record.set_owner_login(login);
      if let Some(group) = self.scope.group_id() {
        record.set_group_path(group);
      }
    }

    let doc = to_document(&*record)?;
    let session = self.session().await?;
    if let Err(e) = session.insert(&self.collection, doc).await {
      tracing::warn!(collection = %self.collection, error = %e, "insert failed");
      return Err(Error::store(e));
    }

    tracing::debug!(
      collection = %self.collection,
      id = ?record.record_id(),
      "inserted record"
    );
    Ok(record.value())
  }

  /// Replace the stored record with `record`. Identity, creation time and
  /// ownership keep their stored values; empty rights become the default.
  ///
  /// Returns the record as stored afterwards.
  pub async fn update(&self, id: &str, mut record: T) -> Result<T> {
    let id = RecordId::parse(id)?;
    record.meta_mut().record_id = Some(id);
    record.set_rights(record.rights().or_default(self.config.default_rights));
    let doc = to_document(&record)?;
    tracing::debug!(collection = %self.collection, %id, "update");

    let session = self.session().await?;
    let matched = session
      .replace(&self.collection, &self.scoped_by_id(&id), doc, &fields::MANAGED)
      .await
      .map_err(Error::store)?;
    if matched == 0 {
      return Err(Error::NotFound);
    }

    // The write was authorised; the new rights may no longer be.
    self.fetch(&session, &Self::by_id(&id)).await
  }

  /// Write only the non-empty fields of `record` and return the record as
  /// stored afterwards.
  ///
  /// The write and the re-read are separate store calls, so a concurrent
  /// writer may show up in the result.
  pub async fn set(&self, id: &str, record: &T) -> Result<T> {
    let id = RecordId::parse(id)?;
    let fields = explicit_fields(record)?;
    tracing::debug!(
      collection = %self.collection,
      %id,
      fields = fields.len(),
      "set"
    );

    let session = self.session().await?;
    let scoped = self.scoped_by_id(&id);
    if fields.is_empty() {
      return self.fetch(&session, &scoped).await;
    }

    let matched = session
      .set_fields(&self.collection, &scoped, fields)
      .await
      .map_err(Error::store)?;
    if matched == 0 {
      return Err(Error::NotFound);
    }

    self.fetch(&session, &Self::by_id(&id)).await
  }

  /// Delete one record. Scoped callers may only delete what they can see.
  pub async fn drop_one(&self, id: &str) -> Result<RecordId> {
    let id = RecordId::parse(id)?;
    tracing::debug!(collection = %self.collection, %id, "drop_one");

    let session = self.session().await?;
    let removed = session
      .remove(&self.collection, &self.scoped_by_id(&id))
      .await
      .map_err(Error::store)?;
    if removed == 0 {
      return Err(Error::NotFound);
    }
    Ok(id)
  }

  // ── Administration ────────────────────────────────────────────────────────

  /// Declare the record identifier unique in this collection. Idempotent.
  pub async fn ensure_index(&self) -> Result<()> {
    let session = self.session().await?;
    session
      .ensure_unique_index(&self.collection, fields::RECORD_ID)
      .await
      .map_err(Error::store)
  }

  /// Create this collection and its identifier index. Debug mode only.
  pub async fn create_database(&self) -> Result<()> {
    self.require_debug()?;
    tracing::info!(collection = %self.collection, "creating collection");

    let session = self.session().await?;
    session
      .create_collection(&self.collection)
      .await
      .map_err(Error::store)?;
    session
      .ensure_unique_index(&self.collection, fields::RECORD_ID)
      .await
      .map_err(Error::store)
  }

  /// Irreversibly remove every collection. Debug mode only.
  pub async fn drop_database(&self) -> Result<()> {
    self.require_debug()?;
    tracing::info!("dropping database");

    let session = self.session().await?;
    session.drop_database().await.map_err(Error::store)
  }
}
