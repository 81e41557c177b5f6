//! [`SqliteStore`], the SQLite implementation of [`RecordStore`].

use std::{path::Path, time::Duration};

use chrono::Utc;
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use tracing::debug;

use schemata_core::{
  identity::{ConfigIdentity, EntityKind, SchemeIdentity},
  store::{RecordStore, SearchQuery},
  version::{ConfigVersion, NewVersion, SchemeVersion},
};

use crate::{
  Error, Result,
  encode::{
    RawConfigIdentity, RawSchemeIdentity, encode_dt, encode_tag_filter,
    encode_tags,
  },
  ledger::{self, ConfigLedger, Filter, Ledger, SchemeLedger},
  retry::RetryPolicy,
  schema::SCHEMA,
};

/// How long a connection waits on another writer's lock before reporting
/// `SQLITE_BUSY`.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

fn not_found(kind: EntityKind, id: i64) -> Error {
  Error::Core(schemata_core::Error::NotFound { kind, id })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Schemata store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:  tokio_rusqlite::Connection,
  retry: RetryPolicy,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, retry: RetryPolicy::default() };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, retry: RetryPolicy::default() };
    store.init_schema().await?;
    Ok(store)
  }

  /// Replace the retry policy applied to writes.
  pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
    self.retry = retry;
    self
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Generic resolver operations ───────────────────────────────────────────

  async fn current<L: Ledger>(&self, id: i64) -> Result<L::Snapshot> {
    let raw = self
      .conn
      .call(move |conn| Ok(ledger::current::<L>(conn, id)?))
      .await?
      .ok_or_else(|| not_found(L::KIND, id))?;
    L::snapshot(raw)
  }

  async fn at_version<L: Ledger>(
    &self,
    id: i64,
    version: i64,
  ) -> Result<L::Snapshot> {
    let raw = self
      .conn
      .call(move |conn| Ok(ledger::at_version::<L>(conn, id, version)?))
      .await?
      .ok_or(schemata_core::Error::VersionNotFound {
        kind: L::KIND,
        id,
        version,
      })?;
    L::snapshot(raw)
  }

  async fn history<L: Ledger>(&self, id: i64) -> Result<Vec<L::Snapshot>> {
    let raws = self
      .conn
      .call(move |conn| Ok(ledger::history::<L>(conn, id)?))
      .await?;
    if raws.is_empty() {
      return Err(not_found(L::KIND, id));
    }
    raws.into_iter().map(L::snapshot).collect()
  }

  /// Append the next version to a live identity, retrying lost races.
  async fn append<L: Ledger>(
    &self,
    id: i64,
    input: NewVersion,
  ) -> Result<L::Snapshot> {
    input.validate()?;
    let tags = encode_tags(&input.tags)?;
    let data = input.data;

    let db = &self.conn;
    let raw = self
      .retry
      .run(L::KIND, Some(id), move || {
        let (tags, data) = (tags.clone(), data.clone());
        let at = encode_dt(Utc::now());
        db.call(move |conn| {
          let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
          let row = ledger::append_next::<L>(&tx, id, &tags, &data, &at)?;
          tx.commit()?;
          Ok(row)
        })
      })
      .await?
      .ok_or_else(|| not_found(L::KIND, id))?;

    debug!(kind = %L::KIND, id, version = raw.version, "appended version");
    L::snapshot(raw)
  }

  async fn delete<L: Ledger>(&self, id: i64) -> Result<()> {
    let db = &self.conn;
    let marked = self
      .retry
      .run(L::KIND, Some(id), move || {
        let at = encode_dt(Utc::now());
        db.call(move |conn| Ok(ledger::mark_deleted::<L>(conn, id, &at)?))
      })
      .await?;
    if marked == 0 {
      return Err(not_found(L::KIND, id));
    }
    debug!(kind = %L::KIND, id, "soft-deleted");
    Ok(())
  }

  async fn search<L: Ledger>(
    &self,
    query: &SearchQuery,
  ) -> Result<Vec<L::Snapshot>> {
    query.validate()?;
    let filter = Filter {
      version:   query.version,
      tags:      encode_tag_filter(&query.tags)?,
      scheme_id: query.scheme_id,
    };
    let raws = self
      .conn
      .call(move |conn| Ok(ledger::search::<L>(conn, &filter)?))
      .await?;
    raws.into_iter().map(L::snapshot).collect()
  }
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = Error;

  // ── Schemes ───────────────────────────────────────────────────────────────

  async fn create_scheme(&self, input: NewVersion) -> Result<SchemeVersion> {
    input.validate()?;
    let tags = encode_tags(&input.tags)?;
    let data = input.data;

    let db = &self.conn;
    let raw = self
      .retry
      .run(EntityKind::Scheme, None, move || {
        let (tags, data) = (tags.clone(), data.clone());
        let at = encode_dt(Utc::now());
        db.call(move |conn| {
          let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
          let id: i64 = tx.query_row(
            "INSERT INTO schemes (created_at) VALUES (?1) RETURNING id",
            rusqlite::params![at],
            |r| r.get(0),
          )?;
          // The identity was inserted by this transaction, so it is live.
          let row = ledger::append_next::<SchemeLedger>(&tx, id, &tags, &data, &at)?
            .ok_or(rusqlite::Error::QueryReturnedNoRows)?;
          tx.commit()?;
          Ok(row)
        })
      })
      .await?;

    debug!(id = raw.owner_id, "created scheme");
    raw.into_scheme()
  }

  async fn read_scheme(&self, id: i64) -> Result<SchemeVersion> {
    self.current::<SchemeLedger>(id).await
  }

  async fn read_scheme_version(
    &self,
    id: i64,
    version: i64,
  ) -> Result<SchemeVersion> {
    self.at_version::<SchemeLedger>(id, version).await
  }

  async fn scheme_history(&self, id: i64) -> Result<Vec<SchemeVersion>> {
    self.history::<SchemeLedger>(id).await
  }

  async fn update_scheme(
    &self,
    id: i64,
    input: NewVersion,
  ) -> Result<SchemeVersion> {
    self.append::<SchemeLedger>(id, input).await
  }

  async fn delete_scheme(&self, id: i64) -> Result<()> {
    self.delete::<SchemeLedger>(id).await
  }

  async fn search_schemes(&self, query: &SearchQuery) -> Result<Vec<SchemeVersion>> {
    self.search::<SchemeLedger>(query).await
  }

  async fn scheme_identity(&self, id: i64) -> Result<Option<SchemeIdentity>> {
    let raw: Option<RawSchemeIdentity> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT id, created_at, deleted_at FROM schemes WHERE id = ?1",
            rusqlite::params![id],
            |row| {
              Ok(RawSchemeIdentity {
                id:         row.get(0)?,
                created_at: row.get(1)?,
                deleted_at: row.get(2)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSchemeIdentity::into_identity).transpose()
  }

  // ── Configs ───────────────────────────────────────────────────────────────

  async fn create_config(
    &self,
    scheme_id: i64,
    input: NewVersion,
  ) -> Result<ConfigVersion> {
    input.validate()?;
    let tags = encode_tags(&input.tags)?;
    let data = input.data;

    let db = &self.conn;
    let raw = self
      .retry
      .run(EntityKind::Config, None, move || {
        let (tags, data) = (tags.clone(), data.clone());
        let at = encode_dt(Utc::now());
        db.call(move |conn| {
          let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
          if !ledger::is_live::<SchemeLedger>(&tx, scheme_id)? {
            return Ok(None);
          }
          let id: i64 = tx.query_row(
            "INSERT INTO configs (scheme_id, created_at) VALUES (?1, ?2) RETURNING id",
            rusqlite::params![scheme_id, at],
            |r| r.get(0),
          )?;
          let row = ledger::append_next::<ConfigLedger>(&tx, id, &tags, &data, &at)?
            .ok_or(rusqlite::Error::QueryReturnedNoRows)?;
          tx.commit()?;
          Ok(Some(row))
        })
      })
      .await?
      .ok_or(schemata_core::Error::InvalidReference { scheme_id })?;

    debug!(id = raw.owner_id, scheme_id, "created config");
    raw.into_config()
  }

  async fn read_config(&self, id: i64) -> Result<ConfigVersion> {
    self.current::<ConfigLedger>(id).await
  }

  async fn read_config_version(
    &self,
    id: i64,
    version: i64,
  ) -> Result<ConfigVersion> {
    self.at_version::<ConfigLedger>(id, version).await
  }

  async fn config_history(&self, id: i64) -> Result<Vec<ConfigVersion>> {
    self.history::<ConfigLedger>(id).await
  }

  async fn update_config(
    &self,
    id: i64,
    input: NewVersion,
  ) -> Result<ConfigVersion> {
    self.append::<ConfigLedger>(id, input).await
  }

  async fn delete_config(&self, id: i64) -> Result<()> {
    self.delete::<ConfigLedger>(id).await
  }

  async fn search_configs(&self, query: &SearchQuery) -> Result<Vec<ConfigVersion>> {
    self.search::<ConfigLedger>(query).await
  }

  async fn config_identity(&self, id: i64) -> Result<Option<ConfigIdentity>> {
    let raw: Option<RawConfigIdentity> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT id, scheme_id, created_at, deleted_at FROM configs WHERE id = ?1",
            rusqlite::params![id],
            |row| {
              Ok(RawConfigIdentity {
                id:         row.get(0)?,
                scheme_id:  row.get(1)?,
                created_at: row.get(2)?,
                deleted_at: row.get(3)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawConfigIdentity::into_identity).transpose()
  }
}

#[cfg(test)]
impl SqliteStore {
  /// Direct connection access for assertions against raw ledger rows.
  pub(crate) fn connection(&self) -> &tokio_rusqlite::Connection { &self.conn }
}
