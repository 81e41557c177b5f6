//! The versioned-identity algorithm, written once for both entity kinds.
//!
//! A [`Ledger`] describes where an entity kind keeps its identities and
//! versions, and what makes one of its identities live. Every query below is
//! assembled from those descriptors, so the liveness rule of a kind is stated
//! exactly once, in [`Ledger::LIVE`], and applied to every read, update,
//! delete, and search.
//!
//! In every statement the identity table is aliased `i` and the version
//! ledger `v`.

use rusqlite::{Connection, OptionalExtension as _, params};
use schemata_core::{
  identity::EntityKind,
  version::{ConfigVersion, SchemeVersion},
};

use crate::{Result, encode::RawVersion};

/// Columns selected from `v`, in the order [`RawVersion::from_row`] expects.
const COLUMNS: &str = "v.{owner}, v.scheme_id, v.version, v.tags, v.data, v.created_at";

pub trait Ledger: 'static {
  const KIND: EntityKind;
  /// Identity table.
  const IDENTITY: &'static str;
  /// Version ledger table.
  const VERSIONS: &'static str;
  /// Ledger column referencing the identity.
  const OWNER: &'static str;
  /// Joins from `i` needed to evaluate [`Self::LIVE`].
  const SCOPE: &'static str;
  /// Predicate over `i` and [`Self::SCOPE`] that holds for live identities.
  const LIVE: &'static str;
  /// Ledger key columns written on append, besides the version.
  const KEY_COLUMNS: &'static str;
  /// Values for [`Self::KEY_COLUMNS`], taken from `i`.
  const KEY_VALUES: &'static str;

  type Snapshot;

  fn snapshot(raw: RawVersion) -> Result<Self::Snapshot>;
}

/// Schemes are live until deleted.
pub struct SchemeLedger;

impl Ledger for SchemeLedger {
  const KIND: EntityKind = EntityKind::Scheme;
  const IDENTITY: &'static str = "schemes";
  const VERSIONS: &'static str = "scheme_versions";
  const OWNER: &'static str = "scheme_id";
  const SCOPE: &'static str = "";
  const LIVE: &'static str = "i.deleted_at IS NULL";
  const KEY_COLUMNS: &'static str = "scheme_id";
  const KEY_VALUES: &'static str = "i.id";

  type Snapshot = SchemeVersion;

  fn snapshot(raw: RawVersion) -> Result<SchemeVersion> { raw.into_scheme() }
}

/// Configs are live until deleted, and only while their scheme is live.
pub struct ConfigLedger;

impl Ledger for ConfigLedger {
  const KIND: EntityKind = EntityKind::Config;
  const IDENTITY: &'static str = "configs";
  const VERSIONS: &'static str = "config_versions";
  const OWNER: &'static str = "config_id";
  const SCOPE: &'static str = "JOIN schemes s ON s.id = i.scheme_id";
  const LIVE: &'static str = "i.deleted_at IS NULL AND s.deleted_at IS NULL";
  const KEY_COLUMNS: &'static str = "config_id, scheme_id";
  const KEY_VALUES: &'static str = "i.id, i.scheme_id";

  type Snapshot = ConfigVersion;

  fn snapshot(raw: RawVersion) -> Result<ConfigVersion> { raw.into_config() }
}

// ─── SQL assembly ────────────────────────────────────────────────────────────

fn columns<L: Ledger>() -> String { COLUMNS.replace("{owner}", L::OWNER) }

/// `FROM` clause joining every ledger row to its identity and liveness scope.
fn from_live<L: Ledger>() -> String {
  format!(
    "{versions} v JOIN {identity} i ON i.id = v.{owner} {scope}",
    versions = L::VERSIONS,
    identity = L::IDENTITY,
    owner = L::OWNER,
    scope = L::SCOPE,
  )
}

// ─── Identity checks ─────────────────────────────────────────────────────────

pub fn is_live<L: Ledger>(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
  let sql = format!(
    "SELECT 1 FROM {identity} i {scope} WHERE i.id = ?1 AND {live}",
    identity = L::IDENTITY,
    scope = L::SCOPE,
    live = L::LIVE,
  );
  Ok(conn.query_row(&sql, params![id], |_| Ok(())).optional()?.is_some())
}

/// Soft-delete a live identity. Returns the number of rows marked, 0 or 1.
pub fn mark_deleted<L: Ledger>(
  conn: &Connection,
  id: i64,
  at: &str,
) -> rusqlite::Result<usize> {
  let sql = format!(
    "UPDATE {identity} SET deleted_at = ?2
     WHERE id IN (SELECT i.id FROM {identity} i {scope} WHERE i.id = ?1 AND {live})",
    identity = L::IDENTITY,
    scope = L::SCOPE,
    live = L::LIVE,
  );
  conn.execute(&sql, params![id, at])
}

// ─── Appends ─────────────────────────────────────────────────────────────────

/// Append `max(version) + 1` to a live identity in a single statement.
///
/// Returns `None` when the identity is missing or not live. Two writers racing
/// on the same identity cannot both succeed: the loser hits the
/// `UNIQUE (owner, version)` constraint.
pub fn append_next<L: Ledger>(
  conn: &Connection,
  id: i64,
  tags: &str,
  data: &[u8],
  at: &str,
) -> rusqlite::Result<Option<RawVersion>> {
  let sql = format!(
    "INSERT INTO {versions} ({key_columns}, version, tags, data, created_at)
     SELECT {key_values}, COALESCE(MAX(v.version), 0) + 1, ?2, ?3, ?4
     FROM {identity} i {scope}
     LEFT JOIN {versions} v ON v.{owner} = i.id
     WHERE i.id = ?1 AND {live}
     GROUP BY i.id
     RETURNING {owner}, scheme_id, version, tags, data, created_at",
    versions = L::VERSIONS,
    identity = L::IDENTITY,
    owner = L::OWNER,
    scope = L::SCOPE,
    live = L::LIVE,
    key_columns = L::KEY_COLUMNS,
    key_values = L::KEY_VALUES,
  );
  conn
    .query_row(&sql, params![id, tags, data, at], RawVersion::from_row)
    .optional()
}

// ─── Reads ───────────────────────────────────────────────────────────────────

/// The newest version of a live identity; ties on version resolve to the
/// latest `created_at`.
pub fn current<L: Ledger>(
  conn: &Connection,
  id: i64,
) -> rusqlite::Result<Option<RawVersion>> {
  let sql = format!(
    "SELECT {columns} FROM {from}
     WHERE i.id = ?1 AND {live}
     ORDER BY v.version DESC, v.created_at DESC
     LIMIT 1",
    columns = columns::<L>(),
    from = from_live::<L>(),
    live = L::LIVE,
  );
  conn.query_row(&sql, params![id], RawVersion::from_row).optional()
}

pub fn at_version<L: Ledger>(
  conn: &Connection,
  id: i64,
  version: i64,
) -> rusqlite::Result<Option<RawVersion>> {
  let sql = format!(
    "SELECT {columns} FROM {from}
     WHERE i.id = ?1 AND v.version = ?2 AND {live}",
    columns = columns::<L>(),
    from = from_live::<L>(),
    live = L::LIVE,
  );
  conn
    .query_row(&sql, params![id, version], RawVersion::from_row)
    .optional()
}

/// Every version of a live identity, oldest first. Empty if not live.
pub fn history<L: Ledger>(
  conn: &Connection,
  id: i64,
) -> rusqlite::Result<Vec<RawVersion>> {
  let sql = format!(
    "SELECT {columns} FROM {from}
     WHERE i.id = ?1 AND {live}
     ORDER BY v.version ASC",
    columns = columns::<L>(),
    from = from_live::<L>(),
    live = L::LIVE,
  );
  let mut stmt = conn.prepare(&sql)?;
  let rows = stmt
    .query_map(params![id], RawVersion::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

/// Filters for [`search`], already encoded for binding.
pub struct Filter {
  pub version:   Option<i64>,
  /// JSON array of required tags.
  pub tags:      Option<String>,
  pub scheme_id: Option<i64>,
}

/// The newest filter-matching version of every live identity, newest version
/// first, then by id.
///
/// Tag containment: no tag of the filter may be missing from the row.
pub fn search<L: Ledger>(
  conn: &Connection,
  filter: &Filter,
) -> rusqlite::Result<Vec<RawVersion>> {
  let sql = format!(
    "SELECT owner_id, scheme_id, version, tags, data, created_at FROM (
       SELECT v.{owner} AS owner_id, v.scheme_id, v.version, v.tags, v.data, v.created_at,
              ROW_NUMBER() OVER (
                PARTITION BY v.{owner}
                ORDER BY v.version DESC, v.created_at DESC
              ) AS recency
       FROM {from}
       WHERE {live}
         AND (?1 IS NULL OR v.version = ?1)
         AND (?2 IS NULL OR NOT EXISTS (
               SELECT 1 FROM json_each(?2) want
               WHERE want.value NOT IN (SELECT have.value FROM json_each(v.tags) have)))
         AND (?3 IS NULL OR v.scheme_id = ?3)
     )
     WHERE recency = 1
     ORDER BY version DESC, owner_id ASC",
    owner = L::OWNER,
    from = from_live::<L>(),
    live = L::LIVE,
  );
  let mut stmt = conn.prepare(&sql)?;
  let rows = stmt
    .query_map(
      params![filter.version, filter.tags, filter.scheme_id],
      RawVersion::from_row,
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}
