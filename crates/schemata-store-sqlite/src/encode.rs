//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so that lexical order is chronological order. Tag
//! sets are stored as sorted JSON arrays. Data blobs are stored untouched.

use chrono::{DateTime, SecondsFormat, Utc};
use schemata_core::{
  identity::{ConfigIdentity, SchemeIdentity},
  version::{ConfigVersion, SchemeVersion, Tags},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Tags ────────────────────────────────────────────────────────────────────

/// `BTreeSet` iterates in order, so the stored array is always sorted.
pub fn encode_tags(tags: &Tags) -> Result<String> {
  Ok(serde_json::to_string(tags)?)
}

pub fn decode_tags(s: &str) -> Result<Tags> { Ok(serde_json::from_str(s)?) }

/// A search filter: `None` for "no tag filter", otherwise the JSON array
/// handed to `json_each`.
pub fn encode_tag_filter(tags: &Tags) -> Result<Option<String>> {
  if tags.is_empty() {
    Ok(None)
  } else {
    encode_tags(tags).map(Some)
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read from either version ledger. `owner_id` is the scheme id
/// for `scheme_versions` and the config id for `config_versions`.
#[derive(Debug)]
pub struct RawVersion {
  pub owner_id:   i64,
  pub scheme_id:  i64,
  pub version:    i64,
  pub tags:       String,
  pub data:       Vec<u8>,
  pub created_at: String,
}

impl RawVersion {
  /// Map a row selected as `owner, scheme_id, version, tags, data, created_at`.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      owner_id:   row.get(0)?,
      scheme_id:  row.get(1)?,
      version:    row.get(2)?,
      tags:       row.get(3)?,
      data:       row.get(4)?,
      created_at: row.get(5)?,
    })
  }

  pub fn into_scheme(self) -> Result<SchemeVersion> {
    Ok(SchemeVersion {
      scheme_id:  self.owner_id,
      version:    self.version,
      tags:       decode_tags(&self.tags)?,
      data:       self.data,
      created_at: decode_dt(&self.created_at)?,
    })
  }

  pub fn into_config(self) -> Result<ConfigVersion> {
    Ok(ConfigVersion {
      config_id:  self.owner_id,
      scheme_id:  self.scheme_id,
      version:    self.version,
      tags:       decode_tags(&self.tags)?,
      data:       self.data,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read from a `schemes` row.
pub struct RawSchemeIdentity {
  pub id:         i64,
  pub created_at: String,
  pub deleted_at: Option<String>,
}

impl RawSchemeIdentity {
  pub fn into_identity(self) -> Result<SchemeIdentity> {
    Ok(SchemeIdentity {
      id:         self.id,
      created_at: decode_dt(&self.created_at)?,
      deleted_at: self.deleted_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw values read from a `configs` row.
pub struct RawConfigIdentity {
  pub id:         i64,
  pub scheme_id:  i64,
  pub created_at: String,
  pub deleted_at: Option<String>,
}

impl RawConfigIdentity {
  pub fn into_identity(self) -> Result<ConfigIdentity> {
    Ok(ConfigIdentity {
      id:         self.id,
      scheme_id:  self.scheme_id,
      created_at: decode_dt(&self.created_at)?,
      deleted_at: self.deleted_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}
