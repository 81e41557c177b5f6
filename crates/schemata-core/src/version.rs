//! Version snapshots: the immutable content rows of the ledger.
//!
//! Every mutation of a scheme or config appends one snapshot with the next
//! version number. Snapshots are never updated or deleted.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A tag set. Order and duplicates carry no meaning.
pub type Tags = BTreeSet<String>;

/// Build a [`Tags`] set from anything string-like.
pub fn tags<I, T>(items: I) -> Tags
where
  I: IntoIterator<Item = T>,
  T: Into<String>,
{
  items.into_iter().map(Into::into).collect()
}

/// Input to every create and update operation.
///
/// `data` is an opaque blob; the store persists and returns it byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVersion {
  pub tags: Tags,
  pub data: Vec<u8>,
}

impl NewVersion {
  pub fn new(tags: Tags, data: impl Into<Vec<u8>>) -> Self {
    Self { tags, data: data.into() }
  }

  /// Reject input no snapshot may be built from: an empty tag set, a blank
  /// tag, or an empty blob.
  pub fn validate(&self) -> Result<()> {
    if self.tags.is_empty() {
      return Err(Error::Validation("tags could not be empty".into()));
    }
    if self.tags.iter().any(|t| t.trim().is_empty()) {
      return Err(Error::Validation("tags could not contain blank tags".into()));
    }
    if self.data.is_empty() {
      return Err(Error::Validation("data could not be empty".into()));
    }
    Ok(())
  }
}

/// One ledger row of a scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeVersion {
  pub scheme_id:  i64,
  pub version:    i64,
  pub tags:       Tags,
  pub data:       Vec<u8>,
  /// Server-assigned; never changes after creation.
  pub created_at: DateTime<Utc>,
}

/// One ledger row of a config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigVersion {
  pub config_id:  i64,
  /// Denormalised from the config identity.
  pub scheme_id:  i64,
  pub version:    i64,
  pub tags:       Tags,
  pub data:       Vec<u8>,
  pub created_at: DateTime<Utc>,
}
