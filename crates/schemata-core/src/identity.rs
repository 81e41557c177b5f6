//! Identities: the permanent, content-free records that establish an entity
//! exists.
//!
//! An identity is created once and mutated at most once, when it is
//! soft-deleted. Its content lives in the version ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The two kinds of versioned entity.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EntityKind {
  Scheme,
  Config,
}

/// Identity row of a scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeIdentity {
  pub id:         i64,
  pub created_at: DateTime<Utc>,
  pub deleted_at: Option<DateTime<Utc>>,
}

impl SchemeIdentity {
  pub fn is_deleted(&self) -> bool { self.deleted_at.is_some() }
}

/// Identity row of a config. A config is permanently bound to one scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigIdentity {
  pub id:         i64,
  pub scheme_id:  i64,
  pub created_at: DateTime<Utc>,
  pub deleted_at: Option<DateTime<Utc>>,
}

impl ConfigIdentity {
  /// Whether this config row itself was deleted. A config that is not deleted
  /// is still hidden from reads once its scheme is deleted.
  pub fn is_deleted(&self) -> bool { self.deleted_at.is_some() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn entity_kind_strings() {
    assert_eq!(EntityKind::Scheme.to_string(), "scheme");
    assert_eq!(EntityKind::Config.as_ref(), "config");
    assert_eq!("config".parse::<EntityKind>().unwrap(), EntityKind::Config);
    assert!("fact".parse::<EntityKind>().is_err());
  }

  #[test]
  fn deletion_follows_deleted_at() {
    let now = Utc::now();
    let mut config = ConfigIdentity {
      id:         1,
      scheme_id:  2,
      created_at: now,
      deleted_at: None,
    };
    assert!(!config.is_deleted());
    config.deleted_at = Some(now);
    assert!(config.is_deleted());
  }
}
