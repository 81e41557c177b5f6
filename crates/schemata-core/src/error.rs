//! Error types for `schemata-core`.
//!
//! Every error a store can return is classified into one of four
//! [`ErrorKind`]s. Adapters (HTTP or otherwise) translate the kind into a
//! transport status; they never inspect backend-specific error types.

use serde::Serialize;
use thiserror::Error;

use crate::identity::EntityKind;

/// The coarse classification an adapter layer acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  /// The caller supplied missing or malformed input. Never retried.
  Validation,
  /// The referenced identity does not exist or is not live.
  NotFound,
  /// A config referenced a scheme that is not live.
  InvalidReference,
  /// The backing store failed.
  Persistence,
}

/// Implemented by every error type a [`RecordStore`](crate::store::RecordStore)
/// can return.
pub trait Classify {
  fn kind(&self) -> ErrorKind;
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("validation error: {0}")]
  Validation(String),

  #[error("{kind} {id} not found")]
  NotFound { kind: EntityKind, id: i64 },

  #[error("{kind} {id} has no version {version}")]
  VersionNotFound {
    kind:    EntityKind,
    id:      i64,
    version: i64,
  },

  #[error("scheme {scheme_id} is not a live scheme")]
  InvalidReference { scheme_id: i64 },

  /// The optimistic append lost the race for the next version number more
  /// times than the retry policy allows.
  #[error("{kind} {id}: version append conflicted after {attempts} attempts")]
  VersionConflict {
    kind:     EntityKind,
    id:       i64,
    attempts: u32,
  },

  /// A create could not get its write through within the retry policy.
  #[error("{kind} create: write conflicted after {attempts} attempts")]
  CreateConflict { kind: EntityKind, attempts: u32 },
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::Validation(_) => ErrorKind::Validation,
      Self::NotFound { .. } | Self::VersionNotFound { .. } => {
        ErrorKind::NotFound
      }
      Self::InvalidReference { .. } => ErrorKind::InvalidReference,
      Self::VersionConflict { .. } | Self::CreateConflict { .. } => {
        ErrorKind::Persistence
      }
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
