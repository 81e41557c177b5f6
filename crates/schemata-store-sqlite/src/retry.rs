//! Bounded optimistic retry for write units of work.
//!
//! Appends compute their version number inside the insert itself, but a
//! second process writing the same file can still win the race for that
//! number (a `UNIQUE` violation) or hold the write lock past the busy timeout.
//! Both are transient: the whole unit of work is re-run with exponential
//! backoff until the policy runs out.

use std::{future::Future, time::Duration};

use rusqlite::{ErrorCode, ffi};
use schemata_core::identity::EntityKind;
use serde::Deserialize;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
  /// Total attempts, including the first. Zero is treated as one.
  pub max_attempts:  u32,
  /// Delay before the second attempt; doubles for each attempt after that.
  pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
  fn default() -> Self { Self { max_attempts: 5, base_delay_ms: 10 } }
}

impl RetryPolicy {
  /// Delay after the given failed attempt (1-based).
  pub fn backoff(&self, attempt: u32) -> Duration {
    let factor = 1u64 << attempt.saturating_sub(1).min(10);
    Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
  }

  /// Run `op` until it succeeds, fails with a non-transient error, or the
  /// attempts are exhausted. `id` is the identity being appended to, or
  /// `None` for a create. Exhaustion is reported as
  /// [`schemata_core::Error::VersionConflict`] or
  /// [`schemata_core::Error::CreateConflict`] respectively.
  pub(crate) async fn run<T, F, Fut>(
    &self,
    kind: EntityKind,
    id: Option<i64>,
    mut op: F,
  ) -> Result<T>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, tokio_rusqlite::Error>>,
  {
    let max_attempts = self.max_attempts.max(1);
    let mut attempt = 0;
    loop {
      attempt += 1;
      match op().await {
        Ok(value) => return Ok(value),
        Err(e) if is_transient(&e) => {
          if attempt >= max_attempts {
            tracing::warn!(%kind, ?id, attempt, error = %e, "giving up on write");
            return Err(Error::Core(match id {
              Some(id) => schemata_core::Error::VersionConflict {
                kind,
                id,
                attempts: attempt,
              },
              None => schemata_core::Error::CreateConflict { kind, attempts: attempt },
            }));
          }
          let delay = self.backoff(attempt);
          tracing::warn!(
            %kind, ?id, attempt, delay_ms = delay.as_millis() as u64, error = %e,
            "transient write failure, retrying"
          );
          tokio::time::sleep(delay).await;
        }
        Err(e) => return Err(e.into()),
      }
    }
  }
}

/// A lost version race or a busy database.
pub(crate) fn is_transient(e: &tokio_rusqlite::Error) -> bool {
  match e {
    tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(f, _)) => {
      matches!(f.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
        || (f.code == ErrorCode::ConstraintViolation
          && f.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE)
    }
    _ => false,
  }
}
