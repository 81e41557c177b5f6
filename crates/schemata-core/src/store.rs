//! The `RecordStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `schemata-store-sqlite`).
//! Higher layers (`schemata-api`, `schemata-server`) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  Classify, Error, Result,
  identity::{ConfigIdentity, SchemeIdentity},
  version::{ConfigVersion, NewVersion, SchemeVersion, Tags},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`RecordStore::search_schemes`] and
/// [`RecordStore::search_configs`].
///
/// Filters are evaluated against every ledger row of every live identity; for
/// each identity the newest matching row is returned. With no filters set
/// this is the current version of every live identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
  /// Exact version number.
  pub version:   Option<i64>,
  /// Every tag listed here must be present on the row (superset match).
  pub tags:      Tags,
  /// Restrict to records belonging to this scheme.
  pub scheme_id: Option<i64>,
}

impl SearchQuery {
  pub fn validate(&self) -> Result<()> {
    if let Some(v) = self.version
      && v < 1
    {
      return Err(Error::Validation(format!("version must be positive, got {v}")));
    }
    if let Some(id) = self.scheme_id
      && id < 1
    {
      return Err(Error::Validation(format!("scheme_id must be positive, got {id}")));
    }
    if self.tags.iter().any(|t| t.trim().is_empty()) {
      return Err(Error::Validation("tags could not contain blank tags".into()));
    }
    Ok(())
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Schemata store backend.
///
/// Identities are permanent; content is append-only. Every update appends a
/// new version and every delete only marks the identity dead, so the full
/// history of every record survives. Reads, updates, and searches only ever
/// see live identities, and a config is live only while its scheme is.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  // ── Schemes ───────────────────────────────────────────────────────────

  /// Create a scheme identity together with its first version.
  fn create_scheme(
    &self,
    input: NewVersion,
  ) -> impl Future<Output = Result<SchemeVersion, Self::Error>> + Send + '_;

  /// The current version of a live scheme.
  fn read_scheme(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<SchemeVersion, Self::Error>> + Send + '_;

  /// One historic version of a live scheme.
  fn read_scheme_version(
    &self,
    id: i64,
    version: i64,
  ) -> impl Future<Output = Result<SchemeVersion, Self::Error>> + Send + '_;

  /// Every version of a live scheme, oldest first.
  fn scheme_history(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Vec<SchemeVersion>, Self::Error>> + Send + '_;

  /// Append the next version to a live scheme.
  fn update_scheme(
    &self,
    id: i64,
    input: NewVersion,
  ) -> impl Future<Output = Result<SchemeVersion, Self::Error>> + Send + '_;

  /// Soft-delete a scheme. Deleting an already deleted scheme is `NotFound`.
  fn delete_scheme(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn search_schemes<'a>(
    &'a self,
    query: &'a SearchQuery,
  ) -> impl Future<Output = Result<Vec<SchemeVersion>, Self::Error>> + Send + 'a;

  /// The raw identity row, deleted or not. Returns `None` if it never existed.
  fn scheme_identity(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<SchemeIdentity>, Self::Error>> + Send + '_;

  // ── Configs ───────────────────────────────────────────────────────────

  /// Create a config identity bound to a live scheme, together with its first
  /// version. Fails with `InvalidReference` if the scheme is not live.
  fn create_config(
    &self,
    scheme_id: i64,
    input: NewVersion,
  ) -> impl Future<Output = Result<ConfigVersion, Self::Error>> + Send + '_;

  fn read_config(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<ConfigVersion, Self::Error>> + Send + '_;

  fn read_config_version(
    &self,
    id: i64,
    version: i64,
  ) -> impl Future<Output = Result<ConfigVersion, Self::Error>> + Send + '_;

  fn config_history(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Vec<ConfigVersion>, Self::Error>> + Send + '_;

  fn update_config(
    &self,
    id: i64,
    input: NewVersion,
  ) -> impl Future<Output = Result<ConfigVersion, Self::Error>> + Send + '_;

  fn delete_config(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn search_configs<'a>(
    &'a self,
    query: &'a SearchQuery,
  ) -> impl Future<Output = Result<Vec<ConfigVersion>, Self::Error>> + Send + 'a;

  fn config_identity(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<ConfigIdentity>, Self::Error>> + Send + '_;
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::version::tags;

  #[test]
  fn default_query_is_valid() {
    assert!(SearchQuery::default().validate().is_ok());
  }

  #[test]
  fn non_positive_version_rejected() {
    let q = SearchQuery { version: Some(0), ..Default::default() };
    assert!(matches!(q.validate(), Err(Error::Validation(_))));
  }

  #[test]
  fn blank_filter_tag_rejected() {
    let q = SearchQuery { tags: tags([""]), ..Default::default() };
    assert!(q.validate().is_err());
  }
}
