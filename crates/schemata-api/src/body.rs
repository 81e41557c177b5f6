//! Request bodies, query parameters, and response views shared by the
//! `/schemes` and `/configs` handlers.
//!
//! `data` travels as a [`RawValue`]: the exact bytes of the request's JSON
//! document are stored, and the stored bytes are returned unchanged.

use chrono::{DateTime, Utc};
use schemata_core::{
  store::SearchQuery,
  version::{ConfigVersion, NewVersion, SchemeVersion, Tags, tags},
};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::ApiError;

// ─── Requests ────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /schemes` and every `PUT`.
#[derive(Debug, Deserialize)]
pub struct VersionBody {
  #[serde(default)]
  pub tags: Vec<String>,
  pub data: Box<RawValue>,
}

impl From<VersionBody> for NewVersion {
  fn from(b: VersionBody) -> Self {
    NewVersion::new(tags(b.tags), b.data.get().as_bytes())
  }
}

/// JSON body accepted by `POST /configs`.
#[derive(Debug, Deserialize)]
pub struct NewConfigBody {
  pub scheme_id: i64,
  #[serde(default)]
  pub tags:      Vec<String>,
  pub data:      Box<RawValue>,
}

impl NewConfigBody {
  pub fn into_parts(self) -> (i64, NewVersion) {
    let version = VersionBody { tags: self.tags, data: self.data };
    (self.scheme_id, version.into())
  }
}

#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
  pub version:   Option<i64>,
  /// Comma-separated tags; all must be present.
  pub tags:      Option<String>,
  /// Only honoured by `GET /configs`.
  pub scheme_id: Option<i64>,
}

impl From<SearchParams> for SearchQuery {
  fn from(p: SearchParams) -> Self {
    SearchQuery {
      version:   p.version,
      tags:      p
        .tags
        .map(|s| {
          s.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
            .collect()
        })
        .unwrap_or_default(),
      scheme_id: p.scheme_id,
    }
  }
}

// ─── Responses ───────────────────────────────────────────────────────────────

fn raw_data(data: Vec<u8>) -> Result<Box<RawValue>, ApiError> {
  let text = String::from_utf8(data).map_err(|e| {
    ApiError::Encoding(serde::de::Error::custom(e))
  })?;
  Ok(RawValue::from_string(text)?)
}

#[derive(Debug, Serialize)]
pub struct SchemeView {
  pub id:         i64,
  pub version:    i64,
  pub tags:       Tags,
  pub data:       Box<RawValue>,
  pub created_at: DateTime<Utc>,
}

impl TryFrom<SchemeVersion> for SchemeView {
  type Error = ApiError;

  fn try_from(v: SchemeVersion) -> Result<Self, ApiError> {
    Ok(Self {
      id:         v.scheme_id,
      version:    v.version,
      tags:       v.tags,
      data:       raw_data(v.data)?,
      created_at: v.created_at,
    })
  }
}

#[derive(Debug, Serialize)]
pub struct ConfigView {
  pub id:         i64,
  pub scheme_id:  i64,
  pub version:    i64,
  pub tags:       Tags,
  pub data:       Box<RawValue>,
  pub created_at: DateTime<Utc>,
}

impl TryFrom<ConfigVersion> for ConfigView {
  type Error = ApiError;

  fn try_from(v: ConfigVersion) -> Result<Self, ApiError> {
    Ok(Self {
      id:         v.config_id,
      scheme_id:  v.scheme_id,
      version:    v.version,
      tags:       v.tags,
      data:       raw_data(v.data)?,
      created_at: v.created_at,
    })
  }
}

/// Envelope returned by the search endpoints.
#[derive(Debug, Serialize)]
pub struct SearchResponse<T> {
  pub total: usize,
  pub items: Vec<T>,
}

impl<T> SearchResponse<T> {
  pub fn new(items: Vec<T>) -> Self { Self { total: items.len(), items } }
}

/// Convert a list of snapshots into response views.
pub fn views<V, T>(items: Vec<V>) -> Result<Vec<T>, ApiError>
where
  T: TryFrom<V, Error = ApiError>,
{
  items.into_iter().map(T::try_from).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn body_keeps_data_bytes() {
    let body: VersionBody =
      serde_json::from_str(r#"{"tags":["b","a","b"],"data":{ "k" : [1,2] }}"#).unwrap();
    let input = NewVersion::from(body);
    assert_eq!(input.tags, tags(["a", "b"]));
    assert_eq!(input.data, br#"{ "k" : [1,2] }"#);
  }

  #[test]
  fn config_body_splits_scheme_from_version() {
    let body: NewConfigBody =
      serde_json::from_str(r#"{"scheme_id":3,"tags":["x"],"data":"s"}"#).unwrap();
    let (scheme_id, input) = body.into_parts();
    assert_eq!(scheme_id, 3);
    assert_eq!(input.data, br#""s""#);
  }

  #[test]
  fn search_params_split_tags() {
    let params = SearchParams {
      version: Some(2),
      tags: Some(" a, b ,,c".into()),
      scheme_id: None,
    };
    let query = SearchQuery::from(params);
    assert_eq!(query.version, Some(2));
    assert_eq!(query.tags, tags(["a", "b", "c"]));
  }

  #[test]
  fn view_rejects_non_json_data() {
    let v = SchemeVersion {
      scheme_id:  1,
      version:    1,
      tags:       tags(["a"]),
      data:       b"not json".to_vec(),
      created_at: Utc::now(),
    };
    assert!(SchemeView::try_from(v).is_err());
  }
}
