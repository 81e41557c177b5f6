//! Handlers for `/configs` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/configs` | Optional `?version=`, `?tags=a,b`, `?scheme_id=` |
//! | `POST`   | `/configs` | Body: [`NewConfigBody`]; 422 if the scheme is not live |
//! | `GET`    | `/configs/:id` | 404 if the config or its scheme is deleted |
//! | `PUT`    | `/configs/:id` | Body: [`VersionBody`](crate::body::VersionBody) |
//! | `DELETE` | `/configs/:id` | Soft delete; 204 |
//! | `GET`    | `/configs/:id/versions` | Full history, oldest first |
//! | `GET`    | `/configs/:id/versions/:version` | One historic version |

use std::sync::Arc;

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{JsonRejection, PathRejection, QueryRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use schemata_core::{
  store::{RecordStore, SearchQuery},
  version::NewVersion,
};

use crate::{
  body::{ConfigView, NewConfigBody, SearchParams, SearchResponse, VersionBody, views},
  error::ApiError,
};

// ─── Search ───────────────────────────────────────────────────────────────────

/// `GET /configs[?version=<n>][&tags=<a,b>][&scheme_id=<id>]`
pub async fn search<S: RecordStore>(
  State(store): State<Arc<S>>,
  params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchResponse<ConfigView>>, ApiError> {
  let Query(params) = params?;
  let query = SearchQuery::from(params);
  let found = store
    .search_configs(&query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(SearchResponse::new(views(found)?)))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /configs`: always creates a new config identity under `scheme_id`.
pub async fn create<S: RecordStore>(
  State(store): State<Arc<S>>,
  body: Result<Json<NewConfigBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(body) = body?;
  let (scheme_id, input) = body.into_parts();
  let created = store
    .create_config(scheme_id, input)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(ConfigView::try_from(created)?)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /configs/:id`
pub async fn get_one<S: RecordStore>(
  State(store): State<Arc<S>>,
  id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ConfigView>, ApiError> {
  let Path(id) = id?;
  let current = store.read_config(id).await.map_err(ApiError::store)?;
  Ok(Json(current.try_into()?))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /configs/:id`: the config stays bound to its scheme.
pub async fn update<S: RecordStore>(
  State(store): State<Arc<S>>,
  id: Result<Path<i64>, PathRejection>,
  body: Result<Json<VersionBody>, JsonRejection>,
) -> Result<Json<ConfigView>, ApiError> {
  let Path(id) = id?;
  let Json(body) = body?;
  let updated = store
    .update_config(id, NewVersion::from(body))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(updated.try_into()?))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /configs/:id`
pub async fn delete<S: RecordStore>(
  State(store): State<Arc<S>>,
  id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
  let Path(id) = id?;
  store.delete_config(id).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── History ──────────────────────────────────────────────────────────────────

/// `GET /configs/:id/versions`
pub async fn history<S: RecordStore>(
  State(store): State<Arc<S>>,
  id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<ConfigView>>, ApiError> {
  let Path(id) = id?;
  let versions = store.config_history(id).await.map_err(ApiError::store)?;
  Ok(Json(views(versions)?))
}

/// `GET /configs/:id/versions/:version`
pub async fn get_version<S: RecordStore>(
  State(store): State<Arc<S>>,
  path: Result<Path<(i64, i64)>, PathRejection>,
) -> Result<Json<ConfigView>, ApiError> {
  let Path((id, version)) = path?;
  let snapshot = store
    .read_config_version(id, version)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(snapshot.try_into()?))
}
