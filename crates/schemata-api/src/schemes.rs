//! Handlers for `/schemes` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/schemes` | Optional `?version=` and `?tags=a,b` |
//! | `POST`   | `/schemes` | Body: [`VersionBody`]; returns 201 + version 1 |
//! | `GET`    | `/schemes/:id` | Current version; 404 if missing or deleted |
//! | `PUT`    | `/schemes/:id` | Body: [`VersionBody`]; appends the next version |
//! | `DELETE` | `/schemes/:id` | Soft delete; 204 |
//! | `GET`    | `/schemes/:id/versions` | Full history, oldest first |
//! | `GET`    | `/schemes/:id/versions/:version` | One historic version |

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
  body::{SchemeView, SearchParams, SearchResponse, VersionBody, views},
  error::ApiError,
};

// ─── Search ───────────────────────────────────────────────────────────────────

/// `GET /schemes[?version=<n>][&tags=<a,b>]`
pub async fn search<S: RecordStore>(
  State(store): State<Arc<S>>,
  params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchResponse<SchemeView>>, ApiError> {
  let Query(params) = params?;
  let query = SearchQuery { scheme_id: None, ..SearchQuery::from(params) };
  let found = store
    .search_schemes(&query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(SearchResponse::new(views(found)?)))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /schemes`
pub async fn create<S: RecordStore>(
  State(store): State<Arc<S>>,
  body: Result<Json<VersionBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(body) = body?;
  let created = store
    .create_scheme(NewVersion::from(body))
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(SchemeView::try_from(created)?)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /schemes/:id`
pub async fn get_one<S: RecordStore>(
  State(store): State<Arc<S>>,
  id: Result<Path<i64>, PathRejection>,
) -> Result<Json<SchemeView>, ApiError> {
  let Path(id) = id?;
  let current = store.read_scheme(id).await.map_err(ApiError::store)?;
  Ok(Json(current.try_into()?))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /schemes/:id`
pub async fn update<S: RecordStore>(
  State(store): State<Arc<S>>,
  id: Result<Path<i64>, PathRejection>,
  body: Result<Json<VersionBody>, JsonRejection>,
) -> Result<Json<SchemeView>, ApiError> {
  let Path(id) = id?;
  let Json(body) = body?;
  let updated = store
    .update_scheme(id, NewVersion::from(body))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(updated.try_into()?))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /schemes/:id`
pub async fn delete<S: RecordStore>(
  State(store): State<Arc<S>>,
  id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
  let Path(id) = id?;
  store.delete_scheme(id).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── History ──────────────────────────────────────────────────────────────────

/// `GET /schemes/:id/versions`
pub async fn history<S: RecordStore>(
  State(store): State<Arc<S>>,
  id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<SchemeView>>, ApiError> {
  let Path(id) = id?;
  let versions = store.scheme_history(id).await.map_err(ApiError::store)?;
  Ok(Json(views(versions)?))
}

/// `GET /schemes/:id/versions/:version`
pub async fn get_version<S: RecordStore>(
  State(store): State<Arc<S>>,
  path: Result<Path<(i64, i64)>, PathRejection>,
) -> Result<Json<SchemeView>, ApiError> {
  let Path((id, version)) = path?;
  let snapshot = store
    .read_scheme_version(id, version)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(snapshot.try_into()?))
}
