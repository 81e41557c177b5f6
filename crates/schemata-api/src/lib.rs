//! JSON REST API for Schemata.
//!
//! Exposes an axum [`Router`] backed by any [`schemata_core::store::RecordStore`].
//! TLS and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(schemata_api::api_router(store.clone()))
//! ```

pub mod body;
pub mod configs;
pub mod error;
pub mod schemes;

use std::sync::Arc;

use axum::{Router, routing::get};
use schemata_core::store::RecordStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: RecordStore + 'static,
{
  Router::new()
    // Schemes
    .route("/schemes", get(schemes::search::<S>).post(schemes::create::<S>))
    .route(
      "/schemes/{id}",
      get(schemes::get_one::<S>)
        .put(schemes::update::<S>)
        .delete(schemes::delete::<S>),
    )
    .route("/schemes/{id}/versions", get(schemes::history::<S>))
    .route("/schemes/{id}/versions/{version}", get(schemes::get_version::<S>))
    // Configs
    .route("/configs", get(configs::search::<S>).post(configs::create::<S>))
    .route(
      "/configs/{id}",
      get(configs::get_one::<S>)
        .put(configs::update::<S>)
        .delete(configs::delete::<S>),
    )
    .route("/configs/{id}/versions", get(configs::history::<S>))
    .route("/configs/{id}/versions/{version}", get(configs::get_version::<S>))
    .with_state(store)
}
