//! HTTP server wiring for Schemata.
//!
//! Wraps the [`schemata_api`] router with request tracing and holds the
//! runtime configuration the binary deserialises at startup.

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use schemata_store_sqlite::{RetryPolicy, SqliteStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `SCHEMATA_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  pub store_path: PathBuf,
  /// Bounds for retrying writes that lost a version race.
  #[serde(default)]
  pub retry:      RetryPolicy,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router over `store`.
pub fn router(store: SqliteStore) -> Router {
  schemata_api::api_router(Arc::new(store)).layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use tower::ServiceExt as _;

  use super::*;

  fn parse(toml: &str) -> ServerConfig {
    config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn config_defaults() {
    let cfg = parse(r#"store_path = "~/schemata.db""#);
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert_eq!(cfg.store_path, PathBuf::from("~/schemata.db"));
    assert_eq!(cfg.retry, RetryPolicy::default());
  }

  #[test]
  fn config_overrides_retry() {
    let cfg = parse(
      r#"
        host = "0.0.0.0"
        port = 9000
        store_path = "/var/lib/schemata.db"

        [retry]
        max_attempts = 8
      "#,
    );
    assert_eq!(cfg.address(), "0.0.0.0:9000");
    assert_eq!(cfg.retry.max_attempts, 8);
    assert_eq!(cfg.retry.base_delay_ms, RetryPolicy::default().base_delay_ms);
  }

  #[tokio::test]
  async fn router_serves_api() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let req = Request::builder()
      .uri("/schemes")
      .body(Body::empty())
      .unwrap();
    let resp = router(store).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], br#"{"total":0,"items":[]}"#);
  }

  #[tokio::test]
  async fn unknown_route_is_404() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let req = Request::builder()
      .uri("/nope")
      .body(Body::empty())
      .unwrap();
    let resp = router(store).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
