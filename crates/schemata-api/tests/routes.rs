//! End-to-end router tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use schemata_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  schemata_api::api_router(Arc::new(store))
}

async fn send(
  app: &Router,
  method: &str,
  uri: &str,
  body: Option<&str>,
) -> (StatusCode, String) {
  let mut builder = Request::builder().method(method).uri(uri);
  if body.is_some() {
    builder = builder.header(header::CONTENT_TYPE, "application/json");
  }
  let req = builder
    .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
    .unwrap();
  let resp = app.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn send_json(
  app: &Router,
  method: &str,
  uri: &str,
  body: Option<&str>,
) -> (StatusCode, Value) {
  let (status, text) = send(app, method, uri, body).await;
  let value = if text.is_empty() { Value::Null } else { serde_json::from_str(&text).unwrap() };
  (status, value)
}

async fn create_scheme(app: &Router, tags: &[&str]) -> i64 {
  let body = json!({ "tags": tags, "data": { "type": "object" } }).to_string();
  let (status, created) = send_json(app, "POST", "/schemes", Some(&body)).await;
  assert_eq!(status, StatusCode::CREATED);
  created["id"].as_i64().unwrap()
}

async fn create_config(app: &Router, scheme_id: i64, tags: &[&str]) -> i64 {
  let body = json!({ "scheme_id": scheme_id, "tags": tags, "data": { "port": 80 } }).to_string();
  let (status, created) = send_json(app, "POST", "/configs", Some(&body)).await;
  assert_eq!(status, StatusCode::CREATED);
  created["id"].as_i64().unwrap()
}

// ── Schemes ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_then_get_scheme() {
  let app = app().await;
  let (status, created) = send_json(
    &app,
    "POST",
    "/schemes",
    Some(r#"{"tags":["b","a"],"data":{"hello":"world"}}"#),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created["version"], 1);
  assert_eq!(created["tags"], json!(["a", "b"]));
  assert_eq!(created["data"], json!({ "hello": "world" }));

  let id = created["id"].as_i64().unwrap();
  let (status, read) = send_json(&app, "GET", &format!("/schemes/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(read, created);
}

#[tokio::test]
async fn data_bytes_are_returned_verbatim() {
  let app = app().await;
  let (status, text) = send(
    &app,
    "POST",
    "/schemes",
    Some(r#"{"tags":["a"],"data":{ "z" : 1.50,  "a" : [ ] }}"#),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert!(text.contains(r#""data":{ "z" : 1.50,  "a" : [ ] }"#), "{text}");
}

#[tokio::test]
async fn put_appends_versions_and_history_lists_them() {
  let app = app().await;
  let id = create_scheme(&app, &["a"]).await;

  for n in 2..=3 {
    let body = json!({ "tags": ["a"], "data": { "n": n } }).to_string();
    let (status, updated) =
      send_json(&app, "PUT", &format!("/schemes/{id}"), Some(&body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["version"], n);
  }

  let (status, history) =
    send_json(&app, "GET", &format!("/schemes/{id}/versions"), None).await;
  assert_eq!(status, StatusCode::OK);
  let versions: Vec<i64> = history
    .as_array()
    .unwrap()
    .iter()
    .map(|v| v["version"].as_i64().unwrap())
    .collect();
  assert_eq!(versions, vec![1, 2, 3]);

  let (status, v2) =
    send_json(&app, "GET", &format!("/schemes/{id}/versions/2"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(v2["data"], json!({ "n": 2 }));

  let (status, _) =
    send_json(&app, "GET", &format!("/schemes/{id}/versions/4"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_scheme_returns_204_then_404() {
  let app = app().await;
  let id = create_scheme(&app, &["a"]).await;

  let (status, _) = send(&app, "DELETE", &format!("/schemes/{id}"), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (status, body) = send_json(&app, "GET", &format!("/schemes/{id}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["error"], format!("scheme {id} not found"));

  let (status, _) = send(&app, "DELETE", &format!("/schemes/{id}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_bodies_are_400() {
  let app = app().await;

  for body in [
    r#"{"tags":[],"data":{}}"#,
    r#"{"data":{}}"#,
    r#"{"tags":["  "],"data":{}}"#,
    r#"{"tags":["a"]}"#,
    r#"{"tags":["a"],"data":"#,
  ] {
    let (status, value) = send_json(&app, "POST", "/schemes", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert!(value["error"].is_string(), "{body}");
  }
}

#[tokio::test]
async fn malformed_path_ids_get_json_errors() {
  let app = app().await;

  for (method, uri) in [
    ("GET", "/schemes/abc"),
    ("DELETE", "/schemes/1.5"),
    ("GET", "/schemes/1/versions/latest"),
    ("GET", "/configs/abc"),
    ("GET", "/configs/abc/versions"),
  ] {
    let (status, body) = send_json(&app, method, uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{method} {uri}");
    assert!(body["error"].is_string(), "{method} {uri}: {body}");
  }

  let (status, body) = send_json(
    &app,
    "PUT",
    "/configs/abc",
    Some(r#"{"tags":["a"],"data":{}}"#),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("abc"));
}

#[tokio::test]
async fn search_schemes_by_tag_shrinks_on_delete() {
  let app = app().await;
  let ids = [
    create_scheme(&app, &["a", "b", "c"]).await,
    create_scheme(&app, &["b", "c", "d"]).await,
    create_scheme(&app, &["c", "d", "e"]).await,
  ];

  let (status, found) = send_json(&app, "GET", "/schemes?tags=c", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(found["total"], 3);
  assert_eq!(found["items"].as_array().unwrap().len(), 3);

  let (_, found) = send_json(&app, "GET", "/schemes?tags=d,b", None).await;
  assert_eq!(found["total"], 1);
  assert_eq!(found["items"][0]["id"], ids[1]);

  for (i, id) in ids.iter().enumerate() {
    send(&app, "DELETE", &format!("/schemes/{id}"), None).await;
    let (_, found) = send_json(&app, "GET", "/schemes?tags=c", None).await;
    assert_eq!(found["total"], (ids.len() - 1 - i) as i64);
  }
}

#[tokio::test]
async fn search_with_bad_version_is_400() {
  let app = app().await;
  let (status, _) = send_json(&app, "GET", "/schemes?version=0", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  let (status, _) = send_json(&app, "GET", "/schemes?version=abc", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── Configs ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn config_against_missing_scheme_is_422() {
  let app = app().await;
  let (status, body) = send_json(
    &app,
    "POST",
    "/configs",
    Some(r#"{"scheme_id":77,"tags":["a"],"data":{}}"#),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert!(body["error"].as_str().unwrap().contains("77"));

  let (_, found) = send_json(&app, "GET", "/configs", None).await;
  assert_eq!(found["total"], 0);
}

#[tokio::test]
async fn config_lifecycle() {
  let app = app().await;
  let scheme_id = create_scheme(&app, &["s"]).await;
  let id = create_config(&app, scheme_id, &["a", "b", "c"]).await;

  let (status, read) = send_json(&app, "GET", &format!("/configs/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(read["scheme_id"], scheme_id);
  assert_eq!(read["version"], 1);
  assert_eq!(read["data"], json!({ "port": 80 }));

  let (status, updated) = send_json(
    &app,
    "PUT",
    &format!("/configs/{id}"),
    Some(r#"{"tags":["a"],"data":{"port":8080}}"#),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(updated["version"], 2);
  assert_eq!(updated["scheme_id"], scheme_id);

  let (status, v1) =
    send_json(&app, "GET", &format!("/configs/{id}/versions/1"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(v1["data"], json!({ "port": 80 }));

  let (status, _) = send(&app, "DELETE", &format!("/configs/{id}"), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) = send(&app, "GET", &format!("/configs/{id}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn search_configs_shrinks_on_delete() {
  let app = app().await;
  let scheme_id = create_scheme(&app, &["s"]).await;
  let ids = [
    create_config(&app, scheme_id, &["a", "b", "c"]).await,
    create_config(&app, scheme_id, &["b", "c", "d"]).await,
    create_config(&app, scheme_id, &["c", "d", "e"]).await,
  ];

  let (_, found) = send_json(&app, "GET", "/configs?tags=c", None).await;
  assert_eq!(found["total"], 3);

  for (i, id) in ids.iter().enumerate() {
    send(&app, "DELETE", &format!("/configs/{id}"), None).await;
    let (_, found) = send_json(&app, "GET", "/configs?tags=c", None).await;
    assert_eq!(found["total"], (ids.len() - 1 - i) as i64);
  }
}

#[tokio::test]
async fn deleting_scheme_hides_its_configs() {
  let app = app().await;
  let scheme_id = create_scheme(&app, &["s"]).await;
  let other_id = create_scheme(&app, &["s"]).await;
  let hidden = create_config(&app, scheme_id, &["x"]).await;
  let kept = create_config(&app, other_id, &["x"]).await;

  send(&app, "DELETE", &format!("/schemes/{scheme_id}"), None).await;

  let (status, _) = send(&app, "GET", &format!("/configs/{hidden}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (_, found) = send_json(&app, "GET", "/configs?tags=x", None).await;
  assert_eq!(found["total"], 1);
  assert_eq!(found["items"][0]["id"], kept);

  let (_, scoped) =
    send_json(&app, "GET", &format!("/configs?scheme_id={other_id}"), None).await;
  assert_eq!(scoped["total"], 1);
}
