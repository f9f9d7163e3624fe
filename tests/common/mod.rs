#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use migration::{Migrator, MigratorTrait};
use serde_json::Value;
use tower::ServiceExt;

use data_architect_api::config::Config;
use data_architect_api::state::AppState;

/// Fresh in-memory database with all migrations applied.
pub async fn test_state() -> AppState {
    test_state_with(|_| {}).await
}

/// Like [`test_state`], with the test config adjusted first.
pub async fn test_state_with(configure: impl FnOnce(&mut Config)) -> AppState {
    let db = sea_orm::Database::connect("sqlite::memory:")
        .await
        .unwrap_or_default();
    Migrator::up(&db, None).await.unwrap_or_default();

    let mut config = Config::for_tests("sqlite::memory:");
    configure(&mut config);
    AppState::new(db, config)
}

pub fn app_for(state: AppState) -> Router {
    data_architect_api::routes::router().with_state(state)
}

pub async fn test_app() -> Router {
    app_for(test_state().await)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap_or_default();

    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .unwrap_or_default();
    let body_str = String::from_utf8(body.to_vec()).unwrap_or_default();

    (status, body_str)
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<&Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap_or_default(),
        None => builder.body(Body::empty()).unwrap_or_default(),
    }
}

/// Test helper: send a GET request to the app and return (status, body).
pub async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    send(app, request("GET", uri, None, None)).await
}

pub async fn get_with_auth(app: &Router, uri: &str, token: &str) -> (StatusCode, String) {
    send(app, request("GET", uri, Some(token), None)).await
}

pub async fn post_json(app: &Router, uri: &str, body: &Value) -> (StatusCode, String) {
    send(app, request("POST", uri, None, Some(body))).await
}

pub async fn post_json_with_auth(
    app: &Router,
    uri: &str,
    body: &Value,
    token: &str,
) -> (StatusCode, String) {
    send(app, request("POST", uri, Some(token), Some(body))).await
}

pub async fn post_with_auth(app: &Router, uri: &str, token: &str) -> (StatusCode, String) {
    send(app, request("POST", uri, Some(token), None)).await
}

/// POST a raw body, for endpoints that take the body as text.
pub async fn post_raw_with_auth(
    app: &Router,
    uri: &str,
    body: &str,
    token: &str,
) -> (StatusCode, String) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap_or_default();
    send(app, request).await
}

pub async fn patch_json_with_auth(
    app: &Router,
    uri: &str,
    body: &Value,
    token: &str,
) -> (StatusCode, String) {
    send(app, request("PATCH", uri, Some(token), Some(body))).await
}

pub async fn put_json_with_auth(
    app: &Router,
    uri: &str,
    body: &Value,
    token: &str,
) -> (StatusCode, String) {
    send(app, request("PUT", uri, Some(token), Some(body))).await
}

pub async fn delete_with_auth(app: &Router, uri: &str, token: &str) -> (StatusCode, String) {
    send(app, request("DELETE", uri, Some(token), None)).await
}

pub fn json(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_default()
}

/// A registered account as seen by the tests.
pub struct TestUser {
    pub id: String,
    pub token: String,
    pub username: String,
}

/// Register `username` (email `<username>@example.com`, password `secret123`).
pub async fn register_user(app: &Router, username: &str) -> TestUser {
    let (status, body) = post_json(
        app,
        "/api/v1/auth/register",
        &serde_json::json!({
            "email": format!("{username}@example.com"),
            "username": username,
            "password": "secret123",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    let parsed = json(&body);
    TestUser {
        id: parsed["user"]["id"].as_str().unwrap_or_default().to_string(),
        token: parsed["token"].as_str().unwrap_or_default().to_string(),
        username: username.to_string(),
    }
}

/// `requester` invites `receiver` and `receiver` accepts. Returns the connection id.
pub async fn make_buddies(app: &Router, requester: &TestUser, receiver: &TestUser) -> String {
    let (status, body) = post_json_with_auth(
        app,
        "/api/v1/buddies/invite",
        &serde_json::json!({ "username": receiver.username }),
        &requester.token,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "invite failed: {body}");
    let connection_id = json(&body)["id"].as_str().unwrap_or_default().to_string();

    let (status, body) = post_with_auth(
        app,
        &format!("/api/v1/buddies/{connection_id}/accept"),
        &receiver.token,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "accept failed: {body}");
    connection_id
}
