#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use plantdesk::api;
use plantdesk::config::Config;
use plantdesk::db::Store;
use plantdesk::state::SharedState;

/// Password seeded for the admin account by the initial migration.
pub const ADMIN_PASSWORD: &str = "password";

/// Build an app against a fresh in-memory database. A single pooled
/// connection keeps the in-memory database alive across requests.
pub async fn spawn_app() -> (Router, Arc<SharedState>) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.server.secure_cookies = false;

    let store = Store::with_pool_options(&config.general.database_path, 1, 1)
        .await
        .expect("Failed to open in-memory store");
    let shared =
        Arc::new(SharedState::with_store(config, store).expect("Failed to build shared state"));
    let state = api::create_app_state(shared.clone())
        .await
        .expect("Failed to create app state");

    (api::router(state).await, shared)
}

/// Fire one request and return (status, headers, parsed JSON body).
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, HeaderMap, Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, headers, body)
}

/// Same as `send` but with a raw Cookie header instead of a bearer token.
pub async fn send_with_cookie(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: &str,
) -> (StatusCode, HeaderMap, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("Cookie", cookie)
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, headers, body)
}

/// Log in and return the access token; panics on failure.
pub async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, _, body) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"username": username, "password": password})),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["data"]["access_token"].as_str().unwrap().to_string()
}

/// Log in and return (access token, rotation cookie pair).
pub async fn login_with_cookie(app: &Router, username: &str, password: &str) -> (String, String) {
    let (status, headers, body) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"username": username, "password": password})),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    let access = body["data"]["access_token"].as_str().unwrap().to_string();
    let cookie = extract_rotation_cookie(&headers).expect("login did not set rotation cookie");

    (access, cookie)
}

/// Pull the `refresh_token=...` pair out of a Set-Cookie header.
pub fn extract_rotation_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("refresh_token="))
        .map(|v| v.split(';').next().unwrap().to_string())
}

/// Create an active user through the API and return its id.
pub async fn create_user(app: &Router, token: &str, username: &str, password: &str) -> i32 {
    let (status, _, body) = send(
        app,
        "POST",
        "/api/admin/master/user",
        Some(token),
        Some(json!({
            "username": username,
            "display_name": username,
            "email": format!("{username}@example.com"),
            "password": password,
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "create user failed: {body}");
    i32::try_from(body["data"]["id"].as_i64().unwrap()).unwrap()
}
