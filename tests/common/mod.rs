#![allow(dead_code)]

use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use axum::Router;
use axum_test::TestServer;

use chat_api::config::Config;
use chat_api::store::MemoryStore;
use chat_api::AppState;

pub const TEST_SECRET: &str = "test-secret";

pub fn test_config() -> Config {
    Config {
        jwt_secret: TEST_SECRET.to_string(),
        token_ttl_secs: 3600,
        port: 0,
    }
}

/// Build real application state over a fresh in-memory store.
pub fn test_state() -> AppState {
    AppState::new(Arc::new(MemoryStore::new()), test_config())
}

/// Build the full router plus the state backing it.
pub fn test_app() -> (Router, AppState) {
    let state = test_state();
    let app = chat_api::routes::router().with_state(state.clone());
    (app, state)
}

/// Register a user and log them in. Returns `(user_id, access_token)`.
pub async fn register_and_login(server: &TestServer, username: &str) -> (i64, String) {
    let resp = server
        .post("/auth/register")
        .json(&serde_json::json!({ "username": username, "password": "pw" }))
        .await;
    resp.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = resp.json();
    let user_id = body["id"].as_i64().expect("user id");

    let resp = server
        .post("/auth/login")
        .json(&serde_json::json!({ "username": username, "password": "pw" }))
        .await;
    resp.assert_status(StatusCode::OK);
    let body: serde_json::Value = resp.json();
    let token = body["access_token"].as_str().expect("access_token").to_string();

    (user_id, token)
}

/// Shorthand for an authenticated GET.
pub async fn get_authed(server: &TestServer, path: &str, token: &str) -> axum_test::TestResponse {
    server
        .get(path)
        .add_header(AUTHORIZATION, format!("Bearer {token}"))
        .await
}
