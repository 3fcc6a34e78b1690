//! Shared helpers for the management API integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use wifinet_billing::{RouterGateway, StaticGateway};
use wifinet_core::AppConfig;
use wifinet_management::{management_router, ManagementState};
use wifinet_store::{DocumentStore, MemoryStore, Repository};

/// Build the management app over `backend` with the given router gateway.
pub async fn build_app_with(
    backend: Arc<dyn DocumentStore>,
    gateway: Arc<dyn RouterGateway>,
) -> (Router, ManagementState) {
    let repo = Arc::new(Repository::open(backend).await.expect("repository should open"));
    let state = ManagementState::new(repo, &AppConfig::default(), gateway);
    (management_router(state.clone()), state)
}

/// App over the default in-memory dataset with an always-succeeding gateway.
pub async fn build_test_app() -> Router {
    build_app_with(
        Arc::new(MemoryStore::default()),
        Arc::new(StaticGateway::succeeding()),
    )
    .await
    .0
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<serde_json::Value>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.clone()
        .oneshot(builder.body(body).expect("request should build"))
        .await
        .expect("router is infallible")
}

pub async fn get(app: &Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: &Router, uri: &str, token: &str) -> Response {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(app: &Router, uri: &str, token: &str, body: serde_json::Value) -> Response {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put_json_auth(app: &Router, uri: &str, token: &str, body: serde_json::Value) -> Response {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: &Router, uri: &str, token: &str) -> Response {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

/// Log in and return the bearer token.
pub async fn login(app: &Router, username: &str, password: &str) -> String {
    let response = post_json(
        app,
        "/api/v1/auth/login",
        serde_json::json!({ "username": username, "password": password }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK, "login as {username} should succeed");
    body_json(response).await["token"]
        .as_str()
        .expect("token should be a string")
        .to_string()
}

pub async fn admin_token(app: &Router) -> String {
    login(app, "admin", "admin123").await
}
