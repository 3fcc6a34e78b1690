//! Router management and user provisioning over HTTP.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{admin_token, body_json, build_app_with, delete_auth, get_auth, post_json_auth};
use serde_json::json;
use wifinet_billing::StaticGateway;
use wifinet_store::MemoryStore;

async fn app(gateway: StaticGateway) -> axum::Router {
    build_app_with(Arc::new(MemoryStore::default()), Arc::new(gateway))
        .await
        .0
}

#[tokio::test]
async fn test_sync_creates_single_router_user() {
    let app = app(StaticGateway::succeeding()).await;
    let admin = admin_token(&app).await;

    let response = post_json_auth(&app, "/api/v1/admin/routers/RTR001/sync/CUST001", &admin, json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let user = body_json(response).await;
    assert_eq!(user["username"], "CUST001");
    assert_eq!(user["routerId"], "RTR001");
    assert_eq!(user["enabled"], true);

    // Syncing again refreshes the same record.
    let again = body_json(
        post_json_auth(&app, "/api/v1/admin/routers/RTR001/sync/CUST001", &admin, json!({})).await,
    )
    .await;
    assert_eq!(again["id"], user["id"]);

    let users = body_json(get_auth(&app, "/api/v1/admin/mikrotik-users", &admin).await).await;
    assert_eq!(users.as_array().unwrap().len(), 1);

    let statuses = body_json(get_auth(&app, "/api/v1/admin/routers/sync-status", &admin).await).await;
    assert_eq!(statuses[0]["customerId"], "CUST001");
    assert_eq!(statuses[0]["state"], "success");

    let id = user["id"].as_str().unwrap();
    let response = delete_auth(&app, &format!("/api/v1/admin/mikrotik-users/{id}"), &admin).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let users = body_json(get_auth(&app, "/api/v1/admin/mikrotik-users", &admin).await).await;
    assert!(users.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_sync_writes_nothing() {
    let app = app(StaticGateway::failing()).await;
    let admin = admin_token(&app).await;

    let response = post_json_auth(&app, "/api/v1/admin/routers/RTR001/sync/CUST002", &admin, json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["error"], "provisioning_failed");

    let users = body_json(get_auth(&app, "/api/v1/admin/mikrotik-users", &admin).await).await;
    assert!(users.as_array().unwrap().is_empty());

    let statuses = body_json(get_auth(&app, "/api/v1/admin/routers/sync-status", &admin).await).await;
    assert_eq!(statuses[0]["state"], "error");

    let response = post_json_auth(&app, "/api/v1/admin/routers/RTR001/sync/NOPE01", &admin, json!({})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_connection_test_updates_status() {
    let app = app(StaticGateway::failing()).await;
    let admin = admin_token(&app).await;

    let router = body_json(post_json_auth(&app, "/api/v1/admin/routers/RTR001/test", &admin, json!({})).await).await;
    assert_eq!(router["status"], "Offline");

    let response = post_json_auth(
        &app,
        "/api/v1/admin/routers",
        &admin,
        json!({ "name": "Tower B", "host": "10.0.0.2", "username": "admin" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["port"], 8728);
    assert_eq!(created["status"], "Offline");
    assert!(created.get("password").is_none());

    let online = app_with_router_test(StaticGateway::succeeding()).await;
    assert_eq!(online, "Online");
}

async fn app_with_router_test(gateway: StaticGateway) -> String {
    let app = app(gateway).await;
    let admin = admin_token(&app).await;
    let router = body_json(post_json_auth(&app, "/api/v1/admin/routers/RTR001/test", &admin, json!({})).await).await;
    router["status"].as_str().unwrap().to_string()
}
