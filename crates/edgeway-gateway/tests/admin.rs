//! Admin API tests: route CRUD over HTTP and its effect on proxying.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::*;
use serde_json::json;
use std::sync::Arc;

fn admin(method: &str, path: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app_with(config(vec![users_route()], 10), Arc::new(RecordingForwarder::default())).await;
    let resp = send(&app, admin("GET", "/health")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["routes"], 1);
}

#[tokio::test]
async fn lists_configured_routes() {
    let app = app_with(config(vec![users_route()], 10), Arc::new(RecordingForwarder::default())).await;
    let resp = send(&app, admin("GET", "/admin/routes")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["routes"][0]["id"], "users");
    assert_eq!(body["routes"][0]["strip_path_prefix"], true);
}

#[tokio::test]
async fn created_route_serves_traffic_immediately() {
    let forwarder = Arc::new(RecordingForwarder::default());
    let app = app_with(config(vec![], 10), forwarder.clone()).await;

    assert_eq!(
        send(&app, get("/orders/1", "10.0.0.1")).await.status(),
        StatusCode::NOT_FOUND
    );

    let route = json!({
        "id": "orders",
        "path_pattern": "/orders/*",
        "destination": "http://orders:8080",
        "priority": 3
    });
    let resp = send(&app, json_request("POST", "/admin/routes", &route)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert_eq!(body["id"], "orders");
    assert_eq!(body["enabled"], true);

    assert_eq!(send(&app, get("/orders/1", "10.0.0.1")).await.status(), StatusCode::OK);
    assert_eq!(forwarder.last().route.id, "orders");
}

#[tokio::test]
async fn duplicate_route_is_conflict() {
    let app = app_with(config(vec![users_route()], 10), Arc::new(RecordingForwarder::default())).await;
    let route = json!({
        "id": "users",
        "path_pattern": "/other/**",
        "destination": "http://other:80"
    });
    let resp = send(&app, json_request("POST", "/admin/routes", &route)).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], "ROUTE_ALREADY_EXISTS");
}

#[tokio::test]
async fn invalid_route_is_bad_request() {
    let app = app_with(config(vec![], 10), Arc::new(RecordingForwarder::default())).await;
    let route = json!({
        "id": "bad",
        "path_pattern": "/a/**/b",
        "destination": "http://a:80"
    });
    let resp = send(&app, json_request("POST", "/admin/routes", &route)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], "INVALID_ROUTE");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = app_with(config(vec![], 10), Arc::new(RecordingForwarder::default())).await;
    for method in ["GET", "DELETE"] {
        let resp = send(&app, admin(method, "/admin/routes/ghost")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = body_json(resp).await;
        assert_eq!(body["error"]["code"], "ROUTE_NOT_FOUND");
    }
    let resp = send(
        &app,
        json_request("PUT", "/admin/routes/ghost", &json!({ "priority": 1 })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_changes_destination_and_enabled_flag() {
    let forwarder = Arc::new(RecordingForwarder::default());
    let app = app_with(config(vec![users_route()], 10), forwarder.clone()).await;

    let patch = json!({ "destination": "http://users-v2:9000" });
    let resp = send(&app, json_request("PUT", "/admin/routes/users", &patch)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["destination"], "http://users-v2:9000");
    assert_eq!(body["path_pattern"], "/api/users/**");

    send(&app, get("/api/users/1", "10.0.0.1")).await;
    assert_eq!(forwarder.last().route.destination, "http://users-v2:9000");

    let disable = json!({ "enabled": false });
    send(&app, json_request("PUT", "/admin/routes/users", &disable)).await;
    assert_eq!(
        send(&app, get("/api/users/1", "10.0.0.1")).await.status(),
        StatusCode::NOT_FOUND
    );

    let resp = send(&app, admin("GET", "/admin/routes/users")).await;
    assert_eq!(body_json(resp).await["enabled"], false);
}

#[tokio::test]
async fn deleted_route_stops_matching() {
    let app = app_with(config(vec![users_route()], 10), Arc::new(RecordingForwarder::default())).await;

    let resp = send(&app, admin("DELETE", "/admin/routes/users")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["status"], "removed");

    assert_eq!(
        send(&app, get("/api/users/1", "10.0.0.1")).await.status(),
        StatusCode::NOT_FOUND
    );
    let resp = send(&app, admin("GET", "/admin/routes")).await;
    assert_eq!(body_json(resp).await["total"], 0);
}
