//! End-to-end request pipeline tests: correlation id, auth, rate limiting,
//! routing, transformation and forwarding through the axum app.

mod common;

use axum::body::Body;
use axum::http::StatusCode;
use common::*;
use edgeway_gateway::jwt::JwtVerifier;
use edgeway_kernel::{JwtAlgorithm, KeyStrategy, RateLimitAlgorithmKind, RequestTransformation, Route};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

fn token(subject: &str) -> String {
    JwtVerifier::new(JWT_SECRET, JwtAlgorithm::HS512, Duration::from_secs(600))
        .issue(subject)
        .unwrap()
}

#[tokio::test]
async fn matched_request_is_forwarded_with_stripped_path() {
    let forwarder = Arc::new(RecordingForwarder::default());
    let app = app_with(config(vec![users_route()], 100), forwarder.clone()).await;

    let resp = send(&app, get("/api/users/42?expand=true", "10.0.0.1")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let seen = forwarder.last();
    assert_eq!(seen.route.id, "users");
    assert_eq!(seen.path, "/42");
    assert_eq!(seen.query.as_deref(), Some("expand=true"));

    let body = body_json(resp).await;
    assert_eq!(body["path"], "/42");
}

#[tokio::test]
async fn correlation_id_is_echoed_or_generated() {
    let forwarder = Arc::new(RecordingForwarder::default());
    let app = app_with(config(vec![users_route()], 100), forwarder.clone()).await;

    let req = request("GET", "/api/users/1", "10.0.0.1")
        .header("x-correlation-id", "abc")
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, req).await;
    assert_eq!(header(&resp, "x-correlation-id"), Some("abc"));
    assert_eq!(forwarder.last().correlation_id, "abc");
    assert_eq!(forwarder.last().headers["x-correlation-id"], "abc");

    let resp = send(&app, get("/api/users/1", "10.0.0.1")).await;
    let generated = header(&resp, "x-correlation-id").unwrap();
    assert!(Uuid::parse_str(generated).is_ok());
}

#[tokio::test]
async fn unmatched_path_is_404_with_ambient_headers() {
    let forwarder = Arc::new(RecordingForwarder::default());
    let app = app_with(config(vec![users_route()], 100), forwarder.clone()).await;

    let resp = send(&app, get("/api/orders/1", "10.0.0.1")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(header(&resp, "x-correlation-id").is_some());
    assert_eq!(header(&resp, "x-ratelimit-remaining"), Some("99"));
    assert_eq!(forwarder.count(), 0);
}

#[tokio::test]
async fn requests_beyond_capacity_get_429() {
    let forwarder = Arc::new(RecordingForwarder::default());
    let app = app_with(config(vec![users_route()], 2), forwarder.clone()).await;

    for expected_remaining in ["1", "0"] {
        let resp = send(&app, get("/api/users/1", "10.0.0.1")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(header(&resp, "x-ratelimit-remaining"), Some(expected_remaining));
        let reset_ms: u64 = header(&resp, "x-ratelimit-reset").unwrap().parse().unwrap();
        assert!(reset_ms > 0 && reset_ms <= 3_600_000);
    }

    let resp = send(&app, get("/api/users/1", "10.0.0.1")).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(header(&resp, "x-ratelimit-remaining"), Some("0"));
    let retry_after: u64 = header(&resp, "retry-after").unwrap().parse().unwrap();
    assert!(retry_after > 0 && retry_after <= 3_600);
    assert!(header(&resp, "x-correlation-id").is_some());
    let body = body_json(resp).await;
    assert!(body["error"].as_str().unwrap().starts_with("Rate limit exceeded"));

    assert_eq!(forwarder.count(), 2);
}

#[tokio::test]
async fn clients_are_limited_independently_by_ip() {
    let forwarder = Arc::new(RecordingForwarder::default());
    let app = app_with(config(vec![users_route()], 1), forwarder).await;

    assert_eq!(send(&app, get("/api/users/1", "10.0.0.1")).await.status(), StatusCode::OK);
    assert_eq!(
        send(&app, get("/api/users/1", "10.0.0.1")).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(send(&app, get("/api/users/1", "10.0.0.2")).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn api_key_strategy_shares_budget_across_addresses() {
    let mut cfg = config(vec![users_route()], 1);
    cfg.rate_limit.key_strategy = KeyStrategy::ApiKey;
    let app = app_with(cfg, Arc::new(RecordingForwarder::default())).await;

    let with_key = |peer: &str| {
        request("GET", "/api/users/1", peer)
            .header("x-api-key", "team-a")
            .body(Body::empty())
            .unwrap()
    };
    assert_eq!(send(&app, with_key("10.0.0.1")).await.status(), StatusCode::OK);
    assert_eq!(
        send(&app, with_key("10.0.0.2")).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
    // No key: falls back to the peer address, which has its own budget.
    assert_eq!(send(&app, get("/api/users/1", "10.0.0.2")).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn leaky_bucket_is_selectable() {
    let mut cfg = config(vec![users_route()], 100);
    cfg.rate_limit.algorithm = RateLimitAlgorithmKind::LeakyBucket;
    cfg.rate_limit.leaky_bucket.capacity = 1;
    cfg.rate_limit.leaky_bucket.leak_rate = 1;
    let app = app_with(cfg, Arc::new(RecordingForwarder::default())).await;

    assert_eq!(send(&app, get("/api/users/1", "10.0.0.1")).await.status(), StatusCode::OK);
    assert_eq!(
        send(&app, get("/api/users/1", "10.0.0.1")).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[tokio::test]
async fn unavailable_store_fails_open() {
    let forwarder = Arc::new(RecordingForwarder::default());
    let app = app_with_store(
        config(vec![users_route()], 1),
        Arc::new(DownStore),
        forwarder.clone(),
    )
    .await;

    for _ in 0..5 {
        let resp = send(&app, get("/api/users/1", "10.0.0.1")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(header(&resp, "x-ratelimit-remaining"), Some("1"));
        assert_eq!(header(&resp, "x-ratelimit-reset"), Some("0"));
    }
    assert_eq!(forwarder.count(), 5);
}

#[tokio::test]
async fn disabled_rate_limiting_sets_no_quota_headers() {
    let mut cfg = config(vec![users_route()], 1);
    cfg.rate_limit.enabled = false;
    let app = app_with(cfg, Arc::new(RecordingForwarder::default())).await;

    for _ in 0..3 {
        let resp = send(&app, get("/api/users/1", "10.0.0.1")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(header(&resp, "x-ratelimit-remaining").is_none());
    }
}

#[tokio::test]
async fn valid_bearer_token_is_accepted() {
    let forwarder = Arc::new(RecordingForwarder::default());
    let app = app_with(config(vec![users_route()], 100), forwarder.clone()).await;

    let req = request("GET", "/api/users/1", "10.0.0.1")
        .header("authorization", format!("Bearer {}", token("alice")))
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, req).await.status(), StatusCode::OK);
    assert_eq!(forwarder.count(), 1);
}

#[tokio::test]
async fn bad_credentials_are_rejected_before_consuming_quota() {
    let forwarder = Arc::new(RecordingForwarder::default());
    let app = app_with(config(vec![users_route()], 1), forwarder.clone()).await;

    for auth in ["Bearer not-a-jwt", "Basic dXNlcjpwYXNz"] {
        let req = request("GET", "/api/users/1", "10.0.0.1")
            .header("authorization", auth)
            .body(Body::empty())
            .unwrap();
        let resp = send(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(header(&resp, "x-correlation-id").is_some());
        assert!(header(&resp, "x-ratelimit-remaining").is_none());
    }

    // The single unit of quota is still available.
    assert_eq!(send(&app, get("/api/users/1", "10.0.0.1")).await.status(), StatusCode::OK);
    assert_eq!(forwarder.count(), 1);
}

#[tokio::test]
async fn token_signed_with_another_secret_is_rejected() {
    let app = app_with(config(vec![users_route()], 100), Arc::new(RecordingForwarder::default())).await;
    let forged = JwtVerifier::new("some-other-secret", JwtAlgorithm::HS512, Duration::from_secs(600))
        .issue("mallory")
        .unwrap();
    let req = request("GET", "/api/users/1", "10.0.0.1")
        .header("authorization", format!("Bearer {forged}"))
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, req).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn priority_decides_between_overlapping_routes() {
    let forwarder = Arc::new(RecordingForwarder::default());
    let routes = vec![
        Route::new("catch-all", "/api/**", "http://legacy:80").with_priority(100),
        Route::new("users", "/api/users/**", "http://users:80").with_priority(1),
        Route::new("users-shadow", "/api/users/**", "http://shadow:80").with_priority(1),
    ];
    let app = app_with(config(routes, 100), forwarder.clone()).await;

    send(&app, get("/api/users/7", "10.0.0.1")).await;
    assert_eq!(forwarder.last().route.id, "users");
    send(&app, get("/api/orders/7", "10.0.0.1")).await;
    assert_eq!(forwarder.last().route.id, "catch-all");
}

#[tokio::test]
async fn transformation_rewrites_forwarded_request() {
    let forwarder = Arc::new(RecordingForwarder::default());
    let route = users_route().with_transformation(RequestTransformation {
        header_additions: Some(HashMap::from([("X-Gateway".to_string(), "edgeway".to_string())])),
        header_removals: Some(vec!["Cookie".to_string()]),
        path_prefix: Some("/v2".to_string()),
    });
    let app = app_with(config(vec![route], 100), forwarder.clone()).await;

    let req = request("GET", "/api/users/42", "10.0.0.1")
        .header("cookie", "session=secret")
        .header("accept", "application/json")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, req).await.status(), StatusCode::OK);

    let seen = forwarder.last();
    assert_eq!(seen.path, "/v2/42");
    assert!(!seen.headers.contains_key("cookie"));
    assert_eq!(seen.headers["x-gateway"], "edgeway");
    assert_eq!(seen.headers["accept"], "application/json");
}

#[tokio::test]
async fn upstream_timeout_maps_to_504() {
    let route = users_route().with_timeout_ms(50);
    let app = app_with(config(vec![route], 100), Arc::new(TimingOutForwarder)).await;

    let resp = send(&app, get("/api/users/1", "10.0.0.1")).await;
    assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
    assert!(header(&resp, "x-correlation-id").is_some());
}

#[tokio::test]
async fn unsupported_method_is_405() {
    let app = app_with(config(vec![users_route()], 100), Arc::new(RecordingForwarder::default())).await;
    let req = request("TRACE", "/api/users/1", "10.0.0.1")
        .header("x-correlation-id", "trace-1")
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, req).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(header(&resp, "x-correlation-id"), Some("trace-1"));

    let req = request("TRACE", "/api/users/1", "10.0.0.1")
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, req).await;
    let generated = header(&resp, "x-correlation-id").unwrap();
    assert!(Uuid::parse_str(generated).is_ok());
}

#[tokio::test]
async fn oversized_body_is_413() {
    let forwarder = Arc::new(RecordingForwarder::default());
    let mut cfg = config(vec![users_route()], 100);
    cfg.server.body_limit_bytes = 8;
    let app = app_with(cfg, forwarder.clone()).await;
    let req = request("POST", "/api/users/1", "10.0.0.1")
        .header("x-correlation-id", "big-1")
        .body(Body::from("this body is longer than eight bytes"))
        .unwrap();
    let resp = send(&app, req).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(header(&resp, "x-correlation-id"), Some("big-1"));
    assert_eq!(header(&resp, "x-ratelimit-remaining"), Some("99"));
    assert_eq!(forwarder.count(), 0);
}
