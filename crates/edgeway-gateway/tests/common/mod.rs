//! Shared fixtures for gateway integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::ConnectInfo;
use axum::http::{Request, Response};
use edgeway_gateway::ratelimit::{ManualClock, MemoryBucketStore};
use edgeway_gateway::server::GatewayServer;
use edgeway_kernel::{
    BucketFormula, BucketOutcome, BucketStore, EdgewayConfig, ForwardError, ForwardRequest,
    Forwarder, GatewayResponse, Route, StoreError,
};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "integration-test-secret-long-enough-for-hs512";

/// Records every forwarded request and answers `200` with a JSON summary.
#[derive(Default)]
pub struct RecordingForwarder {
    pub seen: Mutex<Vec<ForwardRequest>>,
}

impl RecordingForwarder {
    pub fn last(&self) -> ForwardRequest {
        self.seen.lock().last().cloned().expect("a request was forwarded")
    }

    pub fn count(&self) -> usize {
        self.seen.lock().len()
    }
}

#[async_trait]
impl Forwarder for RecordingForwarder {
    async fn forward(&self, req: ForwardRequest) -> Result<GatewayResponse, ForwardError> {
        let body = json!({
            "route": req.route.id,
            "path": req.path,
            "destination": req.route.destination,
        });
        let resp = GatewayResponse::new(200, &req.route.id)
            .with_header("content-type", "application/json")
            .with_body(body.to_string().into_bytes());
        self.seen.lock().push(req);
        Ok(resp)
    }
}

/// Fails every call with a timeout.
pub struct TimingOutForwarder;

#[async_trait]
impl Forwarder for TimingOutForwarder {
    async fn forward(&self, req: ForwardRequest) -> Result<GatewayResponse, ForwardError> {
        Err(ForwardError::Timeout {
            route_id: req.route.id.clone(),
            timeout: Duration::from_millis(req.route.timeout_ms),
        })
    }
}

/// Bucket store whose backend is unreachable.
pub struct DownStore;

#[async_trait]
impl BucketStore for DownStore {
    async fn atomic_update(
        &self,
        _key: &str,
        _formula: &dyn BucketFormula,
        _now_ms: i64,
        _ttl: Duration,
    ) -> Result<BucketOutcome, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn level(
        &self,
        _key: &str,
        _formula: &dyn BucketFormula,
    ) -> Result<Option<i64>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn ttl(&self, _key: &str) -> Result<Option<Duration>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

/// Config with the given routes, a token bucket of `capacity` that does not
/// refill during a test, and a JWT secret.
pub fn config(routes: Vec<Route>, capacity: i64) -> EdgewayConfig {
    let mut config = EdgewayConfig::default();
    config.routes = routes;
    config.rate_limit.token_bucket.capacity = capacity;
    config.rate_limit.token_bucket.refill_rate = 1;
    config.rate_limit.token_bucket.refill_interval_ms = 3_600_000;
    config.auth.jwt_secret = Some(JWT_SECRET.to_string());
    config
}

pub fn users_route() -> Route {
    Route::new("users", "/api/users/**", "http://user-service:8081").with_strip_path_prefix(true)
}

/// Gateway app over an in-memory store, a fixed clock and `forwarder`.
pub async fn app_with(config: EdgewayConfig, forwarder: Arc<dyn Forwarder>) -> Router {
    GatewayServer::new(config)
        .with_store(Arc::new(MemoryBucketStore::new()))
        .with_clock(Arc::new(ManualClock::new(1_700_000_000_000)))
        .with_forwarder(forwarder)
        .build_app()
        .await
        .expect("app builds")
}

pub async fn app_with_store(
    config: EdgewayConfig,
    store: Arc<dyn BucketStore>,
    forwarder: Arc<dyn Forwarder>,
) -> Router {
    GatewayServer::new(config)
        .with_store(store)
        .with_forwarder(forwarder)
        .build_app()
        .await
        .expect("app builds")
}

pub fn get(path: &str, peer: &str) -> Request<Body> {
    request("GET", path, peer).body(Body::empty()).unwrap()
}

pub fn request(method: &str, path: &str, peer: &str) -> axum::http::request::Builder {
    let addr: SocketAddr = format!("{peer}:40000").parse().unwrap();
    Request::builder()
        .method(method)
        .uri(path)
        .extension(ConnectInfo(addr))
}

pub fn json_request(method: &str, path: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.unwrap()
}

pub fn header<'a>(resp: &'a Response<Body>, name: &str) -> Option<&'a str> {
    resp.headers().get(name).and_then(|v| v.to_str().ok())
}

pub async fn body_json(resp: Response<Body>) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
