//! HTTP upstream forwarder.
//!
//! [`HttpForwarder`] relays the rewritten request to
//! `{route.destination}{path}?{query}` and returns the upstream response
//! verbatim, status included.  The per-route timeout applies to the whole
//! exchange; retries are left to callers.

use async_trait::async_trait;
use edgeway_kernel::{ForwardError, ForwardRequest, Forwarder, GatewayResponse};
use reqwest::{Client, Method};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

/// Hop-by-hop and framing headers never copied across the proxy.
const SKIPPED_HEADERS: &[&str] = &[
    "host",
    "content-length",
    "connection",
    "keep-alive",
    "transfer-encoding",
    "upgrade",
    "proxy-connection",
];

fn skip(name: &str) -> bool {
    SKIPPED_HEADERS.contains(&name)
}

/// Forwards requests over HTTP with `reqwest`.
pub struct HttpForwarder {
    client: Client,
    default_timeout: Duration,
}

impl HttpForwarder {
    /// `default_timeout` applies to routes whose `timeout_ms` is `0`.
    pub fn new(default_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            default_timeout,
        })
    }

    fn timeout_for(&self, req: &ForwardRequest) -> Duration {
        match req.route.timeout_ms {
            0 => self.default_timeout,
            ms => Duration::from_millis(ms),
        }
    }

    fn url_for(req: &ForwardRequest) -> String {
        let base = req.route.destination.trim_end_matches('/');
        match req.query.as_deref() {
            Some(q) if !q.is_empty() => format!("{base}{}?{q}", req.path),
            _ => format!("{base}{}", req.path),
        }
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    #[instrument(
        skip(self, req),
        fields(route = %req.route.id, path = %req.path, correlation_id = %req.correlation_id)
    )]
    async fn forward(&self, req: ForwardRequest) -> Result<GatewayResponse, ForwardError> {
        let url = Self::url_for(&req);
        let timeout = self.timeout_for(&req);
        let route_id = req.route.id.clone();
        debug!(
            url = %url,
            timeout_ms = timeout.as_millis() as u64,
            max_retries = req.route.max_retries,
            "forwarding upstream"
        );

        let method = Method::from_bytes(req.method.as_str().as_bytes()).unwrap_or(Method::GET);
        let mut builder = self.client.request(method, &url).timeout(timeout);
        for (key, value) in &req.headers {
            if skip(key) {
                continue;
            }
            builder = builder.header(key, value);
        }
        if !req.body.is_empty() {
            builder = builder.body(req.body);
        }

        let start = Instant::now();
        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                ForwardError::Timeout {
                    route_id: route_id.clone(),
                    timeout,
                }
            } else {
                ForwardError::Network {
                    route_id: route_id.clone(),
                    message: e.to_string(),
                }
            }
        };

        let upstream = builder.send().await.map_err(map_err)?;
        let status = upstream.status().as_u16();

        let mut headers = HashMap::new();
        for (name, value) in upstream.headers() {
            if skip(name.as_str()) {
                continue;
            }
            if let Ok(v) = value.to_str() {
                headers.insert(name.to_string(), v.to_string());
            }
        }

        let body = upstream.bytes().await.map_err(map_err)?;

        let mut resp = GatewayResponse::new(status, &route_id);
        resp.headers = headers;
        resp.body = body.to_vec();
        resp.latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        Ok(resp)
    }
}
