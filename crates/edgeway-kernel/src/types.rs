//! Core data types shared by the gateway contracts.
//!
//! These types are used by [`GatewayFilter`](super::filter::GatewayFilter),
//! [`GatewayRouter`](super::router::GatewayRouter) and
//! [`Forwarder`](super::forward::Forwarder) and carry no runtime
//! dependencies beyond `serde` and `std`.

use crate::router::RouteMatch;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─────────────────────────────────────────────────────────────────────────────
// HTTP primitives
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP method, covering the standard verbs used in REST and proxy scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    /// Case-insensitive parse from a string slice.
    pub fn from_str_ci(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "PATCH" => Some(HttpMethod::Patch),
            "DELETE" => Some(HttpMethod::Delete),
            "HEAD" => Some(HttpMethod::Head),
            "OPTIONS" => Some(HttpMethod::Options),
            _ => None,
        }
    }

    /// Return the standard uppercase string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request / Response
// ─────────────────────────────────────────────────────────────────────────────

/// An inbound request flowing through the gateway.
///
/// All fields use owned types so the struct can be sent across async task
/// boundaries without lifetime complications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayRequest {
    /// Request path without the query string, e.g. `/api/users/42`.
    pub path: String,
    /// Raw query string (without the leading `?`), if any.
    pub query: Option<String>,
    /// HTTP method.
    pub method: HttpMethod,
    /// HTTP headers (header names are lowercased).
    pub headers: HashMap<String, String>,
    /// Raw body bytes.
    pub body: Vec<u8>,
    /// Network address of the peer, when the transport knows it.
    pub remote_addr: Option<String>,
}

impl GatewayRequest {
    /// Construct a minimal request with the given path and method.
    pub fn new(path: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            path: path.into(),
            query: None,
            method,
            headers: HashMap::new(),
            body: Vec::new(),
            remote_addr: None,
        }
    }

    /// Builder helper: attach a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into().to_lowercase(), value.into());
        self
    }

    /// Builder helper: set the body.
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Builder helper: set the query string.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Builder helper: set the peer address.
    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// An outbound response returned through the gateway, either relayed from the
/// upstream or synthesised by a rejecting filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayResponse {
    /// HTTP status code (100–599).
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Raw body bytes.
    pub body: Vec<u8>,
    /// Id of the route that produced this response, empty for rejections.
    pub route_id: String,
    /// Round-trip latency in milliseconds.
    pub latency_ms: u64,
}

impl GatewayResponse {
    /// Construct a minimal response.
    pub fn new(status: u16, route_id: impl Into<String>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
            route_id: route_id.into(),
            latency_ms: 0,
        }
    }

    /// Builder helper: attach a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into().to_lowercase(), value.into());
        self
    }

    /// Builder helper: set the body.
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request context
// ─────────────────────────────────────────────────────────────────────────────

/// Mutable per-request context that flows through the filter chain.
///
/// Created when the request enters the gateway and dropped when the response
/// is written; it is never shared between requests.
#[derive(Debug, Clone)]
pub struct GatewayContext {
    /// The inbound request, as received.
    pub request: GatewayRequest,
    /// Correlation id; empty until the correlation filter has run.
    pub correlation_id: String,
    /// Subject resolved by the auth filter; `None` if unauthenticated.
    pub auth_subject: Option<String>,
    /// Key the rate-limit decision was scoped to.
    pub limiter_key: Option<String>,
    /// Populated by the routing filter.
    pub route_match: Option<RouteMatch>,
    /// Headers to hand to the forwarder (lowercased names).
    pub forward_headers: HashMap<String, String>,
    /// Headers every response to this request must carry, including
    /// rejections produced by later filters.
    pub response_headers: HashMap<String, String>,
    /// Free-form attributes written and read by filters.
    pub attributes: HashMap<String, serde_json::Value>,
}

impl GatewayContext {
    /// Create a fresh context from an inbound request.
    pub fn new(request: GatewayRequest) -> Self {
        let forward_headers = request.headers.clone();
        Self {
            request,
            correlation_id: String::new(),
            auth_subject: None,
            limiter_key: None,
            route_match: None,
            forward_headers,
            response_headers: HashMap::new(),
            attributes: HashMap::new(),
        }
    }

    /// Record a header that must be echoed on the response.
    pub fn set_response_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.response_headers
            .insert(key.into().to_lowercase(), value.into());
    }

    /// Convenience: read a typed attribute, returning `None` if absent or
    /// if deserialization fails.
    pub fn get_attr<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.attributes
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Convenience: write a serializable attribute.
    pub fn set_attr<T: serde::Serialize>(&mut self, key: impl Into<String>, val: &T) {
        if let Ok(v) = serde_json::to_value(val) {
            self.attributes.insert(key.into(), v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = GatewayRequest::new("/a", HttpMethod::Get).with_header("X-Correlation-ID", "abc");
        assert_eq!(req.header("x-correlation-id"), Some("abc"));
        assert_eq!(req.header("X-CORRELATION-ID"), Some("abc"));
        assert_eq!(req.header("x-missing"), None);
    }

    #[test]
    fn context_starts_with_copy_of_request_headers() {
        let req = GatewayRequest::new("/a", HttpMethod::Get).with_header("Accept", "text/plain");
        let ctx = GatewayContext::new(req);
        assert_eq!(ctx.forward_headers.get("accept").map(String::as_str), Some("text/plain"));
        assert!(ctx.response_headers.is_empty());
        assert!(ctx.correlation_id.is_empty());
    }

    #[test]
    fn method_parse_round_trips_known_verbs() {
        assert_eq!(HttpMethod::from_str_ci("get"), Some(HttpMethod::Get));
        assert_eq!(HttpMethod::from_str_ci("DELETE").map(|m| m.as_str()), Some("DELETE"));
        assert_eq!(HttpMethod::from_str_ci("TRACE"), None);
    }
}
