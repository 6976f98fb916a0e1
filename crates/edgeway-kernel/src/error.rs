//! Gateway error types for `edgeway-kernel`.
//!
//! [`GatewayError`] covers every failure mode that can be detected at
//! *definition time*: empty ids, duplicate registrations, malformed path
//! patterns, invalid configuration values.  Runtime failures (store
//! unreachable, upstream timeout, …) have their own types next to the
//! contract that produces them.

use thiserror::Error;

/// Configuration / route-table error type for the gateway kernel contract.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum GatewayError {
    // ── Routes ───────────────────────────────────────────────────────────────
    /// A route `id` field is empty or whitespace-only.
    #[error("route id cannot be empty")]
    EmptyRouteId,

    /// A route with this id has already been registered.
    #[error("route '{0}' is already registered")]
    DuplicateRoute(String),

    /// No route with this id is currently registered.
    #[error("route '{0}' is not registered")]
    RouteNotFound(String),

    /// A route path pattern is syntactically invalid.
    #[error("route '{0}' has an invalid path pattern: {1}")]
    InvalidPathPattern(String, String),

    /// A route destination is not an absolute http(s) URL.
    #[error("route '{0}' has an invalid destination: {1}")]
    InvalidDestination(String, String),

    // ── Server ───────────────────────────────────────────────────────────────
    /// `request_timeout_ms` is zero, which would reject every request.
    #[error("request timeout must be greater than 0 ms")]
    InvalidTimeout,

    // ── Rate limiting ────────────────────────────────────────────────────────
    /// A bucket parameter (capacity, rate, interval, ttl) is zero.
    #[error("invalid rate limit configuration: {0}")]
    InvalidRateLimit(String),

    // ── Auth ─────────────────────────────────────────────────────────────────
    /// An authentication configuration block is missing a required field.
    #[error("authentication config is missing required field: {0}")]
    InvalidAuthConfig(String),
}
