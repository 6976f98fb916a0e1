//! Edgeway kernel contract.
//!
//! This crate defines the *trait interfaces, data model and configuration
//! types* for the Edgeway API gateway edge layer.  No I/O lives here; the
//! concrete implementations belong in `edgeway-gateway`.
//!
//! # Architecture mapping
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              edgeway-kernel  (this crate)                   │
//! │  GatewayRouter trait     RateLimiter / BucketStore traits   │
//! │  GatewayFilter trait     TokenVerifier / Forwarder traits   │
//! │  Route + RoutePatch      EdgewayConfig + validate()         │
//! │  PathPattern (glob grammar shared by validate and matching) │
//! │  GatewayRequest/Response/Context  GatewayError              │
//! └──────────────────────────┬──────────────────────────────────┘
//!                            │  depends on
//! ┌──────────────────────────▼──────────────────────────────────┐
//! │              edgeway-gateway  (runtime crate)               │
//! │  RouteTable: impl GatewayRouter                             │
//! │  TokenBucket / LeakyBucket + BucketRateLimiter              │
//! │  RedisBucketStore / MemoryBucketStore                       │
//! │  CorrelationId / JwtAuth / RateLimit / Route / Transform    │
//! │  GatewayServer  (axum HTTP server)                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust
//! use edgeway_kernel::{EdgewayConfig, Route};
//!
//! let config = EdgewayConfig::default()
//!     .with_route(Route::new("users", "/api/users/**", "http://user-service:8081"));
//!
//! config.validate().expect("gateway config is valid");
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod filter;
pub mod forward;
pub mod pattern;
pub mod ratelimit;
pub mod router;
pub mod validation;

// ── Flat re-exports ────────────────────────────────────────────────────────

pub use auth::{AuthFailure, TokenVerifier};
pub use error::GatewayError;
pub use filter::{FilterAction, FilterOrder, GatewayFilter};
pub use forward::{ForwardError, ForwardRequest, Forwarder};
pub use pattern::PathPattern;
pub use ratelimit::{
    BucketFormula, BucketOutcome, BucketState, BucketStore, Clock, RateLimiter, StoreError,
};
pub use router::{GatewayRouter, RequestTransformation, Route, RouteMatch, RoutePatch};
pub use validation::{
    AuthConfig, EdgewayConfig, JwtAlgorithm, KeyStrategy, LeakyBucketConfig, RateLimitAlgorithmKind,
    RateLimitConfig, RedisConfig, ServerConfig, TokenBucketConfig,
};

// types module is pub so implementors in edgeway-gateway can use the structs
pub mod types;
pub use types::{GatewayContext, GatewayRequest, GatewayResponse, HttpMethod};
