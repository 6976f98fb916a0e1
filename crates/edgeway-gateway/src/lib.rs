//! `edgeway-gateway`: Edgeway API gateway runtime.
//!
//! This crate provides the concrete implementations of the contracts defined
//! in `edgeway-kernel`:
//!
//! | Kernel contract | Implementation |
//! |----------------|----------------|
//! | [`GatewayRouter`](edgeway_kernel::GatewayRouter) | [`router::RouteTable`] |
//! | [`BucketFormula`](edgeway_kernel::BucketFormula) | [`ratelimit::TokenBucket`], [`ratelimit::LeakyBucket`] |
//! | [`BucketStore`](edgeway_kernel::BucketStore) | [`ratelimit::RedisBucketStore`], [`ratelimit::MemoryBucketStore`] |
//! | [`RateLimiter`](edgeway_kernel::RateLimiter) | [`ratelimit::BucketRateLimiter`] |
//! | [`TokenVerifier`](edgeway_kernel::TokenVerifier) | [`jwt::JwtVerifier`] |
//! | [`Forwarder`](edgeway_kernel::Forwarder) | [`backend::HttpForwarder`] |
//! | [`GatewayFilter`](edgeway_kernel::GatewayFilter) | [`filter::CorrelationIdFilter`], [`filter::LoggingFilter`], [`filter::JwtAuthFilter`], [`filter::RateLimitFilter`], [`filter::RouteFilter`], [`filter::TransformFilter`] |
//!
//! The [`server::GatewayServer`] wires everything together into an axum HTTP
//! service.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use edgeway_gateway::server::GatewayServer;
//! use edgeway_kernel::{EdgewayConfig, Route};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = EdgewayConfig::default()
//!         .with_route(
//!             Route::new("users", "/api/users/**", "http://user-service:8081")
//!                 .with_strip_path_prefix(true),
//!         );
//!
//!     GatewayServer::new(config).start().await.unwrap();
//! }
//! ```

pub mod backend;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod jwt;
pub mod ratelimit;
pub mod router;
pub mod server;
pub mod state;

// Re-export the kernel for convenience.
pub use edgeway_kernel as kernel;
