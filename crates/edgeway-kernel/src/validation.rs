//! Gateway configuration container and startup validation.
//!
//! [`EdgewayConfig`] aggregates every configuration dimension (server, shared
//! store, rate limiting, authentication, routes) and exposes a single
//! [`validate()`](EdgewayConfig::validate) that checks all structural
//! invariants *before* any runtime resources are allocated.
//!
//! Every section deserializes with defaults, so a config file only needs to
//! name what it changes.

use super::error::GatewayError;
use super::router::Route;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

// ─────────────────────────────────────────────────────────────────────────────
// Server
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// TCP port to listen on.
    pub port: u16,
    /// Default upstream timeout for routes with `timeout_ms == 0`.
    pub request_timeout_ms: u64,
    /// Maximum accepted request body size.
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            request_timeout_ms: 30_000,
            body_limit_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Shared store settings.  Without a URL the gateway keeps bucket state in
/// process memory, which is only correct for a single instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RedisConfig {
    /// e.g. `redis://127.0.0.1:6379`; `rediss://` for TLS.
    pub url: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Rate limiting
// ─────────────────────────────────────────────────────────────────────────────

/// Which bucket algorithm the limiter runs.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RateLimitAlgorithmKind {
    #[default]
    TokenBucket,
    LeakyBucket,
}

/// How the limiter key is derived from a request.
///
/// The header strategies fall back to the network address when the header
/// is absent.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum KeyStrategy {
    /// Peer network address.
    #[default]
    Ip,
    /// `X-API-Key` header.
    ApiKey,
    /// `X-User-ID` header.
    UserId,
}

/// Token bucket parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TokenBucketConfig {
    /// Maximum number of tokens (burst size).
    pub capacity: i64,
    /// Tokens added per elapsed interval.
    pub refill_rate: i64,
    /// Length of one refill interval.
    pub refill_interval_ms: i64,
}

impl Default for TokenBucketConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            refill_rate: 100,
            refill_interval_ms: 1000,
        }
    }
}

/// Leaky bucket parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LeakyBucketConfig {
    /// Maximum water level (queue depth).
    pub capacity: i64,
    /// Units drained per second.
    pub leak_rate: i64,
}

impl Default for LeakyBucketConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            leak_rate: 100,
        }
    }
}

/// Rate-limit section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub algorithm: RateLimitAlgorithmKind,
    pub key_strategy: KeyStrategy,
    pub token_bucket: TokenBucketConfig,
    pub leaky_bucket: LeakyBucketConfig,
    /// Expiry applied to idle bucket keys.
    pub ttl_secs: u64,
    /// Store round trips slower than this fail open.
    pub store_timeout_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            algorithm: RateLimitAlgorithmKind::default(),
            key_strategy: KeyStrategy::default(),
            token_bucket: TokenBucketConfig::default(),
            leaky_bucket: LeakyBucketConfig::default(),
            ttl_secs: 3600,
            store_timeout_ms: 250,
        }
    }
}

impl RateLimitConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    fn validate(&self) -> Result<(), GatewayError> {
        if !self.enabled {
            return Ok(());
        }
        let positive = |name: &str, value: i64| {
            if value <= 0 {
                Err(GatewayError::InvalidRateLimit(format!("{name} must be > 0")))
            } else {
                Ok(())
            }
        };
        match self.algorithm {
            RateLimitAlgorithmKind::TokenBucket => {
                positive("token_bucket.capacity", self.token_bucket.capacity)?;
                positive("token_bucket.refill_rate", self.token_bucket.refill_rate)?;
                positive(
                    "token_bucket.refill_interval_ms",
                    self.token_bucket.refill_interval_ms,
                )?;
            }
            RateLimitAlgorithmKind::LeakyBucket => {
                positive("leaky_bucket.capacity", self.leaky_bucket.capacity)?;
                positive("leaky_bucket.leak_rate", self.leaky_bucket.leak_rate)?;
            }
        }
        if self.ttl_secs == 0 {
            return Err(GatewayError::InvalidRateLimit("ttl_secs must be > 0".into()));
        }
        if self.store_timeout_ms == 0 {
            return Err(GatewayError::InvalidRateLimit(
                "store_timeout_ms must be > 0".into(),
            ));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth
// ─────────────────────────────────────────────────────────────────────────────

/// HMAC algorithm used to sign and verify bearer tokens.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum JwtAlgorithm {
    HS256,
    HS384,
    #[default]
    HS512,
}

/// Authentication section.  Without a secret, bearer tokens cannot be
/// verified and every presented credential is rejected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: Option<String>,
    pub algorithm: JwtAlgorithm,
    /// Lifetime of issued tokens.
    pub expiration_ms: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            algorithm: JwtAlgorithm::default(),
            expiration_ms: 86_400_000,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EdgewayConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level gateway configuration.
///
/// Call [`validate()`](Self::validate) to check all structural invariants
/// before passing this config to the gateway runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EdgewayConfig {
    pub server: ServerConfig,
    pub redis: RedisConfig,
    pub rate_limit: RateLimitConfig,
    pub auth: AuthConfig,
    /// Routes loaded at startup; more can be added through the admin API.
    pub routes: Vec<Route>,
}

impl EdgewayConfig {
    /// Builder: add a route.
    pub fn with_route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// Builder: replace the rate-limit section.
    pub fn with_rate_limit(mut self, rl: RateLimitConfig) -> Self {
        self.rate_limit = rl;
        self
    }

    /// Builder: replace the auth section.
    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    /// Builder: set the default upstream timeout.
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.server.request_timeout_ms = ms;
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Validation
    // ─────────────────────────────────────────────────────────────────────────

    /// Validate all structural invariants of this configuration.
    ///
    /// Returns the *first* detected [`GatewayError`].
    ///
    /// Checks performed (in order):
    /// 1. Default request timeout is non-zero.
    /// 2. Rate-limit parameters of the selected algorithm are positive.
    /// 3. A configured JWT secret is not blank.
    /// 4. Each route passes [`Route::validate()`].
    /// 5. No two routes share the same id.
    pub fn validate(&self) -> Result<(), GatewayError> {
        // ── 1. Timeout ───────────────────────────────────────────────────────
        if self.server.request_timeout_ms == 0 {
            return Err(GatewayError::InvalidTimeout);
        }

        // ── 2. Rate limit ────────────────────────────────────────────────────
        self.rate_limit.validate()?;

        // ── 3. Auth ──────────────────────────────────────────────────────────
        if self
            .auth
            .jwt_secret
            .as_ref()
            .is_some_and(|s| s.trim().is_empty())
        {
            return Err(GatewayError::InvalidAuthConfig("jwt_secret".to_string()));
        }

        // ── 4 + 5. Routes ────────────────────────────────────────────────────
        let mut route_ids: HashSet<&str> = HashSet::new();
        for route in &self.routes {
            route.validate()?;
            if !route_ids.insert(route.id.as_str()) {
                return Err(GatewayError::DuplicateRoute(route.id.clone()));
            }
        }

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
