//! Distributed rate-limit filter.
//!
//! Derives a limiter key from the request according to the configured
//! [`KeyStrategy`], consults the shared [`RateLimiter`], and annotates every
//! response with the remaining quota and reset time.  Denied requests get
//! `429 Too Many Requests` with a `Retry-After` header.

use async_trait::async_trait;
use edgeway_kernel::{
    FilterAction, FilterOrder, GatewayContext, GatewayError, GatewayFilter, GatewayRequest,
    KeyStrategy, RateLimiter,
};
use std::sync::Arc;
use tracing::warn;

pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";
/// Reset time in milliseconds.
pub const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";
/// Reset time in whole seconds, on 429 responses only.
pub const RETRY_AFTER_HEADER: &str = "retry-after";

const API_KEY_HEADER: &str = "x-api-key";
const USER_ID_HEADER: &str = "x-user-id";
const UNKNOWN_PEER: &str = "unknown";

/// Rate-limit filter over a shared [`RateLimiter`].
pub struct RateLimitFilter {
    limiter: Arc<dyn RateLimiter>,
    key_strategy: KeyStrategy,
}

impl RateLimitFilter {
    pub fn new(limiter: Arc<dyn RateLimiter>, key_strategy: KeyStrategy) -> Self {
        Self {
            limiter,
            key_strategy,
        }
    }

    /// Limiter key for `req`.  Header strategies fall back to the peer
    /// address when their header is absent or blank.
    pub fn limiter_key(&self, req: &GatewayRequest) -> String {
        let header = match self.key_strategy {
            KeyStrategy::Ip => None,
            KeyStrategy::ApiKey => req.header(API_KEY_HEADER),
            KeyStrategy::UserId => req.header(USER_ID_HEADER),
        };
        header
            .filter(|v| !v.trim().is_empty())
            .or(req.remote_addr.as_deref())
            .unwrap_or(UNKNOWN_PEER)
            .to_string()
    }
}

#[async_trait]
impl GatewayFilter for RateLimitFilter {
    fn name(&self) -> &str {
        "rate-limit"
    }

    fn order(&self) -> FilterOrder {
        FilterOrder::RATE_LIMIT
    }

    async fn on_request(&self, ctx: &mut GatewayContext) -> Result<FilterAction, GatewayError> {
        let key = self.limiter_key(&ctx.request);
        let allowed = self.limiter.allow(&key).await;
        let remaining = self.limiter.remaining_quota(&key).await;
        let reset = self.limiter.reset_time(&key).await;

        ctx.set_response_header(RATE_LIMIT_REMAINING_HEADER, remaining.to_string());
        ctx.set_response_header(RATE_LIMIT_RESET_HEADER, reset.as_millis().to_string());
        ctx.limiter_key = Some(key);

        if allowed {
            return Ok(FilterAction::Continue);
        }

        let retry_after = reset.as_secs();
        warn!(
            correlation_id = %ctx.correlation_id,
            key = ?ctx.limiter_key,
            retry_after_secs = retry_after,
            "rate limit exceeded"
        );
        ctx.set_response_header(RETRY_AFTER_HEADER, retry_after.to_string());
        Ok(FilterAction::Reject(
            429,
            format!("Rate limit exceeded. Retry after {retry_after} second(s)."),
        ))
    }
}
