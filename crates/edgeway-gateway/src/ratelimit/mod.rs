//! Distributed rate limiting.
//!
//! A [`BucketRateLimiter`] combines a formula ([`TokenBucket`] or
//! [`LeakyBucket`]) with a [`BucketStore`] ([`MemoryBucketStore`] or
//! [`RedisBucketStore`]).  [`build_rate_limiter`] wires one up from
//! configuration.

mod clock;
mod leaky_bucket;
mod limiter;
mod store;
mod token_bucket;

pub use clock::{ManualClock, SystemClock};
pub use leaky_bucket::{LEAKY_BUCKET_PREFIX, LEAKY_BUCKET_SCRIPT, LeakyBucket};
pub use limiter::{BucketRateLimiter, DEFAULT_STORE_TIMEOUT, DEFAULT_TTL};
pub use store::{MemoryBucketStore, RedisBucketStore};
pub use token_bucket::{TOKEN_BUCKET_PREFIX, TOKEN_BUCKET_SCRIPT, TokenBucket};

use edgeway_kernel::{BucketStore, Clock, RateLimitAlgorithmKind, RateLimitConfig, RateLimiter};
use std::sync::Arc;

/// Build the limiter selected by `config.algorithm` on top of `store`.
pub fn build_rate_limiter(
    config: &RateLimitConfig,
    store: Arc<dyn BucketStore>,
    clock: Arc<dyn Clock>,
) -> Arc<dyn RateLimiter> {
    match config.algorithm {
        RateLimitAlgorithmKind::TokenBucket => Arc::new(
            BucketRateLimiter::new(TokenBucket::from_config(&config.token_bucket), store)
                .with_clock(clock)
                .with_ttl(config.ttl())
                .with_store_timeout(config.store_timeout()),
        ),
        RateLimitAlgorithmKind::LeakyBucket => Arc::new(
            BucketRateLimiter::new(LeakyBucket::from_config(&config.leaky_bucket), store)
                .with_clock(clock)
                .with_ttl(config.ttl())
                .with_store_timeout(config.store_timeout()),
        ),
    }
}
