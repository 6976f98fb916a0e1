//! [`RateLimiter`] facade over a formula and a shared store.
//!
//! The facade prefixes keys per algorithm, bounds every store call with a
//! timeout, and fails open: when the store cannot answer, requests are
//! admitted and the failure is logged.

use super::clock::SystemClock;
use async_trait::async_trait;
use edgeway_kernel::{BucketFormula, BucketStore, Clock, RateLimiter, StoreError};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default key expiry.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);
/// Default bound on a single store round trip.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_millis(250);

/// Rate limiter parameterised by a [`BucketFormula`].
pub struct BucketRateLimiter<F> {
    formula: F,
    store: Arc<dyn BucketStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    store_timeout: Duration,
}

impl<F: BucketFormula> BucketRateLimiter<F> {
    pub fn new(formula: F, store: Arc<dyn BucketStore>) -> Self {
        Self {
            formula,
            store,
            clock: Arc::new(SystemClock),
            ttl: DEFAULT_TTL,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn formula(&self) -> &F {
        &self.formula
    }

    fn bucket_key(&self, key: &str) -> String {
        format!("{}{}", self.formula.key_prefix(), key)
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.store_timeout)),
        }
    }
}

#[async_trait]
impl<F: BucketFormula + 'static> RateLimiter for BucketRateLimiter<F> {
    async fn allow(&self, key: &str) -> bool {
        let bucket_key = self.bucket_key(key);
        let now_ms = self.clock.now_ms();
        let update = self
            .store
            .atomic_update(&bucket_key, &self.formula, now_ms, self.ttl);

        match self.bounded(update).await {
            Ok(outcome) => {
                debug!(
                    key = %bucket_key,
                    allowed = outcome.allowed,
                    level = outcome.state.level,
                    "bucket updated"
                );
                outcome.allowed
            }
            Err(err) => {
                warn!(key = %bucket_key, error = %err, "rate limit store failed, admitting request");
                true
            }
        }
    }

    async fn remaining_quota(&self, key: &str) -> u64 {
        let bucket_key = self.bucket_key(key);
        match self.bounded(self.store.level(&bucket_key, &self.formula)).await {
            Ok(level) => self.formula.remaining(level),
            Err(err) => {
                warn!(key = %bucket_key, error = %err, "rate limit store failed, reporting full quota");
                self.formula.remaining(None)
            }
        }
    }

    async fn reset_time(&self, key: &str) -> Duration {
        let bucket_key = self.bucket_key(key);
        match self.bounded(self.store.ttl(&bucket_key)).await {
            Ok(ttl) => ttl.unwrap_or(Duration::ZERO),
            Err(err) => {
                warn!(key = %bucket_key, error = %err, "rate limit store failed, reporting zero reset time");
                Duration::ZERO
            }
        }
    }
}
