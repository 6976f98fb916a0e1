//! Rate-limiting contracts.
//!
//! Three seams make up the distributed limiter:
//!
//! - [`BucketFormula`]: pure per-algorithm decision logic (token bucket,
//!   leaky bucket).  It knows how to compute the next state in-process and
//!   ships the equivalent server-side script for stores that evaluate it
//!   remotely.
//! - [`BucketStore`]: shared state with an atomic read-modify-write.  Every
//!   gateway instance must observe the same serialized state, so no
//!   in-process cache is authoritative.
//! - [`RateLimiter`]: the capability surface consumed by the pipeline.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Persisted per-key bucket state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketState {
    /// Token count (token bucket) or water level (leaky bucket).
    /// Always within `0..=capacity`.
    pub level: i64,
    /// Timestamp of the last transition, ms since the Unix epoch.
    pub last_update_ms: i64,
}

/// Result of one atomic bucket update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketOutcome {
    /// State as persisted by the update.
    pub state: BucketState,
    /// Whether the request that triggered the update is admitted.
    pub allowed: bool,
}

/// Failure talking to the shared bucket store.
///
/// Every variant is treated as "store unavailable" by the limiter facade.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// The store is unreachable or returned an error.
    #[error("bucket store unavailable: {0}")]
    Unavailable(String),

    /// The store did not answer within the transport timeout.
    #[error("bucket store call timed out after {0:?}")]
    Timeout(Duration),

    /// The store answered with data the formula cannot interpret.
    #[error("bucket store returned malformed state: {0}")]
    Malformed(String),
}

/// Pure decision logic for one rate-limit algorithm.
pub trait BucketFormula: Send + Sync {
    /// Prefix prepended to limiter keys so algorithms never share state.
    fn key_prefix(&self) -> &'static str;

    /// Hash field holding the level in remote stores.
    fn level_field(&self) -> &'static str;

    /// Server-side script performing [`apply`](Self::apply) atomically.
    ///
    /// Convention: `KEYS[1]` is the bucket key, `ARGV` is
    /// [`script_args`](Self::script_args) followed by `now_ms` and the ttl in
    /// seconds; the script returns `{allowed (0|1), level}`.
    fn script(&self) -> &'static str;

    /// Algorithm parameters passed to [`script`](Self::script).
    fn script_args(&self) -> Vec<i64>;

    /// Maximum level of the bucket.
    fn capacity(&self) -> i64;

    /// Compute the next state from `prior` (absent for a fresh key).
    fn apply(&self, prior: Option<BucketState>, now_ms: i64) -> BucketOutcome;

    /// Requests still admissible given the stored level (absent for a fresh key).
    fn remaining(&self, level: Option<i64>) -> u64;
}

/// Shared key/value store offering an atomic bucket update.
#[async_trait]
pub trait BucketStore: Send + Sync {
    /// Read the state under `key`, compute the next state with `formula`,
    /// persist it and refresh the key's expiry to `ttl`, all as one
    /// indivisible operation with respect to every other caller.
    async fn atomic_update(
        &self,
        key: &str,
        formula: &dyn BucketFormula,
        now_ms: i64,
        ttl: Duration,
    ) -> Result<BucketOutcome, StoreError>;

    /// Current level under `key` without modifying it.
    async fn level(&self, key: &str, formula: &dyn BucketFormula)
    -> Result<Option<i64>, StoreError>;

    /// Remaining time before `key` expires; `None` if it does not exist.
    async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError>;
}

/// Source of wall-clock time for bucket arithmetic.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;
}

/// Capability surface the pipeline consumes.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Consume one unit of quota for `key`; `true` if the request is admitted.
    async fn allow(&self, key: &str) -> bool;

    /// Requests still admissible for `key`, without consuming any.
    async fn remaining_quota(&self, key: &str) -> u64;

    /// Advisory time until the key's state is forgotten.
    async fn reset_time(&self, key: &str) -> Duration;
}
