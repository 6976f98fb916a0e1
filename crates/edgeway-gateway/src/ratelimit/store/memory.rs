//! In-process bucket store.
//!
//! Each entry is updated while its `DashMap` shard lock is held, which makes
//! the read-compute-write sequence atomic for every caller in this process.
//! Suitable for single-instance deployments and tests; multi-instance
//! deployments need a shared store such as [`RedisBucketStore`](super::RedisBucketStore).
//!
//! Expired keys are swept from inside `atomic_update` at most once per sweep
//! interval, so the map stays bounded by the keys active within one TTL.

use async_trait::async_trait;
use dashmap::DashMap;
use edgeway_kernel::{BucketFormula, BucketOutcome, BucketState, BucketStore, StoreError};
use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Default spacing between automatic sweeps of expired keys.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Stored bucket plus its expiry deadline.
struct Slot {
    state: Option<BucketState>,
    expires_at: Instant,
}

impl Slot {
    fn live_state(&self, now: Instant) -> Option<BucketState> {
        if self.expires_at > now { self.state } else { None }
    }
}

/// [`BucketStore`] backed by a concurrent hash map.
pub struct MemoryBucketStore {
    buckets: DashMap<String, Slot>,
    sweep_interval: Duration,
    next_sweep: Mutex<Instant>,
}

impl Default for MemoryBucketStore {
    fn default() -> Self {
        Self {
            buckets: DashMap::new(),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            next_sweep: Mutex::new(Instant::now() + DEFAULT_SWEEP_INTERVAL),
        }
    }
}

impl MemoryBucketStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        *self.next_sweep.get_mut() = Instant::now() + interval;
        self
    }

    /// Number of tracked keys, expired ones included until the next sweep.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Drop expired entries.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        let before = self.buckets.len();
        self.buckets.retain(|_, slot| slot.expires_at > now);
        debug!(removed = before.saturating_sub(self.buckets.len()), "purged expired buckets");
    }

    /// Purge when the sweep deadline has passed. Concurrent callers skip
    /// instead of waiting; one of them does the work.
    fn maybe_sweep(&self, now: Instant) {
        let Some(mut next) = self.next_sweep.try_lock() else {
            return;
        };
        if now < *next {
            return;
        }
        *next = now + self.sweep_interval;
        drop(next);
        self.purge_expired();
    }
}

#[async_trait]
impl BucketStore for MemoryBucketStore {
    async fn atomic_update(
        &self,
        key: &str,
        formula: &dyn BucketFormula,
        now_ms: i64,
        ttl: Duration,
    ) -> Result<BucketOutcome, StoreError> {
        let now = Instant::now();
        // Must run before the entry guard below is taken.
        self.maybe_sweep(now);

        let mut slot = self.buckets.entry(key.to_string()).or_insert_with(|| Slot {
            state: None,
            expires_at: now,
        });

        let outcome = formula.apply(slot.live_state(now), now_ms);
        slot.state = Some(outcome.state);
        slot.expires_at = now + ttl;
        Ok(outcome)
    }

    async fn level(
        &self,
        key: &str,
        _formula: &dyn BucketFormula,
    ) -> Result<Option<i64>, StoreError> {
        let now = Instant::now();
        Ok(self
            .buckets
            .get(key)
            .and_then(|slot| slot.live_state(now))
            .map(|state| state.level))
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        let now = Instant::now();
        Ok(self
            .buckets
            .get(key)
            .filter(|slot| slot.expires_at > now)
            .map(|slot| slot.expires_at - now))
    }
}
