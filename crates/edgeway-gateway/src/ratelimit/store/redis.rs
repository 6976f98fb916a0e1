//! Redis-backed bucket store shared by every gateway instance.
//!
//! Updates run as Lua scripts so the read-compute-write sequence is atomic on
//! the server.  Scripts are sent by hash and loaded on demand.

use async_trait::async_trait;
use dashmap::DashMap;
use edgeway_kernel::{BucketFormula, BucketOutcome, BucketState, BucketStore, StoreError};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, ErrorKind, RedisError, Script};
use std::time::Duration;
use tracing::info;

fn store_error(err: RedisError) -> StoreError {
    match err.kind() {
        ErrorKind::TypeError => StoreError::Malformed(err.to_string()),
        _ => StoreError::Unavailable(err.to_string()),
    }
}

/// [`BucketStore`] backed by Redis hashes.
pub struct RedisBucketStore {
    conn: ConnectionManager,
    scripts: DashMap<&'static str, Script>,
}

impl RedisBucketStore {
    /// Connect to `url`, e.g. `redis://127.0.0.1:6379`.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url).map_err(store_error)?;
        let conn = ConnectionManager::new(client).await.map_err(store_error)?;
        info!(url = %url, "connected to redis bucket store");
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: ConnectionManager) -> Self {
        Self {
            conn,
            scripts: DashMap::new(),
        }
    }

    /// Compiled script for `formula`, cached per algorithm.
    fn script_for(&self, formula: &dyn BucketFormula) -> Script {
        self.scripts
            .entry(formula.key_prefix())
            .or_insert_with(|| Script::new(formula.script()))
            .clone()
    }
}

#[async_trait]
impl BucketStore for RedisBucketStore {
    async fn atomic_update(
        &self,
        key: &str,
        formula: &dyn BucketFormula,
        now_ms: i64,
        ttl: Duration,
    ) -> Result<BucketOutcome, StoreError> {
        let script = self.script_for(formula);
        let mut invocation = script.prepare_invoke();
        invocation.key(key);
        for arg in formula.script_args() {
            invocation.arg(arg);
        }
        invocation.arg(now_ms).arg(ttl.as_secs().max(1));

        let mut conn = self.conn.clone();
        let (allowed, level): (i64, i64) = invocation
            .invoke_async(&mut conn)
            .await
            .map_err(store_error)?;

        Ok(BucketOutcome {
            state: BucketState {
                level,
                last_update_ms: now_ms,
            },
            allowed: allowed == 1,
        })
    }

    async fn level(
        &self,
        key: &str,
        formula: &dyn BucketFormula,
    ) -> Result<Option<i64>, StoreError> {
        let mut conn = self.conn.clone();
        conn.hget(key, formula.level_field())
            .await
            .map_err(store_error)
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        let mut conn = self.conn.clone();
        // -2: no such key, -1: key without expiry.
        let millis: i64 = conn.pttl(key).await.map_err(store_error)?;
        Ok(u64::try_from(millis).ok().map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    //! These tests need a Redis server on `127.0.0.1:6379`:
    //! `cargo test -p edgeway-gateway -- --ignored`.

    use super::*;
    use crate::ratelimit::{LeakyBucket, TokenBucket};
    use std::sync::Arc;
    use uuid::Uuid;

    async fn store() -> RedisBucketStore {
        RedisBucketStore::connect("redis://127.0.0.1:6379")
            .await
            .expect("redis reachable")
    }

    fn unique_key() -> String {
        format!("edgeway_test_{}", Uuid::new_v4())
    }

    #[tokio::test]
    #[ignore]
    async fn token_bucket_script_matches_in_process_formula() {
        let store = store().await;
        let bucket = TokenBucket::new(3, 1, 1000);
        let key = unique_key();
        let ttl = Duration::from_secs(30);

        let mut prior = None;
        for now in [0, 0, 0, 0, 1_500, 1_600, 5_000] {
            let remote = store.atomic_update(&key, &bucket, now, ttl).await.unwrap();
            let local = bucket.apply(prior, now);
            assert_eq!(remote, local, "diverged at t={now}");
            prior = Some(local.state);
        }
        assert_eq!(store.level(&key, &bucket).await.unwrap(), prior.map(|s| s.level));
        assert!(store.ttl(&key).await.unwrap().is_some());
    }

    #[tokio::test]
    #[ignore]
    async fn leaky_bucket_script_matches_in_process_formula() {
        let store = store().await;
        let bucket = LeakyBucket::new(2, 2);
        let key = unique_key();
        let ttl = Duration::from_secs(30);

        let mut prior = None;
        for now in [0, 0, 0, 400, 500, 2_000] {
            let remote = store.atomic_update(&key, &bucket, now, ttl).await.unwrap();
            let local = bucket.apply(prior, now);
            assert_eq!(remote, local, "diverged at t={now}");
            prior = Some(local.state);
        }
    }

    #[tokio::test]
    #[ignore]
    async fn missing_key_has_no_level_or_ttl() {
        let store = store().await;
        let key = unique_key();
        let bucket = TokenBucket::new(3, 1, 1000);
        assert_eq!(store.level(&key, &bucket).await.unwrap(), None);
        assert_eq!(store.ttl(&key).await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ignore]
    async fn concurrent_callers_share_one_budget() {
        let store = Arc::new(store().await);
        let bucket = Arc::new(TokenBucket::new(20, 1, 3_600_000));
        let key = Arc::new(unique_key());
        let mut handles = Vec::new();
        for _ in 0..5 {
            let (store, bucket, key) = (store.clone(), bucket.clone(), key.clone());
            handles.push(tokio::spawn(async move {
                let mut admitted = 0;
                for _ in 0..10 {
                    let out = store
                        .atomic_update(&key, bucket.as_ref(), 0, Duration::from_secs(30))
                        .await
                        .unwrap();
                    admitted += out.allowed as u32;
                }
                admitted
            }));
        }
        let mut total = 0;
        for handle in handles {
            total += handle.await.unwrap();
        }
        assert_eq!(total, 20);
    }
}
