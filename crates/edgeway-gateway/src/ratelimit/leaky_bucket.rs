//! Leaky bucket: each admitted request adds one unit of water, which drains
//! at a constant rate per second.

use edgeway_kernel::{BucketFormula, BucketOutcome, BucketState, LeakyBucketConfig};

/// Key prefix for leaky bucket state.
pub const LEAKY_BUCKET_PREFIX: &str = "lb_";

/// Atomic server-side version of [`LeakyBucket::apply`].
///
/// `ARGV`: capacity, leak_rate (per second), now_ms, ttl_secs.
pub const LEAKY_BUCKET_SCRIPT: &str = r"
local key = KEYS[1]
local capacity = tonumber(ARGV[1])
local leak_rate = tonumber(ARGV[2])
local now = tonumber(ARGV[3])
local ttl = tonumber(ARGV[4])

local state = redis.call('HMGET', key, 'water_level', 'last_leak')
local water = tonumber(state[1])
local last_leak = tonumber(state[2])
if water == nil then water = 0 end
if last_leak == nil then last_leak = now end

local elapsed = math.max(0, now - last_leak)
local leaked = math.floor(elapsed * leak_rate / 1000)
water = math.min(capacity, math.max(0, water - leaked))

local allowed = 0
if water < capacity then
  water = water + 1
  allowed = 1
end

redis.call('HSET', key, 'water_level', water, 'last_leak', now)
redis.call('EXPIRE', key, ttl)
return {allowed, water}
";

/// Leaky bucket parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeakyBucket {
    capacity: i64,
    leak_rate: i64,
}

impl LeakyBucket {
    pub fn new(capacity: i64, leak_rate: i64) -> Self {
        Self {
            capacity: capacity.max(0),
            leak_rate: leak_rate.max(0),
        }
    }

    pub fn from_config(config: &LeakyBucketConfig) -> Self {
        Self::new(config.capacity, config.leak_rate)
    }
}

impl BucketFormula for LeakyBucket {
    fn key_prefix(&self) -> &'static str {
        LEAKY_BUCKET_PREFIX
    }

    fn level_field(&self) -> &'static str {
        "water_level"
    }

    fn script(&self) -> &'static str {
        LEAKY_BUCKET_SCRIPT
    }

    fn script_args(&self) -> Vec<i64> {
        vec![self.capacity, self.leak_rate]
    }

    fn capacity(&self) -> i64 {
        self.capacity
    }

    fn apply(&self, prior: Option<BucketState>, now_ms: i64) -> BucketOutcome {
        let (water, last_leak) = match prior {
            Some(state) => (state.level, state.last_update_ms),
            None => (0, now_ms),
        };

        let elapsed = now_ms.saturating_sub(last_leak).max(0);
        let leaked = elapsed.saturating_mul(self.leak_rate) / 1000;
        let mut water = water.saturating_sub(leaked).clamp(0, self.capacity);

        let allowed = water < self.capacity;
        if allowed {
            water += 1;
        }

        BucketOutcome {
            state: BucketState {
                level: water,
                last_update_ms: now_ms,
            },
            allowed,
        }
    }

    fn remaining(&self, level: Option<i64>) -> u64 {
        let water = level.unwrap_or(0).clamp(0, self.capacity);
        (self.capacity - water) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(bucket: &LeakyBucket, now: i64) -> Option<BucketState> {
        let mut state = None;
        loop {
            let out = bucket.apply(state, now);
            if !out.allowed {
                return state;
            }
            state = Some(out.state);
        }
    }

    #[test]
    fn fresh_key_admits_and_holds_one_unit() {
        let bucket = LeakyBucket::new(3, 1);
        let out = bucket.apply(None, 0);
        assert!(out.allowed);
        assert_eq!(out.state.level, 1);
    }

    #[test]
    fn full_bucket_denies_without_adding_water() {
        let bucket = LeakyBucket::new(3, 1);
        let full = fill(&bucket, 0);
        assert_eq!(full.map(|s| s.level), Some(3));

        let out = bucket.apply(full, 0);
        assert!(!out.allowed);
        assert_eq!(out.state.level, 3);
    }

    #[test]
    fn water_drains_by_floor_of_elapsed_times_rate() {
        let bucket = LeakyBucket::new(10, 4);
        let prior = BucketState {
            level: 10,
            last_update_ms: 0,
        };
        // 1.6 s at 4/s leaks floor(6.4) = 6, then the request adds one.
        let out = bucket.apply(Some(prior), 1_600);
        assert!(out.allowed);
        assert_eq!(out.state.level, 5);
    }

    #[test]
    fn drain_applies_even_when_request_is_denied() {
        let bucket = LeakyBucket::new(2, 1);
        let prior = BucketState {
            level: 2,
            last_update_ms: 0,
        };
        // Less than one second: nothing leaks, request denied.
        let out = bucket.apply(Some(prior), 999);
        assert!(!out.allowed);
        assert_eq!(out.state.level, 2);
        assert_eq!(out.state.last_update_ms, 999);
    }

    #[test]
    fn water_never_drains_below_zero() {
        let bucket = LeakyBucket::new(5, 100);
        let prior = BucketState {
            level: 1,
            last_update_ms: 0,
        };
        let out = bucket.apply(Some(prior), 60_000);
        assert!(out.allowed);
        assert_eq!(out.state.level, 1);
    }

    #[test]
    fn remaining_is_capacity_minus_water() {
        let bucket = LeakyBucket::new(10, 1);
        assert_eq!(bucket.remaining(None), 10);
        assert_eq!(bucket.remaining(Some(7)), 3);
        assert_eq!(bucket.remaining(Some(42)), 0);
    }

    #[test]
    fn level_stays_within_bounds_over_arbitrary_sequence() {
        let bucket = LeakyBucket::new(6, 3);
        let mut state = None;
        let mut now = 0_i64;
        let mut seed = 0x9e37_79b9_u64;
        for _ in 0..2_000 {
            seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            now += ((seed >> 33) % 700) as i64;
            let out = bucket.apply(state, now);
            assert!((0..=6).contains(&out.state.level));
            state = Some(out.state);
        }
    }
}
