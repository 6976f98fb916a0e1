//! Token bucket: capacity tokens, refilled in whole intervals, one token per
//! admitted request.

use edgeway_kernel::{BucketFormula, BucketOutcome, BucketState, TokenBucketConfig};

/// Key prefix for token bucket state.
pub const TOKEN_BUCKET_PREFIX: &str = "tb_";

/// Atomic server-side version of [`TokenBucket::apply`].
///
/// `ARGV`: capacity, refill_rate, refill_interval_ms, now_ms, ttl_secs.
pub const TOKEN_BUCKET_SCRIPT: &str = r"
local key = KEYS[1]
local capacity = tonumber(ARGV[1])
local refill_rate = tonumber(ARGV[2])
local refill_interval = tonumber(ARGV[3])
local now = tonumber(ARGV[4])
local ttl = tonumber(ARGV[5])

local state = redis.call('HMGET', key, 'tokens', 'last_refill')
local tokens = tonumber(state[1])
local last_refill = tonumber(state[2])
if tokens == nil then tokens = capacity end
if last_refill == nil then last_refill = now end

local elapsed = math.max(0, now - last_refill)
local refill = math.floor(elapsed / refill_interval) * refill_rate
tokens = math.max(0, math.min(capacity, tokens + refill))

local allowed = 0
if tokens >= 1 then
  tokens = tokens - 1
  allowed = 1
end

redis.call('HSET', key, 'tokens', tokens, 'last_refill', now)
redis.call('EXPIRE', key, ttl)
return {allowed, tokens}
";

/// Token bucket parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBucket {
    capacity: i64,
    refill_rate: i64,
    refill_interval_ms: i64,
}

impl TokenBucket {
    /// A zero interval is bumped to 1 ms so refill arithmetic never divides by zero.
    pub fn new(capacity: i64, refill_rate: i64, refill_interval_ms: i64) -> Self {
        Self {
            capacity: capacity.max(0),
            refill_rate: refill_rate.max(0),
            refill_interval_ms: refill_interval_ms.max(1),
        }
    }

    pub fn from_config(config: &TokenBucketConfig) -> Self {
        Self::new(
            config.capacity,
            config.refill_rate,
            config.refill_interval_ms,
        )
    }
}

impl BucketFormula for TokenBucket {
    fn key_prefix(&self) -> &'static str {
        TOKEN_BUCKET_PREFIX
    }

    fn level_field(&self) -> &'static str {
        "tokens"
    }

    fn script(&self) -> &'static str {
        TOKEN_BUCKET_SCRIPT
    }

    fn script_args(&self) -> Vec<i64> {
        vec![self.capacity, self.refill_rate, self.refill_interval_ms]
    }

    fn capacity(&self) -> i64 {
        self.capacity
    }

    fn apply(&self, prior: Option<BucketState>, now_ms: i64) -> BucketOutcome {
        let (tokens, last_refill) = match prior {
            Some(state) => (state.level, state.last_update_ms),
            None => (self.capacity, now_ms),
        };

        // Clock skew between instances can put last_refill in the future.
        let elapsed = now_ms.saturating_sub(last_refill).max(0);
        let refill = (elapsed / self.refill_interval_ms).saturating_mul(self.refill_rate);
        let mut tokens = tokens.saturating_add(refill).clamp(0, self.capacity);

        let allowed = tokens >= 1;
        if allowed {
            tokens -= 1;
        }

        BucketOutcome {
            state: BucketState {
                level: tokens,
                last_update_ms: now_ms,
            },
            allowed,
        }
    }

    fn remaining(&self, level: Option<i64>) -> u64 {
        level.unwrap_or(self.capacity).clamp(0, self.capacity) as u64
    }
}
