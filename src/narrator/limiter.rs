//! Per-user rate limiting for completion requests

use std::collections::HashMap;
use std::time::Instant;

use tokio::sync::RwLock;

/// Bucket count at which full buckets are dropped
const PRUNE_AT: usize = 256;

/// Rate limiter using token bucket algorithm
#[derive(Debug)]
pub struct RateLimiter {
    /// Tokens per user: user_id -> (tokens, last_refill)
    buckets: RwLock<HashMap<String, (f32, Instant)>>,
    /// Max tokens per bucket
    capacity: u32,
    /// Refill rate (tokens per second)
    refill_rate: f32,
}

impl RateLimiter {
    /// Create a limiter with `capacity` tokens refilled at `refill_rate` per second
    pub fn new(capacity: u32, refill_rate: f32) -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            capacity,
            refill_rate,
        }
    }

    fn refilled(&self, tokens: f32, last_refill: Instant) -> f32 {
        let elapsed = last_refill.elapsed().as_secs_f32();
        (tokens + elapsed * self.refill_rate).min(self.capacity as f32)
    }

    /// Consume a token (returns false if rate limited)
    pub async fn consume(&self, user_id: &str) -> bool {
        let mut buckets = self.buckets.write().await;
        let now = Instant::now();

        // A full bucket is the same as no bucket
        if buckets.len() >= PRUNE_AT {
            let capacity = self.capacity as f32;
            buckets.retain(|_, &mut (tokens, last_refill)| {
                self.refilled(tokens, last_refill) < capacity
            });
        }

        let (tokens, last_refill) = buckets
            .entry(user_id.to_string())
            .or_insert((self.capacity as f32, now));

        let refilled = self.refilled(*tokens, *last_refill);
        *last_refill = now;

        if refilled >= 1.0 {
            *tokens = refilled - 1.0;
            true
        } else {
            *tokens = refilled;
            false
        }
    }
}

impl Default for RateLimiter {
    /// 60 requests/minute
    fn default() -> Self {
        Self::new(60, 1.0)
    }
}
