//! services/api/src/web/limiter.rs
//!
//! Per-client request rate limiting: one token bucket per client address, held
//! in a cache that forgets idle clients.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use moka::sync::Cache;

/// Clients not seen for this long lose their bucket.
const IDLE_TTL: Duration = Duration::from_secs(10 * 60);
const MAX_TRACKED_CLIENTS: u64 = 100_000;

/// Token bucket with continuous refill.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: u32,
    tokens: u32,
    last_refill: Instant,
    tokens_per_sec: f64,
}

impl TokenBucket {
    /// A full bucket of `capacity` tokens that regains `refill` tokens per `window`.
    pub fn new(capacity: u32, refill: u32, window: Duration) -> Self {
        Self {
            capacity,
            tokens: capacity,
            last_refill: Instant::now(),
            tokens_per_sec: f64::from(refill) / window.as_secs_f64(),
        }
    }

    pub fn try_consume(&mut self) -> bool {
        self.refill(Instant::now());
        if self.tokens > 0 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        let gained = (self.tokens_per_sec * elapsed) as u32;
        if gained > 0 {
            self.tokens = self.capacity.min(self.tokens.saturating_add(gained));
            self.last_refill = now;
        }
    }
}

/// Requests allowed per client per window.
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    buckets: Cache<Arc<str>, Arc<Mutex<TokenBucket>>>,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        let buckets = Cache::builder()
            .max_capacity(MAX_TRACKED_CLIENTS)
            .time_to_idle(IDLE_TTL.max(window))
            .build();
        Self {
            limit,
            window,
            buckets,
        }
    }

    pub fn per_minute(limit: u32) -> Self {
        Self::new(limit, Duration::from_secs(60))
    }

    /// Takes one token from `client`'s bucket. `false` means the client is over its limit.
    pub fn check(&self, client: &str) -> bool {
        let (limit, window) = (self.limit, self.window);
        let bucket = self.buckets.get_with(Arc::from(client), || {
            Arc::new(Mutex::new(TokenBucket::new(limit, limit, window)))
        });
        let mut bucket = bucket.lock().unwrap_or_else(PoisonError::into_inner);
        bucket.try_consume()
    }
}
