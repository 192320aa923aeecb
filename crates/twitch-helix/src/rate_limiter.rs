//! Token bucket rate limiting for Helix requests.
//!
//! Helix budgets requests per client id, so a single bucket is shared by
//! every call made through one [`crate::HelixClient`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::trace;

use crate::HelixError;

/// Configuration for a rate limiter.
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum tokens (burst capacity).
    pub max_tokens: u32,
    /// Tokens added per second.
    pub refill_rate: f64,
    /// Initial tokens.
    pub initial_tokens: u32,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_tokens: 20,
            refill_rate: 10.0,
            initial_tokens: 20,
        }
    }
}

impl RateLimiterConfig {
    /// Create a config for a specific requests-per-second limit.
    pub fn with_rps(rps: f64) -> Result<Self, HelixError> {
        if !rps.is_finite() || rps <= 0.0 {
            return Err(HelixError::InvalidConfig(format!(
                "rate limit must be a positive finite number, got {}",
                rps
            )));
        }

        let max_tokens = (rps * 2.0).ceil().max(1.0) as u32; // burst of 2x, min 1

        Ok(Self {
            max_tokens,
            refill_rate: rps,
            initial_tokens: max_tokens,
        })
    }
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    max_tokens: u32,
    refill_rate: f64,
    last_refill: Instant,
}

impl Bucket {
    fn new(config: &RateLimiterConfig) -> Self {
        Self {
            tokens: config.initial_tokens as f64,
            max_tokens: config.max_tokens,
            refill_rate: config.refill_rate,
            last_refill: Instant::now(),
        }
    }

    fn try_acquire(&mut self) -> bool {
        self.refill();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn time_until_available(&mut self) -> Duration {
        self.refill();

        if self.tokens >= 1.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64((1.0 - self.tokens) / self.refill_rate)
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill);
        self.tokens =
            (self.tokens + elapsed.as_secs_f64() * self.refill_rate).min(self.max_tokens as f64);
        self.last_refill = now;
    }
}

/// Shared token bucket. Cloning shares the bucket.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    bucket: Arc<Mutex<Bucket>>,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            bucket: Arc::new(Mutex::new(Bucket::new(&config))),
        }
    }

    /// Try to take a token without waiting.
    pub async fn try_acquire(&self) -> bool {
        self.bucket.lock().await.try_acquire()
    }

    /// Take a token, waiting for a refill if necessary. Returns the time waited.
    ///
    /// Cancel-safe: the lock is never held across the sleep, so dropping the
    /// future consumes nothing.
    pub async fn acquire(&self) -> Duration {
        let mut total_wait = Duration::ZERO;

        loop {
            let wait = {
                let mut bucket = self.bucket.lock().await;
                if bucket.try_acquire() {
                    return total_wait;
                }
                bucket.time_until_available()
            };

            trace!(wait = ?wait, "helix rate limited");
            tokio::time::sleep(wait).await;
            total_wait += wait;
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimiterConfig::default())
    }
}
