//! Token bucket rate limiter for model API requests.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio::time::sleep;

/// Token bucket rate limiter.
///
/// Tokens refill continuously based on elapsed time:
/// `tokens = min(tokens + elapsed_seconds * refill_rate, capacity)`.
/// `acquire` waits until at least one token is available, then consumes it.
#[derive(Clone)]
pub struct TokenBucketRateLimiter {
    state: Arc<Mutex<BucketState>>,
    capacity: f64,
    refill_rate: f64,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucketRateLimiter {
    /// Create a limiter allowing `requests_per_second` sustained requests,
    /// with burst capacity equal to the refill rate.
    pub fn new(requests_per_second: f64) -> Self {
        assert!(requests_per_second > 0.0, "Rate limit must be positive");

        Self {
            state: Arc::new(Mutex::new(BucketState {
                tokens: requests_per_second,
                last_refill: Instant::now(),
            })),
            capacity: requests_per_second,
            refill_rate: requests_per_second,
        }
    }

    /// Wait until a token is available and consume it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                let elapsed = state.last_refill.elapsed().as_secs_f64();
                state.tokens = (state.tokens + elapsed * self.refill_rate).min(self.capacity);
                state.last_refill = Instant::now();

                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return;
                }
                // Time until one full token accumulates.
                Duration::from_secs_f64((1.0 - state.tokens) / self.refill_rate)
            };
            sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn burst_within_capacity_is_immediate() {
        let limiter = TokenBucketRateLimiter::new(10.0);
        let start = Instant::now();
        for _ in 0..5 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn acquire_beyond_capacity_waits() {
        let limiter = TokenBucketRateLimiter::new(2.0);
        let start = Instant::now();
        // Capacity 2, so the 3rd acquire has to wait roughly half a second.
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert!(
            start.elapsed() >= Duration::from_millis(400),
            "third acquire should have been throttled"
        );
    }
}
