//! Token-bucket rate limiter

use std::time::Duration;

use tokio::time::Instant;

/// Token bucket: `rate_per_minute` refill, `burst` capacity
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    tokens: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// Create a bucket, initially full
    pub fn new(rate_per_minute: u32, burst: u32) -> Self {
        Self {
            capacity: burst as f64,
            tokens: burst as f64,
            refill_per_sec: rate_per_minute as f64 / 60.0,
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        self.last_refill = now;
    }

    /// Take one token, returning how long the caller must wait first.
    /// `Duration::ZERO` means the call may proceed immediately.
    pub fn try_take(&mut self) -> Duration {
        self.refill();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            return Duration::ZERO;
        }

        // Token is consumed up front; the deficit is the wait
        let deficit = 1.0 - self.tokens;
        self.tokens -= 1.0;
        Duration::from_secs_f64(deficit / self.refill_per_sec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_burst_then_wait() {
        let mut bucket = TokenBucket::new(60, 3);

        // Burst capacity is available immediately
        assert_eq!(bucket.try_take(), Duration::ZERO);
        assert_eq!(bucket.try_take(), Duration::ZERO);
        assert_eq!(bucket.try_take(), Duration::ZERO);

        // Next call has to wait roughly one refill interval
        let wait = bucket.try_take();
        assert!(wait > Duration::ZERO);
        assert!(wait <= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refills_over_time() {
        let mut bucket = TokenBucket::new(60, 1);

        assert_eq!(bucket.try_take(), Duration::ZERO);
        assert!(bucket.try_take() > Duration::ZERO);

        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(bucket.try_take(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_does_not_exceed_capacity() {
        let mut bucket = TokenBucket::new(60, 2);

        tokio::time::advance(Duration::from_secs(3600)).await;

        assert_eq!(bucket.try_take(), Duration::ZERO);
        assert_eq!(bucket.try_take(), Duration::ZERO);
        assert!(bucket.try_take() > Duration::ZERO);
    }
}
