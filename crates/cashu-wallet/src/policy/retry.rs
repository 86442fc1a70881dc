//! Retry with exponential backoff and jitter

use std::time::Duration;

use rand::Rng;

/// Retry policy: `base * 2^(attempt-1) + jitter`, bounded attempts
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,
    /// Base delay before the first retry
    pub base_delay: Duration,
    /// Upper bound of the random jitter added to every delay
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            jitter: Duration::from_millis(50),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let backoff = self.base_delay.saturating_mul(1 << exp);

        let jitter = if self.jitter.is_zero() {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(
                rand::thread_rng().gen_range(0.0..self.jitter.as_secs_f64()),
            )
        };

        backoff + jitter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            jitter: Duration::ZERO,
        };

        assert_eq!(policy.delay(1), Duration::from_millis(200));
        assert_eq!(policy.delay(2), Duration::from_millis(400));
        assert_eq!(policy.delay(3), Duration::from_millis(800));
    }

    #[test]
    fn test_jitter_is_bounded() {
        let policy = RetryPolicy::default();

        for attempt in 1..=3 {
            let base = Duration::from_millis(200) * (1 << (attempt - 1));
            let delay = policy.delay(attempt);
            assert!(delay >= base);
            assert!(delay < base + Duration::from_millis(50));
        }
    }
}
