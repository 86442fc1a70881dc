//! Circuit breaker

use std::time::Duration;

use tokio::time::Instant;

/// Breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Calls pass through
    Closed,
    /// Calls fail fast
    Open,
    /// One probe call is admitted
    HalfOpen,
}

/// Circuit breaker: opens after `failure_threshold` consecutive failures,
/// stays open for `cooldown`, then admits a single probe
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    cooldown: Duration,
    consecutive_failures: u32,
    state: BreakerState,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
}

impl CircuitBreaker {
    /// Create a closed breaker
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            cooldown,
            consecutive_failures: 0,
            state: BreakerState::Closed,
            opened_at: None,
            probe_in_flight: false,
        }
    }

    /// Current state
    pub fn state(&self) -> BreakerState {
        self.state
    }

    /// Whether a call may proceed right now
    pub fn call_permitted(&mut self) -> bool {
        match self.state {
            BreakerState::Closed => true,
            BreakerState::Open => {
                let cooled_down = self
                    .opened_at
                    .map(|at| at.elapsed() >= self.cooldown)
                    .unwrap_or(true);

                if cooled_down {
                    self.state = BreakerState::HalfOpen;
                    self.probe_in_flight = true;
                    true
                } else {
                    false
                }
            }
            BreakerState::HalfOpen => {
                if self.probe_in_flight {
                    false
                } else {
                    self.probe_in_flight = true;
                    true
                }
            }
        }
    }

    /// Record a successful call
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.state = BreakerState::Closed;
        self.opened_at = None;
        self.probe_in_flight = false;
    }

    /// Record a failed call
    pub fn record_failure(&mut self) {
        match self.state {
            BreakerState::HalfOpen => {
                // Probe failed, back to open
                self.open();
            }
            BreakerState::Closed => {
                self.consecutive_failures += 1;
                if self.consecutive_failures >= self.failure_threshold {
                    self.open();
                }
            }
            BreakerState::Open => {}
        }
    }

    fn open(&mut self) {
        self.state = BreakerState::Open;
        self.opened_at = Some(Instant::now());
        self.probe_in_flight = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_opens_after_threshold() {
        let mut breaker = CircuitBreaker::new(3, Duration::from_secs(30));

        for _ in 0..2 {
            assert!(breaker.call_permitted());
            breaker.record_failure();
        }
        assert_eq!(breaker.state(), BreakerState::Closed);

        assert!(breaker.call_permitted());
        breaker.record_failure();
        assert_eq!(breaker.state(), BreakerState::Open);

        // Fails fast while open
        assert!(!breaker.call_permitted());
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_probe() {
        let mut breaker = CircuitBreaker::new(1, Duration::from_secs(30));

        assert!(breaker.call_permitted());
        breaker.record_failure();
        assert!(!breaker.call_permitted());

        tokio::time::advance(Duration::from_secs(31)).await;

        // One probe admitted
        assert!(breaker.call_permitted());
        assert_eq!(breaker.state(), BreakerState::HalfOpen);
        assert!(!breaker.call_permitted());

        // Probe success closes the breaker
        breaker.record_success();
        assert_eq!(breaker.state(), BreakerState::Closed);
        assert!(breaker.call_permitted());
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_failure_reopens() {
        let mut breaker = CircuitBreaker::new(1, Duration::from_secs(30));

        assert!(breaker.call_permitted());
        breaker.record_failure();

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(breaker.call_permitted());
        breaker.record_failure();

        assert_eq!(breaker.state(), BreakerState::Open);
        assert!(!breaker.call_permitted());
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_resets_failure_count() {
        let mut breaker = CircuitBreaker::new(2, Duration::from_secs(30));

        breaker.record_failure();
        breaker.record_success();
        breaker.record_failure();

        // One failure after a success is below the threshold
        assert_eq!(breaker.state(), BreakerState::Closed);
    }
}
