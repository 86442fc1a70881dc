//! Networking resilience
//!
//! Every mint request goes through the same pipeline: the per-endpoint
//! circuit breaker may fail fast, the per-endpoint token bucket may delay the
//! call, and retryable failures are re-attempted with exponential backoff.
//! Endpoints are keyed by host plus path, and the registry is shared between
//! wallets talking to the same mint.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

pub mod breaker;
pub mod limiter;
pub mod retry;

pub use breaker::{BreakerState, CircuitBreaker};
pub use limiter::TokenBucket;
pub use retry::RetryPolicy;

use crate::error::Error;

/// Policy knobs, with the defaults the wallet ships with
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    /// Requests allowed per minute per endpoint
    pub rate_limit_per_minute: u32,
    /// Burst capacity of the rate limiter
    pub rate_limit_burst: u32,
    /// Longest a call will wait on the rate limiter before failing
    pub rate_limit_max_wait: Duration,
    /// Consecutive failures before the breaker opens
    pub breaker_failure_threshold: u32,
    /// How long the breaker stays open
    pub breaker_cooldown: Duration,
    /// Retry behavior
    pub retry: RetryPolicy,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            rate_limit_per_minute: 60,
            rate_limit_burst: 10,
            rate_limit_max_wait: Duration::from_secs(10),
            breaker_failure_threshold: 5,
            breaker_cooldown: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

/// Shared rate-limit and breaker state, keyed per host+path
#[derive(Debug)]
pub struct NetworkPolicy {
    config: PolicyConfig,
    buckets: Mutex<HashMap<String, TokenBucket>>,
    breakers: Mutex<HashMap<String, Arc<Mutex<CircuitBreaker>>>>,
}

impl NetworkPolicy {
    /// Create a policy registry
    pub fn new(config: PolicyConfig) -> Self {
        Self {
            config,
            buckets: Mutex::new(HashMap::new()),
            breakers: Mutex::new(HashMap::new()),
        }
    }

    async fn breaker(&self, endpoint: &str) -> Arc<Mutex<CircuitBreaker>> {
        let mut breakers = self.breakers.lock().await;
        breakers
            .entry(endpoint.to_string())
            .or_insert_with(|| {
                Arc::new(Mutex::new(CircuitBreaker::new(
                    self.config.breaker_failure_threshold,
                    self.config.breaker_cooldown,
                )))
            })
            .clone()
    }

    async fn acquire_slot(&self, endpoint: &str) -> Result<(), Error> {
        let wait = {
            let mut buckets = self.buckets.lock().await;
            buckets
                .entry(endpoint.to_string())
                .or_insert_with(|| {
                    TokenBucket::new(
                        self.config.rate_limit_per_minute,
                        self.config.rate_limit_burst,
                    )
                })
                .try_take()
        };

        if wait.is_zero() {
            return Ok(());
        }

        if wait > self.config.rate_limit_max_wait {
            return Err(Error::RateLimited);
        }

        tokio::time::sleep(wait).await;
        Ok(())
    }

    /// Run `call` under the endpoint's breaker, rate limit and retry policy
    pub async fn run<F, Fut, T>(&self, endpoint: &str, call: F) -> Result<T, Error>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let breaker = self.breaker(endpoint).await;

        let mut attempt: u32 = 1;

        loop {
            if !breaker.lock().await.call_permitted() {
                return Err(Error::CircuitOpen);
            }

            self.acquire_slot(endpoint).await?;

            match call().await {
                Ok(value) => {
                    breaker.lock().await.record_success();
                    return Ok(value);
                }
                Err(err) => {
                    breaker.lock().await.record_failure();

                    if err.is_retryable() && attempt < self.config.retry.max_attempts {
                        let delay = self.config.retry.delay(attempt);
                        tracing::debug!(
                            "Retrying {endpoint} after {delay:?} (attempt {attempt}): {err}"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    return Err(err);
                }
            }
        }
    }
}

impl Default for NetworkPolicy {
    fn default() -> Self {
        Self::new(PolicyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_errors() {
        let policy = NetworkPolicy::default();
        let calls = AtomicU32::new(0);

        let result: Result<u32, Error> = policy
            .run("mint.example.com/v1/swap", || async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(Error::Timeout)
                } else {
                    Ok(42)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_does_not_retry_terminal_errors() {
        let policy = NetworkPolicy::default();
        let calls = AtomicU32::new(0);

        let result: Result<u32, Error> = policy
            .run("mint.example.com/v1/swap", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::Http {
                    code: 400,
                    detail: "bad".to_string(),
                })
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let policy = NetworkPolicy::default();
        let calls = AtomicU32::new(0);

        let result: Result<u32, Error> = policy
            .run("mint.example.com/v1/swap", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::Timeout)
            })
            .await;

        assert!(matches!(result, Err(Error::Timeout)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_breaker_opens_and_fails_fast() {
        let mut config = PolicyConfig::default();
        config.retry.max_attempts = 1;
        config.breaker_failure_threshold = 2;
        let policy = NetworkPolicy::new(config);

        for _ in 0..2 {
            let _: Result<(), Error> = policy
                .run("mint.example.com/v1/info", || async { Err(Error::Timeout) })
                .await;
        }

        let result: Result<(), Error> = policy
            .run("mint.example.com/v1/info", || async { Ok(()) })
            .await;

        assert!(matches!(result, Err(Error::CircuitOpen)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_breaker_is_per_endpoint() {
        let mut config = PolicyConfig::default();
        config.retry.max_attempts = 1;
        config.breaker_failure_threshold = 1;
        let policy = NetworkPolicy::new(config);

        let _: Result<(), Error> = policy
            .run("mint.example.com/v1/info", || async { Err(Error::Timeout) })
            .await;

        // Another endpoint on the same host is unaffected
        let result: Result<u32, Error> = policy
            .run("mint.example.com/v1/keysets", || async { Ok(7) })
            .await;
        assert_eq!(result.unwrap(), 7);
    }
}
