//! Timeout and bounded retry for upstream calls

use crate::config::ProvidersConfig;
use crate::constants::travel::{BACKOFF_BASE_MS, BACKOFF_MAX_MS};
use crate::error::{Error, Result};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// How an upstream call is bounded and retried
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub retries: u32,
    /// Limit on each individual attempt
    pub timeout: Duration,
    /// Delay before the first retry, doubled for each later one
    pub base_delay: Duration,
    /// Upper bound on a single delay
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32, timeout: Duration) -> Self {
        Self {
            retries,
            timeout,
            base_delay: Duration::from_millis(BACKOFF_BASE_MS),
            max_delay: Duration::from_millis(BACKOFF_MAX_MS),
        }
    }

    pub fn from_config(providers: &ProvidersConfig) -> Self {
        Self::new(providers.retry_attempts, providers.timeout())
    }

    pub fn with_backoff(mut self, base_delay: Duration, max_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self.max_delay = max_delay;
        self
    }

    /// Delay before retry number `attempt` (0-based), with up to 25% jitter
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let growth = 1_u32 << attempt.min(6);
        let delay = self.base_delay.saturating_mul(growth).min(self.max_delay);
        let jitter_ms = u64::try_from(delay.as_millis() / 4).unwrap_or(0);
        let jitter = rand::thread_rng().gen_range(0..=jitter_ms);
        delay + Duration::from_millis(jitter)
    }

    /// Run `op` until it succeeds or the attempts are used up
    ///
    /// Each attempt is cut off after `timeout`. Errors that are not
    /// [retriable](Error::is_retriable) are returned immediately; otherwise the
    /// last error is returned on exhaustion.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.retries {
            if attempt > 0 {
                tokio::time::sleep(self.backoff_delay(attempt - 1)).await;
            }

            match tokio::time::timeout(self.timeout, op()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) if !e.is_retriable() => {
                    debug!("{} failed permanently: {}", label, e);
                    return Err(e);
                }
                Ok(Err(e)) => {
                    debug!("{} attempt {} failed: {}", label, attempt + 1, e);
                    last_error = Some(e);
                }
                Err(_) => {
                    debug!("{} attempt {} timed out", label, attempt + 1);
                    last_error = Some(Error::Unavailable(format!(
                        "{} timed out after {}ms",
                        label,
                        self.timeout.as_millis()
                    )));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::Provider(format!("{} was not attempted", label))))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ProvidersConfig::default())
    }
}
