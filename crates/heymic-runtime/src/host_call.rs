//! Classified host calls with a single fixed-delay retry.

use std::future::Future;
use std::time::Duration;

use heymic_config::PanelConfig;
use heymic_core::ClassifiedError;
use heymic_protocols::error::HostError;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Retry configuration for host calls that can be refused transiently.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt, for recoverable refusals only.
    pub max_retries: u32,
    /// Fixed delay before each retry.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            delay: Duration::from_millis(250),
        }
    }
}

impl From<&PanelConfig> for RetryPolicy {
    fn from(config: &PanelConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            delay: Duration::from_millis(config.retry_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// Run `operation`, retrying recoverable failures up to `max_retries` times.
    ///
    /// `attempts` is incremented once per host call made. Fatal and ignorable
    /// failures return immediately; callers decide what ignorable means.
    pub async fn run<F, Fut, T>(
        &self,
        label: &str,
        attempts: &mut u32,
        operation: F,
    ) -> Result<T, ClassifiedError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, HostError>>,
    {
        let mut retries = 0;
        loop {
            *attempts += 1;
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => ClassifiedError::from(e),
            };

            if !error.is_recoverable() || retries >= self.max_retries {
                debug!(label, class = ?error.class, %error, "host call failed");
                return Err(error);
            }

            retries += 1;
            warn!(
                "{} refused (attempt {}/{}): {}, retrying in {:?}",
                label,
                retries,
                self.max_retries + 1,
                error,
                self.delay
            );
            sleep(self.delay).await;
        }
    }
}

/// Await a host call whose failure only matters to diagnostics.
pub async fn best_effort<Fut>(label: &str, call: Fut) -> bool
where
    Fut: Future<Output = Result<(), HostError>>,
{
    match call.await {
        Ok(()) => true,
        Err(e) => {
            debug!(label, error = %e, "best-effort host call failed");
            false
        }
    }
}
