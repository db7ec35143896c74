//! Fixed-schedule retries for read requests

use crate::error::Result;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Backoff schedule; one retry per entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub backoffs: Vec<Duration>,
}

impl Default for RetryPolicy {
    /// Two retries, after 0.5s and then 2s.
    fn default() -> Self {
        Self {
            backoffs: vec![Duration::from_millis(500), Duration::from_secs(2)],
        }
    }
}

impl RetryPolicy {
    /// No retries at all.
    pub fn none() -> Self {
        Self { backoffs: vec![] }
    }

    pub fn max_attempts(&self) -> usize {
        self.backoffs.len() + 1
    }

    /// Run `op` until it succeeds, fails with a non-transient error, or the
    /// schedule is exhausted. The last error is returned.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0usize;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.backoffs.len() => {
                    let delay = self.backoffs[attempt];
                    attempt += 1;
                    warn!(
                        request = what,
                        attempt,
                        max_attempts = self.max_attempts(),
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
