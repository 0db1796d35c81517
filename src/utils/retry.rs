//! Retry with exponential backoff for Zotero API calls.
//!
//! Zotero signals overload with `429` or `503` plus a `Retry-After` header;
//! those waits are honored as a floor under the computed backoff.

use std::time::Duration;
use tokio::time::{sleep, timeout};

use crate::sources::SourceError;

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each later one
    pub initial_delay: Duration,
    /// Upper bound on the computed backoff
    pub max_delay: Duration,
    /// Budget for all attempts and waits together
    pub max_total_time: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            max_total_time: Duration::from_secs(120),
        }
    }
}

impl RetryConfig {
    /// Default backoff with `max_retries` retries after the first attempt
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_attempts: max_retries.saturating_add(1),
            ..Self::default()
        }
    }

    /// Backoff after failed attempt number `attempt` (1-based)
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// Why a failed call is worth repeating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientError {
    /// Connection failure or client-side timeout
    Network,
    /// `429`, or `503` with `Retry-After`; carries the server's wait in seconds
    RateLimit(Option<u64>),
    /// Any other `5xx`
    ServerError,
}

impl TransientError {
    /// Classify `err`; `None` means retrying cannot help
    pub fn from_source_error(err: &SourceError) -> Option<Self> {
        match err {
            SourceError::RateLimit(after) => Some(TransientError::RateLimit(*after)),
            SourceError::Network(_) => Some(TransientError::Network),
            // Api details start with the status line, e.g. "502 Bad Gateway"
            SourceError::Api(detail) if detail.starts_with('5') => Some(TransientError::ServerError),
            _ => None,
        }
    }

    /// Shortest wait before the next attempt
    pub fn min_delay(&self) -> Duration {
        match self {
            TransientError::RateLimit(Some(seconds)) => Duration::from_secs(*seconds),
            TransientError::RateLimit(None) => Duration::from_secs(10),
            TransientError::Network | TransientError::ServerError => Duration::ZERO,
        }
    }
}

/// Run `operation`, retrying transient failures
///
/// Permanent errors return immediately. The last transient error is
/// returned once attempts or the time budget run out.
pub async fn with_retry<T, F, Fut>(config: RetryConfig, mut operation: F) -> Result<T, SourceError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, SourceError>>,
{
    let started = tokio::time::Instant::now();
    let mut attempt = 0;

    loop {
        attempt += 1;
        let remaining = config.max_total_time.saturating_sub(started.elapsed());

        let error = match timeout(remaining, operation()).await {
            Ok(Ok(value)) => {
                if attempt > 1 {
                    tracing::info!("Request succeeded on attempt {}", attempt);
                }
                return Ok(value);
            }
            Ok(Err(error)) => error,
            Err(_) => SourceError::Network("Request timed out".to_string()),
        };

        let Some(transient) = TransientError::from_source_error(&error) else {
            return Err(error);
        };

        let delay = config.backoff(attempt).max(transient.min_delay());
        if attempt >= config.max_attempts || started.elapsed() + delay >= config.max_total_time {
            tracing::warn!("Giving up after {} attempts: {}", attempt, error);
            return Err(error);
        }

        tracing::debug!(
            "Attempt {}/{} failed ({:?}), retrying in {:?}",
            attempt,
            config.max_attempts,
            transient,
            delay
        );
        sleep(delay).await;
    }
}
