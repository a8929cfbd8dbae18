//! Retry policy for provider calls.
//!
//! The policy is plain data: the client asks it what to do after each failed
//! attempt and sleeps through an injectable [`Sleeper`].

use crate::config::RetryConfig;
use crate::error::AnalysisError;
use async_trait::async_trait;
use std::time::Duration;

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait, then try again
    Retry(Duration),
    /// Surface the error
    GiveUp,
}

/// Bounded retry policy with exponential backoff for retryable statuses and
/// a fixed delay for transport failures.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff_multiplier: f64,
    pub transport_delay: Duration,
    pub max_delay: Duration,
    pub retryable_statuses: Vec<u16>,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            backoff_multiplier: config.backoff_multiplier,
            transport_delay: Duration::from_millis(config.transport_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            retryable_statuses: config.retryable_statuses.clone(),
        }
    }

    /// Whether an HTTP status is retried with backoff (HTTP 429 by default).
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }

    /// Backoff before the retry that follows attempt `attempt` (1-based):
    /// `base_delay * multiplier^(attempt - 1)`, capped at `max_delay`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.base_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            self.max_delay
        } else {
            Duration::from_secs_f64(secs)
        }
    }

    /// Decide what follows a failure of attempt `attempt` (1-based).
    pub fn decide(&self, attempt: u32, error: &AnalysisError) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::GiveUp;
        }
        match error {
            AnalysisError::RateLimited { .. } => RetryDecision::Retry(self.backoff_delay(attempt)),
            e if e.is_transport_retryable() => {
                RetryDecision::Retry(self.transport_delay.min(self.max_delay))
            }
            _ => RetryDecision::GiveUp,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Abstraction over waiting so retry timing can be tested without real delays.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
