// Retry logic
// The source notes left retry undecided, so nothing is retried unless configured.
use crate::application::constants::{
    DEFAULT_BACKOFF_FACTOR, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_BASE_DELAY_MS, MAX_RETRY_DELAY_MS,
};
use crate::domain::{RunOutcome, SequenceNumber};
use crate::port::JobExecutor;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Retry decision result
#[derive(Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Run the job again after this delay
    Retry(Duration),
    /// Keep the outcome as final
    GiveUp,
}

/// Retry policy applied on top of a [`JobExecutor`]
///
/// Determines if a run should be repeated based on:
/// - The outcome of the last attempt
/// - Attempts made so far vs `max_attempts`
/// - Backoff factor for exponential delay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub backoff_factor: f64,
    /// Retry `FatalError` too, not only `RecoverableError`
    pub retry_fatal: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            retry_fatal: true,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("retry.max_attempts must be at least 1".to_string());
        }
        if !self.backoff_factor.is_finite() || self.backoff_factor < 1.0 {
            return Err(format!(
                "retry.backoff_factor must be >= 1.0 (got {})",
                self.backoff_factor
            ));
        }
        Ok(())
    }

    /// Decide whether to repeat the run after `attempt` (1-based) produced `outcome`
    ///
    /// Backoff formula:
    /// delay = base_delay * (backoff_factor ^ (attempt - 1)) * (1.0 ± 0.1)
    pub fn should_retry(
        &self,
        outcome: &RunOutcome,
        attempt: u32,
        sequence: SequenceNumber,
    ) -> RetryDecision {
        let retryable = match outcome {
            RunOutcome::Success => false,
            RunOutcome::RecoverableError { .. } => true,
            RunOutcome::FatalError { .. } => self.retry_fatal,
        };
        if !retryable {
            return RetryDecision::GiveUp;
        }

        if attempt >= self.max_attempts {
            if self.max_attempts > 1 {
                warn!(
                    sequence = %sequence,
                    attempts = %attempt,
                    max_attempts = %self.max_attempts,
                    "Max retry attempts reached"
                );
            }
            return RetryDecision::GiveUp;
        }

        RetryDecision::Retry(self.delay_for(attempt, sequence))
    }

    /// Backoff before the attempt following `attempt`
    pub fn delay_for(&self, attempt: u32, sequence: SequenceNumber) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let base = self.base_delay_ms as f64 * self.backoff_factor.powi(exponent);

        // ±10% jitter, seeded by the sequence number so a given day is reproducible
        let jitter_factor = 0.9 + ((sequence.get() % 21) as f64 / 100.0); // 0.9 to 1.1

        let delay_ms = (base * jitter_factor).min(MAX_RETRY_DELAY_MS as f64) as u64;
        Duration::from_millis(delay_ms)
    }
}

/// Executor decorator that applies a [`RetryPolicy`]
///
/// Returns the outcome of the last attempt.
pub struct RetryingExecutor {
    inner: Arc<dyn JobExecutor>,
    policy: RetryPolicy,
}

impl RetryingExecutor {
    pub fn new(inner: Arc<dyn JobExecutor>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl JobExecutor for RetryingExecutor {
    async fn run(&self, sequence: SequenceNumber) -> RunOutcome {
        let mut attempt = 1;
        loop {
            let outcome = self.inner.run(sequence).await;

            match self.policy.should_retry(&outcome, attempt, sequence) {
                RetryDecision::GiveUp => return outcome,
                RetryDecision::Retry(delay) => {
                    info!(
                        sequence = %sequence,
                        attempt = %attempt,
                        outcome = %outcome,
                        delay_ms = %delay.as_millis(),
                        "Scheduling retry"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
