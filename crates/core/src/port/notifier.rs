// Notifier Port
// Delivers confirmations and error reports to the diagnostic channel

use crate::domain::{ErrorKind, SequenceNumber};
use async_trait::async_trait;
use thiserror::Error;

/// Notification delivery errors (never retried)
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Rejected by {channel} (status {status}): {body}")]
    Rejected {
        channel: String,
        status: u16,
        body: String,
    },

    #[error("Notifier misconfigured: {0}")]
    Misconfigured(String),
}

/// Notifier trait
///
/// Exactly one of the two methods is called per invocation.
///
/// Implementations:
/// - WebhookNotifier: JSON POST to a webhook
/// - LogNotifier: structured log lines only
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Confirm that the run for `sequence` succeeded
    async fn report_success(&self, sequence: SequenceNumber) -> Result<(), NotifyError>;

    /// Report a failed run with its classified kind and detail
    async fn report_error(
        &self,
        sequence: SequenceNumber,
        kind: &ErrorKind,
        detail: &str,
    ) -> Result<(), NotifyError>;
}

/// Human-readable confirmation text
pub fn success_text(sequence: SequenceNumber) -> String {
    format!("Daily run #{} completed successfully", sequence)
}

/// Human-readable error text
pub fn error_text(sequence: SequenceNumber, kind: &ErrorKind, detail: &str) -> String {
    if detail.is_empty() {
        format!("Daily run #{} failed ({})", sequence, kind)
    } else {
        format!("Daily run #{} failed ({}): {}", sequence, kind, detail)
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// One recorded notifier call
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Notification {
        Success(u64),
        Error {
            sequence: u64,
            kind: ErrorKind,
            detail: String,
        },
    }

    /// Records every call; can be told to fail delivery.
    #[derive(Clone, Default)]
    pub struct RecordingNotifier {
        sent: Arc<Mutex<Vec<Notification>>>,
        fail: Arc<Mutex<bool>>,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing() -> Self {
            let notifier = Self::new();
            *notifier.fail.lock().unwrap() = true;
            notifier
        }

        /// All calls, including the ones that were made to fail
        pub fn sent(&self) -> Vec<Notification> {
            self.sent.lock().unwrap().clone()
        }

        pub fn success_count(&self) -> usize {
            self.sent()
                .iter()
                .filter(|n| matches!(n, Notification::Success(_)))
                .count()
        }

        pub fn error_count(&self) -> usize {
            self.sent()
                .iter()
                .filter(|n| matches!(n, Notification::Error { .. }))
                .count()
        }

        fn record(&self, notification: Notification) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(notification);
            if *self.fail.lock().unwrap() {
                return Err(NotifyError::Transport("injected delivery failure".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn report_success(&self, sequence: SequenceNumber) -> Result<(), NotifyError> {
            self.record(Notification::Success(sequence.get()))
        }

        async fn report_error(
            &self,
            sequence: SequenceNumber,
            kind: &ErrorKind,
            detail: &str,
        ) -> Result<(), NotifyError> {
            self.record(Notification::Error {
                sequence: sequence.get(),
                kind: kind.clone(),
                detail: detail.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_texts() {
        let seq = SequenceNumber::new(7).unwrap();
        assert_eq!(success_text(seq), "Daily run #7 completed successfully");
        assert_eq!(
            error_text(seq, &ErrorKind::FileNotFound, "day3.jpg"),
            "Daily run #7 failed (file_not_found): day3.jpg"
        );
        assert_eq!(
            error_text(seq, &ErrorKind::Fatal, ""),
            "Daily run #7 failed (fatal)"
        );
    }
}
