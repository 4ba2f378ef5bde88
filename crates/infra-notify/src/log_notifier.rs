// Log-only notifier, used when no webhook is configured

use async_trait::async_trait;
use tracing::{error, info};

use dailyseq_core::domain::{ErrorKind, SequenceNumber};
use dailyseq_core::port::notifier::{error_text, success_text};
use dailyseq_core::port::{Notifier, NotifyError};

/// Writes the diagnostic message to the structured log instead of a channel
pub struct LogNotifier {
    channel: String,
}

impl LogNotifier {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
        }
    }
}

impl Default for LogNotifier {
    fn default() -> Self {
        Self::new("log")
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn report_success(&self, sequence: SequenceNumber) -> Result<(), NotifyError> {
        info!(
            channel = %self.channel,
            sequence = %sequence,
            "{}",
            success_text(sequence)
        );
        Ok(())
    }

    async fn report_error(
        &self,
        sequence: SequenceNumber,
        kind: &ErrorKind,
        detail: &str,
    ) -> Result<(), NotifyError> {
        error!(
            channel = %self.channel,
            sequence = %sequence,
            kind = %kind,
            detail = %detail,
            "{}",
            error_text(sequence, kind, detail)
        );
        Ok(())
    }
}
