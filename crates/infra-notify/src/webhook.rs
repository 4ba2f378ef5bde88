// Webhook notifier: one JSON POST per report
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use dailyseq_core::domain::{ErrorKind, SequenceNumber};
use dailyseq_core::port::notifier::{error_text, success_text};
use dailyseq_core::port::{Notifier, NotifyError, TimeProvider};

/// Default request timeout (10 seconds)
pub const DEFAULT_WEBHOOK_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub webhook_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_secs: DEFAULT_WEBHOOK_TIMEOUT_SECS,
        }
    }
}

/// Body posted to the webhook
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    channel: &'a str,
    sequence: u64,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<&'a str>,
    text: String,
    sent_at: String,
}

/// Posts confirmations and error reports for the diagnostic channel to a
/// webhook. The receiving side owns the actual chat-platform delivery.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    diagnostic_channel: String,
    time_provider: Arc<dyn TimeProvider>,
}

impl WebhookNotifier {
    pub fn new(
        url: impl Into<String>,
        diagnostic_channel: impl Into<String>,
        timeout: Duration,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Misconfigured(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
            diagnostic_channel: diagnostic_channel.into(),
            time_provider,
        })
    }

    fn sent_at(&self) -> String {
        DateTime::<Utc>::from_timestamp_millis(self.time_provider.now_millis())
            .unwrap_or_default()
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    async fn post(&self, payload: &WebhookPayload<'_>) -> Result<(), NotifyError> {
        debug!(url = %self.url, channel = %payload.channel, status = %payload.status, "Posting notification");

        let response = self
            .client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(url = %self.url, status = %status, "Webhook rejected notification");
            return Err(NotifyError::Rejected {
                channel: self.diagnostic_channel.clone(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn report_success(&self, sequence: SequenceNumber) -> Result<(), NotifyError> {
        let payload = WebhookPayload {
            channel: &self.diagnostic_channel,
            sequence: sequence.get(),
            status: "success",
            kind: None,
            detail: None,
            text: success_text(sequence),
            sent_at: self.sent_at(),
        };
        self.post(&payload).await
    }

    async fn report_error(
        &self,
        sequence: SequenceNumber,
        kind: &ErrorKind,
        detail: &str,
    ) -> Result<(), NotifyError> {
        let payload = WebhookPayload {
            channel: &self.diagnostic_channel,
            sequence: sequence.get(),
            status: "error",
            kind: Some(kind.as_str()),
            detail: Some(detail),
            text: error_text(sequence, kind, detail),
            sent_at: self.sent_at(),
        };
        self.post(&payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dailyseq_core::port::time_provider::mocks::SteppingTimeProvider;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    const EPOCH_2024: i64 = 1_704_067_200_000; // 2024-01-01T00:00:00Z

    /// Accept one HTTP request, answer with `status`, return the request body
    async fn one_shot_server(status: u16) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/hook", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if buf.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {} X\r\ncontent-length: 4\r\nconnection: close\r\n\r\nnope",
                status
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();

            let text = String::from_utf8_lossy(&buf).to_string();
            text.split_once("\r\n\r\n")
                .map(|(_, body)| body.to_string())
                .unwrap_or_default()
        });

        (url, handle)
    }

    fn notifier(url: &str) -> WebhookNotifier {
        WebhookNotifier::new(
            url,
            "diag@c.us",
            Duration::from_secs(5),
            Arc::new(SteppingTimeProvider::new(EPOCH_2024, 0)),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_success_payload() {
        let (url, server) = one_shot_server(200).await;

        notifier(&url)
            .report_success(SequenceNumber::new(1).unwrap())
            .await
            .unwrap();

        let body: serde_json::Value = serde_json::from_str(&server.await.unwrap()).unwrap();
        assert_eq!(body["channel"], "diag@c.us");
        assert_eq!(body["sequence"], 1);
        assert_eq!(body["status"], "success");
        assert_eq!(body["text"], "Daily run #1 completed successfully");
        assert_eq!(body["sent_at"], "2024-01-01T00:00:00.000Z");
        assert!(body.get("kind").is_none());
    }

    #[tokio::test]
    async fn test_error_payload() {
        let (url, server) = one_shot_server(200).await;

        notifier(&url)
            .report_error(
                SequenceNumber::new(7).unwrap(),
                &ErrorKind::FileNotFound,
                "day3.jpg",
            )
            .await
            .unwrap();

        let body: serde_json::Value = serde_json::from_str(&server.await.unwrap()).unwrap();
        assert_eq!(body["status"], "error");
        assert_eq!(body["kind"], "file_not_found");
        assert_eq!(body["detail"], "day3.jpg");
        assert_eq!(body["text"], "Daily run #7 failed (file_not_found): day3.jpg");
    }

    #[tokio::test]
    async fn test_non_2xx_is_rejected() {
        let (url, server) = one_shot_server(500).await;

        let err = notifier(&url)
            .report_success(SequenceNumber::new(2).unwrap())
            .await
            .unwrap_err();
        server.await.unwrap();

        match err {
            NotifyError::Rejected { status, channel, .. } => {
                assert_eq!(status, 500);
                assert_eq!(channel, "diag@c.us");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        // Bind then drop to get a port nothing listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = notifier(&format!("http://{}/hook", addr))
            .report_success(SequenceNumber::new(2).unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, NotifyError::Transport(_)));
    }
}
