// Run Outcome Domain Model

use std::fmt;

use serde::{Deserialize, Serialize};

use super::sequence::SequenceNumber;

/// Failure classes a job can report.
///
/// The textual form is snake_case (`file_not_found`) and is shared by logs,
/// webhook payloads and the subprocess stderr protocol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ErrorKind {
    FileNotFound,
    SendFailed,
    Authentication,
    Timeout,
    /// Kind attached to every `FatalError` when it is reported.
    Fatal,
    Other(String),
}

impl ErrorKind {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorKind::FileNotFound => "file_not_found",
            ErrorKind::SendFailed => "send_failed",
            ErrorKind::Authentication => "authentication",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Fatal => "fatal",
            ErrorKind::Other(name) => name,
        }
    }
}

impl From<&str> for ErrorKind {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "file_not_found" | "filenotfound" => ErrorKind::FileNotFound,
            "send_failed" | "sendfailed" | "sending_error" => ErrorKind::SendFailed,
            "authentication" | "authentication_error" | "auth" => ErrorKind::Authentication,
            "timeout" => ErrorKind::Timeout,
            "fatal" => ErrorKind::Fatal,
            _ => ErrorKind::Other(s.trim().to_string()),
        }
    }
}

impl From<String> for ErrorKind {
    fn from(s: String) -> Self {
        ErrorKind::from(s.as_str())
    }
}

impl From<ErrorKind> for String {
    fn from(kind: ErrorKind) -> String {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified result of one job run. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Success,
    /// Partial failure, e.g. one of several files missing.
    RecoverableError { kind: ErrorKind, detail: String },
    /// No usable result at all.
    FatalError { detail: String },
}

impl RunOutcome {
    pub fn recoverable(kind: impl Into<ErrorKind>, detail: impl Into<String>) -> Self {
        RunOutcome::RecoverableError {
            kind: kind.into(),
            detail: detail.into(),
        }
    }

    pub fn fatal(detail: impl Into<String>) -> Self {
        RunOutcome::FatalError {
            detail: detail.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success)
    }

    /// `(kind, detail)` to report, or `None` for `Success`.
    pub fn error_parts(&self) -> Option<(ErrorKind, &str)> {
        match self {
            RunOutcome::Success => None,
            RunOutcome::RecoverableError { kind, detail } => Some((kind.clone(), detail)),
            RunOutcome::FatalError { detail } => Some((ErrorKind::Fatal, detail)),
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Success => write!(f, "SUCCESS"),
            RunOutcome::RecoverableError { kind, .. } => write!(f, "RECOVERABLE_ERROR({})", kind),
            RunOutcome::FatalError { .. } => write!(f, "FATAL_ERROR"),
        }
    }
}

/// What one invocation of the sequencer did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub sequence: SequenceNumber,
    pub outcome: RunOutcome,
    pub duration_ms: i64,
    /// Counter value persisted by the commit step.
    pub committed: SequenceNumber,
}
