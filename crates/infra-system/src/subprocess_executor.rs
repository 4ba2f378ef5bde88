// Subprocess job executor
// reason: async-trait, tokio for async process management
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::process::{Output, Stdio};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{info, warn};

use dailyseq_core::domain::{ErrorKind, RunOutcome, SequenceNumber};
use dailyseq_core::port::{JobExecutor, TimeProvider};

/// Placeholder replaced by the sequence number in `args`
pub const SEQUENCE_PLACEHOLDER: &str = "{sequence}";

/// Env var carrying the sequence number into the child
pub const SEQUENCE_ENV: &str = "DAILYSEQ_SEQUENCE";

/// Env var carrying the primary channel id into the child
pub const PRIMARY_CHANNEL_ENV: &str = "DAILYSEQ_PRIMARY_CHANNEL";

/// EX_TEMPFAIL from sysexits.h
pub const DEFAULT_RECOVERABLE_EXIT_CODE: i32 = 75;

/// How to launch the daily job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobCommandConfig {
    pub command: String,
    pub args: Vec<String>,
    pub working_dir: String,
    /// On expiry the child's whole process group is killed, including
    /// anything it spawned
    pub timeout_secs: Option<u64>,
    /// Inherited environment variables passed through to the child
    pub env_allowlist: Vec<String>,
    /// Exit codes meaning "partial failure"; the rest of non-zero codes are fatal
    pub recoverable_exit_codes: Vec<i32>,
}

impl Default for JobCommandConfig {
    fn default() -> Self {
        Self {
            command: String::new(),
            args: Vec::new(),
            working_dir: ".".to_string(),
            timeout_secs: None,
            env_allowlist: vec!["PATH".to_string(), "HOME".to_string(), "USER".to_string()],
            recoverable_exit_codes: vec![DEFAULT_RECOVERABLE_EXIT_CODE],
        }
    }
}

/// Process-level failures, before any exit status exists
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Process timeout after {0}ms")]
    Timeout(u128),

    #[error("IO error: {0}")]
    IoError(String),
}

impl From<ExecutionError> for RunOutcome {
    fn from(err: ExecutionError) -> Self {
        match err {
            ExecutionError::Timeout(_) => {
                RunOutcome::recoverable(ErrorKind::Timeout, err.to_string())
            }
            ExecutionError::SpawnFailed(_) | ExecutionError::IoError(_) => {
                RunOutcome::fatal(err.to_string())
            }
        }
    }
}

/// Runs the configured command once per sequence number
///
/// Exit status protocol:
/// - `0` -> Success
/// - a code in `recoverable_exit_codes` -> RecoverableError, with kind and
///   detail taken from the last stderr line when it reads `<kind>: <detail>`
/// - anything else -> FatalError
pub struct SubprocessJobExecutor {
    config: JobCommandConfig,
    primary_channel: Option<String>,
    time_provider: Arc<dyn TimeProvider>,
    timeout: Option<Duration>,
}

impl SubprocessJobExecutor {
    /// Create a new subprocess executor
    ///
    /// # Arguments
    /// * `config` - Command, arguments and exit-code classification
    /// * `primary_channel` - Channel the job delivers its content to (passed via env)
    /// * `time_provider` - Time provider for duration tracking
    ///
    /// # Example
    /// ```ignore
    /// let executor = SubprocessJobExecutor::new(
    ///     JobCommandConfig { command: "send-daily-page".into(), ..Default::default() },
    ///     Some("1203630@g.us".into()),
    ///     Arc::new(SystemTimeProvider),
    /// );
    /// ```
    pub fn new(
        config: JobCommandConfig,
        primary_channel: Option<String>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        let timeout = config.timeout_secs.map(Duration::from_secs);
        Self {
            config,
            primary_channel,
            time_provider,
            timeout,
        }
    }

    /// Override the timeout with sub-second precision
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Substitute the sequence number into the configured arguments
    fn build_args(&self, sequence: SequenceNumber) -> Vec<String> {
        let value = sequence.to_string();
        self.config
            .args
            .iter()
            .map(|arg| arg.replace(SEQUENCE_PLACEHOLDER, &value))
            .collect()
    }

    /// Filter inherited environment variables to allowlist only
    fn filter_env(
        &self,
        env: impl IntoIterator<Item = (String, String)>,
    ) -> HashMap<String, String> {
        env.into_iter()
            .filter(|(k, _)| self.config.env_allowlist.contains(k))
            .collect()
    }

    /// Child environment: allowlisted inherited vars plus the sequencer's own
    fn build_env(
        &self,
        inherited: impl IntoIterator<Item = (String, String)>,
        sequence: SequenceNumber,
    ) -> HashMap<String, String> {
        let mut env = self.filter_env(inherited);
        env.insert(SEQUENCE_ENV.to_string(), sequence.to_string());
        if let Some(channel) = &self.primary_channel {
            env.insert(PRIMARY_CHANNEL_ENV.to_string(), channel.clone());
        }
        env
    }

    /// Spawn child process and wait for output
    async fn spawn_and_wait(
        &self,
        args: &[String],
        env: &HashMap<String, String>,
    ) -> Result<Output, ExecutionError> {
        let mut command = Command::new(&self.config.command);
        command
            .args(args)
            .env_clear()
            .envs(env)
            .current_dir(&self.config.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // A timed-out child is killed when its future is dropped
            .kill_on_drop(true);

        // Own process group, so a timeout can take down the whole job tree
        #[cfg(unix)]
        command.process_group(0);

        let child = command
            .spawn()
            .map_err(|e| ExecutionError::SpawnFailed(format!("{}: {}", self.config.command, e)))?;
        let pid = child.id();

        match self.timeout {
            Some(limit) => match timeout(limit, child.wait_with_output()).await {
                Ok(Ok(output)) => Ok(output),
                Ok(Err(e)) => Err(ExecutionError::IoError(e.to_string())),
                Err(_) => {
                    if let Some(pid) = pid {
                        kill_process_group(pid);
                    }
                    Err(ExecutionError::Timeout(limit.as_millis()))
                }
            },
            None => child
                .wait_with_output()
                .await
                .map_err(|e| ExecutionError::IoError(e.to_string())),
        }
    }

    /// Map process output onto a run outcome
    fn classify(&self, output: &Output) -> RunOutcome {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let last_line = stderr
            .lines()
            .rev()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("");

        match output.status.code() {
            Some(0) => RunOutcome::Success,
            Some(code) if self.config.recoverable_exit_codes.contains(&code) => {
                let (kind, detail) = parse_error_line(last_line).unwrap_or_else(|| {
                    (ErrorKind::Other(format!("exit_{}", code)), last_line.to_string())
                });
                RunOutcome::recoverable(kind, detail)
            }
            Some(code) if last_line.is_empty() => RunOutcome::fatal(format!("exit code {}", code)),
            Some(code) => RunOutcome::fatal(format!("exit code {}: {}", code, last_line)),
            None => RunOutcome::fatal("terminated by signal"),
        }
    }
}

/// SIGKILL every process in the group led by `pid`
#[cfg(unix)]
fn kill_process_group(pid: u32) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    match i32::try_from(pid) {
        Ok(raw) => {
            if let Err(e) = killpg(Pid::from_raw(raw), Signal::SIGKILL) {
                warn!(pid = %pid, error = %e, "Failed to kill job process group");
            }
        }
        Err(_) => warn!(pid = %pid, "Process id out of range, group not killed"),
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {}

/// Parse `<kind>: <detail>`; the kind must be a single token
fn parse_error_line(line: &str) -> Option<(ErrorKind, String)> {
    let (kind, detail) = line.split_once(':')?;
    let kind = kind.trim();
    if kind.is_empty() || kind.contains(char::is_whitespace) {
        return None;
    }
    Some((ErrorKind::from(kind), detail.trim().to_string()))
}

#[async_trait]
impl JobExecutor for SubprocessJobExecutor {
    async fn run(&self, sequence: SequenceNumber) -> RunOutcome {
        let args = self.build_args(sequence);
        let env = self.build_env(std::env::vars(), sequence);
        let start_time = self.time_provider.now_millis();

        info!(
            sequence = %sequence,
            command = %self.config.command,
            args = ?args,
            working_dir = %self.config.working_dir,
            timeout_ms = ?self.timeout.map(|t| t.as_millis()),
            "Starting subprocess execution"
        );

        match self.spawn_and_wait(&args, &env).await {
            Ok(output) => {
                let outcome = self.classify(&output);
                info!(
                    sequence = %sequence,
                    duration_ms = %(self.time_provider.now_millis() - start_time),
                    exit_code = ?output.status.code(),
                    outcome = %outcome,
                    "Subprocess execution completed"
                );
                outcome
            }
            Err(e) => {
                warn!(sequence = %sequence, error = %e, "Subprocess execution failed");
                RunOutcome::from(e)
            }
        }
    }
}
