//! Runner configuration
//!
//! Layered with the `config` crate: defaults, then an optional TOML file,
//! then `DAILYSEQ_*` environment variables (`__` separates nested keys, e.g.
//! `DAILYSEQ_JOB__COMMAND`).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use dailyseq_core::application::RetryPolicy;
use dailyseq_infra_notify::WebhookConfig;
use dailyseq_infra_system::JobCommandConfig;

pub const DEFAULT_STORE_PATH: &str = "~/.daily-sequencer/counter";
pub const ENV_PREFIX: &str = "DAILYSEQ";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Counter file; `~` is expanded
    pub store_path: String,
    /// Handed to the job, which delivers the day's content there
    pub primary_channel: Option<String>,
    /// Where confirmations and error reports go
    pub diagnostic_channel: Option<String>,
    pub log_format: LogFormat,
    pub job: JobCommandConfig,
    pub retry: RetryPolicy,
    pub notifier: WebhookConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_path: DEFAULT_STORE_PATH.to_string(),
            primary_channel: None,
            diagnostic_channel: None,
            log_format: LogFormat::default(),
            job: JobCommandConfig::default(),
            retry: RetryPolicy::default(),
            notifier: WebhookConfig::default(),
        }
    }
}

impl Settings {
    /// Load from the optional file and the process environment
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        Self::load_from(config_file, None)
    }

    /// Load with an explicit environment map instead of the process environment
    pub fn load_from(
        config_file: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("job.env_allowlist")
                .with_list_parse_key("job.recoverable_exit_codes")
                .source(env),
        );

        let settings: Settings = builder
            .build()
            .context("Failed to read configuration sources")?
            .try_deserialize()
            .context("Invalid configuration")?;

        Ok(settings)
    }

    /// Reject configurations that cannot produce a meaningful run
    ///
    /// Runs before the counter store is touched.
    pub fn validate(&self) -> Result<()> {
        if self.store_path.trim().is_empty() {
            bail!("store_path must not be empty");
        }
        if self.job.command.trim().is_empty() {
            bail!("job.command must be set (DAILYSEQ_JOB__COMMAND or [job] command)");
        }
        self.retry
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid retry policy: {}", e))?;
        if self.notifier.webhook_url.is_some() && self.diagnostic_channel.is_none() {
            bail!("notifier.webhook_url requires diagnostic_channel");
        }
        Ok(())
    }

    /// Counter file path with `~` expanded
    pub fn store_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.store_path).into_owned())
    }
}
