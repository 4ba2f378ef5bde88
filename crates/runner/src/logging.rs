//! Logging setup
//!
//! Everything goes to stderr, so a failed notification still leaves a trace
//! in whatever captures the scheduler's error output.

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::settings::LogFormat;

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "dailyseq=info";

/// Install the global subscriber
///
/// # Environment Variables
///
/// - `RUST_LOG`: filter directives (default: `dailyseq=info`)
///
/// # Example
///
/// ```text
/// RUST_LOG=dailyseq=debug DAILYSEQ_LOG_FORMAT=json ./daily-sequencer
/// ```
pub fn init_logging(format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Json => {
            // Production: JSON structured logging
            registry
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init()?;
        }
        LogFormat::Pretty => {
            // Development: Pretty formatting with colors
            registry
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .try_init()?;
        }
    }

    Ok(())
}
