//! Daily Sequencer - Main Entry Point
//! One invocation per day: read counter -> run job -> report -> commit

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use dailyseq_runner::{build_sequencer, logging, Settings};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "daily-sequencer")]
#[command(about = "Run today's job with a durable sequence number and report the outcome", long_about = None)]
#[command(version)]
struct Cli {
    /// Optional TOML configuration file
    #[arg(long, env = "DAILYSEQ_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Load configuration
    let settings = Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;

    // 2. Initialize logging
    logging::init_logging(settings.log_format)?;
    info!("Daily Sequencer v{} starting...", VERSION);

    // 3. Validate before the counter store is touched
    settings.validate()?;

    // 4. Setup dependencies (DI wiring)
    let sequencer = build_sequencer(&settings)?;

    // 5. read -> job -> notify -> commit
    match sequencer.run_once().await {
        Ok(report) => {
            info!(
                run_id = %report.run_id,
                sequence = %report.sequence,
                outcome = %report.outcome,
                next = %report.committed,
                duration_ms = %report.duration_ms,
                "Daily run complete"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Daily run failed");
            Err(e.into())
        }
    }
}
