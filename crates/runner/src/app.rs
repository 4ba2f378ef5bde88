//! Composition root: settings -> adapters -> DailySequencer

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use dailyseq_core::application::{DailySequencer, RetryingExecutor};
use dailyseq_core::port::id_provider::UuidProvider;
use dailyseq_core::port::time_provider::SystemTimeProvider;
use dailyseq_core::port::{IdProvider, JobExecutor, Notifier, SequenceStore, TimeProvider};
use dailyseq_infra_fs::FileSequenceStore;
use dailyseq_infra_notify::{LogNotifier, WebhookNotifier};
use dailyseq_infra_system::SubprocessJobExecutor;

use crate::settings::Settings;

/// Channel name used by the log notifier when none is configured
const LOG_CHANNEL: &str = "log";

/// Wire the production adapters described by `settings`
pub fn build_sequencer(settings: &Settings) -> Result<DailySequencer> {
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let id_provider: Arc<dyn IdProvider> = Arc::new(UuidProvider);

    let store_path = settings.store_path();
    info!(store_path = %store_path.display(), "Using counter store");
    let store: Arc<dyn SequenceStore> = Arc::new(FileSequenceStore::new(store_path));

    let subprocess: Arc<dyn JobExecutor> = Arc::new(SubprocessJobExecutor::new(
        settings.job.clone(),
        settings.primary_channel.clone(),
        time_provider.clone(),
    ));
    let executor: Arc<dyn JobExecutor> =
        Arc::new(RetryingExecutor::new(subprocess, settings.retry.clone()));

    let notifier = build_notifier(settings, time_provider.clone())?;

    Ok(DailySequencer::new(
        store,
        executor,
        notifier,
        id_provider,
        time_provider,
    ))
}

fn build_notifier(
    settings: &Settings,
    time_provider: Arc<dyn TimeProvider>,
) -> Result<Arc<dyn Notifier>> {
    match (&settings.notifier.webhook_url, &settings.diagnostic_channel) {
        (Some(url), Some(channel)) => {
            info!(channel = %channel, "Reporting to webhook");
            let notifier = WebhookNotifier::new(
                url.clone(),
                channel.clone(),
                Duration::from_secs(settings.notifier.timeout_secs),
                time_provider,
            )
            .context("Failed to build webhook notifier")?;
            Ok(Arc::new(notifier))
        }
        (Some(_), None) => anyhow::bail!("notifier.webhook_url requires diagnostic_channel"),
        (None, channel) => {
            let channel = channel.as_deref().unwrap_or(LOG_CHANNEL);
            info!(channel = %channel, "No webhook configured, reporting to log");
            Ok(Arc::new(LogNotifier::new(channel)))
        }
    }
}
