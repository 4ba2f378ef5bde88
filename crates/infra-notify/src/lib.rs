// Daily Sequencer Infrastructure - Notification Adapters
// Implements: Notifier

pub mod log_notifier;
pub mod webhook;

pub use log_notifier::LogNotifier;
pub use webhook::{WebhookConfig, WebhookNotifier};
