// Daily Sequencer Infrastructure - System Adapters
// Implements: JobExecutor

pub mod subprocess_executor;

pub use subprocess_executor::{JobCommandConfig, SubprocessJobExecutor};
