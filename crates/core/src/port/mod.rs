// Port Layer - Interfaces for external dependencies

pub mod id_provider; // For deterministic testing
pub mod job_executor;
pub mod notifier;
pub mod sequence_store;
pub mod time_provider;

// Re-exports
pub use id_provider::IdProvider;
pub use job_executor::JobExecutor;
pub use notifier::{NotifyError, Notifier};
pub use sequence_store::{SequenceStore, StoreError};
pub use time_provider::TimeProvider;
