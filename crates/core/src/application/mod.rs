// Application Layer - Use Cases and Business Logic

pub mod constants;
pub mod guard;
pub mod retry;
pub mod sequencer;

// Re-exports
pub use guard::{execute_guarded_async, PanicGuardResult};
pub use retry::{RetryDecision, RetryPolicy, RetryingExecutor};
pub use sequencer::DailySequencer;
