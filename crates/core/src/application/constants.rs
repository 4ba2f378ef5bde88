// Sequencer constants (no magic values)

/// Default retry base delay (1000ms = 1s)
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1000;

/// Default exponential backoff factor
pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

/// Default number of attempts: one, i.e. no retry unless configured
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1;

/// Upper bound for a single backoff delay (1 hour)
pub const MAX_RETRY_DELAY_MS: u64 = 60 * 60 * 1000;
