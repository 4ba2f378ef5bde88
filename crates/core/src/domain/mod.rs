// Domain Layer - Pure business logic and entities

pub mod error;
pub mod outcome;
pub mod sequence;

// Re-exports
pub use error::DomainError;
pub use outcome::{ErrorKind, RunOutcome, RunReport};
pub use sequence::SequenceNumber;
