// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid sequence number: {0} (must be >= 1)")]
    InvalidSequence(u64),

    #[error("Unparseable sequence number: {0:?}")]
    UnparseableSequence(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
