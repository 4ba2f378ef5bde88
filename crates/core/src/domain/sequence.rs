// Sequence Number Domain Model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{DomainError, Result};

/// Durable identifier of "which day's run" an invocation is.
///
/// Always >= 1. Used for correlation in logs and messages, never for
/// deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct SequenceNumber(u64);

impl SequenceNumber {
    /// Value a missing store is initialized with.
    pub const FIRST: SequenceNumber = SequenceNumber(1);

    pub fn new(value: u64) -> Result<Self> {
        if value == 0 {
            return Err(DomainError::InvalidSequence(value));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// The successor, or `None` on overflow.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl TryFrom<u64> for SequenceNumber {
    type Error = DomainError;

    fn try_from(value: u64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<SequenceNumber> for u64 {
    fn from(seq: SequenceNumber) -> u64 {
        seq.0
    }
}

/// Parses the persisted text form. Surrounding whitespace (a trailing
/// newline left by an editor) is ignored.
impl FromStr for SequenceNumber {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let value = trimmed
            .parse::<u64>()
            .map_err(|_| DomainError::UnparseableSequence(trimmed.to_string()))?;
        Self::new(value)
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
