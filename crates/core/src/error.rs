// Central Error Type for the Sequencer

use thiserror::Error;

use crate::domain::SequenceNumber;
use crate::port::{NotifyError, StoreError};

/// Errors that abort (or fail) a sequencer invocation.
///
/// Job-level failures never show up here: they are classified into
/// [`crate::domain::RunOutcome`] and routed to the notifier instead.
#[derive(Error, Debug)]
pub enum SequencerError {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] StoreError),

    #[error("Counter overflow: cannot advance past {0}")]
    CounterOverflow(SequenceNumber),

    #[error("Notifier failure for sequence {sequence}: {source}")]
    NotifierFailure {
        sequence: SequenceNumber,
        #[source]
        source: NotifyError,
    },
}

/// Result type alias using SequencerError
pub type Result<T> = std::result::Result<T, SequencerError>;
