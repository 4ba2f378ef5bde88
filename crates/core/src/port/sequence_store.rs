// Sequence Store Port
// Durable home of the single scalar counter

use crate::domain::SequenceNumber;
use thiserror::Error;

/// Store errors. Every variant surfaces as `SequencerError::StorageUnavailable`.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt counter state in {location}: {reason}")]
    Corrupt { location: String, reason: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Sequence Store trait
///
/// Implementations:
/// - FileSequenceStore: plain-text file under the user's home
/// - InMemorySequenceStore: test fake with failure injection
pub trait SequenceStore: Send + Sync {
    /// Read the persisted counter
    ///
    /// Returns `Ok(None)` when nothing has been persisted yet.
    ///
    /// # Errors
    /// - StoreError::Io if the backing storage cannot be read
    /// - StoreError::Corrupt if the stored value is not a positive integer
    fn read(&self) -> Result<Option<SequenceNumber>, StoreError>;

    /// Durably replace the persisted counter
    fn write(&self, value: SequenceNumber) -> Result<(), StoreError>;

    /// Check that a later `write` can succeed, without changing the value
    ///
    /// Lets an invocation fail before its job runs instead of at commit.
    fn ensure_writable(&self) -> Result<(), StoreError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// In-memory store; reads and writes can be made to fail independently.
    #[derive(Clone, Default)]
    pub struct InMemorySequenceStore {
        value: Arc<Mutex<Option<SequenceNumber>>>,
        fail_reads: Arc<Mutex<bool>>,
        fail_writes: Arc<Mutex<bool>>,
        writes: Arc<Mutex<Vec<SequenceNumber>>>,
    }

    impl InMemorySequenceStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_value(value: u64) -> Self {
            let store = Self::new();
            *store.value.lock().unwrap() = Some(SequenceNumber::new(value).unwrap());
            store
        }

        pub fn set_fail_reads(&self, fail: bool) {
            *self.fail_reads.lock().unwrap() = fail;
        }

        pub fn set_fail_writes(&self, fail: bool) {
            *self.fail_writes.lock().unwrap() = fail;
        }

        pub fn value(&self) -> Option<u64> {
            self.value.lock().unwrap().map(u64::from)
        }

        /// Every successful write, in order
        pub fn writes(&self) -> Vec<u64> {
            self.writes.lock().unwrap().iter().map(|s| s.get()).collect()
        }
    }

    impl SequenceStore for InMemorySequenceStore {
        fn read(&self) -> Result<Option<SequenceNumber>, StoreError> {
            if *self.fail_reads.lock().unwrap() {
                return Err(StoreError::Unavailable("injected read failure".to_string()));
            }
            Ok(*self.value.lock().unwrap())
        }

        fn write(&self, value: SequenceNumber) -> Result<(), StoreError> {
            self.ensure_writable()?;
            *self.value.lock().unwrap() = Some(value);
            self.writes.lock().unwrap().push(value);
            Ok(())
        }

        fn ensure_writable(&self) -> Result<(), StoreError> {
            if *self.fail_writes.lock().unwrap() {
                return Err(StoreError::Unavailable(
                    "injected write failure".to_string(),
                ));
            }
            Ok(())
        }
    }
}
