// Job Executor Port
// Abstraction for "today's job" (fetch files, forward them to the primary channel)

use crate::domain::{RunOutcome, SequenceNumber};
use async_trait::async_trait;

/// Job Executor trait
///
/// Implementations classify their own failures: a partial failure (one file
/// missing, one send rejected) is `RecoverableError`, no usable result at
/// all is `FatalError`. Re-running with the same sequence number must be
/// safe.
///
/// Implementations:
/// - SubprocessJobExecutor: runs a configured command
/// - RetryingExecutor: wraps another executor with a retry policy
#[async_trait]
pub trait JobExecutor: Send + Sync {
    /// Run the job for `sequence` and classify the result
    async fn run(&self, sequence: SequenceNumber) -> RunOutcome;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Mock executor behavior for a single call
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Return this outcome
        Outcome(RunOutcome),
        /// Panic with message (for panic isolation testing)
        Panic(String),
    }

    /// Scripted executor: plays back behaviors in order, repeating the last one.
    pub struct ScriptedJobExecutor {
        script: Arc<Mutex<VecDeque<MockBehavior>>>,
        calls: Arc<Mutex<Vec<SequenceNumber>>>,
    }

    impl ScriptedJobExecutor {
        pub fn new(script: Vec<MockBehavior>) -> Self {
            Self {
                script: Arc::new(Mutex::new(script.into())),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn always(outcome: RunOutcome) -> Self {
            Self::new(vec![MockBehavior::Outcome(outcome)])
        }

        pub fn new_success() -> Self {
            Self::always(RunOutcome::Success)
        }

        pub fn outcomes(outcomes: Vec<RunOutcome>) -> Self {
            Self::new(outcomes.into_iter().map(MockBehavior::Outcome).collect())
        }

        pub fn new_panic_inducing(message: impl Into<String>) -> Self {
            Self::new(vec![MockBehavior::Panic(message.into())])
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        /// Sequence numbers received, in call order
        pub fn calls(&self) -> Vec<u64> {
            self.calls.lock().unwrap().iter().map(|s| s.get()).collect()
        }

        fn next_behavior(&self) -> MockBehavior {
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop_front().unwrap_or(MockBehavior::Outcome(RunOutcome::Success))
            } else {
                script
                    .front()
                    .cloned()
                    .unwrap_or(MockBehavior::Outcome(RunOutcome::Success))
            }
        }
    }

    #[async_trait]
    impl JobExecutor for ScriptedJobExecutor {
        async fn run(&self, sequence: SequenceNumber) -> RunOutcome {
            self.calls.lock().unwrap().push(sequence);

            match self.next_behavior() {
                MockBehavior::Outcome(outcome) => outcome,
                MockBehavior::Panic(msg) => {
                    panic!("{}", msg); // Actually panic for panic isolation testing
                }
            }
        }
    }
}
