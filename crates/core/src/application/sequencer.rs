// Daily Sequencer - one invocation = read -> job -> notify -> commit
use crate::application::guard::{execute_guarded_async, PanicGuardResult};
use crate::domain::{RunOutcome, RunReport, SequenceNumber};
use crate::error::{Result, SequencerError};
use crate::port::{IdProvider, JobExecutor, Notifier, NotifyError, SequenceStore, TimeProvider};
use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};

/// Hands each daily invocation a durable, monotonically increasing sequence
/// number and routes the job's outcome to the notifier.
///
/// Overlapping invocations against the same store are not supported: there
/// is no locking, and two processes may observe the same number.
pub struct DailySequencer {
    store: Arc<dyn SequenceStore>,
    executor: Arc<dyn JobExecutor>,
    notifier: Arc<dyn Notifier>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl DailySequencer {
    pub fn new(
        store: Arc<dyn SequenceStore>,
        executor: Arc<dyn JobExecutor>,
        notifier: Arc<dyn Notifier>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            store,
            executor,
            notifier,
            id_provider,
            time_provider,
        }
    }

    /// Current sequence number, without advancing it
    ///
    /// A missing store is initialized to 1 and persisted right away. Calling
    /// this twice without an intervening [`commit`](Self::commit) returns the
    /// same value.
    ///
    /// # Errors
    /// - SequencerError::StorageUnavailable if the store cannot be read,
    ///   holds a corrupt value, or cannot be initialized
    pub fn next_sequence_number(&self) -> Result<SequenceNumber> {
        match self.store.read()? {
            Some(current) => Ok(current),
            None => {
                info!("No counter found, initializing to 1");
                self.store.write(SequenceNumber::FIRST)?;
                Ok(SequenceNumber::FIRST)
            }
        }
    }

    /// Persist `current + 1`; returns the value written
    ///
    /// # Errors
    /// - SequencerError::CounterOverflow if `current` is `u64::MAX`
    /// - SequencerError::StorageUnavailable if the write fails
    pub fn commit(&self, current: SequenceNumber) -> Result<SequenceNumber> {
        let next = current
            .next()
            .ok_or(SequencerError::CounterOverflow(current))?;
        self.store.write(next)?;
        info!(sequence = %current, next = %next, "Counter committed");
        Ok(next)
    }

    /// Run one full invocation
    ///
    /// Job failures never surface as errors: they are reported through the
    /// notifier and the counter is still committed. A notifier failure is
    /// returned only after the commit.
    pub async fn run_once(&self) -> Result<RunReport> {
        let run_id = self.id_provider.generate_id();
        let span = info_span!("daily_run", run_id = %run_id);
        self.run_once_inner(run_id).instrument(span).await
    }

    async fn run_once_inner(&self, run_id: String) -> Result<RunReport> {
        let started_at = self.time_provider.now_millis();

        // 1. Sequence number and a writable store (abort before any job otherwise)
        let sequence = self.next_sequence_number().map_err(|e| {
            error!(error = %e, "Cannot obtain sequence number, job not started");
            e
        })?;
        self.store.ensure_writable().map_err(|e| {
            error!(sequence = %sequence, error = %e, "Counter not writable, job not started");
            SequencerError::from(e)
        })?;
        if sequence.next().is_none() {
            error!(sequence = %sequence, "Counter cannot be advanced, job not started");
            return Err(SequencerError::CounterOverflow(sequence));
        }

        // 2. Job
        info!(sequence = %sequence, "Starting daily job");
        let outcome = self.execute(sequence).await;
        info!(sequence = %sequence, outcome = %outcome, "Daily job finished");

        // 3. Exactly one diagnostic message
        let notified = self.notify(sequence, &outcome).await;
        if let Err(ref e) = notified {
            error!(sequence = %sequence, error = %e, "Notifier failed, report not delivered");
        }

        // 4. Commit regardless of outcome and notifier result
        let committed = self.commit(sequence)?;

        notified.map_err(|source| SequencerError::NotifierFailure { sequence, source })?;

        let duration_ms = self.time_provider.now_millis() - started_at;
        Ok(RunReport {
            run_id,
            sequence,
            outcome,
            duration_ms,
            committed,
        })
    }

    async fn execute(&self, sequence: SequenceNumber) -> RunOutcome {
        let executor = Arc::clone(&self.executor);
        match execute_guarded_async(async move { executor.run(sequence).await }).await {
            PanicGuardResult::Success(outcome) => outcome,
            PanicGuardResult::Panicked(msg) => {
                warn!(sequence = %sequence, panic_msg = %msg, "Job panicked, treating as fatal");
                RunOutcome::fatal(format!("job panicked: {}", msg))
            }
        }
    }

    async fn notify(
        &self,
        sequence: SequenceNumber,
        outcome: &RunOutcome,
    ) -> std::result::Result<(), NotifyError> {
        match outcome.error_parts() {
            None => self.notifier.report_success(sequence).await,
            Some((kind, detail)) => self.notifier.report_error(sequence, &kind, detail).await,
        }
    }
}
