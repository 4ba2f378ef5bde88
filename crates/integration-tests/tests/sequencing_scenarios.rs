//! Sequencing scenarios against the real file store
//!
//! Every invocation: read counter -> run job -> exactly one report -> commit.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use dailyseq_core::application::DailySequencer;
use dailyseq_core::domain::{ErrorKind, RunOutcome};
use dailyseq_core::port::id_provider::UuidProvider;
use dailyseq_core::port::job_executor::mocks::ScriptedJobExecutor;
use dailyseq_core::port::notifier::mocks::{Notification, RecordingNotifier};
use dailyseq_core::port::time_provider::SystemTimeProvider;
use dailyseq_core::SequencerError;
use dailyseq_infra_fs::FileSequenceStore;

fn sequencer(
    path: &Path,
    executor: Arc<ScriptedJobExecutor>,
    notifier: RecordingNotifier,
) -> DailySequencer {
    DailySequencer::new(
        Arc::new(FileSequenceStore::new(path)),
        executor,
        Arc::new(notifier),
        Arc::new(UuidProvider),
        Arc::new(SystemTimeProvider),
    )
}

/// Scenario 1: store missing -> 1 -> "1" persisted -> job(1) -> Success -> "2"
#[tokio::test]
async fn test_first_ever_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("counter");
    let executor = Arc::new(ScriptedJobExecutor::new_success());
    let notifier = RecordingNotifier::new();
    let seq = sequencer(&path, executor.clone(), notifier.clone());

    let first = seq.next_sequence_number().unwrap();
    assert_eq!(first.get(), 1);
    assert_eq!(fs::read_to_string(&path).unwrap(), "1");

    let report = seq.run_once().await.unwrap();

    assert_eq!(report.sequence.get(), 1);
    assert_eq!(executor.calls(), vec![1]);
    assert_eq!(notifier.sent(), vec![Notification::Success(1)]);
    assert_eq!(fs::read_to_string(&path).unwrap(), "2");

    println!("✅ First run: counter created with 1, committed 2");
}

/// Scenario 2: "7" -> job(7) -> RecoverableError(FileNotFound, "day3.jpg") -> "8"
#[tokio::test]
async fn test_partial_failure_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("counter");
    fs::write(&path, "7").unwrap();

    let executor = Arc::new(ScriptedJobExecutor::always(RunOutcome::recoverable(
        ErrorKind::FileNotFound,
        "day3.jpg",
    )));
    let notifier = RecordingNotifier::new();
    let seq = sequencer(&path, executor.clone(), notifier.clone());

    seq.run_once().await.unwrap();

    assert_eq!(executor.calls(), vec![7]);
    assert_eq!(
        notifier.sent(),
        vec![Notification::Error {
            sequence: 7,
            kind: ErrorKind::FileNotFound,
            detail: "day3.jpg".to_string(),
        }]
    );
    assert_eq!(fs::read_to_string(&path).unwrap(), "8");

    println!("✅ Partial failure reported once and committed");
}

/// Scenario 3: unwritable store -> StorageUnavailable before the job runs
#[tokio::test]
async fn test_unwritable_store_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "not a directory").unwrap();
    let path = blocker.join("counter");

    let executor = Arc::new(ScriptedJobExecutor::new_success());
    let notifier = RecordingNotifier::new();
    let seq = sequencer(&path, executor.clone(), notifier.clone());

    let err = seq.run_once().await.unwrap_err();

    assert!(matches!(err, SequencerError::StorageUnavailable(_)));
    assert_eq!(executor.call_count(), 0);
    assert!(notifier.sent().is_empty());
    assert_eq!(fs::read_to_string(&blocker).unwrap(), "not a directory");

    println!("✅ Storage failure aborted before the job");
}

/// Existing counter that can no longer be written: no job, no report, value kept
#[cfg(unix)]
#[tokio::test]
async fn test_existing_unwritable_counter_aborts() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let state_dir = dir.path().join("state");
    fs::create_dir(&state_dir).unwrap();
    let path = state_dir.join("counter");
    fs::write(&path, "9").unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o444)).unwrap();
    fs::set_permissions(&state_dir, fs::Permissions::from_mode(0o555)).unwrap();

    // Privileged users ignore file modes; nothing to check then
    let bypassed = fs::OpenOptions::new().write(true).open(&path).is_ok();

    let executor = Arc::new(ScriptedJobExecutor::new_success());
    let notifier = RecordingNotifier::new();
    let seq = sequencer(&path, executor.clone(), notifier.clone());
    let result = seq.run_once().await;

    fs::set_permissions(&state_dir, fs::Permissions::from_mode(0o755)).unwrap();

    if bypassed {
        println!("⚠️ Running with privileges, permission check skipped");
        return;
    }

    assert!(matches!(result, Err(SequencerError::StorageUnavailable(_))));
    assert_eq!(executor.call_count(), 0);
    assert!(notifier.sent().is_empty());
    assert_eq!(fs::read_to_string(&path).unwrap(), "9");

    println!("✅ Unwritable counter aborted before the job");
}

/// Existing counter whose directory disappears before the job would start
#[tokio::test]
async fn test_counter_directory_replaced_aborts() {
    use dailyseq_core::port::{SequenceStore, StoreError};
    use dailyseq_core::domain::SequenceNumber;

    /// Reads from one file store, checks writability against another
    struct SplitStore {
        readable: FileSequenceStore,
        blocked: FileSequenceStore,
    }

    impl SequenceStore for SplitStore {
        fn read(&self) -> Result<Option<SequenceNumber>, StoreError> {
            self.readable.read()
        }
        fn write(&self, value: SequenceNumber) -> Result<(), StoreError> {
            self.blocked.write(value)
        }
        fn ensure_writable(&self) -> Result<(), StoreError> {
            self.blocked.ensure_writable()
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("counter");
    fs::write(&path, "9").unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "not a directory").unwrap();

    let executor = Arc::new(ScriptedJobExecutor::new_success());
    let notifier = RecordingNotifier::new();
    let seq = DailySequencer::new(
        Arc::new(SplitStore {
            readable: FileSequenceStore::new(&path),
            blocked: FileSequenceStore::new(blocker.join("counter")),
        }),
        executor.clone(),
        Arc::new(notifier.clone()),
        Arc::new(UuidProvider),
        Arc::new(SystemTimeProvider),
    );

    let err = seq.run_once().await.unwrap_err();

    assert!(matches!(err, SequencerError::StorageUnavailable(_)));
    assert_eq!(executor.call_count(), 0);
    assert!(notifier.sent().is_empty());
    assert_eq!(fs::read_to_string(&path).unwrap(), "9");
}

/// Counter advances by exactly one per invocation whatever the outcome
#[tokio::test]
async fn test_counter_survives_restarts_across_outcomes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("counter");

    let days = vec![
        RunOutcome::Success,
        RunOutcome::recoverable(ErrorKind::SendFailed, "audio upload rejected"),
        RunOutcome::fatal("unable to send any of the 3 msgs"),
        RunOutcome::Success,
    ];

    for (day, outcome) in days.into_iter().enumerate() {
        // Fresh sequencer per day, as a new process would be
        let executor = Arc::new(ScriptedJobExecutor::always(outcome));
        let notifier = RecordingNotifier::new();
        let seq = sequencer(&path, executor.clone(), notifier.clone());

        seq.run_once().await.unwrap();

        let expected = day as u64 + 1;
        assert_eq!(executor.calls(), vec![expected]);
        assert_eq!(notifier.sent().len(), 1);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            (expected + 1).to_string()
        );
    }

    println!("✅ Four daily runs numbered 1..=4");
}

/// Corrupt counter file is a storage failure and is left as is
#[tokio::test]
async fn test_corrupt_counter_is_not_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("counter");
    fs::write(&path, "day seven").unwrap();

    let executor = Arc::new(ScriptedJobExecutor::new_success());
    let notifier = RecordingNotifier::new();
    let seq = sequencer(&path, executor.clone(), notifier.clone());

    let err = seq.run_once().await.unwrap_err();

    assert!(matches!(err, SequencerError::StorageUnavailable(_)));
    assert_eq!(executor.call_count(), 0);
    assert_eq!(fs::read_to_string(&path).unwrap(), "day seven");
}
