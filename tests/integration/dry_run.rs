//! Dry runs: simulation without destructive effects, capability skipping,
//! and the halt-on-first-simulated-failure policy.

use saga::runner;
use saga::sink::{Level, MemorySink};

use super::test_utils::{count_of, entries, journal, RecordingCommand, RunOnlyCommand};

#[tokio::test]
async fn test_commands_without_dry_run_are_skipped_without_error() {
    let log = journal();
    let sink = MemorySink::shared(Level::Debug);

    runner::dry_run_with_sink(
        sink.clone(),
        vec![
            RecordingCommand::new("A", &log),
            RunOnlyCommand::new("B", &log),
        ],
    )
    .await;

    // A simulated, B skipped, and the overall failure state stayed clean:
    // nothing was really run, so nothing else is journaled.
    assert_eq!(entries(&log), vec!["dry-run A"]);
    assert!(sink.contents().contains("B has no dry run, skipping"));
}

#[tokio::test]
async fn test_dry_run_halts_at_first_simulated_failure() {
    let log = journal();

    runner::dry_run(vec![
        RecordingCommand::new("A", &log),
        RecordingCommand::failing("B", "simulated", &log),
        RecordingCommand::new("C", &log),
    ])
    .await;

    assert_eq!(
        entries(&log),
        vec!["dry-run A", "dry-run B", "fail B"]
    );
    // Simulated failures trigger no compensation.
    assert_eq!(count_of(&log, "rollback A"), 0);
}

#[tokio::test]
async fn test_dry_run_never_invokes_run() {
    let log = journal();

    runner::dry_run(vec![
        RecordingCommand::new("A", &log),
        RecordingCommand::new("B", &log),
    ])
    .await;

    assert_eq!(count_of(&log, "run A"), 0);
    assert_eq!(count_of(&log, "run B"), 0);
    assert_eq!(count_of(&log, "dry-run A"), 1);
    assert_eq!(count_of(&log, "dry-run B"), 1);
}
