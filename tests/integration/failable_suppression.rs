//! Failable wrapper: suppression keeps the enclosing sequence moving, while
//! rollback-eligibility still reflects what actually succeeded.

use std::sync::Arc;

use saga::command::Command;
use saga::failable::Failable;
use saga::runner;
use saga::sink::{Level, MemorySink};

use super::test_utils::{count_of, entries, journal, RecordingCommand, RunOnlyCommand};

#[tokio::test]
async fn test_suppressed_failure_does_not_propagate() {
    let log = journal();
    let sink = MemorySink::shared(Level::Debug);
    let failable: Arc<dyn Command> = Arc::new(Failable::new(RecordingCommand::failing(
        "foo", "fizzbuzz", &log,
    )));

    let result = runner::run_with_sink(
        sink.clone(),
        vec![failable, RecordingCommand::new("bar", &log)],
    )
    .await;

    assert!(result.is_ok());
    // The sibling still ran, as if foo had succeeded.
    assert_eq!(
        entries(&log),
        vec!["run foo", "fail foo", "run bar"]
    );
    assert!(sink.contents().contains("failure suppressed: fizzbuzz"));
}

#[tokio::test]
async fn test_wrapped_success_is_still_compensated() {
    let log = journal();
    let failable: Arc<dyn Command> =
        Arc::new(Failable::new(RecordingCommand::new("foo", &log)));

    let result = runner::run(vec![
        failable,
        RecordingCommand::failing("bar", "fizzbuzz", &log),
    ])
    .await;

    assert_eq!(result.unwrap_err().to_string(), "fizzbuzz");
    assert_eq!(
        entries(&log),
        vec!["run foo", "run bar", "fail bar", "rollback foo"]
    );
}

#[tokio::test]
async fn test_wrapped_failure_is_never_compensated() {
    let log = journal();
    let sink = MemorySink::shared(Level::Debug);
    let failable: Arc<dyn Command> = Arc::new(Failable::new(RecordingCommand::failing(
        "foo", "rawr", &log,
    )));

    let result = runner::run_with_sink(
        sink.clone(),
        vec![failable, RecordingCommand::failing("bar", "fizzbuzz", &log)],
    )
    .await;

    assert_eq!(result.unwrap_err().to_string(), "fizzbuzz");
    assert_eq!(count_of(&log, "rollback foo"), 0);
    assert!(sink
        .contents()
        .contains("skipping rollback due to failure: rawr"));
}

#[tokio::test]
async fn test_wrapped_command_without_rollback_is_skipped() {
    let log = journal();
    let failable: Arc<dyn Command> =
        Arc::new(Failable::new(RunOnlyCommand::new("foo", &log)));

    let result = runner::run(vec![
        failable,
        RecordingCommand::failing("bar", "boom", &log),
    ])
    .await;

    assert!(result.is_err());
    assert_eq!(entries(&log), vec!["run foo", "run bar", "fail bar"]);
}

#[tokio::test]
async fn test_dry_run_suppresses_simulated_failure() {
    let log = journal();
    let failable: Arc<dyn Command> = Arc::new(Failable::new(RecordingCommand::failing(
        "foo", "simulated", &log,
    )));

    runner::dry_run(vec![failable, RecordingCommand::new("bar", &log)]).await;

    // The simulated failure was suppressed, so the dry run advanced to bar.
    assert_eq!(
        entries(&log),
        vec!["dry-run foo", "fail foo", "dry-run bar"]
    );
}

#[tokio::test]
async fn test_dry_run_of_wrapped_command_without_dry_run_is_noop() {
    let log = journal();
    let failable: Arc<dyn Command> =
        Arc::new(Failable::new(RunOnlyCommand::new("foo", &log)));

    runner::dry_run(vec![failable]).await;
    assert!(entries(&log).is_empty());
}

#[tokio::test]
async fn test_independent_failables_do_not_collide() {
    let log = journal();
    let first: Arc<dyn Command> = Arc::new(Failable::new(RecordingCommand::failing(
        "foo", "oops", &log,
    )));
    let second: Arc<dyn Command> =
        Arc::new(Failable::new(RecordingCommand::new("baz", &log)));

    let result = runner::run(vec![
        first,
        second,
        RecordingCommand::failing("bar", "late", &log),
    ])
    .await;

    assert_eq!(result.unwrap_err().to_string(), "late");
    // baz succeeded under its own wrapper, so it is compensated even though
    // foo's wrapper recorded a failure.
    assert_eq!(count_of(&log, "rollback baz"), 1);
    assert_eq!(count_of(&log, "rollback foo"), 0);
}
