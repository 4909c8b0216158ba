//! FileWriter command behavior, including compensation against real files.

use std::sync::Arc;

use saga::command::Command;
use saga::commands::FileWriter;
use saga::error::CommandError;
use saga::runner;
use tempfile::TempDir;

use super::test_utils::{journal, RecordingCommand, SetValue};

#[tokio::test]
async fn test_writes_string_source_to_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.txt");

    let result = runner::run(vec![
        SetValue::new("payload", "hello world"),
        Arc::new(FileWriter::new("payload", &path)) as Arc<dyn Command>,
    ])
    .await;

    assert!(result.is_ok());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello world");
}

#[tokio::test]
async fn test_writes_byte_source_to_file() {
    use async_trait::async_trait;
    use saga::context::Context;
    use saga::sink::SharedSink;
    use std::fmt;

    struct SetBytes;

    impl fmt::Display for SetBytes {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("set bytes")
        }
    }

    #[async_trait]
    impl Command for SetBytes {
        async fn run(&self, ctx: &Context, _sink: &SharedSink) {
            ctx.set("payload", vec![0xde_u8, 0xad, 0xbe, 0xef]);
        }
    }

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.bin");

    let result = runner::run(vec![
        Arc::new(SetBytes) as Arc<dyn Command>,
        Arc::new(FileWriter::new("payload", &path)),
    ])
    .await;

    assert!(result.is_ok());
    assert_eq!(std::fs::read(&path).unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
}

#[tokio::test]
async fn test_rollback_removes_written_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("staged.txt");
    let log = journal();

    let result = runner::run(vec![
        SetValue::new("payload", "staged content"),
        Arc::new(FileWriter::new("payload", &path).with_rollback(true)) as Arc<dyn Command>,
        RecordingCommand::failing("fail", "downstream", &log),
    ])
    .await;

    assert!(result.is_err());
    assert!(!path.exists());
}

#[tokio::test]
async fn test_rollback_disabled_by_default() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("kept.txt");
    let log = journal();

    let result = runner::run(vec![
        SetValue::new("payload", "kept content"),
        Arc::new(FileWriter::new("payload", &path)) as Arc<dyn Command>,
        RecordingCommand::failing("fail", "downstream", &log),
    ])
    .await;

    assert!(result.is_err());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "kept content");
}

#[tokio::test]
async fn test_append_rollback_restores_prior_content() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("log.txt");
    std::fs::write(&path, "base").unwrap();
    let log = journal();

    let result = runner::run(vec![
        SetValue::new("payload", " suffix"),
        Arc::new(
            FileWriter::new("payload", &path)
                .append(true)
                .with_rollback(true),
        ) as Arc<dyn Command>,
        RecordingCommand::failing("fail", "downstream", &log),
    ])
    .await;

    assert!(result.is_err());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "base");
}

#[tokio::test]
async fn test_missing_source_fails_the_run() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("never.txt");

    let result = runner::run(vec![
        Arc::new(FileWriter::new("payload", &path)) as Arc<dyn Command>
    ])
    .await;

    let failure = result.unwrap_err();
    assert!(matches!(
        failure.downcast_ref::<CommandError>(),
        Some(CommandError::MissingSource(_))
    ));
    assert!(!path.exists());
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dry.txt");

    runner::dry_run(vec![
        SetValue::new("payload", "would be written"),
        Arc::new(FileWriter::new("payload", &path)) as Arc<dyn Command>,
    ])
    .await;

    assert!(!path.exists());
}

#[tokio::test]
async fn test_creates_missing_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested/deeper/out.txt");

    let result = runner::run(vec![
        SetValue::new("payload", "deep"),
        Arc::new(FileWriter::new("payload", &path)) as Arc<dyn Command>,
    ])
    .await;

    assert!(result.is_ok());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "deep");
}
