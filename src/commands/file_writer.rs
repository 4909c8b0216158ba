//! File Writer Command
//!
//! Writes bytes resolved from a context key to a destination path, with
//! optional append mode and optional compensation. The byte count written is
//! recorded in the context so an append-mode rollback can shrink the file
//! back to its prior length.

use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use crate::command::{Command, DryRun, Rollback};
use crate::context::Context;
use crate::error::CommandError;
use crate::sink::SharedSink;

/// Command that copies a context value (`String` or `Vec<u8>`) into a file.
///
/// Rollback is disabled by default; when enabled, truncate-mode rollback
/// deletes the file and append-mode rollback removes the written suffix.
/// Implements all three capabilities. A failed or partial write compensates
/// itself immediately, then still reports the failure to the enclosing
/// scope.
pub struct FileWriter {
    source_key: String,
    dest: PathBuf,
    append: bool,
    rollback: bool,
}

impl FileWriter {
    pub fn new(source_key: impl Into<String>, dest: impl Into<PathBuf>) -> Self {
        FileWriter {
            source_key: source_key.into(),
            dest: dest.into(),
            append: false,
            rollback: false,
        }
    }

    /// Append to the destination instead of truncating it.
    pub fn append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    /// Enable compensation when a later command fails.
    pub fn with_rollback(mut self, rollback: bool) -> Self {
        self.rollback = rollback;
        self
    }

    fn written_key(&self) -> String {
        format!("filewriter:{}:written", self.dest.display())
    }

    fn resolve_source(&self, ctx: &Context) -> Result<Vec<u8>, CommandError> {
        let value = ctx
            .get(&self.source_key)
            .ok_or_else(|| CommandError::MissingSource(self.source_key.clone()))?;

        if let Some(text) = value.downcast_ref::<String>() {
            Ok(text.as_bytes().to_vec())
        } else if let Some(bytes) = value.downcast_ref::<Vec<u8>>() {
            Ok(bytes.clone())
        } else {
            Err(CommandError::UnsupportedSource(self.source_key.clone()))
        }
    }

    async fn write(&self, data: &[u8]) -> Result<(), CommandError> {
        if let Some(parent) = self.dest.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .append(self.append)
            .truncate(!self.append)
            .open(&self.dest)
            .await?;
        file.write_all(data).await?;
        file.flush().await?;
        Ok(())
    }

    async fn truncate_written(&self, path: &Path, written: u64, sink: &SharedSink) {
        let len = match tokio::fs::metadata(path).await {
            Ok(meta) => meta.len(),
            Err(err) => {
                sink.error(&format!("could not stat file for rollback: {err}"));
                return;
            }
        };

        let file = match tokio::fs::OpenOptions::new().write(true).open(path).await {
            Ok(file) => file,
            Err(err) => {
                sink.error(&format!("could not open file for rollback: {err}"));
                return;
            }
        };

        if let Err(err) = file.set_len(len.saturating_sub(written)).await {
            sink.error(&format!("could not truncate file: {err}"));
        }
    }
}

impl fmt::Display for FileWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "write file {}", self.dest.display())
    }
}

#[async_trait]
impl Command for FileWriter {
    async fn run(&self, ctx: &Context, sink: &SharedSink) {
        let data = match self.resolve_source(ctx) {
            Ok(data) => data,
            Err(err) => {
                sink.error(&err.to_string());
                ctx.set_err(err);
                return;
            }
        };

        match self.write(&data).await {
            Ok(()) => {
                sink.debug(&format!("bytes written: {}", data.len()));
                ctx.set(self.written_key(), data.len() as u64);
            }
            Err(err) => {
                sink.error(&format!("unable to write to file: {err}"));
                ctx.set_err(err);
                // The write may have landed partially; undo it before the
                // failure propagates.
                self.rollback(ctx, sink).await;
            }
        }
    }

    fn as_rollback(&self) -> Option<&dyn Rollback> {
        Some(self)
    }

    fn as_dry_run(&self) -> Option<&dyn DryRun> {
        Some(self)
    }
}

#[async_trait]
impl Rollback for FileWriter {
    async fn rollback(&self, ctx: &Context, sink: &SharedSink) {
        if !self.rollback {
            sink.debug("rollback disabled for this command");
            return;
        }

        if !self.append {
            if let Err(err) = tokio::fs::remove_file(&self.dest).await {
                sink.error(&format!("could not remove file: {err}"));
            }
            return;
        }

        let written = match ctx.get_as::<u64>(&self.written_key()) {
            Some(written) if *written > 0 => *written,
            _ => return,
        };
        self.truncate_written(&self.dest, written, sink).await;
    }
}

#[async_trait]
impl DryRun for FileWriter {
    async fn dry_run(&self, ctx: &Context, sink: &SharedSink) {
        match self.resolve_source(ctx) {
            Ok(data) => {
                sink.debug(&format!("bytes that would be written: {}", data.len()));
                ctx.set(self.written_key(), data.len() as u64);
            }
            Err(err) => {
                sink.error(&err.to_string());
                ctx.set_err(err);
            }
        }
    }
}
