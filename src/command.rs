//! Command Capability Contracts
//!
//! Every orchestrated unit implements [`Command`]; reversal and simulation
//! are separate, optional capabilities probed explicitly through
//! [`Command::as_rollback`] and [`Command::as_dry_run`]. A command lacking a
//! capability is skipped by the orchestrator, never an error.

use async_trait::async_trait;
use std::fmt;

use crate::context::Context;
use crate::sink::SharedSink;

/// An atomic operation in a command tree.
///
/// Configuration a command needs should be captured at construction and
/// treated as immutable; anything tied to one execution belongs in the
/// [`Context`], so that a single instance stays reusable across runs with
/// different contexts. Failure is signaled by setting an error on the
/// context, which triggers compensation of previously completed work in the
/// enclosing scope.
///
/// The `Display` implementation names the command in diagnostics.
#[async_trait]
pub trait Command: fmt::Display + Send + Sync {
    /// Execute the command against the given context.
    async fn run(&self, ctx: &Context, sink: &SharedSink);

    /// Probe for the [`Rollback`] capability.
    ///
    /// Implementors that can compensate their own effects override this to
    /// return `Some(self)`.
    fn as_rollback(&self) -> Option<&dyn Rollback> {
        None
    }

    /// Probe for the [`DryRun`] capability.
    fn as_dry_run(&self) -> Option<&dyn DryRun> {
        None
    }
}

/// Capability of reversing a completed run.
///
/// A rollback sees the same context visibility the command ran with, so data
/// recorded via `set` during the run is still available to undo it. The
/// failure that triggered the compensation may not be
/// available on the context and must not be relied upon. Errors raised while
/// compensating are logged to the sink only; they never replace the failure
/// that started the rollback.
#[async_trait]
pub trait Rollback: Command {
    async fn rollback(&self, ctx: &Context, sink: &SharedSink);
}

/// Capability of simulating a run.
///
/// A dry run should perform the reads and validation of a real run while
/// mocking every destructive effect. Setting a failure on the context halts
/// the enclosing dry run; no compensation follows, since nothing real was
/// done.
#[async_trait]
pub trait DryRun: Command {
    async fn dry_run(&self, ctx: &Context, sink: &SharedSink);
}
