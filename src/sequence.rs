//! Sequence Combinator
//!
//! Ordered composition: commands run left to right against one context, and
//! the first failure stops the advance and compensates every completed
//! command in reverse order. Top-level runs wrap their command list in a
//! sequence.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::command::{Command, DryRun, Rollback};
use crate::context::Context;
use crate::sink::{with_prefix, SharedSink, SUB_COMMAND_PREFIX};

/// Ordered composition of commands with LIFO compensation on failure.
///
/// A sequence is itself a [`Command`] implementing [`Rollback`] and
/// [`DryRun`], so sequences nest freely inside other combinators.
pub struct Sequence {
    cmds: Vec<Arc<dyn Command>>,
}

impl Sequence {
    pub fn new(cmds: Vec<Arc<dyn Command>>) -> Self {
        Sequence { cmds }
    }

    /// Compensate commands `upto-1` down to `0`, popping one frame per
    /// command. Each rollback runs before its command's frame is popped, so
    /// it sees the writes the command produced during its run. Commands
    /// without the rollback capability are skipped without halting the pass.
    async fn compensate(&self, ctx: &Context, sink: &SharedSink, upto: usize) {
        // A compensating command must not be able to replace the failure
        // that triggered the pass; it is reasserted once the pass is done.
        let trigger = ctx.err();

        for i in (0..upto).rev() {
            match self.cmds[i].as_rollback() {
                Some(cmd) => {
                    sink.debug(&format!("rolling back {}", self.cmds[i]));
                    cmd.rollback(ctx, sink).await;
                }
                None => sink.debug(&format!("{} has no rollback, skipping", self.cmds[i])),
            }
            ctx.pop();
        }

        if let Some(failure) = trigger {
            ctx.set_err(failure);
        }
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} command sequence", self.cmds.len())
    }
}

#[async_trait]
impl Command for Sequence {
    async fn run(&self, ctx: &Context, sink: &SharedSink) {
        // An already-failed scope runs nothing. This is how a branch forked
        // with ForkPolicy::Inherit refuses work under a failed parent.
        if ctx.err().is_some() {
            return;
        }

        ctx.push();
        let scoped = with_prefix(sink, SUB_COMMAND_PREFIX);

        for (i, cmd) in self.cmds.iter().enumerate() {
            ctx.push();
            sink.info(&format!("=== RUN {cmd}"));
            let started = Instant::now();
            cmd.run(ctx, &scoped).await;
            sink.info(&format!("--- END {cmd} ({:?})", started.elapsed()));

            if ctx.err().is_some() {
                // The failing command compensates itself; only the commands
                // that completed before it are rolled back here.
                ctx.pop();
                self.compensate(ctx, &scoped, i).await;
                return;
            }
        }

        // On success every per-command frame stays pushed so a later
        // ancestor-driven rollback sees each command's writes.
    }

    fn as_rollback(&self) -> Option<&dyn Rollback> {
        Some(self)
    }

    fn as_dry_run(&self) -> Option<&dyn DryRun> {
        Some(self)
    }
}

#[async_trait]
impl Rollback for Sequence {
    async fn rollback(&self, ctx: &Context, sink: &SharedSink) {
        let scoped = with_prefix(sink, SUB_COMMAND_PREFIX);
        self.compensate(ctx, &scoped, self.cmds.len()).await;
        ctx.pop();
    }
}

#[async_trait]
impl DryRun for Sequence {
    async fn dry_run(&self, ctx: &Context, sink: &SharedSink) {
        let scoped = with_prefix(sink, SUB_COMMAND_PREFIX);

        for cmd in &self.cmds {
            ctx.push();
            match cmd.as_dry_run() {
                Some(dry) => dry.dry_run(ctx, &scoped).await,
                None => sink.debug(&format!("{cmd} has no dry run, skipping")),
            }

            // A simulated failure halts the sequence like a real one, but
            // nothing is compensated since nothing real was done.
            if ctx.err().is_some() {
                return;
            }
        }
    }
}
