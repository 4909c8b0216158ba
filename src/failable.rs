//! Failable Wrapper
//!
//! Decorates one command so its failure is recorded and suppressed instead
//! of propagating: the enclosing sequence continues to the next sibling as
//! if the wrapped command had succeeded. The recorded outcome keeps a later
//! rollback honest — a command that never completed its run is not
//! compensated.

use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::command::{Command, DryRun, Rollback};
use crate::context::Context;
use crate::error::Failure;
use crate::sink::SharedSink;

static NEXT_FAILABLE_ID: AtomicU64 = AtomicU64::new(0);

/// Suppresses a wrapped command's failure while preserving
/// rollback-eligibility information.
///
/// The outcome of each run is stored in the context under a key unique to
/// this instance, so independent failable wrappers in one tree never collide.
pub struct Failable {
    key: String,
    cmd: Arc<dyn Command>,
}

impl Failable {
    pub fn new(cmd: Arc<dyn Command>) -> Self {
        Failable {
            key: format!("failable:{}", NEXT_FAILABLE_ID.fetch_add(1, Ordering::Relaxed)),
            cmd,
        }
    }

    /// Record the wrapped command's outcome and clear a failure if present.
    fn suppress(&self, ctx: &Context, sink: &SharedSink) {
        let outcome = ctx.err();
        ctx.set(self.key.clone(), outcome.clone());

        if let Some(failure) = outcome {
            sink.warn(&format!("failure suppressed: {failure}"));
            ctx.clear_err();
        }
    }
}

impl fmt::Display for Failable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [failable]", self.cmd)
    }
}

#[async_trait]
impl Command for Failable {
    async fn run(&self, ctx: &Context, sink: &SharedSink) {
        self.cmd.run(ctx, sink).await;
        self.suppress(ctx, sink);
    }

    fn as_rollback(&self) -> Option<&dyn Rollback> {
        Some(self)
    }

    fn as_dry_run(&self) -> Option<&dyn DryRun> {
        Some(self)
    }
}

#[async_trait]
impl Rollback for Failable {
    async fn rollback(&self, ctx: &Context, sink: &SharedSink) {
        if let Some(outcome) = ctx.get_as::<Option<Failure>>(&self.key) {
            if let Some(failure) = outcome.as_ref() {
                // Nothing succeeded, so there is nothing to compensate.
                sink.warn(&format!("skipping rollback due to failure: {failure}"));
                return;
            }
        }

        match self.cmd.as_rollback() {
            Some(rollback) => rollback.rollback(ctx, sink).await,
            None => sink.debug(&format!("{} has no rollback, skipping", self.cmd)),
        }
    }
}

#[async_trait]
impl DryRun for Failable {
    async fn dry_run(&self, ctx: &Context, sink: &SharedSink) {
        if let Some(dry) = self.cmd.as_dry_run() {
            dry.dry_run(ctx, sink).await;
            self.suppress(ctx, sink);
        }
    }
}
