//! Top-Level Entry Points
//!
//! Runs a command tree to completion against a fresh root context. The given
//! commands are wrapped in a root [`Sequence`], so a flat list gets
//! sequential semantics and arbitrary trees are built by nesting
//! combinators.

use std::sync::Arc;

use crate::command::Command;
use crate::context::Context;
use crate::error::Failure;
use crate::sequence::Sequence;
use crate::sink::{SharedSink, TracingSink};

/// Run the commands in sequence, returning the terminal failure if the run
/// was rolled back. Diagnostics go to the tracing-backed default sink.
pub async fn run(cmds: Vec<Arc<dyn Command>>) -> Result<(), Failure> {
    run_with_sink(TracingSink::shared(), cmds).await
}

/// Run the commands in sequence with an explicit diagnostic sink.
pub async fn run_with_sink(sink: SharedSink, cmds: Vec<Arc<dyn Command>>) -> Result<(), Failure> {
    let ctx = Context::new();
    Sequence::new(cmds).run(&ctx, &sink).await;
    match ctx.err() {
        Some(failure) => Err(failure),
        None => Ok(()),
    }
}

/// Simulate a run of the commands without destructive effects. Failures
/// surface through the context contract and the default sink only.
pub async fn dry_run(cmds: Vec<Arc<dyn Command>>) {
    dry_run_with_sink(TracingSink::shared(), cmds).await;
}

/// Simulate a run with an explicit diagnostic sink.
pub async fn dry_run_with_sink(sink: SharedSink, cmds: Vec<Arc<dyn Command>>) {
    use crate::command::DryRun as _;

    let ctx = Context::new();
    Sequence::new(cmds).dry_run(&ctx, &sink).await;
}
