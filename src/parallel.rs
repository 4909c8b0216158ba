//! Parallel Combinator
//!
//! Concurrent composition: every command runs in its own tokio task against
//! a private fork of the shared context, behind a join barrier. Branches
//! never exchange state; after the join, the forks are scanned in creation
//! order and the first failure triggers compensation of every branch that
//! succeeded before being set on the parent context.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::command::{Command, DryRun, Rollback};
use crate::context::Context;
use crate::sink::{with_prefix, SharedSink, SUB_COMMAND_PREFIX};
use crate::subcontext::ForkPolicy;

/// Concurrent composition of commands over forked sub-contexts.
///
/// Branch execution order is unspecified; the only guarantees are the join
/// barrier (all branches finish before run returns) and the deterministic
/// failure scan in fork-creation order. Implements [`Rollback`] and
/// [`DryRun`], so parallels nest freely inside sequences and other
/// parallels.
pub struct Parallel {
    cmds: Vec<Arc<dyn Command>>,
    policy: ForkPolicy,
    // Forks recorded per run, keyed by the identity of the context the run
    // was given. Rollback is a separate call with no other channel to
    // recover them.
    forks: Mutex<HashMap<u64, Vec<Context>>>,
}

impl Parallel {
    pub fn new(cmds: Vec<Arc<dyn Command>>) -> Self {
        Parallel {
            cmds,
            policy: ForkPolicy::Isolate,
            forks: Mutex::new(HashMap::new()),
        }
    }

    /// Override the failure-inheritance policy applied when forking
    /// branches.
    pub fn with_fork_policy(mut self, policy: ForkPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn make_forks(&self, ctx: &Context) -> Vec<Context> {
        self.cmds
            .iter()
            .map(|_| ctx.fork_with(self.policy))
            .collect()
    }

    /// Recover and drain the forks recorded by a run. Each run's forks can
    /// be recovered exactly once; afterwards the entry is gone and the table
    /// does not grow with the number of contexts this parallel has seen.
    fn take_forks(&self, ctx: &Context) -> Vec<Context> {
        match self.forks.lock().remove(&ctx.id()) {
            Some(forks) => forks,
            None => panic!("rollback invoked on a parallel that never ran"),
        }
    }

    /// First failure across the forks, scanned in creation order.
    fn first_failure(forks: &[Context]) -> Option<crate::error::Failure> {
        forks.iter().find_map(|fork| fork.err())
    }

    async fn join_all(tasks: &mut JoinSet<()>) {
        while let Some(result) = tasks.join_next().await {
            if let Err(err) = result {
                if err.is_panic() {
                    std::panic::resume_unwind(err.into_panic());
                }
            }
        }
    }
}

impl fmt::Display for Parallel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} parallel commands", self.cmds.len())
    }
}

#[async_trait]
impl Command for Parallel {
    async fn run(&self, ctx: &Context, sink: &SharedSink) {
        let forks = self.make_forks(ctx);
        self.forks.lock().insert(ctx.id(), forks.clone());
        let scoped = with_prefix(sink, SUB_COMMAND_PREFIX);

        let mut tasks = JoinSet::new();
        for (cmd, fork) in self.cmds.iter().zip(&forks) {
            let cmd = Arc::clone(cmd);
            let fork = fork.clone();
            let sink = Arc::clone(&scoped);
            tasks.spawn(async move {
                cmd.run(&fork, &sink).await;
            });
        }
        Parallel::join_all(&mut tasks).await;

        if let Some(failure) = Parallel::first_failure(&forks) {
            sink.warn(&format!("parallel branch failed: {failure}"));
            self.rollback(ctx, sink).await;
            ctx.set_err(failure);
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
impl Rollback for Parallel {
    async fn rollback(&self, ctx: &Context, sink: &SharedSink) {
        let forks = self.take_forks(ctx);
        let scoped = with_prefix(sink, SUB_COMMAND_PREFIX);

        let mut tasks = JoinSet::new();
        for (cmd, fork) in self.cmds.iter().zip(&forks) {
            let cmd = Arc::clone(cmd);
            let fork = fork.clone();
            let sink = Arc::clone(&scoped);
            tasks.spawn(async move {
                // A branch that failed owns its partial state; only the
                // branches that succeeded are compensated here.
                if fork.err().is_some() {
                    sink.debug(&format!("{cmd} failed, not rolling back"));
                    return;
                }
                match cmd.as_rollback() {
                    Some(rollback) => rollback.rollback(&fork, &sink).await,
                    None => sink.debug(&format!("{cmd} has no rollback, skipping")),
                }
            });
        }
        Parallel::join_all(&mut tasks).await;
    }
}

#[async_trait]
impl DryRun for Parallel {
    async fn dry_run(&self, ctx: &Context, sink: &SharedSink) {
        let forks = self.make_forks(ctx);
        let scoped = with_prefix(sink, SUB_COMMAND_PREFIX);

        let mut tasks = JoinSet::new();
        for (cmd, fork) in self.cmds.iter().zip(&forks) {
            let cmd = Arc::clone(cmd);
            let fork = fork.clone();
            let sink = Arc::clone(&scoped);
            tasks.spawn(async move {
                match cmd.as_dry_run() {
                    Some(dry) => dry.dry_run(&fork, &sink).await,
                    None => sink.debug(&format!("{cmd} has no dry run, skipping")),
                }
            });
        }
        Parallel::join_all(&mut tasks).await;

        // Simulated failures surface on the parent but trigger no rollback.
        if let Some(failure) = Parallel::first_failure(&forks) {
            ctx.set_err(failure);
        }
    }
}
