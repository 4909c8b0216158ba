//! Forked Sub-Contexts
//!
//! A parallel branch runs against a fork of the shared context: reads fall
//! through to the parent, while writes and failures stay private to the
//! branch until the parallel combinator reconciles them after the join
//! barrier. Sibling branches never observe each other's state.

use crate::context::Context;

/// Whether a fresh fork sees a failure already present on its parent.
///
/// The default is [`Isolate`](ForkPolicy::Isolate): each branch is evaluated
/// on its own merits, and any pre-existing parent failure remains the
/// caller's concern. [`Inherit`](ForkPolicy::Inherit) copies the parent's
/// failure into the fork at creation time for callers that want a branch to
/// refuse work under an already-failed scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ForkPolicy {
    #[default]
    Isolate,
    Inherit,
}

impl Context {
    /// Fork a branch context with the default [`ForkPolicy::Isolate`].
    pub fn fork(&self) -> Context {
        self.fork_with(ForkPolicy::Isolate)
    }

    /// Fork a branch context under an explicit policy.
    ///
    /// The fork owns a private frame stack and failure slot; `get` misses
    /// fall through to this context, which the branch must treat as
    /// read-only.
    pub fn fork_with(&self, policy: ForkPolicy) -> Context {
        let inherited = match policy {
            ForkPolicy::Isolate => None,
            ForkPolicy::Inherit => self.err(),
        };
        Context::new_child(self.clone(), inherited)
    }
}
