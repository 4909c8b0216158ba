//! Saga: Compensating-Transaction Command Orchestration
//!
//! Runs a tree of atomic commands in sequence or in parallel, threading
//! layered shared state between them and automatically undoing completed
//! work when a later command fails. Sequences compensate in strict reverse
//! order; parallels fork isolated sub-contexts per branch and reconcile
//! after a join barrier; the failable wrapper lets a step fail without
//! aborting the workflow.

pub mod command;
pub mod commands;
pub mod context;
pub mod error;
pub mod failable;
pub mod logging;
pub mod parallel;
pub mod runner;
pub mod sequence;
pub mod sink;
pub mod subcontext;
