//! Bundled Commands
//!
//! Ready-made commands for file-staging workflows. These live outside the
//! orchestration core and only use its public capability contracts.

pub mod file_writer;

pub use file_writer::FileWriter;
