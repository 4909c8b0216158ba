//! Error types for the saga command orchestrator.

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// An opaque step failure recorded on a [`Context`](crate::context::Context).
///
/// Commands signal failure by placing one of these in the context's failure
/// slot; the orchestrator clones it freely while deciding what to compensate,
/// so the underlying error is shared rather than owned.
///
/// Structural misuse of the orchestrator (popping the root frame, rolling back
/// a parallel that never ran) is a panic, never a `Failure`.
#[derive(Clone)]
pub struct Failure(Arc<anyhow::Error>);

impl Failure {
    /// Create a failure from a plain message.
    pub fn msg<M>(message: M) -> Self
    where
        M: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        Failure(Arc::new(anyhow::Error::msg(message)))
    }

    /// Wrap an already-built [`anyhow::Error`].
    ///
    /// An inherent constructor rather than a `From` impl: `anyhow::Error`
    /// deliberately does not implement `std::error::Error`, and a dedicated
    /// `From<anyhow::Error>` would collide with the blanket conversion below
    /// should that ever change upstream.
    pub fn from_anyhow(err: anyhow::Error) -> Self {
        Failure(Arc::new(err))
    }

    /// Attempt to downcast the underlying error to a concrete type.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.0.downcast_ref::<E>()
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<E> From<E> for Failure
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(err: E) -> Self {
        Failure(Arc::new(anyhow::Error::new(err)))
    }
}

/// Errors raised by the bundled filesystem commands
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("no source value in context for key {0:?}")]
    MissingSource(String),

    #[error("source value for key {0:?} is neither a String nor a Vec<u8>")]
    UnsupportedSource(String),

    #[error("file I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors raised while initializing logging
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid log directive: {0}")]
    InvalidDirective(String),

    #[error("invalid log format: {0} (must be 'json' or 'text')")]
    InvalidFormat(String),
}
