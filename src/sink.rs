//! Diagnostic Sink
//!
//! Leveled diagnostic output consumed by every command. The orchestrator only
//! ever writes to a sink; no orchestration behavior depends on what a sink
//! does with the messages. The default backend forwards to the `tracing`
//! macros, and tests capture output with [`MemorySink`].

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::ConfigError;

/// Prefix applied to diagnostics emitted by nested scopes.
pub const SUB_COMMAND_PREFIX: &str = "   ";

/// Diagnostic severity, lowest to highest.
///
/// `Off` is only meaningful as a threshold; nothing is ever emitted at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Off,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
            Level::Off => "off",
        };
        f.write_str(name)
    }
}

impl FromStr for Level {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "fatal" => Ok(Level::Fatal),
            "off" => Ok(Level::Off),
            other => Err(ConfigError::InvalidDirective(other.to_string())),
        }
    }
}

/// Capability contract for leveled diagnostic emission.
///
/// Implementations must be safe to share across the branches of a
/// [`Parallel`](crate::parallel::Parallel).
pub trait Sink: Send + Sync {
    /// Emit one message at the given level.
    fn log(&self, level: Level, message: &str);

    fn trace(&self, message: &str) {
        self.log(Level::Trace, message);
    }

    fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }

    fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    fn warn(&self, message: &str) {
        self.log(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }

    fn fatal(&self, message: &str) {
        self.log(Level::Fatal, message);
    }
}

/// Shared handle to a diagnostic sink.
pub type SharedSink = Arc<dyn Sink>;

/// Wrap a sink so every message carries a scope prefix.
///
/// Nested scopes stack: prefixing an already-prefixed sink concatenates the
/// prefixes, mirroring the command tree's depth in the output.
pub fn with_prefix(sink: &SharedSink, prefix: impl Into<String>) -> SharedSink {
    Arc::new(PrefixSink {
        inner: Arc::clone(sink),
        prefix: prefix.into(),
    })
}

struct PrefixSink {
    inner: SharedSink,
    prefix: String,
}

impl Sink for PrefixSink {
    fn log(&self, level: Level, message: &str) {
        self.inner.log(level, &format!("{}{}", self.prefix, message));
    }
}

/// Sink backed by the `tracing` macros.
///
/// `Fatal` has no `tracing` equivalent and is emitted as an error with a
/// `FATAL` marker.
pub struct TracingSink;

impl TracingSink {
    pub fn shared() -> SharedSink {
        Arc::new(TracingSink)
    }
}

impl Sink for TracingSink {
    fn log(&self, level: Level, message: &str) {
        match level {
            Level::Trace => tracing::trace!("{message}"),
            Level::Debug => tracing::debug!("{message}"),
            Level::Info => tracing::info!("{message}"),
            Level::Warn => tracing::warn!("{message}"),
            Level::Error => tracing::error!("{message}"),
            Level::Fatal => tracing::error!("FATAL: {message}"),
            Level::Off => {}
        }
    }
}

/// In-memory sink that records messages at or above a threshold.
///
/// Used by the test suites to assert on the exact diagnostic stream a run
/// produced.
pub struct MemorySink {
    threshold: Level,
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new(threshold: Level) -> Self {
        MemorySink {
            threshold,
            lines: Mutex::new(Vec::new()),
        }
    }

    pub fn shared(threshold: Level) -> Arc<MemorySink> {
        Arc::new(MemorySink::new(threshold))
    }

    /// All recorded messages, in emission order.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Recorded messages joined with newlines.
    pub fn contents(&self) -> String {
        self.lines.lock().join("\n")
    }
}

impl Sink for MemorySink {
    fn log(&self, level: Level, message: &str) {
        if level == Level::Off || level < self.threshold {
            return;
        }
        self.lines.lock().push(message.to_string());
    }
}
