//! Execution Context
//!
//! Layered shared state threaded through a command tree: a stack of key/value
//! frames plus one failure slot, guarded by a single read/write lock. A new
//! frame is pushed for every nested scope, so a child scope can shadow an
//! ancestor's value but never destroy it.
//!
//! Every operation is individually atomic. Compound check-then-act sequences
//! are the caller's responsibility to serialize.

use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::Failure;

/// An opaque value stored in a context frame.
pub type Value = Arc<dyn Any + Send + Sync>;

type Frame = HashMap<String, Value>;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(0);

/// Shared execution state for one run of a command tree.
///
/// Handles are cheap to clone; all clones observe the same frames and failure
/// slot. Commands read and write data with [`get`](Context::get) /
/// [`set`](Context::set) and signal failure with [`set_err`](Context::set_err);
/// frame management is orchestrator-internal.
#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

struct Inner {
    id: u64,
    parent: Option<Context>,
    state: RwLock<State>,
}

struct State {
    frames: Vec<Frame>,
    failure: Option<Failure>,
}

impl Context {
    /// Create a fresh root context with a single frame and no failure.
    ///
    /// One of these is constructed per top-level run; there is no process-wide
    /// shared instance.
    pub fn new() -> Self {
        Context::build(None, None)
    }

    pub(crate) fn new_child(parent: Context, failure: Option<Failure>) -> Self {
        Context::build(Some(parent), failure)
    }

    fn build(parent: Option<Context>, failure: Option<Failure>) -> Self {
        Context {
            inner: Arc::new(Inner {
                id: NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed),
                parent,
                state: RwLock::new(State {
                    frames: vec![Frame::new()],
                    failure,
                }),
            }),
        }
    }

    /// Identity of this context instance, stable across clones.
    pub(crate) fn id(&self) -> u64 {
        self.inner.id
    }

    pub(crate) fn parent(&self) -> Option<&Context> {
        self.inner.parent.as_ref()
    }

    /// The current failure, if a command in this scope has failed.
    ///
    /// A non-empty slot tells the enclosing sequence or parallel to stop
    /// advancing and compensate completed work. Forked branch contexts keep
    /// their own slot; see [`fork`](Context::fork).
    pub fn err(&self) -> Option<Failure> {
        self.inner.state.read().failure.clone()
    }

    /// Record a failure, marking this scope as failed.
    pub fn set_err(&self, failure: impl Into<Failure>) {
        self.inner.state.write().failure = Some(failure.into());
    }

    // Suppression is reserved for the Failable wrapper; ordinary commands
    // cannot unset an existing failure.
    pub(crate) fn clear_err(&self) {
        self.inner.state.write().failure = None;
    }

    /// Look up a value, searching frames newest-first and falling through to
    /// the parent context when this one has no binding.
    pub fn get(&self, key: &str) -> Option<Value> {
        {
            let state = self.inner.state.read();
            for frame in state.frames.iter().rev() {
                if let Some(value) = frame.get(key) {
                    return Some(Arc::clone(value));
                }
            }
        }
        self.parent().and_then(|parent| parent.get(key))
    }

    /// Typed lookup; `None` when the key is absent or holds another type.
    pub fn get_as<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.get(key).and_then(|value| value.downcast::<T>().ok())
    }

    /// Bind a value in the current (top) frame.
    ///
    /// Writes never touch older frames: rebinding a key an ancestor frame also
    /// holds shadows the ancestor's value until this scope's frame is popped.
    pub fn set<V: Any + Send + Sync>(&self, key: impl Into<String>, value: V) {
        self.inner
            .state
            .write()
            .frames
            .last_mut()
            .expect("context always holds the root frame")
            .insert(key.into(), Arc::new(value));
    }

    /// Number of frames currently on the stack.
    pub fn depth(&self) -> usize {
        self.inner.state.read().frames.len()
    }

    pub(crate) fn push(&self) {
        self.inner.state.write().frames.push(Frame::new());
    }

    /// Remove the top frame.
    ///
    /// Panics when only the root frame remains: an unbalanced pop means the
    /// orchestrator itself is broken, which is not a recoverable condition.
    pub(crate) fn pop(&self) {
        let mut state = self.inner.state.write();
        if state.frames.len() == 1 {
            panic!("cannot pop the root context frame");
        }
        state.frames.pop();
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::new()
    }
}
