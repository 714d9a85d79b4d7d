//! A single outgoing call and how its completion gets back to the caller
//! (`spec.md` §4.7/§4.8, C7/C8).

use std::sync::{Arc, Condvar, Mutex};

use crate::envelope::RequestId;
use crate::error::Error;
use crate::time::Deadline;

/// Shared slot a blocking `call` waits on; the executor fills it in and
/// notifies the condition variable exactly once.
#[derive(Debug, Default)]
pub struct CallSlot {
    state: Mutex<Option<Result<json::Value, Error>>>,
    ready: Condvar,
}

impl CallSlot {
    pub fn new() -> Arc<Self> {
        Arc::new(CallSlot::default())
    }

    pub fn fulfil(&self, result: Result<json::Value, Error>) {
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if guard.is_none() {
            *guard = Some(result);
            self.ready.notify_one();
        }
    }

    /// Blocks the calling thread until [`CallSlot::fulfil`] is called.
    pub fn wait(&self) -> Result<json::Value, Error> {
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        while guard.is_none() {
            guard = self.ready.wait(guard).unwrap_or_else(|e| e.into_inner());
        }
        guard.take().expect("just checked Some")
    }
}

/// How a completed message's result reaches the caller.
pub enum Delivery {
    /// `call_method`: a future-like [`CallSlot`] the caller blocks on.
    Sync(Arc<CallSlot>),
    /// An async call: invoke the user callback on the executor worker.
    /// Exceptions (panics) from the callback are caught and swallowed, per
    /// §4.8, rather than taking down the worker.
    Async(Box<dyn FnOnce(Result<json::Value, Error>) + Send>),
    /// A notification: no result is expected, but transport failure still
    /// needs to resolve *something* so the caller's future doesn't hang.
    Notify(Arc<CallSlot>),
}

impl std::fmt::Debug for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Delivery::Sync(_) => write!(f, "Delivery::Sync"),
            Delivery::Async(_) => write!(f, "Delivery::Async"),
            Delivery::Notify(_) => write!(f, "Delivery::Notify"),
        }
    }
}

/// One call or notification in flight through a [`super::context::Context`].
#[derive(Debug)]
pub struct Message {
    pub id: Option<RequestId>,
    pub method: String,
    pub request_body: String,
    pub delivery: Delivery,
    pub deadline: Option<Deadline>,
    /// Set once a transport failure has already triggered one requeue
    /// (`spec.md` §4.7 Failure semantics): a message is retried at most
    /// once, never with backoff.
    pub retried: bool,
}
