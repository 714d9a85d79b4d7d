//! Single reactor thread driving every context's pipeline (`spec.md` §4.7,
//! C7).
//!
//! The original owns a libcurl multi-handle and steps it manually so many
//! HTTP transfers can overlap without extra OS threads. This crate's
//! [`super::transport::Transport`] is a blocking call, so genuine overlap
//! instead comes from spawning one short-lived thread per dispatched
//! message (bounded by the context's `pipeline_length`, exactly like the
//! original's slot count) that reports its outcome back onto the reactor's
//! own event channel. The reactor thread is still the single owner of all
//! context state; only the blocking transport call itself runs elsewhere.

use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use json::AllocatorHandle;

use crate::client::context::{Context, ContextId};
use crate::client::executor::Executor;
use crate::client::message::Message;
use crate::client::settings::HttpSettings;
use crate::client::transport::{HttpRequest, Transport, TransportError};
use crate::envelope::{self, RequestId};
use crate::error::{Error, ErrorCode};

enum ReactorEvent {
    CreateContext(ContextId, HttpSettings),
    Submit(ContextId, Message),
    /// A message requeued once after a non-timeout transport failure
    /// (`spec.md` §4.7 Failure semantics); handled identically to `Submit`.
    Retry(ContextId, Message),
    DestroyContext(ContextId),
    SlotFreed(ContextId),
    Shutdown,
}

/// Handle to the background reactor thread. Dropping it does not stop the
/// thread; call [`Proactor::shutdown`] explicitly.
pub struct Proactor {
    events: mpsc::Sender<ReactorEvent>,
    thread: std::sync::Mutex<Option<JoinHandle<()>>>,
    next_context_id: std::sync::atomic::AtomicU64,
}

impl Proactor {
    pub fn new(transport: Arc<dyn Transport>, executor: Arc<Executor>, allocator: AllocatorHandle) -> Arc<Self> {
        let (tx, rx) = mpsc::channel();
        let tx_for_loop = tx.clone();
        let thread = thread::spawn(move || reactor_loop(rx, tx_for_loop, transport, executor, allocator));

        Arc::new(Proactor {
            events: tx,
            thread: std::sync::Mutex::new(Some(thread)),
            next_context_id: std::sync::atomic::AtomicU64::new(1),
        })
    }

    pub fn create_context(&self, settings: HttpSettings) -> ContextId {
        let id = self.next_context_id.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let _ = self.events.send(ReactorEvent::CreateContext(id, settings));
        id
    }

    pub fn submit(&self, context: ContextId, message: Message) {
        let _ = self.events.send(ReactorEvent::Submit(context, message));
    }

    /// Aborts in-flight work and fails all pending messages for `context`
    /// with `InternalError`. Idempotent after the first call (a context
    /// that no longer exists is simply not found, which is a no-op).
    pub fn destroy_context(&self, context: ContextId) {
        let _ = self.events.send(ReactorEvent::DestroyContext(context));
    }

    /// Cooperative shutdown: the reactor observes the stop event, drains,
    /// and this call joins the thread.
    pub fn shutdown(&self) {
        let _ = self.events.send(ReactorEvent::Shutdown);
        if let Some(handle) = self.thread.lock().unwrap_or_else(|e| e.into_inner()).take() {
            let _ = handle.join();
        }
    }
}

fn reactor_loop(
    rx: mpsc::Receiver<ReactorEvent>,
    self_tx: mpsc::Sender<ReactorEvent>,
    transport: Arc<dyn Transport>,
    executor: Arc<Executor>,
    allocator: AllocatorHandle,
) {
    let mut contexts: HashMap<ContextId, Context> = HashMap::new();

    loop {
        let event = match rx.recv_timeout(Duration::from_millis(50)) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => {
                dispatch_ready(&mut contexts, &transport, &executor, &self_tx, &allocator);
                continue;
            }
            Err(RecvTimeoutError::Disconnected) => return,
        };

        match event {
            ReactorEvent::CreateContext(id, settings) => {
                contexts.insert(id, Context::new(id, settings));
            }
            ReactorEvent::Submit(context_id, message) | ReactorEvent::Retry(context_id, message) => {
                if let Some(context) = contexts.get_mut(&context_id) {
                    context.enqueue(message);
                } else {
                    warn!(context_id, "submit to unknown context");
                    complete_missing_context(message, &executor);
                }
            }
            ReactorEvent::DestroyContext(context_id) => {
                if let Some(mut context) = contexts.remove(&context_id) {
                    for message in context.cancel_pending() {
                        complete_destroyed(message, &executor);
                    }
                }
            }
            ReactorEvent::SlotFreed(context_id) => {
                if let Some(context) = contexts.get_mut(&context_id) {
                    context.complete_one();
                }
            }
            ReactorEvent::Shutdown => return,
        }

        dispatch_ready(&mut contexts, &transport, &executor, &self_tx, &allocator);
    }
}

fn complete_missing_context(message: Message, executor: &Arc<Executor>) {
    let err = Error::internal_error("context does not exist");
    deliver_now(message, Err(err), executor);
}

fn complete_destroyed(message: Message, executor: &Arc<Executor>) {
    let err = Error::internal_error("context destroyed");
    deliver_now(message, Err(err), executor);
}

fn deliver_now(message: Message, result: Result<json::Value, Error>, executor: &Arc<Executor>) {
    executor.submit(message.delivery, result);
}

fn dispatch_ready(
    contexts: &mut HashMap<ContextId, Context>,
    transport: &Arc<dyn Transport>,
    executor: &Arc<Executor>,
    self_tx: &mpsc::Sender<ReactorEvent>,
    allocator: &AllocatorHandle,
) {
    for (&context_id, context) in contexts.iter_mut() {
        for message in context.take_expired_pending() {
            executor.submit(message.delivery, Err(Error::internal_error("message exceeded its time-to-live")));
        }

        while let Some(message) = context.try_dequeue() {
            spawn_transport_call(context_id, message, context.settings().clone(), transport.clone(), executor.clone(), self_tx.clone(), allocator.clone());
        }
    }
}

/// Runs one blocking HTTP call on its own thread, then reports the
/// completion back to the reactor (to free the context's slot) and to the
/// executor (to deliver the result to the caller).
fn spawn_transport_call(
    context_id: ContextId,
    message: Message,
    settings: HttpSettings,
    transport: Arc<dyn Transport>,
    executor: Arc<Executor>,
    self_tx: mpsc::Sender<ReactorEvent>,
    allocator: AllocatorHandle,
) {
    thread::spawn(move || {
        if let Some(deadline) = message.deadline {
            if deadline.has_passed() {
                executor.submit(message.delivery, Err(Error::internal_error("message exceeded its time-to-live")));
                let _ = self_tx.send(ReactorEvent::SlotFreed(context_id));
                return;
            }
        }

        let request = HttpRequest {
            url: settings.url_or_default().to_string(),
            headers: settings.headers_or_default(),
            body: message.request_body.clone(),
            timeout: settings.timeout_or_default(),
        };

        debug!(context_id, method = %message.method, "dispatching RPC call");
        match transport.send(&request) {
            Ok(body) => {
                let result = handle_response(&body, &message.id, &allocator);
                executor.submit(message.delivery, result);
            }
            Err(TransportError::TimedOut) => {
                executor.submit(message.delivery, Err(Error::new(ErrorCode::ServerError(-32000), "transport timed out")));
            }
            Err(TransportError::Other(reason)) if !message.retried => {
                // One requeue on a non-timeout transport failure, never a
                // second time and never with backoff (spec.md §4.7 Failure
                // semantics).
                warn!(context_id, method = %message.method, error = %reason, "transport error, requeueing once");
                let _ = self_tx.send(ReactorEvent::Retry(context_id, Message { retried: true, ..message }));
                let _ = self_tx.send(ReactorEvent::SlotFreed(context_id));
                return;
            }
            Err(TransportError::Other(reason)) => {
                executor.submit(message.delivery, Err(Error::internal_error(reason)));
            }
        }

        let _ = self_tx.send(ReactorEvent::SlotFreed(context_id));
    });
}

fn handle_response(body: &str, id: &Option<RequestId>, allocator: &AllocatorHandle) -> Result<json::Value, Error> {
    let parsed = json::parse(
        body,
        json::ParseOptions {
            allocator: allocator.clone(),
            ..Default::default()
        },
    )
    .map_err(|e| Error::new(ErrorCode::ParseError, format!("invalid response body: {e}")))?;

    let Some(expected_id) = id else {
        // Notifications have no response to correlate against; a body, if
        // any, is simply ignored.
        return Ok(json::Value::null(allocator.clone()));
    };

    match envelope::validate_response(&parsed, expected_id)? {
        envelope::Response::Success { result, .. } => Ok(result),
        envelope::Response::Error { error, .. } => Err(error),
    }
}
