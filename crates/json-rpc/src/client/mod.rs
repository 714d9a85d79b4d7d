//! JSON-RPC 2.0 HTTP client: one reactor thread plus a fixed executor pool
//! (`spec.md` §4.7/§4.8, C7/C8).

pub mod context;
pub mod executor;
pub mod message;
pub mod proactor;
pub mod settings;
pub mod transport;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use json::{AllocatorHandle, Value};

use crate::client::context::{ContextId, IdBuilder};
use crate::client::executor::Executor;
use crate::client::message::{CallSlot, Delivery, Message};
use crate::client::proactor::Proactor;
use crate::client::settings::HttpSettings;
use crate::client::transport::{ReqwestTransport, Transport};
use crate::envelope::RequestId;
use crate::error::Error;
use crate::time::Deadline;

/// Top-level client: owns the reactor thread and the executor pool.
/// [`Client::context`] hands out lightweight handles that share both.
pub struct Client {
    proactor: Arc<Proactor>,
    executor: Arc<Executor>,
    allocator: AllocatorHandle,
}

impl Client {
    /// Builds a client over the default transport (`reqwest::blocking`).
    pub fn new(thread_pool_size: usize) -> Self {
        Self::with_transport(Arc::new(ReqwestTransport::default()), thread_pool_size)
    }

    pub fn with_transport(transport: Arc<dyn Transport>, thread_pool_size: usize) -> Self {
        let allocator = json::allocator::default_allocator();
        let executor = Executor::new(thread_pool_size);
        let proactor = Proactor::new(transport, executor.clone(), allocator.clone());
        Client {
            proactor,
            executor,
            allocator,
        }
    }

    pub fn create_context(&self, settings: HttpSettings) -> Context {
        let id = self.proactor.create_context(settings);
        Context {
            id,
            proactor: self.proactor.clone(),
            allocator: self.allocator.clone(),
            next_message_id: AtomicU64::new(0),
            id_builder: Mutex::new(None),
        }
    }

    /// Cooperative shutdown of both the reactor and the executor pool.
    pub fn shutdown(&self) {
        self.proactor.shutdown();
        self.executor.shutdown();
    }
}

/// A lightweight handle to one logical connection's message stream. Cloning
/// a `Client` or reusing a `Context` across threads is fine: all mutable
/// state lives on the reactor thread.
pub struct Context {
    id: ContextId,
    proactor: Arc<Proactor>,
    allocator: AllocatorHandle,
    next_message_id: AtomicU64,
    id_builder: Mutex<Option<IdBuilder>>,
}

impl Context {
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Installs the hook that turns this context's monotonic message
    /// counter into a string id (`spec.md` §4.7's `id_builder`). Lives on
    /// the client handle rather than the reactor-owned context: assigning
    /// an id doesn't need to serialize through the reactor thread, only be
    /// monotonic per handle, which an atomic counter gives for free.
    pub fn set_id_builder(&self, builder: IdBuilder) {
        *self.id_builder.lock().unwrap_or_else(|e| e.into_inner()) = Some(builder);
    }

    fn next_id(&self) -> RequestId {
        let n = self.next_message_id.fetch_add(1, Ordering::Relaxed);
        match self.id_builder.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
            Some(builder) => RequestId::String(builder(n)),
            None => RequestId::Number(json::Number::from(n as i64)),
        }
    }

    fn build_request_body(&self, method: &str, params: Option<Value>, id: Option<&RequestId>) -> String {
        let mut request = Value::new_object(self.allocator.clone());
        request["jsonrpc"] = Value::from_str("2.0", self.allocator.clone());
        request["method"] = Value::from_str(method, self.allocator.clone());
        if let Some(params) = params {
            request["params"] = params;
        }
        if let Some(id) = id {
            request["id"] = id.to_value(self.allocator.clone());
        }
        json::to_string_compact(&request)
    }

    /// Synchronous call: blocks the calling thread until the response
    /// arrives, the context is destroyed, or the message's TTL expires.
    pub fn call_method(&self, method: &str, params: Option<Value>, time_to_live_ms: Option<u32>) -> Result<Value, Error> {
        let slot = CallSlot::new();
        self.submit(method, params, Delivery::Sync(slot.clone()), time_to_live_ms, true);
        slot.wait()
    }

    /// Asynchronous call: `callback` runs on an executor worker once the
    /// response (or failure) is known. A panic inside `callback` is
    /// swallowed.
    pub fn call_method_async(
        &self,
        method: &str,
        params: Option<Value>,
        time_to_live_ms: Option<u32>,
        callback: impl FnOnce(Result<Value, Error>) + Send + 'static,
    ) {
        self.submit(method, params, Delivery::Async(Box::new(callback)), time_to_live_ms, true);
    }

    /// A notification carries no `id` and expects no response; the
    /// returned handle resolves once the request has been sent (or fails
    /// with the transport error, if any).
    pub fn notify(&self, method: &str, params: Option<Value>) -> Result<(), Error> {
        let slot = CallSlot::new();
        self.submit(method, params, Delivery::Notify(slot.clone()), None, false);
        slot.wait().map(|_| ())
    }

    fn submit(&self, method: &str, params: Option<Value>, delivery: Delivery, time_to_live_ms: Option<u32>, has_id: bool) {
        let id = has_id.then(|| self.next_id());
        let body = self.build_request_body(method, params, id.as_ref());
        let deadline = time_to_live_ms.map(|ms| Deadline::after(std::time::Duration::from_millis(ms as u64)));

        self.proactor.submit(
            self.id,
            Message {
                id,
                method: method.to_string(),
                request_body: body,
                delivery,
                deadline,
                retried: false,
            },
        );
    }

    /// Aborts in-flight work and fails all pending messages with
    /// `InternalError`.
    pub fn destroy(&self) {
        self.proactor.destroy_context(self.id);
    }
}
