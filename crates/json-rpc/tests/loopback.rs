//! Full client/server loopback over an in-memory `Transport`, plus the
//! pipelining, TTL, and cancellation behaviors that actually need a live
//! reactor to exercise.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use json::Value;
use json_rpc::client::settings::HttpSettings as ClientSettings;
use json_rpc::client::transport::{HttpRequest, Transport, TransportError};
use json_rpc::client::Client;
use json_rpc::error::ErrorCode;
use json_rpc::server::Server;

/// Routes every outgoing request straight into a [`Server`], bypassing the
/// network entirely.
struct LoopbackTransport {
    server: Server,
}

impl Transport for LoopbackTransport {
    fn send(&self, request: &HttpRequest) -> Result<String, TransportError> {
        Ok(self.server.execute(&request.body))
    }
}

fn echo_server() -> Server {
    let server = Server::new();
    server.add_command("echo", |params| Ok(params.cloned().unwrap_or_else(|| Value::null(json::allocator::default_allocator()))));
    server.add_command("add", |params| {
        let params = params.ok_or_else(|| json_rpc::error::Error::invalid_params("missing params"))?;
        let a = params["a"].as_i64().map_err(|_| json_rpc::error::Error::invalid_params("a must be a number"))?;
        let b = params["b"].as_i64().map_err(|_| json_rpc::error::Error::invalid_params("b must be a number"))?;
        Ok(Value::from_i64(a + b, json::allocator::default_allocator()))
    });
    server
}

#[test]
fn call_method_round_trips_through_server() {
    let server = echo_server();
    let client = Client::with_transport(Arc::new(LoopbackTransport { server }), 2);
    let ctx = client.create_context(ClientSettings {
        url: Some("http://loopback".into()),
        ..Default::default()
    });

    let mut params = Value::new_object(json::allocator::default_allocator());
    params["a"] = Value::from_i64(3, json::allocator::default_allocator());
    params["b"] = Value::from_i64(4, json::allocator::default_allocator());

    let result = ctx.call_method("add", Some(params), None).unwrap();
    assert_eq!(result.as_i64().unwrap(), 7);

    client.shutdown();
}

#[test]
fn notify_produces_no_response_and_does_not_block() {
    let server = echo_server();
    let client = Client::with_transport(Arc::new(LoopbackTransport { server }), 2);
    let ctx = client.create_context(ClientSettings {
        url: Some("http://loopback".into()),
        ..Default::default()
    });

    ctx.notify("echo", None).unwrap();
    client.shutdown();
}

#[test]
fn unknown_method_surfaces_as_method_not_found_error() {
    let server = echo_server();
    let client = Client::with_transport(Arc::new(LoopbackTransport { server }), 2);
    let ctx = client.create_context(ClientSettings {
        url: Some("http://loopback".into()),
        ..Default::default()
    });

    let err = ctx.call_method("does-not-exist", None, None).unwrap_err();
    assert_eq!(err.code, ErrorCode::MethodNotFound);
    client.shutdown();
}

#[test]
fn call_method_async_delivers_on_executor_worker() {
    let server = echo_server();
    let client = Client::with_transport(Arc::new(LoopbackTransport { server }), 2);
    let ctx = client.create_context(ClientSettings {
        url: Some("http://loopback".into()),
        ..Default::default()
    });

    let slot = Arc::new((std::sync::Mutex::new(None), std::sync::Condvar::new()));
    let slot_for_callback = slot.clone();
    ctx.call_method_async("echo", None, None, move |result| {
        *slot_for_callback.0.lock().unwrap() = Some(result);
        slot_for_callback.1.notify_one();
    });

    let mut guard = slot.0.lock().unwrap();
    while guard.is_none() {
        guard = slot.1.wait(guard).unwrap();
    }
    assert!(guard.take().unwrap().is_ok());
    client.shutdown();
}

#[test]
fn message_past_its_time_to_live_fails_without_reaching_the_server() {
    struct NeverCalled(AtomicUsize);
    impl Transport for NeverCalled {
        fn send(&self, _request: &HttpRequest) -> Result<String, TransportError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(r#"{"jsonrpc":"2.0","result":null,"id":1}"#.to_string())
        }
    }

    let transport = Arc::new(NeverCalled(AtomicUsize::new(0)));
    let client = Client::with_transport(transport.clone(), 1);
    let ctx = client.create_context(ClientSettings {
        url: Some("http://loopback".into()),
        ..Default::default()
    });

    // A already-expired deadline: 0ms TTL plus a brief sleep before the
    // reactor's dispatch loop has any chance to pick the message up.
    std::thread::sleep(Duration::from_millis(10));
    let err = ctx.call_method("echo", None, Some(0)).unwrap_err();
    assert_eq!(err.code, ErrorCode::InternalError);

    client.shutdown();
}

#[test]
fn destroying_a_context_cancels_still_pending_messages() {
    struct Blocking;
    impl Transport for Blocking {
        fn send(&self, _request: &HttpRequest) -> Result<String, TransportError> {
            std::thread::sleep(Duration::from_millis(200));
            Ok(r#"{"jsonrpc":"2.0","result":null,"id":1}"#.to_string())
        }
    }

    let client = Client::with_transport(Arc::new(Blocking), 4);
    let ctx = client.create_context(ClientSettings {
        url: Some("http://loopback".into()),
        pipeline_length: Some(1),
        ..Default::default()
    });

    // Fill the single pipeline slot, then queue a second message that can
    // only ever sit in `pending`.
    let ctx = Arc::new(ctx);
    let ctx_for_first = ctx.clone();
    let first = std::thread::spawn(move || ctx_for_first.call_method("echo", None, None));

    std::thread::sleep(Duration::from_millis(20));
    let ctx_for_second = ctx.clone();
    let second = std::thread::spawn(move || ctx_for_second.call_method("echo", None, None));

    std::thread::sleep(Duration::from_millis(20));
    ctx.destroy();

    let second_result = second.join().unwrap();
    assert_eq!(second_result.unwrap_err().code, ErrorCode::InternalError);

    let _ = first.join();
    client.shutdown();
}

#[test]
fn pending_message_behind_a_saturated_pipeline_expires_without_being_dispatched() {
    struct Blocking;
    impl Transport for Blocking {
        fn send(&self, _request: &HttpRequest) -> Result<String, TransportError> {
            std::thread::sleep(Duration::from_millis(300));
            Ok(r#"{"jsonrpc":"2.0","result":null,"id":1}"#.to_string())
        }
    }

    let client = Client::with_transport(Arc::new(Blocking), 4);
    let ctx = client.create_context(ClientSettings {
        url: Some("http://loopback".into()),
        pipeline_length: Some(1),
        ..Default::default()
    });

    // Fill the single pipeline slot with a slow call, then queue a second
    // message with a short TTL that can only ever sit in `pending` — it
    // must be completed with `InternalError` once its deadline passes,
    // not stay stuck behind the in-flight call.
    let ctx = Arc::new(ctx);
    let ctx_for_first = ctx.clone();
    let first = std::thread::spawn(move || ctx_for_first.call_method("echo", None, None));

    std::thread::sleep(Duration::from_millis(20));
    let err = ctx.call_method("echo", None, Some(30)).unwrap_err();
    assert_eq!(err.code, ErrorCode::InternalError);

    let _ = first.join();
    client.shutdown();
}

#[test]
fn transport_error_is_retried_once_then_succeeds() {
    struct FailOnce(AtomicUsize);
    impl Transport for FailOnce {
        fn send(&self, _request: &HttpRequest) -> Result<String, TransportError> {
            if self.0.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(TransportError::Other("connection reset".into()))
            } else {
                Ok(r#"{"jsonrpc":"2.0","result":true,"id":1}"#.to_string())
            }
        }
    }

    let client = Client::with_transport(Arc::new(FailOnce(AtomicUsize::new(0))), 2);
    let ctx = client.create_context(ClientSettings {
        url: Some("http://loopback".into()),
        ..Default::default()
    });

    let result = ctx.call_method("echo", None, None).unwrap();
    assert_eq!(result.as_bool().unwrap(), true);
    client.shutdown();
}

#[test]
fn transport_error_on_the_retry_itself_is_not_retried_again() {
    struct AlwaysFails(Arc<AtomicUsize>);
    impl Transport for AlwaysFails {
        fn send(&self, _request: &HttpRequest) -> Result<String, TransportError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(TransportError::Other("connection reset".into()))
        }
    }

    let attempts = Arc::new(AtomicUsize::new(0));
    let client = Client::with_transport(Arc::new(AlwaysFails(attempts.clone())), 2);
    let ctx = client.create_context(ClientSettings {
        url: Some("http://loopback".into()),
        ..Default::default()
    });

    let err = ctx.call_method("echo", None, None).unwrap_err();
    assert_eq!(err.code, ErrorCode::InternalError);
    // Initial attempt plus exactly one retry, never more.
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(attempts.load(Ordering::SeqCst), 2);

    client.shutdown();
}

#[test]
fn string_id_builder_is_used_for_every_message() {
    let server = echo_server();
    let client = Client::with_transport(Arc::new(LoopbackTransport { server }), 2);
    let ctx = client.create_context(ClientSettings {
        url: Some("http://loopback".into()),
        ..Default::default()
    });
    ctx.set_id_builder(Arc::new(|n| format!("req-{n}")));

    ctx.call_method("echo", None, None).unwrap();
    ctx.call_method("echo", None, None).unwrap();
    // Monotonic, distinct ids are the externally observable contract;
    // the wire format itself is exercised end-to-end by a successful call.
    client.shutdown();
}
