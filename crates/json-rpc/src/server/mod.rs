//! Process-local JSON-RPC server dispatch (`spec.md` §4.9, C9).

pub mod settings;

use std::collections::HashMap;
use std::sync::Arc;

use json::{AllocatorHandle, Value};
use tracing::debug;

use crate::envelope::{self, build_error_response, build_success_response, Request, RequestId};
use crate::error::{Error, ErrorCode};

/// A registered method's implementation.
pub type MethodHandler = Arc<dyn Fn(Option<&Value>) -> Result<Value, Error> + Send + Sync>;

/// The "next" handler a [`MethodWrapper`] can invoke to run the actual
/// registered method.
pub type Next<'a> = dyn Fn(Option<&Value>) -> Result<Value, Error> + 'a;

/// Uniform per-call hook (`spec.md` §4.9's `method_handler`) installed with
/// [`Server::set_method_handler`]; wraps every dispatched call, e.g. for
/// logging or auth. Receives the method name and params, plus `next` to
/// invoke the registered handler.
pub type MethodWrapper = Arc<dyn Fn(&str, Option<&Value>, &Next) -> Result<Value, Error> + Send + Sync>;

/// Builds and dispatches JSON-RPC requests against a process-local method
/// table. Thread-per-connection or a bounded pool is the caller's choice;
/// `execute` itself is just a pure `bytes -> bytes` function and is safe to
/// call concurrently from as many threads as the caller likes.
#[derive(Clone)]
pub struct Server {
    methods: Arc<std::sync::RwLock<HashMap<String, MethodHandler>>>,
    wrapper: Arc<std::sync::RwLock<Option<MethodWrapper>>>,
    allocator: AllocatorHandle,
}

impl Default for Server {
    fn default() -> Self {
        Server::new()
    }
}

impl Server {
    pub fn new() -> Self {
        Server {
            methods: Arc::new(std::sync::RwLock::new(HashMap::new())),
            wrapper: Arc::new(std::sync::RwLock::new(None)),
            allocator: json::allocator::default_allocator(),
        }
    }

    pub fn add_command(&self, name: impl Into<String>, handler: impl Fn(Option<&Value>) -> Result<Value, Error> + Send + Sync + 'static) {
        self.methods
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.into(), Arc::new(handler));
    }

    pub fn remove_command(&self, name: &str) {
        self.methods.write().unwrap_or_else(|e| e.into_inner()).remove(name);
    }

    pub fn set_method_handler(&self, hook: MethodWrapper) {
        *self.wrapper.write().unwrap_or_else(|e| e.into_inner()) = Some(hook);
    }

    /// `parse -> validate envelope -> route -> invoke -> build response`.
    /// Each failure point produces the matching error envelope; a
    /// successfully dispatched notification (no `id`) produces an empty
    /// response body rather than any envelope at all.
    pub fn execute(&self, request_bytes: &str) -> String {
        let parsed = match json::parse(
            request_bytes,
            json::ParseOptions {
                allocator: self.allocator.clone(),
                ..Default::default()
            },
        ) {
            Ok(value) => value,
            Err(parse_err) => {
                let error = Error::new(ErrorCode::ParseError, parse_err.to_string());
                return json::to_string_compact(&build_error_response(RequestId::Null, &error, self.allocator.clone()));
            }
        };

        let request = match envelope::validate_request(&parsed) {
            Ok(request) => request,
            Err(error) => {
                return json::to_string_compact(&build_error_response(RequestId::Null, &error, self.allocator.clone()));
            }
        };

        match self.dispatch(&request) {
            Ok(result) => match request.id {
                Some(id) => json::to_string_compact(&build_success_response(id, result, self.allocator.clone())),
                None => String::new(),
            },
            Err(error) => match request.id {
                Some(id) => json::to_string_compact(&build_error_response(id, &error, self.allocator.clone())),
                None => String::new(),
            },
        }
    }

    fn dispatch(&self, request: &Request) -> Result<Value, Error> {
        let handler = self
            .methods
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&request.method)
            .cloned()
            .ok_or_else(|| Error::method_not_found(&request.method))?;

        debug!(method = %request.method, "dispatching RPC method");

        let params = request.params.as_ref();
        let wrapper = self.wrapper.read().unwrap_or_else(|e| e.into_inner()).clone();
        match wrapper {
            Some(wrapper) => wrapper(&request.method, params, &|p| handler(p)),
            None => handler(params),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_method_is_invoked_and_wrapped_in_success_envelope() {
        let server = Server::new();
        server.add_command("echo", |params| {
            Ok(params.cloned().unwrap_or_else(|| Value::null(json::allocator::default_allocator())))
        });

        let response = server.execute(r#"{"jsonrpc":"2.0","method":"echo","params":{"x":1},"id":1}"#);
        let parsed = json::parse(&response, json::ParseOptions::default()).unwrap();
        assert_eq!(parsed["result"]["x"].as_i64().unwrap(), 1);
        assert_eq!(parsed["id"].as_i64().unwrap(), 1);
    }

    #[test]
    fn unknown_method_yields_method_not_found() {
        let server = Server::new();
        let response = server.execute(r#"{"jsonrpc":"2.0","method":"missing","id":1}"#);
        let parsed = json::parse(&response, json::ParseOptions::default()).unwrap();
        assert_eq!(parsed["error"]["code"].as_i64().unwrap(), ErrorCode::MethodNotFound.as_i32() as i64);
    }

    #[test]
    fn notification_produces_empty_response_body() {
        let server = Server::new();
        server.add_command("ping", |_| Ok(Value::null(json::allocator::default_allocator())));
        let response = server.execute(r#"{"jsonrpc":"2.0","method":"ping"}"#);
        assert_eq!(response, "");
    }

    #[test]
    fn malformed_json_yields_parse_error_with_null_id() {
        let server = Server::new();
        let response = server.execute("{not json");
        let parsed = json::parse(&response, json::ParseOptions::default()).unwrap();
        assert_eq!(parsed["error"]["code"].as_i64().unwrap(), ErrorCode::ParseError.as_i32() as i64);
        assert!(parsed["id"].is_null());
    }

    #[test]
    fn method_handler_hook_can_observe_every_call() {
        let server = Server::new();
        server.add_command("ping", |_| Ok(Value::from_bool(true, json::allocator::default_allocator())));

        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen_for_hook = seen.clone();
        server.set_method_handler(Arc::new(move |method, params, next| {
            seen_for_hook.lock().unwrap().push(method.to_string());
            next(params)
        }));

        server.execute(r#"{"jsonrpc":"2.0","method":"ping","id":1}"#);
        assert_eq!(*seen.lock().unwrap(), vec!["ping".to_string()]);
    }
}
