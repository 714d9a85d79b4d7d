//! JSON-RPC 2.0 request/response envelopes (`spec.md` §4.6, C6).

use json::{Number, Value};

use crate::error::{Error, ErrorCode};

const JSONRPC_VERSION: &str = "2.0";

/// A request/response `id`: a string, a number, or `null`. Batch requests
/// are out of scope, so this is always a single scalar, never an array.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestId {
    String(String),
    Number(Number),
    Null,
}

impl RequestId {
    fn from_value(value: &Value) -> Option<RequestId> {
        match value {
            Value::Null(_) => Some(RequestId::Null),
            Value::String(_) => value.as_str().ok().map(|s| RequestId::String(s.to_string())),
            Value::Number(..) => value.as_number().ok().map(RequestId::Number),
            _ => None,
        }
    }

    pub fn to_value(&self, allocator: json::AllocatorHandle) -> Value {
        match self {
            RequestId::String(s) => Value::from_str(s, allocator),
            RequestId::Number(n) => Value::from_number(*n, allocator),
            RequestId::Null => Value::null(allocator),
        }
    }
}

/// A validated inbound request. `id` is `None` for a notification.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: String,
    pub params: Option<Value>,
    pub id: Option<RequestId>,
}

/// Validates an inbound request object per §4.6. A `null`/absent `id`
/// produces a notification (`Request::id == None`); any validation failure
/// maps to an error whose response envelope always carries `id: null`,
/// since a malformed request cannot be trusted to carry a usable id.
pub fn validate_request(value: &Value) -> Result<Request, Error> {
    let object = value
        .as_object()
        .map_err(|_| Error::invalid_request("request must be an object"))?;

    let version = object
        .get("jsonrpc")
        .and_then(|v| v.as_str().ok())
        .ok_or_else(|| Error::invalid_request("missing \"jsonrpc\""))?;
    if version != JSONRPC_VERSION {
        return Err(Error::invalid_request("unsupported \"jsonrpc\" version"));
    }

    let method = object
        .get("method")
        .and_then(|v| v.as_str().ok())
        .ok_or_else(|| Error::invalid_request("\"method\" must be a string"))?
        .to_string();

    let params = match object.get("params") {
        None => None,
        Some(v) if v.is_object() || v.is_array() => Some(v.clone()),
        Some(_) => return Err(Error::invalid_request("\"params\" must be an object or array")),
    };

    let id = match object.get("id") {
        None => None,
        Some(v) => Some(
            RequestId::from_value(v)
                .ok_or_else(|| Error::invalid_request("\"id\" must be a string, number, or null"))?,
        ),
    };

    Ok(Request { method, params, id })
}

/// A response to a call: exactly one of `result`/`error`, per §4.6.
#[derive(Debug, Clone)]
pub enum Response {
    Success { id: RequestId, result: Value },
    Error { id: RequestId, error: Error },
}

/// Builds the JSON-RPC success envelope `{jsonrpc, result, id}`.
pub fn build_success_response(id: RequestId, result: Value, allocator: json::AllocatorHandle) -> Value {
    let mut envelope = Value::new_object(allocator.clone());
    envelope["jsonrpc"] = Value::from_str(JSONRPC_VERSION, allocator.clone());
    envelope["result"] = result;
    envelope["id"] = id.to_value(allocator);
    envelope
}

/// Builds the JSON-RPC error envelope `{jsonrpc, error: {code, message,
/// data?}, id}`.
pub fn build_error_response(id: RequestId, error: &Error, allocator: json::AllocatorHandle) -> Value {
    let mut envelope = Value::new_object(allocator.clone());
    envelope["jsonrpc"] = Value::from_str(JSONRPC_VERSION, allocator.clone());

    let mut error_obj = Value::new_object(allocator.clone());
    error_obj["code"] = Value::from_i64(error.code.as_i32() as i64, allocator.clone());
    error_obj["message"] = Value::from_str(&error.message, allocator.clone());
    if let Some(data) = &error.data {
        error_obj["data"] = data.clone();
    }
    envelope["error"] = error_obj;
    envelope["id"] = id.to_value(allocator);
    envelope
}

/// Validates a response envelope received by a client: `jsonrpc == "2.0"`,
/// exactly one of `result`/`error`, and the `id` matches `expected_id` (the
/// server may also legitimately return `null` if it couldn't parse the
/// request's id).
pub fn validate_response(value: &Value, expected_id: &RequestId) -> Result<Response, Error> {
    let object = value
        .as_object()
        .map_err(|_| Error::new(ErrorCode::InternalError, "response must be an object"))?;

    let version = object.get("jsonrpc").and_then(|v| v.as_str().ok());
    if version != Some(JSONRPC_VERSION) {
        return Err(Error::new(ErrorCode::InternalError, "missing or wrong \"jsonrpc\" version"));
    }

    let id = object
        .get("id")
        .and_then(RequestId::from_value)
        .ok_or_else(|| Error::new(ErrorCode::InternalError, "response \"id\" must be a string, number, or null"))?;
    if id != *expected_id && id != RequestId::Null {
        return Err(Error::new(ErrorCode::InternalError, "response id does not match request id"));
    }

    match (object.get("result"), object.get("error")) {
        (Some(result), None) => Ok(Response::Success {
            id,
            result: result.clone(),
        }),
        (None, Some(error_value)) => {
            let error_obj = error_value
                .as_object()
                .map_err(|_| Error::new(ErrorCode::InternalError, "\"error\" must be an object"))?;
            let code = error_obj
                .get("code")
                .and_then(|v| v.as_i64().ok())
                .ok_or_else(|| Error::new(ErrorCode::InternalError, "\"error.code\" must be a number"))?;
            let message = error_obj
                .get("message")
                .and_then(|v| v.as_str().ok())
                .unwrap_or("")
                .to_string();
            let data = error_obj.get("data").cloned();
            Ok(Response::Error {
                id,
                error: Error {
                    code: ErrorCode::from_i32(code as i32),
                    message,
                    data,
                },
            })
        }
        _ => Err(Error::new(
            ErrorCode::InternalError,
            "response must carry exactly one of \"result\"/\"error\"",
        )),
    }
}
