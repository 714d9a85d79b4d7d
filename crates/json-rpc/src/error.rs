//! The JSON-RPC error taxonomy (`spec.md` §4.6, C6).

use json::Value;

/// Standard and server-reserved JSON-RPC error codes.
///
/// `Ok` is not part of the JSON-RPC 2.0 wire spec; it's this crate's
/// sentinel for "no error", used where a code is threaded through internal
/// plumbing before a response either carries `result` or `error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Ok,
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    /// A server-defined code in the reserved `-32000..=-32099` range.
    ServerError(i32),
    /// Any other code a peer sent us that we don't have a named variant for.
    Other(i32),
}

impl ErrorCode {
    pub fn as_i32(self) -> i32 {
        match self {
            ErrorCode::Ok => 0,
            ErrorCode::ParseError => -32700,
            ErrorCode::InvalidRequest => -32600,
            ErrorCode::MethodNotFound => -32601,
            ErrorCode::InvalidParams => -32602,
            ErrorCode::InternalError => -32603,
            ErrorCode::ServerError(code) => code,
            ErrorCode::Other(code) => code,
        }
    }

    pub fn from_i32(code: i32) -> ErrorCode {
        match code {
            0 => ErrorCode::Ok,
            -32700 => ErrorCode::ParseError,
            -32600 => ErrorCode::InvalidRequest,
            -32601 => ErrorCode::MethodNotFound,
            -32602 => ErrorCode::InvalidParams,
            -32603 => ErrorCode::InternalError,
            -32099..=-32000 => ErrorCode::ServerError(code),
            other => ErrorCode::Other(other),
        }
    }
}

/// A wire-visible JSON-RPC error: `{code, message, data?}`.
#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub data: Option<Value>,
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Error {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Error::new(ErrorCode::ParseError, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Error::new(ErrorCode::InvalidRequest, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Error::new(ErrorCode::MethodNotFound, format!("method not found: {method}"))
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Error::new(ErrorCode::InvalidParams, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Error::new(ErrorCode::InternalError, message)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rpc error {}: {}", self.code.as_i32(), self.message)
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_reserved_range_round_trips() {
        let code = ErrorCode::from_i32(-32050);
        assert_eq!(code, ErrorCode::ServerError(-32050));
        assert_eq!(code.as_i32(), -32050);
    }

    #[test]
    fn standard_codes_round_trip() {
        for code in [
            ErrorCode::Ok,
            ErrorCode::ParseError,
            ErrorCode::InvalidRequest,
            ErrorCode::MethodNotFound,
            ErrorCode::InvalidParams,
            ErrorCode::InternalError,
        ] {
            assert_eq!(ErrorCode::from_i32(code.as_i32()), code);
        }
    }
}
