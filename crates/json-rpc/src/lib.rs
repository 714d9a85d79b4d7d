//! JSON-RPC 2.0 over HTTP: request/response envelopes, an error taxonomy,
//! a pipelined client, and a process-local server dispatcher.
//!
//! Batch requests are out of scope; every exchange is a single request and
//! (unless it's a notification) a single response.

pub mod client;
pub mod envelope;
pub mod error;
pub mod server;
pub mod time;

pub use envelope::{Request, RequestId, Response};
pub use error::{Error, ErrorCode};
