//! Error types surfaced by value-shape accessors and conversions.

use thiserror::Error;

/// Returned when a `Value` is asked to behave as a kind it is not.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValueError {
    #[error("value is not a string")]
    NotString,
    #[error("value is not a number")]
    NotNumber,
    #[error("value is not an object")]
    NotObject,
    #[error("value is not an array")]
    NotArray,
    #[error("value is not a bool")]
    NotBool,
    #[error("allocator exhausted")]
    AllocatorExhausted,
}
