//! A JSON value library with pluggable, arena-capable allocation.
//!
//! [`Value`] is a tagged union over null, bool, number, string, array, and
//! object, each carrying a handle to the [`Allocator`] its children (if any)
//! are homed in. The default [`allocator::default_allocator`] is backed by
//! the system allocator; [`allocator::Pool`] is a caller-sized arena for
//! callers who want an entire parsed document to live in one contiguous
//! region and be freed in one shot.
//!
//! ```
//! use json::{parse, Value};
//!
//! let value = parse(r#"{"answer": 42}"#, Default::default()).unwrap();
//! assert_eq!(value["answer"].as_i64().unwrap(), 42);
//! ```
//!
//! This crate implements its own arena and arena-backed containers, which
//! requires `unsafe` at the pointer-arithmetic layer (`allocator::pool`,
//! `arena_vec`); everything built on top of those primitives is safe.

pub mod allocator;
mod arena_vec;
mod array;
mod error;
mod number;
mod object;
mod pair;
mod parser;
mod serializer;
mod string;
mod value;

pub use allocator::{Allocator, AllocatorHandle};
pub use array::Array;
pub use error::ValueError;
pub use number::Number;
pub use object::Object;
pub use pair::Pair;
pub use parser::{parse, ParseOptions, ParserError, ParserErrorCode};
pub use serializer::{to_string_compact, to_string_pretty, PrettyOptions};
pub use string::ArenaString;
pub use value::{Kind, Value};
