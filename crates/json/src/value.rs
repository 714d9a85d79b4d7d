//! The tagged-sum JSON value (`spec.md` §4.2, C2).

use std::ops::{Index, IndexMut};
use std::sync::Arc;

use crate::allocator::AllocatorHandle;
use crate::array::Array;
use crate::error::ValueError;
use crate::number::Number;
use crate::object::Object;
use crate::string::ArenaString;

/// The discriminant of a [`Value`], with no payload attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

/// A JSON value. Every variant carries the [`AllocatorHandle`] its payload
/// (if any) is homed in, including the scalar variants, so that a `Value`
/// always knows where it would allocate if it were mutated into a
/// container.
#[derive(Debug)]
pub enum Value {
    Null(AllocatorHandle),
    Bool(bool, AllocatorHandle),
    Number(Number, AllocatorHandle),
    String(ArenaString),
    Array(Array),
    Object(Object),
}

impl Value {
    pub fn null(allocator: AllocatorHandle) -> Self {
        Value::Null(allocator)
    }

    pub fn from_bool(value: bool, allocator: AllocatorHandle) -> Self {
        Value::Bool(value, allocator)
    }

    pub fn from_number(value: Number, allocator: AllocatorHandle) -> Self {
        Value::Number(value, allocator)
    }

    pub fn from_i64(value: i64, allocator: AllocatorHandle) -> Self {
        Value::Number(Number::from(value), allocator)
    }

    pub fn from_u64(value: u64, allocator: AllocatorHandle) -> Self {
        Value::Number(Number::from(value), allocator)
    }

    pub fn from_f64(value: f64, allocator: AllocatorHandle) -> Self {
        Value::Number(Number::from(value), allocator)
    }

    /// Falls back to `Value::Null` on allocator exhaustion (`spec.md` §4.2:
    /// "allocator exhaustion during mutation leaves the Value in a valid
    /// Null state"), the same contract `clone_with` below upholds.
    pub fn from_str(value: &str, allocator: AllocatorHandle) -> Self {
        match ArenaString::try_from_bytes(value, allocator.clone()) {
            Ok(s) => Value::String(s),
            Err(_) => Value::Null(allocator),
        }
    }

    pub fn new_array(allocator: AllocatorHandle) -> Self {
        Value::Array(Array::new(allocator))
    }

    pub fn new_object(allocator: AllocatorHandle) -> Self {
        Value::Object(Object::new(allocator))
    }

    pub fn kind(&self) -> Kind {
        match self {
            Value::Null(_) => Kind::Null,
            Value::Bool(..) => Kind::Bool,
            Value::Number(..) => Kind::Number,
            Value::String(_) => Kind::String,
            Value::Array(_) => Kind::Array,
            Value::Object(_) => Kind::Object,
        }
    }

    pub fn is_null(&self) -> bool {
        self.kind() == Kind::Null
    }

    pub fn is_bool(&self) -> bool {
        self.kind() == Kind::Bool
    }

    pub fn is_number(&self) -> bool {
        self.kind() == Kind::Number
    }

    pub fn is_string(&self) -> bool {
        self.kind() == Kind::String
    }

    pub fn is_array(&self) -> bool {
        self.kind() == Kind::Array
    }

    pub fn is_object(&self) -> bool {
        self.kind() == Kind::Object
    }

    pub fn allocator(&self) -> &AllocatorHandle {
        match self {
            Value::Null(a) => a,
            Value::Bool(_, a) => a,
            Value::Number(_, a) => a,
            Value::String(s) => s.allocator(),
            Value::Array(a) => a.allocator(),
            Value::Object(o) => o.allocator(),
        }
    }

    pub fn as_bool(&self) -> Result<bool, ValueError> {
        match self {
            Value::Bool(v, _) => Ok(*v),
            _ => Err(ValueError::NotBool),
        }
    }

    pub fn as_number(&self) -> Result<Number, ValueError> {
        match self {
            Value::Number(n, _) => Ok(*n),
            _ => Err(ValueError::NotNumber),
        }
    }

    pub fn as_i64(&self) -> Result<i64, ValueError> {
        self.as_number().map(|n| n.to_i64())
    }

    pub fn as_u64(&self) -> Result<u64, ValueError> {
        self.as_number().map(|n| n.to_u64())
    }

    pub fn as_f64(&self) -> Result<f64, ValueError> {
        self.as_number().map(|n| n.to_f64())
    }

    pub fn as_str(&self) -> Result<&str, ValueError> {
        match self {
            Value::String(s) => s.as_str().map_err(|_| ValueError::NotString),
            _ => Err(ValueError::NotString),
        }
    }

    pub fn as_array(&self) -> Result<&Array, ValueError> {
        match self {
            Value::Array(a) => Ok(a),
            _ => Err(ValueError::NotArray),
        }
    }

    pub fn as_array_mut(&mut self) -> Result<&mut Array, ValueError> {
        match self {
            Value::Array(a) => Ok(a),
            _ => Err(ValueError::NotArray),
        }
    }

    pub fn as_object(&self) -> Result<&Object, ValueError> {
        match self {
            Value::Object(o) => Ok(o),
            _ => Err(ValueError::NotObject),
        }
    }

    pub fn as_object_mut(&mut self) -> Result<&mut Object, ValueError> {
        match self {
            Value::Object(o) => Ok(o),
            _ => Err(ValueError::NotObject),
        }
    }

    /// Deep-clones the whole tree, homing every allocation (this value's own
    /// and every descendant's) in `allocator` rather than wherever each piece
    /// currently lives. This is the Rust stand-in for the original's
    /// "assignment copies through the destination's allocator" rule, which
    /// relies on an overloaded assignment operator that Rust doesn't have.
    pub fn clone_with(&self, allocator: AllocatorHandle) -> Value {
        match self {
            Value::Null(_) => Value::Null(allocator),
            Value::Bool(v, _) => Value::Bool(*v, allocator),
            Value::Number(n, _) => Value::Number(*n, allocator),
            // On exhaustion, falls back to `Null` in the destination
            // allocator rather than panicking (`spec.md` §4.2).
            Value::String(s) => match s.clone_in(allocator.clone()) {
                Ok(cloned) => Value::String(cloned),
                Err(_) => Value::Null(allocator),
            },
            Value::Array(arr) => {
                let mut out = Array::new(allocator);
                for item in arr.iter() {
                    let cloned = item.clone_with(out.allocator().clone());
                    if out.push(cloned).is_err() {
                        break;
                    }
                }
                Value::Array(out)
            }
            Value::Object(obj) => {
                let mut out = Object::new(allocator);
                for (key, val) in obj.iter() {
                    let Ok(key) = key.clone_in(out.allocator().clone()) else {
                        break;
                    };
                    let val = val.clone_with(out.allocator().clone());
                    if out.insert(key, val).is_err() {
                        break;
                    }
                }
                Value::Object(out)
            }
        }
    }

    /// Used by container insertion (`Array::push`, `Object::insert`) to
    /// enforce arena affinity: a value already homed in `target` moves in
    /// untouched, otherwise the whole tree is deep-cloned into `target`.
    pub(crate) fn rehomed_for(self, target: &AllocatorHandle) -> Value {
        if Arc::ptr_eq(self.allocator(), target) {
            self
        } else {
            self.clone_with(target.clone())
        }
    }

    /// Overwrites `self` with `other`, re-homing `other`'s tree into `self`'s
    /// current allocator first — the destination-allocator-preserving
    /// assignment the original expresses via `operator=`.
    pub fn assign_from(&mut self, other: Value) {
        let target = self.allocator().clone();
        *self = other.rehomed_for(&target);
    }
}

impl Clone for Value {
    /// Deep-clones using this value's *own* current allocator. Use
    /// [`Value::clone_with`] to rehome into a different allocator.
    fn clone(&self) -> Value {
        self.clone_with(self.allocator().clone())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null(_), Value::Null(_)) => true,
            (Value::Bool(a, _), Value::Bool(b, _)) => a == b,
            (Value::Number(a, _), Value::Number(b, _)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
            }
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len() && a.iter().all(|(k, v)| {
                    b.get(k.as_str().unwrap_or_default()) == Some(v)
                })
            }
            _ => false,
        }
    }
}

/// Const-style object/array indexing; panics on a missing key or
/// out-of-bounds index, or if `self` isn't the matching container kind.
impl Index<&str> for Value {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        self.as_object()
            .unwrap_or_else(|e| panic!("{e}"))
            .get(key)
            .unwrap_or_else(|| panic!("no such key: {key:?}"))
    }
}

/// Auto-vivifying: a `Null` value turns into an empty object on first
/// mutable indexing, and an absent key is inserted holding `Null`.
impl IndexMut<&str> for Value {
    fn index_mut(&mut self, key: &str) -> &mut Value {
        if self.is_null() {
            let allocator = self.allocator().clone();
            *self = Value::new_object(allocator);
        }
        self.as_object_mut()
            .unwrap_or_else(|e| panic!("{e}"))
            .get_or_insert(key)
            .unwrap_or_else(|e| panic!("{e}"))
    }
}

impl Index<usize> for Value {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        &self.as_array().unwrap_or_else(|e| panic!("{e}"))[index]
    }
}

impl IndexMut<usize> for Value {
    fn index_mut(&mut self, index: usize) -> &mut Value {
        self.as_array_mut().unwrap_or_else(|e| panic!("{e}")).index_mut(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::{default_allocator, Pool};

    #[test]
    fn clone_with_rehomes_nested_tree() {
        let src = default_allocator();
        let mut arr = Value::new_array(src.clone());
        arr.as_array_mut().unwrap().push(Value::from_i64(7, src.clone())).unwrap();

        let dest: AllocatorHandle = Arc::new(Pool::new(512));
        let moved = arr.clone_with(dest.clone());
        assert!(Arc::ptr_eq(moved.allocator(), &dest));
        let inner = moved.as_array().unwrap().get(0).unwrap();
        assert!(Arc::ptr_eq(inner.allocator(), &dest));
        assert_eq!(inner.as_i64().unwrap(), 7);
    }

    #[test]
    fn index_mut_auto_vivifies_null_into_object() {
        let mut v = Value::null(default_allocator());
        v["key"] = Value::from_bool(true, default_allocator());
        assert!(v.is_object());
        assert_eq!(v["key"].as_bool().unwrap(), true);
    }

    #[test]
    fn equality_is_structural_and_ignores_allocator_identity() {
        let a = Value::from_i64(3, default_allocator());
        let pool: AllocatorHandle = Arc::new(Pool::new(64));
        let b = Value::from_i64(3, pool);
        assert_eq!(a, b);
    }

    #[test]
    fn cross_kind_comparison_is_never_equal() {
        let a = Value::null(default_allocator());
        let b = Value::from_bool(false, default_allocator());
        assert_ne!(a, b);
    }
}
