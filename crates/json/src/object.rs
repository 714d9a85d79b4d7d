//! JSON object: insertion-ordered key/value pairs (`spec.md` §4.2, C2).
//!
//! Lookup is a linear tail-to-head scan so a duplicate key resolves to its
//! *last* inserted value, matching the parser's last-write-wins behaviour
//! for repeated keys in a single object literal.

use std::ops::{Index, IndexMut};

use crate::allocator::AllocatorHandle;
use crate::arena_vec::ArenaVec;
use crate::error::ValueError;
use crate::pair::Pair;
use crate::value::Value;
use crate::ArenaString;

#[derive(Debug)]
pub struct Object {
    pairs: ArenaVec<Pair>,
}

impl Object {
    pub fn new(allocator: AllocatorHandle) -> Self {
        Object {
            pairs: ArenaVec::new(allocator),
        }
    }

    pub fn allocator(&self) -> &AllocatorHandle {
        self.pairs.allocator()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.len() == 0
    }

    fn rfind(&self, key: &str) -> Option<usize> {
        self.pairs
            .as_slice()
            .iter()
            .enumerate()
            .rev()
            .find(|(_, pair)| pair.key().as_bytes() == key.as_bytes())
            .map(|(i, _)| i)
    }

    /// Non-vivifying lookup: absent keys return `None`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.rfind(key).map(|i| self.pairs.get(i).unwrap().value())
    }

    /// Non-vivifying mutable lookup: absent keys return `None`.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        let idx = self.rfind(key)?;
        Some(self.pairs.get_mut(idx).unwrap().value_mut())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.rfind(key).is_some()
    }

    /// Appends a new pair, growing the backing storage by exactly one slot.
    /// Does not deduplicate: an existing key is shadowed, not replaced,
    /// since lookup always resolves to the last match. On allocator
    /// exhaustion the object is left unchanged.
    pub fn insert(&mut self, key: ArenaString, value: Value) -> Result<(), ValueError> {
        let value = value.rehomed_for(self.allocator());
        self.pairs
            .try_push(Pair::new(key, value))
            .map_err(|_| ValueError::AllocatorExhausted)
    }

    /// Mutable access that auto-vivifies: an absent key is inserted holding
    /// `Value::Null` before returning the new slot.
    pub fn get_or_insert(&mut self, key: &str) -> Result<&mut Value, ValueError> {
        if let Some(idx) = self.rfind(key) {
            return Ok(self.pairs.get_mut(idx).unwrap().value_mut());
        }
        let allocator = self.allocator().clone();
        let new_key = ArenaString::try_from_bytes(key, allocator.clone())?;
        self.insert(new_key, Value::null(allocator))?;
        let idx = self.pairs.len() - 1;
        Ok(self.pairs.get_mut(idx).unwrap().value_mut())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ArenaString, &Value)> {
        self.pairs.iter().map(|p| (p.key(), p.value()))
    }
}

/// Const-style lookup; panics on a missing key. The original library's
/// `operator[] const` instead returns a shared null sentinel on miss (see
/// `DESIGN.md`) — not reproducible here without a `Value` that exists
/// independent of any allocator, so a miss panics instead, matching how
/// `Index` already behaves for `Vec`/`str` elsewhere in std. Prefer
/// [`Object::get`] when absence is expected and a panic is unwanted.
impl Index<&str> for Object {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        self.get(key).unwrap_or_else(|| panic!("no such key: {key:?}"))
    }
}

/// Auto-vivifying mutable indexing: an absent key is created holding `Null`.
impl IndexMut<&str> for Object {
    fn index_mut(&mut self, key: &str) -> &mut Value {
        self.get_or_insert(key).unwrap_or_else(|e| panic!("{e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::default_allocator;

    #[test]
    fn duplicate_key_resolves_to_last_insert() {
        let mut obj = Object::new(default_allocator());
        obj.insert(ArenaString::try_from_bytes("a", default_allocator()).unwrap(), Value::from_i64(1, default_allocator())).unwrap();
        obj.insert(ArenaString::try_from_bytes("a", default_allocator()).unwrap(), Value::from_i64(2, default_allocator())).unwrap();
        assert_eq!(obj.get("a").unwrap().as_i64().unwrap(), 2);
        assert_eq!(obj.len(), 2, "duplicate keys are not deduplicated, only shadowed");
    }

    #[test]
    fn insert_reports_allocator_exhaustion() {
        let mut obj = Object::new(std::sync::Arc::new(crate::allocator::Pool::new(4)));
        let err = obj
            .insert(ArenaString::try_from_bytes("a", default_allocator()).unwrap(), Value::from_i64(1, default_allocator()))
            .unwrap_err();
        assert_eq!(err, crate::error::ValueError::AllocatorExhausted);
        assert_eq!(obj.len(), 0, "a failed insert leaves the object unchanged");
    }

    #[test]
    fn index_mut_auto_vivifies_missing_key() {
        let mut obj = Object::new(default_allocator());
        assert!(obj.get("x").is_none());
        obj["x"] = Value::from_i64(42, default_allocator());
        assert_eq!(obj.get("x").unwrap().as_i64().unwrap(), 42);
    }

    #[test]
    fn get_does_not_vivify() {
        let obj = Object::new(default_allocator());
        assert!(obj.get("missing").is_none());
        assert_eq!(obj.len(), 0);
    }
}
