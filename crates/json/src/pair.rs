//! A single object member: a key and its value (`spec.md` §4.2, C2).

use crate::{ArenaString, Value};

#[derive(Debug)]
pub struct Pair {
    pub(crate) key: ArenaString,
    pub(crate) value: Value,
}

impl Pair {
    pub fn new(key: ArenaString, value: Value) -> Self {
        Pair { key, value }
    }

    pub fn key(&self) -> &ArenaString {
        &self.key
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut Value {
        &mut self.value
    }
}
