//! Arena-backed byte string (`spec.md` §3, C2).

use std::ptr::NonNull;

use crate::allocator::AllocatorHandle;
use crate::error::ValueError;

/// A contiguous, null-terminated (for C interop) byte string allocated
/// through an [`crate::Allocator`]. No small-string optimization: every
/// construction and every append goes through the allocator.
pub struct ArenaString {
    allocator: AllocatorHandle,
    ptr: NonNull<u8>,
    len: usize,
}

fn alloc_bytes(allocator: &AllocatorHandle, bytes: &[u8]) -> Result<NonNull<u8>, ValueError> {
    let ptr = allocator.allocate(bytes.len() + 1).ok_or(ValueError::AllocatorExhausted)?;
    unsafe {
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), ptr.as_ptr(), bytes.len());
        *ptr.as_ptr().add(bytes.len()) = 0;
    }
    Ok(ptr)
}

impl ArenaString {
    /// An empty string only fails to allocate for a pool with no room even
    /// for the null terminator, as unreachable in practice as `Vec::new()`
    /// failing.
    pub fn new(allocator: AllocatorHandle) -> Self {
        Self::try_from_bytes("", allocator).expect("arena has no room for an empty string")
    }

    pub fn try_from_bytes(bytes: &str, allocator: AllocatorHandle) -> Result<Self, ValueError> {
        let ptr = alloc_bytes(&allocator, bytes.as_bytes())?;
        Ok(ArenaString {
            allocator,
            ptr,
            len: bytes.len(),
        })
    }

    pub fn allocator(&self) -> &AllocatorHandle {
        &self.allocator
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// Byte contents as UTF-8. The parser only ever writes valid UTF-8 into
    /// an `ArenaString` (see `parser.rs`'s escape handling), so this never
    /// fails for values produced by this crate; it can fail for a buffer
    /// built by hand from arbitrary bytes.
    pub fn as_str(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(self.as_bytes())
    }

    /// Reallocates to hold the concatenation of `self` and `suffix`. On
    /// allocator exhaustion, `self` is left untouched.
    pub fn push_str(&mut self, suffix: &str) -> Result<(), ValueError> {
        let mut combined = Vec::with_capacity(self.len + suffix.len());
        combined.extend_from_slice(self.as_bytes());
        combined.extend_from_slice(suffix.as_bytes());
        let new_ptr = alloc_bytes(&self.allocator, &combined)?;
        unsafe { self.allocator.deallocate(self.ptr) };
        self.ptr = new_ptr;
        self.len = combined.len();
        Ok(())
    }

    /// Re-homes this string's bytes into `allocator`, leaving the original
    /// allocator's copy untouched.
    pub fn clone_in(&self, allocator: AllocatorHandle) -> Result<ArenaString, ValueError> {
        let ptr = alloc_bytes(&allocator, self.as_bytes())?;
        Ok(ArenaString {
            allocator,
            ptr,
            len: self.len,
        })
    }
}

impl Drop for ArenaString {
    fn drop(&mut self) {
        unsafe { self.allocator.deallocate(self.ptr) };
    }
}

impl PartialEq for ArenaString {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for ArenaString {}

impl std::fmt::Debug for ArenaString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.as_str() {
            Ok(s) => write!(f, "{s:?}"),
            Err(_) => write!(f, "{:?} (non-UTF-8)", self.as_bytes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::default_allocator;

    #[test]
    fn push_str_reallocates_and_preserves_contents() {
        let mut s = ArenaString::try_from_bytes("hello", default_allocator()).unwrap();
        s.push_str(", world").unwrap();
        assert_eq!(s.as_str().unwrap(), "hello, world");
    }

    #[test]
    fn clone_in_rehomes_into_new_allocator() {
        let pool: AllocatorHandle = std::sync::Arc::new(crate::allocator::Pool::new(256));
        let s = ArenaString::try_from_bytes("rehome me", default_allocator()).unwrap();
        let cloned = s.clone_in(pool.clone()).unwrap();
        assert_eq!(cloned.as_str().unwrap(), "rehome me");
        assert!(std::sync::Arc::ptr_eq(cloned.allocator(), &pool));
    }

    #[test]
    fn clone_in_fails_cleanly_on_exhaustion() {
        let tiny: AllocatorHandle = std::sync::Arc::new(crate::allocator::Pool::new(4));
        let s = ArenaString::try_from_bytes("too long for the pool", default_allocator()).unwrap();
        assert_eq!(s.clone_in(tiny).unwrap_err(), ValueError::AllocatorExhausted);
    }
}
