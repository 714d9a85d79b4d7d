//! Internal contiguous, arena-backed vector shared by [`crate::Array`] and
//! [`crate::Object`]. Growth always allocates an exact-sized block for the
//! new length (the spec calls for "push/pop re-allocates" on `Array` and
//! "grows the array by one" on `Object`'s inserts) — no amortized doubling.

use std::mem::size_of;
use std::ptr::NonNull;

use crate::allocator::AllocatorHandle;

pub(crate) struct ArenaVec<T> {
    allocator: AllocatorHandle,
    ptr: Option<NonNull<T>>,
    len: usize,
}

impl<T> ArenaVec<T> {
    pub(crate) fn new(allocator: AllocatorHandle) -> Self {
        ArenaVec {
            allocator,
            ptr: None,
            len: 0,
        }
    }

    pub(crate) fn allocator(&self) -> &AllocatorHandle {
        &self.allocator
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn as_slice(&self) -> &[T] {
        match self.ptr {
            Some(p) => unsafe { std::slice::from_raw_parts(p.as_ptr(), self.len) },
            None => &[],
        }
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
        match self.ptr {
            Some(p) => unsafe { std::slice::from_raw_parts_mut(p.as_ptr(), self.len) },
            None => &mut [],
        }
    }

    pub(crate) fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.as_mut_slice().get_mut(index)
    }

    /// Reallocates to `len + 1` elements and appends `value`. On allocator
    /// exhaustion, `value` is handed back untouched and `self` is
    /// unchanged.
    pub(crate) fn try_push(&mut self, value: T) -> Result<(), T> {
        let new_len = self.len + 1;
        let Some(new_bytes) = new_len.checked_mul(size_of::<T>()) else {
            return Err(value);
        };
        let Some(new_ptr) = self.allocator.allocate(new_bytes) else {
            return Err(value);
        };
        let new_ptr = new_ptr.cast::<T>();

        unsafe {
            if let Some(old) = self.ptr {
                std::ptr::copy_nonoverlapping(old.as_ptr(), new_ptr.as_ptr(), self.len);
                self.allocator.deallocate(old.cast());
            }
            new_ptr.as_ptr().add(self.len).write(value);
        }

        self.ptr = Some(new_ptr);
        self.len = new_len;
        Ok(())
    }

    pub(crate) fn pop(&mut self) -> Option<T> {
        let old_ptr = self.ptr?;
        let new_len = self.len - 1;
        let value = unsafe { old_ptr.as_ptr().add(new_len).read() };

        if new_len == 0 {
            unsafe { self.allocator.deallocate(old_ptr.cast()) };
            self.ptr = None;
        } else {
            let new_bytes = new_len * size_of::<T>();
            match self.allocator.allocate(new_bytes) {
                Some(new_ptr) => {
                    let new_ptr = new_ptr.cast::<T>();
                    unsafe {
                        std::ptr::copy_nonoverlapping(old_ptr.as_ptr(), new_ptr.as_ptr(), new_len);
                        self.allocator.deallocate(old_ptr.cast());
                    }
                    self.ptr = Some(new_ptr);
                }
                None => {
                    // Shrinking allocation failed; keep the larger buffer
                    // around (only the logical length drops) rather than
                    // lose `value`'s former neighbours.
                    self.ptr = Some(old_ptr);
                }
            }
        }

        self.len = new_len;
        Some(value)
    }

    pub(crate) fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }
}

impl<T> Drop for ArenaVec<T> {
    fn drop(&mut self) {
        if let Some(p) = self.ptr {
            unsafe {
                for i in 0..self.len {
                    std::ptr::drop_in_place(p.as_ptr().add(i));
                }
                self.allocator.deallocate(p.cast());
            }
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ArenaVec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}
