//! Pluggable allocation for [`crate::Value`] and its owned children.
//!
//! Every [`Value`](crate::Value) carries a handle to the [`Allocator`] that
//! owns its children, so that copies, moves, and assignments preserve arena
//! affinity (a copy allocates through the *destination's* allocator, not the
//! source's). The default handle returned by [`default_allocator`] is backed
//! by the system allocator; [`Pool`] is a caller-owned arena for callers who
//! want all of a document's allocations to live in one contiguous region.

mod pool;
mod system;

pub use pool::Pool;
pub use system::SystemAllocator;

use std::ptr::NonNull;
use std::sync::Arc;

/// A handle to whatever allocator backs a [`Value`](crate::Value) tree.
///
/// `Arc` rather than a bare reference: the RPC client layer moves parsed
/// `Value` trees across threads (reactor thread -> executor worker -> caller),
/// so the handle has to be `Send + Sync`. Concrete allocators serialize their
/// own mutable state internally (see [`Pool`]); the `lock`/`unlock` hooks
/// below are the spec-shaped extension point for callers who share a pool
/// across allocators that need coarser external synchronization, and default
/// to doing nothing.
pub type AllocatorHandle = Arc<dyn Allocator>;

/// Allocator interface used by every owned [`Value`](crate::Value) child
/// (string bytes, array elements, object pairs).
pub trait Allocator: std::fmt::Debug + Send + Sync {
    /// Allocates at least `size` bytes, aligned to `align_of::<Value>()`.
    /// Returns `None` on exhaustion; callers must propagate the failure
    /// rather than unwind through partially built containers.
    fn allocate(&self, size: usize) -> Option<NonNull<u8>>;

    /// Releases a block previously returned by [`Allocator::allocate`] on
    /// `self`. Passing a pointer from a different allocator is undefined
    /// behavior.
    ///
    /// # Safety
    /// `ptr` must have been returned by a prior `allocate` call on this same
    /// allocator and not already deallocated.
    unsafe fn deallocate(&self, ptr: NonNull<u8>);

    /// Hook for callers who want to coordinate external access to a shared
    /// allocator. No-op by default.
    fn lock(&self) {}

    /// Counterpart to [`Allocator::lock`]. No-op by default.
    fn unlock(&self) {}
}

/// Returns the default, system-allocator-backed handle used by [`Value`]
/// constructors that don't specify one explicitly.
pub fn default_allocator() -> AllocatorHandle {
    thread_local! {
        static DEFAULT: AllocatorHandle = Arc::new(SystemAllocator::new());
    }
    DEFAULT.with(Arc::clone)
}
