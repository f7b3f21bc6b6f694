//! # Task Memory.
//!
//! Task memory is the allocator shared between callers and callees of the object runtime:
//! whoever receives a block allocated here frees it here, no matter who allocated it.
//!
//! [TaskAllocator] is the trait for allocator implementations, and it's not safe.
//! Use [LockedTaskAllocator] around an implementation, and name a statically designated
//! instance through [TaskMemory] when a type has to free blocks on its own.

#![cfg_attr(not(test), no_std)]
extern crate alloc;

mod heap;
pub use heap::HeapTaskAllocator;

use core::ptr::{self, NonNull};
use spin::{Mutex, MutexGuard};

// region: TaskAllocator traits

/// Trait for task memory allocators that is **not promised to be safe.**
pub trait TaskAllocator: Send {
    /// Allocate a block of at least `size` bytes.
    /// The function is **unsafe** because unfreed blocks lead to memory leaks.
    unsafe fn alloc(&mut self, size: usize) -> Option<NonNull<u8>>;

    /// Return a block to the allocator.
    /// **The block must have been allocated by this allocator and not freed yet.**
    unsafe fn free(&mut self, ptr: NonNull<u8>);

    /// Resize a block, moving it if needed. `None` allocates a new block; a zero `size` frees
    /// the block and returns `None`. On failure the original block is untouched.
    unsafe fn realloc(&mut self, ptr: Option<NonNull<u8>>, size: usize) -> Option<NonNull<u8>>;

    /// Whether `ptr` is the start of a live block handed out by this allocator.
    fn did_alloc(&self, ptr: *const u8) -> bool;

    /// Requested size of a live block.
    fn size_of(&self, ptr: *const u8) -> Option<usize>;

    /// Number of live blocks.
    fn allocated(&self) -> usize;
}

/// Thread-safe wrapper around a [TaskAllocator].
///
/// For unsafe operations, use [LockedTaskAllocator::lock] to get a mutex guard to the internal allocator.
pub struct LockedTaskAllocator<TAlloc: TaskAllocator> {
    alloc: Mutex<TAlloc>,
}

impl<TAlloc: TaskAllocator> LockedTaskAllocator<TAlloc> {
    /// Create a new locked allocator.
    #[inline(always)]
    pub const fn new(alloc: TAlloc) -> LockedTaskAllocator<TAlloc> {
        LockedTaskAllocator {
            alloc: Mutex::new(alloc),
        }
    }

    /// Manually acquire the internal lock and get a guard to the allocator.
    #[inline(always)]
    pub fn lock(&self) -> MutexGuard<'_, TAlloc> {
        self.alloc.lock()
    }

    /// Allocate a block. The caller becomes responsible for freeing it.
    #[inline(always)]
    pub fn alloc(&self, size: usize) -> Option<NonNull<u8>> {
        unsafe { self.lock().alloc(size) }
    }

    /// Free a block allocated by this allocator. Null is ignored.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a live block of this allocator, and must not be used afterwards.
    #[inline(always)]
    pub unsafe fn free(&self, ptr: *mut u8) {
        if let Some(ptr) = NonNull::new(ptr) {
            unsafe { self.lock().free(ptr) }
        }
    }

    /// # Safety
    ///
    /// Same contract as [TaskAllocator::realloc]; `ptr` may be null.
    #[inline(always)]
    pub unsafe fn realloc(&self, ptr: *mut u8, size: usize) -> Option<NonNull<u8>> {
        unsafe { self.lock().realloc(NonNull::new(ptr), size) }
    }

    #[inline(always)]
    pub fn did_alloc(&self, ptr: *const u8) -> bool {
        self.lock().did_alloc(ptr)
    }
}

/// A statically designated task memory allocator.
///
/// Types that free blocks on their own take a [TaskMemory] as a type parameter, so the
/// allocator a block goes back to is fixed at compile time.
pub trait TaskMemory {
    type Allocator: TaskAllocator + 'static;

    fn allocator() -> &'static LockedTaskAllocator<Self::Allocator>;

    #[inline(always)]
    fn alloc(size: usize) -> Option<NonNull<u8>> {
        Self::allocator().alloc(size)
    }

    /// # Safety
    ///
    /// `ptr` must be null or a live block of this allocator.
    #[inline(always)]
    unsafe fn free(ptr: *mut u8) {
        unsafe { Self::allocator().free(ptr) }
    }

    #[inline(always)]
    fn did_alloc(ptr: *const u8) -> bool {
        Self::allocator().did_alloc(ptr)
    }
}

// endregion

// region: Allocator

/// Default [TaskAllocator].
pub type DefaultTaskAllocator = HeapTaskAllocator;

/// Global allocator instance.
pub static TASK_ALLOC: LockedTaskAllocator<DefaultTaskAllocator> =
    LockedTaskAllocator::new(DefaultTaskAllocator::new());

/// The process-wide task memory, backed by [TASK_ALLOC].
#[derive(Debug, Clone, Copy, Default)]
pub struct SharedTaskMemory;

impl TaskMemory for SharedTaskMemory {
    type Allocator = DefaultTaskAllocator;

    #[inline(always)]
    fn allocator() -> &'static LockedTaskAllocator<DefaultTaskAllocator> {
        &TASK_ALLOC
    }
}

/// Allocate from [TASK_ALLOC]; null on failure.
pub fn task_mem_alloc(size: usize) -> *mut u8 {
    match TASK_ALLOC.alloc(size) {
        Some(ptr) => ptr.as_ptr(),
        None => ptr::null_mut(),
    }
}

/// Resize a block of [TASK_ALLOC]; null on failure or when `size` is zero.
///
/// # Safety
///
/// `ptr` must be null or a live block of [TASK_ALLOC].
pub unsafe fn task_mem_realloc(ptr: *mut u8, size: usize) -> *mut u8 {
    match unsafe { TASK_ALLOC.realloc(ptr, size) } {
        Some(ptr) => ptr.as_ptr(),
        None => ptr::null_mut(),
    }
}

/// Free a block of [TASK_ALLOC]. Null is ignored.
///
/// # Safety
///
/// `ptr` must be null or a live block of [TASK_ALLOC], and must not be used afterwards.
pub unsafe fn task_mem_free(ptr: *mut u8) {
    unsafe { TASK_ALLOC.free(ptr) }
}

pub fn did_alloc(ptr: *const u8) -> bool {
    TASK_ALLOC.did_alloc(ptr)
}

// endregion

#[cfg(test)]
mod tests {
    use super::*;

    static PRIVATE: LockedTaskAllocator<HeapTaskAllocator> =
        LockedTaskAllocator::new(HeapTaskAllocator::new());

    struct PrivateMemory;

    impl TaskMemory for PrivateMemory {
        type Allocator = HeapTaskAllocator;

        fn allocator() -> &'static LockedTaskAllocator<HeapTaskAllocator> {
            &PRIVATE
        }
    }

    #[test]
    fn designated_memory_tracks_blocks() {
        let block = PrivateMemory::alloc(10).unwrap();
        assert!(PrivateMemory::did_alloc(block.as_ptr()));
        assert!(!SharedTaskMemory::did_alloc(block.as_ptr()));
        unsafe { PrivateMemory::free(block.as_ptr()) };
        assert!(!PrivateMemory::did_alloc(block.as_ptr()));
    }

    #[test]
    fn global_functions_round_trip() {
        let ptr = task_mem_alloc(32);
        assert!(!ptr.is_null());
        assert!(did_alloc(ptr));
        let grown = unsafe { task_mem_realloc(ptr, 64) };
        assert!(!grown.is_null());
        assert!(did_alloc(grown));
        unsafe { task_mem_free(grown) };
    }

    #[test]
    fn free_null_is_ignored() {
        unsafe { task_mem_free(ptr::null_mut()) };
    }
}
