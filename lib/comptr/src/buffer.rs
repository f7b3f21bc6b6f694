//! Owning handle for task memory blocks.

use crate::ComError;
use core::{
    fmt::{Debug, Formatter},
    marker::PhantomData,
    ptr,
};
use log::trace;
use taskmem::{SharedTaskMemory, TaskMemory};

/// Owner of one block allocated from the task memory `A`.
///
/// The block goes back to `A` exactly once, when the buffer is dropped. `T` is the element
/// type the block is read as, e.g. `u8` for a NUL-terminated string.
#[repr(transparent)]
pub struct TaskBuffer<T, A: TaskMemory = SharedTaskMemory> {
    raw: *mut T,
    _alloc: PhantomData<A>,
}

impl<T, A: TaskMemory> TaskBuffer<T, A> {
    /// Create an empty buffer.
    #[inline(always)]
    pub const fn new() -> TaskBuffer<T, A> {
        TaskBuffer {
            raw: ptr::null_mut(),
            _alloc: PhantomData,
        }
    }

    /// Take ownership of a block. Null gives an empty buffer.
    ///
    /// # Safety
    ///
    /// `raw` must be null or the start of a live block of `A` that nobody else frees.
    #[inline(always)]
    pub unsafe fn from_raw(raw: *mut T) -> TaskBuffer<T, A> {
        TaskBuffer {
            raw,
            _alloc: PhantomData,
        }
    }

    /// The block, possibly null, for APIs that only read it. Ownership stays with the buffer.
    #[inline(always)]
    pub fn as_ptr(&self) -> *mut T {
        self.raw
    }

    #[inline(always)]
    pub fn is_null(&self) -> bool {
        self.raw.is_null()
    }

    /// The storage slot, for an API that allocates a block from `A` and writes it there.
    ///
    /// Only an empty buffer hands out its slot. The pointer is valid until the buffer is
    /// moved or dropped.
    pub fn out_slot(&mut self) -> Result<*mut *mut T, ComError> {
        if !self.raw.is_null() {
            return Err(ComError::OCCUPIED_BUFFER);
        }
        Ok(&mut self.raw as *mut *mut T)
    }
}

impl<T, A: TaskMemory> Drop for TaskBuffer<T, A> {
    fn drop(&mut self) {
        if !self.raw.is_null() {
            let raw = core::mem::replace(&mut self.raw, ptr::null_mut());
            unsafe { A::free(raw.cast()) };
            trace!("TaskBuffer: freed {:p}", raw);
        }
    }
}

impl<T, A: TaskMemory> Default for TaskBuffer<T, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A: TaskMemory> Debug for TaskBuffer<T, A> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        if self.raw.is_null() {
            f.write_str("TaskBuffer(empty)")
        } else {
            f.write_fmt(format_args!("TaskBuffer({:p})", self.raw))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ComPtr,
        fixture::{self, CLSID_LINK, ILink},
    };
    use core::ffi::CStr;
    use objrt::S_OK;
    use taskmem::{HeapTaskAllocator, LockedTaskAllocator, task_mem_alloc};

    static PRIVATE: LockedTaskAllocator<HeapTaskAllocator> =
        LockedTaskAllocator::new(HeapTaskAllocator::new());

    /// Task memory no other test allocates from.
    struct PrivateMemory;

    impl TaskMemory for PrivateMemory {
        type Allocator = HeapTaskAllocator;

        fn allocator() -> &'static LockedTaskAllocator<HeapTaskAllocator> {
            &PRIVATE
        }
    }

    fn private_block(size: usize) -> *mut u8 {
        PrivateMemory::alloc(size).unwrap().as_ptr()
    }

    #[test]
    fn constructor_empty() {
        let buffer = TaskBuffer::<u8>::new();
        assert!(buffer.as_ptr().is_null());
        assert!(buffer.is_null());
        assert!(TaskBuffer::<u8>::default().is_null());
    }

    #[test]
    fn constructor_take_ownership() {
        let raw = task_mem_alloc(10);
        unsafe { ptr::copy_nonoverlapping(b"test\0".as_ptr(), raw, 5) };

        let buffer = unsafe { TaskBuffer::<u8>::from_raw(raw) };
        assert!(!buffer.is_null());
        assert_eq!(buffer.as_ptr(), raw);
        let text = unsafe { CStr::from_ptr(buffer.as_ptr().cast()) };
        assert_eq!(text.to_bytes(), b"test");
    }

    #[test]
    fn drop_frees_valid() {
        let raw = private_block(10);
        assert!(PrivateMemory::did_alloc(raw));
        {
            let _buffer = unsafe { TaskBuffer::<u8, PrivateMemory>::from_raw(raw) };
            assert!(PrivateMemory::did_alloc(raw));
        }
        assert!(!PrivateMemory::did_alloc(raw));
    }

    #[test]
    fn drop_frees_once_after_move() {
        let raw = private_block(10);
        let mut first = unsafe { TaskBuffer::<u8, PrivateMemory>::from_raw(raw) };
        let second = core::mem::take(&mut first);
        assert!(first.is_null());
        drop(first);
        assert!(PrivateMemory::did_alloc(raw));
        drop(second);
        assert!(!PrivateMemory::did_alloc(raw));
    }

    #[test]
    fn out_slot_empty_succeeds() {
        let raw = private_block(10);

        let mut buffer = TaskBuffer::<u8, PrivateMemory>::new();
        let address = buffer.out_slot().unwrap();
        assert!(!address.is_null());
        assert!(unsafe { *address }.is_null());

        unsafe { *address = raw };
        assert_eq!(buffer.as_ptr(), raw);
        drop(buffer);
        assert!(!PrivateMemory::did_alloc(raw));
    }

    #[test]
    fn out_slot_occupied_fails() {
        let raw = private_block(10);
        let mut buffer = unsafe { TaskBuffer::<u8, PrivateMemory>::from_raw(raw) };
        assert_eq!(
            buffer.out_slot().unwrap_err(),
            ComError::InvalidOperation("address requested on non-empty buffer")
        );
        assert_eq!(buffer.as_ptr(), raw);
        assert!(PrivateMemory::did_alloc(raw));
    }

    #[test]
    fn out_slot_receives_callee_allocation() {
        fixture::register();
        let link = ComPtr::<ILink>::create(&CLSID_LINK).unwrap();
        let link = link.try_deref().unwrap();
        assert_eq!(link.set_path("/usr/bin/editor"), S_OK);

        let mut path = TaskBuffer::<u8>::new();
        assert_eq!(unsafe { link.get_path(path.out_slot().unwrap()) }, S_OK);
        assert!(!path.is_null());
        assert!(taskmem::did_alloc(path.as_ptr()));
        let text = unsafe { CStr::from_ptr(path.as_ptr().cast()) };
        assert_eq!(text.to_str().unwrap(), "/usr/bin/editor");
    }
}
