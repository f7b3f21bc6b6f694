use crate::TaskAllocator;
use alloc::{
    alloc::{Layout, alloc, dealloc},
    collections::BTreeMap,
};
use config::{TASK_MEM_ALIGN, TASK_MEM_FREE_FILL};
use core::ptr::{self, NonNull};
use log::{error, trace};

/// [TaskAllocator] on top of the global heap that remembers every live block.
///
/// Blocks are aligned to [TASK_MEM_ALIGN]; a freed block is overwritten with
/// [TASK_MEM_FREE_FILL] before it goes back to the heap.
#[derive(Debug)]
pub struct HeapTaskAllocator {
    /// start address -> requested size
    blocks: BTreeMap<usize, usize>,
}

impl HeapTaskAllocator {
    pub const fn new() -> HeapTaskAllocator {
        HeapTaskAllocator {
            blocks: BTreeMap::new(),
        }
    }

    /// Zero-sized requests still get a distinct block.
    fn layout(size: usize) -> Option<Layout> {
        Layout::from_size_align(size.max(1), TASK_MEM_ALIGN).ok()
    }
}

impl Default for HeapTaskAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskAllocator for HeapTaskAllocator {
    unsafe fn alloc(&mut self, size: usize) -> Option<NonNull<u8>> {
        let layout = Self::layout(size)?;
        let ptr = NonNull::new(unsafe { alloc(layout) })?;
        self.blocks.insert(ptr.as_ptr() as usize, size);
        trace!("task memory: alloc {} bytes at {:p}", size, ptr);
        Some(ptr)
    }

    unsafe fn free(&mut self, ptr: NonNull<u8>) {
        let Some(size) = self.blocks.remove(&(ptr.as_ptr() as usize)) else {
            error!("task memory: free of unknown block {:p} ignored", ptr);
            return;
        };
        // both were accepted by alloc, so the layout is valid
        let Some(layout) = Self::layout(size) else {
            return;
        };
        unsafe {
            ptr::write_bytes(ptr.as_ptr(), TASK_MEM_FREE_FILL as u8, layout.size());
            dealloc(ptr.as_ptr(), layout);
        }
        trace!("task memory: free {} bytes at {:p}", size, ptr);
    }

    unsafe fn realloc(&mut self, ptr: Option<NonNull<u8>>, size: usize) -> Option<NonNull<u8>> {
        let Some(ptr) = ptr else {
            return unsafe { self.alloc(size) };
        };
        if size == 0 {
            unsafe { self.free(ptr) };
            return None;
        }
        let Some(&old_size) = self.blocks.get(&(ptr.as_ptr() as usize)) else {
            error!("task memory: realloc of unknown block {:p} ignored", ptr);
            return None;
        };
        // the old block goes through free so it is filled like any other
        let moved = unsafe { self.alloc(size) }?;
        unsafe {
            ptr::copy_nonoverlapping(ptr.as_ptr(), moved.as_ptr(), old_size.min(size));
            self.free(ptr);
        }
        trace!("task memory: realloc {:p} -> {} bytes at {:p}", ptr, size, moved);
        Some(moved)
    }

    fn did_alloc(&self, ptr: *const u8) -> bool {
        self.blocks.contains_key(&(ptr as usize))
    }

    fn size_of(&self, ptr: *const u8) -> Option<usize> {
        self.blocks.get(&(ptr as usize)).copied()
    }

    fn allocated(&self) -> usize {
        self.blocks.len()
    }
}
