//! Building blocks for objects served through the class table.
//!
//! An object is a `#[repr(C)]` struct that starts with one vtable pointer per interface,
//! followed by a [RefCount]. The helpers below cover the parts every such object shares:
//! counting, answering queries from a table of interfaces, getting from an interface
//! pointer back to the object, and handing out the first reference on creation.

use crate::{E_NOINTERFACE, E_POINTER, Guid, HResult, S_OK};
use core::{
    ffi::c_void,
    ptr,
    sync::atomic::{AtomicU32, Ordering},
};

/// Reference count of an object.
#[derive(Debug)]
pub struct RefCount {
    count: AtomicU32,
}

impl RefCount {
    /// Start at one, the construction reference.
    pub const fn new() -> RefCount {
        RefCount {
            count: AtomicU32::new(1),
        }
    }

    /// Return the new count.
    #[inline(always)]
    pub fn add_ref(&self) -> u32 {
        self.count.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Return the remaining count. At zero the caller destroys the object.
    #[inline(always)]
    pub fn release(&self) -> u32 {
        self.count.fetch_sub(1, Ordering::AcqRel) - 1
    }
}

impl Default for RefCount {
    fn default() -> Self {
        Self::new()
    }
}

/// Answer a query from the object's `(iid, interface pointer)` table.
///
/// On a match the interface is written to `*out` and `refs` gains a reference; otherwise
/// `*out` is cleared and the result is `E_NOINTERFACE`.
///
/// # Safety
///
/// `iid` must be null or readable, `out` null or writable.
pub unsafe fn query_interfaces(
    refs: &RefCount,
    iid: *const Guid,
    out: *mut *mut c_void,
    interfaces: &[(Guid, *mut c_void)],
) -> HResult {
    if out.is_null() {
        return E_POINTER;
    }
    if iid.is_null() {
        unsafe { *out = ptr::null_mut() };
        return E_POINTER;
    }
    let iid = unsafe { *iid };
    match interfaces.iter().find(|(candidate, _)| *candidate == iid) {
        Some(&(_, found)) => {
            refs.add_ref();
            unsafe { *out = found };
            S_OK
        }
        None => {
            unsafe { *out = ptr::null_mut() };
            E_NOINTERFACE
        }
    }
}

/// Step back from an interface pointer stored `offset` bytes into its object.
///
/// # Safety
///
/// `this` must point at the vtable field at `offset` of a live `T`.
#[inline(always)]
pub unsafe fn interface_owner<T>(this: *mut c_void, offset: usize) -> *const T {
    unsafe { (this as *const u8).sub(offset) as *const T }
}

/// Query a freshly built object for `iid`, then drop its construction reference.
///
/// If the query fails the object is destroyed by the release and nothing leaks.
///
/// # Safety
///
/// `object` must be a live object holding only its construction reference; `query` and
/// `release` must be its own operations.
pub unsafe fn hand_out_first<T>(
    object: *const T,
    iid: &Guid,
    out: *mut *mut c_void,
    query: unsafe fn(*const T, *const Guid, *mut *mut c_void) -> HResult,
    release: unsafe fn(*const T) -> u32,
) -> HResult {
    unsafe {
        let hr = query(object, iid, out);
        release(object);
        hr
    }
}
