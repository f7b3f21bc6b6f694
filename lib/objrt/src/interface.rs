//! The capability contract shared by every object the runtime hands out.
//!
//! An interface pointer points at a `#[repr(C)]` struct whose first field is a pointer to a
//! vtable. Every vtable starts with [IUnknownVtbl], so any interface pointer can be viewed as
//! an [IUnknown] to add a reference, release one, or ask for another interface.

use crate::{Guid, HResult};
use core::ffi::c_void;

/// The three entries every vtable begins with.
#[repr(C)]
pub struct IUnknownVtbl {
    pub query_interface:
        unsafe extern "system" fn(this: *mut c_void, iid: *const Guid, out: *mut *mut c_void) -> HResult,
    pub add_ref: unsafe extern "system" fn(this: *mut c_void) -> u32,
    pub release: unsafe extern "system" fn(this: *mut c_void) -> u32,
}

/// The base interface.
#[repr(C)]
#[derive(Debug)]
pub struct IUnknown {
    vtbl: *const IUnknownVtbl,
}

/// A typed interface that can be reached through [IUnknown::query_interface].
///
/// # Safety
///
/// Implementors must be `#[repr(C)]` with a vtable pointer as the first field, and the
/// vtable must begin with an [IUnknownVtbl]. `IID` must identify exactly this layout.
pub unsafe trait Interface: Sized {
    const IID: Guid;

    /// View this interface through its base entries.
    #[inline(always)]
    fn as_unknown(&self) -> &IUnknown {
        unsafe { &*(self as *const Self as *const IUnknown) }
    }
}

unsafe impl Interface for IUnknown {
    const IID: Guid = Guid::from_u128(0x00000000_0000_0000_C000_000000000046);
}

impl IUnknown {
    #[inline(always)]
    fn this(&self) -> *mut c_void {
        self as *const Self as *mut c_void
    }

    #[inline(always)]
    fn vtbl(&self) -> &IUnknownVtbl {
        unsafe { &*self.vtbl }
    }

    /// Add a reference and return the new count.
    ///
    /// The count is informational only; objects may report any positive value.
    pub fn add_ref(&self) -> u32 {
        unsafe { (self.vtbl().add_ref)(self.this()) }
    }

    /// Drop a reference and return the remaining count.
    ///
    /// # Safety
    ///
    /// The caller must own the reference it gives up. When the count reaches zero the object
    /// is destroyed, and `self` must not be touched again.
    pub unsafe fn release(&self) -> u32 {
        unsafe { (self.vtbl().release)(self.this()) }
    }

    /// Ask for interface `iid`. On success `*out` holds a new reference the caller owns.
    ///
    /// # Safety
    ///
    /// `out` must be valid for writes.
    pub unsafe fn query_interface(&self, iid: &Guid, out: *mut *mut c_void) -> HResult {
        unsafe { (self.vtbl().query_interface)(self.this(), iid, out) }
    }
}
