//! Owning handle for object references.
//!
//! A [ComPtr<T>] is either empty or holds exactly one reference to an object, attributed to
//! this handle only. The object may have other references elsewhere; the handle only tracks
//! its own and gives it back exactly once, when it is dropped or overwritten.
//!
//! Key semantics:
//! - Moves transfer the reference without touching the count. Use [core::mem::take] to move
//!   out of a handle you keep using; the source is left empty.
//! - Assigning into an occupied handle drops, and so releases, the previous reference first.
//! - There is no `Clone`. A second owner of the same object comes from
//!   [ComPtr::query_interface], which acquires a new reference of its own.

use crate::ComError;
use core::{
    fmt::{Debug, Formatter},
    ptr::NonNull,
};
use log::trace;
use objrt::{ClassContext, E_POINTER, Guid, Interface, create_instance};

/// Owner of one reference to an object of the runtime.
///
/// The layout is that of a nullable `*mut T`, which is what [ComPtr::out_slot] relies on.
/// The handle is neither `Send` nor `Sync`: one thread owns it at a time.
#[repr(transparent)]
pub struct ComPtr<T: Interface> {
    raw: Option<NonNull<T>>,
}

impl<T: Interface> ComPtr<T> {
    /// Create an empty handle.
    #[inline(always)]
    pub const fn new() -> ComPtr<T> {
        ComPtr { raw: None }
    }

    /// Create an object of class `clsid` in process and own the first reference to it.
    ///
    /// Fails with [ComError::Creation] if the runtime cannot produce the object; nothing is
    /// leaked in that case.
    pub fn create(clsid: &Guid) -> Result<ComPtr<T>, ComError> {
        let mut handle = ComPtr::<T>::new();
        let hr = unsafe {
            create_instance(
                clsid,
                ClassContext::INPROC_SERVER,
                &T::IID,
                handle.slot().cast(),
            )
        };
        // a misbehaving class that wrote a pointer anyway is released by the drop
        if hr.failed() {
            return Err(ComError::Creation { clsid: *clsid, code: hr });
        }
        if handle.raw.is_none() {
            return Err(ComError::Creation {
                clsid: *clsid,
                code: E_POINTER,
            });
        }
        trace!("ComPtr: created {} as {:?}", clsid, handle);
        Ok(handle)
    }

    /// Adopt a pointer that already carries one reference. Null gives an empty handle.
    ///
    /// # Safety
    ///
    /// `raw` must be null or a valid interface pointer whose reference the caller owns and
    /// hands over. **Adopting a borrowed pointer leads to a double release.**
    #[inline(always)]
    pub unsafe fn from_raw(raw: *mut T) -> ComPtr<T> {
        ComPtr {
            raw: NonNull::new(raw),
        }
    }

    #[inline(always)]
    pub fn is_some(&self) -> bool {
        self.raw.is_some()
    }

    #[inline(always)]
    pub fn is_none(&self) -> bool {
        self.raw.is_none()
    }

    /// Borrow the interface to call its methods.
    pub fn try_deref(&self) -> Result<&T, ComError> {
        match self.raw {
            Some(raw) => Ok(unsafe { &*raw.as_ptr() }),
            None => Err(ComError::EMPTY_DEREF),
        }
    }

    /// The interface pointer itself. Ownership stays with the handle.
    #[inline(always)]
    pub fn get(&self) -> Result<NonNull<T>, ComError> {
        self.raw.ok_or(ComError::EMPTY_DEREF)
    }

    /// Ask the object for interface `U` and own the new reference in a separate handle.
    ///
    /// The result shares the object but not the reference: dropping either handle leaves the
    /// other valid.
    pub fn query_interface<U: Interface>(&self) -> Result<ComPtr<U>, ComError> {
        let Some(raw) = self.raw else {
            return Err(ComError::EMPTY_QUERY);
        };
        let mut other = ComPtr::<U>::new();
        let hr = unsafe {
            raw.as_ref()
                .as_unknown()
                .query_interface(&U::IID, other.slot().cast())
        };
        if hr.failed() {
            return Err(ComError::UnsupportedCapability { iid: U::IID, code: hr });
        }
        if other.raw.is_none() {
            return Err(ComError::UnsupportedCapability {
                iid: U::IID,
                code: E_POINTER,
            });
        }
        trace!("ComPtr: {:?} queried {} as {:?}", self, U::IID, other);
        Ok(other)
    }

    /// The storage slot, for an API that returns a new reference by writing it there.
    ///
    /// Only an empty handle hands out its slot, so nothing owned can be overwritten. Whatever
    /// the API writes is owned by the handle afterwards. The pointer is valid until the handle
    /// is moved or dropped.
    pub fn out_slot(&mut self) -> Result<*mut *mut T, ComError> {
        if self.raw.is_some() {
            return Err(ComError::OCCUPIED_HANDLE);
        }
        Ok(self.slot())
    }

    #[inline(always)]
    fn slot(&mut self) -> *mut *mut T {
        &mut self.raw as *mut Option<NonNull<T>> as *mut *mut T
    }
}

impl<T: Interface> Drop for ComPtr<T> {
    fn drop(&mut self) {
        if let Some(raw) = self.raw.take() {
            let left = unsafe { raw.as_ref().as_unknown().release() };
            trace!("ComPtr: released {:p}, {} left", raw, left);
        }
    }
}

impl<T: Interface> Default for ComPtr<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Interface> Debug for ComPtr<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self.raw {
            Some(raw) => f.write_fmt(format_args!("ComPtr({:p})", raw)),
            None => f.write_str("ComPtr(empty)"),
        }
    }
}
