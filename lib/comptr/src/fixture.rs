//! Classes the tests create through the runtime.
//!
//! `Link` is a small shell-link-like object. It answers [ILink] at its start and [IUnknown]
//! through a second vtable, so the two interfaces have different addresses like a real
//! multi-interface object.

use core::{ffi::c_void, mem::offset_of, ptr};
use objrt::{
    ClassContext, E_OUTOFMEMORY, E_POINTER, Guid, HResult, IUnknown, IUnknownVtbl, Interface,
    RefCount, S_OK, hand_out_first, interface_owner, query_interfaces, register_class,
};
use spin::{Mutex, Once};

pub const CLSID_LINK: Guid = Guid::from_u128(0x6C1A7E01_3F00_4A5B_9C00_00000000F1C7);
/// Always fails with `E_OUTOFMEMORY`.
pub const CLSID_BROKEN: Guid = Guid::from_u128(0x6C1A7E01_3F00_4A5B_9C00_00000000F1C8);
/// Reports success without producing an object.
pub const CLSID_HOLLOW: Guid = Guid::from_u128(0x6C1A7E01_3F00_4A5B_9C00_00000000F1C9);
pub const CLSID_UNREGISTERED: Guid = Guid::from_u128(0x6C1A7E01_3F00_4A5B_9C00_00000000F1CA);

static REGISTER: Once = Once::new();

pub fn register() {
    REGISTER.call_once(|| {
        register_class(CLSID_LINK, ClassContext::INPROC_SERVER, "fixture link", create_link).unwrap();
        register_class(CLSID_BROKEN, ClassContext::INPROC_SERVER, "broken", create_broken).unwrap();
        register_class(CLSID_HOLLOW, ClassContext::INPROC_SERVER, "hollow", create_hollow).unwrap();
    });
}

// region: interfaces

#[repr(C)]
pub struct ILinkVtbl {
    pub base: IUnknownVtbl,
    pub set_path: unsafe extern "system" fn(this: *mut c_void, path: *const u8, len: usize) -> HResult,
    /// Writes a NUL-terminated copy of the path, allocated from task memory.
    pub get_path: unsafe extern "system" fn(this: *mut c_void, out: *mut *mut u8) -> HResult,
}

#[repr(C)]
#[derive(Debug)]
pub struct ILink {
    vtbl: *const ILinkVtbl,
}

unsafe impl Interface for ILink {
    const IID: Guid = Guid::from_u128(0x6C1A7E01_3F00_4A5B_9C00_000000001111);
}

impl ILink {
    fn this(&self) -> *mut c_void {
        self as *const Self as *mut c_void
    }

    pub fn set_path(&self, path: &str) -> HResult {
        unsafe { ((*self.vtbl).set_path)(self.this(), path.as_ptr(), path.len()) }
    }

    /// # Safety
    ///
    /// `out` must be valid for writes.
    pub unsafe fn get_path(&self, out: *mut *mut u8) -> HResult {
        unsafe { ((*self.vtbl).get_path)(self.this(), out) }
    }
}

/// Implemented by nothing.
#[repr(C)]
#[derive(Debug)]
#[allow(dead_code)]
pub struct IMissing {
    vtbl: *const IUnknownVtbl,
}

unsafe impl Interface for IMissing {
    const IID: Guid = Guid::from_u128(0x6C1A7E01_3F00_4A5B_9C00_000000002222);
}

// endregion

// region: Link

#[repr(C)]
struct Link {
    link: *const ILinkVtbl,
    unknown: *const IUnknownVtbl,
    refs: RefCount,
    path: Mutex<String>,
}

static LINK_VTBL: ILinkVtbl = ILinkVtbl {
    base: IUnknownVtbl {
        query_interface: link_query_interface,
        add_ref: link_add_ref,
        release: link_release,
    },
    set_path: link_set_path,
    get_path: link_get_path,
};

static UNKNOWN_VTBL: IUnknownVtbl = IUnknownVtbl {
    query_interface: unknown_query_interface,
    add_ref: unknown_add_ref,
    release: unknown_release,
};

impl Link {
    fn from_link(this: *mut c_void) -> *const Link {
        this as *const Link
    }

    unsafe fn from_unknown(this: *mut c_void) -> *const Link {
        unsafe { interface_owner(this, offset_of!(Link, unknown)) }
    }

    unsafe fn query(this: *const Link, iid: *const Guid, out: *mut *mut c_void) -> HResult {
        unsafe {
            let interfaces = [
                (ILink::IID, &raw const (*this).link as *mut c_void),
                (IUnknown::IID, &raw const (*this).unknown as *mut c_void),
            ];
            query_interfaces(&(*this).refs, iid, out, &interfaces)
        }
    }

    unsafe fn release(this: *const Link) -> u32 {
        let left = unsafe { (*this).refs.release() };
        if left == 0 {
            drop(unsafe { Box::from_raw(this as *mut Link) });
        }
        left
    }
}

unsafe extern "system" fn link_query_interface(
    this: *mut c_void,
    iid: *const Guid,
    out: *mut *mut c_void,
) -> HResult {
    unsafe { Link::query(Link::from_link(this), iid, out) }
}

unsafe extern "system" fn link_add_ref(this: *mut c_void) -> u32 {
    unsafe { (*Link::from_link(this)).refs.add_ref() }
}

unsafe extern "system" fn link_release(this: *mut c_void) -> u32 {
    unsafe { Link::release(Link::from_link(this)) }
}

unsafe extern "system" fn unknown_query_interface(
    this: *mut c_void,
    iid: *const Guid,
    out: *mut *mut c_void,
) -> HResult {
    unsafe { Link::query(Link::from_unknown(this), iid, out) }
}

unsafe extern "system" fn unknown_add_ref(this: *mut c_void) -> u32 {
    unsafe { (*Link::from_unknown(this)).refs.add_ref() }
}

unsafe extern "system" fn unknown_release(this: *mut c_void) -> u32 {
    unsafe { Link::release(Link::from_unknown(this)) }
}

unsafe extern "system" fn link_set_path(this: *mut c_void, path: *const u8, len: usize) -> HResult {
    let bytes = unsafe { core::slice::from_raw_parts(path, len) };
    let Ok(text) = core::str::from_utf8(bytes) else {
        return objrt::E_INVALIDARG;
    };
    let link = unsafe { &*Link::from_link(this) };
    *link.path.lock() = String::from(text);
    S_OK
}

unsafe extern "system" fn link_get_path(this: *mut c_void, out: *mut *mut u8) -> HResult {
    if out.is_null() {
        return E_POINTER;
    }
    let link = unsafe { &*Link::from_link(this) };
    let path = link.path.lock();
    let block = taskmem::task_mem_alloc(path.len() + 1);
    if block.is_null() {
        unsafe { *out = ptr::null_mut() };
        return E_OUTOFMEMORY;
    }
    unsafe {
        ptr::copy_nonoverlapping(path.as_ptr(), block, path.len());
        *block.add(path.len()) = 0;
        *out = block;
    }
    S_OK
}

unsafe fn create_link(iid: &Guid, out: *mut *mut c_void) -> HResult {
    let link = Box::into_raw(Box::new(Link {
        link: &LINK_VTBL,
        unknown: &UNKNOWN_VTBL,
        refs: RefCount::new(),
        path: Mutex::new(String::new()),
    }));
    unsafe { hand_out_first(link, iid, out, Link::query, Link::release) }
}

// endregion

unsafe fn create_broken(_iid: &Guid, _out: *mut *mut c_void) -> HResult {
    E_OUTOFMEMORY
}

unsafe fn create_hollow(_iid: &Guid, _out: *mut *mut c_void) -> HResult {
    S_OK
}
