//! The shortcut-link class.
//!
//! A `ShortcutLink` binds a launch target to a hotkey. It answers [IShortcut] at its start
//! and [IUnknown] through a second vtable.

use core::{ffi::c_void, mem::offset_of, ptr};
use objrt::{
    ClassContext, E_INVALIDARG, E_OUTOFMEMORY, E_POINTER, Guid, HResult, IUnknown, IUnknownVtbl,
    Interface, RefCount, S_OK, hand_out_first, interface_owner, query_interfaces, register_class,
};
use spin::Mutex;

pub const CLSID_SHORTCUT: Guid = Guid::from_u128(0x5C07C0A1_6B1E_4D2A_8E4F_1A2B3C4D5E6F);

/// Make the class creatable in process.
pub fn register() -> Result<(), HResult> {
    register_class(
        CLSID_SHORTCUT,
        ClassContext::INPROC_SERVER,
        "ShortcutLink",
        create_shortcut,
    )
}

// region: IShortcut

#[repr(C)]
pub struct IShortcutVtbl {
    pub base: IUnknownVtbl,
    pub set_target: unsafe extern "system" fn(this: *mut c_void, target: *const u8, len: usize) -> HResult,
    /// NUL-terminated copy of the target, allocated from task memory.
    pub get_target: unsafe extern "system" fn(this: *mut c_void, out: *mut *mut u8) -> HResult,
    pub set_hotkey: unsafe extern "system" fn(this: *mut c_void, hotkey: u16) -> HResult,
    pub get_hotkey: unsafe extern "system" fn(this: *mut c_void, out: *mut u16) -> HResult,
}

#[repr(C)]
#[derive(Debug)]
pub struct IShortcut {
    vtbl: *const IShortcutVtbl,
}

unsafe impl Interface for IShortcut {
    const IID: Guid = Guid::from_u128(0x5C07C0A1_6B1E_4D2A_8E4F_000000000001);
}

impl IShortcut {
    fn this(&self) -> *mut c_void {
        self as *const Self as *mut c_void
    }

    fn vtbl(&self) -> &IShortcutVtbl {
        unsafe { &*self.vtbl }
    }

    pub fn set_target(&self, target: &str) -> HResult {
        unsafe { (self.vtbl().set_target)(self.this(), target.as_ptr(), target.len()) }
    }

    /// # Safety
    ///
    /// `out` must be valid for writes. On success the caller frees `*out` from task memory.
    pub unsafe fn get_target(&self, out: *mut *mut u8) -> HResult {
        unsafe { (self.vtbl().get_target)(self.this(), out) }
    }

    /// Low byte is the key code, high byte the modifiers.
    pub fn set_hotkey(&self, hotkey: u16) -> HResult {
        unsafe { (self.vtbl().set_hotkey)(self.this(), hotkey) }
    }

    pub fn hotkey(&self) -> Result<u16, HResult> {
        let mut hotkey = 0;
        unsafe { (self.vtbl().get_hotkey)(self.this(), &mut hotkey) }.ok()?;
        Ok(hotkey)
    }
}

// endregion

// region: ShortcutLink

struct LinkState {
    target: String,
    hotkey: u16,
}

#[repr(C)]
struct ShortcutLink {
    shortcut: *const IShortcutVtbl,
    unknown: *const IUnknownVtbl,
    refs: RefCount,
    state: Mutex<LinkState>,
}

static SHORTCUT_VTBL: IShortcutVtbl = IShortcutVtbl {
    base: IUnknownVtbl {
        query_interface: shortcut_query_interface,
        add_ref: shortcut_add_ref,
        release: shortcut_release,
    },
    set_target: shortcut_set_target,
    get_target: shortcut_get_target,
    set_hotkey: shortcut_set_hotkey,
    get_hotkey: shortcut_get_hotkey,
};

static UNKNOWN_VTBL: IUnknownVtbl = IUnknownVtbl {
    query_interface: unknown_query_interface,
    add_ref: unknown_add_ref,
    release: unknown_release,
};

impl ShortcutLink {
    fn from_shortcut(this: *mut c_void) -> *const ShortcutLink {
        this as *const ShortcutLink
    }

    unsafe fn from_unknown(this: *mut c_void) -> *const ShortcutLink {
        unsafe { interface_owner(this, offset_of!(ShortcutLink, unknown)) }
    }

    unsafe fn query(this: *const ShortcutLink, iid: *const Guid, out: *mut *mut c_void) -> HResult {
        unsafe {
            let interfaces = [
                (IShortcut::IID, &raw const (*this).shortcut as *mut c_void),
                (IUnknown::IID, &raw const (*this).unknown as *mut c_void),
            ];
            query_interfaces(&(*this).refs, iid, out, &interfaces)
        }
    }

    /// # Safety
    ///
    /// At zero the object is freed; `this` must not be used afterwards.
    unsafe fn release(this: *const ShortcutLink) -> u32 {
        let left = unsafe { (*this).refs.release() };
        if left == 0 {
            log::trace!("ShortcutLink {:p} destroyed", this);
            drop(unsafe { Box::from_raw(this as *mut ShortcutLink) });
        }
        left
    }
}

unsafe extern "system" fn shortcut_query_interface(
    this: *mut c_void,
    iid: *const Guid,
    out: *mut *mut c_void,
) -> HResult {
    unsafe { ShortcutLink::query(ShortcutLink::from_shortcut(this), iid, out) }
}

unsafe extern "system" fn shortcut_add_ref(this: *mut c_void) -> u32 {
    unsafe { (*ShortcutLink::from_shortcut(this)).refs.add_ref() }
}

unsafe extern "system" fn shortcut_release(this: *mut c_void) -> u32 {
    unsafe { ShortcutLink::release(ShortcutLink::from_shortcut(this)) }
}

unsafe extern "system" fn unknown_query_interface(
    this: *mut c_void,
    iid: *const Guid,
    out: *mut *mut c_void,
) -> HResult {
    unsafe { ShortcutLink::query(ShortcutLink::from_unknown(this), iid, out) }
}

unsafe extern "system" fn unknown_add_ref(this: *mut c_void) -> u32 {
    unsafe { (*ShortcutLink::from_unknown(this)).refs.add_ref() }
}

unsafe extern "system" fn unknown_release(this: *mut c_void) -> u32 {
    unsafe { ShortcutLink::release(ShortcutLink::from_unknown(this)) }
}

unsafe extern "system" fn shortcut_set_target(
    this: *mut c_void,
    target: *const u8,
    len: usize,
) -> HResult {
    if target.is_null() {
        return E_POINTER;
    }
    let bytes = unsafe { core::slice::from_raw_parts(target, len) };
    // the target is handed back NUL-terminated
    let Ok(text) = core::str::from_utf8(bytes) else {
        return E_INVALIDARG;
    };
    if text.contains('\0') {
        return E_INVALIDARG;
    }
    let link = unsafe { &*ShortcutLink::from_shortcut(this) };
    link.state.lock().target = String::from(text);
    S_OK
}

unsafe extern "system" fn shortcut_get_target(this: *mut c_void, out: *mut *mut u8) -> HResult {
    if out.is_null() {
        return E_POINTER;
    }
    let link = unsafe { &*ShortcutLink::from_shortcut(this) };
    let state = link.state.lock();
    let block = taskmem::task_mem_alloc(state.target.len() + 1);
    if block.is_null() {
        unsafe { *out = ptr::null_mut() };
        return E_OUTOFMEMORY;
    }
    unsafe {
        ptr::copy_nonoverlapping(state.target.as_ptr(), block, state.target.len());
        *block.add(state.target.len()) = 0;
        *out = block;
    }
    S_OK
}

unsafe extern "system" fn shortcut_set_hotkey(this: *mut c_void, hotkey: u16) -> HResult {
    let link = unsafe { &*ShortcutLink::from_shortcut(this) };
    link.state.lock().hotkey = hotkey;
    S_OK
}

unsafe extern "system" fn shortcut_get_hotkey(this: *mut c_void, out: *mut u16) -> HResult {
    if out.is_null() {
        return E_POINTER;
    }
    let link = unsafe { &*ShortcutLink::from_shortcut(this) };
    unsafe { *out = link.state.lock().hotkey };
    S_OK
}

unsafe fn create_shortcut(iid: &Guid, out: *mut *mut c_void) -> HResult {
    let link = Box::into_raw(Box::new(ShortcutLink {
        shortcut: &SHORTCUT_VTBL,
        unknown: &UNKNOWN_VTBL,
        refs: RefCount::new(),
        state: Mutex::new(LinkState {
            target: String::new(),
            hotkey: 0,
        }),
    }));
    unsafe { hand_out_first(link, iid, out, ShortcutLink::query, ShortcutLink::release) }
}

// endregion
