//! # Class table.
//!
//! Objects are created by class id through [create_instance]. A class is a [CreateFn] that
//! builds a fresh object and answers with the requested interface; it is made visible with
//! [register_class] and withdrawn with [revoke_class].

use crate::{CO_E_OBJISREG, E_POINTER, Guid, HResult, REGDB_E_CLASSNOTREG};
use alloc::vec::Vec;
use bitflags::bitflags;
use core::{ffi::c_void, ptr};
use log::debug;
use spin::RwLock;

bitflags! {
    /// Execution contexts a class can be served from.
    pub struct ClassContext: u32 {
        const INPROC_SERVER = 0x1;
        const INPROC_HANDLER = 0x2;
        const LOCAL_SERVER = 0x4;
        const REMOTE_SERVER = 0x10;
        const ALL = Self::INPROC_SERVER.bits
            | Self::INPROC_HANDLER.bits
            | Self::LOCAL_SERVER.bits
            | Self::REMOTE_SERVER.bits;
    }
}

/// Build a new object and store interface `iid` of it into `out`.
///
/// On success `*out` must hold the object's first reference. On failure `*out` must be null
/// and nothing may leak.
pub type CreateFn = unsafe fn(iid: &Guid, out: *mut *mut c_void) -> HResult;

#[derive(Clone, Copy)]
struct ClassEntry {
    clsid: Guid,
    context: ClassContext,
    name: &'static str,
    create: CreateFn,
}

static CLASSES: RwLock<Vec<ClassEntry>> = RwLock::new(Vec::new());

/// Make `clsid` creatable in `context`.
pub fn register_class(
    clsid: Guid,
    context: ClassContext,
    name: &'static str,
    create: CreateFn,
) -> Result<(), HResult> {
    let mut classes = CLASSES.write();
    if classes.iter().any(|entry| entry.clsid == clsid) {
        return Err(CO_E_OBJISREG);
    }
    classes.push(ClassEntry {
        clsid,
        context,
        name,
        create,
    });
    debug!("Registered class {} ({}) for {:?}", name, clsid, context);
    Ok(())
}

/// Withdraw a registration. Objects already created are unaffected.
pub fn revoke_class(clsid: &Guid) -> Result<(), HResult> {
    let mut classes = CLASSES.write();
    match classes.iter().position(|entry| entry.clsid == *clsid) {
        Some(index) => {
            let entry = classes.swap_remove(index);
            debug!("Revoked class {} ({})", entry.name, clsid);
            Ok(())
        }
        None => Err(REGDB_E_CLASSNOTREG),
    }
}

pub fn is_registered(clsid: &Guid) -> bool {
    CLASSES.read().iter().any(|entry| entry.clsid == *clsid)
}

/// Create an object of class `clsid` and store its interface `iid` into `out`.
///
/// `*out` is cleared before anything else, so it is null on every failure path.
///
/// # Safety
///
/// `out` must be null or valid for writes. On success the caller owns the reference in `*out`.
pub unsafe fn create_instance(
    clsid: &Guid,
    context: ClassContext,
    iid: &Guid,
    out: *mut *mut c_void,
) -> HResult {
    if out.is_null() {
        return E_POINTER;
    }
    unsafe { *out = ptr::null_mut() };
    // copy the entry out so the class code runs without the table lock
    let entry = CLASSES
        .read()
        .iter()
        .find(|entry| entry.clsid == *clsid && entry.context.intersects(context))
        .copied();
    let Some(entry) = entry else {
        debug!("No class {} for {:?}", clsid, context);
        return REGDB_E_CLASSNOTREG;
    };
    let hr = unsafe { (entry.create)(iid, out) };
    debug!("Created {} ({}) as {}: {}", entry.name, clsid, iid, hr);
    hr
}
