//! Create a keyboard shortcut object and read it back.
//!
//! Usage: `shortcut <target> [hotkey]`, where `hotkey` is a hexadecimal key code with the
//! modifiers in the high byte, e.g. `0x0654` for Ctrl+Alt+T.

mod link;
mod logging;

use comptr::{ComError, ComPtr, TaskBuffer};
use core::{
    ffi::{CStr, c_void},
    fmt::{Display, Formatter},
};
use link::{CLSID_SHORTCUT, IShortcut};
use log::{debug, info};
use objrt::{HResult, IUnknown};
use std::process::ExitCode;

/// Default hotkey: Ctrl+Alt+T.
const DEFAULT_HOTKEY: u16 = 0x0654;

#[derive(Debug, PartialEq, Eq)]
enum AppError {
    Usage,
    Handle(ComError),
    Call(&'static str, HResult),
}

impl From<ComError> for AppError {
    fn from(err: ComError) -> Self {
        AppError::Handle(err)
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            AppError::Usage => f.write_str("usage: shortcut <target> [hotkey]"),
            AppError::Handle(err) => Display::fmt(err, f),
            AppError::Call(name, hr) => f.write_fmt(format_args!("{} failed: {}", name, hr)),
        }
    }
}

fn check(name: &'static str, hr: HResult) -> Result<(), AppError> {
    hr.ok().map_err(|hr| AppError::Call(name, hr))
}

fn parse_hotkey(text: &str) -> Option<u16> {
    let digits = text.strip_prefix("0x").or(text.strip_prefix("0X")).unwrap_or(text);
    u16::from_str_radix(digits, 16).ok()
}

fn register_shortcut() -> Result<(), AppError> {
    link::register().map_err(|hr| AppError::Call("register", hr))
}

/// Create a shortcut, store `target` and `hotkey` in it, and read both back.
fn round_trip(target: &str, hotkey: u16) -> Result<(String, u16), AppError> {
    let shortcut = ComPtr::<IShortcut>::create(&CLSID_SHORTCUT)?;
    let link = shortcut.try_deref()?;
    check("set_target", link.set_target(target))?;
    check("set_hotkey", link.set_hotkey(hotkey))?;

    let mut stored = TaskBuffer::<u8>::new();
    check("get_target", unsafe { link.get_target(stored.out_slot()?) })?;
    let stored_target = unsafe { CStr::from_ptr(stored.as_ptr().cast()) }
        .to_string_lossy()
        .into_owned();
    let stored_hotkey = link.hotkey().map_err(|hr| AppError::Call("hotkey", hr))?;

    let unknown = shortcut.query_interface::<IUnknown>()?;
    debug!(
        "IShortcut at {:p}, IUnknown at {:p}",
        shortcut.get()?.as_ptr() as *mut c_void,
        unknown.get()?.as_ptr() as *mut c_void
    );
    Ok((stored_target, stored_hotkey))
}

fn run(target: &str, hotkey: u16) -> Result<(), AppError> {
    register_shortcut()?;
    let (stored_target, stored_hotkey) = round_trip(target, hotkey)?;
    info!("{} -> {:#06x}", stored_target, stored_hotkey);
    Ok(())
}

fn main() -> ExitCode {
    logging::init();
    let mut args = std::env::args().skip(1);
    let result = match (args.next(), args.next()) {
        (Some(target), None) => run(&target, DEFAULT_HOTKEY),
        (Some(target), Some(hotkey)) => match parse_hotkey(&hotkey) {
            Some(hotkey) => run(&target, hotkey),
            None => Err(AppError::Usage),
        },
        _ => Err(AppError::Usage),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}
