use core::fmt::{Debug, Display, Formatter};

/// A 32-bit result code. Negative values are failures.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HResult(pub i32);

pub const S_OK: HResult = HResult(0);
pub const S_FALSE: HResult = HResult(1);
pub const E_NOINTERFACE: HResult = HResult(0x8000_4002_u32 as i32);
pub const E_POINTER: HResult = HResult(0x8000_4003_u32 as i32);
pub const E_FAIL: HResult = HResult(0x8000_4005_u32 as i32);
pub const E_UNEXPECTED: HResult = HResult(0x8000_FFFF_u32 as i32);
pub const E_OUTOFMEMORY: HResult = HResult(0x8007_000E_u32 as i32);
pub const E_INVALIDARG: HResult = HResult(0x8007_0057_u32 as i32);
pub const REGDB_E_CLASSNOTREG: HResult = HResult(0x8004_0154_u32 as i32);
pub const CO_E_OBJISREG: HResult = HResult(0x8004_01FC_u32 as i32);

impl HResult {
    #[inline(always)]
    pub const fn succeeded(self) -> bool {
        self.0 >= 0
    }

    #[inline(always)]
    pub const fn failed(self) -> bool {
        self.0 < 0
    }

    /// Turn a failure code into an `Err`, dropping the distinction between success codes.
    pub fn ok(self) -> Result<(), HResult> {
        if self.succeeded() { Ok(()) } else { Err(self) }
    }

    /// Symbolic name of the well-known codes.
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            S_OK => "S_OK",
            S_FALSE => "S_FALSE",
            E_NOINTERFACE => "E_NOINTERFACE",
            E_POINTER => "E_POINTER",
            E_FAIL => "E_FAIL",
            E_UNEXPECTED => "E_UNEXPECTED",
            E_OUTOFMEMORY => "E_OUTOFMEMORY",
            E_INVALIDARG => "E_INVALIDARG",
            REGDB_E_CLASSNOTREG => "REGDB_E_CLASSNOTREG",
            CO_E_OBJISREG => "CO_E_OBJISREG",
            _ => return None,
        };
        Some(name)
    }
}

impl Display for HResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self.name() {
            Some(name) => f.write_fmt(format_args!("{:#010X} ({})", self.0 as u32, name)),
            None => f.write_fmt(format_args!("{:#010X}", self.0 as u32)),
        }
    }
}

impl Debug for HResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        Display::fmt(self, f)
    }
}
