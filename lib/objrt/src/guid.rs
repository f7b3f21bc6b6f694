use core::{
    fmt::{Debug, Display, Formatter},
    str::FromStr,
};

/// A 128-bit class or interface identifier, laid out as the binary interface expects.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl Guid {
    /// The all-zero identifier.
    pub const NULL: Guid = Guid::from_u128(0);

    /// Build an identifier from its canonical big-endian reading,
    /// e.g. `0x00000000_0000_0000_C000_000000000046`.
    pub const fn from_u128(value: u128) -> Guid {
        Guid {
            data1: (value >> 96) as u32,
            data2: (value >> 80) as u16,
            data3: (value >> 64) as u16,
            data4: (value as u64).to_be_bytes(),
        }
    }

    pub const fn to_u128(&self) -> u128 {
        ((self.data1 as u128) << 96)
            | ((self.data2 as u128) << 80)
            | ((self.data3 as u128) << 64)
            | (u64::from_be_bytes(self.data4) as u128)
    }
}

impl Display for Guid {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let d4 = &self.data4;
        f.write_fmt(format_args!(
            "{:08X}-{:04X}-{:04X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}",
            self.data1, self.data2, self.data3, d4[0], d4[1], d4[2], d4[3], d4[4], d4[5], d4[6], d4[7]
        ))
    }
}

impl Debug for Guid {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        Display::fmt(self, f)
    }
}

/// The string was not a `XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX` identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuidParseError;

impl Display for GuidParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str("malformed identifier")
    }
}

impl core::error::Error for GuidParseError {}

impl FromStr for Guid {
    type Err = GuidParseError;

    /// Accept the canonical form, optionally wrapped in braces, in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = match s.strip_prefix('{') {
            Some(inner) => inner.strip_suffix('}').ok_or(GuidParseError)?,
            None => s,
        };
        let bytes = s.as_bytes();
        if bytes.len() != 36 {
            return Err(GuidParseError);
        }
        let mut value: u128 = 0;
        for (index, &byte) in bytes.iter().enumerate() {
            if matches!(index, 8 | 13 | 18 | 23) {
                if byte != b'-' {
                    return Err(GuidParseError);
                }
                continue;
            }
            let digit = (byte as char).to_digit(16).ok_or(GuidParseError)?;
            value = (value << 4) | digit as u128;
        }
        Ok(Guid::from_u128(value))
    }
}
