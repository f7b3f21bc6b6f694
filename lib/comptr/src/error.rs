use core::fmt::{Display, Formatter};
use objrt::{Guid, HResult};

/// Failures of handle operations.
///
/// None of them changes the ownership state of the handle involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComError {
    /// The runtime could not create an object of class `clsid`.
    Creation { clsid: Guid, code: HResult },
    /// The handle was empty where a resource is required, or occupied where it must be empty.
    InvalidOperation(&'static str),
    /// The object does not implement interface `iid`.
    UnsupportedCapability { iid: Guid, code: HResult },
}

impl ComError {
    pub(crate) const EMPTY_DEREF: ComError = ComError::InvalidOperation("empty handle dereferenced");
    pub(crate) const EMPTY_QUERY: ComError =
        ComError::InvalidOperation("capability query on empty handle");
    pub(crate) const OCCUPIED_HANDLE: ComError =
        ComError::InvalidOperation("address requested on non-empty handle");
    pub(crate) const OCCUPIED_BUFFER: ComError =
        ComError::InvalidOperation("address requested on non-empty buffer");
}

impl Display for ComError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            ComError::Creation { clsid, code } => {
                f.write_fmt(format_args!("cannot create class {}: {}", clsid, code))
            }
            ComError::InvalidOperation(message) => f.write_str(message),
            ComError::UnsupportedCapability { iid, code } => {
                f.write_fmt(format_args!("interface {} not supported: {}", iid, code))
            }
        }
    }
}

impl core::error::Error for ComError {}
