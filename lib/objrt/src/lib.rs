//! In-process object runtime.
//!
//! This crate is the boundary that reference-counted objects are reached through:
//! - [Guid] and [HResult], the identifier and result-code types of the binary interface.
//! - [IUnknown] and the [Interface] trait, the capability contract every object exposes.
//! - A class table ([register_class], [create_instance]) that creates objects by class id.
//! - [object] helpers shared by the objects themselves.
//!
//! It deliberately knows nothing about ownership of the pointers it hands out.

#![cfg_attr(not(test), no_std)]
extern crate alloc;

pub mod class;
pub mod guid;
pub mod hresult;
pub mod interface;
pub mod object;

pub use class::*;
pub use guid::{Guid, GuidParseError};
pub use hresult::*;
pub use interface::{IUnknown, IUnknownVtbl, Interface};
pub use object::{RefCount, hand_out_first, interface_owner, query_interfaces};
