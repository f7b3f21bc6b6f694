//! Exclusive-ownership handles over runtime-managed resources.
//!
//! Provide two handle types:
//! - [ComPtr<T>] owns exactly one reference to an object of the object runtime and releases it
//!   when dropped. Ownership moves, it is never copied.
//! - [TaskBuffer<T>] owns exactly one block of task memory and frees it when dropped.
//!
//! Both hand out an output slot ([ComPtr::out_slot], [TaskBuffer::out_slot]) for APIs that
//! return their result by writing a pointer, **but only while the handle is empty**, so an
//! owned resource can never be overwritten without being released.

#![cfg_attr(not(test), no_std)]

mod buffer;
mod error;
mod ptr;

#[cfg(test)]
mod fixture;

pub use buffer::TaskBuffer;
pub use error::ComError;
pub use ptr::ComPtr;
