//! Build-time configuration for the workspace.
//!
//! Every constant is generated by `build.rs` from the `flags.json` file at the workspace
//! root: the `default` table first, then the table named after the target architecture.

#![no_std]
#![deny(missing_docs)]

/// Constants generated from `flags.json`.
#[allow(missing_docs)]
pub mod build_flags {
    include!(concat!(env!("OUT_DIR"), "/build_flags.rs"));
}

pub use build_flags::*;
