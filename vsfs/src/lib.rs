// SPDX-License-Identifier: MIT

// Core Modules
pub mod core;
pub mod fs;

// Reusable types and traits
pub use crate::core::checker::{FsChecker, VerifierOptionsLike, VerifyPhases, VerifyReport};
pub use crate::core::meta::FsMeta;

/// VSFS checker and on-disk types.
///
/// See [`vsfs::VsfsChecker`], [`vsfs::VsfsMeta`] and [`vsfs::InodeTable`].
pub mod vsfs {
    pub use super::fs::prelude::*;
}
