// SPDX-License-Identifier: MIT
pub mod bitmap;
pub mod checker;
pub mod constant;
pub mod meta;
pub mod table;
pub mod types;

#[cfg(any(test, feature = "builder"))]
pub mod builder;

// Public Interface
pub mod traits {
    pub use super::bitmap::BlockBitmap;
    pub use super::checker::{VsfsCheckOptions, VsfsChecker};
    pub use super::meta::VsfsMeta;
    pub use super::table::{BlockRef, BlockRole, InodeBlocks, InodeTable};

    #[cfg(any(test, feature = "builder"))]
    pub use super::builder::ImageBuilder;
}

pub mod prelude {
    pub use super::checker::{
        BitmapInconsistency, Finding, FsChecker, ReportDisplayOpts, Severity, VerifierOptionsLike,
        VerifyPhases, VerifyReport, Violation,
    };
    pub use super::constant::*;
    pub use super::traits::*;
    pub use super::types::*;
    pub use crate::core::errors::*;
    pub use crate::core::meta::FsMeta;
    pub use vsio::prelude::*;
}
