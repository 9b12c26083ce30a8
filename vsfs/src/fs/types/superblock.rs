// SPDX-License-Identifier: MIT
//! VSFS superblock

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// On-disk superblock, stored at the start of block 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, IntoBytes, FromBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct VsfsSuperblock {
    /// Size of the image in blocks.
    pub total_blocks: u32,
    /// Number of data blocks, as recorded by the formatter.
    pub data_blocks: u32,
    /// Number of inode slots, including the reserved slot 0.
    pub inode_count: u32,
}
