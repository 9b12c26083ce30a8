// SPDX-License-Identifier: MIT

use vsio::prelude::*;

use crate::core::errors::FsParsingResult;
use crate::core::meta::FsMeta;
use crate::fs::constant::*;
use crate::fs::types::VsfsSuperblock;

/// Geometry resolved from the superblock.
///
/// Pure arithmetic over the three superblock fields: nothing here checks that
/// the layout fits the image. The geometry phase does that before any table is
/// sized from these numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VsfsMeta {
    pub total_blocks: u32,
    /// `data_blocks` as stored; informational only.
    pub data_blocks: u32,
    pub inode_count: u32,

    pub inode_start: u32,
    pub inode_blocks: u32,
    pub bitmap_start: u32,
    pub bitmap_blocks: u32,
    pub data_start: u32,
}

impl VsfsMeta {
    /// Layout for an image of `total_blocks` blocks and `inode_count` inode slots.
    pub fn new(total_blocks: u32, inode_count: u32) -> Self {
        let inode_blocks = (inode_count as u64 * INODE_SIZE as u64).div_ceil(BSIZE as u64);
        let inode_blocks = u32::try_from(inode_blocks).unwrap_or(u32::MAX);
        let bitmap_blocks = total_blocks.div_ceil(BITS_PER_BLOCK as u32);
        let bitmap_start = INODE_TABLE_START.saturating_add(inode_blocks);
        let data_start = bitmap_start.saturating_add(bitmap_blocks);

        Self {
            total_blocks,
            data_blocks: total_blocks.saturating_sub(data_start),
            inode_count,
            inode_start: INODE_TABLE_START,
            inode_blocks,
            bitmap_start,
            bitmap_blocks,
            data_start,
        }
    }

    pub fn from_superblock(sb: &VsfsSuperblock) -> Self {
        Self {
            data_blocks: sb.data_blocks,
            ..Self::new(sb.total_blocks, sb.inode_count)
        }
    }

    /// Reads the superblock at block 1 and resolves the layout.
    pub fn from_io<IO: ImageIO + ?Sized>(io: &mut IO) -> FsParsingResult<Self> {
        let sb: VsfsSuperblock = io.read_struct(Self::superblock_offset())?;
        Ok(Self::from_superblock(&sb))
    }

    pub fn superblock_offset() -> u64 {
        SUPERBLOCK_BLOCK as u64 * BSIZE as u64
    }

    pub fn superblock(&self) -> VsfsSuperblock {
        VsfsSuperblock {
            total_blocks: self.total_blocks,
            data_blocks: self.data_blocks,
            inode_count: self.inode_count,
        }
    }

    /// Byte offset of inode record `inum`.
    #[inline]
    pub fn inode_offset(&self, inum: u32) -> u64 {
        self.inode_start as u64 * BSIZE as u64 + inum as u64 * INODE_SIZE as u64
    }

    /// `(byte offset in the image, bit index in that byte)` of the bitmap bit for `block`.
    #[inline]
    pub fn bit_of(&self, block: u32) -> (u64, u8) {
        let byte = self.bitmap_start as u64 * BSIZE as u64 + block as u64 / 8;
        (byte, (block % 8) as u8)
    }

    /// Bytes of the on-disk bitmap covering every block of the image.
    #[inline]
    pub fn bitmap_len(&self) -> usize {
        (self.total_blocks as usize).div_ceil(8)
    }

    /// `addr` names a block of this image.
    #[inline]
    pub fn contains_block(&self, addr: u32) -> bool {
        addr < self.total_blocks
    }

    #[inline]
    pub fn in_data_region(&self, block: u32) -> bool {
        block >= self.data_start && block < self.total_blocks
    }

    /// Image length in bytes required by this layout.
    #[inline]
    pub fn required_len(&self) -> u64 {
        self.total_blocks as u64 * BSIZE as u64
    }
}

impl FsMeta<u32> for VsfsMeta {
    fn unit_size(&self) -> usize {
        BSIZE
    }

    #[inline]
    fn unit_offset(&self, unit: u32) -> u64 {
        unit as u64 * BSIZE as u64
    }

    fn root_unit(&self) -> u32 {
        ROOT_INO
    }

    fn first_data_unit(&self) -> u32 {
        self.data_start
    }

    fn last_data_unit(&self) -> u32 {
        self.total_blocks.saturating_sub(1)
    }

    fn total_units(&self) -> usize {
        self.total_blocks as usize
    }

    fn size_bytes(&self) -> u64 {
        self.required_len()
    }
}
