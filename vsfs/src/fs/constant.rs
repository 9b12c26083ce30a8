// SPDX-License-Identifier: MIT

/// Block size in bytes. Fixed for the whole image.
pub const BSIZE: usize = 512;

pub const BOOT_BLOCK: u32 = 0;
pub const SUPERBLOCK_BLOCK: u32 = 1;
pub const INODE_TABLE_START: u32 = 2;

pub const INODE_SIZE: usize = 64;
pub const INODES_PER_BLOCK: usize = BSIZE / INODE_SIZE;

/// Direct addresses per inode.
pub const NDIRECT: usize = 12;
/// Addresses held by the indirect block.
pub const NINDIRECT: usize = BSIZE / size_of::<u32>();
pub const MAX_FILE_BLOCKS: usize = NDIRECT + NINDIRECT;

pub const DIRSIZ: usize = 14;
pub const DIRENT_SIZE: usize = 16;
pub const DIRENTS_PER_BLOCK: usize = BSIZE / DIRENT_SIZE;

/// Bits held by one bitmap block.
pub const BITS_PER_BLOCK: usize = BSIZE * 8;

pub const ROOT_INO: u32 = 1;

pub const T_UNUSED: i16 = 0;
pub const T_DIR: i16 = 1;
pub const T_FILE: i16 = 2;
pub const T_DEV: i16 = 3;

pub const DOT_NAME: &[u8] = b".";
pub const DOTDOT_NAME: &[u8] = b"..";
