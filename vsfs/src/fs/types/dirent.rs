// SPDX-License-Identifier: MIT
//! VSFS directory entry

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::fs::constant::*;

/// On-disk directory entry (16 bytes). `inum == 0` marks a free slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, IntoBytes, FromBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct VsfsDirEntry {
    pub inum: u16,
    /// NUL padded, not necessarily NUL terminated
    pub name: [u8; DIRSIZ],
}

const _: () = assert!(size_of::<VsfsDirEntry>() == DIRENT_SIZE);

/// One decoded directory block.
pub type DirBlock = [VsfsDirEntry; DIRENTS_PER_BLOCK];

impl VsfsDirEntry {
    /// Builds an entry, truncating `name` to `DIRSIZ` bytes.
    pub fn new(inum: u16, name: &[u8]) -> Self {
        let mut buf = [0u8; DIRSIZ];
        let n = name.len().min(DIRSIZ);
        buf[..n].copy_from_slice(&name[..n]);
        Self { inum, name: buf }
    }

    /// Name bytes up to the first NUL.
    pub fn name_bytes(&self) -> &[u8] {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(DIRSIZ);
        &self.name[..end]
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        self.inum == 0
    }

    #[inline]
    pub fn is_dot(&self) -> bool {
        self.name_bytes() == DOT_NAME
    }

    #[inline]
    pub fn is_dotdot(&self) -> bool {
        self.name_bytes() == DOTDOT_NAME
    }
}
