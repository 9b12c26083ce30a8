// SPDX-License-Identifier: MIT
//! VSFS inode record

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::fs::constant::*;

/// On-disk inode record (64 bytes).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, IntoBytes, FromBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct VsfsInode {
    /// Object type, see [`InodeKind`]. 0 marks a free slot.
    pub kind: i16,
    /// Device numbers (devices only)
    pub major: i16,
    pub minor: i16,
    /// Number of directory entries naming this inode
    pub nlink: i16,
    /// Size in bytes
    pub size: u32,
    /// Direct block addresses
    pub addrs: [u32; NDIRECT],
    /// Address of the block holding `NINDIRECT` further addresses
    pub indirect: u32,
}

const _: () = assert!(size_of::<VsfsInode>() == INODE_SIZE);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InodeKind {
    Unused,
    Dir,
    File,
    Device,
}

impl InodeKind {
    /// `None` for a value outside the known kinds.
    pub fn from_raw(raw: i16) -> Option<Self> {
        match raw {
            T_UNUSED => Some(InodeKind::Unused),
            T_DIR => Some(InodeKind::Dir),
            T_FILE => Some(InodeKind::File),
            T_DEV => Some(InodeKind::Device),
            _ => None,
        }
    }

    pub fn raw(self) -> i16 {
        match self {
            InodeKind::Unused => T_UNUSED,
            InodeKind::Dir => T_DIR,
            InodeKind::File => T_FILE,
            InodeKind::Device => T_DEV,
        }
    }
}

impl VsfsInode {
    pub fn new(kind: InodeKind) -> Self {
        Self {
            kind: kind.raw(),
            nlink: 1,
            ..Self::default()
        }
    }

    #[inline]
    pub fn kind(&self) -> Option<InodeKind> {
        InodeKind::from_raw(self.kind)
    }

    /// Allocated: any kind other than unused, valid or not.
    #[inline]
    pub fn is_allocated(&self) -> bool {
        self.kind != T_UNUSED
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind == T_DIR
    }

    #[inline]
    pub fn is_file(&self) -> bool {
        self.kind == T_FILE
    }
}
