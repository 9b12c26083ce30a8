// SPDX-License-Identifier: MIT

use vsio::prelude::*;
use zerocopy::FromBytes;

use crate::core::errors::{FsParsingError, FsParsingResult};
use crate::core::meta::FsMeta;
use crate::fs::constant::*;
use crate::fs::meta::VsfsMeta;
use crate::fs::types::{InodeKind, VsfsInode};

/// Where an address came from inside an inode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRole {
    Direct(usize),
    /// The indirect pointer block itself.
    Indirect,
    /// Slot of the indirect block.
    Mapped(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRef {
    pub addr: u32,
    pub role: BlockRole,
}

/// Block addresses of one inode, with the indirect block already read.
#[derive(Debug, Clone, Default)]
pub struct InodeBlocks {
    pub direct: [u32; NDIRECT],
    pub indirect: u32,
    /// Contents of the indirect block. Empty when the pointer is zero or out of range.
    pub mapped: Vec<u32>,
}

impl InodeBlocks {
    /// Every non-zero address: direct list, indirect pointer, then the mapped addresses.
    pub fn iter(&self) -> impl Iterator<Item = BlockRef> + '_ {
        let direct = self.direct.iter().enumerate().map(|(i, &addr)| BlockRef {
            addr,
            role: BlockRole::Direct(i),
        });
        let indirect = core::iter::once(BlockRef {
            addr: self.indirect,
            role: BlockRole::Indirect,
        });
        let mapped = self.mapped.iter().enumerate().map(|(i, &addr)| BlockRef {
            addr,
            role: BlockRole::Mapped(i),
        });
        direct
            .chain(indirect)
            .chain(mapped)
            .filter(|r| r.addr != 0)
    }

    /// Non-zero content blocks (direct and mapped), in file order.
    pub fn data_blocks(&self) -> impl Iterator<Item = u32> + '_ {
        self.iter()
            .filter(|r| r.role != BlockRole::Indirect)
            .map(|r| r.addr)
    }

    /// First content block, `None` when the first direct slot is empty.
    pub fn first_block(&self) -> Option<u32> {
        (self.direct[0] != 0).then_some(self.direct[0])
    }
}

/// Every inode record of the image, decoded once.
#[derive(Debug, Clone)]
pub struct InodeTable {
    inodes: Vec<VsfsInode>,
    blocks: Vec<InodeBlocks>,
}

impl InodeTable {
    /// Decodes records `0..inode_count` and the indirect blocks of allocated inodes.
    ///
    /// Indirect pointers outside the image are left unresolved.
    pub fn load<IO: ImageIO + ?Sized>(io: &mut IO, meta: &VsfsMeta) -> FsParsingResult<Self> {
        let count = meta.inode_count as usize;
        let mut raw = vec![0u8; count * INODE_SIZE];
        io.read_in_chunks(meta.inode_offset(0), &mut raw, BSIZE)?;

        let inodes = raw
            .chunks_exact(INODE_SIZE)
            .map(|rec| VsfsInode::read_from_bytes(rec).map_err(|_| FsParsingError::Corrupted))
            .collect::<FsParsingResult<Vec<_>>>()?;

        let mut blocks = Vec::with_capacity(count);
        for inode in &inodes {
            let mut b = InodeBlocks {
                direct: inode.addrs,
                indirect: inode.indirect,
                mapped: Vec::new(),
            };
            let resolvable = matches!(
                inode.kind(),
                Some(InodeKind::Dir | InodeKind::File | InodeKind::Device)
            );
            if resolvable && inode.indirect != 0 && meta.contains_block(inode.indirect) {
                let table: [u32; NINDIRECT] = io.read_struct(meta.unit_offset(inode.indirect))?;
                b.mapped = table.to_vec();
            }
            blocks.push(b);
        }

        Ok(Self { inodes, blocks })
    }

    pub fn len(&self) -> usize {
        self.inodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inodes.is_empty()
    }

    #[inline]
    pub fn get(&self, inum: u32) -> Option<&VsfsInode> {
        self.inodes.get(inum as usize)
    }

    #[inline]
    pub fn blocks(&self, inum: u32) -> Option<&InodeBlocks> {
        self.blocks.get(inum as usize)
    }

    /// Decoded kind; `None` for an unknown kind or an index past the table.
    #[inline]
    pub fn kind(&self, inum: u32) -> Option<InodeKind> {
        self.get(inum).and_then(VsfsInode::kind)
    }

    #[inline]
    pub fn is_dir(&self, inum: u32) -> bool {
        self.kind(inum) == Some(InodeKind::Dir)
    }

    /// `(inum, record)` for `1..inode_count`; slot 0 is reserved.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &VsfsInode)> + '_ {
        self.inodes
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, inode)| (i as u32, inode))
    }

    /// In-use inodes of a valid kind.
    pub fn in_use(&self) -> impl Iterator<Item = (u32, &VsfsInode)> + '_ {
        self.iter()
            .filter(|(_, inode)| !matches!(inode.kind(), None | Some(InodeKind::Unused)))
    }

    /// Directory inodes.
    pub fn dirs(&self) -> impl Iterator<Item = u32> + '_ {
        self.iter()
            .filter(|(_, inode)| inode.is_dir())
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::builder::ImageBuilder;

    fn load(b: &ImageBuilder) -> InodeTable {
        let mut io = MemImageIO::new(b.as_bytes());
        InodeTable::load(&mut io, b.meta()).unwrap()
    }

    #[test]
    fn test_iter_order_and_roles() {
        let mut b = ImageBuilder::new(1024, 32).unwrap();
        let f = b.add_file(ROOT_INO, "f", NDIRECT + 2).unwrap();
        let table = load(&b);

        let refs: Vec<BlockRef> = table.blocks(f).unwrap().iter().collect();
        assert_eq!(refs.len(), NDIRECT + 1 + 2);
        assert_eq!(refs[0].role, BlockRole::Direct(0));
        assert_eq!(refs[NDIRECT].role, BlockRole::Indirect);
        assert_eq!(refs[NDIRECT + 1].role, BlockRole::Mapped(0));
        assert_eq!(refs[NDIRECT + 2].role, BlockRole::Mapped(1));

        let data: Vec<u32> = table.blocks(f).unwrap().data_blocks().collect();
        assert_eq!(data.len(), NDIRECT + 2);
        assert!(!data.contains(&b.inode(f).indirect));
    }

    #[test]
    fn test_skips_zero_slots() {
        let mut b = ImageBuilder::new(256, 16).unwrap();
        let f = b.add_file(ROOT_INO, "f", 2).unwrap();
        let second = b.inode(f).addrs[1];
        b.set_direct(f, 1, 0);
        b.set_direct(f, 5, second);
        let table = load(&b);

        let roles: Vec<BlockRole> = table.blocks(f).unwrap().iter().map(|r| r.role).collect();
        assert_eq!(roles, vec![BlockRole::Direct(0), BlockRole::Direct(5)]);
    }

    #[test]
    fn test_out_of_range_indirect_not_read() {
        let mut b = ImageBuilder::new(256, 16).unwrap();
        let f = b.add_file(ROOT_INO, "f", 1).unwrap();
        b.set_indirect(f, 5000);
        let table = load(&b);

        let blocks = table.blocks(f).unwrap();
        assert!(blocks.mapped.is_empty());
        assert_eq!(blocks.iter().last().map(|r| r.addr), Some(5000));
    }

    #[test]
    fn test_kinds() {
        let mut b = ImageBuilder::new(256, 16).unwrap();
        let d = b.add_dir(ROOT_INO, "d").unwrap();
        b.set_kind(5, 9);
        let table = load(&b);

        assert_eq!(table.len(), 16);
        assert!(table.is_dir(ROOT_INO));
        assert!(table.is_dir(d));
        assert_eq!(table.kind(5), None);
        assert_eq!(table.kind(4), Some(InodeKind::Unused));
        assert_eq!(table.kind(99), None);
        assert_eq!(table.dirs().collect::<Vec<_>>(), vec![ROOT_INO, d]);
        assert_eq!(table.in_use().count(), 2);
    }
}
