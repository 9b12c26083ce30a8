// SPDX-License-Identifier: MIT

//! In-memory image construction for test fixtures.
//!
//! Produces well-formed images (xv6 `mkfs` conventions) and exposes the raw
//! setters tests need to corrupt them afterwards.

use zerocopy::{FromBytes, Immutable, IntoBytes};

use crate::core::errors::{FsError, FsResult};
use crate::core::utils::bitmap::BitmapOps;
use crate::ensure;
use crate::fs::constant::*;
use crate::fs::meta::VsfsMeta;
use crate::fs::types::{InodeKind, VsfsDirEntry, VsfsInode, VsfsSuperblock};

#[derive(Debug, Clone)]
pub struct ImageBuilder {
    meta: VsfsMeta,
    image: Vec<u8>,
}

impl ImageBuilder {
    /// Formats an image with an empty root directory.
    ///
    /// Metadata blocks are marked allocated in the bitmap; the root gets one
    /// data block holding `.` and `..`, both naming inode 1.
    pub fn new(total_blocks: u32, inode_count: u32) -> FsResult<Self> {
        ensure!(inode_count > ROOT_INO, FsError::Other("need room for the root inode"));
        let meta = VsfsMeta::new(total_blocks, inode_count);
        ensure!(
            meta.data_start < total_blocks,
            FsError::Other("no data region left")
        );

        let mut b = Self {
            meta,
            image: vec![0u8; meta.required_len() as usize],
        };
        b.write(VsfsMeta::superblock_offset(), &meta.superblock());
        for block in 0..meta.data_start {
            b.set_bitmap(block, true);
        }

        let root_block = b.alloc_block()?;
        let mut root = VsfsInode::new(InodeKind::Dir);
        root.addrs[0] = root_block;
        root.size = (2 * DIRENT_SIZE) as u32;
        b.write_inode(ROOT_INO, &root);
        b.set_entry(root_block, 0, VsfsDirEntry::new(ROOT_INO as u16, DOT_NAME));
        b.set_entry(root_block, 1, VsfsDirEntry::new(ROOT_INO as u16, DOTDOT_NAME));
        Ok(b)
    }

    pub fn meta(&self) -> &VsfsMeta {
        &self.meta
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.image
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.image
    }

    // --- raw access ---

    fn write<T: IntoBytes + Immutable>(&mut self, offset: u64, value: &T) {
        let bytes = value.as_bytes();
        let start = offset as usize;
        self.image[start..start + bytes.len()].copy_from_slice(bytes);
    }

    fn read<T: FromBytes + IntoBytes>(&self, offset: u64) -> T {
        let mut value = T::new_zeroed();
        let start = offset as usize;
        let len = size_of::<T>();
        value
            .as_mut_bytes()
            .copy_from_slice(&self.image[start..start + len]);
        value
    }

    fn entry_offset(&self, block: u32, slot: usize) -> u64 {
        block as u64 * BSIZE as u64 + (slot * DIRENT_SIZE) as u64
    }

    pub fn inode(&self, inum: u32) -> VsfsInode {
        self.read(self.meta.inode_offset(inum))
    }

    pub fn write_inode(&mut self, inum: u32, inode: &VsfsInode) {
        self.write(self.meta.inode_offset(inum), inode);
    }

    pub fn update_inode(&mut self, inum: u32, f: impl FnOnce(&mut VsfsInode)) {
        let mut inode = self.inode(inum);
        f(&mut inode);
        self.write_inode(inum, &inode);
    }

    pub fn set_superblock(&mut self, sb: &VsfsSuperblock) {
        self.write(VsfsMeta::superblock_offset(), sb);
    }

    pub fn set_bitmap(&mut self, block: u32, allocated: bool) {
        let (start, _) = self.meta.bit_of(0);
        let start = start as usize;
        let len = self.meta.bitmap_len();
        self.image[start..start + len].set_bit(block as usize, allocated);
    }

    pub fn is_marked(&self, block: u32) -> bool {
        let (start, _) = self.meta.bit_of(0);
        let start = start as usize;
        self.image[start..start + self.meta.bitmap_len()].get_bit(block as usize)
    }

    pub fn entry(&self, block: u32, slot: usize) -> VsfsDirEntry {
        self.read(self.entry_offset(block, slot))
    }

    pub fn set_entry(&mut self, block: u32, slot: usize, entry: VsfsDirEntry) {
        self.write(self.entry_offset(block, slot), &entry);
    }

    pub fn set_kind(&mut self, inum: u32, raw: i16) {
        self.update_inode(inum, |i| i.kind = raw);
    }

    pub fn set_nlink(&mut self, inum: u32, nlink: i16) {
        self.update_inode(inum, |i| i.nlink = nlink);
    }

    pub fn set_direct(&mut self, inum: u32, slot: usize, addr: u32) {
        self.update_inode(inum, |i| i.addrs[slot] = addr);
    }

    pub fn set_indirect(&mut self, inum: u32, addr: u32) {
        self.update_inode(inum, |i| i.indirect = addr);
    }

    /// Overwrites slot `slot` of the indirect block of `inum`.
    pub fn set_mapped(&mut self, inum: u32, slot: usize, addr: u32) {
        let indirect = self.inode(inum).indirect;
        let off = indirect as u64 * BSIZE as u64 + (slot * size_of::<u32>()) as u64;
        self.write(off, &addr);
    }

    /// First content block of `inum` (0 when none).
    pub fn first_block(&self, inum: u32) -> u32 {
        self.inode(inum).addrs[0]
    }

    /// Rewrites the `..` slot of directory `dir`.
    pub fn set_dotdot(&mut self, dir: u32, parent: u32) {
        let block = self.first_block(dir);
        self.set_entry(block, 1, VsfsDirEntry::new(parent as u16, DOTDOT_NAME));
    }

    // --- allocation ---

    /// Takes the lowest free data block, marks it and zeroes it.
    pub fn alloc_block(&mut self) -> FsResult<u32> {
        let (start, _) = self.meta.bit_of(0);
        let start = start as usize;
        let bitmap = &self.image[start..start + self.meta.bitmap_len()];
        let block = bitmap
            .find_first_zero(self.meta.data_start as usize)
            .map(|b| b as u32)
            .filter(|&b| b < self.meta.total_blocks)
            .ok_or(FsError::Other("no free data block"))?;

        self.set_bitmap(block, true);
        let off = block as usize * BSIZE;
        self.image[off..off + BSIZE].fill(0);
        Ok(block)
    }

    pub fn alloc_inode(&mut self, kind: InodeKind) -> FsResult<u32> {
        let inum = (ROOT_INO + 1..self.meta.inode_count)
            .find(|&i| !self.inode(i).is_allocated())
            .ok_or(FsError::Other("no free inode"))?;
        self.write_inode(inum, &VsfsInode::new(kind));
        Ok(inum)
    }

    /// Appends a content block to `inum`, spilling into the indirect block.
    pub fn append_block(&mut self, inum: u32) -> FsResult<u32> {
        let inode = self.inode(inum);
        if let Some(slot) = inode.addrs.iter().position(|&a| a == 0) {
            let block = self.alloc_block()?;
            self.set_direct(inum, slot, block);
            return Ok(block);
        }

        let indirect = if inode.indirect == 0 {
            let ind = self.alloc_block()?;
            self.set_indirect(inum, ind);
            ind
        } else {
            inode.indirect
        };
        let mut table: [u32; NINDIRECT] = self.read(indirect as u64 * BSIZE as u64);
        let slot = table
            .iter()
            .position(|&a| a == 0)
            .ok_or(FsError::Other("file too large"))?;
        let block = self.alloc_block()?;
        table[slot] = block;
        self.write(indirect as u64 * BSIZE as u64, &table);
        Ok(block)
    }

    // --- tree ---

    /// Regular file with `nblocks` content blocks, linked once from `parent`.
    pub fn add_file(&mut self, parent: u32, name: &str, nblocks: usize) -> FsResult<u32> {
        ensure!(nblocks <= MAX_FILE_BLOCKS, FsError::Other("file too large"));
        let inum = self.alloc_inode(InodeKind::File)?;
        for _ in 0..nblocks {
            self.append_block(inum)?;
        }
        self.update_inode(inum, |i| i.size = (nblocks * BSIZE) as u32);
        self.add_entry(parent, name, inum)?;
        Ok(inum)
    }

    /// Subdirectory of `parent` holding `.` and `..`.
    pub fn add_dir(&mut self, parent: u32, name: &str) -> FsResult<u32> {
        let inum = self.alloc_inode(InodeKind::Dir)?;
        let block = self.append_block(inum)?;
        self.update_inode(inum, |i| i.size = (2 * DIRENT_SIZE) as u32);
        self.set_entry(block, 0, VsfsDirEntry::new(inum as u16, DOT_NAME));
        self.set_entry(block, 1, VsfsDirEntry::new(parent as u16, DOTDOT_NAME));
        self.add_entry(parent, name, inum)?;
        Ok(inum)
    }

    /// Writes `name -> inum` into the first free slot of `dir`, growing it if full.
    ///
    /// Link counts are left alone.
    pub fn add_entry(&mut self, dir: u32, name: &str, inum: u32) -> FsResult {
        let entry = VsfsDirEntry::new(inum as u16, name.as_bytes());
        let blocks: Vec<u32> = self
            .inode(dir)
            .addrs
            .iter()
            .copied()
            .filter(|&a| a != 0)
            .collect();

        for block in blocks {
            if let Some(slot) = (0..DIRENTS_PER_BLOCK).find(|&s| self.entry(block, s).is_free()) {
                self.set_entry(block, slot, entry);
                return Ok(());
            }
        }

        let block = self.append_block(dir)?;
        self.set_entry(block, 0, entry);
        Ok(())
    }

    /// Clears the first entry of `dir` named `name`; `false` when absent.
    pub fn remove_entry(&mut self, dir: u32, name: &str) -> bool {
        let blocks: Vec<u32> = self
            .inode(dir)
            .addrs
            .iter()
            .copied()
            .filter(|&a| a != 0)
            .collect();

        for block in blocks {
            for slot in 0..DIRENTS_PER_BLOCK {
                let e = self.entry(block, slot);
                if !e.is_free() && e.name_bytes() == name.as_bytes() {
                    self.set_entry(block, slot, VsfsDirEntry::default());
                    return true;
                }
            }
        }
        false
    }

    /// Hard link: new entry plus link count bump.
    pub fn link(&mut self, dir: u32, name: &str, inum: u32) -> FsResult {
        self.add_entry(dir, name, inum)?;
        self.update_inode(inum, |i| i.nlink += 1);
        Ok(())
    }
}
