// SPDX-License-Identifier: MIT

use vsio::prelude::*;

use super::{FsCheckerResult, RefTally, VerifyReport, Violation, WalkerStats};
use crate::core::meta::FsMeta;
use crate::fs::{
    meta::VsfsMeta,
    table::InodeTable,
    types::{DirBlock, InodeKind},
};

/// Reads block `addr` as a block of directory entries.
pub(super) fn read_dir_block<IO: ImageIO + ?Sized>(
    io: &mut IO,
    meta: &VsfsMeta,
    addr: u32,
) -> FsCheckerResult<DirBlock> {
    Ok(io.read_struct::<DirBlock>(meta.unit_offset(addr))?)
}

/// Scans every directory inode and tallies the entries it holds.
pub struct VsfsWalker<'a, IO: ImageIO + ?Sized> {
    io: &'a mut IO,
    meta: &'a VsfsMeta,
    table: &'a InodeTable,
    tally: RefTally,
}

impl<'a, IO: ImageIO + ?Sized> VsfsWalker<'a, IO> {
    pub fn new(io: &'a mut IO, meta: &'a VsfsMeta, table: &'a InodeTable) -> Self {
        Self {
            io,
            meta,
            table,
            tally: RefTally::new(table.len()),
        }
    }

    pub fn into_tally(self) -> RefTally {
        self.tally
    }

    /// Visits every directory in inode order.
    ///
    /// Blocks outside the image are skipped; the inode phase reports them.
    pub fn walk(
        &mut self,
        fail_fast: bool,
        rep: &mut VerifyReport,
        stats: &mut WalkerStats,
    ) -> FsCheckerResult {
        let table = self.table;
        for dir in table.dirs() {
            stats.dirs_visited += 1;
            self.walk_dir(dir, fail_fast, rep, stats)?;
        }
        Ok(())
    }

    fn walk_dir(
        &mut self,
        dir: u32,
        fail_fast: bool,
        rep: &mut VerifyReport,
        stats: &mut WalkerStats,
    ) -> FsCheckerResult {
        let table = self.table;
        let meta = self.meta;
        let Some(blocks) = table.blocks(dir) else {
            return Ok(());
        };

        if blocks.first_block().is_none() {
            return rep.raise(
                Violation::MalformedDirectory {
                    inode: dir,
                    reason: "no data block",
                },
                fail_fast,
            );
        }

        for (idx, addr) in blocks.data_blocks().enumerate() {
            if !meta.contains_block(addr) {
                continue;
            }
            let entries = read_dir_block(self.io, meta, addr)?;
            stats.blocks_read += 1;

            // data_blocks() starts with the first direct slot.
            let is_first = idx == 0;
            if is_first {
                self.check_format(dir, &entries, fail_fast, rep)?;
            }

            for (slot, e) in entries.iter().enumerate() {
                if e.is_free() {
                    continue;
                }
                stats.entries_scanned += 1;
                let target = e.inum as u32;
                if target >= meta.inode_count {
                    rep.raise(
                        Violation::DanglingReference {
                            inode: target,
                            dir,
                        },
                        fail_fast,
                    )?;
                    continue;
                }

                self.tally.reference(dir, target);
                match table.kind(target) {
                    Some(InodeKind::File) => {
                        stats.files_found += 1;
                        self.tally.file_refs[target as usize] += 1;
                    }
                    Some(InodeKind::Dir) if !(is_first && slot < 2) => {
                        let links = &mut self.tally.dir_links[target as usize];
                        *links += 1;
                        if *links == 2 {
                            rep.raise(
                                Violation::DirectoryReused {
                                    inode: target,
                                    links: 2,
                                },
                                fail_fast,
                            )?;
                        }
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Slot 0 is `.`, slot 1 is `..`; `.` names the directory itself.
    ///
    /// The root's first block is left to the root phase.
    fn check_format(
        &self,
        dir: u32,
        entries: &DirBlock,
        fail_fast: bool,
        rep: &mut VerifyReport,
    ) -> FsCheckerResult {
        if dir == self.meta.root_unit() {
            return Ok(());
        }
        let reason = if !entries[0].is_dot() {
            Some("first entry is not \".\"")
        } else if !entries[1].is_dotdot() {
            Some("second entry is not \"..\"")
        } else if entries[0].inum as u32 != dir {
            Some("\".\" does not name the directory")
        } else {
            None
        };

        if let Some(reason) = reason {
            rep.raise(Violation::MalformedDirectory { inode: dir, reason }, fail_fast)?;
        }
        Ok(())
    }
}

/// Whether some entry of `parent`, its own `.`/`..` slots excluded, names `child`.
pub(super) fn dir_names<IO: ImageIO + ?Sized>(
    io: &mut IO,
    meta: &VsfsMeta,
    table: &InodeTable,
    parent: u32,
    child: u32,
) -> FsCheckerResult<bool> {
    let Some(blocks) = table.blocks(parent) else {
        return Ok(false);
    };
    let has_first = blocks.first_block().is_some();

    for (idx, addr) in blocks.data_blocks().enumerate() {
        if !meta.contains_block(addr) {
            continue;
        }
        let entries = read_dir_block(io, meta, addr)?;
        let skip = if idx == 0 && has_first { 2 } else { 0 };
        if entries.iter().skip(skip).any(|e| e.inum as u32 == child) {
            return Ok(true);
        }
    }
    Ok(false)
}
