// SPDX-License-Identifier: MIT

use vsio::prelude::*;

use super::walker::{dir_names, read_dir_block};
use super::{CheckState, FsCheckerResult, RefTally, VerifierOptionsLike, VerifyReport, Violation};
use crate::fs::{constant::ROOT_INO, table::InodeTable, types::InodeKind};

/// Allocation state against the directory tallies.
pub(super) fn reconcile<O: VerifierOptionsLike>(
    table: &InodeTable,
    tally: &RefTally,
    opt: &O,
    rep: &mut VerifyReport,
) -> FsCheckerResult {
    for (inum, inode) in table.iter() {
        // Unknown kinds were reported by the inode phase.
        let Some(kind) = inode.kind() else {
            continue;
        };
        let refs = tally.referenced(inum);
        let used = kind != InodeKind::Unused;

        if used && refs == 0 {
            rep.raise(Violation::OrphanInode { inode: inum }, opt.fail_fast())?;
        }
        if !used && refs > 0 {
            rep.raise(
                Violation::DanglingReference {
                    inode: inum,
                    dir: tally.referrer[inum as usize],
                },
                opt.fail_fast(),
            )?;
        }
        if kind == InodeKind::File {
            let file_refs = tally.file_refs[inum as usize];
            if i64::from(inode.nlink) != i64::from(file_refs) {
                rep.raise(
                    Violation::BadLinkCount {
                        inode: inum,
                        link_count: inode.nlink,
                        refs: file_refs,
                    },
                    opt.fail_fast(),
                )?;
            }
        }
    }
    Ok(())
}

/// Every non-root directory names an existing directory as `..`, and that
/// directory holds an entry back to it.
pub(super) fn check_parents<IO: ImageIO + ?Sized, O: VerifierOptionsLike>(
    io: &mut IO,
    state: &CheckState,
    opt: &O,
    rep: &mut VerifyReport,
) -> FsCheckerResult {
    let (meta, table) = (&state.meta, &state.table);

    for dir in table.dirs().filter(|&d| d != ROOT_INO) {
        let first = table.blocks(dir).and_then(|b| b.first_block());
        let Some(first) = first.filter(|&b| meta.contains_block(b)) else {
            continue;
        };
        let parent = read_dir_block(io, meta, first)?[1].inum as u32;

        let linked = parent != dir
            && parent != 0
            && table.is_dir(parent)
            && dir_names(io, meta, table, parent, dir)?;
        if !linked {
            rep.raise(Violation::ParentMismatch { inode: dir, parent }, opt.fail_fast())?;
        }
    }
    Ok(())
}
