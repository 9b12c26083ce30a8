// SPDX-License-Identifier: MIT

use super::{CheckState, FsCheckerResult, VerifierOptionsLike, VerifyReport, Violation};

/// Address ranges, then inode kinds.
///
/// Addresses go first so an out-of-range address is the first violation of a
/// fail-fast run whatever else is wrong. Free slots and inodes of unknown kind
/// have their addresses ignored.
pub(super) fn check<O: VerifierOptionsLike>(
    state: &CheckState,
    opt: &O,
    rep: &mut VerifyReport,
) -> FsCheckerResult {
    let meta = &state.meta;

    for (inum, _) in state.table.in_use() {
        let Some(blocks) = state.table.blocks(inum) else {
            continue;
        };
        for r in blocks.iter().filter(|r| !meta.contains_block(r.addr)) {
            rep.raise(
                Violation::BadBlockAddress {
                    inode: inum,
                    addr: r.addr,
                    limit: meta.total_blocks,
                },
                opt.fail_fast(),
            )?;
        }
    }

    for (inum, inode) in state.table.iter() {
        if inode.kind().is_none() {
            rep.raise(
                Violation::BadInodeType {
                    inode: inum,
                    kind: inode.kind,
                },
                opt.fail_fast(),
            )?;
        }
    }
    Ok(())
}
