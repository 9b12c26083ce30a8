// SPDX-License-Identifier: MIT

use super::{
    BitmapInconsistency, CheckState, Finding, FsCheckerResult, ReachabilityTracker, VerifyReport,
    Violation, VsfsCheckOptions,
};

/// Block ownership and bitmap agreement.
///
/// Each in-range address of an in-use inode (the indirect block included) must
/// have a single owner and a set bitmap bit. Afterwards every data-region block
/// whose bit is set must have been claimed.
pub(super) fn audit(
    state: &CheckState,
    opt: &VsfsCheckOptions,
    rep: &mut VerifyReport,
) -> FsCheckerResult {
    let meta = &state.meta;
    let mut owners = vec![0u32; meta.total_blocks as usize];
    let mut claims = ReachabilityTracker::new(
        meta.data_start,
        (meta.total_blocks - meta.data_start) as usize,
    );

    for (inum, _) in state.table.in_use() {
        let Some(blocks) = state.table.blocks(inum) else {
            continue;
        };
        for r in blocks.iter().filter(|r| meta.contains_block(r.addr)) {
            let owner = &mut owners[r.addr as usize];
            if *owner != 0 {
                let first_owner = *owner;
                rep.raise(
                    Violation::DuplicateBlockUse {
                        block: r.addr,
                        first_owner,
                        claimant: inum,
                    },
                    opt.fail_fast,
                )?;
            } else {
                *owner = inum;
            }
            claims.mark(r.addr);

            if !state.bitmap.is_allocated(r.addr) {
                rep.raise(
                    BitmapInconsistency::UsedButUnmarked {
                        block: r.addr,
                        inode: inum,
                    },
                    opt.fail_fast,
                )?;
            }
        }
    }

    let limit = if opt.fail_fast {
        1
    } else {
        opt.orphan_sample_limit
    };
    let mut unused = Vec::new();
    let total = claims.for_each_orphan(|b| state.bitmap.is_allocated(b), limit, |b| unused.push(b));
    for block in unused {
        rep.raise(BitmapInconsistency::MarkedButUnused { block }, opt.fail_fast)?;
    }
    if total > limit {
        rep.push(Finding::warn(
            "BMP.SAMPLE",
            format!("{total} blocks marked but unused, {limit} reported"),
        ));
    }

    rep.push(Finding::info(
        "BLK.AUDIT",
        format!("{} data blocks claimed", claims.marked_count()),
    ));
    Ok(())
}
