// SPDX-License-Identifier: MIT

use vsio::prelude::*;

use super::walker::read_dir_block;
use super::{CheckState, FsCheckerResult, VerifierOptionsLike, VerifyReport, Violation};
use crate::fs::constant::ROOT_INO;

/// Inode 1 is a directory whose first block starts with `.` and `..`, both naming 1.
pub(super) fn check<IO: ImageIO + ?Sized, O: VerifierOptionsLike>(
    io: &mut IO,
    state: &CheckState,
    opt: &O,
    rep: &mut VerifyReport,
) -> FsCheckerResult {
    if !state.table.is_dir(ROOT_INO) {
        return rep.raise(Violation::RootMissing, opt.fail_fast());
    }

    let malformed = |reason| Violation::MalformedDirectory {
        inode: ROOT_INO,
        reason,
    };

    let first = state.table.blocks(ROOT_INO).and_then(|b| b.first_block());
    let Some(first) = first else {
        return rep.raise(malformed("no data block"), opt.fail_fast());
    };
    if !state.meta.contains_block(first) {
        // Reported as a bad address by the inode phase.
        return Ok(());
    }

    let entries = read_dir_block(io, &state.meta, first)?;
    let (dot, dotdot) = (&entries[0], &entries[1]);
    if !dot.is_dot() {
        rep.raise(malformed("first entry is not \".\""), opt.fail_fast())?;
    } else if dot.inum as u32 != ROOT_INO {
        rep.raise(malformed("\".\" does not name the root"), opt.fail_fast())?;
    }
    if !dotdot.is_dotdot() {
        rep.raise(malformed("second entry is not \"..\""), opt.fail_fast())?;
    } else if dotdot.inum as u32 != ROOT_INO {
        rep.raise(malformed("\"..\" does not name the root"), opt.fail_fast())?;
    }
    Ok(())
}
