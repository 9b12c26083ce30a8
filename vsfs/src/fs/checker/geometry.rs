// SPDX-License-Identifier: MIT

use vsio::prelude::*;

use super::{CheckState, Finding, FsCheckerResult, Violation, VerifyReport};
use crate::fs::{bitmap::BlockBitmap, meta::VsfsMeta, table::InodeTable};

/// Reads the superblock, validates the layout against the image and decodes
/// the inode table and bitmap.
///
/// A bad superblock stops the run in every mode: nothing after it can be
/// trusted.
pub(super) fn load<IO: ImageIO + ?Sized>(
    io: &mut IO,
    rep: &mut VerifyReport,
) -> FsCheckerResult<CheckState> {
    let meta = VsfsMeta::from_io(io)?;

    if let Some(reason) = geometry_error(&meta, io.len()) {
        rep.raise(Violation::BadSuperblock { reason }, true)?;
    }

    let expected_data = meta.total_blocks - meta.data_start;
    if meta.data_blocks != expected_data {
        rep.push(Finding::warn(
            "SB.DATA",
            format!(
                "superblock records {} data blocks, layout leaves {}",
                meta.data_blocks, expected_data
            ),
        ));
    }

    let table = InodeTable::load(io, &meta)?;
    let bitmap = BlockBitmap::load(io, &meta)?;

    rep.push(Finding::info(
        "SB.OK",
        format!(
            "{} blocks, {} inodes; inodes @{} ({} blocks), bitmap @{}, data @{}; {} blocks marked",
            meta.total_blocks,
            meta.inode_count,
            meta.inode_start,
            meta.inode_blocks,
            meta.bitmap_start,
            meta.data_start,
            bitmap.allocated_count()
        ),
    ));

    Ok(CheckState {
        meta,
        table,
        bitmap,
        tally: None,
    })
}

fn geometry_error(meta: &VsfsMeta, image_len: u64) -> Option<&'static str> {
    if meta.total_blocks == 0 {
        return Some("total_blocks is zero");
    }
    if meta.inode_count == 0 {
        return Some("inode_count is zero");
    }
    if meta.data_start > meta.total_blocks {
        return Some("inode table and bitmap exceed total_blocks");
    }
    if meta.required_len() > image_len {
        return Some("image is shorter than total_blocks");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::builder::ImageBuilder;
    use crate::fs::types::VsfsSuperblock;

    fn load_bytes(img: &[u8]) -> (FsCheckerResult<CheckState>, VerifyReport) {
        let mut io = MemImageIO::new(img);
        let mut rep = VerifyReport::default();
        let res = load(&mut io, &mut rep);
        (res, rep)
    }

    #[test]
    fn test_valid_geometry() {
        let b = ImageBuilder::new(128, 16).unwrap();
        let (res, rep) = load_bytes(b.as_bytes());
        let state = res.unwrap();

        assert!(rep.ok());
        assert_eq!(state.table.len(), 16);
        assert!(state.bitmap.is_allocated(state.meta.data_start));
    }

    #[test]
    fn test_truncated_image() {
        let b = ImageBuilder::new(128, 16).unwrap();
        let bytes = b.as_bytes();
        let (res, rep) = load_bytes(&bytes[..bytes.len() - 512]);

        assert!(res.is_err());
        assert_eq!(
            rep.first_violation(),
            Some(Violation::BadSuperblock {
                reason: "image is shorter than total_blocks"
            })
        );
    }

    #[test]
    fn test_oversized_inode_count() {
        let mut b = ImageBuilder::new(128, 16).unwrap();
        b.set_superblock(&VsfsSuperblock {
            total_blocks: 128,
            data_blocks: 100,
            inode_count: 100_000,
        });
        let (res, rep) = load_bytes(b.as_bytes());

        assert!(res.is_err());
        assert_eq!(rep.violations().next().map(|v| v.code()), Some("SB.GEOM"));
    }

    #[test]
    fn test_data_blocks_mismatch_is_warning() {
        let mut b = ImageBuilder::new(128, 16).unwrap();
        let mut sb = b.meta().superblock();
        sb.data_blocks += 1;
        b.set_superblock(&sb);
        let (res, rep) = load_bytes(b.as_bytes());

        assert!(res.is_ok());
        assert!(rep.ok());
        assert_eq!(rep.count(crate::core::checker::Severity::Warn), 1);
    }

    #[test]
    fn test_missing_superblock() {
        let (res, _) = load_bytes(&[0u8; 100]);
        assert_eq!(
            res.err().and_then(|e| e.out_of_bounds()),
            Some((512, 12))
        );
    }
}
