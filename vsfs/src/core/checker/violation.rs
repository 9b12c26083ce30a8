// SPDX-License-Identifier: MIT

use core::fmt;

/// A structural inconsistency found in the image.
///
/// Every kind has a stable short code and a message prefix unique to the kind;
/// the rest of the rendered line carries the offending indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// A read ran past the end of the image.
    CorruptImage { offset: u64, len: usize },
    /// Superblock geometry does not describe this image.
    BadSuperblock { reason: &'static str },
    BadInodeType { inode: u32, kind: i16 },
    RootMissing,
    MalformedDirectory { inode: u32, reason: &'static str },
    BadBlockAddress { inode: u32, addr: u32, limit: u32 },
    DuplicateBlockUse { block: u32, first_owner: u32, claimant: u32 },
    Bitmap(BitmapInconsistency),
    OrphanInode { inode: u32 },
    /// `dir` is the first directory found holding an entry for `inode`.
    DanglingReference { inode: u32, dir: u32 },
    BadLinkCount { inode: u32, link_count: i16, refs: u32 },
    DirectoryReused { inode: u32, links: u32 },
    ParentMismatch { inode: u32, parent: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitmapInconsistency {
    UsedButUnmarked { block: u32, inode: u32 },
    MarkedButUnused { block: u32 },
}

impl Violation {
    pub fn code(&self) -> &'static str {
        match self {
            Violation::CorruptImage { .. } => "IMG.BOUNDS",
            Violation::BadSuperblock { .. } => "SB.GEOM",
            Violation::BadInodeType { .. } => "INO.TYPE",
            Violation::RootMissing => "ROOT.MISSING",
            Violation::MalformedDirectory { .. } => "DIR.FORMAT",
            Violation::BadBlockAddress { .. } => "INO.ADDR",
            Violation::DuplicateBlockUse { .. } => "BLK.DUP",
            Violation::Bitmap(BitmapInconsistency::UsedButUnmarked { .. }) => "BMP.UNMARKED",
            Violation::Bitmap(BitmapInconsistency::MarkedButUnused { .. }) => "BMP.UNUSED",
            Violation::OrphanInode { .. } => "INO.ORPHAN",
            Violation::DanglingReference { .. } => "INO.DANGLING",
            Violation::BadLinkCount { .. } => "LINK.COUNT",
            Violation::DirectoryReused { .. } => "DIR.REUSED",
            Violation::ParentMismatch { .. } => "DIR.PARENT",
        }
    }

    /// Message prefix, unique per kind.
    pub fn msg(&self) -> &'static str {
        match self {
            Violation::CorruptImage { .. } => "image is corrupt",
            Violation::BadSuperblock { .. } => "bad superblock",
            Violation::BadInodeType { .. } => "bad inode",
            Violation::RootMissing => "root directory does not exist",
            Violation::MalformedDirectory { .. } => "directory not properly formatted",
            Violation::BadBlockAddress { .. } => "bad address in inode",
            Violation::DuplicateBlockUse { .. } => "address used more than once",
            Violation::Bitmap(BitmapInconsistency::UsedButUnmarked { .. }) => {
                "address used by inode but marked free in bitmap"
            }
            Violation::Bitmap(BitmapInconsistency::MarkedButUnused { .. }) => {
                "bitmap marks block in use but it is not in use"
            }
            Violation::OrphanInode { .. } => "inode marked use but not found in a directory",
            Violation::DanglingReference { .. } => {
                "inode referred to in directory but marked free"
            }
            Violation::BadLinkCount { .. } => "bad reference count for file",
            Violation::DirectoryReused { .. } => {
                "directory appears more than once in file system"
            }
            Violation::ParentMismatch { .. } => "parent directory mismatch",
        }
    }
}

impl From<BitmapInconsistency> for Violation {
    #[inline]
    fn from(b: BitmapInconsistency) -> Self {
        Violation::Bitmap(b)
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        match *self {
            Violation::CorruptImage { offset, len } => {
                write!(f, " (read of {len} bytes at offset {offset})")
            }
            Violation::BadSuperblock { reason } => write!(f, " ({reason})"),
            Violation::BadInodeType { inode, kind } => {
                write!(f, " (inode {inode}, type {kind})")
            }
            Violation::RootMissing => Ok(()),
            Violation::MalformedDirectory { inode, reason } => {
                write!(f, " (inode {inode}: {reason})")
            }
            Violation::BadBlockAddress { inode, addr, limit } => {
                write!(f, " (inode {inode}, block {addr}, limit {limit})")
            }
            Violation::DuplicateBlockUse {
                block,
                first_owner,
                claimant,
            } => write!(
                f,
                " (block {block}, owned by inode {first_owner}, claimed by inode {claimant})"
            ),
            Violation::Bitmap(BitmapInconsistency::UsedButUnmarked { block, inode }) => {
                write!(f, " (block {block}, inode {inode})")
            }
            Violation::Bitmap(BitmapInconsistency::MarkedButUnused { block }) => {
                write!(f, " (block {block})")
            }
            Violation::OrphanInode { inode } => write!(f, " (inode {inode})"),
            Violation::DanglingReference { inode, dir } => {
                write!(f, " (inode {inode}, directory {dir})")
            }
            Violation::BadLinkCount {
                inode,
                link_count,
                refs,
            } => write!(
                f,
                " (inode {inode}, link count {link_count}, references {refs})"
            ),
            Violation::DirectoryReused { inode, links } => {
                write!(f, " (inode {inode}, {links} entries)")
            }
            Violation::ParentMismatch { inode, parent } => {
                write!(f, " (inode {inode}, parent {parent})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes_are_unique() {
        let all = [
            Violation::CorruptImage { offset: 0, len: 1 },
            Violation::BadSuperblock { reason: "x" },
            Violation::BadInodeType { inode: 2, kind: 7 },
            Violation::RootMissing,
            Violation::MalformedDirectory {
                inode: 1,
                reason: "x",
            },
            Violation::BadBlockAddress {
                inode: 3,
                addr: 9999,
                limit: 1024,
            },
            Violation::DuplicateBlockUse {
                block: 40,
                first_owner: 2,
                claimant: 3,
            },
            BitmapInconsistency::UsedButUnmarked { block: 1, inode: 2 }.into(),
            BitmapInconsistency::MarkedButUnused { block: 1 }.into(),
            Violation::OrphanInode { inode: 4 },
            Violation::DanglingReference { inode: 4, dir: 1 },
            Violation::BadLinkCount {
                inode: 4,
                link_count: 2,
                refs: 1,
            },
            Violation::DirectoryReused { inode: 5, links: 2 },
            Violation::ParentMismatch { inode: 5, parent: 1 },
        ];

        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert!(!a.msg().starts_with(b.msg()), "{a:?} vs {b:?}");
                assert!(!b.msg().starts_with(a.msg()), "{a:?} vs {b:?}");
                assert_ne!(a.code(), b.code());
            }
        }
    }

    #[test]
    fn test_display_carries_indices() {
        let v = Violation::BadLinkCount {
            inode: 7,
            link_count: 3,
            refs: 2,
        };
        assert_eq!(
            v.to_string(),
            "bad reference count for file (inode 7, link count 3, references 2)"
        );
        assert_eq!(Violation::RootMissing.to_string(), "root directory does not exist");
    }
}
