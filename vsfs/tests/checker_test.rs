// SPDX-License-Identifier: MIT

use std::collections::BTreeSet;
use std::io::Write;

use vsfs::vsfs::*;

fn check_with(bytes: &[u8], opt: &VsfsCheckOptions) -> VerifyReport {
    let mut io = MemImageIO::new(bytes);
    VsfsChecker::new(&mut io).check_with(opt).unwrap()
}

fn check(bytes: &[u8]) -> VerifyReport {
    check_with(bytes, &VsfsCheckOptions::default())
}

fn check_all(bytes: &[u8]) -> VerifyReport {
    check_with(bytes, &VsfsCheckOptions::collect_all())
}

/// Root plus one 3-block file linked once.
fn scenario_a() -> (ImageBuilder, u32) {
    let mut b = ImageBuilder::new(1024, 200).unwrap();
    let f = b.add_file(ROOT_INO, "file", 3).unwrap();
    (b, f)
}

fn populated() -> ImageBuilder {
    let mut b = ImageBuilder::new(1024, 200).unwrap();
    let d = b.add_dir(ROOT_INO, "d").unwrap();
    let e = b.add_dir(d, "e").unwrap();
    let f = b.add_file(d, "f", 2).unwrap();
    b.add_file(e, "deep", 1).unwrap();
    b.add_file(ROOT_INO, "big", NDIRECT + 5).unwrap();
    b.link(ROOT_INO, "f2", f).unwrap();

    let dev = b.alloc_inode(InodeKind::Device).unwrap();
    b.add_entry(ROOT_INO, "console", dev).unwrap();
    for i in 0..40 {
        b.add_file(ROOT_INO, &format!("small{i}"), 1).unwrap();
    }
    b
}

#[test]
fn test_valid_images_pass() {
    let (a, _) = scenario_a();
    let rep = check(a.as_bytes());
    assert!(rep.ok(), "{rep}");
    assert_eq!(rep.errors_only().to_string(), "");

    let b = populated();
    let mut io = MemImageIO::new(b.as_bytes());
    let mut checker = VsfsChecker::new(&mut io);
    let rep = checker.check_all().unwrap();
    assert!(rep.ok(), "{rep}");
    assert_eq!(checker.stats.dirs_visited, 3);
    assert_eq!(checker.meta().map(|m| m.data_start), Some(28));
    assert!(checker.fast_check().is_ok());

    assert!(check_all(b.as_bytes()).ok());
}

#[test]
fn test_root_passes_for_small_inode_counts() {
    for n in [2, 3, 8, 9, 64] {
        let b = ImageBuilder::new(128, n).unwrap();
        let rep = check(b.as_bytes());
        assert!(rep.ok(), "inode_count {n}: {rep}");
    }
}

#[test]
fn test_scenario_b_bad_link_count() {
    let (mut b, f) = scenario_a();
    b.set_nlink(f, 2);

    let rep = check(b.as_bytes());
    assert_eq!(
        rep.first_violation(),
        Some(Violation::BadLinkCount {
            inode: f,
            link_count: 2,
            refs: 1
        })
    );
    assert!(
        rep.errors_only()
            .to_string()
            .starts_with("ERROR: bad reference count for file")
    );
}

#[test]
fn test_link_count_off_by_one_either_way() {
    let b = populated();
    let files: Vec<u32> = (1..200)
        .filter(|&i| b.inode(i).is_file())
        .take(5)
        .collect();

    for f in files {
        let nlink = b.inode(f).nlink;
        for delta in [-1i16, 1] {
            let mut bad = b.clone();
            bad.set_nlink(f, nlink + delta);
            let rep = check(bad.as_bytes());
            assert!(
                matches!(rep.first_violation(), Some(Violation::BadLinkCount { inode, .. }) if inode == f),
                "inode {f} delta {delta}: {rep}"
            );
        }
    }
}

#[test]
fn test_scenario_c_duplicate_block() {
    let mut b = ImageBuilder::new(1024, 200).unwrap();
    let first = b.add_file(ROOT_INO, "a", 3).unwrap();
    let second = b.add_file(ROOT_INO, "b", 1).unwrap();
    b.set_direct(first, 0, 40);
    b.set_direct(second, 0, 40);
    b.set_bitmap(40, true);

    let rep = check(b.as_bytes());
    assert_eq!(
        rep.first_violation(),
        Some(Violation::DuplicateBlockUse {
            block: 40,
            first_owner: first,
            claimant: second
        })
    );
}

#[test]
fn test_duplicate_within_one_inode() {
    let (mut b, f) = scenario_a();
    let blk = b.inode(f).addrs[0];
    b.set_direct(f, 3, blk);

    let rep = check(b.as_bytes());
    assert_eq!(
        rep.first_violation(),
        Some(Violation::DuplicateBlockUse {
            block: blk,
            first_owner: f,
            claimant: f
        })
    );
}

#[test]
fn test_scenario_d_marked_but_unused() {
    let (mut b, _) = scenario_a();
    b.set_bitmap(100, true);

    let rep = check(b.as_bytes());
    assert_eq!(
        rep.first_violation(),
        Some(BitmapInconsistency::MarkedButUnused { block: 100 }.into())
    );
}

#[test]
fn test_used_but_unmarked() {
    let (mut b, f) = scenario_a();
    let blk = b.inode(f).addrs[2];
    b.set_bitmap(blk, false);

    let rep = check(b.as_bytes());
    assert_eq!(
        rep.first_violation(),
        Some(BitmapInconsistency::UsedButUnmarked { block: blk, inode: f }.into())
    );
}

#[test]
fn test_bitmap_findings_match_claims() {
    let mut b = populated();
    let meta = *b.meta();
    let mut flipped = Vec::new();
    for blk in [meta.data_start + 3, meta.data_start + 17, 500, 501, 900] {
        let marked = b.is_marked(blk);
        b.set_bitmap(blk, !marked);
        flipped.push(blk);
    }

    let mut io = MemImageIO::new(b.as_bytes());
    let table = InodeTable::load(&mut io, &meta).unwrap();
    let bitmap = BlockBitmap::load(&mut io, &meta).unwrap();
    let claimed: BTreeSet<u32> = table
        .in_use()
        .flat_map(|(i, _)| table.blocks(i).unwrap().iter().map(|r| r.addr))
        .collect();

    let rep = check_all(b.as_bytes());
    let mut unmarked = BTreeSet::new();
    let mut unused = BTreeSet::new();
    for v in rep.violations() {
        match v {
            Violation::Bitmap(BitmapInconsistency::UsedButUnmarked { block, .. }) => {
                unmarked.insert(block);
            }
            Violation::Bitmap(BitmapInconsistency::MarkedButUnused { block }) => {
                unused.insert(block);
            }
            _ => {}
        }
    }

    for blk in meta.data_start..meta.total_blocks {
        let claim = claimed.contains(&blk);
        let bit = bitmap.is_allocated(blk);
        assert_eq!(unmarked.contains(&blk), claim && !bit, "block {blk}");
        assert_eq!(unused.contains(&blk), bit && !claim, "block {blk}");
    }
    assert!(!unmarked.is_empty() && !unused.is_empty());
    assert_eq!(unmarked.len() + unused.len(), flipped.len());
}

#[test]
fn test_bad_address_reported_first() {
    let (mut b, f) = scenario_a();
    b.set_nlink(f, 5);
    b.set_bitmap(700, true);
    b.set_kind(9, 42);
    b.set_direct(f, 1, 5000);

    let rep = check(b.as_bytes());
    assert_eq!(
        rep.first_violation(),
        Some(Violation::BadBlockAddress {
            inode: f,
            addr: 5000,
            limit: 1024
        })
    );
}

#[test]
fn test_bad_indirect_addresses() {
    let mut b = ImageBuilder::new(1024, 200).unwrap();
    let big = b.add_file(ROOT_INO, "big", NDIRECT + 2).unwrap();
    b.set_mapped(big, 1, 1024);
    let rep = check(b.as_bytes());
    assert_eq!(
        rep.first_violation(),
        Some(Violation::BadBlockAddress {
            inode: big,
            addr: 1024,
            limit: 1024
        })
    );

    // Never dereferenced.
    b.set_indirect(big, u32::MAX);
    let rep = check_all(b.as_bytes());
    assert!(rep.violations().any(|v| v
        == Violation::BadBlockAddress {
            inode: big,
            addr: u32::MAX,
            limit: 1024
        }));
}

#[test]
fn test_parent_mismatch_on_missing_forward_entry() {
    let mut b = populated();
    let d = (2..200).find(|&i| b.inode(i).is_dir()).unwrap();
    assert!(b.remove_entry(ROOT_INO, "d"));

    let rep = check(b.as_bytes());
    assert_eq!(
        rep.first_violation(),
        Some(Violation::ParentMismatch {
            inode: d,
            parent: ROOT_INO
        })
    );
}

#[test]
fn test_parent_mismatch_on_bad_dotdot() {
    let mut b = ImageBuilder::new(256, 32).unwrap();
    let d = b.add_dir(ROOT_INO, "d").unwrap();
    let f = b.add_file(ROOT_INO, "f", 1).unwrap();

    let mut own = b.clone();
    own.set_dotdot(d, d);
    assert_eq!(
        check(own.as_bytes()).first_violation(),
        Some(Violation::ParentMismatch {
            inode: d,
            parent: d
        })
    );

    let mut to_file = b.clone();
    to_file.set_dotdot(d, f);
    assert!(
        check_all(to_file.as_bytes())
            .violations()
            .any(|v| v == Violation::ParentMismatch { inode: d, parent: f })
    );
}

#[test]
fn test_orphan_inode() {
    let (mut b, _) = scenario_a();
    let lost = b.alloc_inode(InodeKind::File).unwrap();

    let rep = check(b.as_bytes());
    assert_eq!(
        rep.first_violation(),
        Some(Violation::OrphanInode { inode: lost })
    );
}

#[test]
fn test_dangling_references() {
    let (mut b, _) = scenario_a();
    b.add_entry(ROOT_INO, "ghost", 7).unwrap();
    assert_eq!(
        check(b.as_bytes()).first_violation(),
        Some(Violation::DanglingReference {
            inode: 7,
            dir: ROOT_INO
        })
    );

    let (mut b, _) = scenario_a();
    b.add_entry(ROOT_INO, "far", 500).unwrap();
    assert_eq!(
        check(b.as_bytes()).first_violation(),
        Some(Violation::DanglingReference {
            inode: 500,
            dir: ROOT_INO
        })
    );
}

#[test]
fn test_directory_reused() {
    let mut b = ImageBuilder::new(256, 32).unwrap();
    let d = b.add_dir(ROOT_INO, "d").unwrap();
    b.add_entry(ROOT_INO, "again", d).unwrap();

    let rep = check(b.as_bytes());
    assert_eq!(
        rep.first_violation(),
        Some(Violation::DirectoryReused { inode: d, links: 2 })
    );
}

#[test]
fn test_file_hard_links_allowed() {
    let (mut b, f) = scenario_a();
    let d = b.add_dir(ROOT_INO, "d").unwrap();
    b.link(d, "alias", f).unwrap();
    b.link(ROOT_INO, "alias2", f).unwrap();

    assert!(check(b.as_bytes()).ok());
}

#[test]
fn test_malformed_directories() {
    let mut b = ImageBuilder::new(256, 32).unwrap();
    let d = b.add_dir(ROOT_INO, "d").unwrap();
    let blk = b.first_block(d);

    let mut renamed = b.clone();
    renamed.set_entry(blk, 0, VsfsDirEntry::new(d as u16, b"x"));
    assert!(matches!(
        check(renamed.as_bytes()).first_violation(),
        Some(Violation::MalformedDirectory { inode, .. }) if inode == d
    ));

    let mut wrong_self = b.clone();
    wrong_self.set_entry(blk, 0, VsfsDirEntry::new(ROOT_INO as u16, b"."));
    assert_eq!(
        check(wrong_self.as_bytes()).first_violation(),
        Some(Violation::MalformedDirectory {
            inode: d,
            reason: "\".\" does not name the directory"
        })
    );

    let mut empty = b.clone();
    empty.set_direct(d, 0, 0);
    empty.set_bitmap(blk, false);
    assert_eq!(
        check(empty.as_bytes()).first_violation(),
        Some(Violation::MalformedDirectory {
            inode: d,
            reason: "no data block"
        })
    );
}

#[test]
fn test_root_checks() {
    let b = ImageBuilder::new(256, 32).unwrap();
    let root_blk = b.first_block(ROOT_INO);

    let mut not_dir = b.clone();
    not_dir.set_kind(ROOT_INO, 2);
    assert_eq!(
        check(not_dir.as_bytes()).first_violation(),
        Some(Violation::RootMissing)
    );

    let mut dotdot = b.clone();
    dotdot.set_entry(root_blk, 1, VsfsDirEntry::new(5, b".."));
    assert_eq!(
        check(dotdot.as_bytes()).first_violation().map(|v| v.code()),
        Some("DIR.FORMAT")
    );
}

#[test]
fn test_root_format_reported_once() {
    let mut b = ImageBuilder::new(256, 32).unwrap();
    let root_blk = b.first_block(ROOT_INO);
    b.set_entry(root_blk, 0, VsfsDirEntry::new(ROOT_INO as u16, b"x"));

    let rep = check_all(b.as_bytes());
    let root_format: Vec<Violation> = rep
        .violations()
        .filter(|v| matches!(v, Violation::MalformedDirectory { inode, .. } if *inode == ROOT_INO))
        .collect();
    assert_eq!(
        root_format,
        vec![Violation::MalformedDirectory {
            inode: ROOT_INO,
            reason: "first entry is not \".\""
        }]
    );
}

#[test]
fn test_bad_inode_type() {
    let (mut b, _) = scenario_a();
    b.set_kind(5, 7);

    let rep = check(b.as_bytes());
    assert_eq!(
        rep.first_violation(),
        Some(Violation::BadInodeType { inode: 5, kind: 7 })
    );
    assert!(rep.errors_only().to_string().starts_with("ERROR: bad inode"));
}

#[test]
fn test_corrupt_and_bad_superblock() {
    let rep = check(&[0u8; 520]);
    assert_eq!(
        rep.first_violation(),
        Some(Violation::CorruptImage {
            offset: 512,
            len: 12
        })
    );

    let rep = check_all(&vec![0u8; 4096]);
    assert_eq!(
        rep.first_violation(),
        Some(Violation::BadSuperblock {
            reason: "total_blocks is zero"
        })
    );
    assert_eq!(rep.violations().count(), 1);
}

#[test]
fn test_collect_all_reports_everything() {
    let (mut b, f) = scenario_a();
    b.set_nlink(f, 2);
    b.set_bitmap(100, true);

    let fail_fast = check(b.as_bytes());
    assert_eq!(fail_fast.violations().count(), 1);

    let all: Vec<&str> = check_all(b.as_bytes())
        .violations()
        .map(|v| v.code())
        .collect();
    assert_eq!(all, vec!["BMP.UNUSED", "LINK.COUNT"]);
}

#[test]
fn test_phase_selection() {
    let (mut b, f) = scenario_a();
    b.set_nlink(f, 2);
    b.set_bitmap(100, true);

    let blocks_only = VsfsCheckOptions {
        phases: VerifyPhases::BLOCKS,
        ..VsfsCheckOptions::collect_all()
    };
    let codes: Vec<&str> = check_with(b.as_bytes(), &blocks_only)
        .violations()
        .map(|v| v.code())
        .collect();
    assert_eq!(codes, vec!["BMP.UNUSED"]);

    let links_only = VsfsCheckOptions {
        phases: VerifyPhases::LINKS,
        ..VsfsCheckOptions::collect_all()
    };
    let codes: Vec<&str> = check_with(b.as_bytes(), &links_only)
        .violations()
        .map(|v| v.code())
        .collect();
    assert_eq!(codes, vec!["LINK.COUNT"]);
}

#[test]
fn test_orphan_sample_limit() {
    let (mut b, _) = scenario_a();
    for blk in 300..305 {
        b.set_bitmap(blk, true);
    }
    let opt = VsfsCheckOptions {
        orphan_sample_limit: 2,
        ..VsfsCheckOptions::collect_all()
    };

    let rep = check_with(b.as_bytes(), &opt);
    assert_eq!(rep.violations().count(), 2);
    assert!(rep.findings.iter().any(|f| f.code == "BMP.SAMPLE" && f.sev == Severity::Warn));
}

#[test]
fn test_fast_check_rejects() {
    let (mut b, f) = scenario_a();
    b.set_nlink(f, 0);
    let mut io = MemImageIO::new(b.as_bytes());
    assert_eq!(
        VsfsChecker::new(&mut io).fast_check(),
        Err(FsCheckerError::Invalid("Image failed consistency check"))
    );
}

#[test]
fn test_stream_backend() {
    let b = populated();
    let mut file = tempfile::tempfile().unwrap();
    file.write_all(b.as_bytes()).unwrap();

    let mut io = StdImageIO::new(&mut file).unwrap();
    let rep = VsfsChecker::new(&mut io).check_all().unwrap();
    assert!(rep.ok(), "{rep}");
}
