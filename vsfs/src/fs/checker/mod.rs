// SPDX-License-Identifier: MIT

pub use crate::core::checker::*;
use crate::fs::{bitmap::BlockBitmap, meta::VsfsMeta, table::InodeTable};
use vsio::prelude::*;

mod blocks;
mod geometry;
mod inodes;
mod links;
mod root;
mod tally;
mod walker;

pub use tally::RefTally;
pub use walker::VsfsWalker;

#[derive(Clone, Debug)]
pub struct VsfsCheckOptions {
    pub phases: VerifyPhases,
    /// Stop at the first violation.
    pub fail_fast: bool,
    /// Cap on `MarkedButUnused` findings in collect-all mode.
    pub orphan_sample_limit: usize,
}

impl Default for VsfsCheckOptions {
    fn default() -> Self {
        Self {
            phases: VerifyPhases::ALL,
            fail_fast: true,
            orphan_sample_limit: usize::MAX,
        }
    }
}

impl VsfsCheckOptions {
    /// Every phase, every violation.
    pub fn collect_all() -> Self {
        Self {
            fail_fast: false,
            ..Self::default()
        }
    }
}

impl VerifierOptionsLike for VsfsCheckOptions {
    fn phases(&self) -> VerifyPhases {
        self.phases
    }
    fn fail_fast(&self) -> bool {
        self.fail_fast
    }
}

/// Tables decoded by the geometry phase, shared by the later phases.
#[derive(Debug)]
pub struct CheckState {
    pub meta: VsfsMeta,
    pub table: InodeTable,
    pub bitmap: BlockBitmap,
    /// Reference tallies, set once the directory walk completed.
    pub tally: Option<RefTally>,
}

pub struct VsfsChecker<'a, IO: ImageIO + ?Sized> {
    io: &'a mut IO,
    state: Option<CheckState>,
    pub stats: WalkerStats,
}

impl<'a, IO: ImageIO + ?Sized> VsfsChecker<'a, IO> {
    pub fn new(io: &'a mut IO) -> Self {
        Self {
            io,
            state: None,
            stats: WalkerStats::default(),
        }
    }

    /// Layout resolved by the last run, if geometry passed.
    pub fn meta(&self) -> Option<&VsfsMeta> {
        self.state.as_ref().map(|s| &s.meta)
    }

    fn parts(&mut self) -> FsCheckerResult<(&mut IO, &mut CheckState)> {
        let state = self
            .state
            .as_mut()
            .ok_or(FsCheckerError::Invalid("Geometry phase did not run"))?;
        Ok((&mut *self.io, state))
    }
}

impl<'a, IO: ImageIO + ?Sized> FsChecker for VsfsChecker<'a, IO> {
    type Options = VsfsCheckOptions;

    fn check_geometry(&mut self, _opt: &Self::Options, rep: &mut VerifyReport) -> FsCheckerResult {
        self.state = None;
        self.stats = WalkerStats::default();
        self.state = Some(geometry::load(self.io, rep)?);
        Ok(())
    }

    fn check_inodes(&mut self, opt: &Self::Options, rep: &mut VerifyReport) -> FsCheckerResult {
        let (_, state) = self.parts()?;
        inodes::check(state, opt, rep)
    }

    fn check_root(&mut self, opt: &Self::Options, rep: &mut VerifyReport) -> FsCheckerResult {
        let (io, state) = self.parts()?;
        root::check(io, state, opt, rep)
    }

    fn check_blocks(&mut self, opt: &Self::Options, rep: &mut VerifyReport) -> FsCheckerResult {
        let (_, state) = self.parts()?;
        blocks::audit(state, opt, rep)
    }

    fn check_dirs(&mut self, opt: &Self::Options, rep: &mut VerifyReport) -> FsCheckerResult {
        let mut stats = WalkerStats::default();
        let (io, state) = self.parts()?;
        let mut walker = VsfsWalker::new(io, &state.meta, &state.table);
        walker.walk(opt.fail_fast, rep, &mut stats)?;
        let tally = walker.into_tally();

        rep.push(Finding::info(
            "DIR.WALK",
            format!(
                "Walked {} dirs, {} entries in {} blocks ({} file entries)",
                stats.dirs_visited, stats.entries_scanned, stats.blocks_read, stats.files_found
            ),
        ));
        state.tally = Some(tally);
        self.stats = stats;
        Ok(())
    }

    fn check_links(&mut self, opt: &Self::Options, rep: &mut VerifyReport) -> FsCheckerResult {
        let (_, state) = self.parts()?;
        let tally = state
            .tally
            .as_ref()
            .ok_or(FsCheckerError::Invalid("Directory walk did not complete"))?;
        links::reconcile(&state.table, tally, opt, rep)
    }

    fn check_parents(&mut self, opt: &Self::Options, rep: &mut VerifyReport) -> FsCheckerResult {
        let (io, state) = self.parts()?;
        links::check_parents(io, state, opt, rep)
    }
}
