// SPDX-License-Identifier: MIT

mod stats;
mod tracker;
mod types;
mod violation;

pub use stats::WalkerStats;
pub use tracker::ReachabilityTracker;
pub use types::{
    Finding, ReportDisplay, ReportDisplayOpts, Severity, VerifierOptionsLike, VerifyPhases,
    VerifyReport,
};
pub use violation::{BitmapInconsistency, Violation};

pub use crate::core::errors::{FsCheckerError, FsCheckerResult};

/// Phase-driven consistency check of a filesystem image.
///
/// Phases run in a fixed order, each gated by its [`VerifyPhases`] flag.
/// With fail-fast options a phase stops the run by returning
/// [`FsCheckerError::Halted`] once the report holds an error; collect-all runs
/// every selected phase to completion.
///
/// A read past the end of the image ends the run with a single
/// [`Violation::CorruptImage`] finding instead of an error.
pub trait FsChecker {
    type Options: VerifierOptionsLike + Default;

    fn check_with(&mut self, opt: &Self::Options) -> FsCheckerResult<VerifyReport> {
        let mut rep = VerifyReport::default();
        match self.run_phases(opt, &mut rep) {
            Ok(()) | Err(FsCheckerError::Halted) => Ok(rep),
            Err(e) => match e.out_of_bounds() {
                Some((offset, len)) => {
                    rep.push(Finding::err(Violation::CorruptImage { offset, len }));
                    Ok(rep)
                }
                None => Err(e),
            },
        }
    }

    fn check_all(&mut self) -> FsCheckerResult<VerifyReport> {
        self.check_with(&Self::Options::default())
    }

    /// Fail-fast run over every phase; `Err(Invalid)` when anything is wrong.
    fn fast_check(&mut self) -> FsCheckerResult {
        let rep = self.check_all()?;
        if rep.has_error() {
            return Err(FsCheckerError::Invalid("Image failed consistency check"));
        }
        Ok(())
    }

    fn run_phases(&mut self, opt: &Self::Options, rep: &mut VerifyReport) -> FsCheckerResult {
        self.run_phase(opt, rep, VerifyPhases::GEOMETRY, Self::check_geometry)?;
        self.run_phase(opt, rep, VerifyPhases::INODES, Self::check_inodes)?;
        self.run_phase(opt, rep, VerifyPhases::ROOT, Self::check_root)?;
        self.run_phase(opt, rep, VerifyPhases::BLOCKS, Self::check_blocks)?;
        self.run_phase(opt, rep, VerifyPhases::DIRS, Self::check_dirs)?;
        self.run_phase(opt, rep, VerifyPhases::LINKS, Self::check_links)?;
        self.run_phase(opt, rep, VerifyPhases::PARENTS, Self::check_parents)?;
        Ok(())
    }

    fn check_geometry(&mut self, _opt: &Self::Options, _rep: &mut VerifyReport) -> FsCheckerResult {
        Ok(())
    }
    fn check_inodes(&mut self, _opt: &Self::Options, _rep: &mut VerifyReport) -> FsCheckerResult {
        Ok(())
    }
    fn check_root(&mut self, _opt: &Self::Options, _rep: &mut VerifyReport) -> FsCheckerResult {
        Ok(())
    }
    fn check_blocks(&mut self, _opt: &Self::Options, _rep: &mut VerifyReport) -> FsCheckerResult {
        Ok(())
    }
    fn check_dirs(&mut self, _opt: &Self::Options, _rep: &mut VerifyReport) -> FsCheckerResult {
        Ok(())
    }
    fn check_links(&mut self, _opt: &Self::Options, _rep: &mut VerifyReport) -> FsCheckerResult {
        Ok(())
    }
    fn check_parents(&mut self, _opt: &Self::Options, _rep: &mut VerifyReport) -> FsCheckerResult {
        Ok(())
    }

    fn run_phase<F>(
        &mut self,
        opt: &Self::Options,
        rep: &mut VerifyReport,
        phase: VerifyPhases,
        f: F,
    ) -> FsCheckerResult
    where
        F: Fn(&mut Self, &Self::Options, &mut VerifyReport) -> FsCheckerResult,
    {
        if opt.phases().resolved().contains(phase) {
            f(self, opt, rep)?;
            if opt.fail_fast() && rep.has_error() {
                return Err(FsCheckerError::Halted);
            }
        }
        Ok(())
    }
}
