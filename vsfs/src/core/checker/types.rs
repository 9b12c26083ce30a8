// SPDX-License-Identifier: MIT

use core::cmp::Ordering;
use core::fmt;

use bitflags::bitflags;

use super::violation::Violation;
use crate::core::errors::{FsCheckerError, FsCheckerResult};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    fn rank(self) -> u8 {
        match self {
            Severity::Info => 0,
            Severity::Warn => 1,
            Severity::Error => 2,
        }
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

/// One report line. Error findings always carry their typed [`Violation`].
#[derive(Clone, Debug)]
pub struct Finding {
    pub sev: Severity,
    pub code: &'static str,
    pub msg: String,
    pub violation: Option<Violation>,
}

impl Finding {
    pub fn info(code: &'static str, msg: impl Into<String>) -> Self {
        Self {
            sev: Severity::Info,
            code,
            msg: msg.into(),
            violation: None,
        }
    }

    pub fn warn(code: &'static str, msg: impl Into<String>) -> Self {
        Self {
            sev: Severity::Warn,
            code,
            msg: msg.into(),
            violation: None,
        }
    }

    pub fn err(v: impl Into<Violation>) -> Self {
        let v = v.into();
        Self {
            sev: Severity::Error,
            code: v.code(),
            msg: v.to_string(),
            violation: Some(v),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct VerifyReport {
    pub findings: Vec<Finding>,
}

impl VerifyReport {
    pub fn has_error(&self) -> bool {
        self.findings.iter().any(|f| f.sev == Severity::Error)
    }

    pub fn first_error(&self) -> Option<&str> {
        self.findings
            .iter()
            .find(|f| f.sev == Severity::Error)
            .map(|f| f.msg.as_str())
    }

    pub fn first_violation(&self) -> Option<Violation> {
        self.violations().next()
    }

    /// Violations in the order they were found.
    pub fn violations(&self) -> impl Iterator<Item = Violation> + '_ {
        self.findings.iter().filter_map(|f| f.violation)
    }

    pub fn ok(&self) -> bool {
        !self.has_error()
    }

    pub fn push(&mut self, f: Finding) {
        self.findings.push(f)
    }

    /// Records `v`; with `fail_fast` the check stops right here.
    pub fn raise(&mut self, v: impl Into<Violation>, fail_fast: bool) -> FsCheckerResult {
        self.push(Finding::err(v));
        if fail_fast {
            return Err(FsCheckerError::Halted);
        }
        Ok(())
    }

    pub fn count(&self, s: Severity) -> usize {
        self.findings.iter().filter(|f| f.sev == s).count()
    }

    /// Display with options (filtering, prefix, summary...)
    pub fn display_with(&self, opts: ReportDisplayOpts) -> ReportDisplay<'_> {
        ReportDisplay::new(self, opts)
    }

    /// Errors only, no code column: one line per violation.
    pub fn errors_only(&self) -> ReportDisplay<'_> {
        self.display_with(ReportDisplayOpts {
            min_level: Severity::Error,
            prefix: "ERROR: ",
            show_tag: false,
            pad_code: 0,
            show_summary: false,
        })
    }

    pub fn warn_and_errors(&self) -> ReportDisplay<'_> {
        self.display_with(ReportDisplayOpts {
            min_level: Severity::Warn,
            ..ReportDisplayOpts::default()
        })
    }
}

#[derive(Copy, Clone, Debug)]
pub struct ReportDisplayOpts {
    pub min_level: Severity,
    pub prefix: &'static str,
    /// Print the severity tag and the code column.
    pub show_tag: bool,
    pub show_summary: bool,
    pub pad_code: usize,
}

impl Default for ReportDisplayOpts {
    fn default() -> Self {
        Self {
            min_level: Severity::Info,
            prefix: "",
            show_tag: true,
            show_summary: false,
            pad_code: 12,
        }
    }
}

pub struct ReportDisplay<'a> {
    rep: &'a VerifyReport,
    opts: ReportDisplayOpts,
}

impl<'a> ReportDisplay<'a> {
    pub fn new(rep: &'a VerifyReport, opts: ReportDisplayOpts) -> Self {
        Self { rep, opts }
    }
}

impl fmt::Display for ReportDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for it in self.rep.findings.iter().filter(|it| it.sev >= self.opts.min_level) {
            if self.opts.show_tag {
                let tag = match it.sev {
                    Severity::Info => "INFO",
                    Severity::Warn => "WARN",
                    Severity::Error => "ERR ",
                };
                writeln!(
                    f,
                    "{}{tag}: {:<width$} {}",
                    self.opts.prefix,
                    it.code,
                    it.msg,
                    width = self.opts.pad_code
                )?;
            } else {
                writeln!(f, "{}{}", self.opts.prefix, it.msg)?;
            }
        }

        if self.opts.show_summary {
            writeln!(
                f,
                "{}Summary: errors={}  warns={}  infos={}",
                self.opts.prefix,
                self.rep.count(Severity::Error),
                self.rep.count(Severity::Warn),
                self.rep.count(Severity::Info)
            )?;
        }

        Ok(())
    }
}

impl fmt::Display for VerifyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        ReportDisplay::new(self, ReportDisplayOpts::default()).fmt(f)
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct VerifyPhases: u32 {
        const GEOMETRY = 1 << 0;
        const INODES   = 1 << 1;
        const ROOT     = 1 << 2;
        const BLOCKS   = 1 << 3;
        const DIRS     = 1 << 4;
        const LINKS    = 1 << 5;
        const PARENTS  = 1 << 6;
        const ALL      = u32::MAX;
    }
}

impl VerifyPhases {
    /// Adds the phases the selection depends on.
    ///
    /// `GEOMETRY` loads the tables every other phase reads, `LINKS` reconciles
    /// the tallies built by `DIRS`.
    pub fn resolved(self) -> Self {
        let mut p = self | VerifyPhases::GEOMETRY;
        if p.contains(VerifyPhases::LINKS) {
            p |= VerifyPhases::DIRS;
        }
        p
    }

    /// Case-insensitive lookup of a single phase name (`"inodes"`, `"links"`...).
    pub fn parse_name(name: &str) -> Option<Self> {
        Self::from_name(&name.trim().to_ascii_uppercase())
    }
}

/// Generic options that the FS can encapsulate/extend.
pub trait VerifierOptionsLike {
    fn phases(&self) -> VerifyPhases {
        VerifyPhases::ALL
    }
    fn fail_fast(&self) -> bool {
        true
    }
}
