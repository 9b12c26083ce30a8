// SPDX-License-Identifier: MIT

use colored::{ColoredString, Colorize};

use vsfs::vsfs::{ReportDisplayOpts, Severity, VerifyReport};

use crate::utils::{LogLevel, log_level};

/// Writes the report to stderr at the current log level.
///
/// Normal level prints one line per violation; verbose adds info and
/// warning findings plus a summary line.
pub fn print_report(rep: &VerifyReport) {
    match log_level() {
        LogLevel::Quiet => {}
        LogLevel::Normal => {
            for line in rep.errors_only().to_string().lines() {
                eprintln!("{}", line.red());
            }
        }
        LogLevel::Verbose => {
            let opts = ReportDisplayOpts {
                prefix: "  ",
                show_summary: true,
                ..ReportDisplayOpts::default()
            };
            let text = rep.display_with(opts).to_string();
            let mut lines = text.lines();
            for (finding, line) in rep.findings.iter().zip(lines.by_ref()) {
                eprintln!("{}", paint(finding.sev, line));
            }
            for line in lines {
                eprintln!("{}", line.bold());
            }
        }
    }
}

fn paint(sev: Severity, line: &str) -> ColoredString {
    match sev {
        Severity::Info => line.normal(),
        Severity::Warn => line.yellow(),
        Severity::Error => line.red(),
    }
}
