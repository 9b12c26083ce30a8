// SPDX-License-Identifier: MIT

mod config;
mod report;
mod utils;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use std::fs::{self, File};
use std::path::PathBuf;
use std::process::ExitCode;

use vsfs::vsfs::*;
use vsio::prelude::{IOCounter, ImageIO, MemImageIO, StdImageIO};

use crate::config::CheckConfig;
use crate::utils::{LogLevel, log_level, set_log_level};

#[derive(Parser)]
#[command(
    name = "vsck",
    version,
    about = "Read-only consistency checker for VSFS images",
    long_about = None
)]
struct Cli {
    /// Image to check
    image: PathBuf,

    /// Report every violation instead of stopping at the first
    #[arg(short, long)]
    all: bool,

    /// TOML check configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Read through the file handle instead of loading the image
    #[arg(long)]
    stream: bool,

    /// Also print info and warning findings
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Print nothing; only the exit code reports the result
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version are not failures.
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    set_log_level(match (cli.quiet, cli.verbose) {
        (true, _) => LogLevel::Quiet,
        (_, true) => LogLevel::Verbose,
        _ => LogLevel::Normal,
    });

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            if log_level() != LogLevel::Quiet {
                eprintln!("{} {e:#}", "error:".red().bold());
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => CheckConfig::from_file(path)?,
        None => CheckConfig::default(),
    };
    let opt = config.options(cli.all)?;
    let not_found = || format!("image not found: {}", cli.image.display());

    log_verbose!(
        "Checking {} ({}, phases {:?})",
        cli.image.display(),
        if opt.fail_fast { "fail-fast" } else { "collect-all" },
        opt.phases.resolved()
    );

    let rep = if cli.stream {
        let mut file = File::open(&cli.image).with_context(not_found)?;
        let mut io = StdImageIO::new(&mut file).with_context(not_found)?;
        check(&mut io, &opt)?
    } else {
        let bytes = fs::read(&cli.image).with_context(not_found)?;
        check(&mut MemImageIO::new(&bytes), &opt)?
    };

    report::print_report(&rep);
    Ok(if rep.has_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn check<IO: ImageIO + ?Sized>(io: &mut IO, opt: &VsfsCheckOptions) -> anyhow::Result<VerifyReport> {
    let mut counter = IOCounter::with_align(io, BSIZE as u64);
    let mut checker = VsfsChecker::new(&mut counter);
    let rep = checker.check_with(opt)?;
    let walk = checker.stats;
    let io_stats = counter.snapshot();

    log_verbose!(
        "Walked {} directories, {} entries, {} file references",
        walk.dirs_visited,
        walk.entries_scanned,
        walk.files_found
    );
    log_verbose!(
        "{} reads ({} bytes, {} block-aligned, largest {})",
        io_stats.reads,
        io_stats.read_bytes,
        io_stats.aligned_reads,
        io_stats.max_read
    );
    Ok(rep)
}
