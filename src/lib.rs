//! dupehunt - duplicate file finder
//!
//! Finds groups of byte-identical files under a directory. Files are
//! partitioned by size, then compared by a hash of their first 4 KiB, and
//! only prefix collisions are hashed in full. The library never modifies
//! the files it inspects.
//!
//! ```no_run
//! use dupehunt::duplicates::detect_duplicates;
//! use std::path::Path;
//!
//! let report = detect_duplicates(Path::new("/data")).unwrap();
//! for (hash, paths) in report.as_map() {
//!     println!("{hash}: {paths:?}");
//! }
//! ```

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{self, IsTerminal, Write};
use std::sync::Arc;

use anyhow::{Context, Result};

use cli::{Cli, Commands, OutputFormat, ScanArgs};
use config::Config;
use duplicates::DuplicateFinder;
use error::ExitCode;
use output::{JsonOutput, TextOutput};
use progress::Progress;

/// Run the command line application, writing the report to stdout.
///
/// # Errors
///
/// Returns an error if the scan cannot start or is interrupted, or if the
/// report cannot be written.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    let color = !cli.no_color && io::stdout().is_terminal();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_with_output(cli, &mut out, color)
}

/// Run the command line application, writing the report to `out`.
///
/// # Errors
///
/// See [`run_app`].
pub fn run_with_output<W: Write>(cli: Cli, out: &mut W, color: bool) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Scan(ref args) => run_scan(args, cli.quiet, out, color),
    }
}

fn run_scan<W: Write>(args: &ScanArgs, quiet: bool, out: &mut W, color: bool) -> Result<ExitCode> {
    let mut config = match args.config {
        Some(ref path) => {
            if !path.is_file() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Config::load_from_path(path)
        }
        None => Config::load(),
    };
    config.apply_scan_args(args);
    log::debug!("Effective configuration: {:?}", config);

    let handler = signal::install_handler()?;
    let mut finder_config = config.finder_config().with_shutdown_flag(handler.get_flag());
    if config.progress && !quiet {
        finder_config = finder_config.with_progress_callback(Arc::new(Progress::new(false)));
    }

    let finder = DuplicateFinder::new(finder_config);
    let (report, summary) = finder
        .find_duplicates(&args.path)
        .with_context(|| format!("Failed to scan {}", args.path.display()))?;

    for error in &summary.errors {
        log::debug!("Skipped: {}", error);
    }

    let exit_code = ExitCode::for_outcome(report.len(), summary.has_errors());

    match config.output {
        OutputFormat::Text => TextOutput::new(&report, &summary, config.labels)
            .with_color(color)
            .write_to(out)
            .context("Failed to write report")?,
        OutputFormat::Json => JsonOutput::new(&report, &summary, config.labels, exit_code)
            .write_to(out, true)
            .context("Failed to write JSON report")?,
    }

    Ok(exit_code)
}
