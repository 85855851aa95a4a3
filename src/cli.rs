//! Command-line interface definitions for `dupehunt`.
//!
//! Global options (verbosity, color, error format) apply to every
//! subcommand. Scan options are all optional so that values from the
//! config file and environment are only overridden when a flag is given.
//!
//! # Example
//!
//! ```bash
//! # Scan a directory and print groups as text
//! dupehunt scan ~/Downloads
//!
//! # JSON output for scripting
//! dupehunt scan ~/Downloads --output json
//!
//! # Sequential group labels, single I/O thread, debug logging
//! dupehunt -v scan ~/Downloads --labels sequential --io-threads 1
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::scanner::HashAlgorithm;

/// Find byte-identical files in a directory tree.
///
/// Files are compared by size, then by a hash of their first 4 KiB, then by
/// a hash of their full content. Nothing is ever modified or deleted.
#[derive(Debug, Parser)]
#[command(name = "dupehunt")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a directory for duplicate files
    Scan(ScanArgs),
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory to scan for duplicates
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Output format [default: text]
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Number of I/O threads for hashing [default: 4]
    ///
    /// Lower values reduce disk thrashing on HDDs.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub io_threads: Option<u16>,

    /// Digest used for prefix and full hashes [default: sha256]
    #[arg(long, value_enum)]
    pub algorithm: Option<HashAlgorithm>,

    /// How duplicate groups are labelled [default: hash]
    #[arg(long, value_enum)]
    pub labels: Option<LabelStyle>,

    /// Retry a failed read once before skipping the file
    #[arg(long)]
    pub retry_reads: bool,

    /// Do not show progress bars
    #[arg(long)]
    pub no_progress: bool,

    /// Read settings from this TOML file instead of the default location
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Output format for scan results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable listing
    #[default]
    Text,
    /// JSON document for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Identifier shown for each duplicate group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelStyle {
    /// Hex digest of the shared content
    #[default]
    Hash,
    /// `Group 1`, `Group 2`, ... in report order
    Sequential,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parse_scan_basic() {
        let cli = Cli::try_parse_from(["dupehunt", "scan", "/tmp"]).unwrap();
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);

        let Commands::Scan(args) = cli.command;
        assert_eq!(args.path, PathBuf::from("/tmp"));
        assert!(args.output.is_none());
        assert!(args.io_threads.is_none());
        assert!(!args.retry_reads);
    }

    #[test]
    fn test_cli_parse_scan_with_options() {
        let cli = Cli::try_parse_from([
            "dupehunt",
            "-vv",
            "--json-errors",
            "scan",
            "/data",
            "--output",
            "json",
            "--io-threads",
            "2",
            "--algorithm",
            "blake3",
            "--labels",
            "sequential",
            "--retry-reads",
            "--no-progress",
            "--config",
            "custom.toml",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert!(cli.json_errors);
        let Commands::Scan(args) = cli.command;
        assert_eq!(args.output, Some(OutputFormat::Json));
        assert_eq!(args.io_threads, Some(2));
        assert_eq!(args.algorithm, Some(HashAlgorithm::Blake3));
        assert_eq!(args.labels, Some(LabelStyle::Sequential));
        assert!(args.retry_reads);
        assert!(args.no_progress);
        assert_eq!(args.config, Some(PathBuf::from("custom.toml")));
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["dupehunt", "scan", "/tmp", "-q"]).unwrap();
        assert!(cli.quiet);
    }

    #[test]
    fn test_cli_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["dupehunt", "-q", "-v", "scan", "/tmp"]).is_err());
    }

    #[test]
    fn test_cli_rejects_zero_threads() {
        assert!(Cli::try_parse_from(["dupehunt", "scan", "/tmp", "--io-threads", "0"]).is_err());
    }

    #[test]
    fn test_cli_requires_path() {
        assert!(Cli::try_parse_from(["dupehunt", "scan"]).is_err());
    }
}
