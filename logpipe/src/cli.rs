// logpipe/src/cli.rs
//! Command-line interface definition for `logpipe`.
//! License: MIT OR APACHE 2.0

use clap::Parser;
use std::path::PathBuf;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "logpipe",
    author = "Obscura Tech",
    version = env!("CARGO_PKG_VERSION"),
    about = "Prepare a log file for sharing",
    long_about = "logpipe reads a log file (plain or gzip-compressed) or stdin, truncates it to the collector's byte and line limits, trims surrounding whitespace and redacts IPv4/IPv6 addresses. The result is printed as plain text or as the JSON payload an upload client would send.",
    arg_required_else_help = true
)]
pub struct Cli {
    /// Log file to read, or `-` for stdin.
    #[arg(value_name = "INPUT", help = "Log file to read (.log/.txt, optionally rotated and .gz), or '-' for stdin.")]
    pub input: String,

    /// Path to a pipeline configuration file (YAML).
    #[arg(long = "config", value_name = "FILE", env = "LOGPIPE_CONFIG", help = "Path to a pipeline configuration file (YAML).")]
    pub config: Option<PathBuf>,

    /// Filter list in the collector's JSON format. Replaces the configured filters.
    #[arg(long = "filters", value_name = "FILE", help = "Read the filter list from a JSON file instead of the configuration.")]
    pub filters: Option<PathBuf>,

    /// Overrides the configured byte limit.
    #[arg(long = "max-bytes", value_name = "N", help = "Maximum size of the sanitized log in bytes.")]
    pub max_bytes: Option<usize>,

    /// Overrides the configured line limit.
    #[arg(long = "max-lines", value_name = "N", help = "Maximum number of lines of the sanitized log.")]
    pub max_lines: Option<usize>,

    /// Name of the log source, e.g. a domain or software name.
    #[arg(long = "source", value_name = "NAME", help = "Name of the log source, e.g. a domain or software name.")]
    pub source: Option<String>,

    /// Metadata records attached to the upload payload.
    #[arg(long = "meta", value_name = "KEY=VALUE", help = "Attach a metadata record (repeatable).")]
    pub meta: Vec<String>,

    /// Print the upload payload as JSON instead of the plain content.
    #[arg(long = "json", help = "Print the upload payload as JSON.")]
    pub json: bool,

    /// Write output to this file instead of stdout.
    #[arg(long, short = 'o', value_name = "FILE", help = "Write output to a specified file instead of stdout.")]
    pub output: Option<PathBuf>,

    /// Disable informational messages
    #[arg(long, short = 'q', conflicts_with = "debug", help = "Suppress all informational and debug messages.")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, short = 'd', help = "Enable debug logging.")]
    pub debug: bool,
}
