// logpipe/src/main.rs
//! logpipe entry point.
//!
//! Parses the command line, sets up logging and runs the sanitize command.

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use logpipe::cli::Cli;
use logpipe::commands::sanitize::{run_sanitize, SanitizeOptions};
use logpipe::logger;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    if args.quiet {
        logger::init_logger(Some(LevelFilter::Off));
    } else if args.debug {
        logger::init_logger(Some(LevelFilter::Debug));
    } else {
        logger::init_logger(None);
    }

    run_sanitize(SanitizeOptions::from(args)).await
}
