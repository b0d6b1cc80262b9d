// logpipe/src/logger.rs
//! Logger setup for the `logpipe` binary.
//!
//! Logs go to stderr so stdout carries only the sanitized content. `RUST_LOG`
//! is honoured unless an explicit level is passed.

use env_logger::{Builder, Env, Target};
use log::LevelFilter;

/// Initializes `env_logger`. Safe to call more than once; later calls are no-ops.
pub fn init_logger(level: Option<LevelFilter>) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("warn"));
    builder.target(Target::Stderr);
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder.try_init().ok();
}
