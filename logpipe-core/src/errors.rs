//! errors.rs - Custom error types for the logpipe-core library.
//!
//! This module defines a structured error enum for the library. Construction
//! failures (`InputRejected`) surface before any I/O happens, read failures
//! (`NotFound`, `IoError`) surface from `Log::content`, and `InvalidFilterSpec` is
//! only ever produced internally: the filter layer logs it and skips the
//! offending pattern instead of returning it.
//!
//! License: MIT OR APACHE 2.0

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the `logpipe-core` library.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LogPipeError {
    #[error("Forbidden log file name: {0}")]
    InputRejected(String),

    #[error("Log '{}' does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("Stream closed")]
    StreamClosed,

    #[error("Invalid filter pattern '{pattern}': {reason}")]
    InvalidFilterSpec { pattern: String, reason: String },

    #[error("Invalid filter list: {0}")]
    InvalidFilterList(#[from] serde_json::Error),

    #[error("An unexpected I/O error occurred: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Background sanitization task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Result alias used throughout the library.
pub type Result<T, E = LogPipeError> = std::result::Result<T, E>;
