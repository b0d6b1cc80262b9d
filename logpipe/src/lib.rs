// logpipe/src/lib.rs
//! # logpipe CLI Application
//!
//! Command-line front end for `logpipe-core`: reads a log, runs the bounded
//! content pipeline and prints the result or the upload payload.

pub mod cli;
pub mod commands;
pub mod logger;
