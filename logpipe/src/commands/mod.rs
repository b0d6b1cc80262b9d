// logpipe/src/commands/mod.rs
pub mod sanitize;
