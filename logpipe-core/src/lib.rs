// logpipe-core/src/lib.rs
//! # logpipe Core Library
//!
//! `logpipe-core` turns a raw log (a file, possibly gzip-compressed, or an
//! in-memory string) into sanitized content that is safe to hand to a remote
//! log collector: capped in bytes and lines, trimmed, and with personal data
//! such as IP addresses redacted.
//!
//! The library does no networking. It consumes a source, storage limits and a
//! filter list, and produces a string plus the source tag and metadata records
//! an upload transport needs.
//!
//! ## Modules
//!
//! * `source`: File and in-memory log sources, file name validation, gzip.
//! * `reader`: `BoundedReader`, a streaming reader enforcing byte and line budgets
//!   on exact UTF-8 character boundaries.
//! * `filters`: The `Filter` variants, `FilterChain` and the regex compiler.
//! * `log`: `Log`, which runs a source through a chain once and caches the result.
//! * `config`: Collector `Limits` and the YAML `PipelineConfig`.
//! * `headless`: One-shot helpers and a tokio background runner.
//! * `redaction_log`: PII-aware debug logging of redaction decisions.
//! * `errors`: The `LogPipeError` type.
//!
//! ## Usage Example
//!
//! ```rust
//! use logpipe_core::{FilterChain, Limits, Log, Metadata};
//!
//! fn main() -> logpipe_core::Result<()> {
//!     let chain = FilterChain::default_for(&Limits::default());
//!
//!     let mut log = Log::from_string("  [INFO] Player joined from 192.168.17.4\n");
//!     log.set_source(Some("example.net".to_string()))
//!         .add_metadata(Metadata::new("version", "1.20.4"));
//!
//!     assert_eq!(log.content(&chain)?, "[INFO] Player joined from **.**.**.**");
//!     let payload = log.upload_payload(&chain)?;
//!     assert_eq!(payload.metadata.len(), 1);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Pipeline operations return [`LogPipeError`]. Configuration loading returns
//! `anyhow::Error` with file context attached. Invalid regex patterns inside a
//! filter list are skipped with a warning rather than failing the whole list.
//!
//! ---
//! License: MIT OR APACHE 2.0

pub mod config;
pub mod errors;
pub mod filters;
pub mod headless;
pub mod log;
pub mod reader;
pub mod redaction_log;
pub mod source;

pub use config::{Limits, PipelineConfig, DEFAULT_MAX_LENGTH, DEFAULT_MAX_LINES, DEFAULT_STORAGE_TIME};

pub use errors::{LogPipeError, Result};

pub use filters::compiler::{CompiledPattern, RegexSpec};
pub use filters::defaults::{ipv4_filter, ipv6_filter};
pub use filters::{Filter, FilterChain, RegexFilter};

pub use headless::{sanitize_file, sanitize_in_background, sanitize_string};

pub use self::log::{Log, Metadata, UploadPayload};

pub use reader::{BoundedReader, Budget};

pub use redaction_log::redact_sensitive;

pub use source::{is_allowed_file_name, LogSource};
