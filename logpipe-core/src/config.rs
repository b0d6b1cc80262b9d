//! Configuration management for `logpipe-core`.
//!
//! This module defines the storage limits announced by a log collector and a
//! small YAML pipeline configuration (limits plus an optional filter list)
//! used by the command-line front end. Limits are plain numbers here; fetching
//! them from a collector is the transport's job.
//!
//! License: MIT OR Apache-2.0

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::filters::FilterChain;

/// Storage time used when the collector's limits are unknown: 90 days.
pub const DEFAULT_STORAGE_TIME: u64 = 90 * 24 * 60 * 60;
/// Maximum log length used when the collector's limits are unknown: 10 MiB.
pub const DEFAULT_MAX_LENGTH: usize = 10 * 1024 * 1024;
/// Maximum number of lines used when the collector's limits are unknown.
pub const DEFAULT_MAX_LINES: usize = 25_000;

/// Storage limits of a log collector.
///
/// Serialized in the collector's camelCase form
/// (`{"storageTime": .., "maxLength": .., "maxLines": ..}`); snake_case keys
/// are accepted as well so the same struct can live in a YAML config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Limits {
    /// Seconds a log is kept after it was last viewed.
    #[serde(alias = "storage_time")]
    pub storage_time: u64,
    /// Maximum log size in bytes. Longer logs are truncated.
    #[serde(alias = "max_length")]
    pub max_length: usize,
    /// Maximum number of lines. Additional lines are removed.
    #[serde(alias = "max_lines")]
    pub max_lines: usize,
}

impl Limits {
    pub fn new(storage_time: u64, max_length: usize, max_lines: usize) -> Self {
        Self {
            storage_time,
            max_length,
            max_lines,
        }
    }

    pub fn storage_duration(&self) -> Duration {
        Duration::from_secs(self.storage_time)
    }

    /// Parses a limits response body.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse storage limits")
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::new(DEFAULT_STORAGE_TIME, DEFAULT_MAX_LENGTH, DEFAULT_MAX_LINES)
    }
}

/// Top-level pipeline configuration.
///
/// ```yaml
/// limits:
///   max_length: 1048576
///   max_lines: 5000
///   storage_time: 86400
/// filters:
///   - type: trim
///     data: {}
///   - type: regex
///     data:
///       patterns:
///         - pattern: "token=\\w+"
///           replacement: "token=***"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub limits: Limits,
    /// Explicit filter list. When absent, the default chain for `limits` is used.
    pub filters: Option<FilterChain>,
}

impl PipelineConfig {
    /// Loads a pipeline configuration from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading pipeline configuration from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: PipelineConfig = serde_yml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        debug!(
            "Loaded limits {:?} and {} filter list from {}.",
            config.limits,
            if config.filters.is_some() { "an explicit" } else { "no" },
            path.display()
        );
        Ok(config)
    }

    /// The filter chain this configuration asks for.
    pub fn filter_chain(&self) -> FilterChain {
        match &self.filters {
            Some(chain) => chain.clone(),
            None => FilterChain::default_for(&self.limits),
        }
    }
}
