// logpipe/src/commands/sanitize.rs
//! Sanitize command: reads a log, runs the content pipeline and prints the
//! result or the upload payload.

use anyhow::{bail, Context, Result};
use log::{debug, info};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use is_terminal::IsTerminal;
use logpipe_core::{sanitize_in_background, Filter, FilterChain, Log, LogSource, Metadata, PipelineConfig};

use crate::cli::Cli;

/// Input argument that selects stdin.
pub const STDIN_INPUT: &str = "-";

/// Options for [`run_sanitize`], decoupled from clap.
#[derive(Debug, Clone, Default)]
pub struct SanitizeOptions {
    pub input: String,
    pub config: Option<PathBuf>,
    pub filters: Option<PathBuf>,
    pub max_bytes: Option<usize>,
    pub max_lines: Option<usize>,
    pub source: Option<String>,
    pub meta: Vec<String>,
    pub json: bool,
    pub output: Option<PathBuf>,
}

impl From<Cli> for SanitizeOptions {
    fn from(cli: Cli) -> Self {
        Self {
            input: cli.input,
            config: cli.config,
            filters: cli.filters,
            max_bytes: cli.max_bytes,
            max_lines: cli.max_lines,
            source: cli.source,
            meta: cli.meta,
            json: cli.json,
            output: cli.output,
        }
    }
}

/// Builds the filter chain from the configuration file, the filter list and
/// the limit overrides.
///
/// Limit overrides replace the configured limits. With an explicit filter
/// list they are appended as extra limit filters, so the smaller limit wins.
pub fn build_filter_chain(opts: &SanitizeOptions) -> Result<FilterChain> {
    let mut config = match &opts.config {
        Some(path) => PipelineConfig::load_from_file(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(path) = &opts.filters {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read filter list {}", path.display()))?;
        let chain = FilterChain::from_json(&json)
            .with_context(|| format!("Failed to parse filter list {}", path.display()))?;
        config.filters = Some(chain);
    }

    if let Some(max_bytes) = opts.max_bytes {
        config.limits.max_length = max_bytes;
    }
    if let Some(max_lines) = opts.max_lines {
        config.limits.max_lines = max_lines;
    }

    let chain = match config.filters {
        Some(chain) => {
            let mut filters = chain.filters().to_vec();
            filters.extend(opts.max_bytes.map(Filter::LimitBytes));
            filters.extend(opts.max_lines.map(Filter::LimitLines));
            FilterChain::new(filters)
        }
        None => FilterChain::default_for(&config.limits),
    };

    debug!(
        "Using {} filter(s), byte limit {:?}, line limit {:?}.",
        chain.filters().len(),
        chain.max_bytes(),
        chain.max_lines()
    );
    Ok(chain)
}

/// Parses a `key=value` metadata argument.
///
/// Numbers and booleans keep their JSON type; anything else is a string.
pub fn parse_metadata(entry: &str) -> Result<Metadata> {
    let Some((key, raw)) = entry.split_once('=') else {
        bail!("Invalid metadata '{}': expected KEY=VALUE", entry);
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("Invalid metadata '{}': key must not be empty", entry);
    }

    let value = match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(value @ (serde_json::Value::Number(_) | serde_json::Value::Bool(_))) => value,
        _ => serde_json::Value::String(raw.to_string()),
    };
    Ok(Metadata::new(key, value))
}

/// A stdin source; the pipeline streams it so only the budgeted prefix is
/// ever held in memory.
fn stdin_source() -> Result<LogSource> {
    if io::stdin().is_terminal() {
        bail!("No input provided. Pipe a log into logpipe or pass a file path.");
    }
    Ok(LogSource::stdin())
}

/// Creates the [`Log`] for `opts.input` with source tag and metadata attached.
pub fn build_log(opts: &SanitizeOptions) -> Result<Log> {
    let mut log = if opts.input == STDIN_INPUT {
        Log::new(stdin_source()?)
    } else {
        Log::from_path(&opts.input)?
    };

    log.set_source(opts.source.clone());
    for entry in &opts.meta {
        log.add_metadata(parse_metadata(entry)?);
    }
    Ok(log)
}

/// Runs the sanitize command end to end.
pub async fn run_sanitize(opts: SanitizeOptions) -> Result<()> {
    info!("Starting logpipe operation.");
    let chain = Arc::new(build_filter_chain(&opts)?);
    let log = build_log(&opts)?;

    let (mut log, content) = sanitize_in_background(log, Arc::clone(&chain))
        .await
        .with_context(|| format!("Failed to sanitize log '{}'", opts.input))?;

    let rendered = if opts.json {
        let payload = log.upload_payload(&chain)?;
        serde_json::to_string_pretty(&payload).context("Failed to serialize upload payload")?
    } else {
        content
    };

    write_output(&opts, &rendered)?;
    info!("logpipe operation completed.");
    Ok(())
}

fn write_output(opts: &SanitizeOptions, rendered: &str) -> Result<()> {
    match &opts.output {
        Some(path) => {
            info!("Writing sanitized content to file: {}", path.display());
            let mut file = fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            writeln!(file, "{}", rendered)?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            writeln!(writer, "{}", rendered)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use logpipe_core::Limits;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    #[test]
    fn metadata_values_keep_json_scalars() {
        assert_eq!(parse_metadata("players=12").unwrap(), Metadata::new("players", 12));
        assert_eq!(parse_metadata("online=true").unwrap(), Metadata::new("online", true));
        assert_eq!(
            parse_metadata("version=1.20.4").unwrap(),
            Metadata::new("version", "1.20.4")
        );
        assert_eq!(parse_metadata("motd=a=b").unwrap(), Metadata::new("motd", "a=b"));
        assert_eq!(parse_metadata("empty=").unwrap(), Metadata::new("empty", ""));
    }

    #[test]
    fn metadata_requires_key_and_separator() {
        assert!(parse_metadata("novalue").is_err());
        assert!(parse_metadata("=value").is_err());
    }

    #[test]
    fn default_chain_without_config() {
        let chain = build_filter_chain(&SanitizeOptions::default()).unwrap();
        assert_eq!(chain, FilterChain::default_for(&Limits::default()));
    }

    #[test]
    fn limit_overrides_replace_default_limits() {
        let opts = SanitizeOptions {
            max_bytes: Some(100),
            max_lines: Some(4),
            ..Default::default()
        };
        let chain = build_filter_chain(&opts).unwrap();
        assert_eq!(chain.max_bytes(), Some(100));
        assert_eq!(chain.max_lines(), Some(4));
        assert!(chain.has_trim());
    }

    #[test]
    fn limit_overrides_tighten_explicit_filter_list() {
        let mut filters = NamedTempFile::new().unwrap();
        filters
            .write_all(br#"[{"type": "limit-lines", "data": {"limit": 10}}]"#)
            .unwrap();
        let opts = SanitizeOptions {
            filters: Some(filters.path().to_path_buf()),
            max_lines: Some(3),
            ..Default::default()
        };
        let chain = build_filter_chain(&opts).unwrap();
        assert_eq!(chain.max_lines(), Some(3));
        assert_eq!(chain.max_bytes(), None);
        assert!(!chain.has_trim());
    }

    #[test]
    fn malformed_filter_list_is_reported() {
        let mut filters = NamedTempFile::new().unwrap();
        filters.write_all(b"not json").unwrap();
        let opts = SanitizeOptions {
            filters: Some(filters.path().to_path_buf()),
            ..Default::default()
        };
        let err = build_filter_chain(&opts).unwrap_err();
        assert!(err.to_string().contains("Failed to parse filter list"));
    }

    #[test]
    fn build_log_attaches_source_and_metadata() {
        let file = tempfile::Builder::new().suffix(".log").tempfile().unwrap();
        let opts = SanitizeOptions {
            input: file.path().display().to_string(),
            source: Some("example.net".into()),
            meta: vec!["k=v".into(), "k=v".into()],
            ..Default::default()
        };
        let log = build_log(&opts).unwrap();
        assert_eq!(log.source(), Some("example.net"));
        assert_eq!(log.metadata(), vec![Metadata::new("k", "v")]);
    }

    #[test]
    fn build_log_rejects_forbidden_names() {
        let opts = SanitizeOptions {
            input: "/etc/passwd".into(),
            ..Default::default()
        };
        assert!(build_log(&opts).is_err());
    }
}
