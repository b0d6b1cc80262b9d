// logpipe-core/src/log.rs
//! A log on its way to the collector.
//!
//! [`Log`] ties a [`LogSource`] to a [`FilterChain`]: the first call to
//! [`Log::content`] streams the source through a [`BoundedReader`], applies the
//! chain and caches the result. The source tag and [`Metadata`] records are
//! carried along for the upload payload.
//!
//! License: MIT OR APACHE 2.0

use std::fmt;
use std::path::PathBuf;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::Limits;
use crate::errors::Result;
use crate::filters::FilterChain;
use crate::reader::BoundedReader;
use crate::source::LogSource;

/// A key/value record attached to a log.
///
/// Two records are equal only if all four fields are equal, so a log may carry
/// several records with the same key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub key: String,
    pub value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

impl Metadata {
    /// A visible record without a label.
    pub fn new(key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            label: None,
            visible: true,
        }
    }

    pub fn with_label(
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
        label: Option<String>,
        visible: bool,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            label,
            visible,
        }
    }
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Metadata{{key='{}', value=", self.key)?;
        match &self.value {
            serde_json::Value::String(s) => write!(f, "{}", s)?,
            other => write!(f, "{}", other)?,
        }
        write!(
            f,
            ", label='{}', visible={}}}",
            self.label.as_deref().unwrap_or("null"),
            self.visible
        )
    }
}

/// What the transport sends to the collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadPayload {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub metadata: Vec<Metadata>,
}

#[derive(Debug, Clone)]
pub struct Log {
    log_source: LogSource,
    content: Option<String>,
    source: Option<String>,
    metadata: Vec<Metadata>,
}

impl Log {
    pub fn new(log_source: LogSource) -> Self {
        Self {
            log_source,
            content: None,
            source: None,
            metadata: Vec::new(),
        }
    }

    /// A log backed by a file. The file name is validated here; the file itself
    /// is not opened until the content is requested.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::new(LogSource::file(path)?))
    }

    pub fn from_string(content: impl Into<String>) -> Self {
        Self::new(LogSource::in_memory(content))
    }

    pub fn log_source(&self) -> &LogSource {
        &self.log_source
    }

    /// Returns the sanitized content, computing it on the first call.
    ///
    /// Later calls return the cached value whatever `chain` is passed and do not
    /// touch the source again.
    pub fn content(&mut self, chain: &FilterChain) -> Result<&str> {
        let content = match self.content.take() {
            Some(cached) => {
                debug!("Returning cached log content ({} bytes).", cached.len());
                cached
            }
            None => self.read_filtered(chain)?,
        };
        Ok(self.content.insert(content).as_str())
    }

    fn read_filtered(&self, chain: &FilterChain) -> Result<String> {
        let reader = BoundedReader::with_limits(
            self.log_source.open()?,
            chain.max_bytes(),
            chain.max_lines(),
            chain.has_trim(),
        );
        let raw = reader.read_to_string()?;
        reader.close()?;

        let sanitized = chain.apply(&raw);
        info!(
            "Read {} bytes of log content, {} bytes after filtering.",
            raw.len(),
            sanitized.len()
        );
        Ok(sanitized)
    }

    /// Content with the default chain for the given collector limits.
    pub fn content_for_limits(&mut self, limits: &Limits) -> Result<&str> {
        let chain = FilterChain::default_for(limits);
        self.content(&chain)
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Sets the name of the log source, e.g. a domain or software name.
    pub fn set_source(&mut self, source: Option<String>) -> &mut Self {
        self.source = source;
        self
    }

    /// Adds a record unless an identical one is already present.
    pub fn add_metadata(&mut self, data: Metadata) -> &mut Self {
        if !self.metadata.contains(&data) {
            self.metadata.push(data);
        }
        self
    }

    /// Replaces all records. Identical records are collapsed into one.
    pub fn set_metadata(&mut self, metadata: impl IntoIterator<Item = Metadata>) -> &mut Self {
        self.metadata.clear();
        for data in metadata {
            self.add_metadata(data);
        }
        self
    }

    /// A copy of the attached records.
    pub fn metadata(&self) -> Vec<Metadata> {
        self.metadata.clone()
    }

    /// Builds the upload payload, reading the content if needed.
    pub fn upload_payload(&mut self, chain: &FilterChain) -> Result<UploadPayload> {
        let content = self.content(chain)?.to_string();
        Ok(UploadPayload {
            content,
            source: self.source.clone(),
            metadata: self.metadata.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LogPipeError;
    use crate::filters::Filter;
    use std::io::Write;

    #[test]
    fn content_applies_chain() {
        let mut log = Log::from_string("  hello 123.45.67.89\nsecond\nthird");
        let chain = FilterChain::default_for(&Limits::new(60, 1000, 2));
        assert_eq!(log.content(&chain).unwrap(), "hello **.**.**.**\nsecond");
    }

    #[test]
    fn content_is_cached() {
        let mut file = tempfile::Builder::new().suffix(".log").tempfile().unwrap();
        write!(file, "first read").unwrap();
        let path = file.path().to_path_buf();

        let mut log = Log::from_path(&path).unwrap();
        assert_eq!(log.content(&FilterChain::default()).unwrap(), "first read");

        file.close().unwrap();
        assert!(!path.exists());

        let other = FilterChain::new(vec![Filter::LimitBytes(1)]);
        assert_eq!(log.content(&other).unwrap(), "first read");
    }

    #[test]
    fn content_for_limits_uses_default_chain() {
        let log = Log::from_path("logs/latest.log.1.gz").unwrap();
        assert_eq!(log.log_source().path(), Some(std::path::Path::new("logs/latest.log.1.gz")));

        let mut log = Log::from_string("a 8.8.8.8 b 8.8.8.9\nc");
        assert_eq!(log.log_source().path(), None);
        assert_eq!(
            log.content_for_limits(&Limits::new(60, 1000, 1)).unwrap(),
            "a 8.8.8.8 b **.**.**.**"
        );
    }

    #[test]
    fn missing_file_fails_on_content() {
        let mut log = Log::from_path("/definitely/not/here/latest.log").unwrap();
        assert!(matches!(
            log.content(&FilterChain::default()),
            Err(LogPipeError::NotFound(_))
        ));
    }

    #[test]
    fn forbidden_path_fails_on_construction() {
        assert!(matches!(
            Log::from_path("/etc/shadow"),
            Err(LogPipeError::InputRejected(_))
        ));
    }

    #[test]
    fn source_round_trip() {
        let mut log = Log::from_string("x");
        assert_eq!(log.source(), None);
        log.set_source(Some("example.net".to_string()));
        assert_eq!(log.source(), Some("example.net"));
        log.set_source(None);
        assert_eq!(log.source(), None);
    }

    #[test]
    fn metadata_has_set_semantics() {
        let mut log = Log::from_string("x");
        log.add_metadata(Metadata::new("version", "1.20.4"))
            .add_metadata(Metadata::new("version", "1.20.4"))
            .add_metadata(Metadata::with_label("version", "1.20.4", Some("Version".into()), true))
            .add_metadata(Metadata::new("players", 12));
        assert_eq!(log.metadata().len(), 3);

        log.set_metadata(vec![Metadata::new("a", 1), Metadata::new("a", 1)]);
        assert_eq!(log.metadata(), vec![Metadata::new("a", 1)]);
    }

    #[test]
    fn metadata_getter_returns_copy() {
        let mut log = Log::from_string("x");
        log.add_metadata(Metadata::new("k", "v"));
        let mut copy = log.metadata();
        copy.clear();
        assert_eq!(log.metadata().len(), 1);
    }

    #[test]
    fn metadata_display() {
        let metadata = Metadata::with_label("key", "value", Some("label".into()), true);
        assert_eq!(
            metadata.to_string(),
            "Metadata{key='key', value=value, label='label', visible=true}"
        );
        assert_eq!(
            Metadata::new("num", 42).to_string(),
            "Metadata{key='num', value=42, label='null', visible=true}"
        );
    }

    #[test]
    fn metadata_equality_covers_all_fields() {
        let base = Metadata::with_label("key", "value", Some("label".into()), true);
        assert_eq!(base, Metadata::with_label("key", "value", Some("label".into()), true));
        assert_ne!(base, Metadata::with_label("key", "value", None, true));
        assert_ne!(base, Metadata::with_label("key", "value", Some("label".into()), false));
        assert_ne!(base, Metadata::with_label("other", "value", Some("label".into()), true));
        assert_ne!(base, Metadata::with_label("key", 42, Some("label".into()), true));
    }

    #[test]
    fn upload_payload_serializes() {
        let mut log = Log::from_string("line");
        log.add_metadata(Metadata::new("k", "v"));
        let payload = log.upload_payload(&FilterChain::default()).unwrap();
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "content": "line",
                "metadata": [{"key": "k", "value": "v", "visible": true}]
            })
        );
    }
}
