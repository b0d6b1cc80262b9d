// logpipe-core/src/filters/mod.rs
//! Content filters applied to a log before upload.
//!
//! A [`FilterChain`] is an ordered list of [`Filter`]s. Limits found in the
//! chain also parameterize the streaming [`BoundedReader`](crate::reader::BoundedReader),
//! so truncation happens while reading; `Filter::apply` then runs over the
//! materialized string in chain order.
//!
//! Chains are usually delivered by the log collector as JSON:
//!
//! ```json
//! [
//!   {"type": "trim", "data": {}},
//!   {"type": "limit-bytes", "data": {"limit": 10485760}},
//!   {"type": "limit-lines", "data": {"limit": 25000}},
//!   {"type": "regex", "data": {
//!       "patterns": [{"pattern": "secret-\\d+", "modifiers": ["i"], "replacement": "***"}],
//!       "exemptions": [{"pattern": "secret-0", "modifiers": []}]
//!   }}
//! ]
//! ```
//!
//! License: MIT OR APACHE 2.0

pub mod compiler;
pub mod defaults;

use std::borrow::Cow;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::reader::is_trimmable;
use crate::redaction_log::log_redaction_debug;
use compiler::{CompiledPattern, RegexSpec};

/// A spec together with its one-time compilation result.
#[derive(Debug, Clone)]
struct CompiledSpec {
    spec: RegexSpec,
    compiled: Option<CompiledPattern>,
}

impl CompiledSpec {
    fn new(spec: RegexSpec) -> Self {
        let compiled = spec.try_compile();
        Self { spec, compiled }
    }
}

/// Regex redaction with whitelist exemptions.
///
/// Each pattern is applied in order over the output of the previous one.
/// A match is left untouched when any exemption matches the *whole* matched
/// text; otherwise it is replaced by the pattern's replacement, literally.
#[derive(Debug, Clone)]
pub struct RegexFilter {
    patterns: Vec<CompiledSpec>,
    exemptions: Vec<CompiledSpec>,
}

impl RegexFilter {
    /// Compiles all specs. Specs that fail to compile are kept as no-ops.
    pub fn new(patterns: Vec<RegexSpec>, exemptions: Vec<RegexSpec>) -> Self {
        Self {
            patterns: patterns.into_iter().map(CompiledSpec::new).collect(),
            exemptions: exemptions.into_iter().map(CompiledSpec::new).collect(),
        }
    }

    pub fn patterns(&self) -> impl Iterator<Item = &RegexSpec> {
        self.patterns.iter().map(|p| &p.spec)
    }

    pub fn exemptions(&self) -> impl Iterator<Item = &RegexSpec> {
        self.exemptions.iter().map(|e| &e.spec)
    }

    /// Number of patterns that compiled and will actually be applied.
    pub fn active_patterns(&self) -> usize {
        self.patterns.iter().filter(|p| p.compiled.is_some()).count()
    }

    fn is_exempted(&self, candidate: &str) -> bool {
        self.exemptions
            .iter()
            .filter_map(|e| e.compiled.as_ref())
            .any(|e| e.is_full_match(candidate))
    }

    /// Returns `None` when nothing was replaced.
    fn replace_all(&self, pattern: &CompiledSpec, compiled: &CompiledPattern, input: &str) -> Option<String> {
        let replacement = pattern.spec.replacement.as_deref().unwrap_or_default();
        let mut output = String::new();
        let mut last_end = 0;
        let mut replaced = 0usize;

        for (start, end) in compiled.find_iter(input) {
            let candidate = &input[start..end];
            let exempted = self.is_exempted(candidate);
            log_redaction_debug(&pattern.spec.pattern, candidate, replacement, exempted);
            if exempted {
                continue;
            }
            output.push_str(&input[last_end..start]);
            output.push_str(replacement);
            last_end = end;
            replaced += 1;
        }

        if replaced == 0 {
            return None;
        }
        output.push_str(&input[last_end..]);
        debug!("Pattern '{}' replaced {} match(es).", pattern.spec.pattern, replaced);
        Some(output)
    }

    pub fn apply(&self, input: &str) -> String {
        let mut content = Cow::Borrowed(input);
        for pattern in &self.patterns {
            let Some(compiled) = &pattern.compiled else {
                continue;
            };
            if let Some(replaced) = self.replace_all(pattern, compiled, &content) {
                content = Cow::Owned(replaced);
            }
        }
        content.into_owned()
    }
}

impl PartialEq for RegexFilter {
    fn eq(&self, other: &Self) -> bool {
        self.patterns().eq(other.patterns()) && self.exemptions().eq(other.exemptions())
    }
}

/// A single content transform.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(from = "FilterData", into = "FilterData")]
pub enum Filter {
    /// Strips leading and trailing whitespace.
    Trim,
    /// Legacy truncation to the first `n` *characters*. Byte-accurate
    /// truncation happens in the reader, which this limit also parameterizes.
    LimitBytes(usize),
    /// Keeps the first `n` `\n`-separated lines.
    LimitLines(usize),
    /// Regex redaction.
    Regex(RegexFilter),
}

impl Filter {
    pub fn regex(patterns: Vec<RegexSpec>, exemptions: Vec<RegexSpec>) -> Self {
        Filter::Regex(RegexFilter::new(patterns, exemptions))
    }

    /// Wire name of the filter type.
    pub fn kind(&self) -> &'static str {
        match self {
            Filter::Trim => "trim",
            Filter::LimitBytes(_) => "limit-bytes",
            Filter::LimitLines(_) => "limit-lines",
            Filter::Regex(_) => "regex",
        }
    }

    pub fn apply(&self, input: &str) -> String {
        match self {
            Filter::Trim => input.trim_matches(is_trimmable).to_string(),
            Filter::LimitBytes(limit) => match input.char_indices().nth(*limit) {
                Some((cut, _)) => input[..cut].to_string(),
                None => input.to_string(),
            },
            Filter::LimitLines(limit) => input
                .split('\n')
                .take(*limit)
                .collect::<Vec<_>>()
                .join("\n"),
            Filter::Regex(regex) => regex.apply(input),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct LimitData {
    limit: usize,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
struct RegexData {
    #[serde(default)]
    patterns: Vec<RegexSpec>,
    #[serde(default)]
    exemptions: Option<Vec<RegexSpec>>,
}

/// Wire representation: `{"type": ..., "data": {...}}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
enum FilterData {
    Trim {},
    LimitBytes(LimitData),
    LimitLines(LimitData),
    Regex(RegexData),
}

impl From<FilterData> for Filter {
    fn from(data: FilterData) -> Self {
        match data {
            FilterData::Trim {} => Filter::Trim,
            FilterData::LimitBytes(d) => Filter::LimitBytes(d.limit),
            FilterData::LimitLines(d) => Filter::LimitLines(d.limit),
            FilterData::Regex(d) => Filter::regex(d.patterns, d.exemptions.unwrap_or_default()),
        }
    }
}

impl From<Filter> for FilterData {
    fn from(filter: Filter) -> Self {
        match filter {
            Filter::Trim => FilterData::Trim {},
            Filter::LimitBytes(limit) => FilterData::LimitBytes(LimitData { limit }),
            Filter::LimitLines(limit) => FilterData::LimitLines(LimitData { limit }),
            Filter::Regex(regex) => FilterData::Regex(RegexData {
                patterns: regex.patterns().cloned().collect(),
                exemptions: Some(regex.exemptions().cloned().collect()),
            }),
        }
    }
}

/// An ordered list of filters. Immutable once built and cheap to share.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct FilterChain {
    filters: Vec<Filter>,
}

impl FilterChain {
    pub fn new(filters: Vec<Filter>) -> Self {
        Self { filters }
    }

    /// Parses a filter list in the collector's JSON format.
    pub fn from_json(json: &str) -> Result<Self> {
        let chain: FilterChain = serde_json::from_str(json)?;
        debug!(
            "Parsed filter list: {:?}",
            chain.filters.iter().map(Filter::kind).collect::<Vec<_>>()
        );
        Ok(chain)
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Smallest `LimitBytes` in the chain, `None` if there is none.
    pub fn max_bytes(&self) -> Option<usize> {
        self.filters
            .iter()
            .filter_map(|f| match f {
                Filter::LimitBytes(limit) => Some(*limit),
                _ => None,
            })
            .min()
    }

    /// Smallest `LimitLines` in the chain, `None` if there is none.
    pub fn max_lines(&self) -> Option<usize> {
        self.filters
            .iter()
            .filter_map(|f| match f {
                Filter::LimitLines(limit) => Some(*limit),
                _ => None,
            })
            .min()
    }

    pub fn has_trim(&self) -> bool {
        self.filters.iter().any(|f| matches!(f, Filter::Trim))
    }

    /// Runs every filter over `content`, in order.
    pub fn apply(&self, content: &str) -> String {
        self.filters
            .iter()
            .fold(content.to_string(), |acc, filter| filter.apply(&acc))
    }
}

impl From<Vec<Filter>> for FilterChain {
    fn from(filters: Vec<Filter>) -> Self {
        Self::new(filters)
    }
}
