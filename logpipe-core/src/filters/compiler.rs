//! compiler.rs - Compiles `RegexSpec`s into matchers, once.
//!
//! Filter patterns are delivered by the log collector in a dialect that uses
//! lookaround to stop matches inside longer tokens, e.g.
//! `(?<!([0-9]|-|\w))...(?!([0-9]|-|\w))`. Patterns are compiled with
//! `fancy-regex`, which backtracks through lookaround anywhere in a pattern and
//! hands the plain parts to the `regex` engine.
//!
//! The collector's `\w`, `\d` and `\s` are ASCII classes, so they are rewritten
//! before compilation; `é` is not a word character to a collector pattern.
//!
//! Compilation is fail-soft: [`RegexSpec::try_compile`] logs the problem and
//! returns `None`, and the owning filter treats the spec as a no-op.
//!
//! License: MIT OR APACHE 2.0

use fancy_regex::{Regex, RegexBuilder};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::errors::{LogPipeError, Result};

/// Upper bound on the compiled size of the `regex` parts of a single pattern.
const REGEX_SIZE_LIMIT: usize = 10 * (1 << 20);

/// A regex pattern plus modifier flags, as delivered in a filter list.
///
/// Recognized modifiers: `i` (case-insensitive), `m` (multiline), `s` (dot
/// matches newline), `u` (unicode case folding, always on in this engine).
/// `replacement` is only meaningful for redaction patterns; exemptions leave
/// it unset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct RegexSpec {
    pub pattern: String,
    #[serde(default)]
    pub modifiers: Vec<char>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,
}

impl RegexSpec {
    pub fn new(pattern: impl Into<String>, modifiers: &[char]) -> Self {
        Self {
            pattern: pattern.into(),
            modifiers: modifiers.to_vec(),
            replacement: None,
        }
    }

    pub fn replacing(pattern: impl Into<String>, modifiers: &[char], replacement: impl Into<String>) -> Self {
        Self {
            replacement: Some(replacement.into()),
            ..Self::new(pattern, modifiers)
        }
    }

    /// Compiles the spec, reporting why it failed.
    pub fn compile(&self) -> Result<CompiledPattern> {
        CompiledPattern::new(self)
    }

    /// Compiles the spec, or logs a warning and returns `None`.
    pub fn try_compile(&self) -> Option<CompiledPattern> {
        match self.compile() {
            Ok(compiled) => {
                debug!(target: "logpipe_core::filters", "Pattern '{}' compiled successfully.", self.pattern);
                Some(compiled)
            }
            Err(e) => {
                warn!("Skipping filter pattern: {}", e);
                None
            }
        }
    }
}

/// Maps modifiers to an inline flag group such as `(?is)`.
fn inline_flags(spec: &RegexSpec) -> Result<String> {
    let mut flags = String::new();
    for modifier in &spec.modifiers {
        match modifier {
            'i' | 'm' | 's' => {
                if !flags.contains(*modifier) {
                    flags.push(*modifier);
                }
            }
            'u' => {}
            other => {
                return Err(LogPipeError::InvalidFilterSpec {
                    pattern: spec.pattern.clone(),
                    reason: format!("unknown modifier '{}'", other),
                })
            }
        }
    }
    if flags.is_empty() {
        return Ok(flags);
    }
    Ok(format!("(?{})", flags))
}

/// ASCII definition of a Perl class escape, and whether it is negated.
fn ascii_class(escape: char) -> Option<(&'static str, bool)> {
    match escape {
        'w' => Some(("0-9A-Za-z_", false)),
        'W' => Some(("0-9A-Za-z_", true)),
        'd' => Some(("0-9", false)),
        'D' => Some(("0-9", true)),
        's' => Some((r"\t\n\x0B\x0C\r ", false)),
        'S' => Some((r"\t\n\x0B\x0C\r ", true)),
        _ => None,
    }
}

/// Rewrites `\w`, `\d`, `\s` and their negations into ASCII bracket classes.
///
/// Inside a bracket class the positive forms are spliced in as ranges and the
/// negated forms become nested classes. Everything else is copied verbatim.
fn ascii_classes(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 16);
    let mut chars = pattern.chars().peekable();
    let mut class_depth = 0usize;

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let Some(escaped) = chars.next() else {
                    out.push(c);
                    break;
                };
                match ascii_class(escaped) {
                    Some((set, false)) if class_depth > 0 => out.push_str(set),
                    Some((set, negated)) => {
                        out.push('[');
                        if negated {
                            out.push('^');
                        }
                        out.push_str(set);
                        out.push(']');
                    }
                    None => {
                        out.push(c);
                        out.push(escaped);
                    }
                }
            }
            '[' => {
                out.push(c);
                class_depth += 1;
                // `[]` and `[^]` start with a literal `]`.
                if chars.peek() == Some(&'^') {
                    out.push('^');
                    chars.next();
                }
                if chars.peek() == Some(&']') {
                    out.push(']');
                    chars.next();
                }
            }
            ']' if class_depth > 0 => {
                class_depth -= 1;
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

fn build(pattern: &str, original: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .delegate_size_limit(REGEX_SIZE_LIMIT)
        .build()
        .map_err(|e| LogPipeError::InvalidFilterSpec {
            pattern: original.to_string(),
            reason: e.to_string(),
        })
}

/// A compiled [`RegexSpec`].
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pattern: String,
    regex: Regex,
    anchored: Regex,
}

impl CompiledPattern {
    fn new(spec: &RegexSpec) -> Result<Self> {
        let flags = inline_flags(spec)?;
        let body = ascii_classes(&spec.pattern);
        Ok(Self {
            pattern: spec.pattern.clone(),
            regex: build(&format!("{}{}", flags, body), &spec.pattern)?,
            anchored: build(&format!(r"{}\A(?:{})\z", flags, body), &spec.pattern)?,
        })
    }

    /// True if the whole of `text` matches, like an anchored match.
    ///
    /// A match that exceeds the backtracking limit counts as no match.
    pub fn is_full_match(&self, text: &str) -> bool {
        match self.anchored.is_match(text) {
            Ok(matched) => matched,
            Err(e) => {
                warn!("Pattern '{}' gave up on a full match: {}", self.pattern, e);
                false
            }
        }
    }

    /// Iterates over non-overlapping matches as `(start, end)` byte ranges.
    ///
    /// Iteration stops early if the backtracking limit is exceeded.
    pub fn find_iter<'a>(&'a self, haystack: &'a str) -> impl Iterator<Item = (usize, usize)> + 'a {
        self.regex.find_iter(haystack).map_while(move |found| match found {
            Ok(m) => Some((m.start(), m.end())),
            Err(e) => {
                warn!("Pattern '{}' stopped matching: {}", self.pattern, e);
                None
            }
        })
    }
}
