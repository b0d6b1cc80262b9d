// logpipe-core/src/redaction_log.rs
//! Debug logging of redaction decisions.
//!
//! Matched text is personal data by definition, so it is masked in debug logs
//! unless `LOGPIPE_ALLOW_DEBUG_PII=true` is set in the environment.

use lazy_static::lazy_static;
use log::debug;

lazy_static! {
    /// Read once per process.
    static ref PII_DEBUG_ALLOWED: bool = {
        std::env::var("LOGPIPE_ALLOW_DEBUG_PII")
            .map(|s| s.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    };
}

/// Masks a sensitive value, keeping only its length for longer values.
pub fn redact_sensitive(s: &str) -> String {
    const MAX_LEN: usize = 8;
    if s.len() <= MAX_LEN {
        "[REDACTED]".to_string()
    } else {
        format!("[REDACTED: {} chars]", s.len())
    }
}

fn get_loggable_content(sensitive_content: &str) -> String {
    if *PII_DEBUG_ALLOWED {
        sensitive_content.to_string()
    } else {
        redact_sensitive(sensitive_content)
    }
}

pub(crate) fn log_redaction_debug(pattern: &str, original: &str, replacement: &str, exempted: bool) {
    if exempted {
        debug!(
            "Pattern '{}' matched exempted value '{}', kept as is.",
            pattern,
            get_loggable_content(original)
        );
    } else {
        debug!(
            "Pattern '{}' replaced '{}' with '{}'.",
            pattern,
            get_loggable_content(original),
            replacement
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_sensitive_short_string() {
        assert_eq!(redact_sensitive("1.1.1.1"), "[REDACTED]");
    }

    #[test]
    fn test_redact_sensitive_long_string() {
        assert_eq!(redact_sensitive("123.45.67.89"), "[REDACTED: 12 chars]");
    }

    #[test_log::test]
    fn test_log_redaction_debug_does_not_panic() {
        log_redaction_debug("a+", "aaa", "b", false);
        log_redaction_debug("a+", "aaa", "b", true);
    }
}
