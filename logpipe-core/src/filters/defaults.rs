//! Built-in redaction filters and the default filter chain.
//!
//! Used when the collector did not provide a filter list. The IP patterns
//! carry boundary guards so that version strings such as `1000.45.67.89` or
//! 5-digit hex groups are not mistaken for addresses, and well-known public
//! resolvers and loopback addresses are exempted.

use once_cell::sync::Lazy;

use super::compiler::RegexSpec;
use super::{Filter, FilterChain};
use crate::config::Limits;

pub const IPV4_PATTERN: &str =
    r"(?<!([0-9]|-|\w))(?:[1-2]?[0-9]{1,2}\.){3}[1-2]?[0-9]{1,2}(?!([0-9]|-|\w))";
pub const IPV4_REPLACEMENT: &str = "**.**.**.**";
pub const IPV4_EXEMPTIONS: [&str; 4] = [
    r"127\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}",
    r"0\.0\.0\.0",
    r"1\.[01]\.[01]\.1",
    r"8\.8\.[84]\.[84]",
];

pub const IPV6_PATTERN: &str =
    r"(?<!([0-9]|-|\w))(?:[0-9a-f]{0,4}:){7}[0-9a-f]{0,4}(?!([0-9]|-|\w))";
pub const IPV6_REPLACEMENT: &str = "****:****:****:****:****:****:****:****";
pub const IPV6_EXEMPTIONS: [&str; 1] = [r"[0:]+1?"];

// Compiled once per process; chains clone the compiled filters.
static IPV4_FILTER: Lazy<Filter> = Lazy::new(|| {
    Filter::regex(
        vec![RegexSpec::replacing(IPV4_PATTERN, &[], IPV4_REPLACEMENT)],
        IPV4_EXEMPTIONS.iter().map(|p| RegexSpec::new(*p, &[])).collect(),
    )
});

static IPV6_FILTER: Lazy<Filter> = Lazy::new(|| {
    Filter::regex(
        vec![RegexSpec::replacing(IPV6_PATTERN, &['i'], IPV6_REPLACEMENT)],
        IPV6_EXEMPTIONS.iter().map(|p| RegexSpec::new(*p, &[])).collect(),
    )
});

/// Redacts IPv4 addresses outside the loopback/resolver whitelist.
pub fn ipv4_filter() -> Filter {
    IPV4_FILTER.clone()
}

/// Redacts full-form IPv6 addresses, except the all-zero and loopback forms.
pub fn ipv6_filter() -> Filter {
    IPV6_FILTER.clone()
}

impl FilterChain {
    /// The canonical chain: trim, both limits, then IPv4 and IPv6 redaction.
    pub fn default_for(limits: &Limits) -> Self {
        FilterChain::new(vec![
            Filter::Trim,
            Filter::LimitBytes(limits.max_length),
            Filter::LimitLines(limits.max_lines),
            ipv4_filter(),
            ipv6_filter(),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REMOVED_IPV4: &str = "**.**.**.**";
    const REMOVED_IPV6: &str = "****:****:****:****:****:****:****:****";

    fn redact(content: &str) -> String {
        FilterChain::default_for(&Limits::default()).apply(content)
    }

    #[test]
    fn default_patterns_compile() {
        for filter in [ipv4_filter(), ipv6_filter()] {
            match filter {
                Filter::Regex(regex) => assert_eq!(regex.active_patterns(), 1),
                other => panic!("unexpected filter {:?}", other),
            }
        }
    }

    #[test]
    fn removes_ipv4() {
        assert_eq!(redact("123.45.67.89"), REMOVED_IPV4);
    }

    #[test]
    fn removes_multiple_ipv4() {
        assert_eq!(
            redact("123.45.67.89 189.123.42.34"),
            format!("{REMOVED_IPV4} {REMOVED_IPV4}")
        );
    }

    #[test]
    fn keeps_ipv4_lookalikes() {
        assert_eq!(
            redact("1000.45.67.89 189.123.42.34"),
            format!("1000.45.67.89 {REMOVED_IPV4}")
        );
        assert_eq!(redact("v1.2.3.4 1.2.3.4-beta"), "v1.2.3.4 1.2.3.4-beta");
    }

    #[test]
    fn non_ascii_letters_do_not_guard_addresses() {
        assert_eq!(
            redact("é192.168.1.5 and 10.0.0.7ü"),
            format!("é{REMOVED_IPV4} and {REMOVED_IPV4}ü")
        );
        assert_eq!(
            redact("ß9557:c600:a213:4835:fdaa:9d04:e354:ed9e"),
            format!("ß{REMOVED_IPV6}")
        );
    }

    #[test]
    fn keeps_whitelisted_ipv4() {
        let content = "127.0.0.1 127.75.75.18 0.0.0.0 1.1.1.1 1.0.0.1 8.8.8.8 8.8.8.4";
        assert_eq!(redact(content), content);
    }

    #[test]
    fn redacts_ipv4_inside_log_lines() {
        assert_eq!(
            redact("[12:00:01] [Server thread/INFO]: Steve[/10.0.0.23:51234] logged in"),
            format!("[12:00:01] [Server thread/INFO]: Steve[/{REMOVED_IPV4}:51234] logged in")
        );
    }

    #[test]
    fn removes_ipv6() {
        assert_eq!(redact("9557:c600:a213:4835:fdaa:9d04:e354:ed9e"), REMOVED_IPV6);
        assert_eq!(redact("9557:C600:A213:4835:FDAA:9D04:E354:ED9E"), REMOVED_IPV6);
    }

    #[test]
    fn removes_multiple_ipv6() {
        assert_eq!(
            redact("010b:0611:2138:c376:6c8f:a46e:af48:7014 53a6:8214:7341:e156:0c3c:ffcc:3474:e207"),
            format!("{REMOVED_IPV6} {REMOVED_IPV6}")
        );
    }

    #[test]
    fn keeps_ipv6_lookalikes() {
        let content = "10000:8214:7341:e156:0c3c:ffcc:3474:e207";
        assert_eq!(redact(content), content);
    }

    #[test]
    fn keeps_whitelisted_ipv6() {
        let content = "::1 0:0:0:0:0:0:0:0:1 ::0 0:0:0:0:0:0:0:0:0";
        assert_eq!(redact(content), content);
    }

    #[test]
    fn default_chain_carries_limits() {
        let chain = FilterChain::default_for(&Limits::new(60, 1000, 20));
        assert!(chain.has_trim());
        assert_eq!(chain.max_bytes(), Some(1000));
        assert_eq!(chain.max_lines(), Some(20));
    }
}
