use regex::Regex;
use tracing::debug;

use crate::error::ConfigurationError;
use crate::sys::secrets::MaskedValue;

/// 🛡️ Zero-Trust: Strictly validates a proxy host name before it ends up in a
/// command line.
pub fn validate_proxy_host(host: &str) -> Result<(), ConfigurationError> {
    if host.is_empty() {
        return Err(ConfigurationError::InvalidProxyHost("host cannot be empty".into()));
    }
    if host.contains('/') || host.contains('\\') || host.contains("..") {
        return Err(ConfigurationError::InvalidProxyHost(format!(
            "path characters detected in '{}'",
            host
        )));
    }
    // Alphanumeric, dots, hyphens, underscores. IPv6 literals keep their colons/brackets.
    if !host
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ':' | '[' | ']'))
    {
        return Err(ConfigurationError::InvalidProxyHost(format!(
            "invalid characters in '{}'",
            host
        )));
    }
    Ok(())
}

// ==============================================================================
// 1. No-Proxy Patterns
// ==============================================================================

/// Ordered host exclusions. Every pattern is anchored, so matching is against
/// the whole host name, never a substring.
#[derive(Debug, Clone, Default)]
pub struct NoProxyPatterns {
    patterns: Vec<Regex>,
}

impl NoProxyPatterns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles raw regular expressions, e.g. `internal\..*`.
    pub fn from_regexes<I, S>(patterns: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| anchored(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Parses a no-proxy host list such as `localhost, *.corp.example.com|10.*`.
    /// Entries are separated by whitespace, `,` or `|`; `*` is a wildcard and
    /// `.` is literal.
    pub fn from_hosts(list: &str) -> Result<Self, ConfigurationError> {
        let globs = list
            .split(|c: char| c.is_whitespace() || c == ',' || c == '|')
            .filter(|entry| !entry.is_empty())
            .map(|entry| entry.replace('.', "\\.").replace('*', ".*"));
        Self::from_regexes(globs)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Index of the first pattern matching `host`. Later patterns are not tried.
    pub fn first_match(&self, host: &str) -> Option<usize> {
        self.patterns.iter().position(|p| p.is_match(host))
    }
}

fn anchored(pattern: &str) -> Result<Regex, ConfigurationError> {
    Regex::new(&format!("^(?:{})$", pattern)).map_err(|source| {
        ConfigurationError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        }
    })
}

// ==============================================================================
// 2. Proxy Policy
// ==============================================================================

/// Snapshot of the network proxy configuration for one invocation.
#[derive(Debug, Default)]
pub struct ProxyPolicy {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<MaskedValue>,
    pub no_proxy: NoProxyPatterns,
}

impl ProxyPolicy {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: Some(host.into()),
            port: Some(port),
            ..Self::default()
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<MaskedValue>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_no_proxy(mut self, no_proxy: NoProxyPatterns) -> Self {
        self.no_proxy = no_proxy;
        self
    }

    /// The configured proxy host; blank names count as "no proxy".
    pub fn proxy_host(&self) -> Option<&str> {
        self.host.as_deref().map(str::trim).filter(|h| !h.is_empty())
    }

    /// Proxy credentials are sent only when a non-blank username is set.
    pub fn proxy_username(&self) -> Option<&str> {
        self.username.as_deref().filter(|u| !u.trim().is_empty())
    }
}

/// Decides whether traffic to `destination_host` goes through the proxy.
///
/// Never fails: a missing or blank proxy host simply means "no proxy".
pub fn is_proxy_applicable(policy: &ProxyPolicy, destination_host: &str) -> bool {
    if policy.proxy_host().is_none() {
        return false;
    }
    match policy.no_proxy.first_match(destination_host) {
        Some(idx) => {
            debug!("Host {} excluded from proxying by no-proxy pattern #{}", destination_host, idx);
            false
        }
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy_with(patterns: &[&str]) -> ProxyPolicy {
        ProxyPolicy::new("proxy.local", 8080)
            .with_no_proxy(NoProxyPatterns::from_regexes(patterns).unwrap())
    }

    #[test]
    fn no_proxy_host_means_not_applicable() {
        let policy = ProxyPolicy::default();
        assert!(!is_proxy_applicable(&policy, "external.example.com"));
    }

    #[test]
    fn blank_proxy_host_means_not_applicable() {
        let mut policy = ProxyPolicy::new("   ", 8080);
        assert!(!is_proxy_applicable(&policy, "external.example.com"));
        policy.host = Some(String::new());
        assert!(!is_proxy_applicable(&policy, "external.example.com"));
    }

    #[test]
    fn empty_pattern_list_always_applies() {
        let policy = policy_with(&[]);
        assert!(is_proxy_applicable(&policy, "anything.example.com"));
        assert!(is_proxy_applicable(&policy, ""));
    }

    #[test]
    fn matching_pattern_excludes_host() {
        let policy = policy_with(&["internal\\..*"]);
        assert!(!is_proxy_applicable(&policy, "internal.example.com"));
        assert!(is_proxy_applicable(&policy, "external.example.com"));
    }

    #[test]
    fn patterns_match_whole_host_only() {
        let policy = policy_with(&["example\\.com"]);
        assert!(!is_proxy_applicable(&policy, "example.com"));
        assert!(is_proxy_applicable(&policy, "api.example.com"));
        assert!(is_proxy_applicable(&policy, "example.com.evil.net"));
    }

    #[test]
    fn first_match_wins() {
        let patterns = NoProxyPatterns::from_regexes(["nomatch", "ct\\..*", ".*"]).unwrap();
        assert_eq!(patterns.first_match("ct.example.com"), Some(1));
        assert_eq!(patterns.first_match("other.example.com"), Some(2));
        assert!(!is_proxy_applicable(&policy_with(&["nomatch", "ct\\..*"]), "ct.example.com"));
    }

    #[test]
    fn alternation_is_anchored_as_a_whole() {
        let patterns = NoProxyPatterns::from_regexes(["a|b"]).unwrap();
        assert_eq!(patterns.first_match("a"), Some(0));
        assert_eq!(patterns.first_match("ab"), None);
        assert_eq!(patterns.first_match("xb"), None);
    }

    #[test]
    fn host_globs_are_converted() {
        let patterns = NoProxyPatterns::from_hosts("localhost, *.corp.example.com|10.*\n\n").unwrap();
        assert_eq!(patterns.len(), 3);
        assert_eq!(patterns.first_match("localhost"), Some(0));
        assert_eq!(patterns.first_match("ci.corp.example.com"), Some(1));
        assert_eq!(patterns.first_match("10.0.0.7"), Some(2));
        // '.' is literal after conversion
        assert_eq!(patterns.first_match("localhostX"), None);
        assert_eq!(patterns.first_match("ciXcorpXexampleXcom"), None);
    }

    #[test]
    fn blank_host_list_yields_no_patterns() {
        assert!(NoProxyPatterns::from_hosts("  , | \t").unwrap().is_empty());
    }

    #[test]
    fn invalid_regex_is_a_configuration_error() {
        let err = NoProxyPatterns::from_regexes(["(unclosed"]).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidPattern { .. }));
    }

    #[test]
    fn blank_username_is_not_a_credential() {
        let policy = ProxyPolicy::new("proxy.local", 3128).with_credentials("  ", "pw");
        assert!(policy.proxy_username().is_none());
        let policy = ProxyPolicy::new("proxy.local", 3128).with_credentials("bob", "pw");
        assert_eq!(policy.proxy_username(), Some("bob"));
    }

    #[test]
    fn test_validate_proxy_host_valid() {
        assert!(validate_proxy_host("proxy.local").is_ok());
        assert!(validate_proxy_host("my-proxy_01.corp").is_ok());
        assert!(validate_proxy_host("10.1.2.3").is_ok());
        assert!(validate_proxy_host("[::1]").is_ok());
    }

    #[test]
    fn test_validate_proxy_host_invalid() {
        assert!(validate_proxy_host("").is_err());
        assert!(validate_proxy_host("proxy local").is_err());
        assert!(validate_proxy_host("proxy;rm").is_err());
        assert!(validate_proxy_host("../proxy").is_err());
        assert!(validate_proxy_host("proxy/path").is_err());
        assert!(validate_proxy_host("proxy\n").is_err());
    }
}
