//! Host targeting.
//!
//! A target is either an exact hostname or a `*.suffix` wildcard that covers
//! `suffix` itself and every subdomain of it.

/// A host predicate gating whether a bundle applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    host: String,
}

impl Target {
    /// Create a target; the pattern is normalized to lowercase.
    pub fn new(host: &str) -> Self {
        Self {
            host: host.trim().to_ascii_lowercase(),
        }
    }

    /// The normalized host pattern.
    pub fn host(&self) -> &str {
        &self.host
    }

    #[inline]
    pub fn is_wildcard(&self) -> bool {
        self.host.starts_with("*.")
    }

    /// Check whether `host` is covered by this target, ignoring ASCII case.
    pub fn matches(&self, host: &str) -> bool {
        match self.host.strip_prefix("*.") {
            Some(suffix) => {
                if host.eq_ignore_ascii_case(suffix) {
                    return true;
                }
                // Keep the leading dot so "badexample.com" is not covered.
                let dotted = &self.host[1..];
                host.len() > dotted.len()
                    && host.is_char_boundary(host.len() - dotted.len())
                    && host[host.len() - dotted.len()..].eq_ignore_ascii_case(dotted)
            }
            None => host.eq_ignore_ascii_case(&self.host),
        }
    }
}
