//! Core Matching Engine
//!
//! This is the hot path - every request goes through here. The host is
//! resolved once per request, then bundles are tried in load order until one
//! rewrites the URL.

use crate::error::RewriteError;
use crate::exclusion::Exclusion;
use crate::rule::RewriteRule;
use crate::target::Target;
use crate::types::RewriteResult;
use crate::url::host_or_resolve;

// =============================================================================
// Rule Bundle
// =============================================================================

/// Targets, exclusions and rules loaded from one rule document.
#[derive(Debug, Clone)]
pub struct RuleBundle {
    pub name: String,
    pub targets: Vec<Target>,
    pub exclusions: Vec<Exclusion>,
    pub rules: Vec<RewriteRule>,
    pub enabled: bool,
}

impl RuleBundle {
    /// Create an empty, enabled bundle.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            targets: Vec::new(),
            exclusions: Vec::new(),
            rules: Vec::new(),
            enabled: true,
        }
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.targets.push(target);
        self
    }

    pub fn with_exclusion(mut self, exclusion: Exclusion) -> Self {
        self.exclusions.push(exclusion);
        self
    }

    pub fn with_rule(mut self, rule: RewriteRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Check whether any target covers `host`.
    #[inline]
    pub fn targets_host(&self, host: &str) -> bool {
        self.targets.iter().any(|t| t.matches(host))
    }

    /// Try to rewrite `url`.
    ///
    /// `host` is derived from `url` when not supplied; a URL that cannot be
    /// parsed then yields an error, as does a pattern that fails at match time.
    pub fn apply(&self, url: &str, host: Option<&str>) -> Result<RewriteResult, RewriteError> {
        let host = host_or_resolve(url, host)?;
        self.apply_resolved(url, &host)
    }

    /// Evaluate against an already resolved, lowercased host.
    pub(crate) fn apply_resolved(&self, url: &str, host: &str) -> Result<RewriteResult, RewriteError> {
        if !self.targets_host(host) {
            return Ok(RewriteResult::pass(url));
        }

        for exclusion in &self.exclusions {
            if exclusion.matches(url)? {
                log::debug!("bundle {:?}: {} excluded", self.name, url);
                return Ok(RewriteResult::pass(url));
            }
        }

        for (index, rule) in self.rules.iter().enumerate() {
            if let Some(rewritten) = rule.apply(url)? {
                return Ok(RewriteResult::redirect(rewritten, &self.name, index));
            }
        }

        Ok(RewriteResult::pass(url))
    }
}

// =============================================================================
// Rule Set
// =============================================================================

/// The ordered collection of enabled bundles consulted per request.
///
/// Built once at startup and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    bundles: Vec<RuleBundle>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a bundle. Disabled bundles never enter the set; returns whether
    /// the bundle was added.
    pub fn push(&mut self, bundle: RuleBundle) -> bool {
        if !bundle.enabled {
            log::debug!("skipping disabled bundle {:?}", bundle.name);
            return false;
        }
        self.bundles.push(bundle);
        true
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RuleBundle> {
        self.bundles.iter()
    }

    /// Try every bundle in order; the first one that rewrites `url` wins.
    /// An error from any bundle ends the search.
    pub fn apply(&self, url: &str, host: Option<&str>) -> Result<RewriteResult, RewriteError> {
        let host = host_or_resolve(url, host)?;

        for bundle in &self.bundles {
            let result = bundle.apply_resolved(url, &host)?;
            if result.is_applied() {
                return Ok(result);
            }
        }

        Ok(RewriteResult::pass(url))
    }
}

impl FromIterator<RuleBundle> for RuleSet {
    fn from_iter<I: IntoIterator<Item = RuleBundle>>(iter: I) -> Self {
        let mut set = RuleSet::new();
        for bundle in iter {
            set.push(bundle);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MatchDecision;

    fn rule(from: &str, to: &str) -> RewriteRule {
        RewriteRule::new(from, to).unwrap()
    }

    fn example_bundle() -> RuleBundle {
        RuleBundle::new("Example")
            .with_target(Target::new("example.com"))
            .with_target(Target::new("*.example.com"))
            .with_exclusion(Exclusion::new(r"^http://plain\.example\.com/").unwrap())
            .with_rule(rule(r"^http://(.+)$", "https://$1"))
    }

    #[test]
    fn test_bundle_rewrites_target() {
        let result = example_bundle().apply("http://www.example.com/a", None).unwrap();
        assert_eq!(result.decision, MatchDecision::Redirect);
        assert_eq!(result.url, "https://www.example.com/a");
        assert_eq!(result.bundle.as_deref(), Some("Example"));
        assert_eq!(result.rule_index, Some(0));
    }

    #[test]
    fn test_bundle_skips_other_hosts() {
        let result = example_bundle().apply("http://example.org/a", None).unwrap();
        assert_eq!(result, RewriteResult::pass("http://example.org/a"));
    }

    #[test]
    fn test_bundle_uses_supplied_host() {
        let bundle = example_bundle();
        let result = bundle.apply("http://example.org/a", Some("example.com")).unwrap();
        assert!(result.is_applied());
        assert_eq!(result.url, "https://example.org/a");
    }

    #[test]
    fn test_exclusion_vetoes_rules() {
        let result = example_bundle()
            .apply("http://plain.example.com/a", None)
            .unwrap();
        assert!(!result.is_applied());
        assert_eq!(result.url, "http://plain.example.com/a");
    }

    #[test]
    fn test_first_rule_wins() {
        let bundle = RuleBundle::new("Ordered")
            .with_target(Target::new("example.com"))
            .with_rule(rule(r"^http://example\.com/", "https://first.example.com/"))
            .with_rule(rule(r"^http://", "https://"));

        let result = bundle.apply("http://example.com/x", None).unwrap();
        assert_eq!(result.url, "https://first.example.com/x");
        assert_eq!(result.rule_index, Some(0));
    }

    #[test]
    fn test_later_rule_when_first_misses() {
        let bundle = RuleBundle::new("Ordered")
            .with_target(Target::new("example.com"))
            .with_rule(rule(r"^http://example\.com/secure/", "https://example.com/secure/"))
            .with_rule(rule(r"^http:", "https:"));

        let result = bundle.apply("http://example.com/x", None).unwrap();
        assert_eq!(result.url, "https://example.com/x");
        assert_eq!(result.rule_index, Some(1));
    }

    #[test]
    fn test_no_rule_matches() {
        let bundle = RuleBundle::new("Narrow")
            .with_target(Target::new("example.com"))
            .with_rule(rule(r"^http://example\.com/only/", "https://example.com/only/"));

        let result = bundle.apply("http://example.com/other", None).unwrap();
        assert!(!result.is_applied());
    }

    #[test]
    fn test_bundle_invalid_url() {
        assert!(example_bundle().apply("http://exa mple.com/", None).is_err());
    }

    #[test]
    fn test_bundle_relative_url_passes() {
        let result = example_bundle().apply("/relative/path", None).unwrap();
        assert_eq!(result, RewriteResult::pass("/relative/path"));
    }

    #[test]
    fn test_port_not_covered_by_bare_host() {
        let bundle = RuleBundle::new("Bare")
            .with_target(Target::new("example.com"))
            .with_rule(rule(r"^http:", "https:"));

        let result = bundle.apply("http://example.com:8080/a", None).unwrap();
        assert!(!result.is_applied());
        assert_eq!(result.url, "http://example.com:8080/a");

        let result = bundle.apply("http://example.com:80/a", None).unwrap();
        assert!(result.is_applied());

        let with_port = RuleBundle::new("Port")
            .with_target(Target::new("example.com:8080"))
            .with_rule(rule(r"^http:", "https:"));
        let result = with_port.apply("http://example.com:8080/a", None).unwrap();
        assert_eq!(result.url, "https://example.com:8080/a");
    }

    #[test]
    fn test_lookahead_exclusion_vetoes() {
        let bundle = RuleBundle::new("Lookahead")
            .with_target(Target::new("*.a.com"))
            .with_exclusion(Exclusion::new(r"^http://a\.com/(?!secure/)").unwrap())
            .with_rule(rule(r"^http://(?!plain\.)(\w+\.)?a\.com/", "https://$1a.com/"));

        let result = bundle.apply("http://a.com/blog", None).unwrap();
        assert!(!result.is_applied());

        let result = bundle.apply("http://a.com/secure/x", None).unwrap();
        assert_eq!(result.url, "https://a.com/secure/x");

        let result = bundle.apply("http://plain.a.com/x", None).unwrap();
        assert!(!result.is_applied());
    }

    #[test]
    fn test_disabled_bundle_never_added() {
        let mut set = RuleSet::new();
        assert!(!set.push(example_bundle().disabled()));
        assert!(set.is_empty());

        let result = set.apply("http://www.example.com/a", None).unwrap();
        assert!(!result.is_applied());
    }

    #[test]
    fn test_first_applicable_bundle_wins() {
        let first = RuleBundle::new("First")
            .with_target(Target::new("example.com"))
            .with_rule(rule(r"^http://example\.com/never/", "https://never/"));
        let second = RuleBundle::new("Second")
            .with_target(Target::new("example.com"))
            .with_rule(rule(r"^http:", "https:"));
        let third = RuleBundle::new("Third")
            .with_target(Target::new("example.com"))
            .with_rule(rule(r"^http://", "https://third."));

        let set: RuleSet = vec![first, second, third].into_iter().collect();
        assert_eq!(set.len(), 3);

        let result = set.apply("http://example.com/u", None).unwrap();
        assert_eq!(result.url, "https://example.com/u");
        assert_eq!(result.bundle.as_deref(), Some("Second"));
    }

    #[test]
    fn test_ruleset_invalid_url() {
        let set: RuleSet = vec![example_bundle()].into_iter().collect();
        let err = set.apply("http://example.com:99999/", None).unwrap_err();
        assert!(matches!(err, RewriteError::InvalidUrl { .. }));
    }

    #[test]
    fn test_empty_ruleset_passes() {
        let set = RuleSet::new();
        let result = set.apply("http://example.com/", None).unwrap();
        assert_eq!(result, RewriteResult::pass("http://example.com/"));
    }

    #[test]
    fn test_ruleset_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RuleSet>();
    }
}
