//! Core type definitions shared by the matching engine and its callers.

// =============================================================================
// Match Result
// =============================================================================

/// Final decision for a request URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchDecision {
    /// No bundle rewrote the URL; the proxy should pass it through.
    Pass,
    /// A rule fired; the proxy should redirect to the rewritten URL.
    Redirect,
}

/// Result of evaluating a URL against a bundle or a rule set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteResult {
    /// The final decision for this URL
    pub decision: MatchDecision,
    /// Rewritten URL on redirect, the original URL otherwise
    pub url: String,
    /// Name of the bundle whose rule fired (for logging)
    pub bundle: Option<String>,
    /// Declaration index of the rule that fired within its bundle (for logging)
    pub rule_index: Option<usize>,
}

impl RewriteResult {
    /// A pass-through result carrying the untouched URL.
    pub fn pass(url: &str) -> Self {
        Self {
            decision: MatchDecision::Pass,
            url: url.to_string(),
            bundle: None,
            rule_index: None,
        }
    }

    /// A redirect result produced by rule `rule_index` of `bundle`.
    pub fn redirect(url: String, bundle: &str, rule_index: usize) -> Self {
        Self {
            decision: MatchDecision::Redirect,
            url,
            bundle: Some(bundle.to_string()),
            rule_index: Some(rule_index),
        }
    }

    #[inline]
    pub fn is_applied(&self) -> bool {
        self.decision == MatchDecision::Redirect
    }
}
