//! URL exclusions.

use fancy_regex::Regex;

use crate::error::RewriteError;

/// A URL pattern that vetoes every rule of its bundle.
#[derive(Debug, Clone)]
pub struct Exclusion {
    pattern: Regex,
}

impl Exclusion {
    /// Compile an exclusion pattern. Look-around and backreferences are allowed.
    pub fn new(pattern: &str) -> Result<Self, fancy_regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// True if the pattern is found anywhere in `url`.
    #[inline]
    pub fn matches(&self, url: &str) -> Result<bool, RewriteError> {
        self.pattern
            .is_match(url)
            .map_err(|e| RewriteError::matching(self.pattern(), url, e))
    }
}
