//! Errors raised while evaluating a request URL.

/// Error raised while evaluating a request URL.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    #[error("invalid URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: ::url::ParseError,
    },
    /// A pattern gave up on this URL, e.g. by hitting the backtracking limit.
    #[error("pattern {pattern:?} failed on {url:?}: {source}")]
    Match {
        pattern: String,
        url: String,
        #[source]
        source: fancy_regex::Error,
    },
}

impl RewriteError {
    pub(crate) fn matching(pattern: &str, url: &str, source: fancy_regex::Error) -> Self {
        Self::Match {
            pattern: pattern.to_string(),
            url: url.to_string(),
            source,
        }
    }
}
