//! Rewrite rules.
//!
//! A rule pairs a `from` regular expression with a `to` template holding
//! positional placeholders `$1..$N`. Applying it rewrites the first literal
//! occurrence of the matched text with the template, then substitutes the
//! placeholders with the captured groups.
//!
//! The matched text is located by literal search rather than by match offset,
//! so when the same text also occurs earlier in the URL, that earlier
//! occurrence is the one replaced. Rule corpora are written against this
//! behavior and it is kept as is.
//!
//! Patterns are compiled with `fancy_regex`, so look-around and backreferences
//! work as rule authors expect.

use std::sync::OnceLock;

use fancy_regex::{Captures, Regex};

use crate::error::RewriteError;

/// `$` followed by a maximal run of digits.
fn placeholder_regex() -> &'static regex::Regex {
    static PLACEHOLDER: OnceLock<regex::Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| regex::Regex::new(r"\$(\d+)").expect("placeholder pattern is valid"))
}

/// A single ordered pattern to template transformation.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    from: Regex,
    to: String,
}

impl RewriteRule {
    /// Compile a rule from its pattern and replacement template.
    pub fn new(from: &str, to: &str) -> Result<Self, fancy_regex::Error> {
        Ok(Self {
            from: Regex::new(from)?,
            to: to.to_string(),
        })
    }

    pub fn from_pattern(&self) -> &str {
        self.from.as_str()
    }

    pub fn to_template(&self) -> &str {
        &self.to
    }

    /// Rewrite `url`, or return `None` if the pattern does not match.
    pub fn apply(&self, url: &str) -> Result<Option<String>, RewriteError> {
        let captures = match self.from.captures(url) {
            Ok(Some(captures)) => captures,
            Ok(None) => return Ok(None),
            Err(e) => return Err(RewriteError::matching(self.from.as_str(), url, e)),
        };
        let matched = captures.get(0).map_or("", |m| m.as_str());

        let intermediate = url.replacen(matched, &self.to, 1);
        Ok(Some(expand_placeholders(&intermediate, &captures)))
    }
}

/// Replace every `$<digits>` token whose index names a group of `captures`.
///
/// Tokens are read as maximal digit runs, so `$10` refers to group ten and is
/// never split into `$1` followed by `0`. Group zero and indices past the last
/// group are left untouched; groups that did not participate expand to "".
fn expand_placeholders(text: &str, captures: &Captures<'_>) -> String {
    let groups = captures.len() - 1;
    placeholder_regex()
        .replace_all(text, |token: &regex::Captures<'_>| {
            let digits = &token[1];
            match digits.parse::<usize>() {
                Ok(index) if index >= 1 && index <= groups => captures
                    .get(index)
                    .map_or_else(String::new, |m| m.as_str().to_string()),
                _ => token[0].to_string(),
            }
        })
        .into_owned()
}
