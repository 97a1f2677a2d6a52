//! Bundle builder.
//!
//! Turns a decoded rule document into a `RuleBundle`, compiling every
//! exclusion and rule pattern up front.

use rw_core::{Exclusion, RewriteRule, RuleBundle, Target};

use crate::parser::RuleDocument;

/// A pattern that failed to compile.
#[derive(Debug, thiserror::Error)]
#[error("invalid pattern {pattern:?}: {source}")]
pub struct PatternError {
    pub pattern: String,
    #[source]
    pub source: fancy_regex::Error,
}

/// Compile `doc` into a bundle. `fallback_name` names documents that carry
/// no `name` attribute (the loader passes the file stem).
pub fn build_bundle(doc: &RuleDocument, fallback_name: &str) -> Result<RuleBundle, PatternError> {
    let name = doc
        .name
        .as_deref()
        .filter(|name| !name.is_empty())
        .unwrap_or(fallback_name);

    let mut bundle = RuleBundle::new(name);
    bundle.enabled = doc.is_enabled();

    bundle.targets = doc.targets.iter().map(|t| Target::new(&t.host)).collect();

    for exclusion in &doc.exclusions {
        let compiled = Exclusion::new(&exclusion.pattern).map_err(|source| PatternError {
            pattern: exclusion.pattern.clone(),
            source,
        })?;
        bundle.exclusions.push(compiled);
    }

    for rule in &doc.rules {
        let compiled = RewriteRule::new(&rule.from, &rule.to).map_err(|source| PatternError {
            pattern: rule.from.clone(),
            source,
        })?;
        bundle.rules.push(compiled);
    }

    Ok(bundle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_rule_document;

    #[test]
    fn builds_bundle_from_document() {
        let doc = parse_rule_document(
            r#"<ruleset name="Example">
                <target host="Example.com"/>
                <target host="*.example.com"/>
                <exclusion pattern="^http://plain\."/>
                <rule from="^http://(.+)$" to="https://$1"/>
            </ruleset>"#,
        )
        .unwrap();

        let bundle = build_bundle(&doc, "example").unwrap();
        assert_eq!(bundle.name, "Example");
        assert!(bundle.enabled);
        assert_eq!(bundle.targets[0].host(), "example.com");
        assert_eq!(bundle.exclusions.len(), 1);
        assert_eq!(bundle.rules.len(), 1);

        let result = bundle.apply("http://www.example.com/a", None).unwrap();
        assert_eq!(result.url, "https://www.example.com/a");

        let result = bundle.apply("http://plain.example.com/a", None).unwrap();
        assert!(!result.is_applied());
    }

    #[test]
    fn uses_fallback_name() {
        let doc = parse_rule_document(r#"<ruleset><target host="a.com"/></ruleset>"#).unwrap();
        let bundle = build_bundle(&doc, "a-com").unwrap();
        assert_eq!(bundle.name, "a-com");
    }

    #[test]
    fn keeps_disabled_flag() {
        let doc = parse_rule_document(
            r#"<ruleset name="Off" default_off="broken"><target host="a.com"/></ruleset>"#,
        )
        .unwrap();
        let bundle = build_bundle(&doc, "off").unwrap();
        assert!(!bundle.enabled);
    }

    #[test]
    fn builds_lookaround_patterns() {
        let doc = parse_rule_document(
            r#"<ruleset name="A">
                <target host="*.a.com"/>
                <exclusion pattern="^http://a\.com/(?!secure/)"/>
                <rule from="^http://(?!plain\.)(\w+\.)?a\.com/" to="https://$1a.com/"/>
            </ruleset>"#,
        )
        .unwrap();

        let bundle = build_bundle(&doc, "a").unwrap();
        assert_eq!(bundle.rules.len(), 1);
        assert_eq!(bundle.exclusions.len(), 1);

        let result = bundle.apply("http://www.a.com/x", None).unwrap();
        assert_eq!(result.url, "https://www.a.com/x");

        assert!(!bundle.apply("http://plain.a.com/x", None).unwrap().is_applied());
        assert!(!bundle.apply("http://a.com/blog", None).unwrap().is_applied());
    }

    #[test]
    fn rejects_invalid_rule_pattern() {
        let doc = parse_rule_document(
            r#"<ruleset><target host="a.com"/><rule from="^http://(a" to="https://"/></ruleset>"#,
        )
        .unwrap();
        let err = build_bundle(&doc, "bad").unwrap_err();
        assert_eq!(err.pattern, "^http://(a");
    }

    #[test]
    fn rejects_invalid_exclusion_pattern() {
        let doc = parse_rule_document(
            r#"<ruleset><target host="a.com"/><exclusion pattern="[z-a]"/></ruleset>"#,
        )
        .unwrap();
        let err = build_bundle(&doc, "bad").unwrap_err();
        assert_eq!(err.pattern, "[z-a]");
        assert!(err.to_string().contains("[z-a]"));
    }
}
