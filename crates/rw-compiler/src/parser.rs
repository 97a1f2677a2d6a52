//! XML rule document decoding.

use serde::Deserialize;

/// One decoded rule document, before any pattern is compiled.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename = "ruleset")]
pub struct RuleDocument {
    #[serde(rename = "@name", default)]
    pub name: Option<String>,
    #[serde(rename = "@default_off", default)]
    pub default_off: Option<String>,
    #[serde(rename = "target", default)]
    pub targets: Vec<TargetElement>,
    #[serde(rename = "exclusion", default)]
    pub exclusions: Vec<ExclusionElement>,
    #[serde(rename = "rule", default)]
    pub rules: Vec<RuleElement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TargetElement {
    #[serde(rename = "@host", default)]
    pub host: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExclusionElement {
    #[serde(rename = "@pattern", default)]
    pub pattern: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RuleElement {
    #[serde(rename = "@from", default)]
    pub from: String,
    #[serde(rename = "@to", default)]
    pub to: String,
}

impl RuleDocument {
    /// A document with any non-empty `default_off` reason is disabled.
    pub fn is_enabled(&self) -> bool {
        self.default_off.as_deref().map_or(true, str::is_empty)
    }
}

/// Decode a rule document. Unknown elements and attributes are ignored, and
/// a missing `host`, `pattern`, `from` or `to` attribute reads as "".
pub fn parse_rule_document(text: &str) -> Result<RuleDocument, quick_xml::DeError> {
    quick_xml::de::from_str(text)
}
