//! Rewrite Helper Core Library
//!
//! This crate provides the rule-matching and rewrite engine consulted by the
//! rewrite helper for every request a forward proxy hands it.
//!
//! # Architecture
//!
//! A [`RuleSet`] is an ordered list of [`RuleBundle`]s, one per rule document.
//! Each bundle is gated by its targets (host predicates), vetoed by its
//! exclusions (URL patterns), and otherwise rewrites the URL with the first of
//! its rules whose pattern matches. The set is built once and never mutated,
//! so it can be shared across threads behind a plain `Arc`.
//!
//! # Modules
//!
//! - `target`: host targeting (exact and `*.suffix` wildcard)
//! - `exclusion`: URL patterns that veto a bundle
//! - `rule`: pattern/template rewrite rules with capture substitution
//! - `matcher`: rule bundles and the ordered rule set
//! - `url`: host resolution for request URLs
//! - `types`: shared result types
//! - `error`: evaluation errors

pub mod error;
pub mod exclusion;
pub mod matcher;
pub mod rule;
pub mod target;
pub mod types;
pub mod url;

// Re-export commonly used types
pub use exclusion::Exclusion;
pub use matcher::{RuleBundle, RuleSet};
pub use rule::RewriteRule;
pub use target::Target;
pub use types::{MatchDecision, RewriteResult};
pub use error::RewriteError;
pub use self::url::resolve_host;
