//! Rewrite Helper Rule Compiler
//!
//! This crate decodes XML rule documents, compiles their patterns, and
//! assembles the resulting bundles into a ready `RuleSet`.

pub mod builder;
pub mod loader;
pub mod parser;

pub use builder::build_bundle;
pub use loader::{load_directory, LoadError, LoadStats};
pub use parser::{parse_rule_document, RuleDocument};
