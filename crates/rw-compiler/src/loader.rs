//! Rule directory loader.
//!
//! Walks a directory tree, decodes every `*.xml` rule document in lexical
//! path order, and collects the enabled bundles into a `RuleSet`. Any failure
//! aborts the whole load: a partial corpus is never returned.

use std::fs;
use std::path::{Path, PathBuf};

use rw_core::RuleSet;
use serde::Serialize;

use crate::builder::build_bundle;
use crate::parser::parse_rule_document;

const RULE_EXTENSION: &str = "xml";

/// Error type for rule loading.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode '{}': {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: quick_xml::DeError,
    },
    #[error("invalid pattern {pattern:?} in '{}': {source}", path.display())]
    Pattern {
        path: PathBuf,
        pattern: String,
        #[source]
        source: fancy_regex::Error,
    },
}

/// Summary of a directory load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    pub files: usize,
    pub bundles: usize,
    pub disabled: usize,
    pub targets: usize,
    pub exclusions: usize,
    pub rules: usize,
}

/// Load every rule document under `dir`.
pub fn load_directory(dir: &Path) -> Result<(RuleSet, LoadStats), LoadError> {
    let mut paths = Vec::new();
    collect_rule_files(dir, &mut paths)?;
    paths.sort();

    let mut ruleset = RuleSet::new();
    let mut stats = LoadStats::default();

    for path in &paths {
        let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;
        stats.files += 1;

        let doc = parse_rule_document(&text).map_err(|source| LoadError::Decode {
            path: path.clone(),
            source,
        })?;

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let bundle = build_bundle(&doc, &stem).map_err(|e| LoadError::Pattern {
            path: path.clone(),
            pattern: e.pattern,
            source: e.source,
        })?;

        let (targets, exclusions, rules) =
            (bundle.targets.len(), bundle.exclusions.len(), bundle.rules.len());

        if ruleset.push(bundle) {
            stats.bundles += 1;
            stats.targets += targets;
            stats.exclusions += exclusions;
            stats.rules += rules;
        } else {
            stats.disabled += 1;
        }
    }

    log::info!(
        "loaded {} bundles from {} files in '{}' ({} disabled, {} rules)",
        stats.bundles,
        stats.files,
        dir.display(),
        stats.disabled,
        stats.rules
    );

    Ok((ruleset, stats))
}

fn collect_rule_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), LoadError> {
    let io_err = |source: std::io::Error| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };

    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(io_err)?;

        if file_type.is_dir() {
            collect_rule_files(&path, out)?;
        } else if path.extension().map_or(false, |ext| ext == RULE_EXTENSION) {
            out.push(path);
        }
    }

    Ok(())
}
