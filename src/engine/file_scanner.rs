//! Source file enumeration (spec §4.9 "For each configured input glob,
//! enumerate files, ignoring node_modules and user-specified patterns").
//!
//! Unlike the starting crate's directory-list-based scanner, this engine's
//! configuration schema (spec §6) expresses `extract.input`/`extract.ignore`
//! as true glob patterns (e.g. `src/**/*.{ts,tsx}`), so files are enumerated
//! by expanding each pattern directly with the `glob` crate, the same
//! approach the i18next-turbo reference's `extract_from_glob` takes.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Brace-expand `{a,b,c}` groups in a glob pattern, since the `glob` crate
/// does not support brace expansion natively but the configuration schema's
/// default pattern (`src/**/*.{ts,tsx}`) relies on it.
fn expand_braces(pattern: &str) -> Vec<String> {
    let Some(open) = pattern.find('{') else {
        return vec![pattern.to_string()];
    };
    let Some(close) = pattern[open..].find('}').map(|i| i + open) else {
        return vec![pattern.to_string()];
    };
    let prefix = &pattern[..open];
    let suffix = &pattern[close + 1..];
    let alternatives: Vec<&str> = pattern[open + 1..close].split(',').collect();

    let mut expanded = Vec::new();
    for alt in alternatives {
        let combined = format!("{prefix}{alt}{suffix}");
        expanded.extend(expand_braces(&combined));
    }
    expanded
}

fn is_ignored(path: &Path, ignore_globs: &[glob::Pattern]) -> bool {
    if path.components().any(|c| c.as_os_str() == "node_modules") {
        return true;
    }
    let path_str = path.to_string_lossy();
    ignore_globs.iter().any(|p| p.matches(&path_str))
}

/// Enumerate every file matched by `input_patterns`, expanding brace groups
/// and excluding `node_modules` plus anything matched by `ignore_patterns`.
/// Deduplicates overlapping matches across patterns; returns a stable,
/// sorted order so downstream parallel extraction is reproducible run to run.
pub fn scan_files(input_patterns: &[String], ignore_patterns: &[String]) -> Result<Vec<PathBuf>> {
    let ignore_globs: Vec<glob::Pattern> = ignore_patterns
        .iter()
        .map(|p| glob::Pattern::new(p).with_context(|| format!("invalid ignore pattern: {p}")))
        .collect::<Result<_>>()?;

    let mut matched: BTreeSet<PathBuf> = BTreeSet::new();
    for pattern in input_patterns {
        for expanded in expand_braces(pattern) {
            for entry in glob::glob(&expanded)
                .with_context(|| format!("invalid input pattern: {expanded}"))?
            {
                let path = entry.with_context(|| format!("error reading glob match for {expanded}"))?;
                if path.is_file() && !is_ignored(&path, &ignore_globs) {
                    matched.insert(path);
                }
            }
        }
    }
    Ok(matched.into_iter().collect())
}
