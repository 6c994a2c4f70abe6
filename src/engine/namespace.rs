//! Namespace Grouper (spec §4.4 "Namespace selection", §4.6): resolves which
//! namespace a call site's key belongs to, and partitions the collector's
//! output by namespace ahead of reconciliation.

use std::collections::HashMap;

use crate::config::NAMESPACE_NONE;
use crate::engine::collector::{ExtractedKey, KeyCollector};

/// Split a key string on the configured namespace separator, recovering an
/// embedded namespace prefix if present (spec §4.4: "namespace prefix inside
/// the key string, split on configured nsSeparator, default `:`").
pub fn split_namespace_prefix<'a>(
    key: &'a str,
    ns_separator: Option<&str>,
) -> (Option<&'a str>, &'a str) {
    match ns_separator {
        Some(sep) if !sep.is_empty() => match key.split_once(sep) {
            Some((ns, rest)) => (Some(ns), rest),
            None => (None, key),
        },
        _ => (None, key),
    }
}

/// Resolve the namespace candidate(s) for a call site, in spec §4.4's stated
/// priority order (highest wins): explicit `ns` call option, namespace prefix
/// inside the key string, scope's `defaultNs`, configured default namespace.
/// A call's `ns` option may itself resolve to multiple strings, in which
/// case the caller must fan out one key per candidate — this returns every
/// candidate namespace for that fan-out, plus whether any explicit namespace
/// was found anywhere (spec §4.4: "if no explicit namespace appeared
/// anywhere, the key is tagged implicit").
pub fn resolve_namespace_candidates(
    explicit_ns_option: &[String],
    key: &str,
    ns_separator: Option<&str>,
    scope_default_ns: &[String],
    configured_default_ns: &str,
) -> (Vec<String>, bool) {
    if !explicit_ns_option.is_empty() {
        return (explicit_ns_option.to_vec(), true);
    }
    if let (Some(prefix), _) = split_namespace_prefix(key, ns_separator) {
        return (vec![prefix.to_string()], true);
    }
    if !scope_default_ns.is_empty() {
        return (scope_default_ns.to_vec(), false);
    }
    (vec![configured_default_ns.to_string()], false)
}

/// The bare key with any namespace prefix stripped, as actually stored in the
/// translation file (spec §4.4's key-string namespace prefix is not part of
/// the stored key).
pub fn strip_namespace_prefix<'a>(key: &'a str, ns_separator: Option<&str>) -> &'a str {
    split_namespace_prefix(key, ns_separator).1
}

/// Partition the collector's output by namespace, including namespaces
/// discovered on disk with no keys from the current extraction (spec §4.7:
/// "for every locale, and every namespace (including namespaces discovered
/// on disk even if the current extraction produced none)").
pub fn group_for_reconciliation<'a>(
    collector: &'a KeyCollector,
    known_namespaces_on_disk: &[String],
) -> HashMap<String, Vec<&'a ExtractedKey>> {
    let mut grouped = collector.by_namespace();
    for ns in known_namespaces_on_disk {
        grouped.entry(ns.clone()).or_default();
    }
    grouped
}

/// In merged-namespace mode, all namespaces collapse into a single output
/// tree keyed by namespace at the top level, except implicit-namespace keys,
/// which merge directly into the top level (spec §4.7 "merged-namespace
/// mode"; see DESIGN.md open question on implicit-namespace placement).
pub fn merge_namespace_key(namespace: &str, key: &str, configured_default_ns: &str) -> String {
    if namespace == configured_default_ns || namespace == NAMESPACE_NONE || namespace.is_empty() {
        key.to_string()
    } else {
        format!("{namespace}.{key}")
    }
}
