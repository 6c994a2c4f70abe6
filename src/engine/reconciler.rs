//! Reconciler (spec §4.7, "the hard subsystem"): merges one namespace's
//! extracted keys for one locale against the existing on-disk tree into a
//! new `TranslationTree`, following the seven-step merge algorithm.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::config::ExtractConfig;
use crate::engine::collector::ExtractedKey;
use crate::engine::plural::{
    cardinal_categories, ordinal_categories, format_plural_key, parse_plural_suffix,
    PluralCategory,
};
use crate::engine::tree::{flatten, get_nested, sort_recursive, split_key, canonical_json};
use crate::engine::tree::TranslationTree;

/// Everything the reconciler needs for one locale × namespace run.
pub struct ReconcileInput<'a> {
    pub ns_keys: &'a [ExtractedKey],
    pub existing: &'a TranslationTree,
    pub locale: &'a str,
    pub namespace: &'a str,
    pub primary_language: &'a str,
    pub config: &'a ExtractConfig,
    /// Base keys (pre-plural-expansion) called with `returnObjects: true`
    /// (spec §4.7 "objectKeys").
    pub object_keys: &'a HashSet<String>,
}

pub struct ReconcileOutput {
    pub tree: TranslationTree,
    pub updated: bool,
}

/// One key candidate after context/plural expansion, ready for Step 5's
/// per-key merge decision.
struct ResolvedKey<'a> {
    /// The full dotted key as it will be written to the tree.
    key: String,
    /// The base key (post-context, pre-plural) — what `objectKeys` matches.
    base: String,
    source: &'a ExtractedKey,
    /// True if this key is a plural-category or context variant of its
    /// source (spec §4.7 Step 5's "is the key is a plural/context variant"
    /// branch).
    is_variant: bool,
}

/// Glob-match a dotted key path against one `*`-wildcard pattern, matching
/// whole `.`-separated segments (grounded on `core/utils/glob_matcher.rs`'s
/// segment-matching algorithm, reimplemented locally since that module is
/// teacher scaffolding slated for removal, not a dependency this engine keeps).
fn segment_matches(pattern: &str, text: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    if !pattern.contains('*') {
        return pattern == text;
    }
    let parts: Vec<&str> = pattern.split('*').collect();
    let mut pos = 0;
    if !parts[0].is_empty() {
        if !text.starts_with(parts[0]) {
            return false;
        }
        pos = parts[0].len();
    }
    let last = parts[parts.len() - 1];
    let last_start = text.len().saturating_sub(last.len());
    if !last.is_empty() && !text[pos.min(text.len())..].ends_with(last) {
        return false;
    }
    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        match text[pos..last_start.max(pos)].find(part) {
            Some(found) => pos += found + part.len(),
            None => return false,
        }
    }
    true
}

fn matches_preserve_pattern(pattern: &str, key: &str) -> bool {
    let pattern_segments: Vec<&str> = pattern.split('.').collect();
    let key_segments: Vec<&str> = key.split('.').collect();
    if pattern_segments.len() != key_segments.len() {
        return pattern == key;
    }
    pattern_segments
        .iter()
        .zip(key_segments.iter())
        .all(|(p, k)| segment_matches(p, k))
}

fn is_preserved(patterns: &[String], key: &str) -> bool {
    patterns.iter().any(|p| matches_preserve_pattern(p, key))
}

/// Step 1 — expand `hasCount` keys into one per valid CLDR category for this
/// locale, apply the context suffix before the plural suffix, and drop
/// anything matching a preserve pattern.
fn expand_and_filter<'a>(input: &ReconcileInput<'a>) -> Vec<ResolvedKey<'a>> {
    let config = input.config;
    let mut resolved = Vec::new();

    for source in input.ns_keys {
        // The walker already bakes the context suffix into `source.key`
        // (spec.md: `baseKey [+ contextSeparator + context]`); don't reapply
        // it here.
        let with_context = source.key.clone();
        let is_context_variant = source.context_expression.is_some();

        if !source.has_count || config.disable_plurals {
            if !is_preserved(&config.preserve_patterns, &with_context) {
                resolved.push(ResolvedKey {
                    key: with_context.clone(),
                    base: source.key.clone(),
                    source,
                    is_variant: is_context_variant,
                });
            }
            continue;
        }

        let categories: &[PluralCategory] = if source.is_ordinal {
            ordinal_categories(input.locale)
        } else {
            cardinal_categories(input.locale)
        };
        for category in categories {
            let plural_key =
                format_plural_key(&with_context, &config.plural_separator, *category, source.is_ordinal);
            if is_preserved(&config.preserve_patterns, &plural_key) {
                continue;
            }
            resolved.push(ResolvedKey {
                key: plural_key,
                base: source.key.clone(),
                source,
                is_variant: true,
            });
        }
    }
    resolved
}

/// Insert `value` at `full_key`'s nested path, unless an ancestor segment is
/// already a non-object scalar — then write the key flat at the tree root
/// instead (spec §4.7 "Nested-write conflict rule").
fn insert_nested(tree: &mut TranslationTree, full_key: &str, key_separator: Option<&str>, value: Value) {
    let path = split_key(full_key, key_separator);
    if path.len() == 1 || !try_insert_nested(tree, &path, value.clone()) {
        tree.insert(full_key.to_string(), value);
    }
}

fn try_insert_nested(tree: &mut TranslationTree, path: &[&str], value: Value) -> bool {
    let Some((head, rest)) = path.split_first() else {
        return false;
    };
    if rest.is_empty() {
        tree.insert((*head).to_string(), value);
        return true;
    }
    match tree.get_mut(*head) {
        Some(Value::Object(obj)) => try_insert_nested(obj, rest, value),
        Some(_) => false,
        None => {
            let mut nested = Map::new();
            if try_insert_nested(&mut nested, rest, value) {
                tree.insert((*head).to_string(), Value::Object(nested));
                true
            } else {
                false
            }
        }
    }
}

/// A default value is "derived" (spec §4.7 Step 5) if it equals the key, or
/// the key is the default value immediately followed by a plural or context
/// separator.
fn is_derived_default(default_value: &str, key: &str, plural_separator: &str, context_separator: &str) -> bool {
    if default_value.is_empty() {
        return false;
    }
    if default_value == key {
        return true;
    }
    match key.strip_prefix(default_value) {
        Some(rest) => {
            (!plural_separator.is_empty() && rest.starts_with(plural_separator))
                || (!context_separator.is_empty() && rest.starts_with(context_separator))
        }
        None => false,
    }
}

/// `resolveDefault` for the empty-default fallback (spec §4.8): the
/// configuration schema only ever carries a literal string (a library
/// embedder's callback is exposed separately via the plugin interface), so
/// this only performs the string-substitution half of §4.8's rule.
fn resolve_empty_default(config: &ExtractConfig, key: &str, namespace: &str, locale: &str) -> String {
    config
        .default_value
        .replace("{{key}}", key)
        .replace("{{ns}}", namespace)
        .replace("{{lng}}", locale)
}

/// Step 5's per-key decision procedure.
fn compute_value_to_set(
    resolved: &ResolvedKey,
    existing_value: Option<&Value>,
    is_primary: bool,
    namespace: &str,
    locale: &str,
    config: &ExtractConfig,
    object_keys: &HashSet<String>,
) -> Value {
    let default_value = resolved.source.default_value.as_deref().unwrap_or("");
    let is_object_return = object_keys.contains(&resolved.base);

    if let Some(Value::Object(obj)) = existing_value {
        let derived_or_empty = default_value.is_empty() || default_value == resolved.key;
        if is_object_return || derived_or_empty {
            return Value::Object(obj.clone());
        }
    }

    let sync_primary = config.sync_primary_with_defaults;

    match existing_value {
        None | Some(Value::Object(_)) => {
            if is_primary && sync_primary {
                if !default_value.is_empty()
                    && !is_derived_default(
                        default_value,
                        &resolved.key,
                        &config.plural_separator,
                        &config.context_separator,
                    )
                {
                    Value::String(default_value.to_string())
                } else {
                    Value::String(resolve_empty_default(config, &resolved.key, namespace, locale))
                }
            } else if is_primary {
                let v = if !default_value.is_empty() { default_value } else { &resolved.key };
                Value::String(v.to_string())
            } else {
                Value::String(resolve_empty_default(config, &resolved.key, namespace, locale))
            }
        }
        Some(existing) => {
            if is_primary && sync_primary {
                if resolved.is_variant && !resolved.source.explicit_default {
                    existing.clone()
                } else if !default_value.is_empty()
                    && !is_derived_default(
                        default_value,
                        &resolved.key,
                        &config.plural_separator,
                        &config.context_separator,
                    )
                {
                    Value::String(default_value.to_string())
                } else {
                    existing.clone()
                }
            } else {
                existing.clone()
            }
        }
    }
}

/// Step 4 — preserve an existing `<base>_zero` path whose base is a plural
/// base in the current (pre-filter) extraction, even when `removeUnusedKeys`
/// would otherwise prune it.
fn preserve_zero_forms(
    tree: &mut TranslationTree,
    existing: &TranslationTree,
    ns_keys: &[ExtractedKey],
    config: &ExtractConfig,
) {
    let plural_bases: HashSet<&str> = ns_keys
        .iter()
        .filter(|k| k.has_count)
        .map(|k| k.key.as_str())
        .collect();
    if plural_bases.is_empty() {
        return;
    }
    let key_sep = config.key_separator.as_deref().unwrap_or(".");
    let flat_existing = flatten(existing, key_sep);
    for (path, value) in &flat_existing {
        let Some(suffix) = parse_plural_suffix(path, &config.plural_separator) else {
            continue;
        };
        if suffix.category == PluralCategory::Zero && plural_bases.contains(suffix.base.as_str()) {
            insert_nested(tree, path, config.key_separator.as_deref(), value.clone());
        }
    }
}

/// Step 3 — copy every path in `existing` matching a preserve pattern into
/// the new tree.
fn apply_preserve_patterns(tree: &mut TranslationTree, existing: &TranslationTree, config: &ExtractConfig) {
    if config.preserve_patterns.is_empty() {
        return;
    }
    let key_sep = config.key_separator.as_deref().unwrap_or(".");
    let flat_existing = flatten(existing, key_sep);
    for (path, value) in &flat_existing {
        if is_preserved(&config.preserve_patterns, path) {
            insert_nested(tree, path, config.key_separator.as_deref(), value.clone());
        }
    }
}

/// Run the full Step 1–7 algorithm for one locale × namespace.
pub fn reconcile(input: &ReconcileInput) -> ReconcileOutput {
    let config = input.config;
    let resolved_keys = expand_and_filter(input);

    // Step 2 — seed.
    let mut tree: TranslationTree = if config.remove_unused_keys {
        Map::new()
    } else {
        input.existing.clone()
    };

    // Step 3 — preserve patterns.
    apply_preserve_patterns(&mut tree, input.existing, config);

    // Step 4 — zero-form preservation.
    preserve_zero_forms(&mut tree, input.existing, input.ns_keys, config);

    // Step 5 — per-key merge.
    let is_primary = input.locale == input.primary_language;
    for resolved in &resolved_keys {
        let path = split_key(&resolved.key, config.key_separator.as_deref());
        let existing_value = get_nested(input.existing, &path).or_else(|| input.existing.get(&resolved.key));
        let value = compute_value_to_set(
            resolved,
            existing_value,
            is_primary,
            input.namespace,
            input.locale,
            config,
            input.object_keys,
        );
        insert_nested(&mut tree, &resolved.key, config.key_separator.as_deref(), value);
    }

    // Step 6 — sort.
    if config.sort {
        tree = sort_recursive(&tree, &config.plural_separator);
    }

    // Step 7 — diff.
    let old_serialized = canonical_json(input.existing, config.indentation);
    let new_serialized = canonical_json(&tree, config.indentation);
    let updated = old_serialized != new_serialized;

    ReconcileOutput { tree, updated }
}
