//! Key Collector (spec §4.6): the canonical `ExtractedKey` type and the
//! dedupe/replacement-policy map keyed by `(namespace, key)`.

use std::collections::HashMap;

use crate::config::NAMESPACE_NONE;

pub const IMPLICIT_NAMESPACE: &str = "implicit";

/// Either a concrete namespace string, or "no explicit namespace was given
/// at the call site" (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Namespace {
    Explicit(String),
    Implicit,
}

impl Namespace {
    pub fn as_key_str<'a>(&'a self, default_ns: &'a str) -> &'a str {
        match self {
            Namespace::Explicit(ns) => ns,
            Namespace::Implicit if default_ns == NAMESPACE_NONE => "",
            Namespace::Implicit => default_ns,
        }
    }
}

/// The canonical unit produced by extraction (spec §3 "ExtractedKey").
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedKey {
    pub key: String,
    pub namespace: Namespace,
    pub default_value: Option<String>,
    pub explicit_default: bool,
    pub has_count: bool,
    pub is_ordinal: bool,
    pub return_objects: bool,
    pub context_expression: Option<String>,
}

impl ExtractedKey {
    /// A "fallback" entry: its default value equals its key (or, for plural
    /// keys, the base-key fallback) — spec §4.6.
    pub fn is_fallback(&self) -> bool {
        match &self.default_value {
            None => true,
            Some(value) => {
                if value == &self.key {
                    return true;
                }
                let base = self.key.rsplit_once('_').map(|(b, _)| b).unwrap_or(&self.key);
                value == base
            }
        }
    }

    /// More specific than `other` if `self` carries a non-fallback default or
    /// an explicit namespace where `other` does not (spec Invariant 1).
    fn is_more_specific_than(&self, other: &ExtractedKey) -> bool {
        let self_has_explicit_ns = matches!(self.namespace, Namespace::Explicit(_));
        let other_has_explicit_ns = matches!(other.namespace, Namespace::Explicit(_));
        let specificity_gain_from_ns = self_has_explicit_ns && !other_has_explicit_ns;
        let specificity_gain_from_default = !self.is_fallback() && other.is_fallback();
        specificity_gain_from_default || specificity_gain_from_ns
    }
}

/// Dedupes and normalizes extracted keys into a map keyed by
/// `(namespace-for-keying, key)` (spec §4.6).
#[derive(Debug, Default)]
pub struct KeyCollector {
    default_ns: String,
    entries: HashMap<(String, String), ExtractedKey>,
    /// Preserves first-seen order for deterministic downstream grouping.
    order: Vec<(String, String)>,
}

impl KeyCollector {
    pub fn new(default_ns: impl Into<String>) -> Self {
        Self {
            default_ns: default_ns.into(),
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }

    fn map_key(&self, key: &ExtractedKey) -> (String, String) {
        (
            key.namespace.as_key_str(&self.default_ns).to_string(),
            key.key.clone(),
        )
    }

    /// Insert per spec §4.6's replacement policy: no entry → insert; existing
    /// fallback + incoming more specific → replace; otherwise keep existing.
    pub fn insert(&mut self, incoming: ExtractedKey) {
        let map_key = self.map_key(&incoming);
        match self.entries.get(&map_key) {
            None => {
                self.order.push(map_key.clone());
                self.entries.insert(map_key, incoming);
            }
            Some(existing) => {
                if incoming.is_more_specific_than(existing) {
                    self.entries.insert(map_key, incoming);
                }
            }
        }
    }

    /// All collected keys, grouped by their keying namespace, in first-seen
    /// order (spec §4.6 "the stored namespace for map-keying purposes uses
    /// the configured default namespace").
    pub fn by_namespace(&self) -> HashMap<String, Vec<&ExtractedKey>> {
        let mut grouped: HashMap<String, Vec<&ExtractedKey>> = HashMap::new();
        for map_key in &self.order {
            if let Some(entry) = self.entries.get(map_key) {
                grouped.entry(map_key.0.clone()).or_default().push(entry);
            }
        }
        grouped
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key: &str, default_value: Option<&str>, ns: Namespace) -> ExtractedKey {
        ExtractedKey {
            key: key.to_string(),
            namespace: ns,
            default_value: default_value.map(str::to_string),
            explicit_default: default_value.is_some(),
            has_count: false,
            is_ordinal: false,
            return_objects: false,
            context_expression: None,
        }
    }

    #[test]
    fn test_is_fallback_when_default_equals_key() {
        let k = key("save", Some("save"), Namespace::Implicit);
        assert!(k.is_fallback());
    }

    #[test]
    fn test_is_fallback_when_no_default() {
        let k = key("save", None, Namespace::Implicit);
        assert!(k.is_fallback());
    }

    #[test]
    fn test_not_fallback_with_meaningful_default() {
        let k = key("save", Some("Save changes"), Namespace::Implicit);
        assert!(!k.is_fallback());
    }

    #[test]
    fn test_first_insert_wins_when_no_collision() {
        let mut collector = KeyCollector::new("translation");
        collector.insert(key("save", Some("Save"), Namespace::Implicit));
        assert_eq!(collector.len(), 1);
    }

    #[test]
    fn test_more_specific_default_replaces_fallback() {
        let mut collector = KeyCollector::new("translation");
        collector.insert(key("save", None, Namespace::Implicit));
        collector.insert(key("save", Some("Save changes"), Namespace::Implicit));
        let grouped = collector.by_namespace();
        let entries = &grouped["translation"];
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].default_value.as_deref(), Some("Save changes"));
    }

    #[test]
    fn test_existing_specific_keeps_over_later_fallback() {
        let mut collector = KeyCollector::new("translation");
        collector.insert(key("save", Some("Save changes"), Namespace::Implicit));
        collector.insert(key("save", None, Namespace::Implicit));
        let grouped = collector.by_namespace();
        assert_eq!(grouped["translation"][0].default_value.as_deref(), Some("Save changes"));
    }

    #[test]
    fn test_explicit_namespace_replaces_implicit() {
        let mut collector = KeyCollector::new("translation");
        collector.insert(key("save", None, Namespace::Implicit));
        collector.insert(key("save", None, Namespace::Explicit("common".to_string())));
        let grouped = collector.by_namespace();
        assert!(grouped.contains_key("common"));
    }

    #[test]
    fn test_implicit_namespace_maps_to_default() {
        let mut collector = KeyCollector::new("translation");
        collector.insert(key("save", None, Namespace::Implicit));
        let grouped = collector.by_namespace();
        assert!(grouped.contains_key("translation"));
    }

    #[test]
    fn test_namespace_none_keeps_implicit_keys_at_top_level() {
        let mut collector = KeyCollector::new(NAMESPACE_NONE);
        collector.insert(key("save", None, Namespace::Implicit));
        let grouped = collector.by_namespace();
        assert!(grouped.contains_key(""));
    }

    #[test]
    fn test_distinct_namespaces_keep_separate_entries() {
        let mut collector = KeyCollector::new("translation");
        collector.insert(key("save", None, Namespace::Explicit("common".to_string())));
        collector.insert(key("save", None, Namespace::Explicit("forms".to_string())));
        assert_eq!(collector.len(), 2);
    }
}
