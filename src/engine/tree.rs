//! `TranslationTree` (spec §3): a recursive mapping from string segments to
//! either a string leaf or another tree, plus output-file serialization for
//! every configured format.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use crate::config::OutputFormat;
use crate::engine::plural::{parse_plural_suffix, PluralCategory};

pub type TranslationTree = Map<String, Value>;

/// Read a value at a dotted path, walking nested objects by key-separator
/// segment (spec §3: "nested access via a key-separator").
pub fn get_nested<'a>(tree: &'a TranslationTree, path: &[&str]) -> Option<&'a Value> {
    let mut current = tree.get(*path.first()?)?;
    for segment in &path[1..] {
        current = current.as_object()?.get(*segment)?;
    }
    Some(current)
}

/// Does a flat (dotted-string) key exist at the tree root, as opposed to a
/// nested path (spec §3: "flat keys with the separator embedded in one
/// string" as the other addressing mode that must coexist)?
pub fn get_flat<'a>(tree: &'a TranslationTree, flat_key: &str) -> Option<&'a Value> {
    tree.get(flat_key)
}

/// Split a dotted key into path segments using the configured key
/// separator. A `None` separator means the whole key is one flat segment.
pub fn split_key<'a>(key: &'a str, key_separator: Option<&str>) -> Vec<&'a str> {
    match key_separator {
        Some(sep) if !sep.is_empty() => key.split(sep).collect(),
        _ => vec![key],
    }
}

/// Canonically serialize a tree for the diff step (spec §4.7 Step 7,
/// spec §3 Invariant 5: "serialized new tree differs from the serialized old
/// tree under a canonical serialization"). Always plain JSON at the
/// configured indentation, independent of the file's actual output format —
/// the diff is an internal bookkeeping device, not the on-disk content.
pub fn canonical_json(tree: &TranslationTree, indentation: usize) -> String {
    to_pretty_json(&Value::Object(tree.clone()), indentation)
}

fn to_pretty_json(value: &Value, indentation: usize) -> String {
    let indent = " ".repeat(indentation);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    serde::Serialize::serialize(value, &mut ser).expect("serializing a Value cannot fail");
    String::from_utf8(buf).expect("serde_json always produces valid utf8")
}

/// Serialize a tree into the final on-disk content for a given output
/// format (spec §6 "Output-file formats"). For JSON5, prefer
/// `write_json5_in_place` when an existing file's raw text is available, so
/// that comments and formatting survive; this function handles the
/// fresh-file case and the non-JSON5 formats.
pub fn serialize_output(tree: &TranslationTree, format: OutputFormat, indentation: usize) -> String {
    let json_literal = to_pretty_json(&Value::Object(tree.clone()), indentation);
    match format {
        OutputFormat::Json => format!("{json_literal}\n"),
        OutputFormat::Json5 => format!("{}\n", json5_literal(tree, indentation)),
        OutputFormat::Js | OutputFormat::JsEsm => format!("export default {json_literal};\n"),
        OutputFormat::JsCjs => format!("module.exports = {json_literal};\n"),
        OutputFormat::Ts => format!("export default {json_literal} as const;\n"),
    }
}

fn json5_literal(tree: &TranslationTree, indentation: usize) -> String {
    // json5's object/string literal syntax is a superset of JSON's for the
    // values this engine ever produces (plain strings, nested objects), so a
    // standard JSON pretty-print is already valid JSON5 text.
    to_pretty_json(&Value::Object(tree.clone()), indentation)
}

/// Update an existing JSON5 file's raw text in place so that comments and
/// formatting survive (spec §6), by parsing the existing text, diffing
/// top-level scalar values against the new tree, rewriting only the lines
/// that changed, and appending brand-new top-level keys before the closing
/// brace. Nested-object changes fall back to replacing the whole nested
/// object's serialized form on its own key's line, since json5 carries no
/// source-span information we could otherwise splice against.
pub fn write_json5_in_place(existing_text: &str, new_tree: &TranslationTree) -> Result<String> {
    let existing: Value =
        json5::from_str(existing_text).context("failed to parse existing JSON5 file")?;
    let existing_obj = existing.as_object().cloned().unwrap_or_default();

    let mut output = existing_text.to_string();
    for (key, new_value) in new_tree.iter() {
        match existing_obj.get(key) {
            Some(old_value) if old_value == new_value => continue,
            Some(_) => {
                output = replace_key_line(&output, key, new_value);
            }
            None => {
                output = append_key(&output, key, new_value);
            }
        }
    }
    for key in existing_obj.keys() {
        if !new_tree.contains_key(key) {
            output = remove_key_line(&output, key);
        }
    }
    Ok(output)
}

fn quoted_key_pattern(key: &str) -> (String, String) {
    (format!("\"{key}\""), format!("'{key}'"))
}

fn find_key_line(text: &str, key: &str) -> Option<usize> {
    let (dq, sq) = quoted_key_pattern(key);
    text.lines().position(|line| {
        let trimmed = line.trim_start();
        trimmed.starts_with(&dq) || trimmed.starts_with(&sq) || trimmed.starts_with(&format!("{key}:"))
    })
}

/// Find the column of the first non-whitespace byte of a key's value on its
/// own line (the byte right after the `:`), if the line actually holds one.
fn value_start_col(key_line: &str) -> Option<usize> {
    let colon = key_line.find(':')?;
    let rest = &key_line[colon + 1..];
    let offset = rest.find(|c: char| !c.is_whitespace())?;
    Some(colon + 1 + offset)
}

/// Starting at `lines[start_line]` column `start_col` (which must hold `{`),
/// scan forward counting brace depth (skipping over string contents) to find
/// the line holding the matching closing `}`. Multi-line nested objects are
/// the norm for pretty-printed JSON5, so the span of a key's value can run
/// well past its own line.
fn find_matching_brace_line(lines: &[&str], start_line: usize, start_col: usize) -> usize {
    let mut depth: i32 = 0;
    let mut in_string: Option<char> = None;
    for (line_idx, line) in lines.iter().enumerate().skip(start_line) {
        let start_byte = if line_idx == start_line { start_col } else { 0 };
        let mut chars = line[start_byte..].chars();
        while let Some(c) = chars.next() {
            match in_string {
                Some(quote) => {
                    if c == '\\' {
                        chars.next();
                    } else if c == quote {
                        in_string = None;
                    }
                }
                None => match c {
                    '"' | '\'' => in_string = Some(c),
                    '{' => depth += 1,
                    '}' => {
                        depth -= 1;
                        if depth == 0 {
                            return line_idx;
                        }
                    }
                    _ => {}
                },
            }
        }
    }
    lines.len().saturating_sub(1)
}

/// Replace a key's existing value with `new_value`'s serialization. A
/// scalar value occupies only its own line; a nested-object value can span
/// many lines, so its full original span (through the matching closing
/// brace) is located and replaced as one unit, rather than just the line
/// the key token appears on.
fn replace_key_line(text: &str, key: &str, new_value: &Value) -> String {
    let Some(idx) = find_key_line(text, key) else {
        return append_key(text, key, new_value);
    };
    let lines: Vec<&str> = text.lines().collect();
    let indent: String = lines[idx].chars().take_while(|c| c.is_whitespace()).collect();

    let end_idx = match value_start_col(lines[idx]) {
        Some(col) if lines[idx].as_bytes().get(col) == Some(&b'{') => {
            find_matching_brace_line(&lines, idx, col)
        }
        _ => idx,
    };

    let trailing_comma = lines[end_idx].trim_end().ends_with(',');
    let mut new_lines: Vec<String> = lines[..idx].iter().map(|s| s.to_string()).collect();
    new_lines.push(format!(
        "{indent}\"{key}\": {}{}",
        to_pretty_json(new_value, 2),
        if trailing_comma { "," } else { "" }
    ));
    new_lines.extend(lines[end_idx + 1..].iter().map(|s| s.to_string()));
    new_lines.join("\n")
}

fn remove_key_line(text: &str, key: &str) -> String {
    let Some(idx) = find_key_line(text, key) else {
        return text.to_string();
    };
    let lines: Vec<&str> = text.lines().collect();
    let end_idx = match value_start_col(lines[idx]) {
        Some(col) if lines[idx].as_bytes().get(col) == Some(&b'{') => {
            find_matching_brace_line(&lines, idx, col)
        }
        _ => idx,
    };
    let mut new_lines: Vec<String> = lines[..idx].iter().map(|s| s.to_string()).collect();
    new_lines.extend(lines[end_idx + 1..].iter().map(|s| s.to_string()));
    new_lines.join("\n")
}

fn append_key(text: &str, key: &str, value: &Value) -> String {
    let Some(close_idx) = text.rfind('}') else {
        return text.to_string();
    };
    let indent = "  ";
    let needs_comma = text[..close_idx]
        .trim_end()
        .trim_end_matches(|c: char| c.is_whitespace())
        .ends_with(|c: char| c != '{' && c != ',');
    let insertion = format!(
        "{}\"{key}\": {},\n",
        indent,
        to_pretty_json(value, 2)
    );
    let mut out = String::with_capacity(text.len() + insertion.len() + 1);
    out.push_str(&text[..close_idx]);
    if needs_comma && !out.trim_end().ends_with(',') {
        out.push(',');
    }
    out.push('\n');
    out.push_str(&insertion);
    out.push_str(&text[close_idx..]);
    out
}

/// Expand a path template (spec §6 "Path template expansion"):
/// `{{language}}`/`{{lng}}` become the locale; `{{namespace}}`/`{{ns}}`
/// become the namespace, or are elided with surrounding separator cleanup
/// when `namespace` is `None`; duplicate separators collapse.
pub fn expand_path_template(template: &str, language: &str, namespace: Option<&str>) -> String {
    let mut expanded = template
        .replace("{{language}}", language)
        .replace("{{lng}}", language);

    expanded = match namespace {
        Some(ns) => expanded.replace("{{namespace}}", ns).replace("{{ns}}", ns),
        None => expanded.replace("{{namespace}}", "").replace("{{ns}}", ""),
    };

    collapse_duplicate_separators(&expanded)
}

fn collapse_duplicate_separators(path: &str) -> String {
    let mut result = String::with_capacity(path.len());
    let mut prev_sep: Option<char> = None;
    for c in path.chars() {
        let is_sep = c == '/' || c == '.' || c == '-' || c == '_';
        if is_sep && prev_sep == Some(c) {
            continue;
        }
        result.push(c);
        prev_sep = if is_sep { Some(c) } else { None };
    }
    result
}

/// Sort order key for a base translation key (spec §4.7 Step 6): plain keys
/// sort case-insensitively; among a shared base, non-plural sorts before
/// plural, cardinal plurals before ordinal plurals, plurals in canonical CLDR
/// order, stable on case for ties.
fn sort_rank(key: &str, plural_separator: &str) -> (String, u8, u8, String) {
    match parse_plural_suffix(key, plural_separator) {
        Some(suffix) => {
            let category_rank = PluralCategory::CANONICAL_ORDER
                .iter()
                .position(|c| *c == suffix.category)
                .unwrap_or(usize::MAX) as u8;
            let kind_rank = if suffix.is_ordinal { 2 } else { 1 };
            (suffix.base.to_lowercase(), kind_rank, category_rank, key.to_string())
        }
        None => (key.to_lowercase(), 0, 0, key.to_string()),
    }
}

/// Recursively sort a tree's keys by the canonical composite order. Applies
/// at every level, including the top level when no user comparator is
/// supplied.
pub fn sort_recursive(tree: &TranslationTree, plural_separator: &str) -> TranslationTree {
    let mut entries: Vec<(String, Value)> = tree
        .iter()
        .map(|(k, v)| {
            let sorted_value = match v {
                Value::Object(obj) => Value::Object(sort_recursive(obj, plural_separator)),
                other => other.clone(),
            };
            (k.clone(), sorted_value)
        })
        .collect();
    entries.sort_by(|(a, _), (b, _)| sort_rank(a, plural_separator).cmp(&sort_rank(b, plural_separator)));
    entries.into_iter().collect()
}

/// Apply a user-supplied comparator to the top-level keys only (spec §9:
/// "a user-supplied comparator only orders the top level; nested levels are
/// sorted canonically"); nested levels still sort canonically beneath it.
pub fn sort_top_level_then_canonical_nested(
    tree: &TranslationTree,
    plural_separator: &str,
    top_level_cmp: impl Fn(&str, &str) -> std::cmp::Ordering,
) -> TranslationTree {
    let mut entries: Vec<(String, Value)> = tree
        .iter()
        .map(|(k, v)| {
            let sorted_value = match v {
                Value::Object(obj) => Value::Object(sort_recursive(obj, plural_separator)),
                other => other.clone(),
            };
            (k.clone(), sorted_value)
        })
        .collect();
    entries.sort_by(|(a, _), (b, _)| top_level_cmp(a, b));
    entries.into_iter().collect()
}

/// Flatten a tree into `(dotted_path, value)` pairs, for parse-side scanning
/// (e.g. locale-file ingestion) that needs every leaf's full path.
pub fn flatten(tree: &TranslationTree, key_separator: &str) -> BTreeMap<String, Value> {
    let mut out = BTreeMap::new();
    flatten_into(tree, String::new(), key_separator, &mut out);
    out
}

fn flatten_into(
    tree: &TranslationTree,
    prefix: String,
    key_separator: &str,
    out: &mut BTreeMap<String, Value>,
) {
    for (key, value) in tree {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}{key_separator}{key}")
        };
        match value {
            Value::Object(obj) => flatten_into(obj, path, key_separator, out),
            leaf => {
                out.insert(path, leaf.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree_of(value: Value) -> TranslationTree {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_get_nested() {
        let tree = tree_of(json!({ "a": { "b": "c" } }));
        assert_eq!(get_nested(&tree, &["a", "b"]).unwrap(), "c");
    }

    #[test]
    fn test_split_key_with_separator() {
        assert_eq!(split_key("a.b.c", Some(".")), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_split_key_no_separator_is_flat() {
        assert_eq!(split_key("a.b.c", None), vec!["a.b.c"]);
    }

    #[test]
    fn test_expand_path_template_basic() {
        let result = expand_path_template("locales/{{language}}/{{namespace}}.json", "en", Some("common"));
        assert_eq!(result, "locales/en/common.json");
    }

    #[test]
    fn test_expand_path_template_lng_alias() {
        let result = expand_path_template("locales/{{lng}}.json", "en", None);
        assert_eq!(result, "locales/en.json");
    }

    #[test]
    fn test_expand_path_template_elides_namespace_and_collapses_separator() {
        let result = expand_path_template("locales/{{language}}/{{namespace}}/file.json", "en", None);
        assert_eq!(result, "locales/en/file.json");
    }

    #[test]
    fn test_serialize_json_format() {
        let tree = tree_of(json!({ "a": "b" }));
        let out = serialize_output(&tree, OutputFormat::Json, 2);
        assert!(out.starts_with('{'));
        assert!(out.ends_with("}\n"));
    }

    #[test]
    fn test_serialize_js_esm_format() {
        let tree = tree_of(json!({ "a": "b" }));
        let out = serialize_output(&tree, OutputFormat::JsEsm, 2);
        assert!(out.starts_with("export default {"));
    }

    #[test]
    fn test_serialize_ts_format_has_as_const() {
        let tree = tree_of(json!({ "a": "b" }));
        let out = serialize_output(&tree, OutputFormat::Ts, 2);
        assert!(out.trim_end().ends_with("as const;"));
    }

    #[test]
    fn test_serialize_cjs_format() {
        let tree = tree_of(json!({ "a": "b" }));
        let out = serialize_output(&tree, OutputFormat::JsCjs, 2);
        assert!(out.starts_with("module.exports = {"));
    }

    #[test]
    fn test_canonical_json_stable_for_equal_trees() {
        let t1 = tree_of(json!({ "a": "b", "c": "d" }));
        let t2 = tree_of(json!({ "a": "b", "c": "d" }));
        assert_eq!(canonical_json(&t1, 2), canonical_json(&t2, 2));
    }

    #[test]
    fn test_sort_recursive_non_plural_before_plural() {
        let tree = tree_of(json!({ "items_other": "x", "items": "y", "items_one": "z" }));
        let sorted = sort_recursive(&tree, "_");
        let keys: Vec<&String> = sorted.keys().collect();
        assert_eq!(keys, vec!["items", "items_one", "items_other"]);
    }

    #[test]
    fn test_sort_recursive_cardinal_before_ordinal() {
        let tree = tree_of(json!({
            "place_ordinal_one": "1st",
            "place_one": "1 item",
            "place_ordinal_two": "2nd"
        }));
        let sorted = sort_recursive(&tree, "_");
        let keys: Vec<&String> = sorted.keys().collect();
        assert_eq!(keys, vec!["place_one", "place_ordinal_one", "place_ordinal_two"]);
    }

    #[test]
    fn test_sort_recursive_nested() {
        let tree = tree_of(json!({ "outer": { "b": "1", "a": "2" } }));
        let sorted = sort_recursive(&tree, "_");
        let inner = sorted["outer"].as_object().unwrap();
        let keys: Vec<&String> = inner.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_flatten() {
        let tree = tree_of(json!({ "a": { "b": "c" }, "d": "e" }));
        let flat = flatten(&tree, ".");
        assert_eq!(flat.get("a.b").unwrap(), "c");
        assert_eq!(flat.get("d").unwrap(), "e");
    }

    #[test]
    fn test_write_json5_in_place_preserves_untouched_lines() {
        let existing = "{\n  // a comment\n  \"a\": \"old\",\n  \"b\": \"keep\",\n}\n";
        let new_tree = tree_of(json!({ "a": "new", "b": "keep" }));
        let updated = write_json5_in_place(existing, &new_tree).unwrap();
        assert!(updated.contains("// a comment"));
        assert!(updated.contains("\"a\": \"new\""));
        assert!(updated.contains("\"b\": \"keep\""));
    }

    #[test]
    fn test_write_json5_in_place_appends_new_key() {
        let existing = "{\n  \"a\": \"old\",\n}\n";
        let new_tree = tree_of(json!({ "a": "old", "c": "new" }));
        let updated = write_json5_in_place(existing, &new_tree).unwrap();
        assert!(updated.contains("\"c\": \"new\""));
    }

    #[test]
    fn test_write_json5_in_place_removes_pruned_key() {
        let existing = "{\n  \"a\": \"old\",\n  \"b\": \"gone\",\n}\n";
        let new_tree = tree_of(json!({ "a": "old" }));
        let updated = write_json5_in_place(existing, &new_tree).unwrap();
        assert!(!updated.contains("\"b\""));
        assert!(updated.contains("\"a\": \"old\""));
    }

    #[test]
    fn test_write_json5_in_place_replaces_multiline_nested_object() {
        let existing = "{\n  \"outer\": {\n    \"a\": \"old\",\n    \"b\": \"old\"\n  },\n  \"sibling\": \"keep\"\n}\n";
        let new_tree = tree_of(json!({
            "outer": { "a": "new", "b": "old", "c": "added" },
            "sibling": "keep"
        }));
        let updated = write_json5_in_place(existing, &new_tree).unwrap();
        let reparsed: Value = json5::from_str(&updated).unwrap();
        assert_eq!(reparsed["outer"]["a"], "new");
        assert_eq!(reparsed["outer"]["b"], "old");
        assert_eq!(reparsed["outer"]["c"], "added");
        assert_eq!(reparsed["sibling"], "keep");
        // the superseded nested object's old entries must not survive as
        // dangling lines alongside the replacement.
        assert_eq!(updated.matches("\"a\"").count(), 1);
        assert_eq!(updated.matches('}').count(), updated.matches('{').count());
    }
}
