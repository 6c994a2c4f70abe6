//! Comment Scanner (spec §4.5): recovers `t("key"[, defaultValueOrOptions])`
//! calls written inside line or block comments — commented-out code that
//! should still count as a live call site. Intentionally a literal text
//! scanner, not a second parse pass, and intentionally narrow: only the
//! hardcoded function name `t` is recognized, to avoid false positives from
//! unrelated scoped aliases.

use regex::Regex;
use std::sync::OnceLock;

/// A translation call recovered from a comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentKeyHit {
    pub key: String,
    pub default_value: Option<String>,
    pub namespace: Option<String>,
}

fn call_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?:^|[^\w.])t\(\s*(?:"([^"]*)"|'([^']*)')\s*(?:,\s*([^)]*))?\)"#)
            .expect("comment-scanner call pattern is a fixed, valid regex")
    })
}

fn default_value_string_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"^\s*(?:"([^"]*)"|'([^']*)')\s*$"#).unwrap())
}

fn default_value_property_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"defaultValue\s*:\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
    })
}

fn ns_property_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"\bns\s*:\s*(?:"([^"]*)"|'([^']*)')"#).unwrap())
}

/// Extract every line-comment (`//...`) and block-comment (`/*...*/`) span
/// from raw source text, ignoring occurrences of comment-opening sequences
/// inside string literals. This is a small state machine, not a parser: it
/// tracks only enough state (in-string / in-line-comment / in-block-comment)
/// to avoid the most common false positive (a `//` or `/*` inside a string).
fn extract_comment_spans(source: &str) -> Vec<&str> {
    #[derive(PartialEq)]
    enum State {
        Code,
        InString(char),
        InLineComment,
        InBlockComment,
    }

    let bytes = source.as_bytes();
    let mut state = State::Code;
    let mut spans = Vec::new();
    let mut comment_start: Option<usize> = None;
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        match state {
            State::Code => {
                if c == '"' || c == '\'' || c == '`' {
                    state = State::InString(c);
                } else if c == '/' && bytes.get(i + 1) == Some(&b'/') {
                    state = State::InLineComment;
                    comment_start = Some(i + 2);
                    i += 1;
                } else if c == '/' && bytes.get(i + 1) == Some(&b'*') {
                    state = State::InBlockComment;
                    comment_start = Some(i + 2);
                    i += 1;
                }
            }
            State::InString(quote) => {
                if c == '\\' {
                    i += 1; // skip escaped character
                } else if c == quote {
                    state = State::Code;
                }
            }
            State::InLineComment => {
                if c == '\n' {
                    if let Some(start) = comment_start.take() {
                        spans.push(&source[start..i]);
                    }
                    state = State::Code;
                }
            }
            State::InBlockComment => {
                if c == '*' && bytes.get(i + 1) == Some(&b'/') {
                    if let Some(start) = comment_start.take() {
                        spans.push(&source[start..i]);
                    }
                    state = State::Code;
                    i += 1;
                }
            }
        }
        i += 1;
    }
    if let (State::InLineComment, Some(start)) = (&state, comment_start) {
        spans.push(&source[start..]);
    }
    spans
}

/// Scan raw source text for commented-out `t("key", ...)` call sites
/// (spec §4.5).
pub fn scan_comments_for_keys(source: &str) -> Vec<CommentKeyHit> {
    let mut hits = Vec::new();
    for span in extract_comment_spans(source) {
        for caps in call_pattern().captures_iter(span) {
            let key = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str().to_string());
            let Some(key) = key else { continue };
            let fragment = caps.get(3).map(|m| m.as_str()).unwrap_or("");

            let default_value = default_value_string_pattern()
                .captures(fragment)
                .and_then(|c| c.get(1).or_else(|| c.get(2)))
                .map(|m| m.as_str().to_string())
                .or_else(|| {
                    default_value_property_pattern()
                        .captures(fragment)
                        .and_then(|c| c.get(1).or_else(|| c.get(2)))
                        .map(|m| m.as_str().to_string())
                });

            let namespace = ns_property_pattern()
                .captures(fragment)
                .and_then(|c| c.get(1).or_else(|| c.get(2)))
                .map(|m| m.as_str().to_string());

            hits.push(CommentKeyHit {
                key,
                default_value,
                namespace,
            });
        }
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_comment_basic_call() {
        let source = "// t(\"save\")\nconst x = 1;";
        let hits = scan_comments_for_keys(source);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key, "save");
        assert_eq!(hits[0].default_value, None);
    }

    #[test]
    fn test_block_comment_with_default_value_string() {
        let source = "/* t('greet', 'Hello there') */";
        let hits = scan_comments_for_keys(source);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key, "greet");
        assert_eq!(hits[0].default_value.as_deref(), Some("Hello there"));
    }

    #[test]
    fn test_default_value_from_options_object() {
        let source = "// t(\"greet\", { defaultValue: \"Hello\", ns: \"common\" })";
        let hits = scan_comments_for_keys(source);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].default_value.as_deref(), Some("Hello"));
        assert_eq!(hits[0].namespace.as_deref(), Some("common"));
    }

    #[test]
    fn test_scoped_alias_not_recognized() {
        let source = "// i18n.t(\"save\")";
        let hits = scan_comments_for_keys(source);
        // only the bare `t(` form is recognized; `i18n.t(` is preceded by `.`
        assert!(hits.is_empty());
    }

    #[test]
    fn test_call_inside_string_literal_is_ignored() {
        let source = "const s = \"// t('fake')\";";
        let hits = scan_comments_for_keys(source);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_multiple_hits_across_comments() {
        let source = "// t(\"a\")\nconst x = 1;\n/* t(\"b\") */";
        let hits = scan_comments_for_keys(source);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].key, "a");
        assert_eq!(hits[1].key, "b");
    }

    #[test]
    fn test_unterminated_line_comment_at_eof() {
        let source = "// t(\"eof\")";
        let hits = scan_comments_for_keys(source);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key, "eof");
    }

    #[test]
    fn test_no_comments_yields_no_hits() {
        let source = "const t = useTranslation(); t('save');";
        assert!(scan_comments_for_keys(source).is_empty());
    }
}
