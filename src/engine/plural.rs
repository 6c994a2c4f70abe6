//! CLDR plural category tables (spec §3 Invariant 3, §4.7 Step 1, Glossary).
//!
//! No crate in the dependency stack models CLDR plural rules, and none of the
//! corpus this crate is grounded on touches plurals at all, so this table is
//! hand-written directly from the rule text: for each locale, a fixed ordered
//! set of cardinal categories and a fixed ordered set of ordinal categories.
//! Unlisted locales fall back to the universal `{one, other}` cardinal set and
//! `{other}` ordinal set, which is correct for the large majority of
//! languages CLDR itself classifies this way.

use std::fmt;

/// One CLDR plural class. Ordered per spec.md's canonical sort order
/// (`zero, one, two, few, many, other`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PluralCategory {
    Zero,
    One,
    Two,
    Few,
    Many,
    Other,
}

impl PluralCategory {
    pub const CANONICAL_ORDER: [PluralCategory; 6] = [
        PluralCategory::Zero,
        PluralCategory::One,
        PluralCategory::Two,
        PluralCategory::Few,
        PluralCategory::Many,
        PluralCategory::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PluralCategory::Zero => "zero",
            PluralCategory::One => "one",
            PluralCategory::Two => "two",
            PluralCategory::Few => "few",
            PluralCategory::Many => "many",
            PluralCategory::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "zero" => Some(PluralCategory::Zero),
            "one" => Some(PluralCategory::One),
            "two" => Some(PluralCategory::Two),
            "few" => Some(PluralCategory::Few),
            "many" => Some(PluralCategory::Many),
            "other" => Some(PluralCategory::Other),
            _ => None,
        }
    }
}

impl fmt::Display for PluralCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const UNIVERSAL_CARDINAL: &[PluralCategory] = &[PluralCategory::One, PluralCategory::Other];
const UNIVERSAL_ORDINAL: &[PluralCategory] = &[PluralCategory::Other];
const NO_PLURAL_DISTINCTION: &[PluralCategory] = &[PluralCategory::Other];

/// Look up the cardinal plural categories valid for a BCP-47-ish locale tag.
/// The language subtag is matched case-insensitively; region/script subtags
/// are ignored (e.g. `en-US` and `en-GB` both resolve to `en`).
pub fn cardinal_categories(locale: &str) -> &'static [PluralCategory] {
    match base_language(locale) {
        "ar" => &[
            PluralCategory::Zero,
            PluralCategory::One,
            PluralCategory::Two,
            PluralCategory::Few,
            PluralCategory::Many,
            PluralCategory::Other,
        ],
        "ru" | "uk" | "sr" | "hr" | "bs" => &[
            PluralCategory::One,
            PluralCategory::Few,
            PluralCategory::Many,
            PluralCategory::Other,
        ],
        "pl" => &[
            PluralCategory::One,
            PluralCategory::Few,
            PluralCategory::Many,
            PluralCategory::Other,
        ],
        "cs" | "sk" => &[
            PluralCategory::One,
            PluralCategory::Few,
            PluralCategory::Many,
            PluralCategory::Other,
        ],
        "lt" => &[
            PluralCategory::One,
            PluralCategory::Few,
            PluralCategory::Many,
            PluralCategory::Other,
        ],
        "cy" => &[
            PluralCategory::Zero,
            PluralCategory::One,
            PluralCategory::Two,
            PluralCategory::Few,
            PluralCategory::Many,
            PluralCategory::Other,
        ],
        "ga" => &[
            PluralCategory::One,
            PluralCategory::Two,
            PluralCategory::Few,
            PluralCategory::Many,
            PluralCategory::Other,
        ],
        "he" | "iw" => &[PluralCategory::One, PluralCategory::Two, PluralCategory::Other],
        "lv" => &[PluralCategory::Zero, PluralCategory::One, PluralCategory::Other],
        "ja" | "ko" | "zh" | "vi" | "th" | "id" | "ms" | "my" => NO_PLURAL_DISTINCTION,
        "fr" | "pt" | "hy" | "kab" => &[PluralCategory::One, PluralCategory::Other],
        _ => UNIVERSAL_CARDINAL,
    }
}

/// Look up the ordinal plural categories valid for a locale.
pub fn ordinal_categories(locale: &str) -> &'static [PluralCategory] {
    match base_language(locale) {
        "en" => &[
            PluralCategory::One,
            PluralCategory::Two,
            PluralCategory::Few,
            PluralCategory::Other,
        ],
        "cy" => &[
            PluralCategory::Zero,
            PluralCategory::One,
            PluralCategory::Two,
            PluralCategory::Few,
            PluralCategory::Many,
            PluralCategory::Other,
        ],
        "ca" | "it" => &[
            PluralCategory::Many,
            PluralCategory::Other,
        ],
        _ => UNIVERSAL_ORDINAL,
    }
}

fn base_language(locale: &str) -> &str {
    locale.split(['-', '_']).next().unwrap_or(locale)
}

/// Format a plural key segment from its base, given the configured
/// separators (spec §4.7: `<base><pluralSeparator><category>` for cardinal,
/// `<base><pluralSeparator>ordinal<pluralSeparator><category>` for ordinal).
pub fn format_plural_key(base: &str, plural_separator: &str, category: PluralCategory, is_ordinal: bool) -> String {
    if is_ordinal {
        format!("{base}{plural_separator}ordinal{plural_separator}{category}")
    } else {
        format!("{base}{plural_separator}{category}")
    }
}

/// Parsed plural suffix information recovered from an existing tree key
/// (spec §4.7 Step 1: "the category is the final segment after
/// pluralSeparator; for ordinal plurals, the shape is
/// `<base><sep>ordinal<sep><category>`").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluralSuffix {
    pub base: String,
    pub is_ordinal: bool,
    pub category: PluralCategory,
}

/// Attempt to parse `key` as `<base><sep>[ordinal<sep>]<category>`. Returns
/// `None` if the key doesn't end in a recognized plural category segment.
pub fn parse_plural_suffix(key: &str, plural_separator: &str) -> Option<PluralSuffix> {
    if plural_separator.is_empty() {
        return None;
    }
    let (rest, last_segment) = key.rsplit_once(plural_separator)?;
    let category = PluralCategory::parse(last_segment)?;
    if let Some(base) = rest.strip_suffix(&format!("{plural_separator}ordinal")) {
        return Some(PluralSuffix {
            base: base.to_string(),
            is_ordinal: true,
            category,
        });
    }
    Some(PluralSuffix {
        base: rest.to_string(),
        is_ordinal: false,
        category,
    })
}

/// Is `zero` form always preserved when its base still exists, regardless of
/// whether `zero` is in the locale's live category set (spec §3 Invariant 3:
/// "a pre-existing `_zero` form is always preserved when its base key still
/// exists").
pub fn is_zero_category(category: PluralCategory) -> bool {
    category == PluralCategory::Zero
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arabic_has_all_six_cardinal_categories() {
        let cats = cardinal_categories("ar");
        assert_eq!(cats.len(), 6);
        assert!(cats.contains(&PluralCategory::Zero));
    }

    #[test]
    fn test_english_cardinal_is_one_other() {
        assert_eq!(
            cardinal_categories("en"),
            &[PluralCategory::One, PluralCategory::Other]
        );
    }

    #[test]
    fn test_region_subtag_ignored() {
        assert_eq!(cardinal_categories("en-US"), cardinal_categories("en"));
        assert_eq!(cardinal_categories("ar-EG"), cardinal_categories("ar"));
    }

    #[test]
    fn test_unknown_locale_falls_back_to_universal() {
        assert_eq!(cardinal_categories("xx-unknown"), UNIVERSAL_CARDINAL);
    }

    #[test]
    fn test_japanese_has_only_other() {
        assert_eq!(cardinal_categories("ja"), &[PluralCategory::Other]);
    }

    #[test]
    fn test_english_ordinal_has_four_categories() {
        assert_eq!(ordinal_categories("en").len(), 4);
    }

    #[test]
    fn test_format_cardinal_key() {
        assert_eq!(
            format_plural_key("items", "_", PluralCategory::One, false),
            "items_one"
        );
    }

    #[test]
    fn test_format_ordinal_key() {
        assert_eq!(
            format_plural_key("place", "_", PluralCategory::Two, true),
            "place_ordinal_two"
        );
    }

    #[test]
    fn test_parse_cardinal_suffix() {
        let parsed = parse_plural_suffix("items_other", "_").unwrap();
        assert_eq!(parsed.base, "items");
        assert!(!parsed.is_ordinal);
        assert_eq!(parsed.category, PluralCategory::Other);
    }

    #[test]
    fn test_parse_ordinal_suffix() {
        let parsed = parse_plural_suffix("place_ordinal_two", "_").unwrap();
        assert_eq!(parsed.base, "place");
        assert!(parsed.is_ordinal);
        assert_eq!(parsed.category, PluralCategory::Two);
    }

    #[test]
    fn test_parse_non_plural_key_returns_none() {
        assert!(parse_plural_suffix("save", "_").is_none());
    }

    #[test]
    fn test_canonical_order_matches_glossary() {
        let order: Vec<&str> = PluralCategory::CANONICAL_ORDER
            .iter()
            .map(|c| c.as_str())
            .collect();
        assert_eq!(order, vec!["zero", "one", "two", "few", "many", "other"]);
    }

    #[test]
    fn test_zero_always_preserved_flag() {
        assert!(is_zero_category(PluralCategory::Zero));
        assert!(!is_zero_category(PluralCategory::One));
    }
}
