//! Bilingual content resolution.
//!
//! Content is authored in English and Arabic side by side, either as
//! `{"en": .., "ar": ..}` objects or as sibling `xxxEn` / `xxxAr` keys.
//! Resolving for a locale collapses both shapes to a single value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Site locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ar,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Ar => "ar",
        }
    }

    /// Parse a locale from request input; anything unrecognised is English.
    pub fn from_param(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }

    /// Key suffix used by flattened bilingual fields.
    fn suffix(&self) -> &'static str {
        match self {
            Locale::En => "En",
            Locale::Ar => "Ar",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "en-us" | "en-gb" => Ok(Locale::En),
            "ar" | "ar-ae" | "ar-sa" => Ok(Locale::Ar),
            other => Err(format!("unsupported locale: {}", other)),
        }
    }
}

fn is_absent(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// Choose between the English and Arabic variants of one field.
///
/// Arabic falls back to English when missing or blank. English falls
/// back to Arabic only when English is missing.
pub fn pick<'a>(en: Option<&'a Value>, ar: Option<&'a Value>, locale: Locale) -> Option<&'a Value> {
    match locale {
        Locale::Ar if !is_blank(ar) => ar,
        Locale::Ar => en.filter(|v| !v.is_null()).or(ar),
        Locale::En if !is_absent(en) => en,
        Locale::En => ar.filter(|v| !v.is_null()).or(en),
    }
}

/// Text variant of [`pick`] for typed columns.
pub fn pick_text(en: Option<&str>, ar: Option<&str>, locale: Locale) -> Option<String> {
    match locale {
        Locale::Ar => ar
            .filter(|s| !s.trim().is_empty())
            .or(en)
            .map(str::to_string),
        Locale::En => en.or(ar).map(str::to_string),
    }
}

/// An object whose only keys are `en` and/or `ar`.
fn is_bilingual_object(map: &Map<String, Value>) -> bool {
    !map.is_empty() && map.keys().all(|k| k == "en" || k == "ar")
}

/// Split `titleEn` into (`title`, En). The base must end in a lowercase
/// letter or digit so that words like `Clear` are left alone.
fn split_locale_key(key: &str) -> Option<(&str, Locale)> {
    for locale in [Locale::En, Locale::Ar] {
        if let Some(base) = key.strip_suffix(locale.suffix()) {
            let ends_well = base
                .chars()
                .last()
                .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
            if ends_well {
                return Some((base, locale));
            }
        }
    }
    None
}

/// Resolve every bilingual leaf in `value` for `locale`.
pub fn localize(value: &Value, locale: Locale) -> Value {
    match value {
        Value::Object(map) if is_bilingual_object(map) => {
            pick(map.get("en"), map.get("ar"), locale)
                .map(|v| localize(v, locale))
                .unwrap_or(Value::Null)
        }
        Value::Object(map) => localize_object(map, locale),
        Value::Array(items) => Value::Array(items.iter().map(|v| localize(v, locale)).collect()),
        other => other.clone(),
    }
}

fn localize_object(map: &Map<String, Value>, locale: Locale) -> Value {
    let mut out = Map::with_capacity(map.len());
    let mut paired: Vec<&str> = Vec::new();

    for (key, value) in map {
        match split_locale_key(key) {
            Some((base, _)) => {
                if !paired.contains(&base) {
                    paired.push(base);
                }
            }
            None => {
                out.insert(key.clone(), localize(value, locale));
            }
        }
    }

    // Flattened pairs override a plain key of the same name.
    for base in paired {
        let en = map.get(&format!("{}En", base));
        let ar = map.get(&format!("{}Ar", base));
        let chosen = pick(en, ar, locale)
            .map(|v| localize(v, locale))
            .unwrap_or(Value::Null);
        out.insert(base.to_string(), chosen);
    }

    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_locale_parsing() {
        assert_eq!(Locale::from_param(Some("ar")), Locale::Ar);
        assert_eq!(Locale::from_param(Some("AR-ae")), Locale::Ar);
        assert_eq!(Locale::from_param(Some("fr")), Locale::En);
        assert_eq!(Locale::from_param(None), Locale::En);
    }

    #[test]
    fn test_arabic_falls_back_to_english() {
        let block = json!({ "title": { "en": "Our Work" } });
        assert_eq!(localize(&block, Locale::Ar), json!({ "title": "Our Work" }));

        let blank = json!({ "title": { "en": "Our Work", "ar": "  " } });
        assert_eq!(localize(&blank, Locale::Ar), json!({ "title": "Our Work" }));
    }

    #[test]
    fn test_english_keeps_blank_english() {
        let block = json!({ "title": { "en": "", "ar": "أعمالنا" } });
        assert_eq!(localize(&block, Locale::En), json!({ "title": "" }));

        let missing = json!({ "title": { "ar": "أعمالنا" } });
        assert_eq!(localize(&missing, Locale::En), json!({ "title": "أعمالنا" }));
    }

    #[test]
    fn test_suffixed_keys_collapse() {
        let data = json!({
            "titleEn": "Villa Interiors",
            "titleAr": "تصميم الفلل",
            "subtitleEn": "Dubai",
            "ctaLink": "/portfolio"
        });

        assert_eq!(
            localize(&data, Locale::Ar),
            json!({ "title": "تصميم الفلل", "subtitle": "Dubai", "ctaLink": "/portfolio" })
        );
        assert_eq!(
            localize(&data, Locale::En),
            json!({ "title": "Villa Interiors", "subtitle": "Dubai", "ctaLink": "/portfolio" })
        );
    }

    #[test]
    fn test_nested_items_resolve() {
        let faq = json!({
            "items": [
                { "question": { "en": "How long?", "ar": "كم المدة؟" }, "order": 1 },
                { "questionEn": "Budget?", "order": 2 }
            ]
        });

        assert_eq!(
            localize(&faq, Locale::Ar),
            json!({
                "items": [
                    { "question": "كم المدة؟", "order": 1 },
                    { "question": "Budget?", "order": 2 }
                ]
            })
        );
    }

    #[test]
    fn test_plain_words_are_not_split() {
        assert_eq!(split_locale_key("Clear"), None);
        assert_eq!(split_locale_key("En"), None);
        assert_eq!(split_locale_key("titleEn"), Some(("title", Locale::En)));
        assert_eq!(split_locale_key("step2Ar"), Some(("step2", Locale::Ar)));
    }

    #[test]
    fn test_pick_text() {
        assert_eq!(pick_text(Some("Home"), Some(""), Locale::Ar), Some("Home".into()));
        assert_eq!(pick_text(Some("Home"), Some("الرئيسية"), Locale::Ar), Some("الرئيسية".into()));
        assert_eq!(pick_text(None, Some("الرئيسية"), Locale::En), Some("الرئيسية".into()));
        assert_eq!(pick_text(None, None, Locale::En), None);
    }
}
