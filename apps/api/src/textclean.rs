//! Offline repair of malformed product JSON files: Unicode normalization,
//! typographic-punctuation replacement, control-character stripping, and
//! trailing-comma removal.
//!
//! Standalone tooling: the generation pipeline never calls into this module.

use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex::Regex;
use serde_json::Value;
use unicode_normalization::UnicodeNormalization;

/// Ambiguous characters replaced with ASCII equivalents.
const REPLACEMENTS: &[(char, &str)] = &[
    ('\u{201C}', "\""), // left double quote
    ('\u{201D}', "\""), // right double quote
    ('\u{201E}', "\""), // low double quote
    ('\u{201F}', "\""), // reversed double quote
    ('\u{275D}', "\""), // ornamental double quote, open
    ('\u{275E}', "\""), // ornamental double quote, close
    ('\u{2018}', "'"),  // left single quote
    ('\u{2019}', "'"),  // right single quote
    ('\u{201A}', "'"),  // low single quote
    ('\u{201B}', "'"),  // reversed single quote
    ('\u{275B}', "'"),  // ornamental single quote, open
    ('\u{275C}', "'"),  // ornamental single quote, close
    ('\u{2013}', "-"),  // en dash
    ('\u{2014}', "-"),  // em dash
    ('\u{2015}', "-"),  // horizontal bar
    ('\u{2026}', "..."), // ellipsis
    ('\u{2022}', "*"),  // bullet
    ('\u{00A0}', " "),  // no-break space
    ('\u{200B}', ""),   // zero-width space
    ('\u{FEFF}', ""),   // BOM / zero-width no-break space
];

// Benign Latin supplement characters (e, u, c with diacritics, etc.)
const BENIGN_RANGES: &[(u32, u32)] = &[
    (0x00C0, 0x017F), // Latin-1 Supplement + Extended-A
    (0x0180, 0x024F), // Latin Extended-B
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Benign,
    NeedsCleaning,
    Other,
}

/// One non-ASCII character found while scanning a file.
#[derive(Debug, Clone)]
pub struct Anomaly {
    pub line: usize,
    pub column: usize,
    pub ch: char,
    pub class: CharClass,
}

pub fn classify_char(ch: char) -> CharClass {
    if REPLACEMENTS.iter().any(|(bad, _)| *bad == ch) {
        return CharClass::NeedsCleaning;
    }
    let code = ch as u32;
    if BENIGN_RANGES
        .iter()
        .any(|(start, end)| (*start..=*end).contains(&code))
    {
        CharClass::Benign
    } else {
        CharClass::Other
    }
}

/// Scans text for non-ASCII characters and classifies each occurrence.
pub fn detect_anomalies(text: &str) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();
    for (line_index, line) in text.lines().enumerate() {
        for (column_index, ch) in line.chars().enumerate() {
            if !ch.is_ascii() {
                anomalies.push(Anomaly {
                    line: line_index + 1,
                    column: column_index + 1,
                    ch,
                    class: classify_char(ch),
                });
            }
        }
    }
    anomalies
}

/// NFKC-normalizes, replaces known ambiguous characters with ASCII
/// equivalents, and strips control characters.
pub fn normalize_string(s: &str) -> String {
    let normalized: String = s.nfkc().collect();
    let mut out = String::with_capacity(normalized.len());
    for ch in normalized.chars() {
        match REPLACEMENTS.iter().find(|(bad, _)| *bad == ch) {
            Some((_, replacement)) => out.push_str(replacement),
            None => out.push(ch),
        }
    }
    strip_control_chars(&out)
}

pub fn strip_control_chars(s: &str) -> String {
    ctrl_re().replace_all(s, "").into_owned()
}

/// Removes trailing commas before `}` or `]` so strict JSON parsing can
/// succeed.
pub fn strip_trailing_commas(text: &str) -> String {
    trailing_comma_re().replace_all(text, "$1").into_owned()
}

/// Recursively normalizes every string value in a JSON document.
pub fn normalize_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(normalize_string(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_value).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, normalize_value(value)))
                .collect(),
        ),
        other => other,
    }
}

/// Drops empty or non-object product entries. Entries missing id/title are
/// kept only when they still carry at least one non-empty field, to avoid
/// over-dropping partially scraped records.
pub fn clean_products(products: Vec<Value>) -> Vec<Value> {
    products
        .into_iter()
        .filter(|entry| {
            let Some(map) = entry.as_object() else {
                return false;
            };
            if map.is_empty() {
                return false;
            }
            if map.contains_key("id") && map.contains_key("title") {
                return true;
            }
            map.values().any(|value| !value_is_empty(value))
        })
        .collect()
}

fn value_is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Counts from one structured cleaning run.
#[derive(Debug, Clone, Copy)]
pub struct CleanSummary {
    pub products_before: usize,
    pub products_kept: usize,
}

/// Pre-cleans raw text enough to parse it as JSON, then normalizes string
/// values and filters the `products` list if one is present.
pub fn parse_and_clean(text: &str) -> Result<(Value, CleanSummary)> {
    let pre = text.trim_start_matches('\u{FEFF}');
    let pre = strip_control_chars(pre);
    let pre = strip_trailing_commas(&pre);

    let data: Value = serde_json::from_str(&pre).context("JSON parse failed after pre-cleaning")?;
    // Normalize after parsing so replacement quotes get escaped on dump.
    let mut data = normalize_value(data);

    let mut summary = CleanSummary {
        products_before: 0,
        products_kept: 0,
    };
    if let Some(products) = data
        .get_mut("products")
        .and_then(|value| value.as_array_mut())
    {
        summary.products_before = products.len();
        let cleaned = clean_products(std::mem::take(products));
        summary.products_kept = cleaned.len();
        *products = cleaned;
    }

    Ok((data, summary))
}

/// Last-resort repair when structured parsing is impossible: normalize the
/// raw text and strip trailing commas. Quotes inside values may still break
/// JSON.
pub fn clean_text_fallback(text: &str) -> String {
    strip_trailing_commas(&normalize_string(text))
}

/// How a file was cleaned.
#[derive(Debug)]
pub enum CleanOutcome {
    /// Structured JSON cleaning succeeded.
    Structured(CleanSummary),
    /// Raw text normalization was used; carries the parse error that forced
    /// the fallback.
    Fallback(String),
}

/// Reads `input`, repairs it, and writes the cleaned document to `output`.
/// Falls back to raw text normalization when the input is too broken to
/// parse even after pre-cleaning.
pub fn clean_file(input: &Path, output: &Path) -> Result<CleanOutcome> {
    let original = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    match parse_and_clean(&original) {
        Ok((data, summary)) => {
            std::fs::write(output, serde_json::to_string_pretty(&data)?)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            Ok(CleanOutcome::Structured(summary))
        }
        Err(e) => {
            std::fs::write(output, clean_text_fallback(&original))
                .with_context(|| format!("Failed to write {}", output.display()))?;
            Ok(CleanOutcome::Fallback(format!("{e:#}")))
        }
    }
}

fn ctrl_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[\x00-\x08\x0B-\x0C\x0E-\x1F\x7F]").expect("valid control-char regex")
    })
}

fn trailing_comma_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r",(\s*[}\]])").expect("valid trailing-comma regex"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_replaces_smart_punctuation() {
        assert_eq!(
            normalize_string("\u{201C}hello\u{201D} \u{2014} it\u{2019}s fine\u{2026}"),
            "\"hello\" - it's fine..."
        );
    }

    #[test]
    fn test_normalize_strips_control_and_zero_width() {
        assert_eq!(normalize_string("a\u{0001}b\u{200B}c"), "abc");
    }

    #[test]
    fn test_normalize_keeps_benign_accents() {
        assert_eq!(normalize_string("café"), "café");
    }

    #[test]
    fn test_strip_trailing_commas() {
        assert_eq!(
            strip_trailing_commas(r#"{"a": [1, 2,], "b": 3,}"#),
            r#"{"a": [1, 2], "b": 3}"#
        );
    }

    #[test]
    fn test_classify_char() {
        assert_eq!(classify_char('\u{201C}'), CharClass::NeedsCleaning);
        assert_eq!(classify_char('é'), CharClass::Benign);
        assert_eq!(classify_char('\u{4E2D}'), CharClass::Other);
    }

    #[test]
    fn test_detect_anomalies_reports_positions() {
        let anomalies = detect_anomalies("plain\nsmart \u{201C}quote\u{201D}");
        assert_eq!(anomalies.len(), 2);
        assert_eq!(anomalies[0].line, 2);
        assert_eq!(anomalies[0].column, 7);
        assert_eq!(anomalies[0].class, CharClass::NeedsCleaning);
    }

    #[test]
    fn test_parse_and_clean_repairs_bom_and_trailing_commas() {
        let raw = "\u{FEFF}{\"products\": [{\"id\": 1, \"title\": \"Dress\",},],}";
        let (data, summary) = parse_and_clean(raw).unwrap();
        assert_eq!(summary.products_before, 1);
        assert_eq!(summary.products_kept, 1);
        assert_eq!(data["products"][0]["title"], "Dress");
    }

    #[test]
    fn test_parse_and_clean_normalizes_nested_strings() {
        let raw = r#"{"products": [{"id": 1, "title": "“Silk” dress"}]}"#;
        let (data, _) = parse_and_clean(raw).unwrap();
        assert_eq!(data["products"][0]["title"], "\"Silk\" dress");
    }

    #[test]
    fn test_parse_and_clean_drops_empty_products() {
        let raw = r#"{"products": [{}, {"id": 1, "title": "Keep"}, {"note": ""}]}"#;
        let (data, summary) = parse_and_clean(raw).unwrap();
        assert_eq!(summary.products_before, 3);
        assert_eq!(summary.products_kept, 1);
        assert_eq!(data["products"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_partial_record_with_content_is_kept() {
        let cleaned = clean_products(vec![json!({"title": "No id but content"})]);
        assert_eq!(cleaned.len(), 1);
    }

    #[test]
    fn test_unparsable_input_errors() {
        assert!(parse_and_clean("not json at all").is_err());
    }

    #[test]
    fn test_fallback_still_normalizes() {
        let out = clean_text_fallback("{\"a\": \u{201C}broken\u{201D},}");
        assert!(out.contains("\"broken\""));
        assert!(out.ends_with('}'));
        assert!(!out.contains(",}"));
    }

    #[test]
    fn test_clean_file_structured_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.json");
        let output = dir.path().join("out.json");
        std::fs::write(&input, "{\"products\": [{\"id\": 1, \"title\": \"\u{201C}Silk\u{201D}\",},],}").unwrap();

        let outcome = clean_file(&input, &output).unwrap();
        match outcome {
            CleanOutcome::Structured(summary) => assert_eq!(summary.products_kept, 1),
            CleanOutcome::Fallback(reason) => panic!("unexpected fallback: {reason}"),
        }

        let cleaned: Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(cleaned["products"][0]["title"], "\"Silk\"");
    }

    #[test]
    fn test_clean_file_falls_back_on_hopeless_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.json");
        let output = dir.path().join("out.json");
        std::fs::write(&input, "not json \u{2014} at all,}").unwrap();

        let outcome = clean_file(&input, &output).unwrap();
        assert!(matches!(outcome, CleanOutcome::Fallback(_)));

        let written = std::fs::read_to_string(&output).unwrap();
        assert!(written.contains("not json - at all"));
    }
}
