//! Sanitizing of raw search text and filter tokens before they reach the search engine.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Largest value the engine accepts for a numeric search term (signed 32-bit).
pub const MAX_INT: i64 = 2_147_483_647;

static SEARCH_TEXT_REGEX: OnceLock<Regex> = OnceLock::new();
static TOKEN_REGEX: OnceLock<Regex> = OnceLock::new();
static LIST_REGEX: OnceLock<Regex> = OnceLock::new();
static NUMERIC_REGEX: OnceLock<Regex> = OnceLock::new();
static DIGITS_REGEX: OnceLock<Regex> = OnceLock::new();
static ATTRIBUTE_FILTER_REGEX: OnceLock<Regex> = OnceLock::new();
static SPECIAL_CHARS_REGEX: OnceLock<Regex> = OnceLock::new();
static PHRASE_CHARS_REGEX: OnceLock<Regex> = OnceLock::new();

fn search_text_regex() -> &'static Regex {
    SEARCH_TEXT_REGEX.get_or_init(|| Regex::new(r"[^a-zA-Z0-9_\- ]+").unwrap())
}

fn token_regex() -> &'static Regex {
    TOKEN_REGEX.get_or_init(|| Regex::new(r"[^a-zA-Z0-9_\-]+").unwrap())
}

fn list_regex() -> &'static Regex {
    LIST_REGEX.get_or_init(|| Regex::new(r"[^a-zA-Z0-9_,\-]+").unwrap())
}

fn numeric_regex() -> &'static Regex {
    NUMERIC_REGEX.get_or_init(|| Regex::new(r"[^0-9,\-]+").unwrap())
}

fn digits_regex() -> &'static Regex {
    DIGITS_REGEX.get_or_init(|| Regex::new(r"[^0-9]+").unwrap())
}

fn attribute_filter_regex() -> &'static Regex {
    ATTRIBUTE_FILTER_REGEX.get_or_init(|| Regex::new(r"[^a-zA-Z0-9_=,.:\-]+").unwrap())
}

// Escaped: ( ) { } [ ] ^ " ~ : \ /
// Left alone: + - && || ! * ?
fn special_chars_regex() -> &'static Regex {
    SPECIAL_CHARS_REGEX.get_or_init(|| Regex::new(r#"([(){}\[\]^"~:\\/])"#).unwrap())
}

fn phrase_chars_regex() -> &'static Regex {
    PHRASE_CHARS_REGEX.get_or_init(|| Regex::new(r#"(["\\])"#).unwrap())
}

/// Replaces Polish diacritics with their plain ASCII letters. Other characters pass through.
pub fn fold_diacritics(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'ą' => 'a',
            'Ą' => 'A',
            'ć' => 'c',
            'Ć' => 'C',
            'ę' => 'e',
            'Ę' => 'E',
            'ł' => 'l',
            'Ł' => 'L',
            'ó' => 'o',
            'Ó' => 'O',
            'ś' => 's',
            'Ś' => 'S',
            'ż' | 'ź' => 'z',
            'Ż' | 'Ź' => 'Z',
            'ń' => 'n',
            'Ń' => 'N',
            other => other,
        })
        .collect()
}

/// Byte-level variant of [`fold_diacritics`] for input of unknown encoding.
///
/// Two-byte UTF-8 sequences are matched first, then single Windows-1250 and ISO-8859-2 codes.
/// Like any byte-table fold it can rewrite the trailing byte of an unrelated UTF-8 sequence,
/// so prefer the `&str` variant whenever the text is known to be valid UTF-8.
pub fn fold_diacritics_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if let Some(&[lead, trail]) = bytes.get(i..i + 2) {
            if let Some(folded) = fold_utf8_pair(lead, trail) {
                out.push(folded);
                i += 2;
                continue;
            }
        }
        out.push(fold_legacy_byte(bytes[i]).unwrap_or(bytes[i]));
        i += 1;
    }
    out
}

fn fold_utf8_pair(lead: u8, trail: u8) -> Option<u8> {
    let folded = match (lead, trail) {
        (0xc4, 0x85) => b'a',
        (0xc4, 0x84) => b'A',
        (0xc4, 0x87) => b'c',
        (0xc4, 0x86) => b'C',
        (0xc4, 0x99) => b'e',
        (0xc4, 0x98) => b'E',
        (0xc5, 0x82) => b'l',
        (0xc5, 0x81) => b'L',
        (0xc3, 0xb3) => b'o',
        (0xc3, 0x93) => b'O',
        (0xc5, 0x9b) => b's',
        (0xc5, 0x9a) => b'S',
        (0xc5, 0xbc) | (0xc5, 0xba) => b'z',
        (0xc5, 0xbb) | (0xc5, 0xb9) => b'Z',
        (0xc5, 0x84) => b'n',
        (0xc5, 0x83) => b'N',
        _ => return None,
    };
    Some(folded)
}

fn fold_legacy_byte(byte: u8) -> Option<u8> {
    let folded = match byte {
        0xb9 | 0xb1 => b'a',
        0xa5 | 0xa1 => b'A',
        0xe6 => b'c',
        0xc6 => b'C',
        0xea => b'e',
        0xca => b'E',
        0xb3 => b'l',
        0xa3 => b'L',
        0xf3 => b'o',
        0xd3 => b'O',
        0x9c | 0xb6 => b's',
        0x8c | 0xa6 => b'S',
        0x9f | 0xbf | 0xbc => b'z',
        0xaf | 0xac => b'Z',
        0xf1 => b'n',
        0xd1 => b'N',
        _ => return None,
    };
    Some(folded)
}

/// Turns free text typed by a shopper into an engine-safe query string.
pub fn normalize_search_text(text: &str) -> String {
    let folded = fold_diacritics(text);
    let stripped = search_text_regex().replace_all(&folded, "").to_lowercase();
    let spaced = stripped.replace('-', " ");
    let escaped = escape_query_syntax(spaced.trim());
    clamp_numeric(&escaped)
}

/// Digit-only strings above [`MAX_INT`] are clamped to it; anything else is returned as is.
pub fn clamp_numeric(text: &str) -> String {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return text.to_string();
    }
    match text.parse::<u64>() {
        Ok(value) if value <= MAX_INT as u64 => text.to_string(),
        _ => MAX_INT.to_string(),
    }
}

/// Escapes query-syntax characters. Numeric input is returned untouched, double-quoted input is
/// treated as a phrase, and hyphens are removed from everything else after escaping.
pub fn escape_query_syntax(text: &str) -> String {
    if is_numeric(text) {
        return text.to_string();
    }
    let escaped = if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        escape_phrase(text.trim_matches('"'))
    } else {
        escape_special_characters(text)
    };
    escaped.replace('-', "")
}

fn escape_special_characters(value: &str) -> String {
    special_chars_regex()
        .replace_all(value, r"\${1}")
        .into_owned()
}

fn escape_phrase(value: &str) -> String {
    format!(
        "\"{}\"",
        phrase_chars_regex().replace_all(value, r"\${1}")
    )
}

/// Loose numeric check: optional sign, digits, decimal point and exponent.
pub fn is_numeric(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty()
        && trimmed.bytes().any(|b| b.is_ascii_digit())
        && trimmed
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'))
        && trimmed.parse::<f64>().is_ok()
}

/// Identifiers: `[a-zA-Z0-9_-]`.
pub fn sanitize_filter_token(value: &str) -> String {
    token_regex().replace_all(value, "").into_owned()
}

/// Comma separated value lists: `[a-zA-Z0-9_,-]`.
pub fn sanitize_filter_value(value: &str) -> String {
    list_regex().replace_all(value, "").into_owned()
}

/// Numeric lists and ranges: `[0-9,-]`.
pub fn sanitize_numeric_token(value: &str) -> String {
    numeric_regex().replace_all(value, "").into_owned()
}

/// Counts and ids: digits only.
pub fn sanitize_digits_only(value: &str) -> String {
    digits_regex().replace_all(value, "").into_owned()
}

/// `code=value` attribute filter entries: `[a-zA-Z0-9_=,.:-]`.
pub fn sanitize_attribute_filter(value: &str) -> String {
    attribute_filter_regex().replace_all(value, "").into_owned()
}

/// Maps booleans to the engine's 1/0 flags. Every other input has no flag value.
pub fn clamp_to_boolean_flag(value: &serde_json::Value) -> Option<u8> {
    match value {
        serde_json::Value::Bool(true) => Some(1),
        serde_json::Value::Bool(false) => Some(0),
        _ => None,
    }
}

/// Keeps only ids that fit below [`MAX_INT`].
pub fn sanitize_id_list(ids: &[i64]) -> Vec<i64> {
    ids.iter().copied().filter(|id| *id < MAX_INT).collect()
}

/// Per attribute code choice of whitelist for plain equality values.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Sanitizer {
    #[default]
    Token,
    List,
    Numeric,
    Digits,
    Raw,
}

impl Sanitizer {
    pub fn apply(&self, value: &str) -> String {
        match self {
            Sanitizer::Token => sanitize_filter_token(value),
            Sanitizer::List => sanitize_filter_value(value),
            Sanitizer::Numeric => sanitize_numeric_token(value),
            Sanitizer::Digits => sanitize_digits_only(value),
            Sanitizer::Raw => value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests;
