//! Raw string-keyed header and the coercion helpers used by typed views.
//!
//! Keys are kept exactly as they appear in the source (case and inner
//! whitespace significant). Values are stored as trimmed strings; numeric
//! interpretation happens later and is lenient: a leading number is taken
//! and any trailing text is ignored.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ordered key → value map recovered from a file header.
///
/// Re-inserting a key overwrites the previous value (binary dumps emit
/// `type` twice).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawHeader {
    entries: BTreeMap<String, String>,
}

impl RawHeader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pair, trimming both sides. Returns the value it replaced.
    pub fn insert(&mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Option<String> {
        self.entries
            .insert(key.as_ref().trim().to_string(), value.as_ref().trim().to_string())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// String value, empty when the key is absent.
    pub fn text(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_string()
    }

    /// Float value, 0 when absent or unparseable.
    pub fn float(&self, key: &str) -> f64 {
        match self.get(key) {
            Some(v) => parse_float_or_zero(v),
            None => 0.0,
        }
    }

    /// Integer value, 0 when absent or unparseable.
    pub fn int(&self, key: &str) -> i64 {
        match self.get(key) {
            Some(v) => parse_int_or_zero(v),
            None => 0,
        }
    }

    /// Value with its two-letter instrument mnemonic removed (see [`strip_mnemonic`]).
    pub fn mnemonic_text(&self, key: &str) -> String {
        strip_mnemonic(self.get(key).unwrap_or_default()).to_string()
    }

    /// Float value after removing the two-letter mnemonic.
    pub fn mnemonic_float(&self, key: &str) -> f64 {
        match self.get(key) {
            Some(v) => parse_float_or_zero(strip_mnemonic(v)),
            None => 0.0,
        }
    }

    /// Integer value after removing the two-letter mnemonic.
    pub fn mnemonic_int(&self, key: &str) -> i64 {
        match self.get(key) {
            Some(v) => parse_int_or_zero(strip_mnemonic(v)),
            None => 0,
        }
    }
}

impl FromIterator<(String, String)> for RawHeader {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut header = RawHeader::new();
        for (k, v) in iter {
            header.insert(k, v);
        }
        header
    }
}

// ─── Coercion helpers ───────────────────────────────────────────────────────

/// Replace `~` by spaces and trim surrounding whitespace.
pub fn clean_field(s: &str) -> String {
    s.replace('~', " ").trim().to_string()
}

/// Drop a leading two-letter alphabetic mnemonic (`am5.0` → `5.0`,
/// `UFGHz` → `GHz`). Values without one are returned unchanged.
pub fn strip_mnemonic(s: &str) -> &str {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1].is_ascii_alphabetic() {
        &s[2..]
    } else {
        s
    }
}

/// Parse the longest numeric prefix of `s` (after leading whitespace).
///
/// Accepts an optional sign, digits, a fractional part and an exponent.
/// Returns `None` when no digit is present.
pub fn parse_leading_float(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let b = s.as_bytes();
    let mut end = 0;

    if end < b.len() && (b[end] == b'+' || b[end] == b'-') {
        end += 1;
    }
    let int_start = end;
    while end < b.len() && b[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < b.len() && b[end] == b'.' {
        end += 1;
        let frac_start = end;
        while end < b.len() && b[end].is_ascii_digit() {
            end += 1;
        }
        digits += end - frac_start;
    }
    if digits == 0 {
        return None;
    }
    // exponent only counts if at least one digit follows it
    if end < b.len() && (b[end] == b'e' || b[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < b.len() && (b[exp_end] == b'+' || b[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < b.len() && b[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    s[..end].parse::<f64>().ok()
}

fn parse_float_or_zero(v: &str) -> f64 {
    match parse_leading_float(v) {
        Some(x) => x,
        None => {
            if !v.trim().is_empty() {
                log::warn!("failed to convert \"{}\" to a number, using 0", v);
            }
            0.0
        }
    }
}

fn parse_int_or_zero(v: &str) -> i64 {
    parse_float_or_zero(v).trunc() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_trims_and_overwrites() {
        let mut h = RawHeader::new();
        h.insert("  type ", " cAcqu ");
        assert_eq!(h.get("type"), Some("cAcqu"));
        let old = h.insert("type", "tyFA");
        assert_eq!(old.as_deref(), Some("cAcqu"));
        assert_eq!(h.get("type"), Some("tyFA"));
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn test_leading_float() {
        assert_eq!(parse_leading_float("336.5"), Some(336.5));
        assert_eq!(parse_leading_float(" -1.5e2 mT"), Some(-150.0));
        assert_eq!(parse_leading_float("12e"), Some(12.0));
        assert_eq!(parse_leading_float(".5"), Some(0.5));
        assert_eq!(parse_leading_float("abc"), None);
        assert_eq!(parse_leading_float(""), None);
        assert_eq!(parse_leading_float("-"), None);
    }

    #[test]
    fn test_numeric_defaults() {
        let mut h = RawHeader::new();
        h.insert("data length", "1024");
        h.insert("broken", "n/a");
        assert_eq!(h.int("data length"), 1024);
        assert_eq!(h.float("broken"), 0.0);
        assert_eq!(h.float("absent"), 0.0);
        assert_eq!(h.text("absent"), "");
    }

    #[test]
    fn test_mnemonic_values() {
        let mut h = RawHeader::new();
        h.insert("amplitude(fine)", "am5.0");
        h.insert("micro freq. unit", "UFGHz");
        h.insert("time constant", "0.03");
        assert_eq!(h.mnemonic_float("amplitude(fine)"), 5.0);
        assert_eq!(h.mnemonic_text("micro freq. unit"), "GHz");
        assert_eq!(h.mnemonic_float("time constant"), 0.03);
    }

    #[test]
    fn test_clean_field() {
        assert_eq!(clean_field("~~2015/03/04~12:30~ "), "2015/03/04 12:30");
    }
}
