//! Numeric coercion of raw cell text.
//!
//! # Cell grammar
//!
//! ```text
//! cell   := ws* body ws*
//! body   := ""                      -> missing
//!         | ":" [ws+ flags]         -> missing
//!         | number [ws+ flags]      -> number
//! flags  := flag+                   (letters from ANNOTATION_FLAGS)
//! ```
//!
//! Anything else (unknown flag letters, text that is not a number) is
//! coerced to [`CellValue::Missing`]. A malformed cell never aborts a run.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{CellValue, LongRecord, Observation};

/// Placeholder for a value that is not available.
pub const MISSING_TOKEN: &str = ":";

/// Observation flags that may follow a value, separated by whitespace.
pub const ANNOTATION_FLAGS: &[(char, &str)] = &[
    ('b', "break in time series"),
    ('c', "confidential"),
    ('d', "definition differs"),
    ('e', "estimated"),
    ('f', "forecast"),
    ('n', "not significant"),
    ('p', "provisional"),
    ('r', "revised"),
    ('s', "Eurostat estimate"),
    ('u', "low reliability"),
    ('z', "not applicable"),
];

static CELL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<value>\S+)(?:\s+(?P<flags>[a-z]+))?$").expect("cell pattern is valid")
});

/// A raw cell split into its value text and annotation flags.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedCell<'a> {
    pub value: &'a str,
    pub flags: Vec<char>,
}

/// Is `c` a recognised annotation flag?
pub fn is_annotation_flag(c: char) -> bool {
    ANNOTATION_FLAGS.iter().any(|(flag, _)| *flag == c)
}

/// Human-readable meaning of an annotation flag.
pub fn describe_flag(c: char) -> Option<&'static str> {
    ANNOTATION_FLAGS
        .iter()
        .find(|(flag, _)| *flag == c)
        .map(|(_, meaning)| *meaning)
}

/// Split a raw cell into value text and recognised flags.
///
/// Returns `None` when the cell does not match the grammar, including a
/// suffix with letters outside [`ANNOTATION_FLAGS`]. The value text is
/// returned untouched.
pub fn strip_annotation(raw: &str) -> Option<AnnotatedCell<'_>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(AnnotatedCell {
            value: trimmed,
            flags: Vec::new(),
        });
    }

    let caps = CELL_PATTERN.captures(trimmed)?;
    let value = caps.name("value")?.as_str();
    let flags: Vec<char> = caps
        .name("flags")
        .map(|m| m.as_str().chars().collect())
        .unwrap_or_default();

    if !flags.iter().all(|c| is_annotation_flag(*c)) {
        return None;
    }

    Some(AnnotatedCell { value, flags })
}

/// Anything that can be turned into a [`CellValue`].
///
/// Coercion is idempotent: an already coerced value maps to itself.
pub trait Coerce {
    fn coerce(&self) -> CellValue;
}

impl Coerce for str {
    fn coerce(&self) -> CellValue {
        let Some(cell) = strip_annotation(self) else {
            return CellValue::Missing;
        };
        if cell.value.is_empty() || cell.value == MISSING_TOKEN {
            return CellValue::Missing;
        }
        CellValue::from(cell.value.parse::<f64>().ok())
    }
}

impl Coerce for String {
    fn coerce(&self) -> CellValue {
        self.as_str().coerce()
    }
}

impl Coerce for f64 {
    fn coerce(&self) -> CellValue {
        CellValue::from(Some(*self))
    }
}

impl Coerce for CellValue {
    fn coerce(&self) -> CellValue {
        *self
    }
}

/// Coerce long-format records into typed observations.
///
/// Same cardinality and order as the input; missing values stay as records.
pub fn coerce(records: Vec<LongRecord>) -> Vec<Observation> {
    records
        .into_iter()
        .map(|r| Observation {
            value: r.raw.coerce(),
            key: r.key,
            period: r.period,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DimensionKey;

    #[test]
    fn test_plain_numbers() {
        assert_eq!("45.3".coerce(), CellValue::Number(45.3));
        assert_eq!(" 7 ".coerce(), CellValue::Number(7.0));
        assert_eq!("-0.5".coerce(), CellValue::Number(-0.5));
    }

    #[test]
    fn test_annotation_suffix_stripped() {
        assert_eq!("45.3 b".coerce(), CellValue::Number(45.3));
        assert_eq!("12.0 p".coerce(), CellValue::Number(12.0));
        assert_eq!("3.7 bu".coerce(), CellValue::Number(3.7));
        assert_eq!("3.7\tu".coerce(), CellValue::Number(3.7));
    }

    #[test]
    fn test_missing_tokens() {
        assert_eq!(":".coerce(), CellValue::Missing);
        assert_eq!(": c".coerce(), CellValue::Missing);
        assert_eq!("".coerce(), CellValue::Missing);
        assert_eq!("   ".coerce(), CellValue::Missing);
    }

    #[test]
    fn test_malformed_is_missing_not_error() {
        assert_eq!("abc".coerce(), CellValue::Missing);
        assert_eq!("45.3 x".coerce(), CellValue::Missing);
        assert_eq!("1,5".coerce(), CellValue::Missing);
        assert_eq!("NaN".coerce(), CellValue::Missing);
        assert_eq!("inf".coerce(), CellValue::Missing);
        assert_eq!("4 5".coerce(), CellValue::Missing);
    }

    #[test]
    fn test_idempotence() {
        let first = "45.3 b".coerce();
        assert_eq!(first.coerce(), first);
        assert_eq!("45.3 b".coerce(), first);

        let x: f64 = 0.1 + 0.2;
        match x.coerce() {
            CellValue::Number(n) => assert_eq!(n.to_bits(), x.to_bits()),
            CellValue::Missing => panic!("finite value coerced to missing"),
        }
        assert_eq!(CellValue::Missing.coerce(), CellValue::Missing);
    }

    #[test]
    fn test_strip_keeps_value_text() {
        let cell = strip_annotation("45.30 bp").unwrap();
        assert_eq!(cell.value, "45.30");
        assert_eq!(cell.flags, vec!['b', 'p']);
        assert!(strip_annotation("45.3 xq").is_none());
    }

    #[test]
    fn test_describe_flag() {
        assert_eq!(describe_flag('p'), Some("provisional"));
        assert_eq!(describe_flag('q'), None);
    }

    #[test]
    fn test_coerce_records_keeps_cardinality() {
        let key = DimensionKey::from_fields([
            "A".into(),
            "HTC".into(),
            "PC_EMP".into(),
            "ED5-8".into(),
            "DE".into(),
        ]);
        let records = vec![
            LongRecord { key: key.clone(), period: "2019".into(), raw: "1.5 b".into() },
            LongRecord { key: key.clone(), period: "2020".into(), raw: ":".into() },
            LongRecord { key, period: "2021".into(), raw: "oops".into() },
        ];

        let obs = coerce(records);
        assert_eq!(obs.len(), 3);
        assert_eq!(obs[0].value, CellValue::Number(1.5));
        assert_eq!(obs[1].value, CellValue::Missing);
        assert_eq!(obs[2].value, CellValue::Missing);
        assert_eq!(obs[2].period, "2021");

        let again: Vec<CellValue> = obs.iter().map(|o| o.value.coerce()).collect();
        assert_eq!(again, vec![CellValue::Number(1.5), CellValue::Missing, CellValue::Missing]);
    }
}
