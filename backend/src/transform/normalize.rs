//! Split the compound key column into the five dimension fields.
//!
//! ```text
//! freq,nace_r2,unit,isced11,geo\TIME_PERIOD | 2019 | 2020
//! A,HTC,PC_EMP,ED5-8,DE                     | 4.1  | 4.3 b
//!                      ↓
//! freq | nace_r2 | unit   | isced11 | geo | 2019 | 2020
//! A    | HTC     | PC_EMP | ED5-8   | DE  | 4.1  | 4.3 b
//! ```

use crate::error::{SchemaError, SchemaResult};
use crate::models::{DimensionKey, NormalizedRow, NormalizedTable, RawTable};

/// Separator between dimension names (and between key fields).
pub const KEY_DELIMITER: char = ',';

/// Separator between the dimension names and the period axis name.
pub const AXIS_MARKER: char = '\\';

/// Number of fields in every compound key.
pub const KEY_ARITY: usize = 5;

/// Split a key header into its dimension names and period axis name.
pub fn parse_key_header(header: &str) -> SchemaResult<(Vec<String>, String)> {
    let (dims, axis) = header
        .split_once(AXIS_MARKER)
        .ok_or_else(|| SchemaError::MissingAxisMarker(header.to_string()))?;

    let names: Vec<String> = dims
        .split(KEY_DELIMITER)
        .map(|s| s.trim().to_string())
        .collect();

    if names.len() != KEY_ARITY {
        return Err(SchemaError::HeaderArity {
            found: names.len(),
            header: header.to_string(),
        });
    }

    Ok((names, axis.trim().to_string()))
}

/// Split one compound key into a [`DimensionKey`].
///
/// `line` is only used to report where the key came from.
pub fn split_key(key: &str, line: usize) -> SchemaResult<DimensionKey> {
    let parts: Vec<&str> = key.split(KEY_DELIMITER).map(str::trim).collect();

    let fields: [String; KEY_ARITY] = match parts.as_slice() {
        [a, b, c, d, e] => [a, b, c, d, e].map(|s| s.to_string()),
        _ => {
            return Err(SchemaError::DimensionArity {
                line,
                found: parts.len(),
                key: key.to_string(),
            })
        }
    };

    Ok(DimensionKey::from_fields(fields))
}

/// Replace the key column of a raw table with explicit dimension columns.
///
/// Fails on the first row whose key does not have exactly five fields.
/// Period columns keep their original order.
pub fn normalize(table: &RawTable) -> SchemaResult<NormalizedTable> {
    let (dimension_names, period_axis) = parse_key_header(&table.key_header)?;

    let rows = table
        .rows
        .iter()
        .map(|row| {
            Ok(NormalizedRow {
                key: split_key(&row.key, row.line)?,
                values: row.values.clone(),
            })
        })
        .collect::<SchemaResult<Vec<_>>>()?;

    Ok(NormalizedTable {
        dimension_names,
        period_axis,
        periods: table.periods.clone(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Dimension, RawRow};

    fn table(keys: &[&str]) -> RawTable {
        RawTable {
            key_header: "freq,nace_r2,unit,isced11,geo\\TIME_PERIOD".into(),
            periods: vec!["2020".into(), "2019".into()],
            rows: keys
                .iter()
                .enumerate()
                .map(|(i, k)| RawRow {
                    line: i + 2,
                    key: k.to_string(),
                    values: vec!["1".into(), "2".into()],
                })
                .collect(),
        }
    }

    #[test]
    fn test_header_split() {
        let (names, axis) = parse_key_header("freq,nace_r2,unit,isced11,geo\\TIME_PERIOD").unwrap();
        assert_eq!(names, vec!["freq", "nace_r2", "unit", "isced11", "geo"]);
        assert_eq!(axis, "TIME_PERIOD");
    }

    #[test]
    fn test_header_without_marker() {
        let err = parse_key_header("freq,nace_r2,unit,isced11,geo").unwrap_err();
        assert!(matches!(err, SchemaError::MissingAxisMarker(_)));
    }

    #[test]
    fn test_header_wrong_arity() {
        let err = parse_key_header("freq,unit,geo\\TIME_PERIOD").unwrap_err();
        assert_eq!(
            err,
            SchemaError::HeaderArity {
                found: 3,
                header: "freq,unit,geo\\TIME_PERIOD".into()
            }
        );
    }

    #[test]
    fn test_normalize_splits_keys() {
        let normalized = normalize(&table(&["A,HTC,PC_EMP,ED5-8,DE"])).unwrap();
        let key = &normalized.rows[0].key;

        assert_eq!(key.get(Dimension::Frequency), "A");
        assert_eq!(key.get(Dimension::Sector), "HTC");
        assert_eq!(key.get(Dimension::Unit), "PC_EMP");
        assert_eq!(key.get(Dimension::EducationLevel), "ED5-8");
        assert_eq!(key.get(Dimension::Geography), "DE");
        assert_eq!(normalized.period_axis, "TIME_PERIOD");
    }

    #[test]
    fn test_period_order_preserved() {
        let normalized = normalize(&table(&["A,HTC,PC_EMP,ED5-8,DE"])).unwrap();
        assert_eq!(normalized.periods, vec!["2020", "2019"]);
        assert_eq!(normalized.rows[0].values, vec!["1", "2"]);
    }

    #[test]
    fn test_four_fields_rejected() {
        let err = normalize(&table(&["A,HTC,PC_EMP,ED5-8,DE", "A,HTC,PC_EMP,DE"])).unwrap_err();
        assert_eq!(
            err,
            SchemaError::DimensionArity {
                line: 3,
                found: 4,
                key: "A,HTC,PC_EMP,DE".into()
            }
        );
    }

    #[test]
    fn test_six_fields_rejected() {
        let err = split_key("A,HTC,PC_EMP,ED5-8,DE,X", 9).unwrap_err();
        assert!(matches!(err, SchemaError::DimensionArity { found: 6, line: 9, .. }));
    }

    #[test]
    fn test_five_fields_accepted_regardless_of_content() {
        for key in [",,,,", "x,y,z,w,v", " A , B , C , D , E ", "1,2,3,4,ZZ_99"] {
            assert!(split_key(key, 1).is_ok(), "key {key:?} should split");
        }
        assert_eq!(split_key(" A , B , C , D , E ", 1).unwrap().geography, "E");
    }
}
