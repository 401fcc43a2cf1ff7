//! Domain models for the panel pipeline.
//!
//! - [`Dimension`] - the five classification dimensions of a row key
//! - [`DimensionKey`] - one parsed row key
//! - [`CellValue`] - a coerced cell, either a number or missing
//! - [`LongRecord`] / [`Observation`] - long-format rows before and after coercion
//! - [`AggregateRecord`] - per (period, category) statistics
//! - [`PivotMatrix`] - period x category view of one statistic

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::PipelineError;

// =============================================================================
// Dimensions
// =============================================================================

/// One classification dimension of the compound row key, in key order.
///
/// Deserializes through [`FromStr`], so dataset column names (`isced11`,
/// `geo`) are accepted wherever a dimension is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "String")]
pub enum Dimension {
    /// `freq` - sampling frequency (A = annual).
    Frequency,
    /// `nace_r2` - economic sector aggregate.
    Sector,
    /// `unit` - unit of measure.
    Unit,
    /// `isced11` - education level.
    EducationLevel,
    /// `geo` - country or aggregate region.
    Geography,
}

impl Dimension {
    /// All dimensions in compound key order.
    pub const ALL: [Dimension; 5] = [
        Dimension::Frequency,
        Dimension::Sector,
        Dimension::Unit,
        Dimension::EducationLevel,
        Dimension::Geography,
    ];

    /// Column name used by the dataset.
    pub fn column_name(&self) -> &'static str {
        match self {
            Dimension::Frequency => "freq",
            Dimension::Sector => "nace_r2",
            Dimension::Unit => "unit",
            Dimension::EducationLevel => "isced11",
            Dimension::Geography => "geo",
        }
    }

    fn index(&self) -> usize {
        match self {
            Dimension::Frequency => 0,
            Dimension::Sector => 1,
            Dimension::Unit => 2,
            Dimension::EducationLevel => 3,
            Dimension::Geography => 4,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl TryFrom<String> for Dimension {
    type Error = PipelineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for Dimension {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "freq" | "frequency" => Ok(Dimension::Frequency),
            "nace_r2" | "sector" => Ok(Dimension::Sector),
            "unit" => Ok(Dimension::Unit),
            "isced11" | "education" | "educationlevel" => Ok(Dimension::EducationLevel),
            "geo" | "geography" | "country" => Ok(Dimension::Geography),
            _ => Err(PipelineError::UnknownDimension(s.to_string())),
        }
    }
}

/// The 5-tuple of dimension values parsed from one row key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionKey {
    pub frequency: String,
    pub sector: String,
    pub unit: String,
    pub education_level: String,
    pub geography: String,
}

impl DimensionKey {
    /// Build a key from exactly five fields, in compound key order.
    pub fn from_fields(fields: [String; 5]) -> Self {
        let [frequency, sector, unit, education_level, geography] = fields;
        Self {
            frequency,
            sector,
            unit,
            education_level,
            geography,
        }
    }

    /// Value of one dimension.
    pub fn get(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::Frequency => &self.frequency,
            Dimension::Sector => &self.sector,
            Dimension::Unit => &self.unit,
            Dimension::EducationLevel => &self.education_level,
            Dimension::Geography => &self.geography,
        }
    }

    /// Fields in compound key order.
    pub fn fields(&self) -> [&str; 5] {
        let mut out = [""; 5];
        for dim in Dimension::ALL {
            out[dim.index()] = self.get(dim);
        }
        out
    }
}

// =============================================================================
// Tables
// =============================================================================

/// A wide table straight from the input: one compound key per row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTable {
    /// Literal key column header, e.g. `freq,nace_r2,unit,isced11,geo\TIME_PERIOD`.
    pub key_header: String,
    /// Period labels in file order.
    pub periods: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// One data row of a [`RawTable`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRow {
    /// 1-based line number in the source.
    pub line: usize,
    pub key: String,
    /// One raw cell per period, aligned with [`RawTable::periods`].
    pub values: Vec<String>,
}

/// A wide table whose key column has been split into dimension columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedTable {
    /// Dimension names taken from the key header.
    pub dimension_names: Vec<String>,
    /// Name of the period axis (the part after the `\` marker).
    pub period_axis: String,
    pub periods: Vec<String>,
    pub rows: Vec<NormalizedRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRow {
    pub key: DimensionKey,
    pub values: Vec<String>,
}

// =============================================================================
// Observations
// =============================================================================

/// A coerced cell value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CellValue {
    Number(f64),
    #[default]
    Missing,
}

impl CellValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }
}

impl From<Option<f64>> for CellValue {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(n) if n.is_finite() => CellValue::Number(n),
            _ => CellValue::Missing,
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_f64().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<f64>::deserialize(deserializer).map(CellValue::from)
    }
}

/// Long-format row with the cell still in raw text form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LongRecord {
    pub key: DimensionKey,
    pub period: String,
    pub raw: String,
}

/// Long-format row with a typed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub key: DimensionKey,
    pub period: String,
    pub value: CellValue,
}

// =============================================================================
// Aggregates
// =============================================================================

/// Statistics for one (period, category) group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateRecord {
    pub period: String,
    pub category: String,
    /// Number of non-missing values, always at least 1.
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation, `None` when `count < 2`.
    pub std_dev: Option<f64>,
}

/// Statistic selected for a pivot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Statistic {
    Mean,
    StdDev,
}

impl Statistic {
    /// Pick this statistic out of an aggregate.
    pub fn of(&self, record: &AggregateRecord) -> Option<f64> {
        match self {
            Statistic::Mean => Some(record.mean),
            Statistic::StdDev => record.std_dev,
        }
    }
}

/// Period x category matrix of one statistic.
///
/// Cells without an aggregate are `None`; nothing is filled in.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotMatrix {
    pub statistic: Statistic,
    /// Row labels, ascending.
    pub periods: Vec<String>,
    /// Column labels, ascending.
    pub categories: Vec<String>,
    /// `cells[row][column]`.
    pub cells: Vec<Vec<Option<f64>>>,
}

impl PivotMatrix {
    pub fn get(&self, period: &str, category: &str) -> Option<f64> {
        let row = self.periods.iter().position(|p| p == period)?;
        let col = self.categories.iter().position(|c| c == category)?;
        self.cells[row][col]
    }

    /// One column as a time series of (period, value) pairs, skipping empty cells.
    pub fn series(&self, category: &str) -> Vec<(&str, f64)> {
        let Some(col) = self.categories.iter().position(|c| c == category) else {
            return Vec::new();
        };
        self.periods
            .iter()
            .zip(&self.cells)
            .filter_map(|(period, row)| row[col].map(|v| (period.as_str(), v)))
            .collect()
    }
}

/// Distinct values seen for one dimension.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionDomain {
    pub dimension: Dimension,
    pub values: BTreeSet<String>,
}

impl DimensionDomain {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> DimensionKey {
        DimensionKey::from_fields([
            "A".into(),
            "HTC".into(),
            "PC_EMP".into(),
            "ED5-8".into(),
            "DE".into(),
        ])
    }

    #[test]
    fn test_key_field_access() {
        let k = key();
        assert_eq!(k.get(Dimension::Sector), "HTC");
        assert_eq!(k.get(Dimension::Geography), "DE");
        assert_eq!(k.fields(), ["A", "HTC", "PC_EMP", "ED5-8", "DE"]);
    }

    #[test]
    fn test_dimension_from_str() {
        assert_eq!("isced11".parse::<Dimension>().unwrap(), Dimension::EducationLevel);
        assert_eq!("GEO".parse::<Dimension>().unwrap(), Dimension::Geography);
        assert!("colour".parse::<Dimension>().is_err());
    }

    #[test]
    fn test_dimension_deserializes_column_names() {
        let dim: Dimension = serde_json::from_str(r#""isced11""#).unwrap();
        assert_eq!(dim, Dimension::EducationLevel);
        let dim: Dimension = serde_json::from_str(r#""geo""#).unwrap();
        assert_eq!(dim, Dimension::Geography);
        assert!(serde_json::from_str::<Dimension>(r#""colour""#).is_err());

        for dim in Dimension::ALL {
            let json = serde_json::to_string(&dim).unwrap();
            assert_eq!(serde_json::from_str::<Dimension>(&json).unwrap(), dim);
        }
    }

    #[test]
    fn test_cell_value_serializes_missing_as_null() {
        let obs = Observation {
            key: key(),
            period: "2020".into(),
            value: CellValue::Missing,
        };
        let json = serde_json::to_value(&obs).unwrap();
        assert!(json["value"].is_null());
        assert_eq!(json["key"]["educationLevel"], "ED5-8");

        let number = serde_json::to_value(CellValue::Number(4.5)).unwrap();
        assert_eq!(number, serde_json::json!(4.5));
    }

    #[test]
    fn test_non_finite_becomes_missing() {
        assert_eq!(CellValue::from(Some(f64::NAN)), CellValue::Missing);
        assert_eq!(CellValue::from(Some(1.0)), CellValue::Number(1.0));
    }

    #[test]
    fn test_pivot_series_skips_empty_cells() {
        let m = PivotMatrix {
            statistic: Statistic::Mean,
            periods: vec!["2019".into(), "2020".into()],
            categories: vec!["ED0-2".into()],
            cells: vec![vec![None], vec![Some(3.0)]],
        };
        assert_eq!(m.series("ED0-2"), vec![("2020", 3.0)]);
        assert_eq!(m.get("2019", "ED0-2"), None);
        assert!(m.series("ED3_4").is_empty());
    }
}
