//! Wide to long reshaping.
//!
//! Each (row, period) pair becomes one [`LongRecord`]. Nothing is parsed,
//! dropped or reordered beyond the reshape itself: records come out row by
//! row, and within a row in file period order.

use crate::models::{LongRecord, NormalizedTable};

/// Melt a normalised table into long-format records.
///
/// The output has exactly `rows x periods` records. Period order carries no
/// meaning; sort with [`sort_periods`] when temporal order matters.
pub fn to_long_form(table: &NormalizedTable) -> Vec<LongRecord> {
    let mut records = Vec::with_capacity(table.rows.len() * table.periods.len());

    for row in &table.rows {
        for (idx, period) in table.periods.iter().enumerate() {
            records.push(LongRecord {
                key: row.key.clone(),
                period: period.clone(),
                raw: row.values.get(idx).cloned().unwrap_or_default(),
            });
        }
    }

    records
}

/// Sort period labels chronologically.
///
/// Labels are fixed-width tokens (`2019`, `2019Q1`, `2019-03`), so
/// lexical order is chronological order.
pub fn sort_periods<I, S>(periods: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut sorted: Vec<String> = periods.into_iter().map(Into::into).collect();
    sorted.sort();
    sorted.dedup();
    sorted
}
