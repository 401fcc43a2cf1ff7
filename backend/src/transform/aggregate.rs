//! Grouped statistics over observations.
//!
//! ```text
//! Observations (filtered)            AggregateRecord per (period, category)
//! ┌──────────────────────────┐       ┌────────────────────────────────────┐
//! │ 2020, ED5-8, DE, 10      │       │ 2020, ED5-8: count 2, mean 11,     │
//! │ 2020, ED5-8, FR, 12      │  →    │              std 1.414             │
//! │ 2020, ED0-2, DE, :       │       │ (2020, ED0-2 absent: no values)    │
//! └──────────────────────────┘       └────────────────────────────────────┘
//! ```
//!
//! Groups are kept in a `BTreeMap` and their values sorted before summing,
//! so the output depends only on the input multiset, not its order.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::reshape::sort_periods;
use crate::models::{AggregateRecord, Dimension, Observation, PivotMatrix, Statistic};

/// Collect non-missing values per (period, category), sorted.
fn group_values(records: &[Observation], category: Dimension) -> BTreeMap<(String, String), Vec<f64>> {
    let mut groups: BTreeMap<(String, String), Vec<f64>> = BTreeMap::new();

    for record in records {
        if let Some(v) = record.value.as_f64() {
            groups
                .entry((record.period.clone(), record.key.get(category).to_string()))
                .or_default()
                .push(v);
        }
    }

    for values in groups.values_mut() {
        values.sort_by(f64::total_cmp);
    }

    groups
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (divisor `n - 1`), `None` below two values.
fn sample_std_dev(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Group observations by (period, `category` value) and compute count, mean
/// and sample standard deviation of the non-missing values.
///
/// Groups with no non-missing value are absent. Output is sorted by
/// (period, category).
pub fn aggregate(records: &[Observation], category: Dimension) -> Vec<AggregateRecord> {
    group_values(records, category)
        .into_iter()
        .map(|((period, category), values)| {
            let m = mean(&values);
            AggregateRecord {
                period,
                category,
                count: values.len(),
                mean: m,
                std_dev: sample_std_dev(&values, m),
            }
        })
        .collect()
}

/// Lay out one statistic of the aggregates as a period x category matrix.
///
/// A cell is `Some` only when an aggregate exists for that pair and the
/// statistic is defined for it.
pub fn pivot(aggregates: &[AggregateRecord], statistic: Statistic) -> PivotMatrix {
    let periods = sort_periods(aggregates.iter().map(|a| a.period.as_str()));
    let categories: Vec<String> = aggregates
        .iter()
        .map(|a| a.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut cells = vec![vec![None; categories.len()]; periods.len()];
    for a in aggregates {
        // Both searches succeed: the labels were collected from `aggregates`.
        if let (Ok(row), Ok(col)) = (
            periods.binary_search(&a.period),
            categories.binary_search(&a.category),
        ) {
            cells[row][col] = statistic.of(a);
        }
    }

    PivotMatrix {
        statistic,
        periods,
        categories,
        cells,
    }
}

// =============================================================================
// Distribution summary
// =============================================================================

/// Five-number summary of one category across all periods.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionSummary {
    pub category: String,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Quantile of sorted values, linear interpolation between order statistics.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = (sorted.len() - 1) as f64 * q;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// Per-category distribution of non-missing values, pooled over periods.
///
/// Categories without values are absent. Output is sorted by category.
pub fn distribution(records: &[Observation], category: Dimension) -> Vec<DistributionSummary> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for record in records {
        if let Some(v) = record.value.as_f64() {
            groups
                .entry(record.key.get(category).to_string())
                .or_default()
                .push(v);
        }
    }

    groups
        .into_iter()
        .map(|(category, mut values)| {
            values.sort_by(f64::total_cmp);
            DistributionSummary {
                category,
                count: values.len(),
                min: values[0],
                q1: quantile(&values, 0.25),
                median: quantile(&values, 0.5),
                q3: quantile(&values, 0.75),
                max: values[values.len() - 1],
            }
        })
        .collect()
}
