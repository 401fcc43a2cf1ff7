//! Dimension filters.
//!
//! A [`Selection`] holds an allow-set per constrained dimension. A dimension
//! without an entry allows everything; a dimension with an empty set allows
//! nothing. Combining selections intersects their sets, so applying two
//! selections one after the other gives the same records as applying
//! `a.and(b)` once, in either order.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{AggregateRecord, Dimension, DimensionDomain, DimensionKey, LongRecord, Observation};

/// Records that carry a dimension key.
pub trait Keyed {
    fn key(&self) -> &DimensionKey;
}

impl Keyed for DimensionKey {
    fn key(&self) -> &DimensionKey {
        self
    }
}

impl Keyed for LongRecord {
    fn key(&self) -> &DimensionKey {
        &self.key
    }
}

impl Keyed for Observation {
    fn key(&self) -> &DimensionKey {
        &self.key
    }
}

/// Per-dimension allow-sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    constraints: BTreeMap<Dimension, BTreeSet<String>>,
}

impl Selection {
    /// A selection that allows everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict `dimension` to `values`.
    ///
    /// An empty `values` allows nothing. Restricting a dimension twice keeps
    /// only values present in both sets.
    pub fn allow<I, S>(mut self, dimension: Dimension, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        self.restrict(dimension, set);
        self
    }

    /// Require `dimension` to equal `value`.
    pub fn require(self, dimension: Dimension, value: impl Into<String>) -> Self {
        self.allow(dimension, [value.into()])
    }

    /// Conjunction of two selections.
    pub fn and(mut self, other: Selection) -> Self {
        for (dimension, set) in other.constraints {
            self.restrict(dimension, set);
        }
        self
    }

    fn restrict(&mut self, dimension: Dimension, set: BTreeSet<String>) {
        match self.constraints.get_mut(&dimension) {
            Some(existing) => existing.retain(|v| set.contains(v)),
            None => {
                self.constraints.insert(dimension, set);
            }
        }
    }

    /// Allow-set for a dimension, `None` when unconstrained.
    pub fn allowed(&self, dimension: Dimension) -> Option<&BTreeSet<String>> {
        self.constraints.get(&dimension)
    }

    pub fn is_unconstrained(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn matches(&self, key: &DimensionKey) -> bool {
        self.constraints
            .iter()
            .all(|(dimension, set)| set.contains(key.get(*dimension)))
    }

    /// Keep only records whose key matches.
    pub fn apply<R: Keyed>(&self, records: Vec<R>) -> Vec<R> {
        if self.is_unconstrained() {
            return records;
        }
        records.into_iter().filter(|r| self.matches(r.key())).collect()
    }
}

/// Keep records in one of `sectors`, with unit `unit`, that also satisfy `extra`.
///
/// # Example
/// ```ignore
/// let selection = Selection::new()
///     .allow(Dimension::EducationLevel, ["ED5-8"])
///     .allow(Dimension::Geography, ["DE", "FR"]);
/// let kept = filter(observations, &["HTC", "KIS"], "PC_EMP", &selection);
/// ```
pub fn filter<R, S>(records: Vec<R>, sectors: &[S], unit: &str, extra: &Selection) -> Vec<R>
where
    R: Keyed,
    S: AsRef<str>,
{
    Selection::new()
        .allow(Dimension::Sector, sectors.iter().map(|s| s.as_ref().to_string()))
        .require(Dimension::Unit, unit)
        .and(extra.clone())
        .apply(records)
}

// =============================================================================
// View-level exclusion
// =============================================================================

/// Categories hidden from presentation views.
///
/// Applied to aggregates or observations when preparing a view. The
/// aggregator itself never drops categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionPolicy {
    pub categories: BTreeSet<String>,
}

impl Default for ExclusionPolicy {
    /// Overall total and "no response" education buckets.
    fn default() -> Self {
        Self::of(["TOTAL", "NRP"])
    }
}

impl ExclusionPolicy {
    pub fn none() -> Self {
        Self {
            categories: BTreeSet::new(),
        }
    }

    pub fn of<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }

    pub fn excludes(&self, category: &str) -> bool {
        self.categories.contains(category)
    }

    pub fn apply_to_aggregates(&self, aggregates: Vec<AggregateRecord>) -> Vec<AggregateRecord> {
        aggregates
            .into_iter()
            .filter(|a| !self.excludes(&a.category))
            .collect()
    }

    pub fn apply_to_records<R: Keyed>(&self, records: Vec<R>, category: Dimension) -> Vec<R> {
        records
            .into_iter()
            .filter(|r| !self.excludes(r.key().get(category)))
            .collect()
    }
}

// =============================================================================
// Domains
// =============================================================================

/// Distinct values of one dimension.
pub fn domain<R: Keyed>(records: &[R], dimension: Dimension) -> DimensionDomain {
    DimensionDomain {
        dimension,
        values: records
            .iter()
            .map(|r| r.key().get(dimension).to_string())
            .collect(),
    }
}

/// Distinct values of every dimension, in key order.
pub fn domains<R: Keyed>(records: &[R]) -> Vec<DimensionDomain> {
    Dimension::ALL.iter().map(|d| domain(records, *d)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CellValue;

    fn obs(sector: &str, unit: &str, isced: &str, geo: &str) -> Observation {
        Observation {
            key: DimensionKey::from_fields([
                "A".into(),
                sector.into(),
                unit.into(),
                isced.into(),
                geo.into(),
            ]),
            period: "2020".into(),
            value: CellValue::Number(1.0),
        }
    }

    fn sample() -> Vec<Observation> {
        vec![
            obs("HTC", "PC_EMP", "ED5-8", "DE"),
            obs("HTC", "THS_PER", "ED5-8", "DE"),
            obs("KIS", "PC_EMP", "ED0-2", "FR"),
            obs("TOTAL", "PC_EMP", "ED5-8", "FR"),
            obs("C_HTC", "PC_EMP", "TOTAL", "IT"),
            obs("KIS_HTC", "PC_EMP", "ED3_4", "DE"),
        ]
    }

    #[test]
    fn test_sector_and_unit() {
        let kept = filter(sample(), &["HTC", "KIS", "C_HTC", "KIS_HTC"], "PC_EMP", &Selection::new());
        assert_eq!(kept.len(), 4);
        assert!(kept.iter().all(|o| o.key.unit == "PC_EMP"));
        assert!(kept.iter().all(|o| o.key.sector != "TOTAL"));
    }

    #[test]
    fn test_unconstrained_allows_all() {
        assert_eq!(Selection::new().apply(sample()).len(), 6);
    }

    #[test]
    fn test_empty_allow_set_allows_none() {
        let none: [&str; 0] = [];
        let selection = Selection::new().allow(Dimension::Geography, none);
        assert!(selection.apply(sample()).is_empty());
    }

    #[test]
    fn test_extra_selection() {
        let extra = Selection::new()
            .allow(Dimension::EducationLevel, ["ED5-8", "ED3_4"])
            .allow(Dimension::Geography, ["DE"]);
        let kept = filter(sample(), &["HTC", "KIS_HTC"], "PC_EMP", &extra);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_composition_order_independent() {
        let sector = Selection::new().allow(Dimension::Sector, ["HTC", "KIS"]);
        let geo = Selection::new().allow(Dimension::Geography, ["DE", "FR"]);

        let a = geo.apply(sector.apply(sample()));
        let b = sector.apply(geo.apply(sample()));
        let c = sector.clone().and(geo.clone()).apply(sample());
        let d = geo.and(sector).apply(sample());

        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a, d);
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn test_restricting_twice_intersects() {
        let selection = Selection::new()
            .allow(Dimension::Geography, ["DE", "FR"])
            .allow(Dimension::Geography, ["FR", "IT"]);
        let allowed: Vec<_> = selection.allowed(Dimension::Geography).unwrap().iter().cloned().collect();
        assert_eq!(allowed, vec!["FR"]);
    }

    #[test]
    fn test_exclusion_policy() {
        let policy = ExclusionPolicy::default();
        assert!(policy.excludes("TOTAL"));
        assert!(policy.excludes("NRP"));
        assert!(!policy.excludes("ED5-8"));

        let kept = policy.apply_to_records(sample(), Dimension::EducationLevel);
        assert_eq!(kept.len(), 5);
        assert!(ExclusionPolicy::none().apply_to_records(sample(), Dimension::EducationLevel).len() == 6);
    }

    #[test]
    fn test_domains() {
        let records = sample();
        let geo = domain(&records, Dimension::Geography);
        assert_eq!(geo.len(), 3);
        assert!(geo.values.contains("IT"));

        let all = domains(&records);
        assert_eq!(all.len(), 5);
        assert_eq!(all[0].dimension, Dimension::Frequency);
        assert_eq!(all[0].len(), 1);
    }
}
