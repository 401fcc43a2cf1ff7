//! High-level pipeline API.
//!
//! Composes every stage as a pure function of the previous one:
//!
//! ```text
//! bytes → parse → normalize → to_long_form → coerce → filter → aggregate → pivot
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use htec::{analyze_file, AnalysisOptions};
//! use std::path::Path;
//!
//! let output = analyze_file(Path::new("estat_htec_emp_nisced2.tsv"), &AnalysisOptions::default())?;
//! println!("{} aggregates", output.report.aggregates.len());
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::aggregate::{aggregate, distribution, pivot, DistributionSummary};
use super::coerce::coerce;
use super::filter::{domains, filter, ExclusionPolicy, Selection};
use super::normalize::normalize;
use super::reshape::to_long_form;
use crate::api::logs::{log_info, log_success, log_warning};
use crate::error::PipelineResult;
use crate::models::{AggregateRecord, Dimension, DimensionDomain, NormalizedTable, PivotMatrix, Statistic};
use crate::parser::{parse_bytes_auto, parse_file_auto, ParseResult};

// =============================================================================
// Options
// =============================================================================

/// What to keep and how to group it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOptions {
    /// Allowed sector (`nace_r2`) codes.
    #[serde(default = "default_sectors")]
    pub sectors: Vec<String>,

    /// Required unit code.
    #[serde(default = "default_unit")]
    pub unit: String,

    /// Dimension whose values form the aggregate categories.
    #[serde(default = "default_category")]
    pub category: Dimension,

    /// Active education levels. `None` allows all, an empty list allows none.
    #[serde(default)]
    pub education: Option<Vec<String>>,

    /// Active geographies. `None` allows all, an empty list allows none.
    #[serde(default)]
    pub geography: Option<Vec<String>>,

    /// Categories hidden from the views.
    #[serde(default = "default_exclusions")]
    pub exclude_categories: Vec<String>,
}

fn default_sectors() -> Vec<String> {
    ["C_HTC", "HTC", "KIS", "KIS_HTC"].map(String::from).to_vec()
}

fn default_unit() -> String {
    "PC_EMP".to_string()
}

fn default_category() -> Dimension {
    Dimension::EducationLevel
}

fn default_exclusions() -> Vec<String> {
    ExclusionPolicy::default().categories.into_iter().collect()
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            sectors: default_sectors(),
            unit: default_unit(),
            category: default_category(),
            education: None,
            geography: None,
            exclude_categories: default_exclusions(),
        }
    }
}

impl AnalysisOptions {
    /// Load options from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Selection built from the education and geography choices.
    pub fn selection(&self) -> Selection {
        let mut selection = Selection::new();
        if let Some(ref levels) = self.education {
            selection = selection.allow(Dimension::EducationLevel, levels.iter().cloned());
        }
        if let Some(ref geos) = self.geography {
            selection = selection.allow(Dimension::Geography, geos.iter().cloned());
        }
        selection
    }

    pub fn exclusion(&self) -> ExclusionPolicy {
        ExclusionPolicy::of(self.exclude_categories.iter().cloned())
    }
}

// =============================================================================
// Results
// =============================================================================

/// Counts describing one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub rows: usize,
    pub periods: usize,
    pub observations: usize,
    pub missing: usize,
    /// Observations left after the sector and unit filter.
    pub in_scope: usize,
    /// Observations left after the education and geography selection.
    pub selected: usize,
    pub education_levels: usize,
    pub geographies: usize,
    /// Selectable values per dimension, after the sector and unit filter.
    pub domains: Vec<DimensionDomain>,
}

/// Everything the presentation layer consumes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub category: Dimension,
    pub summary: DatasetSummary,
    /// Aggregates after the exclusion policy.
    pub aggregates: Vec<AggregateRecord>,
    pub mean: PivotMatrix,
    pub std_dev: PivotMatrix,
    pub distribution: Vec<DistributionSummary>,
}

/// Input file information
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    pub encoding: String,
    pub delimiter: char,
    pub period_axis: String,
    pub dimensions: Vec<String>,
    pub row_count: usize,
}

/// Result of a complete run from bytes or a file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutput {
    pub table_info: TableInfo,
    pub report: AnalysisReport,
}

// =============================================================================
// Entry points
// =============================================================================

/// Parse raw bytes and split the compound key.
///
/// Fails with a schema error when any row key does not have five fields.
pub fn load_and_normalize(bytes: &[u8]) -> PipelineResult<NormalizedTable> {
    let parsed = parse_bytes_auto(bytes)?;
    Ok(normalize(&parsed.table)?)
}

/// Run the analysis on a normalised table.
pub fn analyze(table: &NormalizedTable, options: &AnalysisOptions) -> AnalysisReport {
    let observations = coerce(to_long_form(table));
    let total = observations.len();
    let missing = observations.iter().filter(|o| o.value.is_missing()).count();
    log_success(format!("{} observations ({} missing)", total, missing));

    let in_scope = filter(observations, &options.sectors, &options.unit, &Selection::new());
    log_info(format!(
        "🔎 Sectors [{}], unit {}: {} observations",
        options.sectors.join(", "),
        options.unit,
        in_scope.len()
    ));
    if in_scope.is_empty() {
        log_warning("No observation matches the sector and unit filter");
    }

    let dims = domains(&in_scope);
    let distinct = |d: Dimension| dims.iter().find(|dd| dd.dimension == d).map_or(0, |dd| dd.len());
    let education_levels = distinct(Dimension::EducationLevel);
    let geographies = distinct(Dimension::Geography);
    let in_scope_count = in_scope.len();

    let selected = options.selection().apply(in_scope);
    log_info(format!("Selection keeps {} observations", selected.len()));

    let category = options.category;
    let exclusion = options.exclusion();

    log_info(format!("📊 Aggregating by (period, {})...", category));
    let all_aggregates = aggregate(&selected, category);
    let aggregates = exclusion.apply_to_aggregates(all_aggregates);
    log_success(format!("{} aggregate groups", aggregates.len()));

    let mean = pivot(&aggregates, Statistic::Mean);
    let std_dev = pivot(&aggregates, Statistic::StdDev);
    let selected_count = selected.len();
    let distribution = distribution(&exclusion.apply_to_records(selected, category), category);

    AnalysisReport {
        category,
        summary: DatasetSummary {
            rows: table.rows.len(),
            periods: table.periods.len(),
            observations: total,
            missing,
            in_scope: in_scope_count,
            selected: selected_count,
            education_levels,
            geographies,
            domains: dims,
        },
        aggregates,
        mean,
        std_dev,
        distribution,
    }
}

/// Run the full pipeline on raw bytes.
pub fn analyze_bytes(bytes: &[u8], options: &AnalysisOptions) -> PipelineResult<PipelineOutput> {
    log_info("📖 Reading table...");
    let parsed = parse_bytes_auto(bytes)?;
    analyze_parsed(parsed, options)
}

/// Run the full pipeline on a file.
pub fn analyze_file(path: &Path, options: &AnalysisOptions) -> PipelineResult<PipelineOutput> {
    log_info(format!("📖 Reading {}...", path.display()));
    let parsed = parse_file_auto(path)?;
    analyze_parsed(parsed, options)
}

fn analyze_parsed(parsed: ParseResult, options: &AnalysisOptions) -> PipelineResult<PipelineOutput> {
    log_success(format!("Detected encoding: {}", parsed.encoding));
    log_success(format!("Detected separator: '{}'", format_delimiter(parsed.delimiter)));
    log_success(format!(
        "Read {} rows x {} periods",
        parsed.table.rows.len(),
        parsed.table.periods.len()
    ));

    log_info("🧩 Splitting compound keys...");
    let table = normalize(&parsed.table)?;
    log_success(format!("Dimensions: {}", table.dimension_names.join(", ")));

    let table_info = TableInfo {
        encoding: parsed.encoding,
        delimiter: parsed.delimiter,
        period_axis: table.period_axis.clone(),
        dimensions: table.dimension_names.clone(),
        row_count: table.rows.len(),
    };

    let report = analyze(&table, options);
    Ok(PipelineOutput { table_info, report })
}

/// Format delimiter for display
pub fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        c => c.to_string(),
    }
}
