//! # HTEC - employment panel reshaping and aggregation
//!
//! Turns a wide, multi-dimensionally coded statistical table (one row per
//! combination of classification codes, one column per period) into typed
//! long-format observations, then into grouped statistics and pivoted views.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌─────────┐   ┌────────┐   ┌────────┐   ┌───────────┐   ┌───────┐
//! │ TSV file │──▶│ Normalize │──▶│ Reshape │──▶│ Coerce │──▶│ Filter │──▶│ Aggregate │──▶│ Pivot │
//! └──────────┘   └───────────┘   └─────────┘   └────────┘   └────────┘   └───────────┘   └───────┘
//! ```
//!
//! The [`resolve`] module is independent of the pipeline: it maps geo codes
//! to display names and flag assets for the presentation layer.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use htec::{analyze_file, AnalysisOptions, Statistic};
//!
//! let output = analyze_file("estat_htec_emp_nisced2.tsv".as_ref(), &AnalysisOptions::default())?;
//! for (period, mean) in output.report.mean.series("ED5-8") {
//!     println!("{period}: {mean:.2}");
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types
//! - [`models`] - Typed tables, observations and aggregates
//! - [`parser`] - TSV reading with auto-detection
//! - [`transform`] - Normalize, reshape, coerce, filter, aggregate, pipeline
//! - [`resolve`] - Geo code display names and flag assets
//! - [`api`] - HTTP API server and log stream

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Presentation helpers
pub mod resolve;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{PipelineError, SchemaError, ServerError, TsvError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    AggregateRecord, CellValue, Dimension, DimensionDomain, DimensionKey, LongRecord, NormalizedTable,
    Observation, PivotMatrix, RawTable, Statistic,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{detect_delimiter, detect_encoding, parse_bytes_auto, parse_file_auto, parse_table, ParseResult};

// =============================================================================
// Re-exports - Pipeline stages
// =============================================================================

pub use transform::{
    aggregate, coerce, distribution, domain, domains, filter, normalize, pivot, sort_periods, to_long_form, Coerce,
    DistributionSummary, ExclusionPolicy, Keyed, Selection,
};

pub use transform::pipeline::{
    analyze, analyze_bytes, analyze_file, load_and_normalize, AnalysisOptions, AnalysisReport, DatasetSummary,
    PipelineOutput, TableInfo,
};

// =============================================================================
// Re-exports - Code resolution
// =============================================================================

pub use resolve::{resolve, resolve_display_name, resolve_flag_asset_key, CodeDisplay};

// Server
pub mod server {
    pub use crate::api::server::{parse_list, router, start_server};
}
