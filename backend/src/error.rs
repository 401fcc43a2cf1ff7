//! Error types for the panel pipeline.
//!
//! - [`TsvError`] - reading and decoding the raw table
//! - [`SchemaError`] - the compound key does not match the classification scheme
//! - [`PipelineError`] - top-level orchestration errors
//! - [`ServerError`] - HTTP layer errors
//!
//! Malformed cells and empty groups are not errors: they only change the
//! shape of the output (missing values, absent aggregates).

use thiserror::Error;

// =============================================================================
// TSV Reading Errors
// =============================================================================

/// Errors while reading the raw wide-format table.
#[derive(Debug, Error)]
pub enum TsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Row could not be read.
    #[error("Line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Empty file.
    #[error("Table is empty")]
    EmptyFile,

    /// Header has a key column but no period columns.
    #[error("No period columns found in header")]
    NoPeriods,
}

impl TsvError {
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        TsvError::Parse {
            line,
            message: message.into(),
        }
    }
}

// =============================================================================
// Schema Errors
// =============================================================================

/// The table does not follow the 5-dimension classification scheme.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// A row key did not split into exactly 5 fields.
    #[error("dimension-arity-mismatch at line {line}: expected 5 fields, found {found} in key '{key}'")]
    DimensionArity {
        line: usize,
        found: usize,
        key: String,
    },

    /// The key column header does not name 5 dimensions.
    #[error("dimension-arity-mismatch in header: expected 5 dimension names, found {found} in '{header}'")]
    HeaderArity { found: usize, header: String },

    /// The key column header has no axis marker.
    #[error("Key column header '{0}' has no '\\' axis marker")]
    MissingAxisMarker(String),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline errors.
///
/// Returned by [`crate::transform::pipeline::analyze_bytes`] and friends.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Table reading error.
    #[error("TSV error: {0}")]
    Tsv(#[from] TsvError),

    /// Schema error.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// IO error (options file, output).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Options file is not valid JSON.
    #[error("Invalid options: {0}")]
    Options(#[from] serde_json::Error),

    /// Unknown dimension name.
    #[error("Unknown dimension: {0}")]
    UnknownDimension(String),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for table reading.
pub type TsvResult<T> = Result<T, TsvError>;

/// Result type for schema normalisation.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
