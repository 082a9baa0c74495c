//! Error types for the sdgmart transformation pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`SourceError`] - Raw table loading errors
//! - [`TransformError`] - Dimensional transformation errors
//! - [`ValidationError`] - Mart schema validation errors
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! Note that malformed raw rows are NOT errors: staging silently excludes
//! them and reports counts through the log channel. Only structural problems
//! (unreadable sources, duplicate surrogate keys, schema violations in the
//! assembled marts) abort a run.

use thiserror::Error;

// =============================================================================
// Source Loading Errors
// =============================================================================

/// Errors while reading raw source tables.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to decode file contents.
    #[error("Failed to decode contents: {0}")]
    EncodingError(String),

    /// Invalid CSV format.
    #[error("Invalid CSV format in {table}: {message}")]
    ParseError { table: String, message: String },

    /// A required raw table file is missing.
    #[error("Missing raw table: {0}")]
    MissingTable(String),

    /// Empty file.
    #[error("Raw table {0} is empty")]
    EmptyTable(String),

    /// No headers found.
    #[error("No headers found in raw table {0}")]
    NoHeaders(String),
}

// =============================================================================
// Transformation Errors
// =============================================================================

/// Errors during dimensional transformation.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Duplicate surrogate key after fact assembly. Signals a grouping bug,
    /// not a data-quality issue, so it is fatal.
    #[error("Duplicate progress_id after assembly: {0}")]
    DuplicateProgressId(String),

    /// No usable observations survived staging.
    #[error("No cleaned observations to aggregate")]
    EmptyInput,

    /// A parallel branch task failed to complete.
    #[error("Transformation task failed: {0}")]
    TaskFailed(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors during mart schema validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Schema validation failed for one or more rows.
    #[error("Validation of {table} failed: {errors:?}")]
    SchemaError { table: String, errors: Vec<String> },

    /// An embedded schema could not be compiled.
    #[error("Invalid embedded schema for {table}: {message}")]
    BadSchema { table: String, message: String },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by [`crate::transform::pipeline::run_pipeline`].
/// It wraps all lower-level errors and adds pipeline-specific variants.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Source loading error.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Transformation error.
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Failed to write a mart table.
    #[error("Mart write error for {table}: {message}")]
    MartWrite { table: String, message: String },
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

/// Result type for source loading operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type for transformation operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // SourceError -> PipelineError
        let source_err = SourceError::MissingTable("wb_countries".into());
        let pipeline_err: PipelineError = source_err.into();
        assert!(pipeline_err.to_string().contains("wb_countries"));

        // TransformError -> PipelineError
        let transform_err = TransformError::DuplicateProgressId("BRA_3_2020".into());
        let pipeline_err: PipelineError = transform_err.into();
        assert!(pipeline_err.to_string().contains("BRA_3_2020"));
    }

    #[test]
    fn test_validation_error_format() {
        let err = ValidationError::SchemaError {
            table: "fact_sdg_progress".into(),
            errors: vec!["year is required".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("fact_sdg_progress"));
        assert!(msg.contains("year is required"));
    }
}
