//! # sdgmart - SDG progress star schema builder
//!
//! sdgmart turns raw UN SDG and World Bank extracts into an analytical star
//! schema tracking national progress on the 17 global development goals.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌──────────────┐     ┌─────────────┐
//! │  Raw CSVs   │────▶│   Staging   │────▶│  Transform   │────▶│  Mart CSVs  │
//! │  (4 tables) │     │  (cleanup)  │     │ (star build) │     │  (5 tables) │
//! └─────────────┘     └─────────────┘     └──────────────┘     └─────────────┘
//! ```
//!
//! Each run is a full refresh: all five mart tables are recomputed from the
//! raw tables and written as whole-table replacements. Deterministic
//! surrogate keys make re-runs reproduce identical output.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sdgmart::{run_pipeline, PipelineOptions};
//!
//! #[tokio::main]
//! async fn main() {
//!     let run = run_pipeline(PipelineOptions::default()).await.unwrap();
//!     println!("Wrote {} progress facts", run.marts.fact_sdg_progress.len());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Typed mart records (CountryRecord, ProgressFact, ...)
//! - [`source`] - Raw table loading with auto-detection
//! - [`staging`] - Row-level cleanup of untyped raw rows
//! - [`transform`] - Country normalization, aggregation, pivot, facts
//! - [`mart`] - Mart table writers and the combined export
//! - [`quality`] - Post-run data quality report
//! - [`validation`] - JSON Schema validation of mart rows
//! - [`api`] - HTTP API server and log streaming

// Core modules
pub mod error;
pub mod models;

// Input
pub mod source;
pub mod staging;

// Transformation
pub mod transform;

// Output
pub mod mart;
pub mod quality;
pub mod validation;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    PipelineError,
    ServerError,
    SourceError,
    TransformError,
    ValidationError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    CountryRecord,
    DevelopmentEra,
    EconomicYearRecord,
    GoalCategory,
    GoalRecord,
    GoalYearMetric,
    ProgressFact,
    TimeRecord,
    UNKNOWN,
};

// =============================================================================
// Re-exports - Source loading
// =============================================================================

pub use source::{
    load_raw_tables,
    load_table,
    parse_table_bytes,
    RawTable,
    RawTables,
    RAW_TABLE_NAMES,
};

// =============================================================================
// Re-exports - Transformation
// =============================================================================

pub use transform::{
    aggregate_goal_year_metrics,
    assemble_progress_facts,
    build_time_dimension,
    normalize_countries,
    pivot_economic_indicators,
    run_pipeline,
    NormalizedCountries,
    PipelineOptions,
    PipelineRun,
};

// =============================================================================
// Re-exports - Marts
// =============================================================================

pub use mart::{
    combine_for_analysis,
    read_marts,
    write_combined_export,
    write_marts,
    Marts,
    MART_TABLE_NAMES,
};

// =============================================================================
// Re-exports - Quality & Validation
// =============================================================================

pub use quality::{build_quality_report, log_report, QualityReport};
pub use validation::{is_valid, validate, validate_marts};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
