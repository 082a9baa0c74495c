//! Dimensional transformation layer.
//!
//! - Countries: three-tier reference normalization into the country dimension
//! - Progress: per-(country, goal, year) indicator aggregation
//! - Economy: long-to-wide pivot of the World Bank indicators
//! - Time: calendar/era dimension from observed years
//! - Facts: dimension join, surrogate keys, year-over-year deltas
//! - Pipeline: full-refresh orchestration of the above

pub mod countries;
pub mod economy;
pub mod facts;
pub mod pipeline;
pub mod progress;
pub mod time;

pub use countries::{normalize_countries, NormalizedCountries};
pub use economy::pivot_economic_indicators;
pub use facts::assemble_progress_facts;
pub use pipeline::{run_pipeline, PipelineOptions, PipelineRun};
pub use progress::aggregate_goal_year_metrics;
pub use time::build_time_dimension;
