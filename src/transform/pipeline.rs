//! Full-refresh pipeline orchestration.
//!
//! One run recomputes the whole mart set from the raw tables:
//!
//! ```text
//! ┌───────────┐    ┌─────────┐    ┌──────────────────────────┐    ┌───────┐
//! │ raw CSVs  │───▶│ staging │───▶│ countries ─┬─ aggregate   │───▶│ marts │
//! │ (4 files) │    │ (clean) │    │            ├─ pivot       │    │ (5)   │
//! └───────────┘    └─────────┘    │            └─ time        │    └───────┘
//!                                 │      join barrier → facts │
//!                                 └──────────────────────────┘
//! ```
//!
//! The three fact-independent branches run concurrently; fact assembly
//! blocks until all of them complete. Nothing is written until every table
//! is assembled and validated, so a failed run leaves the destination
//! untouched and a re-run starts from scratch.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::logs::{log_error, log_stage, log_success, log_warning};
use crate::error::{PipelineResult, TransformError};
use crate::mart::{write_marts, Marts};
use crate::source::load_raw_tables;
use crate::staging::{
    clean_economic_rows, clean_indicator_rows, stage_goals, stage_wb_countries, DropTally,
};
use crate::transform::countries::{normalize_countries, ResolutionStats, MANUAL_OVERRIDES};
use crate::transform::economy::pivot_economic_indicators;
use crate::transform::facts::assemble_progress_facts;
use crate::transform::progress::aggregate_goal_year_metrics;
use crate::transform::time::{build_time_dimension, observed_years};
use crate::validation::validate_marts;

/// Options for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Directory holding the four raw CSV tables.
    pub data_dir: PathBuf,

    /// Directory receiving the five mart tables.
    pub mart_dir: PathBuf,

    /// Skip mart schema validation before writing.
    pub skip_validation: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/raw"),
            mart_dir: PathBuf::from("data/marts"),
            skip_validation: false,
        }
    }
}

impl PipelineOptions {
    /// Resolve directories from the environment (`SDGMART_DATA_DIR`,
    /// `SDGMART_MART_DIR`), falling back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            data_dir: std::env::var("SDGMART_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            mart_dir: std::env::var("SDGMART_MART_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.mart_dir),
            skip_validation: false,
        }
    }
}

/// Result of a complete pipeline run.
#[derive(Debug)]
pub struct PipelineRun {
    /// Run identifier, for logs and API responses.
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// The assembled mart set, as written.
    pub marts: Marts,
    /// Raw rows across all four source tables.
    pub raw_rows: usize,
    /// Cleaned observations that entered aggregation.
    pub clean_observations: usize,
    /// Indicator rows excluded during staging, by reason.
    pub dropped: DropTally,
    /// How the country identifiers resolved.
    pub resolution: ResolutionStats,
}

/// Run the full transformation pipeline.
///
/// Idempotent by construction: deterministic surrogate keys plus full-refresh
/// writes mean a re-run over unchanged input reproduces identical tables.
/// There is no internal retry; callers that want one simply run again.
pub async fn run_pipeline(options: PipelineOptions) -> PipelineResult<PipelineRun> {
    let run_id = Uuid::new_v4().to_string();
    let started_at = Utc::now();
    log_stage("run", format!("Starting pipeline run {run_id}"));

    // Load the four raw tables.
    log_stage("source", format!("Reading raw tables from {}", options.data_dir.display()));
    let raw = load_raw_tables(&options.data_dir)?;
    let raw_rows = raw.total_rows();
    log_success(format!(
        "Loaded {} raw rows ({} indicator observations)",
        raw_rows,
        raw.sdg_indicator_data.records.len()
    ));

    // Staging cleanup.
    log_stage("staging", "Cleaning indicator observations...");
    let (observations, dropped) = clean_indicator_rows(&raw.sdg_indicator_data.records);
    if dropped.total() > 0 {
        log_warning(format!(
            "Excluded {} malformed indicator rows ({} no country, {} no indicator, {} no value, {} bad year, {} before window)",
            dropped.total(),
            dropped.missing_country,
            dropped.missing_indicator,
            dropped.missing_value,
            dropped.bad_year,
            dropped.pre_window,
        ));
    }
    if observations.is_empty() {
        log_error("No usable observations after staging");
        return Err(TransformError::EmptyInput.into());
    }
    log_success(format!("{} clean observations", observations.len()));

    let (economic_observations, econ_dropped) = clean_economic_rows(&raw.wb_indicators.records);
    if econ_dropped > 0 {
        log_warning(format!("Excluded {econ_dropped} malformed economic rows"));
    }

    let (wb_countries, aggregates) = stage_wb_countries(&raw.wb_countries.records);
    log_stage(
        "staging",
        format!("{} WB reference countries ({aggregates} aggregates filtered)", wb_countries.len()),
    );

    let goals = stage_goals(&raw.sdg_goals.records);

    // Country dimension first: both fact branches key off its output.
    log_stage("countries", "Normalizing country references...");
    let countries = normalize_countries(&observations, &wb_countries, MANUAL_OVERRIDES);
    let resolution = countries.stats;
    log_success(format!(
        "{} countries ({} by code, {} by name, {} by override, {} unresolved)",
        countries.records.len(),
        resolution.by_code,
        resolution.by_name,
        resolution.by_override,
        resolution.unresolved,
    ));

    // The three fact-independent branches have no mutual dependency and run
    // concurrently; fact assembly needs all of them (join barrier).
    let observations = Arc::new(observations);

    let metrics_task = {
        let observations = Arc::clone(&observations);
        tokio::task::spawn_blocking(move || aggregate_goal_year_metrics(&observations))
    };
    let economy_task = {
        let wb_code_map = countries.wb_code_map.clone();
        tokio::task::spawn_blocking(move || {
            pivot_economic_indicators(&economic_observations, &wb_code_map)
        })
    };
    let time_task = {
        let observations = Arc::clone(&observations);
        tokio::task::spawn_blocking(move || build_time_dimension(&observed_years(&observations)))
    };

    let (metrics, economic_facts, time_records) =
        tokio::join!(metrics_task, economy_task, time_task);
    let metrics = metrics.map_err(|e| TransformError::TaskFailed(e.to_string()))?;
    let economic_facts = economic_facts.map_err(|e| TransformError::TaskFailed(e.to_string()))?;
    let time_records = time_records.map_err(|e| TransformError::TaskFailed(e.to_string()))?;

    log_stage("progress", format!("{} goal-year metrics", metrics.len()));
    log_stage("economy", format!("{} economic country-years", economic_facts.len()));
    log_stage("time", format!("{} calendar years", time_records.len()));

    // Fact assembly behind the join barrier.
    log_stage("facts", "Assembling progress facts...");
    let facts = assemble_progress_facts(&metrics, &countries)?;
    log_success(format!("{} progress facts", facts.len()));

    let marts = Marts {
        dim_countries: countries.records,
        dim_goals: goals,
        dim_time: time_records,
        fact_sdg_progress: facts,
        fact_economic_indicators: economic_facts,
    };

    // Validate everything before the first write: a run either produces the
    // complete mart set or leaves the destination untouched.
    if !options.skip_validation {
        log_stage("validation", "Validating mart tables against schemas...");
        validate_marts(&marts)?;
        log_success("All mart tables valid");
    }

    log_stage("marts", format!("Writing mart tables to {}", options.mart_dir.display()));
    write_marts(&marts, &options.mart_dir)?;
    for (table, count) in marts.row_counts() {
        log_success(format!("{table}: {count} rows"));
    }

    let finished_at = Utc::now();
    log_stage(
        "run",
        format!(
            "Run {run_id} finished in {:.1}s",
            (finished_at - started_at).num_milliseconds() as f64 / 1000.0
        ),
    );

    Ok(PipelineRun {
        run_id,
        started_at,
        finished_at,
        marts,
        raw_rows,
        clean_observations: observations.len(),
        dropped,
        resolution,
    })
}
