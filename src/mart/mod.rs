//! Mart layer: the five output tables and their on-disk CSV form.
//!
//! The contract with the destination store is whole-table replacement per
//! run, never row-level mutation. Writers therefore truncate; there is no
//! merge path. The combined denormalized export joins the star back together
//! for downstream tools that cannot join for themselves.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{PipelineError, PipelineResult};
use crate::models::{
    CountryRecord, EconomicYearRecord, GoalRecord, ProgressFact, TimeRecord,
};

/// File stems of the five mart tables.
pub const MART_TABLE_NAMES: [&str; 5] = [
    "dim_countries",
    "dim_goals",
    "dim_time",
    "fact_sdg_progress",
    "fact_economic_indicators",
];

/// The complete mart set produced by one run.
#[derive(Debug, Clone)]
pub struct Marts {
    pub dim_countries: Vec<CountryRecord>,
    pub dim_goals: Vec<GoalRecord>,
    pub dim_time: Vec<TimeRecord>,
    pub fact_sdg_progress: Vec<ProgressFact>,
    pub fact_economic_indicators: Vec<EconomicYearRecord>,
}

impl Marts {
    /// (table name, row count) pairs in output order.
    pub fn row_counts(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("dim_countries", self.dim_countries.len()),
            ("dim_goals", self.dim_goals.len()),
            ("dim_time", self.dim_time.len()),
            ("fact_sdg_progress", self.fact_sdg_progress.len()),
            ("fact_economic_indicators", self.fact_economic_indicators.len()),
        ]
    }
}

// =============================================================================
// Writing
// =============================================================================

/// Write all five tables to `<dir>/<table>.csv`, replacing prior contents.
///
/// Callers must finish validation before calling this: the all-or-nothing
/// guarantee of a run is "no writes until everything is assembled and
/// valid", with the storage layer's atomicity assumed beyond that point.
pub fn write_marts(marts: &Marts, dir: &Path) -> PipelineResult<()> {
    std::fs::create_dir_all(dir).map_err(|e| PipelineError::MartWrite {
        table: "<mart dir>".into(),
        message: e.to_string(),
    })?;

    write_table(dir, "dim_countries", &marts.dim_countries)?;
    write_table(dir, "dim_goals", &marts.dim_goals)?;
    write_table(dir, "dim_time", &marts.dim_time)?;
    write_table(dir, "fact_sdg_progress", &marts.fact_sdg_progress)?;
    write_table(dir, "fact_economic_indicators", &marts.fact_economic_indicators)?;

    Ok(())
}

fn write_table<T: Serialize>(dir: &Path, table: &str, rows: &[T]) -> PipelineResult<()> {
    let path = dir.join(format!("{table}.csv"));
    let mut writer = csv::Writer::from_path(&path).map_err(|e| PipelineError::MartWrite {
        table: table.into(),
        message: e.to_string(),
    })?;

    for row in rows {
        writer.serialize(row).map_err(|e| PipelineError::MartWrite {
            table: table.into(),
            message: e.to_string(),
        })?;
    }

    writer.flush().map_err(|e| PipelineError::MartWrite {
        table: table.into(),
        message: e.to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Reading
// =============================================================================

/// Read a previously written mart set back from disk (quality checks and
/// exports run against the marts a run produced, not against live state).
pub fn read_marts(dir: &Path) -> PipelineResult<Marts> {
    Ok(Marts {
        dim_countries: read_table(dir, "dim_countries")?,
        dim_goals: read_table(dir, "dim_goals")?,
        dim_time: read_table(dir, "dim_time")?,
        fact_sdg_progress: read_table(dir, "fact_sdg_progress")?,
        fact_economic_indicators: read_table(dir, "fact_economic_indicators")?,
    })
}

fn read_table<T: DeserializeOwned>(dir: &Path, table: &str) -> PipelineResult<Vec<T>> {
    let path = dir.join(format!("{table}.csv"));
    let mut reader = csv::Reader::from_path(&path).map_err(|e| PipelineError::MartWrite {
        table: table.into(),
        message: e.to_string(),
    })?;

    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| PipelineError::MartWrite {
            table: table.into(),
            message: e.to_string(),
        })
}

// =============================================================================
// Combined Export
// =============================================================================

/// One row of the denormalized analysis export: the progress fact joined
/// with goal, time, and economic context.
#[derive(Debug, Clone, Serialize)]
pub struct CombinedRow {
    pub progress_id: String,
    pub country_code: String,
    pub country_name: String,
    pub goal_code: String,
    pub goal_title: Option<String>,
    pub goal_category: Option<String>,
    pub year: i32,
    pub development_era: Option<String>,
    pub region: String,
    pub income_level: String,
    pub indicators_measured: u32,
    pub avg_indicator_value: f64,
    pub yoy_change: Option<f64>,
    pub gdp_per_capita: Option<f64>,
    pub population: Option<f64>,
    pub life_expectancy: Option<f64>,
    pub adult_literacy_rate: Option<f64>,
}

/// Join the star back into one flat table, left-joining every dimension so
/// no fact row is lost to a missing lookup.
pub fn combine_for_analysis(marts: &Marts) -> Vec<CombinedRow> {
    let goals: HashMap<&str, &GoalRecord> = marts
        .dim_goals
        .iter()
        .map(|g| (g.goal_code.as_str(), g))
        .collect();
    let eras: HashMap<i32, &TimeRecord> =
        marts.dim_time.iter().map(|t| (t.year, t)).collect();
    let economy: HashMap<(&str, i32), &EconomicYearRecord> = marts
        .fact_economic_indicators
        .iter()
        .map(|e| ((e.country_code.as_str(), e.year), e))
        .collect();

    marts
        .fact_sdg_progress
        .iter()
        .map(|fact| {
            let goal = goals.get(fact.goal_code.as_str());
            let era = eras.get(&fact.year);
            let econ = economy.get(&(fact.country_code.as_str(), fact.year));

            CombinedRow {
                progress_id: fact.progress_id.clone(),
                country_code: fact.country_code.clone(),
                country_name: fact.country_name.clone(),
                goal_code: fact.goal_code.clone(),
                goal_title: goal.map(|g| g.goal_title.clone()),
                goal_category: goal
                    .and_then(|g| g.goal_category)
                    .map(|c| c.label().to_string()),
                year: fact.year,
                development_era: era.map(|t| t.development_era.label().to_string()),
                region: fact.region.clone(),
                income_level: fact.income_level.clone(),
                indicators_measured: fact.indicators_measured,
                avg_indicator_value: fact.avg_indicator_value,
                yoy_change: fact.yoy_change,
                gdp_per_capita: econ.and_then(|e| e.gdp_per_capita),
                population: econ.and_then(|e| e.population),
                life_expectancy: econ.and_then(|e| e.life_expectancy),
                adult_literacy_rate: econ.and_then(|e| e.adult_literacy_rate),
            }
        })
        .collect()
}

/// Write the combined export to `<dir>/sdg_analysis_combined.csv`.
pub fn write_combined_export(marts: &Marts, dir: &Path) -> PipelineResult<usize> {
    let rows = combine_for_analysis(marts);
    write_table(dir, "sdg_analysis_combined", &rows)?;
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DevelopmentEra, GoalCategory, UNKNOWN};

    fn sample_marts() -> Marts {
        Marts {
            dim_countries: vec![CountryRecord {
                country_code: "76".into(),
                country_name: "Brazil".into(),
                region: "Latin America & Caribbean".into(),
                income_level: "Upper middle income".into(),
                capital_city: Some("Brasilia".into()),
                longitude: Some(-47.9292),
                latitude: Some(-15.7801),
            }],
            dim_goals: vec![GoalRecord {
                goal_code: "3".into(),
                goal_title: "Good Health and Well-being".into(),
                goal_description: String::new(),
                goal_category: Some(GoalCategory::People),
            }],
            dim_time: vec![TimeRecord {
                year: 2020,
                decade: 2020,
                development_era: DevelopmentEra::Sdg,
                is_baseline_year: false,
                is_target_year: false,
            }],
            fact_sdg_progress: vec![ProgressFact {
                progress_id: "76_3_2020".into(),
                country_code: "76".into(),
                country_name: "Brazil".into(),
                goal_code: "3".into(),
                year: 2020,
                region: "Latin America & Caribbean".into(),
                income_level: "Upper middle income".into(),
                indicators_measured: 2,
                avg_indicator_value: 12.5,
                min_indicator_value: 10.0,
                max_indicator_value: 15.0,
                prev_year_avg: None,
                yoy_change: None,
            }],
            fact_economic_indicators: vec![EconomicYearRecord {
                country_code: "76".into(),
                year: 2020,
                gdp_per_capita: Some(8900.0),
                population: Some(212_000_000.0),
                life_expectancy: None,
                adult_literacy_rate: None,
            }],
        }
    }

    #[test]
    fn test_write_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let marts = sample_marts();

        write_marts(&marts, dir.path()).unwrap();
        for name in MART_TABLE_NAMES {
            assert!(dir.path().join(format!("{name}.csv")).exists());
        }

        let restored = read_marts(dir.path()).unwrap();
        assert_eq!(restored.dim_countries, marts.dim_countries);
        assert_eq!(restored.dim_time, marts.dim_time);
        assert_eq!(restored.fact_sdg_progress, marts.fact_sdg_progress);
        assert_eq!(restored.fact_economic_indicators, marts.fact_economic_indicators);
    }

    #[test]
    fn test_full_refresh_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let mut marts = sample_marts();

        write_marts(&marts, dir.path()).unwrap();
        marts.fact_sdg_progress.clear();
        write_marts(&marts, dir.path()).unwrap();

        let restored = read_marts(dir.path()).unwrap();
        assert!(restored.fact_sdg_progress.is_empty());
    }

    #[test]
    fn test_combined_export_joins_star() {
        let marts = sample_marts();
        let rows = combine_for_analysis(&marts);

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.goal_title.as_deref(), Some("Good Health and Well-being"));
        assert_eq!(row.goal_category.as_deref(), Some("People"));
        assert_eq!(row.development_era.as_deref(), Some("SDG Era"));
        assert_eq!(row.gdp_per_capita, Some(8900.0));
    }

    #[test]
    fn test_combined_export_left_join_survives_missing_dimensions() {
        let mut marts = sample_marts();
        marts.dim_goals.clear();
        marts.dim_time.clear();
        marts.fact_economic_indicators.clear();
        marts.fact_sdg_progress[0].region = UNKNOWN.into();

        let rows = combine_for_analysis(&marts);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].goal_title.is_none());
        assert!(rows[0].gdp_per_capita.is_none());
        assert_eq!(rows[0].region, UNKNOWN);
    }
}
