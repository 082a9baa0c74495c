//! Domain models for the sdgmart star schema.
//!
//! This module contains the typed records that make up the mart layer:
//!
//! - [`CountryRecord`] - Canonical country dimension row (`dim_countries`)
//! - [`GoalRecord`] - SDG goal dimension row (`dim_goals`)
//! - [`TimeRecord`] - Calendar/era dimension row (`dim_time`)
//! - [`GoalYearMetric`] - Aggregated per-goal yearly metrics (pre-fact)
//! - [`ProgressFact`] - SDG progress fact row (`fact_sdg_progress`)
//! - [`EconomicYearRecord`] - Economic fact row (`fact_economic_indicators`)
//! - [`DevelopmentEra`], [`GoalCategory`] - Classification enums

use serde::{Deserialize, Serialize};

/// Sentinel classification for countries with no resolvable region or
/// income level. Distinct from null so fact joins never drop rows.
pub const UNKNOWN: &str = "Unknown";

/// First year of the SDG framework; flagged in `dim_time`.
pub const SDG_BASELINE_YEAR: i32 = 2015;

/// Agenda 2030 target year; flagged in `dim_time`.
pub const SDG_TARGET_YEAR: i32 = 2030;

// =============================================================================
// Development Era
// =============================================================================

/// Development-agenda era a year falls into.
///
/// Years before 2015 belong to the Millennium Development Goals, 2015
/// through 2030 inclusive to the Sustainable Development Goals, and
/// anything after 2030 to the post-Agenda-2030 period.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DevelopmentEra {
    #[serde(rename = "MDG Era")]
    Mdg,
    #[serde(rename = "SDG Era")]
    Sdg,
    #[serde(rename = "Post-SDG")]
    PostSdg,
}

impl DevelopmentEra {
    /// Classify a year into its era.
    pub fn from_year(year: i32) -> Self {
        if year < SDG_BASELINE_YEAR {
            Self::Mdg
        } else if year <= SDG_TARGET_YEAR {
            Self::Sdg
        } else {
            Self::PostSdg
        }
    }

    /// Display label, matching the serialized form.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Mdg => "MDG Era",
            Self::Sdg => "SDG Era",
            Self::PostSdg => "Post-SDG",
        }
    }
}

// =============================================================================
// Goal Category
// =============================================================================

/// Five-P grouping of the 17 SDGs used by `dim_goals`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GoalCategory {
    People,
    Planet,
    Prosperity,
    Peace,
    Partnership,
}

impl GoalCategory {
    /// Categorize a goal by its numeric code (1-17).
    ///
    /// Returns `None` for codes outside the known goal set.
    pub fn from_goal_code(code: &str) -> Option<Self> {
        let n: u8 = code.trim().parse().ok()?;
        match n {
            1..=5 => Some(Self::People),
            6 | 12..=15 => Some(Self::Planet),
            7..=11 => Some(Self::Prosperity),
            16 => Some(Self::Peace),
            17 => Some(Self::Partnership),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::People => "People",
            Self::Planet => "Planet",
            Self::Prosperity => "Prosperity",
            Self::Peace => "Peace",
            Self::Partnership => "Partnership",
        }
    }
}

// =============================================================================
// Dimension Records
// =============================================================================

/// Canonical country record, one per identifier observed in indicator data.
///
/// Built once per run by the reference normalizer; never mutated afterwards.
/// `region` and `income_level` hold the [`UNKNOWN`] sentinel when no source
/// and no override resolved them. Coordinates stay unset unless a World Bank
/// match supplied them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CountryRecord {
    pub country_code: String,
    pub country_name: String,
    pub region: String,
    pub income_level: String,
    pub capital_city: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

/// SDG goal dimension row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalRecord {
    pub goal_code: String,
    pub goal_title: String,
    pub goal_description: String,
    pub goal_category: Option<GoalCategory>,
}

/// Calendar dimension row, derived solely from years present in indicator
/// data. A year with no observations has no row even if economically
/// relevant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeRecord {
    pub year: i32,
    pub decade: i32,
    pub development_era: DevelopmentEra,
    pub is_baseline_year: bool,
    pub is_target_year: bool,
}

// =============================================================================
// Fact Records
// =============================================================================

/// One row per (country, goal, year): how many distinct indicators were
/// measured and the summary statistics of their values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoalYearMetric {
    pub country_code: String,
    pub country_name: String,
    pub goal_code: String,
    pub year: i32,
    pub indicators_measured: u32,
    pub avg_indicator_value: f64,
    pub min_indicator_value: f64,
    pub max_indicator_value: f64,
}

/// Wide economic fact row, one per (country, year). Columns are nullable
/// independently; a country-year appears as soon as any of the four
/// indicators reported a value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EconomicYearRecord {
    pub country_code: String,
    pub year: i32,
    pub gdp_per_capita: Option<f64>,
    pub population: Option<f64>,
    pub life_expectancy: Option<f64>,
    pub adult_literacy_rate: Option<f64>,
}

/// SDG progress fact row.
///
/// `progress_id` is deterministically derived from
/// (country_code, goal_code, year), so re-running the pipeline on identical
/// input reproduces identical keys and the destination table can be
/// overwritten idempotently.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressFact {
    pub progress_id: String,
    pub country_code: String,
    pub country_name: String,
    pub goal_code: String,
    pub year: i32,
    pub region: String,
    pub income_level: String,
    pub indicators_measured: u32,
    pub avg_indicator_value: f64,
    pub min_indicator_value: f64,
    pub max_indicator_value: f64,
    pub prev_year_avg: Option<f64>,
    pub yoy_change: Option<f64>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_era_from_year() {
        assert_eq!(DevelopmentEra::from_year(2014), DevelopmentEra::Mdg);
        assert_eq!(DevelopmentEra::from_year(2015), DevelopmentEra::Sdg);
        assert_eq!(DevelopmentEra::from_year(2030), DevelopmentEra::Sdg);
        assert_eq!(DevelopmentEra::from_year(2031), DevelopmentEra::PostSdg);
    }

    #[test]
    fn test_era_serialized_label() {
        let json = serde_json::to_string(&DevelopmentEra::Mdg).unwrap();
        assert_eq!(json, "\"MDG Era\"");
        assert_eq!(DevelopmentEra::PostSdg.label(), "Post-SDG");
    }

    #[test]
    fn test_goal_category_buckets() {
        assert_eq!(GoalCategory::from_goal_code("3"), Some(GoalCategory::People));
        assert_eq!(GoalCategory::from_goal_code("13"), Some(GoalCategory::Planet));
        assert_eq!(GoalCategory::from_goal_code("8"), Some(GoalCategory::Prosperity));
        assert_eq!(GoalCategory::from_goal_code("16"), Some(GoalCategory::Peace));
        assert_eq!(GoalCategory::from_goal_code("17"), Some(GoalCategory::Partnership));
        assert_eq!(GoalCategory::from_goal_code("42"), None);
        assert_eq!(GoalCategory::from_goal_code("not-a-goal"), None);
    }

    #[test]
    fn test_country_record_serialization() {
        let record = CountryRecord {
            country_code: "76".into(),
            country_name: "Brazil".into(),
            region: "Latin America & Caribbean".into(),
            income_level: "Upper middle income".into(),
            capital_city: Some("Brasilia".into()),
            longitude: Some(-47.9292),
            latitude: Some(-15.7801),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("Brazil"));
        assert!(json.contains("Upper middle income"));
    }
}
