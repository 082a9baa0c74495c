//! Staging cleanup: untyped raw rows in, typed staging rows out.
//!
//! Every downstream branch consumes staging output, never raw rows. The
//! policy for malformed input is silent exclusion: a row missing a value,
//! a country identifier, or carrying an unparseable year is dropped and
//! tallied, never coerced and never fatal.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::models::{GoalCategory, GoalRecord};

/// Observations earlier than this year predate the tracked reporting window
/// and are excluded from aggregation.
pub const MIN_OBSERVATION_YEAR: i32 = 2000;

/// A bare 4-digit year, tolerating the `.0` float suffix the bulk loader
/// emits for numeric columns.
static YEAR_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d{4})(?:\.0+)?\s*$").expect("valid year pattern"));

// =============================================================================
// Staging Row Types
// =============================================================================

/// A cleaned SDG indicator observation.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanObservation {
    /// UN geo area code, the canonical country identifier of the schema.
    pub country_code: String,
    pub country_name: String,
    pub indicator_code: String,
    /// Leading numeric segment of the indicator code.
    pub goal_code: String,
    pub year: i32,
    pub value: f64,
}

/// A cleaned World Bank economic observation, still in WB vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct EconomicObservation {
    pub wb_country_code: String,
    pub indicator_code: String,
    pub year: i32,
    pub value: f64,
}

/// A World Bank country reference row.
#[derive(Debug, Clone, PartialEq)]
pub struct WbCountry {
    pub country_code: String,
    pub country_name: String,
    pub region: String,
    pub income_level: String,
    pub capital_city: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

/// Rows dropped during indicator cleaning, by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropTally {
    pub missing_country: usize,
    pub missing_indicator: usize,
    pub missing_value: usize,
    pub bad_year: usize,
    pub pre_window: usize,
}

impl DropTally {
    pub fn total(&self) -> usize {
        self.missing_country
            + self.missing_indicator
            + self.missing_value
            + self.bad_year
            + self.pre_window
    }
}

// =============================================================================
// Field Helpers
// =============================================================================

/// Non-empty trimmed string field, or `None`.
fn field_str<'a>(row: &'a Value, key: &str) -> Option<&'a str> {
    let s = row.get(key)?.as_str()?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Numeric field: accepts JSON numbers and numeric strings.
fn field_f64(row: &Value, key: &str) -> Option<f64> {
    match row.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                s.parse().ok()
            }
        }
        _ => None,
    }
}

/// Parse a strict year token. Anything that is not a 4-digit year
/// (optionally float-suffixed) is malformed input.
pub fn parse_year(raw: &str) -> Option<i32> {
    let caps = YEAR_TOKEN.captures(raw)?;
    caps.get(1)?.as_str().parse().ok()
}

/// Extract the goal code from an indicator code: the leading segment before
/// the first `.` separator. Codes without a separator pass through whole.
pub fn goal_from_indicator(indicator_code: &str) -> &str {
    indicator_code
        .split('.')
        .next()
        .unwrap_or(indicator_code)
        .trim()
}

// =============================================================================
// Cleaning Passes
// =============================================================================

/// Clean raw SDG indicator rows.
///
/// Rejects rows with a missing country identifier, a missing indicator
/// code, a missing value, an unparseable year, or a year before
/// [`MIN_OBSERVATION_YEAR`]. Dropped rows are tallied per reason for the
/// run log.
pub fn clean_indicator_rows(rows: &[Value]) -> (Vec<CleanObservation>, DropTally) {
    let mut clean = Vec::with_capacity(rows.len());
    let mut tally = DropTally::default();

    for row in rows {
        let Some(country_code) = field_str(row, "geo_area_code") else {
            tally.missing_country += 1;
            continue;
        };
        let Some(indicator_code) = field_str(row, "indicator_code") else {
            tally.missing_indicator += 1;
            continue;
        };
        let Some(value) = field_f64(row, "value") else {
            tally.missing_value += 1;
            continue;
        };
        let Some(year) = field_str(row, "time_period").and_then(parse_year) else {
            tally.bad_year += 1;
            continue;
        };
        if year < MIN_OBSERVATION_YEAR {
            tally.pre_window += 1;
            continue;
        }

        let indicator_code = indicator_code.to_string();
        let goal_code = goal_from_indicator(&indicator_code).to_string();

        clean.push(CleanObservation {
            country_code: country_code.to_string(),
            country_name: field_str(row, "geo_area_name").unwrap_or("").to_string(),
            indicator_code,
            goal_code,
            year,
            value,
        });
    }

    (clean, tally)
}

/// Clean raw World Bank indicator rows. Same malformed-input policy as the
/// SDG side, minus the year floor: the extraction window already bounds the
/// WB series.
pub fn clean_economic_rows(rows: &[Value]) -> (Vec<EconomicObservation>, usize) {
    let mut clean = Vec::with_capacity(rows.len());
    let mut dropped = 0usize;

    for row in rows {
        let country = field_str(row, "country_code");
        let code = field_str(row, "indicator_code");
        let year = field_str(row, "year").and_then(parse_year);
        let value = field_f64(row, "value");

        match (country, code, year, value) {
            (Some(country), Some(code), Some(year), Some(value)) => {
                clean.push(EconomicObservation {
                    wb_country_code: country.to_string(),
                    indicator_code: code.to_string(),
                    year,
                    value,
                });
            }
            _ => dropped += 1,
        }
    }

    (clean, dropped)
}

/// Stage World Bank country reference rows.
///
/// Rows with an empty `region` are regional or income aggregates (World,
/// Euro area, ...) rather than countries; they are filtered out before any
/// matching, as the upstream extractor does. Returns the aggregate count
/// alongside the kept rows.
pub fn stage_wb_countries(rows: &[Value]) -> (Vec<WbCountry>, usize) {
    let mut countries = Vec::with_capacity(rows.len());
    let mut aggregates = 0usize;

    for row in rows {
        let (Some(code), Some(name)) = (field_str(row, "country_code"), field_str(row, "country_name"))
        else {
            aggregates += 1;
            continue;
        };
        let Some(region) = field_str(row, "region") else {
            aggregates += 1;
            continue;
        };

        countries.push(WbCountry {
            country_code: code.to_string(),
            country_name: name.to_string(),
            region: region.to_string(),
            income_level: field_str(row, "income_level").unwrap_or("").to_string(),
            capital_city: field_str(row, "capital_city").map(str::to_string),
            longitude: field_f64(row, "longitude"),
            latitude: field_f64(row, "latitude"),
        });
    }

    (countries, aggregates)
}

/// Stage SDG goal rows into the goal dimension, deriving the five-P
/// category from the goal code. Output is sorted numerically by code.
pub fn stage_goals(rows: &[Value]) -> Vec<GoalRecord> {
    let mut goals: Vec<GoalRecord> = rows
        .iter()
        .filter_map(|row| {
            let code = field_str(row, "goal_code")?;
            Some(GoalRecord {
                goal_code: code.to_string(),
                goal_title: field_str(row, "goal_title").unwrap_or("").to_string(),
                goal_description: field_str(row, "goal_description").unwrap_or("").to_string(),
                goal_category: GoalCategory::from_goal_code(code),
            })
        })
        .collect();

    goals.sort_by_key(|g| g.goal_code.parse::<u32>().unwrap_or(u32::MAX));
    goals
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_year_strict() {
        assert_eq!(parse_year("2015"), Some(2015));
        assert_eq!(parse_year("2015.0"), Some(2015));
        assert_eq!(parse_year(" 2021 "), Some(2021));
        assert_eq!(parse_year("unknown"), None);
        assert_eq!(parse_year(""), None);
        assert_eq!(parse_year("15"), None);
        assert_eq!(parse_year("2015-2016"), None);
    }

    #[test]
    fn test_goal_from_indicator() {
        assert_eq!(goal_from_indicator("3.4.2"), "3");
        assert_eq!(goal_from_indicator("17"), "17");
        assert_eq!(goal_from_indicator("1.1.1"), "1");
    }

    #[test]
    fn test_clean_indicator_rows_policy() {
        let rows = vec![
            json!({"indicator_code": "3.4.2", "geo_area_code": "76", "geo_area_name": "Brazil",
                   "time_period": "2018", "value": "12.5"}),
            // null value
            json!({"indicator_code": "3.4.2", "geo_area_code": "76", "geo_area_name": "Brazil",
                   "time_period": "2019", "value": ""}),
            // unparseable year
            json!({"indicator_code": "3.4.2", "geo_area_code": "76", "geo_area_name": "Brazil",
                   "time_period": "n/a", "value": "1"}),
            // before the reporting window
            json!({"indicator_code": "3.4.2", "geo_area_code": "76", "geo_area_name": "Brazil",
                   "time_period": "1999", "value": "1"}),
            // missing country identifier
            json!({"indicator_code": "3.4.2", "geo_area_code": "", "geo_area_name": "",
                   "time_period": "2018", "value": "1"}),
            // missing indicator code
            json!({"indicator_code": "", "geo_area_code": "76", "geo_area_name": "Brazil",
                   "time_period": "2018", "value": "1"}),
        ];

        let (clean, tally) = clean_indicator_rows(&rows);

        assert_eq!(clean.len(), 1);
        assert_eq!(clean[0].goal_code, "3");
        assert_eq!(clean[0].year, 2018);
        assert_eq!(tally.missing_value, 1);
        assert_eq!(tally.bad_year, 1);
        assert_eq!(tally.pre_window, 1);
        assert_eq!(tally.missing_country, 1);
        assert_eq!(tally.missing_indicator, 1);
        assert_eq!(tally.total(), 5);
    }

    #[test]
    fn test_year_2000_is_kept() {
        let rows = vec![json!({"indicator_code": "1.1.1", "geo_area_code": "76",
                               "geo_area_name": "Brazil", "time_period": "2000", "value": "5"})];
        let (clean, tally) = clean_indicator_rows(&rows);
        assert_eq!(clean.len(), 1);
        assert_eq!(tally.total(), 0);
    }

    #[test]
    fn test_clean_economic_rows() {
        let rows = vec![
            json!({"country_code": "BRA", "indicator_code": "SP.POP.TOTL",
                   "year": "2020", "value": "212000000"}),
            json!({"country_code": "BRA", "indicator_code": "SP.POP.TOTL",
                   "year": "2020", "value": ""}),
        ];
        let (clean, dropped) = clean_economic_rows(&rows);
        assert_eq!(clean.len(), 1);
        assert_eq!(dropped, 1);
        assert_eq!(clean[0].wb_country_code, "BRA");
    }

    #[test]
    fn test_wb_aggregates_filtered() {
        let rows = vec![
            json!({"country_code": "BRA", "country_name": "Brazil",
                   "region": "Latin America & Caribbean", "income_level": "Upper middle income",
                   "capital_city": "Brasilia", "longitude": "-47.9292", "latitude": "-15.7801"}),
            // aggregate rows carry no region
            json!({"country_code": "WLD", "country_name": "World", "region": "",
                   "income_level": "", "capital_city": "", "longitude": "", "latitude": ""}),
        ];

        let (countries, aggregates) = stage_wb_countries(&rows);

        assert_eq!(countries.len(), 1);
        assert_eq!(aggregates, 1);
        assert_eq!(countries[0].longitude, Some(-47.9292));
        assert_eq!(countries[0].capital_city.as_deref(), Some("Brasilia"));
    }

    #[test]
    fn test_stage_goals_sorted_with_category() {
        let rows = vec![
            json!({"goal_code": "17", "goal_title": "Partnerships for the Goals",
                   "goal_description": ""}),
            json!({"goal_code": "3", "goal_title": "Good Health and Well-being",
                   "goal_description": "Ensure healthy lives"}),
        ];

        let goals = stage_goals(&rows);

        assert_eq!(goals[0].goal_code, "3");
        assert_eq!(goals[0].goal_category, Some(GoalCategory::People));
        assert_eq!(goals[1].goal_code, "17");
        assert_eq!(goals[1].goal_category, Some(GoalCategory::Partnership));
    }
}
