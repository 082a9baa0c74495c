//! Calendar dimension: decade, development era, and milestone flags for
//! every year observed in indicator data.
//!
//! The year set comes solely from cleaned observations. A year nobody
//! reported on has no row, even if the economic feed covers it.

use std::collections::BTreeSet;

use crate::models::{DevelopmentEra, TimeRecord, SDG_BASELINE_YEAR, SDG_TARGET_YEAR};
use crate::staging::CleanObservation;

/// Distinct years present in cleaned indicator data, ascending.
pub fn observed_years(observations: &[CleanObservation]) -> BTreeSet<i32> {
    observations.iter().map(|o| o.year).collect()
}

/// Build the time dimension from a year set. Total function of its input;
/// output ascends by year.
pub fn build_time_dimension(years: &BTreeSet<i32>) -> Vec<TimeRecord> {
    years
        .iter()
        .map(|&year| TimeRecord {
            year,
            decade: (year / 10) * 10,
            development_era: DevelopmentEra::from_year(year),
            is_baseline_year: year == SDG_BASELINE_YEAR,
            is_target_year: year == SDG_TARGET_YEAR,
        })
        .collect()
}
