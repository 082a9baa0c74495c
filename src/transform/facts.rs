//! Fact assembly: goal-year metrics join the country dimension, gain a
//! deterministic surrogate key, and are extended with year-over-year deltas.
//!
//! The year-over-year lookback is positional, not arithmetic: within each
//! (country, goal) partition sorted ascending by year, the "previous" row is
//! the immediately preceding present row, even when the year gap is wider
//! than one. Gaps are never interpolated.

use std::collections::{BTreeMap, HashSet};

use crate::error::{TransformError, TransformResult};
use crate::models::{GoalYearMetric, ProgressFact, UNKNOWN};
use crate::transform::countries::NormalizedCountries;

/// Deterministic surrogate key for a progress fact.
///
/// Reproducible across runs, so the destination table can be overwritten
/// idempotently. Unique as long as the aggregator produced at most one row
/// per (country, goal, year); a collision here is a grouping bug upstream.
pub fn progress_id(country_code: &str, goal_code: &str, year: i32) -> String {
    format!("{country_code}_{goal_code}_{year}")
}

/// Assemble the progress fact table.
///
/// Left-join semantics: every metric row is retained. A failed country
/// lookup degrades classification to the [`UNKNOWN`] sentinel rather than
/// dropping the row (the normalizer makes this unreachable in practice, but
/// the join does not rely on it). Metrics arrive with non-null years by
/// construction; staging already typed them.
///
/// A duplicate surrogate key after assembly is a structural violation and
/// fails the run.
pub fn assemble_progress_facts(
    metrics: &[GoalYearMetric],
    countries: &NormalizedCountries,
) -> TransformResult<Vec<ProgressFact>> {
    let dimension = countries.by_code();

    // Partition by (country, goal), numerically ordered.
    let mut partitions: BTreeMap<((u32, String), (u32, String)), Vec<&GoalYearMetric>> =
        BTreeMap::new();
    for metric in metrics {
        let key = (sort_key(&metric.country_code), sort_key(&metric.goal_code));
        partitions.entry(key).or_default().push(metric);
    }

    let mut facts = Vec::with_capacity(metrics.len());
    let mut seen_ids = HashSet::with_capacity(metrics.len());

    for series in partitions.into_values() {
        let mut series = series;
        series.sort_by_key(|m| m.year);

        let mut prev_avg: Option<f64> = None;
        for metric in series {
            let id = progress_id(&metric.country_code, &metric.goal_code, metric.year);
            if !seen_ids.insert(id.clone()) {
                return Err(TransformError::DuplicateProgressId(id));
            }

            let country = dimension.get(metric.country_code.as_str());
            let (country_name, region, income_level) = match country {
                Some(c) => (
                    c.country_name.clone(),
                    c.region.clone(),
                    c.income_level.clone(),
                ),
                None => (
                    metric.country_name.clone(),
                    UNKNOWN.to_string(),
                    UNKNOWN.to_string(),
                ),
            };

            facts.push(ProgressFact {
                progress_id: id,
                country_code: metric.country_code.clone(),
                country_name,
                goal_code: metric.goal_code.clone(),
                year: metric.year,
                region,
                income_level,
                indicators_measured: metric.indicators_measured,
                avg_indicator_value: metric.avg_indicator_value,
                min_indicator_value: metric.min_indicator_value,
                max_indicator_value: metric.max_indicator_value,
                prev_year_avg: prev_avg,
                yoy_change: prev_avg.map(|p| metric.avg_indicator_value - p),
            });

            prev_avg = Some(metric.avg_indicator_value);
        }
    }

    Ok(facts)
}

fn sort_key(code: &str) -> (u32, String) {
    (code.parse::<u32>().unwrap_or(u32::MAX), code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::countries::normalize_countries;
    use crate::staging::CleanObservation;

    fn metric(country: &str, goal: &str, year: i32, avg: f64) -> GoalYearMetric {
        GoalYearMetric {
            country_code: country.into(),
            country_name: format!("Country {country}"),
            goal_code: goal.into(),
            year,
            indicators_measured: 1,
            avg_indicator_value: avg,
            min_indicator_value: avg,
            max_indicator_value: avg,
        }
    }

    fn dimension_for(codes: &[&str]) -> NormalizedCountries {
        let observations: Vec<CleanObservation> = codes
            .iter()
            .map(|code| CleanObservation {
                country_code: (*code).into(),
                country_name: format!("Country {code}"),
                indicator_code: "1.1.1".into(),
                goal_code: "1".into(),
                year: 2020,
                value: 1.0,
            })
            .collect();
        normalize_countries(&observations, &[], &[])
    }

    #[test]
    fn test_progress_id_shape() {
        assert_eq!(progress_id("76", "3", 2020), "76_3_2020");
    }

    #[test]
    fn test_yoy_lookback_over_gaps() {
        let metrics = vec![
            metric("76", "3", 2018, 10.0),
            metric("76", "3", 2019, 12.0),
            metric("76", "3", 2021, 14.0),
            metric("76", "3", 2022, 15.0),
        ];
        let facts = assemble_progress_facts(&metrics, &dimension_for(&["76"])).unwrap();

        // First year of the series has no predecessor: null, never zero.
        assert_eq!(facts[0].prev_year_avg, None);
        assert_eq!(facts[0].yoy_change, None);

        assert_eq!(facts[1].prev_year_avg, Some(10.0));
        assert_eq!(facts[1].yoy_change, Some(2.0));

        // 2020 is absent: 2021 looks back to 2019, not an interpolation.
        assert_eq!(facts[2].prev_year_avg, Some(12.0));
        assert_eq!(facts[2].yoy_change, Some(2.0));

        assert_eq!(facts[3].prev_year_avg, Some(14.0));
        assert_eq!(facts[3].yoy_change, Some(1.0));
    }

    #[test]
    fn test_series_partitioned_by_goal() {
        let metrics = vec![
            metric("76", "3", 2020, 10.0),
            metric("76", "17", 2021, 99.0),
        ];
        let facts = assemble_progress_facts(&metrics, &dimension_for(&["76"])).unwrap();

        // Different goals never see each other's history.
        assert!(facts.iter().all(|f| f.prev_year_avg.is_none()));
    }

    #[test]
    fn test_unsorted_input_sorted_within_partition() {
        let metrics = vec![
            metric("76", "3", 2021, 14.0),
            metric("76", "3", 2018, 10.0),
        ];
        let facts = assemble_progress_facts(&metrics, &dimension_for(&["76"])).unwrap();

        assert_eq!(facts[0].year, 2018);
        assert_eq!(facts[1].year, 2021);
        assert_eq!(facts[1].prev_year_avg, Some(10.0));
    }

    #[test]
    fn test_left_join_keeps_unmatched_metric() {
        let metrics = vec![metric("999", "3", 2020, 1.0)];
        let facts = assemble_progress_facts(&metrics, &dimension_for(&["76"])).unwrap();

        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].region, UNKNOWN);
        assert_eq!(facts[0].income_level, UNKNOWN);
        assert_eq!(facts[0].country_name, "Country 999");
    }

    #[test]
    fn test_classification_from_dimension() {
        let facts = assemble_progress_facts(
            &[metric("76", "3", 2020, 1.0)],
            &dimension_for(&["76"]),
        )
        .unwrap();

        // The sentinel here comes from the dimension itself (no WB data in
        // the fixture), not from a failed join.
        assert_eq!(facts[0].country_name, "Country 76");
        assert_eq!(facts[0].region, UNKNOWN);
    }

    #[test]
    fn test_duplicate_surrogate_key_is_fatal() {
        let metrics = vec![
            metric("76", "3", 2020, 1.0),
            metric("76", "3", 2020, 2.0),
        ];
        let result = assemble_progress_facts(&metrics, &dimension_for(&["76"]));
        assert!(matches!(
            result,
            Err(TransformError::DuplicateProgressId(id)) if id == "76_3_2020"
        ));
    }
}
