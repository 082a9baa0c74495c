//! Indicator aggregation: cleaned observations collapse into one row per
//! (country, goal, year).
//!
//! A goal-year row reports how many distinct indicators were measured and
//! the mean/min/max of all observed values in the group. Staging has already
//! excluded malformed rows, so everything arriving here participates.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::GoalYearMetric;
use crate::staging::CleanObservation;

/// Accumulates one (country, goal, year) group while scanning observations.
struct MetricBuilder {
    country_name: String,
    indicators: BTreeSet<String>,
    sum: f64,
    count: u32,
    min: f64,
    max: f64,
}

impl MetricBuilder {
    fn new(obs: &CleanObservation) -> Self {
        Self {
            country_name: obs.country_name.clone(),
            indicators: BTreeSet::new(),
            sum: 0.0,
            count: 0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    fn add(&mut self, obs: &CleanObservation) {
        self.indicators.insert(obs.indicator_code.clone());
        self.sum += obs.value;
        self.count += 1;
        self.min = self.min.min(obs.value);
        self.max = self.max.max(obs.value);
    }

    fn build(self, country_code: String, goal_code: String, year: i32) -> GoalYearMetric {
        GoalYearMetric {
            country_code,
            country_name: self.country_name,
            goal_code,
            year,
            indicators_measured: self.indicators.len() as u32,
            avg_indicator_value: self.sum / self.count as f64,
            min_indicator_value: self.min,
            max_indicator_value: self.max,
        }
    }
}

/// Group key ordered numerically where codes are numeric, so output order
/// is stable across runs regardless of input order.
fn sort_key(code: &str) -> (u32, String) {
    (code.parse::<u32>().unwrap_or(u32::MAX), code.to_string())
}

/// Aggregate cleaned observations into goal-year metrics.
///
/// Output is sorted by (country, goal, year); the pipeline's idempotence
/// property depends on this ordering being deterministic.
pub fn aggregate_goal_year_metrics(observations: &[CleanObservation]) -> Vec<GoalYearMetric> {
    let mut groups: BTreeMap<((u32, String), (u32, String), i32), MetricBuilder> = BTreeMap::new();

    for obs in observations {
        let key = (sort_key(&obs.country_code), sort_key(&obs.goal_code), obs.year);
        groups
            .entry(key)
            .or_insert_with(|| MetricBuilder::new(obs))
            .add(obs);
    }

    groups
        .into_iter()
        .map(|(((_, country), (_, goal), year), builder)| builder.build(country, goal, year))
        .collect()
}
