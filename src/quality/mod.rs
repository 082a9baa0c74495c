//! Post-run data quality report over a produced mart set.
//!
//! Mirrors what an analyst would eyeball after a refresh: row counts, fact
//! coverage, data-point distribution by goal and region, and the null
//! checks that guard the sentinel contract.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::api::logs::{log_info, log_success, log_warning};
use crate::mart::Marts;
use crate::transform::economy::WB_INDICATORS;

/// Coverage summary of the progress fact table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactCoverage {
    pub countries: usize,
    pub goals: usize,
    pub years: usize,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
}

/// Counters that must be zero if the sentinel contract held.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NullCheck {
    pub empty_region: usize,
    pub empty_income_level: usize,
    /// Informational: facts with no predecessor row.
    pub null_yoy: usize,
}

/// A complete quality report.
#[derive(Debug, Clone)]
pub struct QualityReport {
    pub table_counts: Vec<(&'static str, usize)>,
    pub coverage: FactCoverage,
    /// Data points per goal, numerically ordered by goal code.
    pub by_goal: Vec<(String, usize)>,
    /// Data points per region, descending by count.
    pub by_region: Vec<(String, usize)>,
    /// Country-years with a value per economic indicator, in pivot order.
    pub economic_coverage: Vec<(&'static str, usize)>,
    pub nulls: NullCheck,
}

impl QualityReport {
    /// True when the report shows no contract violations.
    pub fn is_clean(&self) -> bool {
        self.nulls.empty_region == 0 && self.nulls.empty_income_level == 0
    }
}

/// Build a quality report from an assembled mart set.
pub fn build_quality_report(marts: &Marts) -> QualityReport {
    let facts = &marts.fact_sdg_progress;

    let countries: BTreeSet<&str> = facts.iter().map(|f| f.country_code.as_str()).collect();
    let goals: BTreeSet<&str> = facts.iter().map(|f| f.goal_code.as_str()).collect();
    let years: BTreeSet<i32> = facts.iter().map(|f| f.year).collect();

    let mut by_goal: BTreeMap<(u32, String), usize> = BTreeMap::new();
    let mut by_region: HashMap<String, usize> = HashMap::new();
    let mut nulls = NullCheck::default();

    for fact in facts {
        let goal_key = (
            fact.goal_code.parse::<u32>().unwrap_or(u32::MAX),
            fact.goal_code.clone(),
        );
        *by_goal.entry(goal_key).or_default() += 1;
        *by_region.entry(fact.region.clone()).or_default() += 1;

        if fact.region.trim().is_empty() {
            nulls.empty_region += 1;
        }
        if fact.income_level.trim().is_empty() {
            nulls.empty_income_level += 1;
        }
        if fact.yoy_change.is_none() {
            nulls.null_yoy += 1;
        }
    }

    let mut by_region: Vec<(String, usize)> = by_region.into_iter().collect();
    by_region.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let econ = &marts.fact_economic_indicators;
    let economic_coverage = vec![
        (WB_INDICATORS[0].1, econ.iter().filter(|e| e.gdp_per_capita.is_some()).count()),
        (WB_INDICATORS[1].1, econ.iter().filter(|e| e.population.is_some()).count()),
        (WB_INDICATORS[2].1, econ.iter().filter(|e| e.life_expectancy.is_some()).count()),
        (WB_INDICATORS[3].1, econ.iter().filter(|e| e.adult_literacy_rate.is_some()).count()),
    ];

    QualityReport {
        table_counts: marts.row_counts(),
        coverage: FactCoverage {
            countries: countries.len(),
            goals: goals.len(),
            years: years.len(),
            min_year: years.iter().next().copied(),
            max_year: years.iter().next_back().copied(),
        },
        by_goal: by_goal.into_iter().map(|((_, code), n)| (code, n)).collect(),
        by_region,
        economic_coverage,
        nulls,
    }
}

/// Render a report through the run log channel.
pub fn log_report(report: &QualityReport) {
    log_info("Mart table row counts:");
    for (table, count) in &report.table_counts {
        log_success(format!("{table}: {count} rows"));
    }

    log_info("Fact coverage:");
    log_info(format!("Countries with data: {}", report.coverage.countries));
    log_info(format!("Goals tracked: {}", report.coverage.goals));
    if let (Some(min), Some(max)) = (report.coverage.min_year, report.coverage.max_year) {
        log_info(format!(
            "Years covered: {} ({min} - {max})",
            report.coverage.years
        ));
    }

    log_info("Data points by goal:");
    for (goal, count) in &report.by_goal {
        log_info(format!("Goal {goal:>2}: {count} records"));
    }

    log_info("Data points by region:");
    for (region, count) in &report.by_region {
        log_info(format!("{region}: {count} records"));
    }

    log_info("Economic indicator coverage:");
    for (indicator, count) in &report.economic_coverage {
        log_info(format!("{indicator}: {count} country-years"));
    }

    if report.is_clean() {
        log_success("Sentinel contract holds: no empty classifications");
    } else {
        log_warning(format!(
            "Empty classifications found: {} region, {} income level",
            report.nulls.empty_region, report.nulls.empty_income_level
        ));
    }
    log_info(format!(
        "Facts without a predecessor year: {}",
        report.nulls.null_yoy
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProgressFact;

    fn fact(country: &str, goal: &str, year: i32, region: &str, yoy: Option<f64>) -> ProgressFact {
        ProgressFact {
            progress_id: format!("{country}_{goal}_{year}"),
            country_code: country.into(),
            country_name: format!("Country {country}"),
            goal_code: goal.into(),
            year,
            region: region.into(),
            income_level: "High income".into(),
            indicators_measured: 1,
            avg_indicator_value: 1.0,
            min_indicator_value: 1.0,
            max_indicator_value: 1.0,
            prev_year_avg: yoy.map(|_| 1.0),
            yoy_change: yoy,
        }
    }

    fn marts_with(facts: Vec<ProgressFact>) -> Marts {
        Marts {
            dim_countries: vec![],
            dim_goals: vec![],
            dim_time: vec![],
            fact_sdg_progress: facts,
            fact_economic_indicators: vec![],
        }
    }

    #[test]
    fn test_coverage_and_distribution() {
        let marts = marts_with(vec![
            fact("76", "3", 2019, "Latin America & Caribbean", None),
            fact("76", "3", 2020, "Latin America & Caribbean", Some(0.5)),
            fact("356", "17", 2020, "South Asia", None),
        ]);

        let report = build_quality_report(&marts);

        assert_eq!(report.coverage.countries, 2);
        assert_eq!(report.coverage.goals, 2);
        assert_eq!(report.coverage.min_year, Some(2019));
        assert_eq!(report.coverage.max_year, Some(2020));

        // Goals numerically ordered, regions ordered by volume.
        assert_eq!(report.by_goal, vec![("3".into(), 2), ("17".into(), 1)]);
        assert_eq!(report.by_region[0].0, "Latin America & Caribbean");

        assert_eq!(report.nulls.null_yoy, 2);
        assert!(report.is_clean());

        assert_eq!(report.economic_coverage[0], ("GDP per capita", 0));
    }

    #[test]
    fn test_economic_coverage_counts_present_cells() {
        let mut marts = marts_with(vec![]);
        marts.fact_economic_indicators.push(crate::models::EconomicYearRecord {
            country_code: "76".into(),
            year: 2020,
            gdp_per_capita: Some(8900.0),
            population: Some(212_000_000.0),
            life_expectancy: None,
            adult_literacy_rate: None,
        });

        let report = build_quality_report(&marts);
        assert_eq!(report.economic_coverage[0], ("GDP per capita", 1));
        assert_eq!(report.economic_coverage[2], ("Life expectancy", 0));
    }

    #[test]
    fn test_empty_classification_flagged() {
        let marts = marts_with(vec![fact("76", "3", 2020, "", None)]);
        let report = build_quality_report(&marts);

        assert_eq!(report.nulls.empty_region, 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_empty_fact_table() {
        let report = build_quality_report(&marts_with(vec![]));
        assert_eq!(report.coverage.countries, 0);
        assert_eq!(report.coverage.min_year, None);
        assert!(report.is_clean());
    }
}
