//! Economic pivot: long-format World Bank observations reshape into one
//! wide row per (country, year).
//!
//! Only four indicator codes participate; anything else in the feed is
//! ignored without comment. Duplicate reports for the same cell resolve by
//! maximum, so the pivot is deterministic regardless of input order.

use std::collections::{BTreeMap, HashMap};

use crate::models::EconomicYearRecord;
use crate::staging::EconomicObservation;

/// The four pivoted World Bank indicators, code → display name.
pub const WB_INDICATORS: [(&str, &str); 4] = [
    (GDP_PER_CAPITA, "GDP per capita"),
    (POPULATION, "Population"),
    (LIFE_EXPECTANCY, "Life expectancy"),
    (ADULT_LITERACY, "Adult literacy rate"),
];

pub const GDP_PER_CAPITA: &str = "NY.GDP.PCAP.CD";
pub const POPULATION: &str = "SP.POP.TOTL";
pub const LIFE_EXPECTANCY: &str = "SP.DYN.LE00.IN";
pub const ADULT_LITERACY: &str = "SE.ADT.LITR.ZS";

/// Wide cells under construction for one (country, year).
#[derive(Default)]
struct EconomicCells {
    gdp_per_capita: Option<f64>,
    population: Option<f64>,
    life_expectancy: Option<f64>,
    adult_literacy_rate: Option<f64>,
}

/// Duplicate cells keep the maximum reported value.
fn merge_max(cell: &mut Option<f64>, value: f64) {
    *cell = Some(match *cell {
        Some(existing) => existing.max(value),
        None => value,
    });
}

impl EconomicCells {
    fn set(&mut self, indicator_code: &str, value: f64) {
        match indicator_code {
            GDP_PER_CAPITA => merge_max(&mut self.gdp_per_capita, value),
            POPULATION => merge_max(&mut self.population, value),
            LIFE_EXPECTANCY => merge_max(&mut self.life_expectancy, value),
            ADULT_LITERACY => merge_max(&mut self.adult_literacy_rate, value),
            // Not part of the pivoted set.
            _ => {}
        }
    }

    fn build(self, country_code: String, year: i32) -> EconomicYearRecord {
        EconomicYearRecord {
            country_code,
            year,
            gdp_per_capita: self.gdp_per_capita,
            population: self.population,
            life_expectancy: self.life_expectancy,
            adult_literacy_rate: self.adult_literacy_rate,
        }
    }
}

/// Pivot economic observations into wide yearly records keyed by canonical
/// country code.
///
/// `wb_code_map` is the normalizer's WB → canonical association. Rows whose
/// WB code has no canonical counterpart are dropped: the economic fact table
/// must join `dim_countries` and `fact_sdg_progress` on `(country_code,
/// year)`, and a row outside the canonical vocabulary could never join.
pub fn pivot_economic_indicators(
    observations: &[EconomicObservation],
    wb_code_map: &HashMap<String, String>,
) -> Vec<EconomicYearRecord> {
    let mut cells: BTreeMap<((u32, String), i32), EconomicCells> = BTreeMap::new();

    for obs in observations {
        let Some(canonical) = wb_code_map.get(&obs.wb_country_code) else {
            continue;
        };
        let key = (
            (canonical.parse::<u32>().unwrap_or(u32::MAX), canonical.clone()),
            obs.year,
        );
        cells
            .entry(key)
            .or_default()
            .set(&obs.indicator_code, obs.value);
    }

    cells
        .into_iter()
        .map(|(((_, country), year), cells)| cells.build(country, year))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(country: &str, indicator: &str, year: i32, value: f64) -> EconomicObservation {
        EconomicObservation {
            wb_country_code: country.into(),
            indicator_code: indicator.into(),
            year,
            value,
        }
    }

    fn bra_map() -> HashMap<String, String> {
        HashMap::from([("BRA".to_string(), "76".to_string())])
    }

    #[test]
    fn test_pivot_wide_row() {
        let observations = vec![
            obs("BRA", GDP_PER_CAPITA, 2020, 8900.0),
            obs("BRA", POPULATION, 2020, 212_000_000.0),
            obs("BRA", LIFE_EXPECTANCY, 2020, 75.9),
        ];

        let records = pivot_economic_indicators(&observations, &bra_map());

        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.country_code, "76");
        assert_eq!(r.gdp_per_capita, Some(8900.0));
        assert_eq!(r.population, Some(212_000_000.0));
        assert_eq!(r.life_expectancy, Some(75.9));
        assert_eq!(r.adult_literacy_rate, None);
    }

    #[test]
    fn test_duplicate_cell_resolves_to_max() {
        let observations = vec![
            obs("BRA", GDP_PER_CAPITA, 2020, 5.0),
            obs("BRA", GDP_PER_CAPITA, 2020, 9.0),
        ];
        let records = pivot_economic_indicators(&observations, &bra_map());
        assert_eq!(records[0].gdp_per_capita, Some(9.0));

        // Same result with the duplicates reversed.
        let reversed = vec![
            obs("BRA", GDP_PER_CAPITA, 2020, 9.0),
            obs("BRA", GDP_PER_CAPITA, 2020, 5.0),
        ];
        assert_eq!(pivot_economic_indicators(&reversed, &bra_map()), records);
    }

    #[test]
    fn test_unknown_indicator_codes_ignored() {
        let observations = vec![
            obs("BRA", "EN.ATM.CO2E.PC", 2020, 2.2),
            obs("BRA", POPULATION, 2020, 1.0),
        ];
        let records = pivot_economic_indicators(&observations, &bra_map());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].population, Some(1.0));
        assert_eq!(records[0].gdp_per_capita, None);
    }

    #[test]
    fn test_unmapped_wb_code_dropped() {
        let observations = vec![obs("FRA", POPULATION, 2020, 67_000_000.0)];
        let records = pivot_economic_indicators(&observations, &bra_map());
        assert!(records.is_empty());
    }

    #[test]
    fn test_rows_split_by_year() {
        let observations = vec![
            obs("BRA", POPULATION, 2019, 1.0),
            obs("BRA", POPULATION, 2020, 2.0),
        ];
        let records = pivot_economic_indicators(&observations, &bra_map());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].year, 2019);
        assert_eq!(records[1].year, 2020);
    }
}
