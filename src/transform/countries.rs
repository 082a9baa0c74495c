//! Reference normalization: one canonical country record per identifier
//! observed in indicator data.
//!
//! The UN indicator feed and the World Bank reference table use disjoint
//! vocabularies (numeric geo area codes vs. ISO-style codes, and names that
//! rarely agree on official forms). Resolution runs through an ordered chain
//! of strategies, each returning a match or nothing:
//!
//! 1. World Bank row with exactly the same code
//! 2. World Bank row with exactly the same name
//! 3. Manual override table, by name, classification only
//!
//! First hit wins. A country that falls through every tier is still emitted,
//! with [`UNKNOWN`] classification: observational data decides which
//! countries exist; reference data only enriches.

use std::collections::{BTreeMap, HashMap};

use crate::models::{CountryRecord, UNKNOWN};
use crate::staging::{CleanObservation, WbCountry};

// =============================================================================
// Manual Overrides
// =============================================================================

/// A manual classification for a country name known to fail automatic
/// matching. Supplies region and income level only; geographic coordinates
/// are never taken from overrides.
#[derive(Debug, Clone, Copy)]
pub struct ManualOverride {
    pub name: &'static str,
    pub region: &'static str,
    pub income_level: &'static str,
}

/// UN official names with no exact World Bank counterpart.
///
/// Order matters: when a name is listed more than once, the first entry wins.
pub const MANUAL_OVERRIDES: &[ManualOverride] = &[
    ManualOverride { name: "United States of America", region: "North America", income_level: "High income" },
    ManualOverride { name: "United Kingdom of Great Britain and Northern Ireland", region: "Europe & Central Asia", income_level: "High income" },
    ManualOverride { name: "Russian Federation", region: "Europe & Central Asia", income_level: "Upper middle income" },
    ManualOverride { name: "Republic of Korea", region: "East Asia & Pacific", income_level: "High income" },
    ManualOverride { name: "Democratic People's Republic of Korea", region: "East Asia & Pacific", income_level: "Low income" },
    ManualOverride { name: "Iran (Islamic Republic of)", region: "Middle East & North Africa", income_level: "Lower middle income" },
    ManualOverride { name: "Venezuela (Bolivarian Republic of)", region: "Latin America & Caribbean", income_level: "Lower middle income" },
    ManualOverride { name: "Bolivia (Plurinational State of)", region: "Latin America & Caribbean", income_level: "Lower middle income" },
    ManualOverride { name: "United Republic of Tanzania", region: "Sub-Saharan Africa", income_level: "Lower middle income" },
    ManualOverride { name: "Viet Nam", region: "East Asia & Pacific", income_level: "Lower middle income" },
    ManualOverride { name: "Lao People's Democratic Republic", region: "East Asia & Pacific", income_level: "Lower middle income" },
    ManualOverride { name: "Syrian Arab Republic", region: "Middle East & North Africa", income_level: "Low income" },
    ManualOverride { name: "Republic of Moldova", region: "Europe & Central Asia", income_level: "Upper middle income" },
    ManualOverride { name: "Democratic Republic of the Congo", region: "Sub-Saharan Africa", income_level: "Low income" },
    ManualOverride { name: "Congo", region: "Sub-Saharan Africa", income_level: "Lower middle income" },
    ManualOverride { name: "Côte d'Ivoire", region: "Sub-Saharan Africa", income_level: "Lower middle income" },
    ManualOverride { name: "Micronesia (Federated States of)", region: "East Asia & Pacific", income_level: "Lower middle income" },
    ManualOverride { name: "State of Palestine", region: "Middle East & North Africa", income_level: "Lower middle income" },
    ManualOverride { name: "Türkiye", region: "Europe & Central Asia", income_level: "Upper middle income" },
];

// =============================================================================
// Resolver Strategies
// =============================================================================

/// What a resolution tier contributes to the country record.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub region: String,
    pub income_level: String,
    pub capital_city: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    /// World Bank code of the matched reference row, when one exists.
    pub wb_code: Option<String>,
}

/// One tier of the resolution chain: a match, or nothing.
pub trait ResolverStrategy {
    /// Strategy name for run logs.
    fn name(&self) -> &'static str;

    fn resolve(&self, code: &str, name: &str) -> Option<Resolution>;
}

fn wb_resolution(wb: &WbCountry) -> Resolution {
    Resolution {
        region: classify(&wb.region),
        income_level: classify(&wb.income_level),
        capital_city: wb.capital_city.clone(),
        longitude: wb.longitude,
        latitude: wb.latitude,
        wb_code: Some(wb.country_code.clone()),
    }
}

/// Tier 1: exact code equality against the World Bank table.
pub struct WbCodeMatch {
    by_code: HashMap<String, WbCountry>,
}

impl WbCodeMatch {
    pub fn new(wb: &[WbCountry]) -> Self {
        let mut by_code = HashMap::new();
        for country in wb {
            by_code
                .entry(country.country_code.clone())
                .or_insert_with(|| country.clone());
        }
        Self { by_code }
    }
}

impl ResolverStrategy for WbCodeMatch {
    fn name(&self) -> &'static str {
        "wb-code"
    }

    fn resolve(&self, code: &str, _name: &str) -> Option<Resolution> {
        self.by_code.get(code).map(wb_resolution)
    }
}

/// Tier 2: exact name equality against the World Bank table.
pub struct WbNameMatch {
    by_name: HashMap<String, WbCountry>,
}

impl WbNameMatch {
    pub fn new(wb: &[WbCountry]) -> Self {
        let mut by_name = HashMap::new();
        for country in wb {
            by_name
                .entry(country.country_name.clone())
                .or_insert_with(|| country.clone());
        }
        Self { by_name }
    }
}

impl ResolverStrategy for WbNameMatch {
    fn name(&self) -> &'static str {
        "wb-name"
    }

    fn resolve(&self, _code: &str, name: &str) -> Option<Resolution> {
        self.by_name.get(name).map(wb_resolution)
    }
}

/// Tier 3: manual override table, by name. Classification only; never
/// coordinates, never a WB association.
pub struct OverrideMatch {
    by_name: HashMap<&'static str, &'static ManualOverride>,
}

impl OverrideMatch {
    pub fn new(table: &'static [ManualOverride]) -> Self {
        let mut by_name = HashMap::new();
        // First listed entry wins on duplicate names.
        for entry in table {
            by_name.entry(entry.name).or_insert(entry);
        }
        Self { by_name }
    }
}

impl ResolverStrategy for OverrideMatch {
    fn name(&self) -> &'static str {
        "manual-override"
    }

    fn resolve(&self, _code: &str, name: &str) -> Option<Resolution> {
        self.by_name.get(name).map(|entry| Resolution {
            region: entry.region.to_string(),
            income_level: entry.income_level.to_string(),
            capital_city: None,
            longitude: None,
            latitude: None,
            wb_code: None,
        })
    }
}

// =============================================================================
// Normalization
// =============================================================================

/// How many identifiers each tier resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionStats {
    pub by_code: usize,
    pub by_name: usize,
    pub by_override: usize,
    pub unresolved: usize,
}

/// Output of reference normalization.
#[derive(Debug, Clone)]
pub struct NormalizedCountries {
    /// One record per distinct observed identifier, ordered by code.
    pub records: Vec<CountryRecord>,
    /// World Bank code → canonical code, for every identifier that resolved
    /// against a WB row. Keys the economic facts into the canonical
    /// vocabulary.
    pub wb_code_map: HashMap<String, String>,
    pub stats: ResolutionStats,
}

impl NormalizedCountries {
    /// Lookup index over the records, by canonical code.
    pub fn by_code(&self) -> HashMap<&str, &CountryRecord> {
        self.records
            .iter()
            .map(|r| (r.country_code.as_str(), r))
            .collect()
    }
}

/// Empty classification strings become the sentinel; fact joins must never
/// see a null or empty region/income level.
fn classify(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        UNKNOWN.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Build the canonical country dimension from observed identifiers, the
/// World Bank reference table, and the manual override table.
///
/// Pure function of its three inputs. The observed identifier set is
/// authoritative: every distinct non-empty identifier produces exactly one
/// record, and WB rows never referenced by an observation contribute
/// nothing.
pub fn normalize_countries(
    observations: &[CleanObservation],
    wb_countries: &[WbCountry],
    overrides: &'static [ManualOverride],
) -> NormalizedCountries {
    // Distinct observed identifiers; first observed name wins, BTreeMap for
    // deterministic output order. Empty identifiers never produce a record.
    let mut observed: BTreeMap<String, String> = BTreeMap::new();
    for obs in observations {
        let code = obs.country_code.trim();
        if code.is_empty() {
            continue;
        }
        observed
            .entry(code.to_string())
            .or_insert_with(|| obs.country_name.trim().to_string());
    }

    let strategies: Vec<Box<dyn ResolverStrategy>> = vec![
        Box::new(WbCodeMatch::new(wb_countries)),
        Box::new(WbNameMatch::new(wb_countries)),
        Box::new(OverrideMatch::new(overrides)),
    ];

    let mut records = Vec::with_capacity(observed.len());
    let mut wb_code_map = HashMap::new();
    let mut stats = ResolutionStats::default();

    for (code, name) in &observed {
        let resolution = strategies
            .iter()
            .find_map(|s| s.resolve(code, name).map(|r| (s.name(), r)));

        let record = match resolution {
            Some((tier, res)) => {
                match tier {
                    "wb-code" => stats.by_code += 1,
                    "wb-name" => stats.by_name += 1,
                    _ => stats.by_override += 1,
                }
                if let Some(ref wb_code) = res.wb_code {
                    wb_code_map.insert(wb_code.clone(), code.clone());
                }
                CountryRecord {
                    country_code: code.clone(),
                    country_name: name.clone(),
                    region: res.region,
                    income_level: res.income_level,
                    capital_city: res.capital_city,
                    longitude: res.longitude,
                    latitude: res.latitude,
                }
            }
            None => {
                stats.unresolved += 1;
                CountryRecord {
                    country_code: code.clone(),
                    country_name: name.clone(),
                    region: UNKNOWN.to_string(),
                    income_level: UNKNOWN.to_string(),
                    capital_city: None,
                    longitude: None,
                    latitude: None,
                }
            }
        };

        records.push(record);
    }

    // Numeric-aware ordering: geo area codes are numeric strings.
    records.sort_by(|a, b| {
        let ka = (a.country_code.parse::<u32>().unwrap_or(u32::MAX), a.country_code.clone());
        let kb = (b.country_code.parse::<u32>().unwrap_or(u32::MAX), b.country_code.clone());
        ka.cmp(&kb)
    });

    NormalizedCountries {
        records,
        wb_code_map,
        stats,
    }
}
