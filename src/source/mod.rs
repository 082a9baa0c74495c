//! Raw source table loading.
//!
//! The extraction layer (out of scope here) drops four bulk CSV tables into
//! a data directory: `sdg_goals`, `sdg_indicator_data`, `wb_countries`,
//! `wb_indicators`. This module reads them into untyped JSON rows keyed by
//! header, auto-detecting encoding and delimiter per file. No SDG-specific
//! logic here; typing and cleaning happen in [`crate::staging`].

use serde_json::{json, Map, Value};
use std::path::Path;

use crate::error::{SourceError, SourceResult};

/// File stems of the four raw tables expected in the data directory.
pub const RAW_TABLE_NAMES: [&str; 4] = [
    "sdg_goals",
    "sdg_indicator_data",
    "wb_countries",
    "wb_indicators",
];

/// One loaded raw table with parsing metadata.
#[derive(Debug, Clone)]
pub struct RawTable {
    /// Table name (file stem).
    pub name: String,
    /// Parsed rows as JSON objects keyed by header.
    pub records: Vec<Value>,
    /// Detected encoding.
    pub encoding: String,
    /// Detected delimiter.
    pub delimiter: char,
    /// Column headers.
    pub headers: Vec<String>,
}

/// The four raw tables consumed by one pipeline run.
#[derive(Debug, Clone)]
pub struct RawTables {
    pub sdg_goals: RawTable,
    pub sdg_indicator_data: RawTable,
    pub wb_countries: RawTable,
    pub wb_indicators: RawTable,
}

impl RawTables {
    /// Total row count across all four tables.
    pub fn total_rows(&self) -> usize {
        self.sdg_goals.records.len()
            + self.sdg_indicator_data.records.len()
            + self.wb_countries.records.len()
            + self.wb_indicators.records.len()
    }
}

/// Load all four raw tables from `<dir>/<name>.csv`.
///
/// A missing file is a hard error: the pipeline is full-refresh and cannot
/// produce a consistent mart set from a partial source drop.
pub fn load_raw_tables(dir: &Path) -> SourceResult<RawTables> {
    let load = |name: &str| -> SourceResult<RawTable> {
        let path = dir.join(format!("{name}.csv"));
        if !path.exists() {
            return Err(SourceError::MissingTable(name.to_string()));
        }
        load_table(&path, name)
    };

    Ok(RawTables {
        sdg_goals: load("sdg_goals")?,
        sdg_indicator_data: load("sdg_indicator_data")?,
        wb_countries: load("wb_countries")?,
        wb_indicators: load("wb_indicators")?,
    })
}

/// Load a single raw table file with encoding and delimiter auto-detection.
pub fn load_table(path: &Path, name: &str) -> SourceResult<RawTable> {
    let bytes = std::fs::read(path)?;
    parse_table_bytes(&bytes, name)
}

/// Parse raw CSV bytes into a [`RawTable`], auto-detecting encoding and
/// delimiter.
pub fn parse_table_bytes(bytes: &[u8], name: &str) -> SourceResult<RawTable> {
    if bytes.is_empty() {
        return Err(SourceError::EmptyTable(name.to_string()));
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);

    let mut lines = content.lines();

    let header_line = lines
        .next()
        .ok_or_else(|| SourceError::EmptyTable(name.to_string()))?;

    let headers: Vec<String> = header_line
        .split(delimiter)
        .map(|s| s.trim().trim_matches('"').to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(SourceError::NoHeaders(name.to_string()));
    }

    let mut records = Vec::new();

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }

        let values: Vec<&str> = line.split(delimiter).collect();
        let mut obj = Map::new();

        for (i, header) in headers.iter().enumerate() {
            let raw_value = values
                .get(i)
                .map(|s| s.trim().trim_matches('"'))
                .unwrap_or("");

            obj.insert(header.clone(), json!(raw_value));
        }

        records.push(Value::Object(obj));
    }

    Ok(RawTable {
        name: name.to_string(),
        records,
        encoding,
        delimiter,
        headers,
    })
}

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
pub fn decode_content(bytes: &[u8], encoding: &str) -> SourceResult<String> {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8(bytes.to_vec())
            .unwrap_or_else(|_| String::from_utf8_lossy(bytes).to_string()),
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.to_string()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.to_string(),
        // Fallback: UTF-8 with lossy conversion
        _ => String::from_utf8_lossy(bytes).to_string(),
    };
    Ok(decoded)
}

/// Detect the delimiter by counting occurrences in the header line.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_table() {
        let csv = "goal_code,goal_title\n1,No Poverty\n2,Zero Hunger";
        let table = parse_table_bytes(csv.as_bytes(), "sdg_goals").unwrap();

        assert_eq!(table.delimiter, ',');
        assert_eq!(table.records.len(), 2);
        assert_eq!(table.records[0]["goal_code"], "1");
        assert_eq!(table.records[1]["goal_title"], "Zero Hunger");
        assert_eq!(table.headers, vec!["goal_code", "goal_title"]);
    }

    #[test]
    fn test_semicolon_delimiter() {
        let csv = "a;b;c\n1;2;3";
        let table = parse_table_bytes(csv.as_bytes(), "t").unwrap();
        assert_eq!(table.delimiter, ';');
        assert_eq!(table.records[0]["b"], "2");
    }

    #[test]
    fn test_quoted_values() {
        let csv = "country_code,country_name\n\"76\",\"Brazil\"";
        let table = parse_table_bytes(csv.as_bytes(), "t").unwrap();
        assert_eq!(table.records[0]["country_name"], "Brazil");
    }

    #[test]
    fn test_empty_lines_skipped() {
        let csv = "a,b\n1,2\n\n3,4\n";
        let table = parse_table_bytes(csv.as_bytes(), "t").unwrap();
        assert_eq!(table.records.len(), 2);
    }

    #[test]
    fn test_missing_values_become_empty() {
        let csv = "a,b,c\n1,,3";
        let table = parse_table_bytes(csv.as_bytes(), "t").unwrap();
        assert_eq!(table.records[0]["b"], "");
    }

    #[test]
    fn test_empty_table_error() {
        let result = parse_table_bytes(b"", "wb_countries");
        assert!(matches!(result, Err(SourceError::EmptyTable(_))));
    }

    #[test]
    fn test_latin1_decoding() {
        // "Côte" in ISO-8859-1
        let bytes: &[u8] = &[0x43, 0xF4, 0x74, 0x65];
        let decoded = decode_content(bytes, "iso-8859-1").unwrap();
        assert!(decoded.starts_with('C'));
        assert!(decoded.ends_with("te"));
    }

    #[test]
    fn test_load_raw_tables_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_raw_tables(dir.path());
        assert!(matches!(result, Err(SourceError::MissingTable(_))));
    }

    #[test]
    fn test_load_raw_tables_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        for name in RAW_TABLE_NAMES {
            std::fs::write(dir.path().join(format!("{name}.csv")), "a,b\n1,2\n").unwrap();
        }

        let tables = load_raw_tables(dir.path()).unwrap();
        assert_eq!(tables.total_rows(), 4);
        assert_eq!(tables.wb_indicators.records[0]["a"], "1");
    }
}
