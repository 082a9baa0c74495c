//! JSON Schema validation of assembled mart rows.
//!
//! Each mart table has a draft-7 schema embedded at compile time from the
//! `schemas/` directory. Validation runs after assembly and before any
//! write: a schema violation at this point means the transformation built
//! something structurally wrong, so the run fails with nothing written.
//!
//! The schemas also double as documentation of the mart contract for the
//! downstream dashboard and ML consumers.

use serde::Serialize;
use serde_json::Value;

use crate::error::{ValidationError, ValidationResult};
use crate::mart::Marts;

/// Validate a JSON object against a JSON schema.
///
/// Returns `Ok(())` when valid, otherwise every violation message.
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator.iter_errors(data).map(|e| e.to_string()).collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Boolean-only variant of [`validate`].
pub fn is_valid(schema: &Value, data: &Value) -> bool {
    jsonschema::draft7::is_valid(schema, data)
}

/// Validate every row of every mart table against its embedded schema.
///
/// Reports at most five violations per table; one is already fatal.
pub fn validate_marts(marts: &Marts) -> ValidationResult<()> {
    validate_table(
        "dim_countries",
        include_str!("../../schemas/dim-countries.json"),
        &marts.dim_countries,
    )?;
    validate_table(
        "dim_goals",
        include_str!("../../schemas/dim-goals.json"),
        &marts.dim_goals,
    )?;
    validate_table(
        "dim_time",
        include_str!("../../schemas/dim-time.json"),
        &marts.dim_time,
    )?;
    validate_table(
        "fact_sdg_progress",
        include_str!("../../schemas/fact-sdg-progress.json"),
        &marts.fact_sdg_progress,
    )?;
    validate_table(
        "fact_economic_indicators",
        include_str!("../../schemas/fact-economic-indicators.json"),
        &marts.fact_economic_indicators,
    )?;
    Ok(())
}

fn validate_table<T: Serialize>(
    table: &str,
    schema_src: &str,
    rows: &[T],
) -> ValidationResult<()> {
    let schema: Value =
        serde_json::from_str(schema_src).map_err(|e| ValidationError::BadSchema {
            table: table.into(),
            message: e.to_string(),
        })?;

    let validator = jsonschema::draft7::new(&schema).map_err(|e| ValidationError::BadSchema {
        table: table.into(),
        message: e.to_string(),
    })?;

    let mut errors = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        let value = serde_json::to_value(row).map_err(|e| ValidationError::BadSchema {
            table: table.into(),
            message: e.to_string(),
        })?;

        for err in validator.iter_errors(&value) {
            errors.push(format!("row {i}: {err}"));
        }
        if errors.len() >= 5 {
            break;
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::SchemaError {
            table: table.into(),
            errors,
        })
    }
}
