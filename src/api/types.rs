//! REST API types for run monitoring clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::transform::pipeline::PipelineRun;

/// Response sent after a triggered pipeline run completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResponse {
    /// Run identifier
    pub run_id: String,

    /// Status: "complete" or "error"
    pub status: String,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Row counts of the written mart tables
    pub tables: Vec<TableCount>,

    /// Metadata about the transformation
    pub metadata: RunMetadata,
}

/// Row count of one mart table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCount {
    pub table: String,
    pub rows: usize,
}

/// Metadata about the transformation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMetadata {
    /// Raw rows read across the four source tables
    pub raw_rows: usize,

    /// Observations that survived staging
    pub clean_observations: usize,

    /// Malformed indicator rows silently excluded
    pub dropped_rows: usize,

    /// Country resolution outcome
    pub resolution: ResolutionSummary,
}

/// How the observed country identifiers resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionSummary {
    pub by_code: usize,
    pub by_name: usize,
    pub by_override: usize,
    pub unresolved: usize,
}

impl From<&PipelineRun> for RunResponse {
    fn from(run: &PipelineRun) -> Self {
        RunResponse {
            run_id: run.run_id.clone(),
            status: "complete".to_string(),
            started_at: run.started_at,
            finished_at: run.finished_at,
            tables: run
                .marts
                .row_counts()
                .into_iter()
                .map(|(table, rows)| TableCount {
                    table: table.to_string(),
                    rows,
                })
                .collect(),
            metadata: RunMetadata {
                raw_rows: run.raw_rows,
                clean_observations: run.clean_observations,
                dropped_rows: run.dropped.total(),
                resolution: ResolutionSummary {
                    by_code: run.resolution.by_code,
                    by_name: run.resolution.by_name,
                    by_override: run.resolution.by_override,
                    unresolved: run.resolution.unresolved,
                },
            },
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "runId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "tables": [],
    })
}
