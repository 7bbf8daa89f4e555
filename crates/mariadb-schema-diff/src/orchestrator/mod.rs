//! Comparison orchestrator - main workflow coordinator.
//!
//! Runs the pipeline end to end: snapshot both schemas, diff, build the
//! forward and rollback plans, render, and only then write the output files.
//! Nothing is written until every artifact is fully built, so a failure or
//! cancellation mid-run never leaves partial SQL on disk.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;
use crate::diff::diff_snapshots;
use crate::error::{DiffError, Result};
use crate::introspect::Introspector;
use crate::plan::{forward_plan, reverse_plan};
use crate::render::{render_script, ScriptMeta};
use crate::report::comparison_report;

/// Comparison orchestrator.
pub struct Orchestrator {
    config: Config,
}

/// Result of a comparison run.
#[derive(Debug, Clone, Serialize)]
pub struct CompareResult {
    /// Source schema name.
    pub source_schema: String,

    /// Destination schema name.
    pub dest_schema: String,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run completed.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Number of create/drop/modify operations across all object kinds.
    pub operation_count: usize,

    /// Executable statements in the forward plan.
    pub forward_statements: usize,

    /// Executable statements in the rollback plan.
    pub rollback_statements: usize,

    /// Path of the written migration script.
    pub migration_file: PathBuf,

    /// Path of the written rollback script.
    pub rollback_file: PathBuf,

    /// Path of the written comparison report.
    pub report_file: PathBuf,
}

impl CompareResult {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Result of a connectivity probe against both sides.
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheckResult {
    pub source_connected: bool,
    pub source_error: Option<String>,
    pub dest_connected: bool,
    pub dest_error: Option<String>,
    pub healthy: bool,
}

impl Orchestrator {
    /// Create a new orchestrator from a validated configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Probe both connections without taking snapshots.
    pub async fn health_check(&self) -> HealthCheckResult {
        let source_error = match Introspector::connect(&self.config.source).await {
            Ok(introspector) => {
                introspector.close().await;
                None
            }
            Err(e) => Some(e.to_string()),
        };
        let dest_error = match Introspector::connect(&self.config.dest).await {
            Ok(introspector) => {
                introspector.close().await;
                None
            }
            Err(e) => Some(e.to_string()),
        };

        HealthCheckResult {
            source_connected: source_error.is_none(),
            dest_connected: dest_error.is_none(),
            healthy: source_error.is_none() && dest_error.is_none(),
            source_error,
            dest_error,
        }
    }

    /// Run the full comparison pipeline and write the output files.
    pub async fn run(&self, cancel: CancellationToken) -> Result<CompareResult> {
        let started_at = Utc::now();

        // Both connections are probed before any introspection starts; a
        // failure on either side aborts the run with nothing written. Each
        // connection is owned by its introspector for the duration of one
        // snapshot and released before diffing begins.
        let source = Introspector::connect(&self.config.source).await?;
        let dest = Introspector::connect(&self.config.dest).await?;

        let source_snapshot = source.snapshot(&cancel).await?;
        source.close().await;
        let dest_snapshot = dest.snapshot(&cancel).await?;
        dest.close().await;

        if cancel.is_cancelled() {
            return Err(DiffError::Cancelled);
        }

        info!("Comparing schemas...");
        let diff = diff_snapshots(&source_snapshot, &dest_snapshot);
        info!(operations = diff.operation_count(), "schemas compared");

        let dest_schema = &self.config.dest.schema;
        let forward = forward_plan(&diff, &source_snapshot, dest_schema);
        let rollback = reverse_plan(&source_snapshot, &dest_snapshot, dest_schema);

        let generated_at = Utc::now();
        let migration_sql = render_script(
            &forward,
            &ScriptMeta {
                title: "Migration",
                source_schema: &self.config.source.schema,
                dest_schema,
                generated_at,
            },
        );
        let rollback_sql = render_script(
            &rollback,
            &ScriptMeta {
                title: "Rollback",
                source_schema: &self.config.source.schema,
                dest_schema,
                generated_at,
            },
        );
        let report = comparison_report(
            &diff,
            &self.config.source.schema,
            dest_schema,
            generated_at,
        );

        if cancel.is_cancelled() {
            return Err(DiffError::Cancelled);
        }

        let output = &self.config.output;
        std::fs::create_dir_all(&output.output_dir)?;
        let migration_file = output.output_dir.join(&output.migration_file);
        let rollback_file = output.output_dir.join(&output.rollback_file);
        let report_file = output.output_dir.join(&output.report_file);

        std::fs::write(&migration_file, &migration_sql)?;
        std::fs::write(&rollback_file, &rollback_sql)?;
        std::fs::write(&report_file, &report)?;

        info!(
            migration = %migration_file.display(),
            rollback = %rollback_file.display(),
            "wrote migration artifacts"
        );

        let completed_at = Utc::now();
        Ok(CompareResult {
            source_schema: self.config.source.schema.clone(),
            dest_schema: self.config.dest.schema.clone(),
            started_at,
            completed_at,
            duration_seconds: (completed_at - started_at).num_milliseconds() as f64 / 1000.0,
            operation_count: diff.operation_count(),
            forward_statements: forward.statement_count(),
            rollback_statements: rollback.statement_count(),
            migration_file,
            rollback_file,
            report_file,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_result_to_json() {
        let now = Utc::now();
        let result = CompareResult {
            source_schema: "src".to_string(),
            dest_schema: "dst".to_string(),
            started_at: now,
            completed_at: now,
            duration_seconds: 0.5,
            operation_count: 3,
            forward_statements: 4,
            rollback_statements: 4,
            migration_file: PathBuf::from("out/migration.sql"),
            rollback_file: PathBuf::from("out/rollback.sql"),
            report_file: PathBuf::from("out/comparison_report.txt"),
        };
        let json = result.to_json().unwrap();
        assert!(json.contains("\"operation_count\": 3"));
        assert!(json.contains("migration.sql"));
    }
}
