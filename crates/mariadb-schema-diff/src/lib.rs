//! # mariadb-schema-diff
//!
//! Compares the DDL of two MariaDB/MySQL schemas and generates a pair of
//! SQL artifacts: a **forward migration** that transforms the destination
//! into structural equivalence with the source, and a **rollback** that
//! restores the destination to its original state.
//!
//! The pipeline is strictly sequential:
//!
//! ```text
//! snapshot(source), snapshot(dest) -> diff -> forward plan -> migration.sql
//!                                          -> reverse plan -> rollback.sql
//! ```
//!
//! Snapshots capture the `CREATE ...` text of every object at introspection
//! time, which is what makes rollback possible: objects dropped by the
//! forward plan are recreated from the destination snapshot's captured DDL.
//! The generated SQL is a deterministic function of the two snapshots.
//!
//! ## Example
//!
//! ```rust,no_run
//! use mariadb_schema_diff::{Config, Orchestrator};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> mariadb_schema_diff::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let orchestrator = Orchestrator::new(config);
//!     let result = orchestrator.run(CancellationToken::new()).await?;
//!     println!("{} operations planned", result.operation_count);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod diff;
pub mod error;
pub mod introspect;
pub mod parse;
pub mod plan;
pub mod render;
pub mod report;

mod orchestrator;

// Re-exports for convenient access
pub use crate::core::{ObjectKind, ObjectRecord, ObjectRef, Snapshot};
pub use config::{Config, ConnectionConfig, OutputConfig};
pub use diff::{diff_snapshots, Diff, KindDiff, TableChange, TableDelta};
pub use error::{DiffError, Result};
pub use introspect::Introspector;
pub use orchestrator::{CompareResult, HealthCheckResult, Orchestrator};
pub use plan::{forward_plan, reverse_plan, Plan};
pub use render::{render_script, ScriptMeta};
pub use report::comparison_report;
