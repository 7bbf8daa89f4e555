//! Snapshot comparison.
//!
//! For every object kind the names are partitioned into only-in-source,
//! only-in-dest, and in-both. Non-table objects in both schemas are compared
//! as whitespace-normalized DDL text; tables get a structural diff over their
//! parsed representations.

pub mod table;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::object::{ObjectKind, Snapshot};
use crate::parse::{normalized_eq, parse_create_table};

pub use table::{diff_tables, TableChange, TableDelta};

/// Name partition for one object kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindDiff {
    pub only_in_source: Vec<String>,
    pub only_in_dest: Vec<String>,
    pub in_both: Vec<String>,
    /// Subset of `in_both` whose definitions differ.
    pub changed: Vec<String>,
}

impl KindDiff {
    pub fn is_empty(&self) -> bool {
        self.only_in_source.is_empty() && self.only_in_dest.is_empty() && self.changed.is_empty()
    }

    /// Number of statements-worth of work for this kind.
    pub fn operation_count(&self) -> usize {
        self.only_in_source.len() + self.only_in_dest.len() + self.changed.len()
    }
}

/// Complete difference between two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diff {
    pub kinds: BTreeMap<ObjectKind, KindDiff>,
    /// Structural deltas for tables present on both sides, keyed by name.
    pub table_deltas: BTreeMap<String, TableDelta>,
    /// Tables present on both sides whose DDL differs but could not be
    /// parsed on at least one side. These receive a diagnostic comment in
    /// the plan instead of ALTER statements.
    pub opaque_tables: Vec<String>,
}

impl Diff {
    pub fn kind(&self, kind: ObjectKind) -> &KindDiff {
        static EMPTY: std::sync::OnceLock<KindDiff> = std::sync::OnceLock::new();
        self.kinds
            .get(&kind)
            .unwrap_or_else(|| EMPTY.get_or_init(KindDiff::default))
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.values().all(KindDiff::is_empty)
    }

    pub fn operation_count(&self) -> usize {
        self.kinds.values().map(KindDiff::operation_count).sum()
    }
}

/// Compare two snapshots. Pure and deterministic: the result depends only on
/// the snapshot contents, and every list it produces is sorted.
pub fn diff_snapshots(source: &Snapshot, dest: &Snapshot) -> Diff {
    let mut diff = Diff::default();

    for kind in ObjectKind::ALL {
        let mut kd = KindDiff::default();

        // Both sides are sorted by name, so a merge walk partitions them.
        let src = source.records(kind);
        let dst = dest.records(kind);
        let (mut i, mut j) = (0, 0);
        while i < src.len() || j < dst.len() {
            match (src.get(i), dst.get(j)) {
                (Some(s), Some(d)) => match s.name.cmp(&d.name) {
                    std::cmp::Ordering::Less => {
                        kd.only_in_source.push(s.name.clone());
                        i += 1;
                    }
                    std::cmp::Ordering::Greater => {
                        kd.only_in_dest.push(d.name.clone());
                        j += 1;
                    }
                    std::cmp::Ordering::Equal => {
                        kd.in_both.push(s.name.clone());
                        i += 1;
                        j += 1;
                    }
                },
                (Some(s), None) => {
                    kd.only_in_source.push(s.name.clone());
                    i += 1;
                }
                (None, Some(d)) => {
                    kd.only_in_dest.push(d.name.clone());
                    j += 1;
                }
                (None, None) => unreachable!(),
            }
        }

        for name in &kd.in_both {
            let src_ddl = source.ddl(kind, name).unwrap_or("");
            let dst_ddl = dest.ddl(kind, name).unwrap_or("");
            if src_ddl.is_empty() || dst_ddl.is_empty() {
                warn!(kind = %kind, name, "skipping comparison, DDL extraction failed on one side");
                continue;
            }

            if kind == ObjectKind::Table {
                match compare_tables(name, src_ddl, dst_ddl) {
                    TableComparison::Equal => {}
                    TableComparison::Delta(delta) => {
                        kd.changed.push(name.clone());
                        diff.table_deltas.insert(name.clone(), delta);
                    }
                    TableComparison::Opaque => {
                        kd.changed.push(name.clone());
                        diff.opaque_tables.push(name.clone());
                    }
                }
            } else if !normalized_eq(src_ddl, dst_ddl) {
                kd.changed.push(name.clone());
            }
        }

        debug!(
            kind = %kind,
            only_in_source = kd.only_in_source.len(),
            only_in_dest = kd.only_in_dest.len(),
            in_both = kd.in_both.len(),
            changed = kd.changed.len(),
            "compared object kind"
        );
        diff.kinds.insert(kind, kd);
    }

    diff
}

enum TableComparison {
    Equal,
    Delta(TableDelta),
    Opaque,
}

fn compare_tables(name: &str, src_ddl: &str, dst_ddl: &str) -> TableComparison {
    match (parse_create_table(src_ddl), parse_create_table(dst_ddl)) {
        (Ok(src_table), Ok(dst_table)) => match diff_tables(&src_table, &dst_table) {
            Some(delta) => TableComparison::Delta(delta),
            None => TableComparison::Equal,
        },
        (src_res, dst_res) => {
            // Treat the table as opaque text. Never fabricate DDL: if the
            // normalized text differs the plan only carries a diagnostic.
            if let Err(e) = &src_res {
                warn!(table = name, error = %e, "source CREATE TABLE did not parse");
            }
            if let Err(e) = &dst_res {
                warn!(table = name, error = %e, "destination CREATE TABLE did not parse");
            }
            if normalized_eq(src_ddl, dst_ddl) {
                TableComparison::Equal
            } else {
                TableComparison::Opaque
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::object::ObjectRecord;

    fn snapshot(schema: &str, objects: &[(ObjectKind, &str, &str)]) -> Snapshot {
        let mut snap = Snapshot::new(schema);
        for (kind, name, ddl) in objects {
            snap.add(*kind, ObjectRecord::new(*name, *ddl));
        }
        snap
    }

    #[test]
    fn test_partition_per_kind() {
        let source = snapshot(
            "src",
            &[
                (ObjectKind::Table, "a", "CREATE TABLE a (`id` int)"),
                (ObjectKind::Table, "b", "CREATE TABLE b (`id` int)"),
                (ObjectKind::View, "v1", "CREATE VIEW v1 AS SELECT 1"),
            ],
        );
        let dest = snapshot(
            "dst",
            &[
                (ObjectKind::Table, "b", "CREATE TABLE b (`id` int)"),
                (ObjectKind::Table, "c", "CREATE TABLE c (`id` int)"),
            ],
        );

        let diff = diff_snapshots(&source, &dest);
        let tables = diff.kind(ObjectKind::Table);
        assert_eq!(tables.only_in_source, vec!["a"]);
        assert_eq!(tables.only_in_dest, vec!["c"]);
        assert_eq!(tables.in_both, vec!["b"]);
        assert!(tables.changed.is_empty());

        let views = diff.kind(ObjectKind::View);
        assert_eq!(views.only_in_source, vec!["v1"]);
        assert!(diff.kind(ObjectKind::Sequence).is_empty());
    }

    #[test]
    fn test_identical_snapshots_are_empty_diff() {
        let objects = &[
            (ObjectKind::Table, "t", "CREATE TABLE t (`id` int)"),
            (
                ObjectKind::Procedure,
                "p",
                "CREATE PROCEDURE p() BEGIN SELECT 1; END",
            ),
        ][..];
        let diff = diff_snapshots(&snapshot("a", objects), &snapshot("b", objects));
        assert!(diff.is_empty());
        assert_eq!(diff.operation_count(), 0);
    }

    #[test]
    fn test_non_table_whitespace_difference_is_not_a_change() {
        let source = snapshot(
            "src",
            &[(
                ObjectKind::Procedure,
                "p",
                "CREATE PROCEDURE p()\nBEGIN\n  SELECT 1;\nEND",
            )],
        );
        let dest = snapshot(
            "dst",
            &[(
                ObjectKind::Procedure,
                "p",
                "CREATE PROCEDURE p() BEGIN SELECT 1; END",
            )],
        );
        assert!(diff_snapshots(&source, &dest).is_empty());
    }

    #[test]
    fn test_non_table_body_difference_is_a_change() {
        let source = snapshot(
            "src",
            &[(
                ObjectKind::Function,
                "f",
                "CREATE FUNCTION f() RETURNS int RETURN 2",
            )],
        );
        let dest = snapshot(
            "dst",
            &[(
                ObjectKind::Function,
                "f",
                "CREATE FUNCTION f() RETURNS int RETURN 1",
            )],
        );
        let diff = diff_snapshots(&source, &dest);
        assert_eq!(diff.kind(ObjectKind::Function).changed, vec!["f"]);
    }

    #[test]
    fn test_table_delta_is_computed_for_changed_tables() {
        let source = snapshot(
            "src",
            &[(
                ObjectKind::Table,
                "t",
                "CREATE TABLE t (`id` int NOT NULL, `a` int DEFAULT NULL, PRIMARY KEY (`id`))",
            )],
        );
        let dest = snapshot(
            "dst",
            &[(
                ObjectKind::Table,
                "t",
                "CREATE TABLE t (`id` int NOT NULL, PRIMARY KEY (`id`))",
            )],
        );
        let diff = diff_snapshots(&source, &dest);
        assert_eq!(diff.kind(ObjectKind::Table).changed, vec!["t"]);
        let delta = &diff.table_deltas["t"];
        assert_eq!(delta.changes.len(), 1);
    }

    #[test]
    fn test_empty_ddl_objects_are_skipped() {
        let source = snapshot("src", &[(ObjectKind::Table, "t", "")]);
        let dest = snapshot(
            "dst",
            &[(ObjectKind::Table, "t", "CREATE TABLE t (`id` int)")],
        );
        let diff = diff_snapshots(&source, &dest);
        assert!(diff.kind(ObjectKind::Table).changed.is_empty());
        assert!(diff.table_deltas.is_empty());
    }

    #[test]
    fn test_unparsable_tables_fall_back_to_text_comparison() {
        let source = snapshot(
            "src",
            &[(ObjectKind::Table, "t", "CREATE TABLE gibberish without parens A")],
        );
        let dest = snapshot(
            "dst",
            &[(ObjectKind::Table, "t", "CREATE TABLE gibberish without parens B")],
        );
        let diff = diff_snapshots(&source, &dest);
        assert_eq!(diff.opaque_tables, vec!["t"]);
        assert!(diff.table_deltas.is_empty());

        // Same text modulo whitespace: no change at all.
        let dest_same = snapshot(
            "dst",
            &[(
                ObjectKind::Table,
                "t",
                "CREATE  TABLE gibberish without\nparens A",
            )],
        );
        let diff = diff_snapshots(&source, &dest_same);
        assert!(diff.is_empty());
    }
}
