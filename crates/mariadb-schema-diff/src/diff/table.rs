//! Structural diff between two parsed tables.

use serde::{Deserialize, Serialize};

use crate::core::identifier::quote;
use crate::core::table::{Column, ForeignKey, Index, IndexKind, Table, TableOptionKey};

/// One atomic change to a table. Drop variants carry the destination-side
/// definition by value so the rollback plan can restore the object after the
/// snapshots are gone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TableChange {
    AddColumn {
        column: Column,
        /// Predecessor in the source declaration order; `None` means first.
        /// Absent entirely when the column is appended at the end.
        after: Option<String>,
    },
    DropColumn {
        name: String,
        column: Column,
    },
    ModifyColumn {
        name: String,
        old: Column,
        new: Column,
    },
    AddIndex {
        index: Index,
    },
    DropIndex {
        name: String,
        index: Index,
    },
    AddForeignKey {
        fk: ForeignKey,
    },
    DropForeignKey {
        name: String,
        fk: ForeignKey,
    },
    SetOption {
        key: TableOptionKey,
        old: Option<String>,
        new: Option<String>,
    },
}

impl TableChange {
    /// One-line description used in script comments and reports.
    pub fn describe(&self) -> String {
        match self {
            TableChange::AddColumn { column, .. } => {
                format!("Column ADDED: {} {}", quote(&column.name), column.sql_type)
            }
            TableChange::DropColumn { name, .. } => {
                format!("Column DROPPED: {}", quote(name))
            }
            TableChange::ModifyColumn { name, old, new } => format!(
                "Column MODIFIED: {} FROM {} TO {}",
                quote(name),
                old.definition(),
                new.definition()
            ),
            TableChange::AddIndex { index } => {
                format!("Index ADDED: {}", quote(&index.name))
            }
            TableChange::DropIndex { name, .. } => {
                format!("Index DROPPED: {}", quote(name))
            }
            TableChange::AddForeignKey { fk } => {
                format!("Foreign key ADDED: {}", quote(&fk.name))
            }
            TableChange::DropForeignKey { name, .. } => {
                format!("Foreign key DROPPED: {}", quote(name))
            }
            TableChange::SetOption { key, old, new } => format!(
                "Option {}: '{}' -> '{}'",
                key.label(),
                old.as_deref().unwrap_or(""),
                new.as_deref().unwrap_or("")
            ),
        }
    }

    /// One line of the consolidated per-table differences block, in the
    /// `+` (add) / `-` (drop) / `~` (modify) notation.
    pub fn report_line(&self) -> String {
        match self {
            TableChange::AddColumn { column, .. } => {
                format!("+ ADD COLUMN {} {}", quote(&column.name), column.sql_type)
            }
            TableChange::DropColumn { name, .. } => {
                format!("- DROP COLUMN {}", quote(name))
            }
            TableChange::ModifyColumn { name, old, new } => format!(
                "~ MODIFY COLUMN {}: {} -> {}",
                quote(name),
                old.sql_type,
                new.sql_type
            ),
            TableChange::AddIndex { index } => format!(
                "+ ADD {} {} ({})",
                index_report_label(index),
                quote(&index.name),
                index_column_names(index)
            ),
            TableChange::DropIndex { name, index } => {
                format!("- DROP {} {}", index_report_label(index), quote(name))
            }
            TableChange::AddForeignKey { fk } => format!(
                "+ ADD FOREIGN KEY {} ({}) -> {}({})",
                quote(&fk.name),
                fk.columns.join(", "),
                fk.ref_table,
                fk.ref_columns.join(", ")
            ),
            TableChange::DropForeignKey { name, .. } => {
                format!("- DROP FOREIGN KEY {}", quote(name))
            }
            TableChange::SetOption { key, old, new } => format!(
                "~ CHANGE {}: {} -> {}",
                key.label(),
                old.as_deref().unwrap_or(""),
                new.as_deref().unwrap_or("")
            ),
        }
    }
}

fn index_report_label(index: &Index) -> &'static str {
    match index.kind {
        IndexKind::Primary => "PRIMARY",
        IndexKind::Unique => "UNIQUE",
        IndexKind::Fulltext => "FULLTEXT",
        IndexKind::Key => "INDEX",
    }
}

fn index_column_names(index: &Index) -> String {
    index
        .columns
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Ordered list of atomic changes for one table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableDelta {
    pub changes: Vec<TableChange>,
}

impl TableDelta {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Consolidated human-readable summary of the delta, one `+`/`-`/`~`
    /// line per change. Emitted as a comment block above the table's ALTER
    /// statements and reused in reports.
    pub fn report_lines(&self, table: &str) -> Vec<String> {
        let mut lines = vec![format!("Table {} differences:", quote(table))];
        lines.extend(self.changes.iter().map(|c| format!("  {}", c.report_line())));
        lines
    }
}

/// Compute the delta transforming `dest` into `source`. Returns `None` when
/// the parsed tables are equal.
///
/// Change order inside the delta: column drops, column modifies, column adds,
/// index drops, index adds, foreign-key drops, foreign-key adds, option
/// changes. Drops and modifies are alphabetical; column adds keep the source
/// declaration order so every `AFTER` predecessor exists by the time its
/// statement runs. An index or foreign key changed in place appears as a
/// drop of the destination definition followed by an add of the source one.
pub fn diff_tables(source: &Table, dest: &Table) -> Option<TableDelta> {
    if source == dest {
        return None;
    }

    let mut changes = Vec::new();

    // Columns.
    let mut dropped: Vec<&Column> = dest
        .columns
        .iter()
        .filter(|c| source.column(&c.name).is_none())
        .collect();
    dropped.sort_by(|a, b| a.name.cmp(&b.name));
    for col in dropped {
        changes.push(TableChange::DropColumn {
            name: col.name.clone(),
            column: col.clone(),
        });
    }

    let mut modified: Vec<(&Column, &Column)> = source
        .columns
        .iter()
        .filter_map(|s| dest.column(&s.name).map(|d| (d, s)))
        .filter(|(d, s)| d != s)
        .collect();
    modified.sort_by(|a, b| a.1.name.cmp(&b.1.name));
    for (old, new) in modified {
        changes.push(TableChange::ModifyColumn {
            name: new.name.clone(),
            old: old.clone(),
            new: new.clone(),
        });
    }

    for (idx, col) in source.columns.iter().enumerate() {
        if dest.column(&col.name).is_some() {
            continue;
        }
        // No AFTER clause when the column lands at the end of the table or
        // has no predecessor.
        let after = if idx + 1 == source.columns.len() || idx == 0 {
            None
        } else {
            Some(source.columns[idx - 1].name.clone())
        };
        changes.push(TableChange::AddColumn {
            column: col.clone(),
            after,
        });
    }

    // Indexes.
    let mut index_drops: Vec<&Index> = dest
        .indexes
        .values()
        .filter(|d| match source.indexes.get(&d.name) {
            None => true,
            Some(s) => s != *d,
        })
        .collect();
    index_drops.sort_by(|a, b| a.name.cmp(&b.name));
    for index in index_drops {
        changes.push(TableChange::DropIndex {
            name: index.name.clone(),
            index: index.clone(),
        });
    }

    let mut index_adds: Vec<&Index> = source
        .indexes
        .values()
        .filter(|s| match dest.indexes.get(&s.name) {
            None => true,
            Some(d) => d != *s,
        })
        .collect();
    index_adds.sort_by(|a, b| a.name.cmp(&b.name));
    for index in index_adds {
        changes.push(TableChange::AddIndex {
            index: index.clone(),
        });
    }

    // Foreign keys.
    let mut fk_drops: Vec<&ForeignKey> = dest
        .foreign_keys
        .values()
        .filter(|d| match source.foreign_keys.get(&d.name) {
            None => true,
            Some(s) => s != *d,
        })
        .collect();
    fk_drops.sort_by(|a, b| a.name.cmp(&b.name));
    for fk in fk_drops {
        changes.push(TableChange::DropForeignKey {
            name: fk.name.clone(),
            fk: fk.clone(),
        });
    }

    let mut fk_adds: Vec<&ForeignKey> = source
        .foreign_keys
        .values()
        .filter(|s| match dest.foreign_keys.get(&s.name) {
            None => true,
            Some(d) => d != *s,
        })
        .collect();
    fk_adds.sort_by(|a, b| a.name.cmp(&b.name));
    for fk in fk_adds {
        changes.push(TableChange::AddForeignKey { fk: fk.clone() });
    }

    // Table options.
    for key in TableOptionKey::ALL {
        let old = dest.options.get(key);
        let new = source.options.get(key);
        if old != new {
            changes.push(TableChange::SetOption {
                key,
                old: old.map(str::to_string),
                new: new.map(str::to_string),
            });
        }
    }

    if changes.is_empty() {
        None
    } else {
        Some(TableDelta { changes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_create_table;

    fn parse(ddl: &str) -> Table {
        parse_create_table(ddl).unwrap()
    }

    #[test]
    fn test_equal_tables_produce_no_delta() {
        let a = parse("CREATE TABLE t (`id` int NOT NULL, PRIMARY KEY (`id`)) ENGINE=InnoDB");
        let b = parse("CREATE TABLE t (`id` int NOT NULL, PRIMARY KEY (`id`)) ENGINE=InnoDB");
        assert!(diff_tables(&a, &b).is_none());
    }

    #[test]
    fn test_add_column_carries_predecessor() {
        let source = parse("CREATE TABLE t (`id` int, `a` int, `b` int)");
        let dest = parse("CREATE TABLE t (`id` int, `b` int)");
        let delta = diff_tables(&source, &dest).unwrap();
        assert_eq!(delta.changes.len(), 1);
        match &delta.changes[0] {
            TableChange::AddColumn { column, after } => {
                assert_eq!(column.name, "a");
                assert_eq!(after.as_deref(), Some("id"));
            }
            other => panic!("unexpected change: {:?}", other),
        }
    }

    #[test]
    fn test_add_trailing_column_has_no_after() {
        let source = parse("CREATE TABLE t (`id` int, `a` int)");
        let dest = parse("CREATE TABLE t (`id` int)");
        let delta = diff_tables(&source, &dest).unwrap();
        match &delta.changes[0] {
            TableChange::AddColumn { after, .. } => assert!(after.is_none()),
            other => panic!("unexpected change: {:?}", other),
        }
    }

    #[test]
    fn test_drop_column_keeps_dest_definition() {
        let source = parse("CREATE TABLE t (`id` int)");
        let dest = parse("CREATE TABLE t (`id` int, `legacy` varchar(20))");
        let delta = diff_tables(&source, &dest).unwrap();
        match &delta.changes[0] {
            TableChange::DropColumn { name, column } => {
                assert_eq!(name, "legacy");
                assert_eq!(column.sql_type, "varchar(20)");
            }
            other => panic!("unexpected change: {:?}", other),
        }
    }

    #[test]
    fn test_modify_column_orders_old_dest_new_source() {
        let source = parse("CREATE TABLE t (`n` bigint NOT NULL)");
        let dest = parse("CREATE TABLE t (`n` int NOT NULL)");
        let delta = diff_tables(&source, &dest).unwrap();
        match &delta.changes[0] {
            TableChange::ModifyColumn { old, new, .. } => {
                assert_eq!(old.sql_type, "int");
                assert_eq!(new.sql_type, "bigint");
            }
            other => panic!("unexpected change: {:?}", other),
        }
    }

    #[test]
    fn test_changed_index_becomes_drop_then_add() {
        let source = parse("CREATE TABLE t (`a` int, `b` int, KEY `idx` (`a`,`b`))");
        let dest = parse("CREATE TABLE t (`a` int, `b` int, KEY `idx` (`a`))");
        let delta = diff_tables(&source, &dest).unwrap();
        assert_eq!(delta.changes.len(), 2);
        assert!(matches!(&delta.changes[0], TableChange::DropIndex { name, .. } if name == "idx"));
        assert!(
            matches!(&delta.changes[1], TableChange::AddIndex { index } if index.columns.len() == 2)
        );
    }

    #[test]
    fn test_index_differing_only_in_using_hint_is_changed() {
        let source = parse("CREATE TABLE t (`a` int, KEY `idx` (`a`) USING BTREE)");
        let dest = parse("CREATE TABLE t (`a` int, KEY `idx` (`a`))");
        let delta = diff_tables(&source, &dest).unwrap();
        assert_eq!(delta.changes.len(), 2);
    }

    #[test]
    fn test_fk_implicit_restrict_matches_explicit() {
        let source = parse(
            "CREATE TABLE t (`p` int, CONSTRAINT `fk` FOREIGN KEY (`p`) REFERENCES `x` (`id`) ON DELETE RESTRICT ON UPDATE RESTRICT)",
        );
        let dest =
            parse("CREATE TABLE t (`p` int, CONSTRAINT `fk` FOREIGN KEY (`p`) REFERENCES `x` (`id`))");
        assert!(diff_tables(&source, &dest).is_none());
    }

    #[test]
    fn test_option_only_differences() {
        for (src_opts, dst_opts, label) in [
            ("ENGINE=InnoDB", "ENGINE=MyISAM", "ENGINE"),
            ("DEFAULT CHARSET=utf8mb4", "DEFAULT CHARSET=latin1", "DEFAULT CHARSET"),
            ("COLLATE=utf8mb4_bin", "COLLATE=utf8mb4_general_ci", "COLLATE"),
            ("COMMENT='new'", "COMMENT='old'", "COMMENT"),
        ] {
            let source = parse(&format!("CREATE TABLE t (`id` int) {}", src_opts));
            let dest = parse(&format!("CREATE TABLE t (`id` int) {}", dst_opts));
            let delta = diff_tables(&source, &dest).unwrap();
            assert_eq!(delta.changes.len(), 1, "case {}", label);
            match &delta.changes[0] {
                TableChange::SetOption { key, .. } => assert_eq!(key.label(), label),
                other => panic!("unexpected change: {:?}", other),
            }
        }
    }

    #[test]
    fn test_auto_increment_only_difference_is_empty() {
        let source = parse("CREATE TABLE t (`id` int NOT NULL AUTO_INCREMENT, PRIMARY KEY (`id`)) AUTO_INCREMENT=10");
        let dest = parse("CREATE TABLE t (`id` int NOT NULL AUTO_INCREMENT, PRIMARY KEY (`id`)) AUTO_INCREMENT=9000");
        assert!(diff_tables(&source, &dest).is_none());
    }

    #[test]
    fn test_change_ordering_drops_then_modifies_then_adds() {
        let source = parse("CREATE TABLE t (`id` int, `kept` bigint, `added` int)");
        let dest = parse("CREATE TABLE t (`id` int, `kept` int, `gone` int)");
        let delta = diff_tables(&source, &dest).unwrap();
        let kinds: Vec<&str> = delta
            .changes
            .iter()
            .map(|c| match c {
                TableChange::DropColumn { .. } => "drop",
                TableChange::ModifyColumn { .. } => "modify",
                TableChange::AddColumn { .. } => "add",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, vec!["drop", "modify", "add"]);
    }

    #[test]
    fn test_report_lines_consolidated_block() {
        let source = parse(
            "CREATE TABLE t (`id` int, `kept` bigint, `added` int, KEY `idx_new` (`added`)) ENGINE=InnoDB",
        );
        let dest = parse(
            "CREATE TABLE t (`id` int, `kept` int, `gone` int, CONSTRAINT `fk_old` FOREIGN KEY (`gone`) REFERENCES `p` (`id`)) ENGINE=MyISAM",
        );
        let delta = diff_tables(&source, &dest).unwrap();
        let lines = delta.report_lines("t");

        assert_eq!(lines[0], "Table `t` differences:");
        assert!(lines.contains(&"  - DROP COLUMN `gone`".to_string()));
        assert!(lines.contains(&"  ~ MODIFY COLUMN `kept`: int -> bigint".to_string()));
        assert!(lines.contains(&"  + ADD COLUMN `added` int".to_string()));
        assert!(lines.contains(&"  + ADD INDEX `idx_new` (added)".to_string()));
        assert!(lines.contains(&"  - DROP FOREIGN KEY `fk_old`".to_string()));
        assert!(lines.contains(&"  ~ CHANGE ENGINE: MyISAM -> InnoDB".to_string()));
        // Header plus one line per change.
        assert_eq!(lines.len(), delta.changes.len() + 1);
    }

    #[test]
    fn test_report_line_index_and_fk_shapes() {
        let source = parse(
            "CREATE TABLE t (`a` int, `b` int, UNIQUE KEY `uq_ab` (`a`,`b`), CONSTRAINT `fk_b` FOREIGN KEY (`b`) REFERENCES `other` (`id`))",
        );
        let dest = parse("CREATE TABLE t (`a` int, `b` int)");
        let delta = diff_tables(&source, &dest).unwrap();
        let lines = delta.report_lines("t");
        assert!(lines.contains(&"  + ADD UNIQUE `uq_ab` (a, b)".to_string()));
        assert!(lines.contains(&"  + ADD FOREIGN KEY `fk_b` (b) -> other(id)".to_string()));
    }

    #[test]
    fn test_describe_modify_column() {
        let source = parse("CREATE TABLE t (`n` bigint NOT NULL)");
        let dest = parse("CREATE TABLE t (`n` int NOT NULL)");
        let delta = diff_tables(&source, &dest).unwrap();
        let line = delta.changes[0].describe();
        assert_eq!(line, "Column MODIFIED: `n` FROM int NOT NULL TO bigint NOT NULL");
    }
}
