//! Migration and rollback planners.
//!
//! Both directions run through the same section builder. The forward plan is
//! built from the source-to-dest diff and creates objects from the SOURCE
//! snapshot's captured DDL. The rollback plan re-runs the differ with the
//! roles swapped and creates objects from the DEST snapshot instead, with the
//! section order reversed. Because drop variants of a table delta carry the
//! destination definitions by value, inverting a delta is exactly the delta
//! of the swapped comparison.

pub mod alter;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::identifier::{qualify, quote};
use crate::core::object::{ObjectKind, Snapshot};
use crate::diff::{diff_snapshots, Diff, TableChange, TableDelta};

/// One renderable unit of a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanEntry {
    /// `-- text` line.
    Comment(String),
    /// Plain statement, terminated with `;` by the renderer.
    Statement(String),
    /// Stored-code body, wrapped in `DELIMITER $$ ... $$ DELIMITER ;`.
    DelimiterBlock(String),
    /// Blank separator line.
    Blank,
}

/// One object-kind section of a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub kind: ObjectKind,
    pub entries: Vec<PlanEntry>,
}

/// Ordered sequence of sections, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub sections: Vec<Section>,
}

impl Plan {
    /// Number of executable statements (comments and spacing excluded).
    pub fn statement_count(&self) -> usize {
        self.sections
            .iter()
            .flat_map(|s| &s.entries)
            .filter(|e| matches!(e, PlanEntry::Statement(_) | PlanEntry::DelimiterBlock(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.statement_count() == 0
    }
}

/// Build the forward migration plan from a precomputed diff.
pub fn forward_plan(diff: &Diff, source: &Snapshot, dest_schema: &str) -> Plan {
    build_plan(diff, source, dest_schema, &ObjectKind::FORWARD_ORDER)
}

/// Build the rollback plan for a snapshot pair.
///
/// Re-runs the differ with SOURCE and DEST swapped, then plans it exactly
/// like a forward migration whose "source" is the original DEST snapshot.
/// This is why snapshots must carry DDL: the objects being restored here may
/// no longer exist once the forward plan has run.
pub fn reverse_plan(source: &Snapshot, dest: &Snapshot, dest_schema: &str) -> Plan {
    let swapped = diff_snapshots(dest, source);
    build_plan(&swapped, dest, dest_schema, &ObjectKind::REVERSE_ORDER)
}

fn build_plan(diff: &Diff, creates: &Snapshot, dest_schema: &str, order: &[ObjectKind]) -> Plan {
    let sections = order
        .iter()
        .map(|&kind| Section {
            kind,
            entries: if kind == ObjectKind::Table {
                table_entries(diff, creates, dest_schema)
            } else {
                object_entries(kind, diff, creates, dest_schema)
            },
        })
        .collect();
    Plan { sections }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

fn table_entries(diff: &Diff, creates: &Snapshot, dest_schema: &str) -> Vec<PlanEntry> {
    let kind_diff = diff.kind(ObjectKind::Table);
    let mut entries = Vec::new();

    for name in &kind_diff.only_in_source {
        match creates.ddl(ObjectKind::Table, name) {
            Some(ddl) if !ddl.is_empty() => {
                entries.push(PlanEntry::Comment(format!("Create table: {}", quote(name))));
                entries.push(PlanEntry::Statement(qualify_create(
                    ddl,
                    ObjectKind::Table,
                    dest_schema,
                    name,
                )));
                entries.push(PlanEntry::Blank);
            }
            _ => {
                warn!(table = %name, "no DDL captured, skipping CREATE TABLE");
                entries.push(PlanEntry::Comment(format!(
                    "Skipped table {}: no DDL captured",
                    quote(name)
                )));
                entries.push(PlanEntry::Blank);
            }
        }
    }

    for name in &kind_diff.only_in_dest {
        entries.push(PlanEntry::Comment(format!("Drop table: {}", quote(name))));
        entries.push(PlanEntry::Statement(format!(
            "DROP TABLE IF EXISTS {}",
            qualify(dest_schema, name)
        )));
        entries.push(PlanEntry::Blank);
    }

    for (name, delta) in &diff.table_deltas {
        entries.push(PlanEntry::Comment(format!("Modify table: {}", quote(name))));
        // Consolidated differences block above the statements, one +/-/~
        // line per atomic change.
        for line in delta.report_lines(name) {
            entries.push(PlanEntry::Comment(line));
        }
        entries.extend(delta_entries(dest_schema, name, delta));
        entries.push(PlanEntry::Blank);
    }

    for name in &diff.opaque_tables {
        entries.push(PlanEntry::Comment(format!(
            "Table {} differs but its DDL could not be parsed; review manually",
            quote(name)
        )));
        entries.push(PlanEntry::Blank);
    }

    entries
}

/// Emit a table delta as statements in the intra-table phase order:
/// foreign-key drops, index drops, column changes (modify, drop, add),
/// index adds, foreign-key adds, option changes.
fn delta_entries(schema: &str, table: &str, delta: &TableDelta) -> Vec<PlanEntry> {
    let mut entries = Vec::new();
    let mut push = |change: &TableChange, stmt: String| {
        entries.push(PlanEntry::Comment(change.describe()));
        entries.push(PlanEntry::Statement(stmt));
    };

    for change in &delta.changes {
        if let TableChange::DropForeignKey { name, .. } = change {
            push(change, alter::drop_foreign_key(schema, table, name));
        }
    }
    for change in &delta.changes {
        if let TableChange::DropIndex { index, .. } = change {
            push(change, alter::drop_index(schema, table, index));
        }
    }
    for change in &delta.changes {
        if let TableChange::ModifyColumn { new, .. } = change {
            push(change, alter::modify_column(schema, table, new));
        }
    }
    for change in &delta.changes {
        if let TableChange::DropColumn { name, .. } = change {
            push(change, alter::drop_column(schema, table, name));
        }
    }
    for change in &delta.changes {
        if let TableChange::AddColumn { column, after } = change {
            push(change, alter::add_column(schema, table, column, after.as_deref()));
        }
    }
    for change in &delta.changes {
        if let TableChange::AddIndex { index } = change {
            push(change, alter::add_index(schema, table, index));
        }
    }
    for change in &delta.changes {
        if let TableChange::AddForeignKey { fk } = change {
            push(change, alter::add_foreign_key(schema, table, fk));
        }
    }
    for change in &delta.changes {
        if let TableChange::SetOption { key, new, .. } = change {
            push(change, alter::set_option(schema, table, *key, new.as_deref()));
        }
    }

    entries
}

// ---------------------------------------------------------------------------
// Non-table objects
// ---------------------------------------------------------------------------

fn object_entries(
    kind: ObjectKind,
    diff: &Diff,
    creates: &Snapshot,
    dest_schema: &str,
) -> Vec<PlanEntry> {
    let kind_diff = diff.kind(kind);
    let mut entries = Vec::new();

    for name in &kind_diff.only_in_source {
        match creates.ddl(kind, name) {
            Some(ddl) if !ddl.is_empty() => {
                entries.push(PlanEntry::Comment(format!(
                    "Create {}: {}",
                    kind.label(),
                    quote(name)
                )));
                entries.push(create_entry(kind, ddl, dest_schema, name));
                entries.push(PlanEntry::Blank);
            }
            _ => {
                warn!(kind = %kind, name = %name, "no DDL captured, skipping CREATE");
                entries.push(PlanEntry::Comment(format!(
                    "Skipped {} {}: no DDL captured",
                    kind.label(),
                    quote(name)
                )));
                entries.push(PlanEntry::Blank);
            }
        }
    }

    for name in &kind_diff.only_in_dest {
        entries.push(PlanEntry::Comment(format!(
            "Drop {}: {}",
            kind.label(),
            quote(name)
        )));
        entries.push(PlanEntry::Statement(drop_statement(kind, dest_schema, name)));
        entries.push(PlanEntry::Blank);
    }

    for name in &kind_diff.changed {
        match creates.ddl(kind, name) {
            Some(ddl) if !ddl.is_empty() => {
                entries.push(PlanEntry::Comment(format!(
                    "Update {}: {}",
                    kind.label(),
                    quote(name)
                )));
                entries.push(PlanEntry::Statement(drop_statement(kind, dest_schema, name)));
                entries.push(create_entry(kind, ddl, dest_schema, name));
                entries.push(PlanEntry::Blank);
            }
            _ => {
                warn!(kind = %kind, name = %name, "no DDL captured, skipping update");
                entries.push(PlanEntry::Comment(format!(
                    "Skipped {} {}: no DDL captured",
                    kind.label(),
                    quote(name)
                )));
                entries.push(PlanEntry::Blank);
            }
        }
    }

    entries
}

fn create_entry(kind: ObjectKind, ddl: &str, dest_schema: &str, name: &str) -> PlanEntry {
    let qualified = qualify_create(ddl, kind, dest_schema, name);
    if kind.uses_delimiter() {
        PlanEntry::DelimiterBlock(qualified)
    } else {
        PlanEntry::Statement(qualified)
    }
}

fn drop_statement(kind: ObjectKind, schema: &str, name: &str) -> String {
    format!(
        "DROP {} IF EXISTS {}",
        kind.keyword(),
        qualify(schema, name)
    )
}

/// Apply the destination schema qualifier to the object name inside a
/// `CREATE ...` statement. The name occurrence is searched after the kind
/// keyword so definer clauses (`DEFINER=\`root\`@\`localhost\``) are never
/// touched, even when the definer happens to share the object's name.
fn qualify_create(ddl: &str, kind: ObjectKind, schema: &str, name: &str) -> String {
    let ddl = crate::parse::strip_preamble(ddl)
        .trim_end_matches(';')
        .trim_end()
        .to_string();
    let quoted = format!("`{}`", name.replace('`', "``"));
    let keyword_pos = find_keyword(&ddl, kind.keyword());

    let search_from = keyword_pos.map(|p| p + kind.keyword().len()).unwrap_or(0);
    if let Some(rel) = ddl[search_from..].find(&quoted) {
        let pos = search_from + rel;
        if !ddl[..pos].ends_with('.') {
            let mut out = String::with_capacity(ddl.len() + schema.len() + 3);
            out.push_str(&ddl[..pos]);
            out.push_str(&format!("`{}`.", schema.replace('`', "``")));
            out.push_str(&ddl[pos..]);
            return out;
        }
    }
    ddl
}

/// Case-insensitive search for a standalone keyword outside backticks and
/// string literals.
fn find_keyword(ddl: &str, keyword: &str) -> Option<usize> {
    let bytes = ddl.as_bytes();
    let lower = ddl.to_ascii_lowercase();
    let needle = keyword.to_ascii_lowercase();
    let mut search_start = 0;
    while let Some(rel) = lower[search_start..].find(&needle) {
        let pos = search_start + rel;
        let before_ok = pos == 0 || !bytes[pos - 1].is_ascii_alphanumeric();
        let after = pos + needle.len();
        let after_ok = after >= bytes.len() || !bytes[after].is_ascii_alphanumeric();
        if before_ok && after_ok && !inside_quotes(ddl, pos) {
            return Some(pos);
        }
        search_start = pos + 1;
    }
    None
}

fn inside_quotes(text: &str, pos: usize) -> bool {
    let mut in_single = false;
    let mut in_backtick = false;
    for (i, c) in text.char_indices() {
        if i >= pos {
            break;
        }
        match c {
            '\'' if !in_backtick => in_single = !in_single,
            '`' if !in_single => in_backtick = !in_backtick,
            _ => {}
        }
    }
    in_single || in_backtick
}
