//! Schema object identity and snapshots.
//!
//! A [`Snapshot`] is the complete set of objects of all seven kinds in one
//! schema, each carrying the `CREATE ...` text the server returned at
//! introspection time. The DDL is captured *into* the snapshot on purpose:
//! the rollback planner must be able to recreate objects the forward plan
//! drops, long after those objects are gone from the database.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The seven object kinds this tool tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Table,
    View,
    Procedure,
    Function,
    Trigger,
    Event,
    Sequence,
}

impl ObjectKind {
    /// Every kind, in canonical (enum) order.
    pub const ALL: [ObjectKind; 7] = [
        ObjectKind::Table,
        ObjectKind::View,
        ObjectKind::Procedure,
        ObjectKind::Function,
        ObjectKind::Trigger,
        ObjectKind::Event,
        ObjectKind::Sequence,
    ];

    /// Section order in the forward migration script: tables first (everything
    /// else may reference them), stored code next, then scheduled and derived
    /// objects.
    pub const FORWARD_ORDER: [ObjectKind; 7] = [
        ObjectKind::Table,
        ObjectKind::Procedure,
        ObjectKind::Function,
        ObjectKind::Trigger,
        ObjectKind::Event,
        ObjectKind::View,
        ObjectKind::Sequence,
    ];

    /// Section order in the rollback script: the exact reverse of
    /// [`Self::FORWARD_ORDER`].
    pub const REVERSE_ORDER: [ObjectKind; 7] = [
        ObjectKind::Sequence,
        ObjectKind::View,
        ObjectKind::Event,
        ObjectKind::Trigger,
        ObjectKind::Function,
        ObjectKind::Procedure,
        ObjectKind::Table,
    ];

    /// SQL keyword for `SHOW CREATE ...` / `DROP ...` statements.
    pub fn keyword(self) -> &'static str {
        match self {
            ObjectKind::Table => "TABLE",
            ObjectKind::View => "VIEW",
            ObjectKind::Procedure => "PROCEDURE",
            ObjectKind::Function => "FUNCTION",
            ObjectKind::Trigger => "TRIGGER",
            ObjectKind::Event => "EVENT",
            ObjectKind::Sequence => "SEQUENCE",
        }
    }

    /// Banner title used for this kind's section in generated scripts.
    pub fn section_title(self) -> &'static str {
        match self {
            ObjectKind::Table => "TABLES",
            ObjectKind::View => "VIEWS",
            ObjectKind::Procedure => "PROCEDURES",
            ObjectKind::Function => "FUNCTIONS",
            ObjectKind::Trigger => "TRIGGERS",
            ObjectKind::Event => "EVENTS",
            ObjectKind::Sequence => "SEQUENCES",
        }
    }

    /// Lowercase singular label for log messages and comments.
    pub fn label(self) -> &'static str {
        match self {
            ObjectKind::Table => "table",
            ObjectKind::View => "view",
            ObjectKind::Procedure => "procedure",
            ObjectKind::Function => "function",
            ObjectKind::Trigger => "trigger",
            ObjectKind::Event => "event",
            ObjectKind::Sequence => "sequence",
        }
    }

    /// Whether `CREATE` statements of this kind must be wrapped in a
    /// `DELIMITER $$ ... $$ DELIMITER ;` block. Stored-code bodies contain
    /// bare `;` characters that would otherwise terminate the statement in
    /// an ordinary `mysql` client.
    pub fn uses_delimiter(self) -> bool {
        matches!(
            self,
            ObjectKind::Procedure | ObjectKind::Function | ObjectKind::Trigger
        )
    }

    /// Zero-based column of the `CREATE ...` text in the `SHOW CREATE ...`
    /// result set. The position varies by kind: tables and views put it
    /// second, routines and triggers third (after `sql_mode`), events
    /// fourth (after `sql_mode` and `time_zone`).
    pub fn show_create_column(self) -> usize {
        match self {
            ObjectKind::Table | ObjectKind::View | ObjectKind::Sequence => 1,
            ObjectKind::Procedure | ObjectKind::Function | ObjectKind::Trigger => 2,
            ObjectKind::Event => 3,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identity of one object within a schema.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub kind: ObjectKind,
    pub name: String,
}

impl ObjectRef {
    pub fn new(kind: ObjectKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// An object's identity together with the exact `CREATE ...` text the server
/// returned. An empty `ddl` marks an object whose extraction failed;
/// downstream consumers skip it with a warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub name: String,
    pub ddl: String,
}

impl ObjectRecord {
    pub fn new(name: impl Into<String>, ddl: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ddl: ddl.into(),
        }
    }
}

/// All objects of all kinds in one schema at one point in time.
///
/// Records are kept sorted by name per kind. This ordering is a hard
/// invariant: the generated SQL is a deterministic function of the two
/// snapshots, and every downstream iteration relies on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Schema name the snapshot was taken from.
    pub schema: String,
    records: BTreeMap<ObjectKind, Vec<ObjectRecord>>,
}

impl Snapshot {
    /// Create an empty snapshot for a schema.
    pub fn new(schema: impl Into<String>) -> Self {
        let mut records = BTreeMap::new();
        for kind in ObjectKind::ALL {
            records.insert(kind, Vec::new());
        }
        Self {
            schema: schema.into(),
            records,
        }
    }

    /// Insert a record, keeping the per-kind list sorted by name.
    pub fn add(&mut self, kind: ObjectKind, record: ObjectRecord) {
        let list = self.records.entry(kind).or_default();
        let pos = list
            .binary_search_by(|r| r.name.as_str().cmp(&record.name))
            .unwrap_or_else(|pos| pos);
        list.insert(pos, record);
    }

    /// Replace the full record list for one kind. The list is sorted here so
    /// callers may collect results in any completion order.
    pub fn set_records(&mut self, kind: ObjectKind, mut records: Vec<ObjectRecord>) {
        records.sort_by(|a, b| a.name.cmp(&b.name));
        self.records.insert(kind, records);
    }

    /// All records of one kind, sorted by name.
    pub fn records(&self, kind: ObjectKind) -> &[ObjectRecord] {
        self.records.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Sorted names of one kind.
    pub fn names(&self, kind: ObjectKind) -> impl Iterator<Item = &str> {
        self.records(kind).iter().map(|r| r.name.as_str())
    }

    /// Captured DDL for a named object, if present.
    pub fn ddl(&self, kind: ObjectKind, name: &str) -> Option<&str> {
        let list = self.records(kind);
        list.binary_search_by(|r| r.name.as_str().cmp(name))
            .ok()
            .map(|i| list[i].ddl.as_str())
    }

    /// Total number of objects across all kinds.
    pub fn object_count(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }
}
