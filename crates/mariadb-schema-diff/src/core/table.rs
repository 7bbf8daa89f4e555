//! Structured table model derived from `CREATE TABLE` text.
//!
//! Only tables get a parsed representation; every other object kind is
//! compared as whitespace-normalized DDL text. Equality on these types is
//! the basis of the table-structure diff, so all text fields are stored in
//! the normalized form the parser produces (collapsed whitespace, lowercase
//! keywords outside quoted literals).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Parsed form of one `CREATE TABLE` statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    /// Columns in declaration order.
    pub columns: Vec<Column>,
    /// Indexes keyed by name. The primary key lives under `PRIMARY`.
    pub indexes: BTreeMap<String, Index>,
    /// Foreign keys keyed by constraint name.
    pub foreign_keys: BTreeMap<String, ForeignKey>,
    pub options: TableOptions,
}

impl Table {
    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Name of the column declared immediately before `name`, if any.
    /// Used to place `ADD COLUMN ... AFTER ...` clauses.
    pub fn predecessor_of(&self, name: &str) -> Option<&str> {
        let idx = self.columns.iter().position(|c| c.name == name)?;
        if idx == 0 {
            None
        } else {
            Some(self.columns[idx - 1].name.as_str())
        }
    }
}

/// One column definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Full type text including length/precision/enum members, e.g.
    /// `decimal(12,2)` or `enum('a','b,c')`.
    pub sql_type: String,
    pub nullable: bool,
    /// `DEFAULT` clause value, verbatim (quotes preserved for literals).
    pub default: Option<String>,
    /// Remaining attributes: `auto_increment`, `on update current_timestamp`,
    /// generated-column expressions, inline check constraints.
    pub extra: String,
    pub comment: Option<String>,
}

impl Column {
    /// Render the column definition as it appears in an
    /// `ADD COLUMN`/`MODIFY COLUMN` clause (everything after the name).
    pub fn definition(&self) -> String {
        let mut def = self.sql_type.clone();
        if !self.nullable {
            def.push_str(" NOT NULL");
        }
        if let Some(ref default) = self.default {
            def.push_str(" DEFAULT ");
            def.push_str(default);
        }
        if !self.extra.is_empty() {
            def.push(' ');
            def.push_str(&self.extra);
        }
        if let Some(ref comment) = self.comment {
            def.push_str(&format!(" COMMENT '{}'", comment.replace('\'', "''")));
        }
        def
    }
}

/// Index category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    Primary,
    Unique,
    Key,
    Fulltext,
}

/// One indexed column, with an optional prefix length (`col(10)`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexColumn {
    pub name: String,
    pub prefix: Option<u32>,
}

impl IndexColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: None,
        }
    }

    pub fn with_prefix(name: impl Into<String>, prefix: u32) -> Self {
        Self {
            name: name.into(),
            prefix: Some(prefix),
        }
    }
}

/// One index definition. Equality is order-sensitive on the column list and
/// includes the options text, so an index differing only in `USING BTREE`
/// counts as changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    pub kind: IndexKind,
    pub columns: Vec<IndexColumn>,
    /// Trailing options such as `using btree`, normalized.
    pub options: String,
}

/// Referential action of a foreign key. The dialect's implicit default is
/// `RESTRICT`; an absent clause in the DDL text normalizes to it so that
/// two sides differing only in clause spelling compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferentialAction {
    #[default]
    Restrict,
    Cascade,
    SetNull,
    NoAction,
    SetDefault,
}

impl ReferentialAction {
    /// Parse a clause value such as `SET NULL` (case-insensitive).
    pub fn parse(text: &str) -> Option<Self> {
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        match collapsed.to_ascii_uppercase().as_str() {
            "RESTRICT" => Some(ReferentialAction::Restrict),
            "CASCADE" => Some(ReferentialAction::Cascade),
            "SET NULL" => Some(ReferentialAction::SetNull),
            "NO ACTION" => Some(ReferentialAction::NoAction),
            "SET DEFAULT" => Some(ReferentialAction::SetDefault),
            _ => None,
        }
    }
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::NoAction => "NO ACTION",
            ReferentialAction::SetDefault => "SET DEFAULT",
        };
        f.write_str(text)
    }
}

/// One foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub name: String,
    pub columns: Vec<String>,
    pub ref_table: String,
    pub ref_columns: Vec<String>,
    pub on_delete: ReferentialAction,
    pub on_update: ReferentialAction,
}

/// The tracked subset of table-level options. `AUTO_INCREMENT=<n>` is
/// deliberately not representable here: the counter is data, not schema,
/// and the parser discards it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableOptions {
    pub engine: Option<String>,
    pub default_charset: Option<String>,
    pub collate: Option<String>,
    pub comment: Option<String>,
}

/// Keys of [`TableOptions`], in the order option changes are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableOptionKey {
    Engine,
    DefaultCharset,
    Collate,
    Comment,
}

impl TableOptionKey {
    pub const ALL: [TableOptionKey; 4] = [
        TableOptionKey::Engine,
        TableOptionKey::DefaultCharset,
        TableOptionKey::Collate,
        TableOptionKey::Comment,
    ];

    /// Human-readable name used in comments and reports.
    pub fn label(self) -> &'static str {
        match self {
            TableOptionKey::Engine => "ENGINE",
            TableOptionKey::DefaultCharset => "DEFAULT CHARSET",
            TableOptionKey::Collate => "COLLATE",
            TableOptionKey::Comment => "COMMENT",
        }
    }
}

impl TableOptions {
    /// Value of one option key.
    pub fn get(&self, key: TableOptionKey) -> Option<&str> {
        match key {
            TableOptionKey::Engine => self.engine.as_deref(),
            TableOptionKey::DefaultCharset => self.default_charset.as_deref(),
            TableOptionKey::Collate => self.collate.as_deref(),
            TableOptionKey::Comment => self.comment.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, sql_type: &str) -> Column {
        Column {
            name: name.to_string(),
            sql_type: sql_type.to_string(),
            nullable: true,
            default: None,
            extra: String::new(),
            comment: None,
        }
    }

    #[test]
    fn test_column_definition_rendering() {
        let mut col = column("status", "enum('new','done')");
        col.nullable = false;
        col.default = Some("'new'".to_string());
        assert_eq!(col.definition(), "enum('new','done') NOT NULL DEFAULT 'new'");

        let mut id = column("id", "int(11)");
        id.nullable = false;
        id.extra = "auto_increment".to_string();
        assert_eq!(id.definition(), "int(11) NOT NULL auto_increment");
    }

    #[test]
    fn test_column_definition_escapes_comment() {
        let mut col = column("note", "varchar(20)");
        col.comment = Some("it's here".to_string());
        assert_eq!(col.definition(), "varchar(20) COMMENT 'it''s here'");
    }

    #[test]
    fn test_predecessor_of() {
        let table = Table {
            name: "t".to_string(),
            columns: vec![column("a", "int"), column("b", "int"), column("c", "int")],
            indexes: BTreeMap::new(),
            foreign_keys: BTreeMap::new(),
            options: TableOptions::default(),
        };
        assert_eq!(table.predecessor_of("a"), None);
        assert_eq!(table.predecessor_of("b"), Some("a"));
        assert_eq!(table.predecessor_of("c"), Some("b"));
        assert_eq!(table.predecessor_of("missing"), None);
    }

    #[test]
    fn test_referential_action_parse_and_default() {
        assert_eq!(
            ReferentialAction::parse("set  null"),
            Some(ReferentialAction::SetNull)
        );
        assert_eq!(
            ReferentialAction::parse("CASCADE"),
            Some(ReferentialAction::Cascade)
        );
        assert_eq!(ReferentialAction::parse("garbage"), None);
        assert_eq!(ReferentialAction::default(), ReferentialAction::Restrict);
    }

    #[test]
    fn test_fk_equality_with_implicit_restrict() {
        let explicit = ForeignKey {
            name: "fk_a".to_string(),
            columns: vec!["x".to_string()],
            ref_table: "parent".to_string(),
            ref_columns: vec!["id".to_string()],
            on_delete: ReferentialAction::Restrict,
            on_update: ReferentialAction::Restrict,
        };
        let implicit = ForeignKey {
            on_delete: ReferentialAction::default(),
            on_update: ReferentialAction::default(),
            ..explicit.clone()
        };
        assert_eq!(explicit, implicit);
    }

    #[test]
    fn test_index_equality_is_order_sensitive() {
        let ab = Index {
            name: "idx".to_string(),
            kind: IndexKind::Key,
            columns: vec![IndexColumn::new("a"), IndexColumn::new("b")],
            options: String::new(),
        };
        let ba = Index {
            columns: vec![IndexColumn::new("b"), IndexColumn::new("a")],
            ..ab.clone()
        };
        assert_ne!(ab, ba);
    }

    #[test]
    fn test_index_using_hint_is_significant() {
        let plain = Index {
            name: "idx".to_string(),
            kind: IndexKind::Key,
            columns: vec![IndexColumn::new("a")],
            options: String::new(),
        };
        let hinted = Index {
            options: "using btree".to_string(),
            ..plain.clone()
        };
        assert_ne!(plain, hinted);
    }

    #[test]
    fn test_table_options_access_by_key() {
        let opts = TableOptions {
            engine: Some("InnoDB".to_string()),
            default_charset: Some("utf8mb4".to_string()),
            collate: None,
            comment: Some("orders".to_string()),
        };
        assert_eq!(opts.get(TableOptionKey::Engine), Some("InnoDB"));
        assert_eq!(opts.get(TableOptionKey::Collate), None);
        assert_eq!(opts.get(TableOptionKey::Comment), Some("orders"));
    }
}
