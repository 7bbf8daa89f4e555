//! ALTER TABLE statement builders.
//!
//! Every builder returns one statement without the trailing semicolon; the
//! renderer appends terminators. All identifiers are backtick-quoted and the
//! table is schema-qualified.

use crate::core::identifier::{qualify, quote};
use crate::core::table::{
    Column, ForeignKey, Index, IndexKind, ReferentialAction, TableOptionKey,
};

fn alter_table(schema: &str, table: &str) -> String {
    format!("ALTER TABLE {}", qualify(schema, table))
}

pub fn add_column(schema: &str, table: &str, column: &Column, after: Option<&str>) -> String {
    let mut stmt = format!(
        "{} ADD COLUMN {} {}",
        alter_table(schema, table),
        quote(&column.name),
        column.definition()
    );
    if let Some(predecessor) = after {
        stmt.push_str(&format!(" AFTER {}", quote(predecessor)));
    }
    stmt
}

pub fn drop_column(schema: &str, table: &str, name: &str) -> String {
    format!(
        "{} DROP COLUMN IF EXISTS {}",
        alter_table(schema, table),
        quote(name)
    )
}

pub fn modify_column(schema: &str, table: &str, column: &Column) -> String {
    format!(
        "{} MODIFY COLUMN {} {}",
        alter_table(schema, table),
        quote(&column.name),
        column.definition()
    )
}

pub fn add_index(schema: &str, table: &str, index: &Index) -> String {
    let columns = index_columns(index);
    let mut stmt = match index.kind {
        IndexKind::Primary => {
            format!("{} ADD PRIMARY KEY ({})", alter_table(schema, table), columns)
        }
        IndexKind::Unique => format!(
            "{} ADD UNIQUE INDEX {} ({})",
            alter_table(schema, table),
            quote(&index.name),
            columns
        ),
        IndexKind::Fulltext => format!(
            "{} ADD FULLTEXT INDEX {} ({})",
            alter_table(schema, table),
            quote(&index.name),
            columns
        ),
        IndexKind::Key => format!(
            "{} ADD INDEX {} ({})",
            alter_table(schema, table),
            quote(&index.name),
            columns
        ),
    };
    if !index.options.is_empty() {
        stmt.push(' ');
        stmt.push_str(&index.options);
    }
    stmt
}

pub fn drop_index(schema: &str, table: &str, index: &Index) -> String {
    if index.kind == IndexKind::Primary {
        format!("{} DROP PRIMARY KEY", alter_table(schema, table))
    } else {
        format!(
            "{} DROP INDEX IF EXISTS {}",
            alter_table(schema, table),
            quote(&index.name)
        )
    }
}

pub fn add_foreign_key(schema: &str, table: &str, fk: &ForeignKey) -> String {
    let mut stmt = format!(
        "{} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
        alter_table(schema, table),
        quote(&fk.name),
        ident_list(&fk.columns),
        quote(&fk.ref_table),
        ident_list(&fk.ref_columns)
    );
    // RESTRICT is the dialect default and stays implicit.
    if fk.on_delete != ReferentialAction::Restrict {
        stmt.push_str(&format!(" ON DELETE {}", fk.on_delete));
    }
    if fk.on_update != ReferentialAction::Restrict {
        stmt.push_str(&format!(" ON UPDATE {}", fk.on_update));
    }
    stmt
}

pub fn drop_foreign_key(schema: &str, table: &str, name: &str) -> String {
    format!(
        "{} DROP FOREIGN KEY IF EXISTS {}",
        alter_table(schema, table),
        quote(name)
    )
}

pub fn set_option(
    schema: &str,
    table: &str,
    key: TableOptionKey,
    value: Option<&str>,
) -> String {
    let clause = match key {
        TableOptionKey::Engine => format!("ENGINE = {}", value.unwrap_or("InnoDB")),
        TableOptionKey::DefaultCharset => {
            format!("DEFAULT CHARACTER SET = {}", value.unwrap_or("utf8mb4"))
        }
        TableOptionKey::Collate => format!("COLLATE = {}", value.unwrap_or("utf8mb4_general_ci")),
        TableOptionKey::Comment => format!(
            "COMMENT = '{}'",
            value.unwrap_or("").replace('\'', "''")
        ),
    };
    format!("{} {}", alter_table(schema, table), clause)
}

fn index_columns(index: &Index) -> String {
    index
        .columns
        .iter()
        .map(|c| match c.prefix {
            Some(len) => format!("{}({})", quote(&c.name), len),
            None => quote(&c.name),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn ident_list(names: &[String]) -> String {
    names
        .iter()
        .map(|n| quote(n))
        .collect::<Vec<_>>()
        .join(", ")
}
