//! Core data model: object identity, snapshots, and the parsed table form.

pub mod identifier;
pub mod object;
pub mod table;

pub use object::{ObjectKind, ObjectRecord, ObjectRef, Snapshot};
pub use table::{
    Column, ForeignKey, Index, IndexColumn, IndexKind, ReferentialAction, Table, TableOptionKey,
    TableOptions,
};
