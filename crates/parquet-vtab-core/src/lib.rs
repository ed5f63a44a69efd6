//! Read-only relational view over one or more Parquet files.
//!
//! This crate provides the pieces a SQL engine's virtual-table hook needs to
//! expose Parquet data as a table:
//!
//! - Schema derivation from Parquet column descriptors to SQL column types,
//!   including the `CREATE TABLE` statement handed to the host (`schema`
//!   module).
//! - A `LogicalTable` that concatenates the row groups of several files into
//!   one globally ordered scan space (`table` module).
//! - Typed constraints and interval reasoning over row-group statistics
//!   (`constraint` module).
//! - Lazy, forward-only column decoding with INT96 timestamp conversion
//!   (`decode` module).
//! - A `Cursor` that prunes row groups, filters rows and serves typed values
//!   (`cursor` module).
//!
//! Host engine glue (registration, planning, the query loop) lives outside
//! this crate and talks to it through `LogicalTable` and `Cursor`.
#![deny(missing_docs)]
pub mod constraint;
pub mod cursor;
pub mod decode;
pub mod schema;
pub mod table;

pub use constraint::{
    ColumnRef, Constraint, ConstraintOp, ConstraintSet, ConstraintValue, FilterKind,
    IntervalTruth,
};
pub use cursor::{Cursor, CursorState, ScanStats, Value};
pub use schema::{ColumnDef, DerivedSchema, ROW_ID_COLUMN, SchemaError, SqlType};
pub use table::{LogicalTable, RowGroupRef, TableError, TableResult};
