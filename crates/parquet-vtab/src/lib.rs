//! # parquet-vtab
//!
//! Query one or more Parquet files as a single read-only relational table.
//!
//! This crate is the supported public entry point and provides a small, stable surface.
//! Host engines open a [`LogicalTable`], hand its
//! [`create_statement`](LogicalTable::create_statement) to their catalog and
//! drive a [`Cursor`] per scan.
//!
//! ## Example
//!
//! ```rust,no_run
//! use parquet_vtab::prelude::*;
//!
//! # fn main() -> Result<(), TableError> {
//! let table = LogicalTable::open("trades", ["a.parquet", "b.parquet"])?;
//! let constraints = ConstraintSet::from(vec![Constraint::column(
//!     0,
//!     ConstraintOp::Ge,
//!     ConstraintValue::Integer(100),
//! )]);
//!
//! let mut cursor = Cursor::new(&table, constraints)?;
//! cursor.next()?;
//! while !cursor.eof() {
//!     println!("{} {:?}", cursor.row_id(), cursor.value(0)?);
//!     cursor.next()?;
//! }
//! # Ok(())
//! # }
//! ```

/// Convenience prelude with the stable, supported surface.
pub mod prelude;

/// Schema namespace (wrapper-only).
pub mod schema {
    pub use parquet_vtab_core::schema::{
        ColumnDef, DerivedSchema, ROW_ID_COLUMN, SchemaError, SqlType, map_column_type,
    };
}

pub use parquet_vtab_core::constraint::{
    ColumnRef, Constraint, ConstraintOp, ConstraintSet, ConstraintValue,
};
pub use parquet_vtab_core::cursor::{Cursor, CursorState, ScanStats, Value};
pub use parquet_vtab_core::table::{LogicalTable, TableError, TableResult, split_module_args};
