//! Wrapper prelude.
//!
//! The `parquet-vtab` crate is the supported public entry point.
//! Downstream code should prefer importing from this prelude instead of
//! depending on internal core module paths.

pub use crate::schema;
pub use crate::{
    ColumnRef, Constraint, ConstraintOp, ConstraintSet, ConstraintValue, Cursor, CursorState,
    LogicalTable, ScanStats, TableError, TableResult, Value,
};
