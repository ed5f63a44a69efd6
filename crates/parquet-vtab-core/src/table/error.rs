//! Error types and SNAFU context selectors for the table and cursor.
//!
//! `TableError` is the single failure type of the public API: both
//! table-open and scan-step operations return it. None of its variants are
//! retried internally; a table either opens completely or not at all, and a
//! scan step either produces a correctly decoded row or aborts.

use parquet::errors::ParquetError;
use snafu::{Backtrace, prelude::*};

use crate::decode::DecodeError;
use crate::schema::{SchemaError, SqlType};

/// Errors from logical-table and cursor operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TableError {
    /// A table needs at least one backing file.
    #[snafu(display("Cannot open table {table}: no files given"))]
    NoFiles {
        /// Table name supplied by the caller.
        table: String,
    },

    /// Opening a backing file failed.
    #[snafu(display("Cannot open {path}: {source}"))]
    OpenFile {
        /// Path of the file.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
        /// Backtrace at the failure site.
        backtrace: Backtrace,
    },

    /// Parquet footer or row-group access failed.
    #[snafu(display("Parquet read error in {path}: {source}"))]
    ParquetRead {
        /// Path of the file.
        path: String,
        /// Underlying parquet error.
        source: ParquetError,
        /// Backtrace at the failure site.
        backtrace: Backtrace,
    },

    /// The first file's schema cannot be represented as a relation.
    #[snafu(display("Unsupported schema in {path}: {source}"))]
    Schema {
        /// Path of the file whose schema was rejected.
        path: String,
        /// Underlying schema error.
        source: SchemaError,
    },

    /// Decode stream failure; the scan cannot continue.
    #[snafu(display("Decode error in row group {row_group}: {source}"))]
    Decode {
        /// Global row-group index being scanned.
        row_group: usize,
        /// Underlying decode error.
        #[snafu(source, backtrace)]
        source: DecodeError,
    },

    /// Global row-group index beyond the table's row groups.
    #[snafu(display("Row group {index} out of range (table has {count})"))]
    RowGroupOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of row groups in the table.
        count: usize,
    },

    /// Column ordinal beyond the table's columns.
    #[snafu(display("Column {index} out of range (table has {count})"))]
    ColumnOutOfRange {
        /// Requested column.
        index: usize,
        /// Number of columns including the row identifier.
        count: usize,
    },

    /// A row group has fewer columns than the table's schema.
    #[snafu(display(
        "Row group {row_group} has {found} columns, table schema expects {expected}"
    ))]
    RowGroupColumnCount {
        /// Global row-group index.
        row_group: usize,
        /// Columns in the table schema.
        expected: usize,
        /// Columns in the row group.
        found: usize,
    },

    /// A value accessor was used while the cursor is not on a row.
    #[snafu(display("Cursor is not positioned on a row"))]
    NotPositioned,

    /// Typed getter does not match the column's decoded representation.
    #[snafu(display("Column {column} holds {found} values, cannot read as {requested}"))]
    ValueTypeMismatch {
        /// Column ordinal.
        column: usize,
        /// Representation requested by the caller.
        requested: &'static str,
        /// Representation the column decodes to.
        found: &'static str,
    },

    /// A 32-bit getter was used on a value that does not fit.
    #[snafu(display("Column {column} value {value} does not fit in {target}"))]
    ValueOutOfRange {
        /// Column ordinal.
        column: usize,
        /// The decoded value.
        value: i64,
        /// Target width.
        target: SqlType,
    },
}

/// Convenience alias for results returned by table operations.
pub type TableResult<T> = Result<T, TableError>;
