use parquet_vtab_core::{SqlType, TableError};

use snafu::Snafu;

pub type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CliError {
    #[snafu(display(
        "Failed to open table from {files}: {source}. \
         Ensure every path is a readable Parquet file with a supported schema."
    ))]
    OpenTable {
        files: String,
        #[snafu(source(from(TableError, Box::new)))]
        source: Box<TableError>,
    },

    #[snafu(display("Scan failed: {source}"))]
    Scan {
        #[snafu(source(from(TableError, Box::new)))]
        source: Box<TableError>,
    },

    #[snafu(display(
        "Invalid filter '{expr}'. Expected `column OP value` with OP one of =, <, <=, >, >="
    ))]
    FilterSyntax { expr: String },

    #[snafu(display("Unknown column '{name}'"))]
    UnknownColumn { name: String },

    #[snafu(display("Invalid value in filter '{expr}': column {column} is {expected}"))]
    FilterValue {
        expr: String,
        column: String,
        expected: SqlType,
    },

    #[snafu(display("Failed to write CSV output: {source}"))]
    Csv { source: csv::Error },

    #[snafu(display("Failed to write output: {source}"))]
    WriteOutput { source: std::io::Error },
}
