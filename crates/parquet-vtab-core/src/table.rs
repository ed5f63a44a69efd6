//! A set of Parquet files exposed as one relational table.
//!
//! [`LogicalTable`] opens every file once, read-only, and flattens their row
//! groups into a single global ordering: all row groups of the first file in
//! file order, then those of the second file, and so on. The relational
//! schema is derived from the first file only; later files are assumed to
//! share it and are read with the first file's interpretation.

pub mod error;

#[cfg(test)]
pub(crate) mod test_util;

use std::fs::File;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use parquet::file::metadata::RowGroupMetaData;
use parquet::file::reader::{FileReader, RowGroupReader, SerializedFileReader};
use snafu::prelude::*;

use crate::constraint::ColumnRef;
use crate::schema::{ColumnDef, DerivedSchema, derive_schema};

pub use error::{TableError, TableResult};
use error::{
    ColumnOutOfRangeSnafu, NoFilesSnafu, OpenFileSnafu, ParquetReadSnafu,
    RowGroupOutOfRangeSnafu, SchemaSnafu,
};

/// Coordinate of one row group: owning file and position within that file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowGroupRef {
    /// Index into the table's file list.
    pub file_index: usize,
    /// Row-group index within that file.
    pub row_group_index: usize,
}

struct TableFile {
    path: PathBuf,
    reader: SerializedFileReader<File>,
}

/// One or more Parquet files presented as a single table.
pub struct LogicalTable {
    name: String,
    files: Vec<TableFile>,
    row_groups: Vec<RowGroupRef>,
    schema: DerivedSchema,
    total_rows: i64,
}

impl std::fmt::Debug for LogicalTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogicalTable")
            .field("name", &self.name)
            .field("files", &self.file_paths().collect::<Vec<_>>())
            .field("row_groups", &self.row_groups.len())
            .field("total_rows", &self.total_rows)
            .finish()
    }
}

impl LogicalTable {
    /// Open `paths` as one table named `name`.
    ///
    /// Fails if no path is given, if any file cannot be opened or its footer
    /// parsed, or if the first file's schema has a column that cannot be
    /// mapped. No partially-opened table is ever returned.
    pub fn open<I, P>(name: impl Into<String>, paths: I) -> TableResult<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let name = name.into();
        let mut files = Vec::new();
        let mut row_groups = Vec::new();
        let mut total_rows = 0i64;

        for path in paths {
            let path = path.as_ref().to_path_buf();
            let path_str = path.display().to_string();

            let file = File::open(&path).context(OpenFileSnafu {
                path: path_str.clone(),
            })?;
            let reader = SerializedFileReader::new(file).context(ParquetReadSnafu {
                path: path_str.clone(),
            })?;

            let file_index = files.len();
            let meta = reader.metadata();
            total_rows += meta.file_metadata().num_rows();
            row_groups.extend(
                (0..meta.num_row_groups()).map(|row_group_index| RowGroupRef {
                    file_index,
                    row_group_index,
                }),
            );

            debug!(
                "table {name}: opened {path_str} ({} rows, {} row groups)",
                meta.file_metadata().num_rows(),
                meta.num_row_groups()
            );
            files.push(TableFile { path, reader });
        }

        let first = files.first().context(NoFilesSnafu {
            table: name.clone(),
        })?;
        let schema = derive_schema(first.reader.metadata().file_metadata().schema_descr())
            .context(SchemaSnafu {
                path: first.path.display().to_string(),
            })?;

        let expected = schema.num_user_columns();
        for file in files.iter().skip(1) {
            let found = file.reader.metadata().file_metadata().schema_descr().num_columns();
            if found != expected {
                warn!(
                    "table {name}: {} has {found} columns, first file has {expected}; \
                     reading with the first file's schema",
                    file.path.display()
                );
            }
        }

        Ok(Self {
            name,
            files,
            row_groups,
            schema,
            total_rows,
        })
    }

    /// Table name given at open time.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Backing file paths in table order.
    pub fn file_paths(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(|f| f.path.as_path())
    }

    /// All columns, user columns first and the row identifier last.
    pub fn columns(&self) -> &[ColumnDef] {
        &self.schema.columns
    }

    /// Number of columns including the row identifier.
    pub fn num_columns(&self) -> usize {
        self.schema.columns.len()
    }

    /// Number of columns backed by file data.
    pub fn num_user_columns(&self) -> usize {
        self.schema.num_user_columns()
    }

    /// Ordinal of the row-identifier column.
    pub fn row_id_column(&self) -> usize {
        self.num_user_columns()
    }

    /// Resolve an ordinal to a column reference; the last ordinal is the row id.
    pub fn column_ref(&self, index: usize) -> TableResult<ColumnRef> {
        let count = self.num_columns();
        ensure!(index < count, ColumnOutOfRangeSnafu { index, count });
        if index == self.row_id_column() {
            Ok(ColumnRef::RowId)
        } else {
            Ok(ColumnRef::Column(index))
        }
    }

    /// Name of a column.
    pub fn column_name(&self, column: ColumnRef) -> TableResult<&str> {
        let index = match column {
            ColumnRef::RowId => self.row_id_column(),
            ColumnRef::Column(index) => {
                let count = self.num_columns();
                ensure!(
                    index < self.num_user_columns(),
                    ColumnOutOfRangeSnafu { index, count }
                );
                index
            }
        };
        Ok(&self.schema.columns[index].name)
    }

    /// Ordinal of the column called `name`, if any.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.schema.columns.iter().position(|c| c.name == name)
    }

    /// Cached `CREATE TABLE` statement for the host engine.
    pub fn create_statement(&self) -> &str {
        &self.schema.create_statement
    }

    /// Total rows across all files.
    pub fn num_rows(&self) -> i64 {
        self.total_rows
    }

    /// Total row groups across all files.
    pub fn num_row_groups(&self) -> usize {
        self.row_groups.len()
    }

    /// Coordinate of a global row-group index.
    pub fn row_group_ref(&self, index: usize) -> TableResult<RowGroupRef> {
        self.row_groups
            .get(index)
            .copied()
            .context(RowGroupOutOfRangeSnafu {
                index,
                count: self.row_groups.len(),
            })
    }

    fn file_for(&self, index: usize) -> TableResult<(&TableFile, usize)> {
        let rg = self.row_group_ref(index)?;
        Ok((&self.files[rg.file_index], rg.row_group_index))
    }

    /// Footer metadata of a global row group.
    pub fn row_group_metadata(&self, index: usize) -> TableResult<&RowGroupMetaData> {
        let (file, rg) = self.file_for(index)?;
        Ok(file.reader.metadata().row_group(rg))
    }

    /// A fresh reader for a global row group.
    ///
    /// Each call returns an independent handle, so cursors never share
    /// column readers.
    pub fn row_group_reader(&self, index: usize) -> TableResult<Box<dyn RowGroupReader + '_>> {
        let (file, rg) = self.file_for(index)?;
        file.reader.get_row_group(rg).context(ParquetReadSnafu {
            path: file.path.display().to_string(),
        })
    }

    /// The file reader owning a global row group.
    pub fn file_reader(&self, index: usize) -> TableResult<&SerializedFileReader<File>> {
        let (file, _) = self.file_for(index)?;
        Ok(&file.reader)
    }

    /// Path of the file owning a global row group.
    pub fn file_path(&self, index: usize) -> TableResult<&Path> {
        let (file, _) = self.file_for(index)?;
        Ok(&file.path)
    }
}

/// Split a module-argument string such as `'a.parquet', "b.parquet"` into
/// paths, trimming whitespace and one layer of matching quotes.
///
/// Commas inside a quoted argument belong to the path.
pub fn split_module_args(args: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut quote = None;
    let mut start = 0;

    for (i, c) in args.char_indices() {
        match (quote, c) {
            (None, '\'' | '"') => quote = Some(c),
            (Some(open), _) if c == open => quote = None,
            (None, ',') => {
                parts.push(&args[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&args[start..]);

    parts
        .into_iter()
        .map(|arg| unquote_module_arg(arg.trim()).to_string())
        .filter(|arg| !arg.is_empty())
        .collect()
}

/// Strip one layer of matching single or double quotes.
pub fn unquote_module_arg(arg: &str) -> &str {
    for quote in ['\'', '"'] {
        if arg.len() >= 2 && arg.starts_with(quote) && arg.ends_with(quote) {
            return &arg[1..arg.len() - 1];
        }
    }
    arg
}
