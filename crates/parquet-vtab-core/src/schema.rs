//! Relational schema derivation from Parquet column descriptors.
//!
//! The mapping is an explicit allow-list: every (physical, logical) pair
//! either maps to exactly one SQL column type or is rejected with an error
//! naming the column. Nothing is coerced, so a column that cannot be
//! represented without losing sign, precision or structure stops the table
//! from opening instead of silently producing wrong values.

use std::fmt;

use parquet::basic::{ConvertedType, LogicalType, Repetition, Type as PhysicalType};
use parquet::schema::types::SchemaDescriptor;
use snafu::prelude::*;

/// Name of the synthetic trailing column carrying the row identifier.
pub const ROW_ID_COLUMN: &str = "VirtualRowId";

/// Relation name used in the generated table-creation statement.
pub const RELATION_NAME: &str = "x";

/// Errors raised while deriving the relational schema of a file.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SchemaError {
    /// The column's root is a group (struct, list, map), not a primitive leaf.
    #[snafu(display("column {index} ({name}) has non-primitive type"))]
    NonPrimitiveColumn {
        /// Leaf column index within the file schema.
        index: usize,
        /// Column path as recorded in the file.
        name: String,
    },

    /// The column is a primitive but repeated, so one row holds many values.
    #[snafu(display("column {index} ({name}) is repeated and has no scalar representation"))]
    RepeatedColumn {
        /// Leaf column index within the file schema.
        index: usize,
        /// Column path as recorded in the file.
        name: String,
    },

    /// The physical/logical pair is not on the allow-list.
    #[snafu(display("column {index} ({name}) has unsupported type: {physical}/{logical}"))]
    UnsupportedColumnType {
        /// Leaf column index within the file schema.
        index: usize,
        /// Column path as recorded in the file.
        name: String,
        /// Physical type name.
        physical: String,
        /// Logical annotation, or `NONE`.
        logical: String,
    },
}

/// SQL column types offered to the host engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    /// 1-byte integer.
    TinyInt,
    /// 2-byte integer.
    SmallInt,
    /// 4-byte integer.
    Int,
    /// 8-byte integer.
    BigInt,
    /// 8-byte float.
    Double,
    /// UTF-8 text.
    Text,
    /// Opaque bytes.
    Blob,
}

impl SqlType {
    /// Keyword used for this type in the table-creation statement.
    pub fn as_sql(self) -> &'static str {
        match self {
            SqlType::TinyInt => "TINYINT",
            SqlType::SmallInt => "SMALLINT",
            SqlType::Int => "INT",
            SqlType::BigInt => "BIGINT",
            SqlType::Double => "DOUBLE",
            SqlType::Text => "TEXT",
            SqlType::Blob => "BLOB",
        }
    }

    /// True for the integer family (everything that decodes to an `i64`).
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            SqlType::TinyInt | SqlType::SmallInt | SqlType::Int | SqlType::BigInt
        )
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// One column of the derived relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column name as exposed to the host.
    pub name: String,
    /// Mapped SQL type.
    pub sql_type: SqlType,
    /// Physical type of the backing Parquet column, `None` for the row identifier.
    pub physical: Option<PhysicalType>,
}

/// Result of schema derivation: the column list and the creation statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedSchema {
    /// User columns in file order, followed by the row-identifier column.
    pub columns: Vec<ColumnDef>,
    /// Declarative `CREATE TABLE` text handed to the host engine.
    pub create_statement: String,
}

impl DerivedSchema {
    /// Number of columns backed by file data (excludes the row identifier).
    pub fn num_user_columns(&self) -> usize {
        self.columns.len().saturating_sub(1)
    }
}

/// Normalized view over the logical and legacy converted-type annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Annotation {
    None,
    String,
    Integer { bit_width: i8, is_signed: bool },
    Temporal,
    Other,
}

fn annotation_of(logical: Option<&LogicalType>, converted: ConvertedType) -> Annotation {
    if let Some(logical) = logical {
        return match logical {
            LogicalType::String => Annotation::String,
            LogicalType::Integer {
                bit_width,
                is_signed,
            } => Annotation::Integer {
                bit_width: *bit_width,
                is_signed: *is_signed,
            },
            LogicalType::Date | LogicalType::Time { .. } | LogicalType::Timestamp { .. } => {
                Annotation::Temporal
            }
            _ => Annotation::Other,
        };
    }

    match converted {
        ConvertedType::NONE => Annotation::None,
        ConvertedType::UTF8 => Annotation::String,
        ConvertedType::INT_8 => Annotation::Integer {
            bit_width: 8,
            is_signed: true,
        },
        ConvertedType::INT_16 => Annotation::Integer {
            bit_width: 16,
            is_signed: true,
        },
        ConvertedType::INT_32 => Annotation::Integer {
            bit_width: 32,
            is_signed: true,
        },
        ConvertedType::INT_64 => Annotation::Integer {
            bit_width: 64,
            is_signed: true,
        },
        ConvertedType::UINT_8 => Annotation::Integer {
            bit_width: 8,
            is_signed: false,
        },
        ConvertedType::UINT_16 => Annotation::Integer {
            bit_width: 16,
            is_signed: false,
        },
        ConvertedType::UINT_32 => Annotation::Integer {
            bit_width: 32,
            is_signed: false,
        },
        ConvertedType::UINT_64 => Annotation::Integer {
            bit_width: 64,
            is_signed: false,
        },
        ConvertedType::DATE
        | ConvertedType::TIME_MILLIS
        | ConvertedType::TIME_MICROS
        | ConvertedType::TIMESTAMP_MILLIS
        | ConvertedType::TIMESTAMP_MICROS => Annotation::Temporal,
        _ => Annotation::Other,
    }
}

/// Map a physical/logical pair to a SQL type, or `None` if it is not allowed.
pub fn map_column_type(
    physical: PhysicalType,
    logical: Option<&LogicalType>,
    converted: ConvertedType,
) -> Option<SqlType> {
    let annotation = annotation_of(logical, converted);

    // Unsigned integers would be reinterpreted as signed; never offered.
    if let Annotation::Integer {
        is_signed: false, ..
    } = annotation
    {
        return None;
    }

    match (physical, annotation) {
        (PhysicalType::BOOLEAN, Annotation::None) => Some(SqlType::TinyInt),

        (PhysicalType::INT32, Annotation::None) => Some(SqlType::Int),
        (PhysicalType::INT32, Annotation::Integer { bit_width, .. }) => match bit_width {
            8 => Some(SqlType::TinyInt),
            16 => Some(SqlType::SmallInt),
            32 => Some(SqlType::Int),
            _ => None,
        },

        (
            PhysicalType::INT64,
            Annotation::None | Annotation::Integer { .. } | Annotation::Temporal,
        ) => Some(SqlType::BigInt),

        // Converted to epoch milliseconds on decode.
        (PhysicalType::INT96, Annotation::None) => Some(SqlType::BigInt),

        (PhysicalType::DOUBLE, Annotation::None) => Some(SqlType::Double),

        (PhysicalType::BYTE_ARRAY, Annotation::String) => Some(SqlType::Text),
        (PhysicalType::BYTE_ARRAY, Annotation::None) => Some(SqlType::Blob),

        _ => None,
    }
}

fn logical_name(logical: Option<&LogicalType>, converted: ConvertedType) -> String {
    match logical {
        Some(logical) => format!("{logical:?}"),
        None => format!("{converted}"),
    }
}

/// Quote an identifier for the creation statement, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    let escaped = name.replace('"', "\"\"");
    format!("\"{escaped}\"")
}

/// Render the `CREATE TABLE` statement for a column list.
pub fn create_statement(columns: &[ColumnDef]) -> String {
    let body = columns
        .iter()
        .map(|col| format!("{} {}", quote_identifier(&col.name), col.sql_type))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE {RELATION_NAME}({body});")
}

/// Derive the relational schema of a Parquet file.
///
/// Columns are taken in leaf order. Each must be a non-repeated primitive
/// whose type is on the allow-list in [`map_column_type`]. The row
/// identifier column is appended last with type `INT`.
pub fn derive_schema(descr: &SchemaDescriptor) -> Result<DerivedSchema, SchemaError> {
    let mut columns = Vec::with_capacity(descr.num_columns() + 1);

    for index in 0..descr.num_columns() {
        let root = descr.get_column_root(index);
        let name = root.name().to_string();

        ensure!(
            root.is_primitive(),
            NonPrimitiveColumnSnafu { index, name }
        );

        let info = root.get_basic_info();
        ensure!(
            !(info.has_repetition() && info.repetition() == Repetition::REPEATED),
            RepeatedColumnSnafu { index, name }
        );

        let col = descr.column(index);
        let physical = col.physical_type();
        let logical = col.logical_type_ref();
        let converted = col.converted_type();

        let sql_type = map_column_type(physical, logical, converted).context(
            UnsupportedColumnTypeSnafu {
                index,
                name: name.clone(),
                physical: format!("{physical}"),
                logical: logical_name(logical, converted),
            },
        )?;

        columns.push(ColumnDef {
            name,
            sql_type,
            physical: Some(physical),
        });
    }

    columns.push(ColumnDef {
        name: ROW_ID_COLUMN.to_string(),
        sql_type: SqlType::Int,
        physical: None,
    });

    let create_statement = create_statement(&columns);
    Ok(DerivedSchema {
        columns,
        create_statement,
    })
}
