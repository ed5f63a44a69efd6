use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use parquet::basic::{LogicalType, Repetition, Type as PhysicalType};
use parquet::column::writer::ColumnWriter;
use parquet::data_type::{ByteArray, Int96};
use parquet::file::properties::WriterProperties;
use parquet::file::writer::SerializedFileWriter;
use parquet::schema::types::Type;

pub(crate) type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Values of one column chunk; `None` entries are written as nulls.
#[derive(Clone)]
pub(crate) enum FixtureValues {
    Bool(Vec<Option<bool>>),
    Int32(Vec<Option<i32>>),
    Int64(Vec<Option<i64>>),
    Int96(Vec<Option<Int96>>),
    Float(Vec<Option<f32>>),
    Double(Vec<Option<f64>>),
    Bytes(Vec<Option<Vec<u8>>>),
}

#[derive(Clone)]
pub(crate) struct FixtureColumn {
    pub(crate) name: String,
    pub(crate) physical: PhysicalType,
    pub(crate) logical: Option<LogicalType>,
    pub(crate) values: FixtureValues,
}

impl FixtureColumn {
    pub(crate) fn raw(
        name: &str,
        physical: PhysicalType,
        logical: Option<LogicalType>,
        values: FixtureValues,
    ) -> Self {
        Self {
            name: name.to_string(),
            physical,
            logical,
            values,
        }
    }

    pub(crate) fn int64(name: &str, values: &[i64]) -> Self {
        Self::raw(
            name,
            PhysicalType::INT64,
            None,
            FixtureValues::Int64(values.iter().copied().map(Some).collect()),
        )
    }

    pub(crate) fn int32(name: &str, values: &[Option<i32>]) -> Self {
        Self::raw(
            name,
            PhysicalType::INT32,
            None,
            FixtureValues::Int32(values.to_vec()),
        )
    }

    pub(crate) fn double(name: &str, values: &[Option<f64>]) -> Self {
        Self::raw(
            name,
            PhysicalType::DOUBLE,
            None,
            FixtureValues::Double(values.to_vec()),
        )
    }

    pub(crate) fn text(name: &str, values: &[Option<&str>]) -> Self {
        Self::raw(
            name,
            PhysicalType::BYTE_ARRAY,
            Some(LogicalType::String),
            FixtureValues::Bytes(
                values
                    .iter()
                    .map(|v| v.map(|s| s.as_bytes().to_vec()))
                    .collect(),
            ),
        )
    }

    pub(crate) fn blob(name: &str, values: &[Option<&[u8]>]) -> Self {
        Self::raw(
            name,
            PhysicalType::BYTE_ARRAY,
            None,
            FixtureValues::Bytes(values.iter().map(|v| v.map(<[u8]>::to_vec)).collect()),
        )
    }

    pub(crate) fn bool(name: &str, values: &[Option<bool>]) -> Self {
        Self::raw(
            name,
            PhysicalType::BOOLEAN,
            None,
            FixtureValues::Bool(values.to_vec()),
        )
    }

    pub(crate) fn int96(name: &str, values: &[Option<Int96>]) -> Self {
        Self::raw(
            name,
            PhysicalType::INT96,
            None,
            FixtureValues::Int96(values.to_vec()),
        )
    }
}

fn split_nulls<T: Clone>(values: &[Option<T>]) -> (Vec<T>, Vec<i16>) {
    let defs = values.iter().map(|v| i16::from(v.is_some())).collect();
    let present = values.iter().flatten().cloned().collect();
    (present, defs)
}

fn schema_for(columns: &[FixtureColumn]) -> Result<Arc<Type>, Box<dyn std::error::Error>> {
    let mut fields = Vec::with_capacity(columns.len());
    for col in columns {
        let mut builder = Type::primitive_type_builder(&col.name, col.physical)
            .with_repetition(Repetition::OPTIONAL)
            .with_logical_type(col.logical.clone());
        if col.physical == PhysicalType::FIXED_LEN_BYTE_ARRAY {
            builder = builder.with_length(16);
        }
        fields.push(Arc::new(builder.build()?));
    }
    Ok(Arc::new(
        Type::group_type_builder("schema")
            .with_fields(fields)
            .build()?,
    ))
}

/// Write one file; each outer element is one row group. The schema is taken
/// from the first row group.
pub(crate) fn write_file(
    path: &Path,
    row_groups: &[Vec<FixtureColumn>],
) -> Result<(), Box<dyn std::error::Error>> {
    write_file_with_props(path, row_groups, WriterProperties::builder().build())
}

pub(crate) fn write_file_with_props(
    path: &Path,
    row_groups: &[Vec<FixtureColumn>],
    props: WriterProperties,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let first = row_groups.first().ok_or("at least one row group required")?;
    let schema = schema_for(first)?;

    let file = File::create(path)?;
    let mut writer = SerializedFileWriter::new(file, schema, Arc::new(props))?;

    for columns in row_groups {
        let mut row_group_writer = writer.next_row_group()?;
        let mut pending = columns.iter();
        while let Some(mut col_writer) = row_group_writer.next_column()? {
            let col = pending.next().ok_or("unexpected extra column")?;
            match (col_writer.untyped(), &col.values) {
                (ColumnWriter::BoolColumnWriter(typed), FixtureValues::Bool(v)) => {
                    let (values, defs) = split_nulls(v);
                    typed.write_batch(&values, Some(&defs), None)?;
                }
                (ColumnWriter::Int32ColumnWriter(typed), FixtureValues::Int32(v)) => {
                    let (values, defs) = split_nulls(v);
                    typed.write_batch(&values, Some(&defs), None)?;
                }
                (ColumnWriter::Int64ColumnWriter(typed), FixtureValues::Int64(v)) => {
                    let (values, defs) = split_nulls(v);
                    typed.write_batch(&values, Some(&defs), None)?;
                }
                (ColumnWriter::Int96ColumnWriter(typed), FixtureValues::Int96(v)) => {
                    let (values, defs) = split_nulls(v);
                    typed.write_batch(&values, Some(&defs), None)?;
                }
                (ColumnWriter::FloatColumnWriter(typed), FixtureValues::Float(v)) => {
                    let (values, defs) = split_nulls(v);
                    typed.write_batch(&values, Some(&defs), None)?;
                }
                (ColumnWriter::DoubleColumnWriter(typed), FixtureValues::Double(v)) => {
                    let (values, defs) = split_nulls(v);
                    typed.write_batch(&values, Some(&defs), None)?;
                }
                (ColumnWriter::ByteArrayColumnWriter(typed), FixtureValues::Bytes(v)) => {
                    let (values, defs) = split_nulls(v);
                    let values: Vec<ByteArray> = values.into_iter().map(ByteArray::from).collect();
                    typed.write_batch(&values, Some(&defs), None)?;
                }
                _ => return Err(format!("column {} has mismatched values", col.name).into()),
            }
            col_writer.close()?;
        }
        row_group_writer.close()?;
    }
    writer.close()?;
    Ok(())
}

/// Single INT64 column `name`, one row group per slice.
pub(crate) fn int64_file(
    path: &Path,
    name: &str,
    row_groups: &[&[i64]],
) -> Result<(), Box<dyn std::error::Error>> {
    let groups: Vec<Vec<FixtureColumn>> = row_groups
        .iter()
        .map(|values| vec![FixtureColumn::int64(name, values)])
        .collect();
    write_file(path, &groups)
}

/// Build an INT96 timestamp from nanoseconds-of-day and a Julian day.
pub(crate) fn int96(nanos_of_day: u64, julian_day: u32) -> Int96 {
    let mut v = Int96::new();
    v.set_data(nanos_of_day as u32, (nanos_of_day >> 32) as u32, julian_day);
    v
}
