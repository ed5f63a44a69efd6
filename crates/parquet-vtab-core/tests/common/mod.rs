#![allow(dead_code)]

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use parquet::basic::{LogicalType, Repetition, TimeUnit, Type as PhysicalType};
use parquet::column::writer::ColumnWriter;
use parquet::data_type::{ByteArray, Int96};
use parquet::file::properties::WriterProperties;
use parquet::file::writer::SerializedFileWriter;
use parquet::schema::types::Type;

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// One column chunk of a fixture row group.
#[derive(Clone)]
pub enum Chunk {
    Int64(Vec<Option<i64>>),
    Timestamp(Vec<Option<i64>>),
    Int96(Vec<Option<Int96>>),
    Double(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
    Blob(Vec<Option<Vec<u8>>>),
}

impl Chunk {
    pub fn ints(values: &[i64]) -> Self {
        Chunk::Int64(values.iter().copied().map(Some).collect())
    }

    pub fn texts(values: &[Option<&str>]) -> Self {
        Chunk::Text(values.iter().map(|v| v.map(str::to_string)).collect())
    }

    fn field(&self, name: &str) -> TestResult<Type> {
        let (physical, logical) = match self {
            Chunk::Int64(_) => (PhysicalType::INT64, None),
            Chunk::Timestamp(_) => (
                PhysicalType::INT64,
                Some(LogicalType::Timestamp {
                    is_adjusted_to_u_t_c: true,
                    unit: TimeUnit::MILLIS,
                }),
            ),
            Chunk::Int96(_) => (PhysicalType::INT96, None),
            Chunk::Double(_) => (PhysicalType::DOUBLE, None),
            Chunk::Text(_) => (PhysicalType::BYTE_ARRAY, Some(LogicalType::String)),
            Chunk::Blob(_) => (PhysicalType::BYTE_ARRAY, None),
        };
        Ok(Type::primitive_type_builder(name, physical)
            .with_repetition(Repetition::OPTIONAL)
            .with_logical_type(logical)
            .build()?)
    }
}

fn present<T: Clone>(values: &[Option<T>]) -> (Vec<T>, Vec<i16>) {
    (
        values.iter().flatten().cloned().collect(),
        values.iter().map(|v| i16::from(v.is_some())).collect(),
    )
}

/// Write a file with named columns; each element of `row_groups` holds one
/// chunk per column, in column order.
pub fn write_parquet(
    path: &Path,
    names: &[&str],
    row_groups: &[Vec<Chunk>],
    props: WriterProperties,
) -> TestResult {
    let first = row_groups.first().ok_or("need at least one row group")?;
    let fields = names
        .iter()
        .zip(first)
        .map(|(name, chunk)| chunk.field(name).map(Arc::new))
        .collect::<TestResult<Vec<_>>>()?;
    let schema = Type::group_type_builder("schema")
        .with_fields(fields)
        .build()?;

    let mut writer = SerializedFileWriter::new(File::create(path)?, Arc::new(schema), Arc::new(props))?;
    for chunks in row_groups {
        let mut rg = writer.next_row_group()?;
        for chunk in chunks {
            let mut col = rg.next_column()?.ok_or("schema has fewer columns")?;
            match (col.untyped(), chunk) {
                (ColumnWriter::Int64ColumnWriter(w), Chunk::Int64(v) | Chunk::Timestamp(v)) => {
                    let (values, defs) = present(v);
                    w.write_batch(&values, Some(&defs), None)?;
                }
                (ColumnWriter::Int96ColumnWriter(w), Chunk::Int96(v)) => {
                    let (values, defs) = present(v);
                    w.write_batch(&values, Some(&defs), None)?;
                }
                (ColumnWriter::DoubleColumnWriter(w), Chunk::Double(v)) => {
                    let (values, defs) = present(v);
                    w.write_batch(&values, Some(&defs), None)?;
                }
                (ColumnWriter::ByteArrayColumnWriter(w), Chunk::Text(v)) => {
                    let (values, defs) = present(v);
                    let values: Vec<ByteArray> =
                        values.into_iter().map(|s| ByteArray::from(s.into_bytes())).collect();
                    w.write_batch(&values, Some(&defs), None)?;
                }
                (ColumnWriter::ByteArrayColumnWriter(w), Chunk::Blob(v)) => {
                    let (values, defs) = present(v);
                    let values: Vec<ByteArray> = values.into_iter().map(ByteArray::from).collect();
                    w.write_batch(&values, Some(&defs), None)?;
                }
                _ => return Err("chunk does not match column type".into()),
            }
            col.close()?;
        }
        rg.close()?;
    }
    writer.close()?;
    Ok(())
}

/// Single INT64 column `v`, one row group per slice.
pub fn write_ints(path: &Path, row_groups: &[&[i64]]) -> TestResult {
    let groups: Vec<Vec<Chunk>> = row_groups.iter().map(|g| vec![Chunk::ints(g)]).collect();
    write_parquet(path, &["v"], &groups, WriterProperties::builder().build())
}

/// Legacy 96-bit timestamp from a Julian day and nanoseconds into that day.
pub fn int96(julian_day: u32, nanos_of_day: u64) -> Int96 {
    let mut v = Int96::new();
    v.set_data(nanos_of_day as u32, (nanos_of_day >> 32) as u32, julian_day);
    v
}
