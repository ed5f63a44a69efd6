#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    BinaryBuilder, BooleanBuilder, Float32Builder, Float64Builder, Int64Builder, StringBuilder,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;

type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Write rows `first..first + rows` with columns
/// `id, name, score, flag, payload`, `rows_per_group` rows per row group.
///
/// `name` is null whenever `id` is a multiple of 3.
pub fn write_people(path: &Path, first: i64, rows: usize, rows_per_group: usize) -> TestResult {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut id_builder = Int64Builder::with_capacity(rows);
    let mut name_builder = StringBuilder::new();
    let mut score_builder = Float64Builder::with_capacity(rows);
    let mut flag_builder = BooleanBuilder::with_capacity(rows);
    let mut payload_builder = BinaryBuilder::new();

    for id in first..first + rows as i64 {
        id_builder.append_value(id);
        if id % 3 == 0 {
            name_builder.append_null();
        } else {
            name_builder.append_value(format!("n{id}"));
        }
        score_builder.append_value(id as f64 * 0.5);
        flag_builder.append_value(id % 2 == 0);
        payload_builder.append_value([id as u8, 0xff]);
    }

    let schema = Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("name", DataType::Utf8, true),
        Field::new("score", DataType::Float64, false),
        Field::new("flag", DataType::Boolean, false),
        Field::new("payload", DataType::Binary, false),
    ]);

    let batch = RecordBatch::try_new(
        Arc::new(schema.clone()),
        vec![
            Arc::new(id_builder.finish()) as _,
            Arc::new(name_builder.finish()),
            Arc::new(score_builder.finish()),
            Arc::new(flag_builder.finish()),
            Arc::new(payload_builder.finish()),
        ],
    )?;

    let props = WriterProperties::builder()
        .set_max_row_group_size(rows_per_group)
        .build();
    let file = std::fs::File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, Arc::new(schema), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    Ok(())
}

/// A file whose only column is a 32-bit float, which has no SQL mapping.
pub fn write_float32(path: &Path) -> TestResult {
    let mut builder = Float32Builder::new();
    builder.append_value(1.5);

    let schema = Schema::new(vec![Field::new("f", DataType::Float32, false)]);
    let batch = RecordBatch::try_new(
        Arc::new(schema.clone()),
        vec![Arc::new(builder.finish()) as _],
    )?;

    let file = std::fs::File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, Arc::new(schema), None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}
