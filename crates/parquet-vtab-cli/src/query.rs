use std::io::Write;
use std::time::{Duration, Instant};

use parquet_vtab_core::{ConstraintSet, Cursor, LogicalTable, ScanStats, Value};
use snafu::ResultExt;
use tabled::{builder::Builder, settings::Style};

use crate::error::{CliResult, CsvSnafu, ScanSnafu, WriteOutputSnafu};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Csv,
}

#[derive(Debug, Clone)]
pub struct ScanOpts {
    /// Column ordinals to output, in order.
    pub columns: Vec<usize>,
    pub max_rows: Option<usize>,
    pub format: OutputFormat,
    pub stats: bool,
}

#[derive(Debug, Clone)]
pub struct ScanResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub total_rows: u64,
    pub stats: ScanStats,
    pub elapsed: Duration,
}

/// Drive a cursor over `table` and collect the selected columns.
///
/// Rows past `max_rows` are still counted but not materialized.
pub fn run_scan(
    table: &LogicalTable,
    constraints: ConstraintSet,
    opts: &ScanOpts,
) -> CliResult<ScanResult> {
    let start = Instant::now();
    let columns = opts
        .columns
        .iter()
        .map(|&i| table.columns()[i].name.clone())
        .collect();

    let mut cursor = Cursor::new(table, constraints).context(ScanSnafu)?;
    let mut rows = Vec::new();
    let mut total_rows = 0u64;

    cursor.next().context(ScanSnafu)?;
    while !cursor.eof() {
        if opts.max_rows.is_none_or(|max| rows.len() < max) {
            let row = opts
                .columns
                .iter()
                .map(|&col| cursor.value(col))
                .collect::<Result<Vec<_>, _>>()
                .context(ScanSnafu)?;
            rows.push(row);
        }
        total_rows += 1;
        cursor.next().context(ScanSnafu)?;
    }

    Ok(ScanResult {
        columns,
        rows,
        total_rows,
        stats: cursor.stats(),
        elapsed: start.elapsed(),
    })
}

pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(v) => v.to_string(),
        Value::Double(v) => v.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => format!("x'{}'", hex::encode(b)),
    }
}

pub fn render_table(columns: &[String], rows: &[Vec<Value>]) -> String {
    if columns.is_empty() {
        return String::new();
    }

    let mut builder = Builder::default();
    builder.push_record(columns);
    for row in rows {
        builder.push_record(row.iter().map(display_value));
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

/// Write the header and rows as CSV. Nulls become empty fields.
pub fn write_csv<W: Write>(res: &ScanResult, out: &mut W) -> CliResult<()> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out);

    writer.write_record(&res.columns).context(CsvSnafu)?;
    for row in &res.rows {
        writer
            .write_record(row.iter().map(|value| match value {
                Value::Null => String::new(),
                other => display_value(other),
            }))
            .context(CsvSnafu)?;
    }
    writer.flush().context(WriteOutputSnafu)?;
    Ok(())
}

pub fn write_scan_summary<W: Write>(res: &ScanResult, out: &mut W) -> CliResult<()> {
    let s = &res.stats;
    writeln!(out, "total_rows: {}", res.total_rows).context(WriteOutputSnafu)?;
    writeln!(out, "elapsed_ms: {}", res.elapsed.as_millis()).context(WriteOutputSnafu)?;
    writeln!(out, "row_groups_scanned: {}", s.row_groups_scanned).context(WriteOutputSnafu)?;
    writeln!(out, "row_groups_pruned: {}", s.row_groups_pruned).context(WriteOutputSnafu)?;
    writeln!(out, "rows_pruned: {}", s.rows_pruned).context(WriteOutputSnafu)?;
    writeln!(out, "rows_filtered: {}", s.rows_filtered).context(WriteOutputSnafu)?;
    writeln!(out, "values_decoded: {}", s.values_decoded).context(WriteOutputSnafu)?;
    writeln!(out, "values_skipped: {}", s.values_skipped).context(WriteOutputSnafu)?;
    Ok(())
}

pub fn write_scan_result<W: Write>(res: &ScanResult, opts: &ScanOpts, out: &mut W) -> CliResult<()> {
    match opts.format {
        OutputFormat::Csv => write_csv(res, out)?,
        OutputFormat::Table => {
            if res.total_rows == 0 {
                writeln!(out, "(no rows)").context(WriteOutputSnafu)?;
            } else {
                writeln!(out, "{}", render_table(&res.columns, &res.rows))
                    .context(WriteOutputSnafu)?;
                if (res.rows.len() as u64) < res.total_rows {
                    writeln!(
                        out,
                        "(showing {} of {} rows; raise --max-rows to see more)",
                        res.rows.len(),
                        res.total_rows
                    )
                    .context(WriteOutputSnafu)?;
                }
            }
        }
    }

    // CSV output stays machine-readable unless statistics were asked for.
    if opts.stats {
        write_scan_summary(res, out)?;
    }
    Ok(())
}
