//! Forward-only scan over a [`LogicalTable`].
//!
//! A [`Cursor`] walks the table's global row groups in order. Before a row
//! group is opened its statistics are checked against the scan's
//! constraints; a row group that cannot match is skipped as a block, without
//! creating a reader or decoding anything. Inside a surviving row group the
//! cursor advances one row at a time and decodes a column only when someone
//! asks for it:
//!
//! - each column has its own decode stream, opened on first access within the
//!   row group;
//! - a decoded value is cached against the row id it belongs to, so repeated
//!   reads on the same row do not touch the stream;
//! - a column that was not read for some rows is caught up by skipping those
//!   records the next time it is read.
//!
//! Row ids are absolute positions in the table's scan order. They increase
//! monotonically and advance past pruned row groups by their row count.

mod filter;

use log::{debug, trace};
use parquet::basic::Type as PhysicalType;
use parquet::file::reader::RowGroupReader;
use snafu::prelude::*;

use crate::constraint::{ColumnRef, Constraint, ConstraintSet, FilterKind};
use crate::decode::{ColumnStream, ParquetSnafu, ValueSlot};
use crate::schema::SqlType;
use crate::table::LogicalTable;
use crate::table::error::{
    ColumnOutOfRangeSnafu, DecodeSnafu, NotPositionedSnafu, RowGroupColumnCountSnafu,
    TableResult, ValueOutOfRangeSnafu, ValueTypeMismatchSnafu,
};

/// Scan position of a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Created or reset; `next` has not been called yet.
    BeforeFirst,
    /// On a row that satisfies the constraints.
    Positioned,
    /// Past the last row. Terminal until `reset`.
    Exhausted,
}

/// Counters describing the work a scan has done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Row groups opened for row-by-row scanning.
    pub row_groups_scanned: usize,
    /// Row groups skipped using statistics.
    pub row_groups_pruned: usize,
    /// Rows skipped as part of pruned row groups.
    pub rows_pruned: i64,
    /// Rows visited but rejected by a row-level constraint.
    pub rows_filtered: i64,
    /// Values pulled out of decode streams.
    pub values_decoded: u64,
    /// Values consumed without decoding to catch a column up.
    pub values_skipped: u64,
}

/// Owned value of one column on the current row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL.
    Null,
    /// Integer family.
    Integer(i64),
    /// Floating point.
    Double(f64),
    /// UTF-8 text (invalid sequences replaced).
    Text(String),
    /// Opaque bytes.
    Blob(Vec<u8>),
}

fn representation(slot: &ValueSlot) -> &'static str {
    match slot {
        ValueSlot::Int(_) => "integer",
        ValueSlot::Double(_) => "double",
        ValueSlot::Bytes(_) => "bytes",
    }
}

/// Lazy decode state of one column.
///
/// The stream moves through closed -> open at the row group's first row ->
/// advanced to row k. `next_row` is the row id the stream yields next.
struct ColumnSlot {
    physical: PhysicalType,
    max_def_level: i16,
    stream: Option<ColumnStream>,
    next_row: i64,
    decoded_row: Option<i64>,
    is_null: bool,
    value: ValueSlot,
}

impl ColumnSlot {
    fn new(physical: PhysicalType) -> Self {
        Self {
            physical,
            max_def_level: 0,
            stream: None,
            next_row: 0,
            decoded_row: None,
            is_null: true,
            value: ValueSlot::Int(0),
        }
    }

    fn enter_row_group(&mut self, physical: PhysicalType, max_def_level: i16, start: i64) {
        self.physical = physical;
        self.max_def_level = max_def_level;
        self.stream = None;
        self.next_row = start;
        self.decoded_row = None;
    }

    fn close(&mut self) {
        self.stream = None;
        self.decoded_row = None;
    }
}

/// Reader and per-column decode state of the row group being scanned.
struct RowGroupColumns<'t> {
    reader: Option<Box<dyn RowGroupReader + 't>>,
    slots: Vec<ColumnSlot>,
}

impl<'t> RowGroupColumns<'t> {
    fn close(&mut self) {
        self.reader = None;
        for slot in &mut self.slots {
            slot.close();
        }
    }

    /// Decode `column` at `row_id` unless it is already cached.
    fn ensure(
        &mut self,
        column: usize,
        row_id: i64,
        row_group: usize,
        stats: &mut ScanStats,
    ) -> TableResult<&ColumnSlot> {
        let count = self.slots.len() + 1;
        let slot = self
            .slots
            .get_mut(column)
            .context(ColumnOutOfRangeSnafu {
                index: column,
                count,
            })?;

        if slot.decoded_row == Some(row_id) {
            return Ok(slot);
        }

        if slot.stream.is_none() {
            let reader = self.reader.as_ref().context(NotPositionedSnafu)?;
            let column_reader = reader
                .get_column_reader(column)
                .context(ParquetSnafu { column })
                .context(DecodeSnafu { row_group })?;
            let stream = ColumnStream::open(column, slot.max_def_level, column_reader)
                .context(DecodeSnafu { row_group })?;
            slot.stream = Some(stream);
        }
        let Some(stream) = slot.stream.as_mut() else {
            return NotPositionedSnafu.fail();
        };

        let behind = row_id - slot.next_row;
        if behind > 0 {
            trace!("column {column}: skipping {behind} values to reach row {row_id}");
            stream
                .skip(behind as usize)
                .context(DecodeSnafu { row_group })?;
            stats.values_skipped += behind as u64;
        }

        let decoded = stream.next_value().context(DecodeSnafu { row_group })?;
        stats.values_decoded += 1;

        slot.next_row = row_id + 1;
        slot.decoded_row = Some(row_id);
        slot.is_null = decoded.is_null;
        slot.value = decoded.slot;
        Ok(slot)
    }
}

/// Scan driver over a [`LogicalTable`].
///
/// Not thread-safe; one cursor per active scan. Dropping or resetting the
/// cursor releases every reader it opened.
pub struct Cursor<'t> {
    table: &'t LogicalTable,
    constraints: ConstraintSet,
    state: CursorState,
    row_id: i64,
    row_group_ordinal: Option<usize>,
    rows_left_in_row_group: i64,
    row_group_start_row_id: i64,
    row_group_row_count: i64,
    row_filters: Vec<usize>,
    columns: RowGroupColumns<'t>,
    stats: ScanStats,
}

impl<'t> Cursor<'t> {
    /// Create a cursor positioned before the first row.
    pub fn new(table: &'t LogicalTable, constraints: ConstraintSet) -> TableResult<Self> {
        let slots = table
            .columns()
            .iter()
            .filter_map(|c| c.physical)
            .map(ColumnSlot::new)
            .collect();

        let mut cursor = Self {
            table,
            constraints: ConstraintSet::new(),
            state: CursorState::BeforeFirst,
            row_id: -1,
            row_group_ordinal: None,
            rows_left_in_row_group: 0,
            row_group_start_row_id: 0,
            row_group_row_count: 0,
            row_filters: Vec::new(),
            columns: RowGroupColumns {
                reader: None,
                slots,
            },
            stats: ScanStats::default(),
        };
        cursor.reset(constraints)?;
        Ok(cursor)
    }

    /// Rebind the cursor to new constraints and rewind it before the first row.
    pub fn reset(&mut self, constraints: ConstraintSet) -> TableResult<()> {
        self.columns.close();
        self.constraints = self.normalize(constraints)?;
        self.state = CursorState::BeforeFirst;
        self.row_id = -1;
        self.row_group_ordinal = None;
        self.rows_left_in_row_group = 0;
        self.row_group_start_row_id = 0;
        self.row_group_row_count = 0;
        self.row_filters.clear();
        self.stats = ScanStats::default();
        Ok(())
    }

    /// Validate column references; a constraint on the row-id ordinal becomes
    /// a row-id constraint.
    fn normalize(&self, constraints: ConstraintSet) -> TableResult<ConstraintSet> {
        constraints
            .iter()
            .map(|c| match self.table.column_ref(column_ordinal(self.table, c))? {
                ColumnRef::RowId if c.kind() != FilterKind::RowId => Ok(Constraint::new(
                    ColumnRef::RowId,
                    c.op,
                    c.value.clone(),
                )),
                _ => Ok(c.clone()),
            })
            .collect::<TableResult<Vec<_>>>()
            .map(ConstraintSet::from)
    }

    /// Release all readers and move to `Exhausted`.
    pub fn close(&mut self) {
        self.columns.close();
        self.row_filters.clear();
        self.rows_left_in_row_group = 0;
        self.row_id = self.table.num_rows();
        self.state = CursorState::Exhausted;
    }

    /// Advance to the next row satisfying all constraints.
    ///
    /// Once past the last row the cursor is `Exhausted` and further calls
    /// are no-ops.
    pub fn next(&mut self) -> TableResult<()> {
        if self.state == CursorState::Exhausted {
            return Ok(());
        }

        loop {
            if self.rows_left_in_row_group == 0 && !self.next_row_group()? {
                self.close();
                return Ok(());
            }

            self.rows_left_in_row_group -= 1;
            self.row_id += 1;
            self.state = CursorState::Positioned;

            if self.current_row_satisfies_filter()? {
                return Ok(());
            }
            self.stats.rows_filtered += 1;
        }
    }

    /// Move to the next row group worth scanning. Returns false at the end.
    fn next_row_group(&mut self) -> TableResult<bool> {
        self.columns.close();
        let table = self.table;

        loop {
            let ordinal = self.row_group_ordinal.map_or(0, |o| o + 1);
            if ordinal >= table.num_row_groups() {
                return Ok(false);
            }
            self.row_group_ordinal = Some(ordinal);

            let meta = table.row_group_metadata(ordinal)?;
            let start = self.row_id + 1;
            let count = meta.num_rows();
            self.row_group_start_row_id = start;
            self.row_group_row_count = count;

            if count == 0 {
                continue;
            }

            let expected = self.columns.slots.len();
            ensure!(
                meta.num_columns() >= expected,
                RowGroupColumnCountSnafu {
                    row_group: ordinal,
                    expected,
                    found: meta.num_columns(),
                }
            );

            let Some(row_filters) = filter::plan_row_group(&self.constraints, meta, start, count)
            else {
                debug!("row group {ordinal}: pruned {count} rows starting at row {start}");
                self.stats.row_groups_pruned += 1;
                self.stats.rows_pruned += count;
                self.row_id += count;
                continue;
            };

            debug!(
                "row group {ordinal}: scanning {count} rows starting at row {start} \
                 ({} row-level constraints)",
                row_filters.len()
            );
            self.columns.reader = Some(table.row_group_reader(ordinal)?);
            for (i, slot) in self.columns.slots.iter_mut().enumerate() {
                let col = meta.column(i);
                slot.enter_row_group(col.column_type(), col.column_descr().max_def_level(), start);
            }
            self.row_filters = row_filters;
            self.rows_left_in_row_group = count;
            self.stats.row_groups_scanned += 1;
            return Ok(true);
        }
    }

    fn current_row_satisfies_filter(&mut self) -> TableResult<bool> {
        let row_group = self.row_group_ordinal.unwrap_or_default();

        for &i in &self.row_filters {
            let Some(constraint) = self.constraints.get(i) else {
                continue;
            };
            let ok = match constraint.column {
                ColumnRef::RowId => filter::row_id_satisfies(constraint, self.row_id),
                ColumnRef::Column(column) => {
                    let slot =
                        self.columns
                            .ensure(column, self.row_id, row_group, &mut self.stats)?;
                    filter::value_satisfies(constraint, slot.is_null, &slot.value)
                }
            };
            if !ok {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// True once the cursor has moved past the last row.
    pub fn eof(&self) -> bool {
        self.state == CursorState::Exhausted
    }

    /// Current scan state.
    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Absolute row id of the current row; -1 before the first `next`.
    pub fn row_id(&self) -> i64 {
        self.row_id
    }

    /// The table being scanned.
    pub fn table(&self) -> &'t LogicalTable {
        self.table
    }

    /// Number of row groups in the table.
    pub fn num_row_groups(&self) -> usize {
        self.table.num_row_groups()
    }

    /// Global index of the row group holding the current row.
    pub fn current_row_group(&self) -> Option<usize> {
        self.row_group_ordinal
    }

    /// First row id and row count of the current row group.
    pub fn current_row_group_span(&self) -> (i64, i64) {
        (self.row_group_start_row_id, self.row_group_row_count)
    }

    /// Number of constraints bound to this scan.
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Constraint by position.
    pub fn constraint(&self, i: usize) -> Option<&Constraint> {
        self.constraints.get(i)
    }

    /// Work counters for this scan.
    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    fn check_positioned(&self) -> TableResult<()> {
        ensure!(self.state == CursorState::Positioned, NotPositionedSnafu);
        Ok(())
    }

    /// Decode `col` for the current row if not already cached.
    ///
    /// The row-id ordinal needs no decoding.
    pub fn ensure_column(&mut self, col: usize) -> TableResult<()> {
        self.slot(col).map(|_| ())
    }

    /// Cached slot of `col` at the current row; `None` for the row id.
    fn slot(&mut self, col: usize) -> TableResult<Option<&ColumnSlot>> {
        self.check_positioned()?;
        match self.table.column_ref(col)? {
            ColumnRef::RowId => Ok(None),
            ColumnRef::Column(column) => {
                let row_group = self.row_group_ordinal.unwrap_or_default();
                self.columns
                    .ensure(column, self.row_id, row_group, &mut self.stats)
                    .map(Some)
            }
        }
    }

    /// True if `col` is null on the current row.
    pub fn is_null(&mut self, col: usize) -> TableResult<bool> {
        Ok(self.slot(col)?.is_some_and(|s| s.is_null))
    }

    /// Integer value of `col`; 0 when null.
    pub fn get_i64(&mut self, col: usize) -> TableResult<i64> {
        let row_id = self.row_id;
        match self.slot(col)? {
            None => Ok(row_id),
            Some(ColumnSlot {
                value: ValueSlot::Int(v),
                ..
            }) => Ok(*v),
            Some(slot) => ValueTypeMismatchSnafu {
                column: col,
                requested: "integer",
                found: representation(&slot.value),
            }
            .fail(),
        }
    }

    /// Integer value of `col` narrowed to 32 bits.
    pub fn get_i32(&mut self, col: usize) -> TableResult<i32> {
        let value = self.get_i64(col)?;
        i32::try_from(value).ok().context(ValueOutOfRangeSnafu {
            column: col,
            value,
            target: SqlType::Int,
        })
    }

    /// Floating-point value of `col`; 0.0 when null.
    pub fn get_f64(&mut self, col: usize) -> TableResult<f64> {
        match self.slot(col)? {
            Some(ColumnSlot {
                value: ValueSlot::Double(v),
                ..
            }) => Ok(*v),
            Some(slot) => ValueTypeMismatchSnafu {
                column: col,
                requested: "double",
                found: representation(&slot.value),
            }
            .fail(),
            None => ValueTypeMismatchSnafu {
                column: col,
                requested: "double",
                found: "integer",
            }
            .fail(),
        }
    }

    /// Byte value of `col`; empty when null.
    pub fn get_bytes(&mut self, col: usize) -> TableResult<&[u8]> {
        match self.slot(col)? {
            Some(ColumnSlot {
                value: ValueSlot::Bytes(v),
                ..
            }) => Ok(v.data()),
            Some(slot) => ValueTypeMismatchSnafu {
                column: col,
                requested: "bytes",
                found: representation(&slot.value),
            }
            .fail(),
            None => ValueTypeMismatchSnafu {
                column: col,
                requested: "bytes",
                found: "integer",
            }
            .fail(),
        }
    }

    /// Owned value of `col` on the current row.
    pub fn value(&mut self, col: usize) -> TableResult<Value> {
        let row_id = self.row_id;
        let is_text = self.is_string_type(col)?;
        let value = match self.slot(col)? {
            None => Value::Integer(row_id),
            Some(slot) if slot.is_null => Value::Null,
            Some(slot) => match &slot.value {
                ValueSlot::Int(v) => Value::Integer(*v),
                ValueSlot::Double(v) => Value::Double(*v),
                ValueSlot::Bytes(v) if is_text => {
                    Value::Text(String::from_utf8_lossy(v.data()).into_owned())
                }
                ValueSlot::Bytes(v) => Value::Blob(v.data().to_vec()),
            },
        };
        Ok(value)
    }

    /// Physical type of `col` in the current row group; `None` for the row id.
    pub fn physical_type(&self, col: usize) -> TableResult<Option<PhysicalType>> {
        match self.table.column_ref(col)? {
            ColumnRef::RowId => Ok(None),
            ColumnRef::Column(column) => Ok(self.columns.slots.get(column).map(|s| s.physical)),
        }
    }

    /// True if `col` is exposed as TEXT.
    pub fn is_string_type(&self, col: usize) -> TableResult<bool> {
        self.table.column_ref(col)?;
        Ok(self.table.columns()[col].sql_type == SqlType::Text)
    }
}

fn column_ordinal(table: &LogicalTable, constraint: &Constraint) -> usize {
    match constraint.column {
        ColumnRef::RowId => table.row_id_column(),
        ColumnRef::Column(i) => i,
    }
}
