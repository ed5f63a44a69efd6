//! Per-physical-type value extraction from forward-only column streams.
//!
//! A [`ColumnStream`] wraps one typed Parquet column reader for one row
//! group. The variant is chosen once when the stream is opened, so the
//! per-value path is a plain match with no dynamic dispatch. Each call to
//! [`ColumnStream::next_value`] consumes exactly one record.

use parquet::basic::Type as PhysicalType;
use parquet::column::reader::{ColumnReader, ColumnReaderImpl};
use parquet::data_type::{ByteArray, DataType, Int96};
use parquet::errors::ParquetError;
use snafu::{Backtrace, prelude::*};

/// Julian day number of 1970-01-01.
pub const JULIAN_DAY_OF_EPOCH: i64 = 2_440_588;

const NANOS_PER_DAY: i128 = 86_400 * 1_000_000_000;
const NANOS_PER_MILLI: i128 = 1_000_000;

/// Errors raised while pulling values out of a column stream.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DecodeError {
    /// The stream ran dry while the row group still claims rows.
    #[snafu(display("column {column}: unexpectedly lacking a next value"))]
    StreamExhausted {
        /// Column ordinal.
        column: usize,
    },

    /// A physical type that schema derivation rejects reached the decoder.
    #[snafu(display("column {column} has unsupported type: {physical}"))]
    UnsupportedPhysicalType {
        /// Column ordinal.
        column: usize,
        /// Physical type found in the row group.
        physical: PhysicalType,
    },

    /// The underlying reader failed (corrupt page, decompression, ...).
    #[snafu(display("column {column}: parquet decode error: {source}"))]
    Parquet {
        /// Column ordinal.
        column: usize,
        /// Underlying parquet error.
        source: ParquetError,
        /// Backtrace at the failure site.
        backtrace: Backtrace,
    },
}

/// Convert a legacy 96-bit timestamp to milliseconds since the Unix epoch.
///
/// The low 64 bits (two little-endian 32-bit words) are nanoseconds into the
/// day, the top 32 bits the Julian day. Intermediate math runs in `i128`.
pub fn int96_to_epoch_millis(value: &Int96) -> i64 {
    let words = value.data();
    let nanos_of_day = (u64::from(words[1]) << 32) | u64::from(words[0]);
    let julian_day = i128::from(words[2]);

    let nanos = (julian_day - i128::from(JULIAN_DAY_OF_EPOCH)) * NANOS_PER_DAY
        + i128::from(nanos_of_day);

    // |julian_day| < 2^32 bounds the result well inside i64.
    (nanos / NANOS_PER_MILLI) as i64
}

/// One decoded value, in the representation chosen by the physical type.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueSlot {
    /// Boolean, INT32, INT64 and INT96 (as epoch millis).
    Int(i64),
    /// DOUBLE.
    Double(f64),
    /// BYTE_ARRAY.
    Bytes(ByteArray),
}

/// Result of consuming one record.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    /// True if the record holds no value.
    pub is_null: bool,
    /// Value, or the representation's zero value when null.
    pub slot: ValueSlot,
}

/// Scratch buffers reused across reads of one typed column.
struct TypedStream<T: DataType> {
    reader: ColumnReaderImpl<T>,
    def_levels: Vec<i16>,
    values: Vec<T::T>,
}

impl<T: DataType> TypedStream<T> {
    fn new(reader: ColumnReaderImpl<T>) -> Self {
        Self {
            reader,
            def_levels: Vec::with_capacity(1),
            values: Vec::with_capacity(1),
        }
    }

    /// Read one record; `Ok(None)` means the record is null.
    fn read_one(&mut self, column: usize, max_def_level: i16) -> Result<Option<T::T>, DecodeError> {
        self.def_levels.clear();
        self.values.clear();

        let def_levels = if max_def_level > 0 {
            Some(&mut self.def_levels)
        } else {
            None
        };
        let (records, values_read, _levels) = self
            .reader
            .read_records(1, def_levels, None, &mut self.values)
            .context(ParquetSnafu { column })?;

        ensure!(records == 1, StreamExhaustedSnafu { column });

        if values_read == 0 {
            return Ok(None);
        }
        Ok(self.values.pop())
    }

    fn skip(&mut self, column: usize, count: usize) -> Result<(), DecodeError> {
        let skipped = self
            .reader
            .skip_records(count)
            .context(ParquetSnafu { column })?;
        ensure!(skipped == count, StreamExhaustedSnafu { column });
        Ok(())
    }
}

enum Stream {
    Bool(TypedStream<parquet::data_type::BoolType>),
    Int32(TypedStream<parquet::data_type::Int32Type>),
    Int64(TypedStream<parquet::data_type::Int64Type>),
    Int96(TypedStream<parquet::data_type::Int96Type>),
    Double(TypedStream<parquet::data_type::DoubleType>),
    ByteArray(TypedStream<parquet::data_type::ByteArrayType>),
}

/// Forward-only decode stream for one column of one row group.
pub struct ColumnStream {
    column: usize,
    max_def_level: i16,
    stream: Stream,
}

impl ColumnStream {
    /// Wrap a column reader. FLOAT and FIXED_LEN_BYTE_ARRAY are rejected.
    pub fn open(
        column: usize,
        max_def_level: i16,
        reader: ColumnReader,
    ) -> Result<Self, DecodeError> {
        let stream = match reader {
            ColumnReader::BoolColumnReader(r) => Stream::Bool(TypedStream::new(r)),
            ColumnReader::Int32ColumnReader(r) => Stream::Int32(TypedStream::new(r)),
            ColumnReader::Int64ColumnReader(r) => Stream::Int64(TypedStream::new(r)),
            ColumnReader::Int96ColumnReader(r) => Stream::Int96(TypedStream::new(r)),
            ColumnReader::DoubleColumnReader(r) => Stream::Double(TypedStream::new(r)),
            ColumnReader::ByteArrayColumnReader(r) => Stream::ByteArray(TypedStream::new(r)),
            ColumnReader::FloatColumnReader(_) => {
                return UnsupportedPhysicalTypeSnafu {
                    column,
                    physical: PhysicalType::FLOAT,
                }
                .fail();
            }
            ColumnReader::FixedLenByteArrayColumnReader(_) => {
                return UnsupportedPhysicalTypeSnafu {
                    column,
                    physical: PhysicalType::FIXED_LEN_BYTE_ARRAY,
                }
                .fail();
            }
        };

        Ok(Self {
            column,
            max_def_level,
            stream,
        })
    }

    /// Physical type this stream decodes.
    pub fn physical_type(&self) -> PhysicalType {
        match self.stream {
            Stream::Bool(_) => PhysicalType::BOOLEAN,
            Stream::Int32(_) => PhysicalType::INT32,
            Stream::Int64(_) => PhysicalType::INT64,
            Stream::Int96(_) => PhysicalType::INT96,
            Stream::Double(_) => PhysicalType::DOUBLE,
            Stream::ByteArray(_) => PhysicalType::BYTE_ARRAY,
        }
    }

    /// Consume and decode the next record.
    pub fn next_value(&mut self) -> Result<Decoded, DecodeError> {
        let (column, max_def) = (self.column, self.max_def_level);

        let decoded = match &mut self.stream {
            Stream::Bool(s) => int_slot(s.read_one(column, max_def)?.map(i64::from)),
            Stream::Int32(s) => int_slot(s.read_one(column, max_def)?.map(i64::from)),
            Stream::Int64(s) => int_slot(s.read_one(column, max_def)?),
            Stream::Int96(s) => int_slot(
                s.read_one(column, max_def)?
                    .as_ref()
                    .map(int96_to_epoch_millis),
            ),
            Stream::Double(s) => match s.read_one(column, max_def)? {
                Some(v) => Decoded {
                    is_null: false,
                    slot: ValueSlot::Double(v),
                },
                None => Decoded {
                    is_null: true,
                    slot: ValueSlot::Double(0.0),
                },
            },
            Stream::ByteArray(s) => match s.read_one(column, max_def)? {
                Some(v) => Decoded {
                    is_null: false,
                    slot: ValueSlot::Bytes(v),
                },
                None => Decoded {
                    is_null: true,
                    slot: ValueSlot::Bytes(ByteArray::from(Vec::new())),
                },
            },
        };

        Ok(decoded)
    }

    /// Consume `count` records without decoding them.
    pub fn skip(&mut self, count: usize) -> Result<(), DecodeError> {
        if count == 0 {
            return Ok(());
        }
        let column = self.column;
        match &mut self.stream {
            Stream::Bool(s) => s.skip(column, count),
            Stream::Int32(s) => s.skip(column, count),
            Stream::Int64(s) => s.skip(column, count),
            Stream::Int96(s) => s.skip(column, count),
            Stream::Double(s) => s.skip(column, count),
            Stream::ByteArray(s) => s.skip(column, count),
        }
    }
}

fn int_slot(value: Option<i64>) -> Decoded {
    match value {
        Some(v) => Decoded {
            is_null: false,
            slot: ValueSlot::Int(v),
        },
        None => Decoded {
            is_null: true,
            slot: ValueSlot::Int(0),
        },
    }
}
