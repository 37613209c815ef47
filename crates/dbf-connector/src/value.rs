//! Per-cell decoding into typed values.
//!
//! The structured reader's null test runs first and wins for every kind.
//! After that only IO and strict transcoding failures are errors: a
//! malformed date decodes to null.

use crate::dbf::DbfTable;
use crate::encoding::TextDecoder;
use crate::error::{ConvertError, ConvertResult};
use crate::schema::{ColumnKind, ColumnSpec};

/// Julian day number of 1970-01-01.
pub const UNIX_EPOCH_JDN: i64 = 2_440_588;

/// One decoded cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// No value.
    Null,
    /// Text value.
    Text(String),
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int64(i64),
    /// Float value.
    Float64(f64),
    /// Days since 1970-01-01.
    Date32(i32),
}

impl Cell {
    /// Kind of the value, `None` for null.
    #[must_use]
    pub fn kind(&self) -> Option<ColumnKind> {
        match self {
            Self::Null => None,
            Self::Text(_) => Some(ColumnKind::Text),
            Self::Bool(_) => Some(ColumnKind::Bool),
            Self::Int64(_) => Some(ColumnKind::Int64),
            Self::Float64(_) => Some(ColumnKind::Float64),
            Self::Date32(_) => Some(ColumnKind::Date32),
        }
    }

    /// Whether the cell is null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether the cell may be stored in a column of `kind`.
    #[must_use]
    pub fn fits(&self, kind: ColumnKind) -> bool {
        self.kind().map_or(true, |k| k == kind)
    }
}

/// Civil date → Julian day number (proleptic Gregorian).
#[must_use]
pub fn julian_day_number(year: i64, month: i64, day: i64) -> i64 {
    let a = (14 - month) / 12;
    let y = year + 4800 - a;
    let m = month + 12 * a - 3;
    day + (153 * m + 2) / 5 + 365 * y + y / 4 - y / 100 + y / 400 - 32045
}

/// Parses `YYYYMMDD` into days since 1970-01-01.
///
/// Only the first eight bytes are read. Returns `None` for fewer than eight
/// bytes, a non-digit, year ≤ 0, month outside 1..=12, or day outside
/// 1..=31. Day-of-month is not checked against the month's length.
#[must_use]
pub fn parse_yyyymmdd(text: &[u8]) -> Option<i32> {
    let digits = text.get(..8)?;
    if !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let number = |range: std::ops::Range<usize>| {
        digits[range]
            .iter()
            .fold(0i64, |acc, &d| acc * 10 + i64::from(d - b'0'))
    };
    let (year, month, day) = (number(0..4), number(4..6), number(6..8));
    if year <= 0 || !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    i32::try_from(julian_day_number(year, month, day) - UNIX_EPOCH_JDN).ok()
}

/// Decodes cells from a table under one text decoder.
#[derive(Debug, Clone, Copy)]
pub struct ValueDecoder {
    text: TextDecoder,
}

impl ValueDecoder {
    /// Creates a value decoder.
    #[must_use]
    pub fn new(text: TextDecoder) -> Self {
        Self { text }
    }

    /// Decodes the cell at (`row`, `col`).
    ///
    /// # Errors
    ///
    /// [`ConvertError::Record`] when the record cannot be read and
    /// [`ConvertError::Decode`] when strict transcoding fails.
    pub fn decode_cell(
        &self,
        table: &mut DbfTable,
        spec: &ColumnSpec,
        col: usize,
        row: usize,
    ) -> ConvertResult<Cell> {
        if table.is_attribute_null(row, col)? {
            return Ok(Cell::Null);
        }
        let cell = match spec.kind {
            ColumnKind::Text => {
                let raw = table.read_string_attribute(row, col)?;
                let end = raw.iter().rposition(|&b| b > b' ').map_or(0, |i| i + 1);
                if end == 0 {
                    Cell::Null
                } else {
                    let text = self
                        .text
                        .decode(&raw[..end])
                        .map_err(|source| ConvertError::Decode {
                            row,
                            column: spec.name.clone(),
                            source,
                        })?;
                    Cell::Text(text)
                }
            }
            ColumnKind::Bool => match table.read_string_attribute(row, col)?.first() {
                None => Cell::Null,
                Some(b) => Cell::Bool(matches!(b.to_ascii_uppercase(), b'Y' | b'T' | b'1')),
            },
            ColumnKind::Int64 => Cell::Int64(table.read_integer_attribute(row, col)?),
            ColumnKind::Float64 => Cell::Float64(table.read_double_attribute(row, col)?),
            ColumnKind::Date32 => {
                parse_yyyymmdd(table.read_string_attribute(row, col)?).map_or(Cell::Null, Cell::Date32)
            }
        };
        Ok(cell)
    }

    /// Decodes every column of `row`. Nothing is returned unless all cells
    /// decode.
    ///
    /// # Errors
    ///
    /// The first cell error, see [`decode_cell`](Self::decode_cell).
    pub fn decode_row(
        &self,
        table: &mut DbfTable,
        columns: &[ColumnSpec],
        row: usize,
    ) -> ConvertResult<Vec<Cell>> {
        columns
            .iter()
            .enumerate()
            .map(|(col, spec)| self.decode_cell(table, spec, col, row))
            .collect()
    }
}
