//! Row-to-columnar batch assembly.
//!
//! [`BatchAssembler`] keeps one Arrow builder per column. A row is checked
//! against the schema as a whole before any builder is touched, so a rejected
//! row never leaves the columns with unequal lengths.

use std::sync::Arc;

use arrow_array::builder::{
    BooleanBuilder, Date32Builder, Float64Builder, Int64Builder, StringBuilder,
};
use arrow_array::{Array, ArrayRef, RecordBatch, RecordBatchOptions};
use arrow_schema::SchemaRef;

use crate::error::BatchError;
use crate::schema::{arrow_schema, ColumnKind, ColumnSpec};
use crate::value::Cell;

// ── Builder helpers ────────────────────────────────────────────────

/// Trait-object wrapper so heterogeneous builders fit in a `Vec`.
trait ColumnBuilder: Send {
    /// Appends a cell, handing it back if its kind does not fit.
    fn append(&mut self, cell: Cell) -> Result<(), Cell>;
    fn finish(&mut self) -> ArrayRef;
}

macro_rules! impl_column_builder {
    ($builder:ty, $variant:ident) => {
        impl ColumnBuilder for $builder {
            fn append(&mut self, cell: Cell) -> Result<(), Cell> {
                match cell {
                    Cell::Null => self.append_null(),
                    Cell::$variant(v) => self.append_value(v),
                    other => return Err(other),
                }
                Ok(())
            }
            fn finish(&mut self) -> ArrayRef {
                Arc::new(<$builder>::finish(self))
            }
        }
    };
}

impl_column_builder!(StringBuilder, Text);
impl_column_builder!(BooleanBuilder, Bool);
impl_column_builder!(Int64Builder, Int64);
impl_column_builder!(Float64Builder, Float64);
impl_column_builder!(Date32Builder, Date32);

/// Upper bound on rows reserved up front; builders grow past it on demand.
const MAX_PREALLOC_ROWS: usize = 64 * 1024;

fn create_builder(kind: ColumnKind, capacity: usize) -> Box<dyn ColumnBuilder> {
    let rows = capacity.min(MAX_PREALLOC_ROWS);
    match kind {
        ColumnKind::Text => Box::new(StringBuilder::with_capacity(rows, rows.saturating_mul(16))),
        ColumnKind::Bool => Box::new(BooleanBuilder::with_capacity(rows)),
        ColumnKind::Int64 => Box::new(Int64Builder::with_capacity(rows)),
        ColumnKind::Float64 => Box::new(Float64Builder::with_capacity(rows)),
        ColumnKind::Date32 => Box::new(Date32Builder::with_capacity(rows)),
    }
}

// ── Assembler ──────────────────────────────────────────────────────

/// Accumulates decoded rows and seals them into fixed-capacity batches.
///
/// Every sealed batch except possibly the last holds exactly `capacity`
/// rows; the last holds between 1 and `capacity`. Empty batches are never
/// produced.
pub struct BatchAssembler {
    schema: SchemaRef,
    kinds: Vec<ColumnKind>,
    capacity: usize,
    builders: Vec<Box<dyn ColumnBuilder>>,
    rows: usize,
}

impl std::fmt::Debug for BatchAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchAssembler")
            .field("kinds", &self.kinds)
            .field("capacity", &self.capacity)
            .field("rows", &self.rows)
            .finish_non_exhaustive()
    }
}

impl BatchAssembler {
    /// Creates an assembler for `columns` sealing every `capacity` rows.
    ///
    /// # Errors
    ///
    /// [`BatchError::ZeroCapacity`] when `capacity` is 0.
    pub fn new(columns: &[ColumnSpec], capacity: usize) -> Result<Self, BatchError> {
        if capacity == 0 {
            return Err(BatchError::ZeroCapacity);
        }
        let kinds: Vec<ColumnKind> = columns.iter().map(|c| c.kind).collect();
        let builders = kinds.iter().map(|&k| create_builder(k, capacity)).collect();
        Ok(Self {
            schema: arrow_schema(columns),
            kinds,
            capacity,
            builders,
            rows: 0,
        })
    }

    /// Output schema.
    #[must_use]
    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    /// Rows per sealed batch.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Rows accumulated since the last seal.
    #[must_use]
    pub fn pending_rows(&self) -> usize {
        self.rows
    }

    /// Appends one row. Returns the sealed batch when the row fills it.
    ///
    /// # Errors
    ///
    /// [`BatchError::RowArity`] or [`BatchError::KindMismatch`] when the row
    /// does not match the schema; nothing is appended in that case.
    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<Option<RecordBatch>, BatchError> {
        if row.len() != self.kinds.len() {
            return Err(BatchError::RowArity {
                expected: self.kinds.len(),
                actual: row.len(),
            });
        }
        if let Some((column, cell)) = row
            .iter()
            .enumerate()
            .find(|(i, cell)| !cell.fits(self.kinds[*i]))
        {
            return Err(BatchError::KindMismatch {
                column,
                expected: self.kinds[column],
                actual: cell.kind(),
            });
        }

        for (column, (builder, cell)) in self.builders.iter_mut().zip(row).enumerate() {
            if let Err(cell) = builder.append(cell) {
                return Err(BatchError::KindMismatch {
                    column,
                    expected: self.kinds[column],
                    actual: cell.kind(),
                });
            }
        }
        self.rows += 1;

        if self.rows == self.capacity {
            self.seal().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Seals whatever is pending. Returns `None` when no rows are pending.
    ///
    /// # Errors
    ///
    /// See [`BatchError`].
    pub fn flush(&mut self) -> Result<Option<RecordBatch>, BatchError> {
        if self.rows == 0 {
            return Ok(None);
        }
        self.seal().map(Some)
    }

    fn seal(&mut self) -> Result<RecordBatch, BatchError> {
        let rows = std::mem::take(&mut self.rows);
        let arrays: Vec<ArrayRef> = self.builders.iter_mut().map(|b| b.finish()).collect();
        for (column, array) in arrays.iter().enumerate() {
            if array.len() != rows {
                return Err(BatchError::LengthMismatch {
                    column,
                    expected: rows,
                    actual: array.len(),
                });
            }
        }
        // Row count is explicit so tables without columns still count rows.
        let options = RecordBatchOptions::new().with_row_count(Some(rows));
        Ok(RecordBatch::try_new_with_options(
            self.schema.clone(),
            arrays,
            &options,
        )?)
    }
}
