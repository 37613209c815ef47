//! Table-to-sink conversion driver.
//!
//! [`TableConverter`] walks the table row by row. The scan position is a
//! plain [`RowCursor`] value threaded through [`TableConverter::next_batch`],
//! which yields one sealed batch per call until the table is exhausted.

use std::fmt;
use std::fs;
use std::path::Path;

use arrow_array::RecordBatch;
use arrow_schema::SchemaRef;
use tracing::{debug, info, warn};

use crate::batch::BatchAssembler;
use crate::config::{ConvertConfig, DeletedPolicy};
use crate::container::stage_input;
use crate::dbf::{record_state, DbfTable, RecordState};
use crate::encoding::{resolve_codepage, TextDecoder};
use crate::error::{ConfigError, ConvertResult};
use crate::schema::{arrow_schema, infer_columns, ColumnSpec};
use crate::sink::{ColumnarSink, ParquetSink, ParquetSinkConfig};
use crate::value::ValueDecoder;

/// Scan position and running counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCursor {
    /// Next row to read.
    pub row: usize,
    /// Rows handed to the assembler so far.
    pub accepted: usize,
    /// Deleted rows skipped so far.
    pub skipped: usize,
}

/// Result of one [`TableConverter::next_batch`] call.
#[derive(Debug)]
pub struct BatchStep {
    /// Sealed batch, `None` once the table is exhausted.
    pub batch: Option<RecordBatch>,
    /// Cursor to pass to the next call.
    pub cursor: RowCursor,
}

/// Outcome of a completed conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertSummary {
    /// Code page label the table was decoded with.
    pub encoding: String,
    /// Records read, deleted ones included.
    pub records_scanned: usize,
    /// Rows written to the sink.
    pub rows_written: usize,
    /// Deleted records left out.
    pub deleted_skipped: usize,
    /// Batches written to the sink.
    pub batches_written: usize,
}

impl fmt::Display for ConvertSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows in {} batches ({} scanned, {} deleted skipped, encoding {})",
            self.rows_written,
            self.batches_written,
            self.records_scanned,
            self.deleted_skipped,
            self.encoding
        )
    }
}

/// An open table with its resolved schema and decoders.
#[derive(Debug)]
pub struct TableConverter {
    table: DbfTable,
    columns: Vec<ColumnSpec>,
    schema: SchemaRef,
    values: ValueDecoder,
    deleted: DeletedPolicy,
    encoding: String,
}

impl TableConverter {
    /// Resolves the code page for `path`, opens the table and infers its
    /// schema.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownEncoding`] when the resolved label has no
    /// decoder, or an [`OpenError`](crate::error::OpenError) when the table
    /// cannot be opened.
    pub fn open(path: impl AsRef<Path>, config: &ConvertConfig) -> ConvertResult<Self> {
        let path = path.as_ref();
        let encoding = resolve_codepage(path, &config.encoding);
        let text = TextDecoder::for_label(&encoding, config.strict)
            .ok_or_else(|| ConfigError::UnknownEncoding(encoding.clone()))?;
        info!(encoding = %encoding, strict = config.strict, "source encoding");

        let table = DbfTable::open(path)?;
        let columns = infer_columns(table.fields());
        let schema = arrow_schema(&columns);
        info!(
            path = %path.display(),
            fields = columns.len(),
            records = table.record_count(),
            "table opened"
        );
        Ok(Self {
            table,
            columns,
            schema,
            values: ValueDecoder::new(text),
            deleted: config.deleted,
            encoding,
        })
    }

    /// Output schema.
    #[must_use]
    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    /// Inferred columns.
    #[must_use]
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Resolved code page label.
    #[must_use]
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// Records in the table, deleted ones included.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.table.record_count()
    }

    /// Creates an assembler matching this table's columns.
    ///
    /// # Errors
    ///
    /// [`BatchError::ZeroCapacity`](crate::error::BatchError::ZeroCapacity)
    /// when `batch_size` is 0.
    pub fn assembler(&self, batch_size: usize) -> ConvertResult<BatchAssembler> {
        Ok(BatchAssembler::new(&self.columns, batch_size)?)
    }

    /// Scans from `cursor` until a batch seals or the table ends.
    ///
    /// A row is fully decoded before the assembler sees it, so a failing
    /// row leaves no partial state behind.
    ///
    /// # Errors
    ///
    /// Marker, record and strict decoding failures, and batch seal
    /// failures.
    pub fn next_batch(
        &mut self,
        assembler: &mut BatchAssembler,
        mut cursor: RowCursor,
    ) -> ConvertResult<BatchStep> {
        let count = self.table.record_count();
        while cursor.row < count {
            let row = cursor.row;
            let state = record_state(&mut self.table, row)?;
            cursor.row += 1;
            if !state.is_accepted(self.deleted) {
                cursor.skipped += 1;
                continue;
            }
            if state == RecordState::Deleted {
                debug!(row, "keeping deleted record");
            }
            let cells = self.values.decode_row(&mut self.table, &self.columns, row)?;
            cursor.accepted += 1;
            if let Some(batch) = assembler.push_row(cells)? {
                return Ok(BatchStep {
                    batch: Some(batch),
                    cursor,
                });
            }
        }
        Ok(BatchStep {
            batch: assembler.flush()?,
            cursor,
        })
    }

    /// Writes every batch to `sink`. The sink is left open; the caller
    /// finishes it.
    ///
    /// # Errors
    ///
    /// The first scan, batch or sink failure.
    pub fn run<S: ColumnarSink>(
        &mut self,
        sink: &mut S,
        batch_size: usize,
    ) -> ConvertResult<ConvertSummary> {
        let mut assembler = self.assembler(batch_size)?;
        let mut cursor = RowCursor::default();
        let mut batches_written = 0;
        loop {
            let step = self.next_batch(&mut assembler, cursor)?;
            cursor = step.cursor;
            let Some(batch) = step.batch else {
                break;
            };
            debug!(batch = batches_written, rows = batch.num_rows(), "batch sealed");
            sink.write_batch(batch)?;
            batches_written += 1;
        }
        Ok(ConvertSummary {
            encoding: self.encoding.clone(),
            records_scanned: cursor.row,
            rows_written: cursor.accepted,
            deleted_skipped: cursor.skipped,
            batches_written,
        })
    }
}

/// Converts the table at `input` into a Parquet file at `output`.
///
/// `.dbc` inputs are extracted first; the staged copy is removed on every
/// exit path. On failure after the output was created, the partial output
/// is removed as well.
///
/// # Errors
///
/// Any [`ConvertError`](crate::error::ConvertError); use
/// [`exit_code`](crate::error::ConvertError::exit_code) for its category.
pub fn convert(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &ConvertConfig,
) -> ConvertResult<ConvertSummary> {
    let (input, output) = (input.as_ref(), output.as_ref());
    config.validate()?;

    let staged = stage_input(input, output, config.dbc_tool.as_deref())?;
    let mut converter = TableConverter::open(staged.path(), config)?;

    let sink_config = ParquetSinkConfig::default()
        .with_compression(config.compression)
        .with_max_row_group_size(config.batch_size);
    let mut sink = ParquetSink::create(output, converter.schema(), &sink_config)?;

    let result = match converter.run(&mut sink, config.batch_size) {
        Ok(summary) => sink.finish().map(|()| summary).map_err(Into::into),
        Err(e) => {
            drop(sink);
            Err(e)
        }
    };
    match result {
        Ok(summary) => {
            info!(output = %output.display(), %summary, "conversion complete");
            Ok(summary)
        }
        Err(e) => {
            if let Err(rm) = fs::remove_file(output) {
                warn!(output = %output.display(), error = %rm, "cannot remove partial output");
            }
            Err(e)
        }
    }
}
