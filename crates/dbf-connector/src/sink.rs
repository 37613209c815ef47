//! Columnar output sinks.
//!
//! [`ParquetSink`] streams batches into one Parquet file through
//! `ArrowWriter<File>`, one row group per batch.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use arrow_array::RecordBatch;
use arrow_schema::SchemaRef;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use tracing::{debug, warn};

use crate::error::SinkError;

/// Destination for sealed batches.
pub trait ColumnarSink {
    /// Schema every batch must carry.
    fn schema(&self) -> SchemaRef;

    /// Writes one batch.
    ///
    /// # Errors
    ///
    /// [`SinkError::Write`] when the batch cannot be written.
    fn write_batch(&mut self, batch: RecordBatch) -> Result<(), SinkError>;

    /// Completes the output. A sink that is dropped without `finish` leaves
    /// an unusable file behind.
    ///
    /// # Errors
    ///
    /// [`SinkError::Close`] when the footer cannot be written.
    fn finish(self) -> Result<(), SinkError>;
}

/// Configuration for the Parquet sink.
#[derive(Debug, Clone)]
pub struct ParquetSinkConfig {
    /// Compression codec (default: Snappy).
    pub compression: Compression,

    /// Maximum rows per row group (default: `1_000_000`). Batches are
    /// flushed individually, so a row group never spans two batches.
    pub max_row_group_size: usize,
}

impl Default for ParquetSinkConfig {
    fn default() -> Self {
        Self {
            compression: Compression::SNAPPY,
            max_row_group_size: 1_000_000,
        }
    }
}

impl ParquetSinkConfig {
    /// Sets the compression codec.
    #[must_use]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Sets the maximum rows per row group.
    #[must_use]
    pub fn with_max_row_group_size(mut self, size: usize) -> Self {
        self.max_row_group_size = size;
        self
    }
}

/// Writes batches to a Parquet file.
pub struct ParquetSink {
    path: PathBuf,
    schema: SchemaRef,
    writer: ArrowWriter<File>,
    batches: usize,
}

impl std::fmt::Debug for ParquetSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParquetSink")
            .field("path", &self.path)
            .field("batches", &self.batches)
            .finish_non_exhaustive()
    }
}

impl ParquetSink {
    /// Creates (or truncates) `path` and opens a writer for `schema`.
    ///
    /// # Errors
    ///
    /// [`SinkError::Create`] when the file cannot be created and
    /// [`SinkError::Init`] when the writer rejects the schema or properties;
    /// the file just created is removed again in that case.
    pub fn create(
        path: impl AsRef<Path>,
        schema: SchemaRef,
        config: &ParquetSinkConfig,
    ) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|source| SinkError::Create {
            path: path.clone(),
            source,
        })?;
        let props = WriterProperties::builder()
            .set_compression(config.compression)
            .set_max_row_group_size(config.max_row_group_size)
            .build();
        let writer = match ArrowWriter::try_new(file, schema.clone(), Some(props)) {
            Ok(writer) => writer,
            Err(e) => {
                if let Err(rm) = fs::remove_file(&path) {
                    warn!(path = %path.display(), error = %rm, "cannot remove partial output");
                }
                return Err(SinkError::Init(e));
            }
        };
        debug!(path = %path.display(), compression = ?config.compression, "parquet sink opened");
        Ok(Self {
            path,
            schema,
            writer,
            batches: 0,
        })
    }

    /// Output path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Batches written so far.
    #[must_use]
    pub fn batches_written(&self) -> usize {
        self.batches
    }
}

impl ColumnarSink for ParquetSink {
    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    fn write_batch(&mut self, batch: RecordBatch) -> Result<(), SinkError> {
        self.writer.write(&batch).map_err(SinkError::Write)?;
        self.writer.flush().map_err(SinkError::Write)?;
        self.batches += 1;
        Ok(())
    }

    fn finish(self) -> Result<(), SinkError> {
        self.writer.close().map_err(SinkError::Close)?;
        debug!(path = %self.path.display(), batches = self.batches, "parquet sink closed");
        Ok(())
    }
}

/// Collects batches in memory.
#[derive(Debug)]
pub struct MemorySink {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl MemorySink {
    /// Creates an empty sink for `schema`.
    #[must_use]
    pub fn new(schema: SchemaRef) -> Self {
        Self {
            schema,
            batches: Vec::new(),
        }
    }

    /// Batches received so far.
    #[must_use]
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Consumes the sink, returning its batches.
    #[must_use]
    pub fn into_batches(self) -> Vec<RecordBatch> {
        self.batches
    }
}

impl ColumnarSink for MemorySink {
    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    fn write_batch(&mut self, batch: RecordBatch) -> Result<(), SinkError> {
        self.batches.push(batch);
        Ok(())
    }

    fn finish(self) -> Result<(), SinkError> {
        Ok(())
    }
}
