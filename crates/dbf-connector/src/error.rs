//! Error types for table conversion.
//!
//! Each failure phase has its own error enum; [`ConvertError`] folds them
//! together and maps every category to a distinct process exit status.
//! Only three situations recover locally and never surface here: lossy
//! text substitution, malformed dates (decoded as null) and codepage
//! detection falling back to the default Western code page.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::schema::ColumnKind;

/// Result alias for conversion operations.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Invalid run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Batch capacity must hold at least one row.
    #[error("batch size must be greater than zero")]
    ZeroBatchSize,

    /// The explicit encoding label does not name a supported encoding.
    #[error("unknown encoding label '{0}'")]
    UnknownEncoding(String),

    /// A textual option had a value outside its allowed set.
    #[error("invalid value '{value}' for {option}")]
    InvalidValue {
        /// Option name.
        option: &'static str,
        /// Rejected value.
        value: String,
    },
}

/// Malformed table header, reported by the structured accessor.
#[derive(Debug, Error)]
pub enum HeaderError {
    /// Fewer bytes than the fixed file header or the declared header length.
    #[error("header is {actual} bytes, expected at least {expected}")]
    TooShort {
        /// Bytes available.
        actual: usize,
        /// Bytes required.
        expected: usize,
    },

    /// Record length cannot hold the deletion marker.
    #[error("record length {0} is too small")]
    BadRecordLength(u16),

    /// A field descriptor runs past the end of the record.
    #[error("field '{name}' ends at byte {end}, past record length {record_len}")]
    FieldOverflow {
        /// Field name.
        name: String,
        /// End offset of the field inside the record.
        end: usize,
        /// Declared record length.
        record_len: u16,
    },

    /// Underlying read failure.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Failure opening a table. All variants are fatal.
#[derive(Debug, Error)]
pub enum OpenError {
    /// The structured (field-level) accessor could not open the file.
    #[error("cannot open table '{}': {source}", path.display())]
    Structured {
        /// Table path.
        path: PathBuf,
        /// Cause.
        #[source]
        source: io::Error,
    },

    /// The structured accessor rejected the header.
    #[error("'{}' is not a readable dBASE table: {source}", path.display())]
    Header {
        /// Table path.
        path: PathBuf,
        /// Cause.
        #[source]
        source: HeaderError,
    },

    /// The raw positioned accessor could not open the file.
    #[error("cannot open raw reader on '{}': {source}", path.display())]
    Raw {
        /// Table path.
        path: PathBuf,
        /// Cause.
        #[source]
        source: io::Error,
    },

    /// The raw accessor read fewer than the 12 header bytes it needs.
    #[error("truncated header in '{}': {len} bytes", path.display())]
    TruncatedHeader {
        /// Table path.
        path: PathBuf,
        /// Bytes actually read.
        len: usize,
    },
}

/// Failure reading a record through either accessor.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Row index past the end of the table.
    #[error("row {row} out of range (table has {record_count} records)")]
    OutOfRange {
        /// Requested row.
        row: usize,
        /// Records in the table.
        record_count: usize,
    },

    /// Deletion marker is neither `*` nor a space.
    #[error("row {row}: unexpected deletion marker 0x{byte:02X}")]
    BadMarker {
        /// Row index.
        row: usize,
        /// Byte found.
        byte: u8,
    },

    /// Seek or read failure, including a short read at end of file.
    #[error("row {row}: {source}")]
    Io {
        /// Row index.
        row: usize,
        /// Cause.
        #[source]
        source: io::Error,
    },
}

/// A byte sequence that is invalid in the source encoding (strict mode).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {encoding} sequence at byte {offset}")]
pub struct DecodeError {
    /// Encoding name.
    pub encoding: &'static str,
    /// Offset of the first offending byte in the input.
    pub offset: usize,
}

/// Failure assembling or sealing a batch. The batch is discarded.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Batch capacity of zero rows.
    #[error("batch capacity must be greater than zero")]
    ZeroCapacity,

    /// A row carried the wrong number of cells.
    #[error("row has {actual} cells, schema has {expected} columns")]
    RowArity {
        /// Columns in the schema.
        expected: usize,
        /// Cells supplied.
        actual: usize,
    },

    /// A cell's kind does not match its column.
    #[error("column {column}: expected {expected:?} value, got {actual:?}")]
    KindMismatch {
        /// Column index.
        column: usize,
        /// Declared kind.
        expected: ColumnKind,
        /// Kind of the rejected cell.
        actual: Option<ColumnKind>,
    },

    /// Sealed arrays disagree on length.
    #[error("column {column} sealed with {actual} rows, expected {expected}")]
    LengthMismatch {
        /// Column index.
        column: usize,
        /// Rows in the batch.
        expected: usize,
        /// Rows in the column.
        actual: usize,
    },

    /// Arrow rejected the batch.
    #[error("arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),
}

/// Columnar sink failure, tagged by phase.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Output file could not be created.
    #[error("cannot create output '{}': {source}", path.display())]
    Create {
        /// Output path.
        path: PathBuf,
        /// Cause.
        #[source]
        source: io::Error,
    },

    /// Writer construction failed.
    #[error("parquet writer init: {0}")]
    Init(#[source] parquet::errors::ParquetError),

    /// Writing a batch failed.
    #[error("parquet write: {0}")]
    Write(#[source] parquet::errors::ParquetError),

    /// Flushing the footer failed.
    #[error("parquet close: {0}")]
    Close(#[source] parquet::errors::ParquetError),
}

/// Failure extracting a compressed `.dbc` container.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// No extractor succeeded and no sibling `.dbf` was found.
    #[error(
        "cannot extract '{}': dbc2dbf failed and no sibling .dbf exists",
        input.display()
    )]
    Extract {
        /// Container path.
        input: PathBuf,
    },
}

/// Top-level conversion error.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Container extraction failed.
    #[error("container error: {0}")]
    Container(#[from] ContainerError),

    /// Table could not be opened.
    #[error("open error: {0}")]
    Open(#[from] OpenError),

    /// Record access failed while scanning.
    #[error("io error: {0}")]
    Record(#[from] RecordError),

    /// Strict transcoding failure on a text cell.
    #[error("decode error at row {row}, column '{column}': {source}")]
    Decode {
        /// Row index.
        row: usize,
        /// Column name.
        column: String,
        /// Cause.
        #[source]
        source: DecodeError,
    },

    /// Batch assembly failed.
    #[error("batch error: {0}")]
    Batch(#[from] BatchError),

    /// Output sink failed.
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),
}

impl ConvertError {
    /// Process exit status for this error category.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Container(_) => 3,
            Self::Open(_) => 4,
            Self::Record(_) => 5,
            Self::Decode { .. } => 6,
            Self::Sink(_) => 7,
            Self::Batch(_) => 8,
        }
    }
}
