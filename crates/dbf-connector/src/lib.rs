//! # dBASE Connector
//!
//! Reads legacy dBASE (`.dbf`) tables, including `.dbc` containers, into
//! Arrow record batches and writes them to Parquet.
//!
//! The pipeline runs leaves first: the code page is resolved from the
//! language driver byte, field descriptors become a typed schema, each
//! accepted record is decoded cell by cell, and rows are assembled into
//! fixed-capacity batches that a [`sink::ColumnarSink`] persists one row
//! group at a time.
//!
//! ```no_run
//! use dbf_connector::{convert, ConvertConfig};
//!
//! let summary = convert("table.dbf", "table.parquet", &ConvertConfig::default())?;
//! println!("{summary}");
//! # Ok::<(), dbf_connector::error::ConvertError>(())
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

/// Batch assembly from decoded rows
pub mod batch;

/// Conversion configuration
pub mod config;

/// `.dbc` container staging
pub mod container;

/// Table access: header, records, deletion markers
pub mod dbf;

/// Code page detection and text transcoding
pub mod encoding;

/// Error types
pub mod error;

/// Conversion driver
pub mod pipeline;

/// Schema inference
pub mod schema;

/// Output sinks
pub mod sink;

/// Cell decoding
pub mod value;

pub use config::{ConvertConfig, DeletedPolicy, EncodingChoice, DEFAULT_BATCH_SIZE};
pub use error::{ConvertError, ConvertResult};
pub use pipeline::{convert, ConvertSummary, RowCursor, TableConverter};
