//! Conversion configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use parquet::basic::Compression;

use crate::encoding::TextEncoding;
use crate::error::ConfigError;

/// Default rows per batch (and per Parquet row group).
pub const DEFAULT_BATCH_SIZE: usize = 100_000;

/// How the source text encoding is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EncodingChoice {
    /// Detect from the table's language driver byte.
    #[default]
    Auto,
    /// Use this label verbatim.
    Explicit(String),
}

impl FromStr for EncodingChoice {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        if label.is_empty() {
            return Err(ConfigError::InvalidValue {
                option: "encoding",
                value: s.to_string(),
            });
        }
        if label.eq_ignore_ascii_case("auto") {
            Ok(Self::Auto)
        } else {
            Ok(Self::Explicit(label.to_string()))
        }
    }
}

impl fmt::Display for EncodingChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Explicit(label) => f.write_str(label),
        }
    }
}

/// What to do with soft-deleted records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletedPolicy {
    /// Drop records whose marker is `*`.
    #[default]
    Skip,
    /// Emit every record regardless of marker.
    Keep,
}

impl FromStr for DeletedPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "keep" => Ok(Self::Keep),
            _ => Err(ConfigError::InvalidValue {
                option: "deleted",
                value: s.to_string(),
            }),
        }
    }
}

/// Settings for one table conversion.
///
/// All fields have defaults matching the command-line tool: detect the
/// encoding, substitute invalid bytes, skip deleted records, 100 000 rows
/// per batch and Snappy compression.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Source text encoding.
    pub encoding: EncodingChoice,

    /// Fail on the first byte sequence invalid in the source encoding
    /// instead of substituting `?`.
    pub strict: bool,

    /// Rows per sealed batch. Must be non-zero.
    pub batch_size: usize,

    /// Handling of soft-deleted records.
    pub deleted: DeletedPolicy,

    /// Parquet compression codec.
    pub compression: Compression,

    /// Explicit `dbc2dbf` executable for `.dbc` inputs. `None` tries
    /// `./dbc2dbf` and then `dbc2dbf` on `PATH`.
    pub dbc_tool: Option<PathBuf>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            encoding: EncodingChoice::Auto,
            strict: false,
            batch_size: DEFAULT_BATCH_SIZE,
            deleted: DeletedPolicy::Skip,
            compression: Compression::SNAPPY,
            dbc_tool: None,
        }
    }
}

impl ConvertConfig {
    /// Sets the encoding choice.
    #[must_use]
    pub fn with_encoding(mut self, encoding: EncodingChoice) -> Self {
        self.encoding = encoding;
        self
    }

    /// Enables or disables strict transcoding.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Sets the rows per batch.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the deleted-record policy.
    #[must_use]
    pub fn with_deleted(mut self, deleted: DeletedPolicy) -> Self {
        self.deleted = deleted;
        self
    }

    /// Sets the Parquet compression codec.
    #[must_use]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Sets the `dbc2dbf` executable.
    #[must_use]
    pub fn with_dbc_tool(mut self, tool: impl Into<PathBuf>) -> Self {
        self.dbc_tool = Some(tool.into());
        self
    }

    /// Checks the settings before any file is touched.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroBatchSize`] for an empty batch capacity and
    /// [`ConfigError::UnknownEncoding`] for an explicit label that names no
    /// supported encoding.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if let EncodingChoice::Explicit(label) = &self.encoding {
            if TextEncoding::for_label(label).is_none() {
                return Err(ConfigError::UnknownEncoding(label.clone()));
            }
        }
        Ok(())
    }
}
