//! Legacy text encodings.
//!
//! - [`resolve_codepage`]: pick the source code page from an explicit label
//!   or the table's language driver byte
//! - [`TextDecoder`]: transcode cell bytes to UTF-8, strict or lossy

mod codepage;
mod decoder;
mod oem;

pub use codepage::{
    codepage_for_driver, read_language_driver, resolve_codepage, select_codepage,
    DEFAULT_CODEPAGE, LANGUAGE_DRIVER_OFFSET,
};
pub use decoder::{TextDecoder, TextEncoding, PLACEHOLDER};
pub use oem::{OemTable, CP437, CP850};
