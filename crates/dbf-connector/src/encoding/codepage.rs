//! Source code page detection from the table's language driver byte.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use tracing::{debug, warn};

use crate::config::EncodingChoice;

/// Code page used when detection fails.
pub const DEFAULT_CODEPAGE: &str = "CP1252";

/// Header offset of the language driver id.
pub const LANGUAGE_DRIVER_OFFSET: usize = 0x1D;

/// Maps a language driver id to a code page label.
#[must_use]
pub fn codepage_for_driver(id: u8) -> Option<&'static str> {
    match id {
        // dBASE III and the dBASE IV / Windows ANSI drivers.
        0x03 | 0x57 | 0x66..=0x69 => Some("CP1252"),
        0x64 => Some("CP1250"),
        0x65 => Some("CP1251"),
        0x7B => Some("CP437"),
        0x7D => Some("CP850"),
        _ => None,
    }
}

/// Picks the code page from an explicit choice and the driver byte, if one
/// could be read. Pure: identical inputs always give the identical label.
#[must_use]
pub fn select_codepage(choice: &EncodingChoice, driver: Option<u8>) -> String {
    match choice {
        EncodingChoice::Explicit(label) => label.clone(),
        EncodingChoice::Auto => driver
            .and_then(codepage_for_driver)
            .unwrap_or(DEFAULT_CODEPAGE)
            .to_string(),
    }
}

/// Reads the language driver byte from the 32-byte file header.
///
/// # Errors
///
/// Fails when the file cannot be opened or is shorter than 32 bytes.
pub fn read_language_driver(path: &Path) -> io::Result<u8> {
    let mut header = [0u8; 32];
    File::open(path)?.read_exact(&mut header)?;
    Ok(header[LANGUAGE_DRIVER_OFFSET])
}

/// Resolves the source code page for a table. Never fails: unreadable
/// headers and unknown driver ids fall back to [`DEFAULT_CODEPAGE`].
#[must_use]
pub fn resolve_codepage(path: &Path, choice: &EncodingChoice) -> String {
    if let EncodingChoice::Explicit(label) = choice {
        return label.clone();
    }
    let driver = match read_language_driver(path) {
        Ok(id) => Some(id),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read language driver byte");
            None
        }
    };
    let label = select_codepage(choice, driver);
    if let Some(id) = driver {
        if codepage_for_driver(id).is_none() {
            debug!(driver = id, "unknown language driver, using default code page");
        }
    }
    label
}
