//! Byte → UTF-8 transcoding under a strict or lossy policy.
//!
//! WHATWG encodings go through `encoding_rs`; the DOS OEM pages use the
//! built-in tables in [`super::oem`]. Single-byte pages leave some bytes
//! unassigned: WHATWG decodes them to U+FFFD, or to C1 controls on the
//! Windows pages. Both are treated as invalid input bytes.

use encoding_rs::{DecoderResult, Encoding};

use super::oem::{self, OemTable};
use crate::error::DecodeError;

/// Character substituted for each invalid input byte in lossy mode.
pub const PLACEHOLDER: char = '?';

/// A resolved source encoding.
#[derive(Debug, Clone, Copy)]
pub enum TextEncoding {
    /// Encoding from the WHATWG set.
    Web(&'static Encoding),
    /// DOS OEM code page.
    Oem(&'static OemTable),
}

impl TextEncoding {
    /// Resolves a label such as `CP1252`, `cp850` or `utf-8`.
    ///
    /// Returns `None` for labels naming no supported encoding.
    #[must_use]
    pub fn for_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if let Some(table) = oem::for_label(label) {
            return Some(Self::Oem(table));
        }
        Encoding::for_label(label.as_bytes()).map(Self::Web)
    }

    /// Canonical encoding name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Web(encoding) => encoding.name(),
            Self::Oem(table) => table.name,
        }
    }
}

/// Transcodes raw cell bytes into UTF-8 text.
#[derive(Debug, Clone, Copy)]
pub struct TextDecoder {
    encoding: TextEncoding,
    strict: bool,
}

impl TextDecoder {
    /// Creates a decoder for a resolved encoding.
    #[must_use]
    pub fn new(encoding: TextEncoding, strict: bool) -> Self {
        Self { encoding, strict }
    }

    /// Creates a decoder from an encoding label.
    #[must_use]
    pub fn for_label(label: &str, strict: bool) -> Option<Self> {
        TextEncoding::for_label(label).map(|e| Self::new(e, strict))
    }

    /// The source encoding.
    #[must_use]
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Whether invalid sequences are fatal.
    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Decodes `input` into a new string.
    ///
    /// In lossy mode every invalid sequence produces one [`PLACEHOLDER`]
    /// and decoding resumes one byte after the start of that sequence.
    ///
    /// # Errors
    ///
    /// In strict mode, returns [`DecodeError`] at the first invalid sequence.
    pub fn decode(&self, input: &[u8]) -> Result<String, DecodeError> {
        let mut out = String::with_capacity(input.len() * 4 + 8);
        match self.encoding {
            TextEncoding::Oem(table) => {
                out.extend(input.iter().map(|&b| table.decode_byte(b)));
            }
            TextEncoding::Web(encoding) if encoding.is_single_byte() => {
                self.decode_single_byte(encoding, input, &mut out)?;
            }
            TextEncoding::Web(encoding) => {
                self.decode_multi_byte(encoding, input, &mut out)?;
            }
        }
        Ok(out)
    }

    fn decode_single_byte(
        &self,
        encoding: &'static Encoding,
        input: &[u8],
        out: &mut String,
    ) -> Result<(), DecodeError> {
        let (text, _) = encoding.decode_without_bom_handling(input);
        let vendor_page = encoding.name().starts_with("windows-");
        // Single-byte encodings map each input byte to exactly one char.
        for (offset, (ch, &byte)) in text.chars().zip(input).enumerate() {
            let unassigned = ch == char::REPLACEMENT_CHARACTER
                || (vendor_page && byte >= 0x80 && ('\u{80}'..='\u{9f}').contains(&ch));
            if unassigned {
                if self.strict {
                    return Err(DecodeError {
                        encoding: encoding.name(),
                        offset,
                    });
                }
                out.push(PLACEHOLDER);
            } else {
                out.push(ch);
            }
        }
        Ok(())
    }

    fn decode_multi_byte(
        &self,
        encoding: &'static Encoding,
        input: &[u8],
        out: &mut String,
    ) -> Result<(), DecodeError> {
        let mut pos = 0;
        let mut decoder = encoding.new_decoder_without_bom_handling();
        loop {
            let rest = &input[pos..];
            if let Some(needed) = decoder.max_utf8_buffer_length_without_replacement(rest.len()) {
                out.reserve(needed);
            }
            let (result, read) = decoder.decode_to_string_without_replacement(rest, out, true);
            match result {
                DecoderResult::InputEmpty => return Ok(()),
                DecoderResult::OutputFull => {
                    pos += read;
                    out.reserve(rest.len() - read + 8);
                }
                DecoderResult::Malformed(bad, extra) => {
                    let start =
                        (pos + read).saturating_sub(usize::from(bad) + usize::from(extra));
                    if self.strict {
                        return Err(DecodeError {
                            encoding: encoding.name(),
                            offset: start,
                        });
                    }
                    out.push(PLACEHOLDER);
                    pos = start + 1;
                    decoder = encoding.new_decoder_without_bom_handling();
                }
            }
        }
    }
}
