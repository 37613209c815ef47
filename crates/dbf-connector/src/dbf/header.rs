//! dBASE file header and field descriptor parsing.
//!
//! ```text
//! offset  width  meaning
//! 0       1      version / type tag
//! 4       4      record count (u32 LE)
//! 8       2      header length (u16 LE)
//! 10      2      record length (u16 LE)
//! 0x1D    1      language driver id
//! 32      32×n   field descriptors, terminated by 0x0D
//! ```

use std::io::Read;

use crate::encoding::LANGUAGE_DRIVER_OFFSET;
use crate::error::HeaderError;

/// Size of the fixed file header.
pub const FILE_HEADER_LEN: usize = 32;

/// Size of one field descriptor.
pub const DESCRIPTOR_LEN: usize = 32;

/// Byte ending the descriptor array.
pub const DESCRIPTOR_TERMINATOR: u8 = 0x0D;

/// Width of the NUL-padded field name slot.
pub const FIELD_NAME_LEN: usize = 11;

/// Reads a little-endian `u16` at `offset`.
#[inline]
#[must_use]
pub fn read_u16_le(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

/// One field descriptor from the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name, at most 11 characters.
    pub name: String,
    /// Raw type tag (`C`, `N`, `F`, `L`, `D`, ...), uppercased.
    pub type_tag: u8,
    /// Width in bytes.
    pub width: usize,
    /// Decimal places (numeric fields only).
    pub decimals: u8,
    /// Byte offset of the field inside a record (the marker is byte 0).
    pub offset: usize,
}

impl FieldDescriptor {
    fn parse(slot: &[u8], offset: usize) -> Self {
        let type_tag = slot[11].to_ascii_uppercase();
        let (width, decimals) = match type_tag {
            b'N' | b'F' => (usize::from(slot[16]), slot[17]),
            // Character fields use the decimals byte as the width's high byte.
            _ => (usize::from(slot[16]) | (usize::from(slot[17]) << 8), 0),
        };
        Self {
            name: parse_field_name(&slot[..FIELD_NAME_LEN]),
            type_tag,
            width,
            decimals,
            offset,
        }
    }
}

/// Decodes an 11-byte name slot: cut at the first NUL, trailing blanks
/// trimmed.
#[must_use]
pub fn parse_field_name(slot: &[u8]) -> String {
    let slot = &slot[..slot.len().min(FIELD_NAME_LEN)];
    let end = slot.iter().position(|&b| b == 0).unwrap_or(slot.len());
    String::from_utf8_lossy(&slot[..end]).trim_end().to_string()
}

/// Parsed table header.
#[derive(Debug, Clone)]
pub struct TableHeader {
    /// Version / type tag byte.
    pub version: u8,
    /// Number of records, deleted ones included.
    pub record_count: u32,
    /// Header length in bytes; records start here.
    pub header_len: u16,
    /// Fixed record length, marker byte included.
    pub record_len: u16,
    /// Language driver id.
    pub language_driver: u8,
    /// Field descriptors in record order.
    pub fields: Vec<FieldDescriptor>,
}

impl TableHeader {
    /// Parses a complete header (`header_len` bytes).
    ///
    /// # Errors
    ///
    /// Fails on short input, a record length that cannot hold the marker,
    /// or a field extending past the record.
    pub fn parse(bytes: &[u8]) -> Result<Self, HeaderError> {
        if bytes.len() < FILE_HEADER_LEN {
            return Err(HeaderError::TooShort {
                actual: bytes.len(),
                expected: FILE_HEADER_LEN,
            });
        }
        let header_len = read_u16_le(bytes, 8);
        let record_len = read_u16_le(bytes, 10);
        if record_len < 1 {
            return Err(HeaderError::BadRecordLength(record_len));
        }
        let end = usize::from(header_len).min(bytes.len());

        let mut fields = Vec::new();
        let mut offset = 1;
        let mut pos = FILE_HEADER_LEN;
        while pos + DESCRIPTOR_LEN <= end && bytes[pos] != DESCRIPTOR_TERMINATOR {
            let field = FieldDescriptor::parse(&bytes[pos..pos + DESCRIPTOR_LEN], offset);
            if field.offset + field.width > usize::from(record_len) {
                return Err(HeaderError::FieldOverflow {
                    name: field.name,
                    end: field.offset + field.width,
                    record_len,
                });
            }
            offset += field.width;
            fields.push(field);
            pos += DESCRIPTOR_LEN;
        }

        Ok(Self {
            version: bytes[0],
            record_count: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            header_len,
            record_len,
            language_driver: bytes[LANGUAGE_DRIVER_OFFSET],
            fields,
        })
    }

    /// Reads and parses the header from the start of `reader`.
    ///
    /// # Errors
    ///
    /// Fails on IO errors or a header shorter than it declares.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, HeaderError> {
        let mut fixed = [0u8; FILE_HEADER_LEN];
        let n = read_full(reader, &mut fixed)?;
        if n < FILE_HEADER_LEN {
            return Err(HeaderError::TooShort {
                actual: n,
                expected: FILE_HEADER_LEN,
            });
        }
        let header_len = usize::from(read_u16_le(&fixed, 8)).max(FILE_HEADER_LEN);
        let mut bytes = vec![0u8; header_len];
        bytes[..FILE_HEADER_LEN].copy_from_slice(&fixed);
        let rest = read_full(reader, &mut bytes[FILE_HEADER_LEN..])?;
        if FILE_HEADER_LEN + rest < header_len {
            return Err(HeaderError::TooShort {
                actual: FILE_HEADER_LEN + rest,
                expected: header_len,
            });
        }
        Self::parse(&bytes)
    }
}

/// Reads until `buf` is full or the reader hits EOF; returns bytes read.
pub(crate) fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str, tag: u8, width: u8, decimals: u8) -> [u8; 32] {
        let mut d = [0u8; 32];
        d[..name.len()].copy_from_slice(name.as_bytes());
        d[11] = tag;
        d[16] = width;
        d[17] = decimals;
        d
    }

    fn header(fields: &[[u8; 32]], record_count: u32) -> Vec<u8> {
        let header_len = 32 + 32 * fields.len() + 1;
        let record_len: usize = 1 + fields.iter().map(|f| usize::from(f[16])).sum::<usize>();
        let mut bytes = vec![0u8; 32];
        bytes[0] = 0x03;
        bytes[4..8].copy_from_slice(&record_count.to_le_bytes());
        bytes[8..10].copy_from_slice(&u16::try_from(header_len).unwrap().to_le_bytes());
        bytes[10..12].copy_from_slice(&u16::try_from(record_len).unwrap().to_le_bytes());
        bytes[LANGUAGE_DRIVER_OFFSET] = 0x57;
        for f in fields {
            bytes.extend_from_slice(f);
        }
        bytes.push(DESCRIPTOR_TERMINATOR);
        bytes
    }

    #[test]
    fn test_parse_basic_header() {
        let bytes = header(
            &[
                descriptor("NAME", b'C', 20, 0),
                descriptor("AGE", b'N', 3, 0),
                descriptor("DT", b'D', 8, 0),
            ],
            5,
        );
        let h = TableHeader::parse(&bytes).unwrap();
        assert_eq!(h.version, 0x03);
        assert_eq!(h.record_count, 5);
        assert_eq!(usize::from(h.header_len), bytes.len());
        assert_eq!(h.record_len, 32);
        assert_eq!(h.language_driver, 0x57);
        assert_eq!(h.fields.len(), 3);
        assert_eq!(h.fields[0].name, "NAME");
        assert_eq!(h.fields[0].offset, 1);
        assert_eq!(h.fields[1].offset, 21);
        assert_eq!(h.fields[2].offset, 24);
        assert_eq!(h.fields[2].type_tag, b'D');
    }

    #[test]
    fn test_character_width_high_byte() {
        let wide = descriptor("MEMO", b'C', 0x2C, 0x01);
        let mut bytes = header(&[wide], 0);
        // Widen the record so the 300-byte field fits.
        bytes[10..12].copy_from_slice(&301u16.to_le_bytes());
        let h = TableHeader::parse(&bytes).unwrap();
        assert_eq!(h.fields[0].width, 300);
        assert_eq!(h.fields[0].decimals, 0);
    }

    #[test]
    fn test_field_name_slot() {
        assert_eq!(parse_field_name(b"NAME\0\0\0\0\0\0\0"), "NAME");
        assert_eq!(parse_field_name(b"ABCDEFGHIJK"), "ABCDEFGHIJK");
        assert_eq!(parse_field_name(b"AB  \0garbage"), "AB");
    }

    #[test]
    fn test_too_short() {
        assert!(matches!(
            TableHeader::parse(&[0u8; 12]),
            Err(HeaderError::TooShort { actual: 12, .. })
        ));
        let bytes = header(&[descriptor("A", b'C', 1, 0)], 0);
        let mut reader = &bytes[..40];
        assert!(matches!(
            TableHeader::read_from(&mut reader),
            Err(HeaderError::TooShort { .. })
        ));
    }

    #[test]
    fn test_field_overflow() {
        let mut bytes = header(&[descriptor("A", b'C', 10, 0)], 0);
        bytes[10..12].copy_from_slice(&5u16.to_le_bytes());
        assert!(matches!(
            TableHeader::parse(&bytes),
            Err(HeaderError::FieldOverflow { .. })
        ));
    }

    #[test]
    fn test_read_from_stops_at_header_len() {
        let mut bytes = header(&[descriptor("A", b'C', 1, 0)], 1);
        bytes.extend_from_slice(b" x");
        let mut reader = bytes.as_slice();
        let h = TableHeader::read_from(&mut reader).unwrap();
        assert_eq!(h.fields.len(), 1);
        assert_eq!(reader, b" x");
    }
}
