//! Owning table handle.
//!
//! [`DbfTable`] owns two readers over the same file:
//!
//! - a **structured** reader that parses the header, knows the field layout
//!   and serves typed attribute reads (string, integer, double, null test)
//! - a **raw** positioned reader used for header geometry and per-record
//!   deletion markers, which the structured reader does not expose
//!
//! Both file handles live in the same value, so they are released together
//! when the table is dropped or [`DbfTable::close`]d.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use super::header::{read_full, read_u16_le, FieldDescriptor, TableHeader};
use crate::error::{OpenError, RecordError};

/// Header bytes the raw reader needs for record geometry.
const GEOMETRY_LEN: usize = 12;

/// Structured, field-level access to records.
#[derive(Debug)]
struct RecordReader {
    file: BufReader<File>,
    header: TableHeader,
    /// Row currently held in `record`, if any.
    current: Option<usize>,
    /// File offset the reader is positioned at, when known.
    position: Option<u64>,
    record: Vec<u8>,
}

impl RecordReader {
    fn open(path: &Path) -> Result<Self, OpenError> {
        let file = File::open(path).map_err(|source| OpenError::Structured {
            path: path.to_path_buf(),
            source,
        })?;
        let mut file = BufReader::new(file);
        let header = TableHeader::read_from(&mut file).map_err(|source| OpenError::Header {
            path: path.to_path_buf(),
            source,
        })?;
        let record = vec![0u8; usize::from(header.record_len)];
        Ok(Self {
            file,
            header,
            current: None,
            position: None,
            record,
        })
    }

    fn record_count(&self) -> usize {
        self.header.record_count as usize
    }

    /// Loads `row` into the record buffer unless it is already there.
    fn load(&mut self, row: usize) -> Result<&[u8], RecordError> {
        if row >= self.record_count() {
            return Err(RecordError::OutOfRange {
                row,
                record_count: self.record_count(),
            });
        }
        if self.current != Some(row) {
            self.current = None;
            let offset = u64::from(self.header.header_len)
                + row as u64 * u64::from(self.header.record_len);
            // Seeking discards the read buffer; sequential rows skip it.
            if self.position.take() != Some(offset) {
                self.file
                    .seek(SeekFrom::Start(offset))
                    .map_err(|source| RecordError::Io { row, source })?;
            }
            self.file
                .read_exact(&mut self.record)
                .map_err(|source| RecordError::Io { row, source })?;
            self.position = Some(offset + u64::from(self.header.record_len));
            self.current = Some(row);
        }
        Ok(&self.record)
    }

    /// Field bytes: cut at the first NUL, blanks trimmed on both sides.
    fn field(&mut self, row: usize, col: usize) -> Result<(&[u8], u8), RecordError> {
        let FieldDescriptor {
            offset,
            width,
            type_tag,
            ..
        } = self.header.fields[col];
        let record = self.load(row)?;
        let raw = &record[offset..offset + width];
        let raw = raw.iter().position(|&b| b == 0).map_or(raw, |end| &raw[..end]);
        Ok((trim_blanks(raw), type_tag))
    }
}

/// Raw positioned access to the file bytes.
#[derive(Debug)]
struct RawReader {
    file: File,
    header_len: u64,
    record_len: u64,
}

impl RawReader {
    fn open(path: &Path) -> Result<Self, OpenError> {
        let mut file = File::open(path).map_err(|source| OpenError::Raw {
            path: path.to_path_buf(),
            source,
        })?;
        let mut geometry = [0u8; GEOMETRY_LEN];
        let len = read_full(&mut file, &mut geometry).map_err(|source| OpenError::Raw {
            path: path.to_path_buf(),
            source,
        })?;
        if len < GEOMETRY_LEN {
            return Err(OpenError::TruncatedHeader {
                path: path.to_path_buf(),
                len,
            });
        }
        Ok(Self {
            file,
            header_len: u64::from(read_u16_le(&geometry, 8)),
            record_len: u64::from(read_u16_le(&geometry, 10)),
        })
    }

    fn byte_at(&mut self, offset: u64) -> std::io::Result<u8> {
        let mut byte = [0u8; 1];
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(&mut byte)?;
        Ok(byte[0])
    }
}

/// An open dBASE table.
#[derive(Debug)]
pub struct DbfTable {
    path: PathBuf,
    records: RecordReader,
    raw: RawReader,
}

impl DbfTable {
    /// Opens the structured reader, then independently the raw reader.
    ///
    /// # Errors
    ///
    /// [`OpenError::Structured`] / [`OpenError::Header`] when the structured
    /// reader fails, [`OpenError::Raw`] when the raw reader cannot open the
    /// file, and [`OpenError::TruncatedHeader`] when fewer than 12 header
    /// bytes are present. The structured reader opens first and already
    /// rejects files shorter than the 32-byte header, so a short file yields
    /// [`OpenError::Header`]; `TruncatedHeader` only surfaces when the file
    /// shrinks between the two opens.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, OpenError> {
        let path = path.as_ref();
        let records = RecordReader::open(path)?;
        let raw = RawReader::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            records,
            raw,
        })
    }

    /// Releases both readers.
    pub fn close(self) {
        drop(self);
    }

    /// Path the table was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parsed header.
    #[must_use]
    pub fn header(&self) -> &TableHeader {
        &self.records.header
    }

    /// Field descriptors in record order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.records.header.fields
    }

    /// Number of fields.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.records.header.fields.len()
    }

    /// Number of records, deleted ones included.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.record_count()
    }

    /// Header length as read by the raw reader.
    #[must_use]
    pub fn header_len(&self) -> u64 {
        self.raw.header_len
    }

    /// Record length as read by the raw reader.
    #[must_use]
    pub fn record_len(&self) -> u64 {
        self.raw.record_len
    }

    /// Reads the deletion marker byte of `row` through the raw reader.
    ///
    /// # Errors
    ///
    /// [`RecordError::OutOfRange`] for rows past the end and
    /// [`RecordError::Io`] on seek/read failure or EOF.
    pub fn read_marker(&mut self, row: usize) -> Result<u8, RecordError> {
        if row >= self.record_count() {
            return Err(RecordError::OutOfRange {
                row,
                record_count: self.record_count(),
            });
        }
        let offset = self.raw.header_len + row as u64 * self.raw.record_len;
        self.raw
            .byte_at(offset)
            .map_err(|source| RecordError::Io { row, source })
    }

    /// Whether the cell is null by the rules of its raw type tag:
    /// numeric fields that are blank or start with `*`, blank / `0` /
    /// `00000000` dates, `?` logicals, and blank values of any other type.
    ///
    /// # Errors
    ///
    /// Fails when the record cannot be read.
    pub fn is_attribute_null(&mut self, row: usize, col: usize) -> Result<bool, RecordError> {
        let (value, tag) = self.records.field(row, col)?;
        Ok(match tag {
            b'N' | b'F' => value.first().map_or(true, |&b| b == b'*'),
            b'D' => value.is_empty() || value == b"0" || value == b"00000000",
            b'L' => value.first() == Some(&b'?'),
            _ => value.is_empty(),
        })
    }

    /// Cell bytes with blanks trimmed, undecoded.
    ///
    /// # Errors
    ///
    /// Fails when the record cannot be read.
    pub fn read_string_attribute(&mut self, row: usize, col: usize) -> Result<&[u8], RecordError> {
        self.records.field(row, col).map(|(value, _)| value)
    }

    /// Cell as a double. Parses the leading numeric prefix; text without
    /// one reads as `0.0`.
    ///
    /// # Errors
    ///
    /// Fails when the record cannot be read.
    pub fn read_double_attribute(&mut self, row: usize, col: usize) -> Result<f64, RecordError> {
        self.read_string_attribute(row, col).map(parse_numeric_prefix)
    }

    /// Cell as an integer, truncating any fractional part toward zero.
    ///
    /// # Errors
    ///
    /// Fails when the record cannot be read.
    pub fn read_integer_attribute(&mut self, row: usize, col: usize) -> Result<i64, RecordError> {
        let value = self.read_string_attribute(row, col)?;
        let exact = std::str::from_utf8(value)
            .ok()
            .and_then(|s| s.parse::<i64>().ok());
        Ok(exact.unwrap_or_else(|| truncate_to_i64(parse_numeric_prefix(value))))
    }
}

/// Saturating truncation toward zero; NaN maps to 0.
#[allow(clippy::cast_possible_truncation)]
fn truncate_to_i64(value: f64) -> i64 {
    value as i64
}

fn trim_blanks(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != b' ').unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|&b| b != b' ').map_or(start, |i| i + 1);
    &bytes[start..end]
}

/// Parses the longest numeric prefix (`[+-]digits[.digits][e[+-]digits]`).
fn parse_numeric_prefix(bytes: &[u8]) -> f64 {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let s = &bytes[start..];
    let digits = |from: usize| s[from..].iter().take_while(|b| b.is_ascii_digit()).count();

    let mut end = usize::from(matches!(s.first(), Some(b'+' | b'-')));
    let int_digits = digits(end);
    end += int_digits;
    let mut frac_digits = 0;
    if s.get(end) == Some(&b'.') {
        frac_digits = digits(end + 1);
        end += 1 + frac_digits;
    }
    if int_digits + frac_digits == 0 {
        return 0.0;
    }
    if matches!(s.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(s.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = digits(exp);
        if exp_digits > 0 {
            end = exp + exp_digits;
        }
    }
    std::str::from_utf8(&s[..end])
        .ok()
        .and_then(|t| t.parse().ok())
        .unwrap_or(0.0)
}
