//! Soft-deletion markers.

use super::table::DbfTable;
use crate::config::DeletedPolicy;
use crate::error::RecordError;

/// Marker byte of a deleted record.
pub const DELETED_MARKER: u8 = b'*';

/// Marker byte of an active record.
pub const ACTIVE_MARKER: u8 = b' ';

/// State of one record as given by its marker byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    /// Marker is a space.
    Active,
    /// Marker is `*`.
    Deleted,
}

impl RecordState {
    /// Classifies a marker byte. Only `*` and space are valid.
    #[must_use]
    pub fn from_marker(byte: u8) -> Option<Self> {
        match byte {
            DELETED_MARKER => Some(Self::Deleted),
            ACTIVE_MARKER => Some(Self::Active),
            _ => None,
        }
    }

    /// Whether a record in this state is emitted under `policy`.
    #[must_use]
    pub fn is_accepted(self, policy: DeletedPolicy) -> bool {
        self == Self::Active || policy == DeletedPolicy::Keep
    }
}

/// Reads and classifies the marker of a zero-based `row`.
///
/// # Errors
///
/// Any marker other than `*` or space, a seek/read failure, or EOF is a
/// [`RecordError`].
pub fn record_state(table: &mut DbfTable, row: usize) -> Result<RecordState, RecordError> {
    let byte = table.read_marker(row)?;
    RecordState::from_marker(byte).ok_or(RecordError::BadMarker { row, byte })
}

/// Whether the zero-based `row` is soft-deleted.
///
/// # Errors
///
/// See [`record_state`].
pub fn is_deleted(table: &mut DbfTable, row: usize) -> Result<bool, RecordError> {
    record_state(table, row).map(|s| s == RecordState::Deleted)
}
