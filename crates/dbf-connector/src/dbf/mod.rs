//! dBASE table access.
//!
//! - [`header`]: byte-exact header and field descriptor parsing
//! - [`DbfTable`]: owning handle over the structured and raw readers
//! - [`deleted`]: soft-deletion marker classification

pub mod deleted;
pub mod header;
mod table;

pub use deleted::{is_deleted, record_state, RecordState};
pub use header::{FieldDescriptor, TableHeader};
pub use table::DbfTable;
