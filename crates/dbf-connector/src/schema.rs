//! Column schema inferred from field descriptors.
//!
//! Every field maps to one of five normalized kinds. Unrecognized type tags
//! fall back to text with a warning rather than failing the run.

use std::sync::Arc;

use arrow_schema::{DataType, Field, Schema, SchemaRef};
use tracing::warn;

use crate::dbf::FieldDescriptor;

/// Normalized column kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// UTF-8 text.
    Text,
    /// Boolean.
    Bool,
    /// 64-bit signed integer.
    Int64,
    /// 64-bit float.
    Float64,
    /// Days since 1970-01-01.
    Date32,
}

impl ColumnKind {
    /// Arrow type for this kind.
    #[must_use]
    pub fn data_type(self) -> DataType {
        match self {
            Self::Text => DataType::Utf8,
            Self::Bool => DataType::Boolean,
            Self::Int64 => DataType::Int64,
            Self::Float64 => DataType::Float64,
            Self::Date32 => DataType::Date32,
        }
    }
}

/// Primitive class of a field as seen by the structured reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldClass {
    /// `C` and other character-like tags.
    String,
    /// `N`/`F` narrower than 10 digits with no decimals.
    Integer,
    /// `N`/`F` otherwise.
    Double,
    /// `L`.
    Logical,
    /// `D`.
    Date,
    /// Tag the reader does not recognize.
    Invalid,
}

impl FieldClass {
    /// Classifies a descriptor.
    #[must_use]
    pub fn of(field: &FieldDescriptor) -> Self {
        match field.type_tag {
            b'C' => Self::String,
            b'N' | b'F' if field.decimals == 0 && field.width < 10 => Self::Integer,
            b'N' | b'F' => Self::Double,
            b'L' => Self::Logical,
            b'D' => Self::Date,
            _ => Self::Invalid,
        }
    }
}

/// Normalized description of one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Field name, at most 11 characters.
    pub name: String,
    /// Normalized kind.
    pub kind: ColumnKind,
    /// Width in bytes.
    pub width: usize,
    /// Decimal places.
    pub decimals: u8,
}

impl ColumnSpec {
    /// Infers the column spec for a field descriptor.
    #[must_use]
    pub fn infer(field: &FieldDescriptor) -> Self {
        let kind = match FieldClass::of(field) {
            FieldClass::String => ColumnKind::Text,
            FieldClass::Invalid => {
                warn!(
                    field = %field.name,
                    tag = %char::from(field.type_tag).escape_default(),
                    "unrecognized field type, reading as text"
                );
                ColumnKind::Text
            }
            FieldClass::Integer => ColumnKind::Int64,
            FieldClass::Double if field.decimals > 0 => ColumnKind::Float64,
            FieldClass::Double => ColumnKind::Int64,
            FieldClass::Logical => ColumnKind::Bool,
            FieldClass::Date => ColumnKind::Date32,
        };
        Self {
            name: field.name.clone(),
            kind,
            width: field.width,
            decimals: field.decimals,
        }
    }
}

/// Infers column specs for all fields, in order.
#[must_use]
pub fn infer_columns(fields: &[FieldDescriptor]) -> Vec<ColumnSpec> {
    fields.iter().map(ColumnSpec::infer).collect()
}

/// Arrow schema for the columns. Every field is nullable.
#[must_use]
pub fn arrow_schema(columns: &[ColumnSpec]) -> SchemaRef {
    Arc::new(Schema::new(
        columns
            .iter()
            .map(|c| Field::new(&c.name, c.kind.data_type(), true))
            .collect::<Vec<_>>(),
    ))
}
