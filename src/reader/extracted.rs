//! Decoded column values.

use bytes::Bytes;

use crate::schema::{DataType, TableColumn};

/// One decoded column of one row.
///
/// Values are always rendered as text; numeric and temporal interpretation
/// is left to the consumer. `is_null` distinguishes SQL NULL from an empty
/// string, and a NULL value always has empty text.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedColumn {
    /// Column name.
    pub name: String,
    /// Logical data type.
    pub data_type: DataType,
    /// Declared type name.
    pub type_name: String,
    /// Declared length.
    pub length: usize,
    /// Declared scale.
    pub scale: u8,
    /// Declared precision.
    pub precision: u8,
    /// Whether the column accepts NULL.
    pub is_nullable: bool,
    /// Whether this value is SQL NULL.
    pub is_null: bool,
    /// Canonical text of the value; empty when NULL.
    pub value: String,
    /// Raw payload for binary, varbinary and geography values.
    pub raw: Option<Bytes>,
}

impl ExtractedColumn {
    /// A NULL value of `column`.
    pub fn null(column: &TableColumn) -> Self {
        Self::stamp(column, true, String::new())
    }

    /// A non-NULL value of `column`.
    pub fn with_value(column: &TableColumn, value: String) -> Self {
        Self::stamp(column, false, value)
    }

    /// Attach the raw payload bytes.
    pub fn with_raw(mut self, raw: impl Into<Bytes>) -> Self {
        self.raw = Some(raw.into());
        self
    }

    fn stamp(column: &TableColumn, is_null: bool, value: String) -> Self {
        Self {
            name: column.name.clone(),
            data_type: column.data_type,
            type_name: column.type_name.clone(),
            length: column.length,
            scale: column.scale,
            precision: column.precision,
            is_nullable: column.is_nullable,
            is_null,
            value,
            raw: None,
        }
    }

    /// The value text, or `None` for NULL.
    pub fn as_str(&self) -> Option<&str> {
        if self.is_null {
            None
        } else {
            Some(&self.value)
        }
    }
}
