//! Column exception lists.
//!
//! Some exports declare a column one way in the model but store it another,
//! or interleave junk bytes into its stream. An exception list is a JSON
//! document, maintained by hand, that overrides the model's definition of
//! such columns and flags the adulterated ones:
//!
//! ```json
//! {
//!   "Columns": [
//!     {
//!       "schemaName": "dbo",
//!       "tableName": "orders",
//!       "columnName": "status",
//!       "dataType": "char",
//!       "length": 2,
//!       "isNullable": false,
//!       "isAdulterated": true
//!     }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use super::types::{DataType, TableDef};
use crate::error::SchemaError;

/// One overridden column, keyed by `schema.table.column`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnException {
    pub schema_name: String,
    pub table_name: String,
    pub column_name: String,
    pub data_type: String,
    #[serde(default)]
    pub length: usize,
    #[serde(default)]
    pub scale: u8,
    #[serde(default)]
    pub precision: u8,
    #[serde(default)]
    pub is_nullable: bool,
    #[serde(default)]
    pub is_adulterated: bool,
}

impl ColumnException {
    /// `schema.table.column`
    pub fn key(&self) -> String {
        format!("{}.{}.{}", self.schema_name, self.table_name, self.column_name)
    }
}

/// A parsed exception list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ColumnExceptions {
    #[serde(rename = "Columns", alias = "columns", default)]
    pub columns: Vec<ColumnException>,
}

impl ColumnExceptions {
    /// Parse an exception list from JSON text.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse an exception list file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// Whether the list has no entries.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Overwrite the definitions of every listed column of `table`.
    ///
    /// Returns the number of columns that were overridden.
    pub fn apply(&self, table: &mut TableDef) -> Result<usize, SchemaError> {
        let by_key: HashMap<String, &ColumnException> =
            self.columns.iter().map(|c| (c.key(), c)).collect();

        let qualified = table.qualified_name();
        let mut applied = 0;
        for column in table.columns.iter_mut() {
            let key = format!("{}.{}", qualified, column.name);
            let Some(exception) = by_key.get(&key) else {
                continue;
            };

            column.data_type = exception.data_type.parse::<DataType>()?;
            column.type_name = exception.data_type.clone();
            column.length = exception.length;
            column.scale = exception.scale;
            column.precision = exception.precision;
            column.is_nullable = exception.is_nullable;
            column.is_adulterated = exception.is_adulterated;
            applied += 1;
        }
        Ok(applied)
    }
}
