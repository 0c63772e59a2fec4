//! Table schema descriptors.
//!
//! This module defines the column and table descriptors the decoder is driven
//! by, and the exception lists that amend them.

mod exceptions;
mod types;

pub use exceptions::{ColumnException, ColumnExceptions};
pub use types::{DataType, TableColumn, TableDef};
