//! Streaming decoder for SQL Server bacpac BCP row data
//!
//! A bacpac export stores each table's rows as undelimited binary values in
//! one or more `*.BCP` segment files. Given the table's ordered column
//! descriptors, this library reads those segments as one stream and decodes
//! every value into canonical text, one row at a time.
//!
//! ```no_run
//! use bactract::{BcpRowReader, ColumnExceptions, DataType, ReaderConfig, TableColumn, TableDef};
//!
//! let mut table = TableDef::new(
//!     "dbo",
//!     "Orders",
//!     vec![
//!         TableColumn::new("OrderId", DataType::Int).not_null(),
//!         TableColumn::new("Total", DataType::Money),
//!     ],
//! );
//! ColumnExceptions::from_path("exceptions.json")?.apply(&mut table)?;
//!
//! for row in BcpRowReader::open_table(&table, "export", ReaderConfig::new())? {
//!     for column in row? {
//!         print!("{}={} ", column.name, column.as_str().unwrap_or("NULL"));
//!     }
//!     println!();
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod reader;
pub mod schema;
pub mod source;

// Re-export main types
pub use error::{DecodeError, ReaderError, RowError, SchemaError, SourceError};
pub use reader::{
    decode_column, BcpRowReader, ByteCursor, ByteSource, CorrectionSet, DecodeOptions,
    ExtractedColumn, NullSentinel, PayloadCorrection, ReaderConfig, SpuriousRunCorrection,
    Verbosity,
};
pub use schema::{ColumnException, ColumnExceptions, DataType, TableColumn, TableDef};
pub use source::{discover_segments, SegmentedReader};
