//! Error types for BCP decoding

use std::io;
use thiserror::Error;

use crate::reader::ExtractedColumn;

/// Errors that can occur while building or amending a table schema
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Type string that does not name a known SQL Server type
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),
    /// Column exception list could not be parsed
    #[error("Exception list parse error: {0}")]
    ExceptionList(#[from] serde_json::Error),
    /// IO error while reading a schema-related file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Errors that can occur with data sources
#[derive(Debug, Error)]
pub enum SourceError {
    /// File system error
    #[error("File system error: {0}")]
    FileSystemError(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Permission denied
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

/// Errors that can occur while decoding a single column
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The stream ended before the requested bytes were available
    #[error("Unexpected end of stream")]
    UnexpectedEof,
    /// IO error from the underlying stream
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// A fixed-width type decoded a byte count other than its width
    #[error("Invalid byte count for column {column:?}: expected {expected}, found {actual}")]
    SizeMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
    /// No decoder exists for the column's type
    #[error("No decoder defined for column {column:?} (datatype {data_type})")]
    UnsupportedType { column: String, data_type: String },
    /// The payload does not have a shape the type decoder accepts
    #[error("Malformed value for column {column:?}: {message}")]
    Malformed { column: String, message: String },
}

impl DecodeError {
    /// Build a `Malformed` error for the named column.
    pub fn malformed(column: impl Into<String>, message: impl Into<String>) -> Self {
        DecodeError::Malformed {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Whether this error is the stream running dry.
    pub fn is_eof(&self) -> bool {
        match self {
            DecodeError::UnexpectedEof => true,
            DecodeError::Io(e) => e.kind() == io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }
}

/// A row that failed to decode, with the columns decoded before the failure.
#[derive(Debug, Error)]
#[error("Decode error in row {row_index}, column {column:?} at offset {offset}: {source}")]
pub struct RowError {
    /// Zero-based index of the row being decoded
    pub row_index: u64,
    /// Name of the column whose decoder failed
    pub column: String,
    /// Stream offset at which the failing column started
    pub offset: u64,
    /// Columns decoded before the failure
    pub partial_row: Vec<ExtractedColumn>,
    /// The underlying failure
    #[source]
    pub source: DecodeError,
}

/// Top-level reader error type
#[derive(Debug, Error)]
pub enum ReaderError {
    /// Source error
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Decode error in a row
    #[error(transparent)]
    Row(Box<RowError>),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ReaderError {
    /// The row error, if this failure happened while decoding a row.
    pub fn as_row_error(&self) -> Option<&RowError> {
        match self {
            ReaderError::Row(e) => Some(e),
            _ => None,
        }
    }

    /// Whether the failure came from the filesystem rather than the data.
    pub fn is_io(&self) -> bool {
        match self {
            ReaderError::Source(_) => true,
            ReaderError::Row(e) => matches!(e.source, DecodeError::Io(_)),
            _ => false,
        }
    }
}

impl From<RowError> for ReaderError {
    fn from(err: RowError) -> Self {
        ReaderError::Row(Box::new(err))
    }
}
