//! Row-at-a-time reader over a table's BCP data.
//!
//! The `BcpRowReader` is the main entry point for decoding a table. It drives
//! the column decoders across the table's columns in order and yields one row
//! per call, stopping cleanly when the stream ends on a row boundary.

use std::io::Read;
use std::path::Path;

use tracing::{debug, enabled, Level};

use super::correction::{CorrectionConfig, CorrectionSet};
use super::cursor::{ByteCursor, ByteSource};
use super::decode::{decode_column, DecodeOptions};
use super::extracted::ExtractedColumn;
use super::preview::preview_str;
use super::size_prefix::NullSentinel;
use crate::error::{ReaderError, RowError};
use crate::schema::{TableColumn, TableDef};
use crate::source::{discover_segments, SegmentedReader, DEFAULT_BUFFER_SIZE};

/// How much the reader logs about what it decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Only warnings: skipped segments and applied corrections.
    #[default]
    Quiet,
    /// A debug event per decoded column.
    Columns,
    /// Column events plus trace events with raw prefix and payload bytes.
    Bytes,
}

/// Configuration for the BcpRowReader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Read buffer size for segment files (default: 4096).
    pub buffer_size: usize,
    /// Rule for recognising NULL size prefixes (default: all bytes `0xFF`).
    pub null_sentinel: NullSentinel,
    /// Logging detail (default: quiet).
    pub verbosity: Verbosity,
    /// Maximum length of value and byte previews in log events (default: 30).
    pub preview_len: usize,
    /// Maximum bytes a correction may discard per value (default: 16).
    pub correction_limit: usize,
    /// Longest declared `char` length that gets the leading-null correction
    /// (default: 16).
    pub char_correction_max_length: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            null_sentinel: NullSentinel::default(),
            verbosity: Verbosity::default(),
            preview_len: 30,
            correction_limit: 16,
            char_correction_max_length: 16,
        }
    }
}

impl ReaderConfig {
    /// Create a new ReaderConfig with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the segment read buffer size.
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Set the NULL prefix rule.
    pub fn with_null_sentinel(mut self, sentinel: NullSentinel) -> Self {
        self.null_sentinel = sentinel;
        self
    }

    /// Set the logging detail.
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set the preview length for log events.
    pub fn with_preview_len(mut self, preview_len: usize) -> Self {
        self.preview_len = preview_len;
        self
    }

    /// Set the maximum bytes a correction may discard per value.
    pub fn with_correction_limit(mut self, limit: usize) -> Self {
        self.correction_limit = limit;
        self
    }

    /// Set the longest `char` column that gets the leading-null correction.
    pub fn with_char_correction_max_length(mut self, length: usize) -> Self {
        self.char_correction_max_length = length;
        self
    }

    /// Check the settings for values the reader cannot work with.
    ///
    /// # Errors
    /// `ReaderError::Configuration` naming the offending setting.
    pub fn validate(&self) -> Result<(), ReaderError> {
        if self.buffer_size == 0 {
            return Err(ReaderError::Configuration(
                "buffer_size must be greater than zero".to_string(),
            ));
        }
        if self.correction_limit == 0 {
            return Err(ReaderError::Configuration(
                "correction_limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// The per-column decode settings implied by this configuration.
    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            null_sentinel: self.null_sentinel,
            trace_bytes: self.verbosity >= Verbosity::Bytes,
            preview_len: self.preview_len,
        }
    }

    /// The correction settings implied by this configuration.
    pub fn correction_config(&self) -> CorrectionConfig {
        CorrectionConfig {
            limit: self.correction_limit,
            char_max_length: self.char_correction_max_length,
        }
    }
}

/// Reads a table's rows from a byte stream.
///
/// Rows have no delimiters: each call decodes one value per column, in
/// column order. The reader stops for good at the end of the stream or at
/// the first error.
///
/// # Example
/// ```no_run
/// use bactract::reader::{BcpRowReader, ReaderConfig};
/// use bactract::schema::{DataType, TableColumn};
///
/// let columns = vec![
///     TableColumn::new("id", DataType::Int).not_null(),
///     TableColumn::new("name", DataType::NVarchar).with_length(50),
/// ];
/// let segments = ["Data/dbo.Users/TableData-000-00000.BCP"];
/// let mut reader = BcpRowReader::open(columns, segments, ReaderConfig::new())?;
///
/// while let Some(row) = reader.read_next_row()? {
///     let values: Vec<_> = row.iter().map(|c| c.as_str().unwrap_or("NULL")).collect();
///     println!("{}", values.join("|"));
/// }
/// # Ok::<(), bactract::ReaderError>(())
/// ```
#[derive(Debug)]
pub struct BcpRowReader<R> {
    columns: Vec<TableColumn>,
    cursor: ByteCursor<R>,
    config: ReaderConfig,
    options: DecodeOptions,
    corrections: CorrectionSet,
    rows_read: u64,
    finished: bool,
}

impl BcpRowReader<SegmentedReader> {
    /// Open a table stored in the given segment files, read in order.
    ///
    /// Segments are opened lazily, so a missing or unreadable file is only
    /// noticed once reading reaches it.
    ///
    /// # Errors
    /// `ReaderError::Configuration` for an empty column list or invalid config.
    pub fn open<P: AsRef<Path>>(
        columns: Vec<TableColumn>,
        segments: impl IntoIterator<Item = P>,
        config: ReaderConfig,
    ) -> Result<Self, ReaderError> {
        let stream = SegmentedReader::with_buffer_size(segments, config.buffer_size);
        Self::new(columns, stream, config)
    }

    /// Open a table by locating its segments under `base_dir`.
    ///
    /// A table without a data directory has no rows.
    ///
    /// # Errors
    /// - `ReaderError::Source` if the data directory cannot be listed
    /// - `ReaderError::Configuration` for an empty column list or invalid config
    pub fn open_table(
        table: &TableDef,
        base_dir: impl AsRef<Path>,
        config: ReaderConfig,
    ) -> Result<Self, ReaderError> {
        let dir = table.data_dir(base_dir);
        let segments = discover_segments(&dir)?;
        debug!(
            table = %table.qualified_name(),
            dir = %dir.display(),
            segments = segments.len(),
            "Opening table"
        );
        Self::open(table.columns.clone(), segments, config)
    }
}

impl<R: Read> BcpRowReader<R> {
    /// Create a reader over any byte stream.
    ///
    /// Corrections are registered for every column flagged adulterated.
    ///
    /// # Errors
    /// `ReaderError::Configuration` for an empty column list or invalid config.
    pub fn new(
        columns: Vec<TableColumn>,
        reader: R,
        config: ReaderConfig,
    ) -> Result<Self, ReaderError> {
        config.validate()?;
        if columns.is_empty() {
            return Err(ReaderError::Configuration(
                "a table needs at least one column".to_string(),
            ));
        }

        let corrections = CorrectionSet::for_columns(&columns, &config.correction_config());
        Ok(Self {
            options: config.decode_options(),
            columns,
            cursor: ByteCursor::new(reader),
            config,
            corrections,
            rows_read: 0,
            finished: false,
        })
    }

    /// Decode the next row.
    ///
    /// # Returns
    /// - `Ok(Some(row))` - one value per column, in column order
    /// - `Ok(None)` - the stream ended on a row boundary
    /// - `Err(e)` - a column failed; the error carries the columns decoded
    ///   before it
    ///
    /// A stream that ends part way through a row is an error, not the end.
    pub fn read_next_row(&mut self) -> Result<Option<Vec<ExtractedColumn>>, ReaderError> {
        if self.finished {
            return Ok(None);
        }

        let row_start = self.cursor.offset();
        let mut row = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            let offset = self.cursor.offset();
            let correction = self.corrections.get(&column.name);
            match decode_column(&mut self.cursor, column, &self.options, correction) {
                Ok(value) => {
                    if self.config.verbosity >= Verbosity::Columns && enabled!(Level::DEBUG) {
                        debug!(
                            row = self.rows_read,
                            column = %column.name,
                            data_type = %column.data_type,
                            is_null = value.is_null,
                            value = %preview_str(&value.value, self.config.preview_len),
                            "Decoded column"
                        );
                    }
                    row.push(value);
                }
                // EOF is the end of the table only if the row took no bytes.
                Err(e) if e.is_eof() && self.cursor.offset() == row_start => {
                    self.finished = true;
                    debug!(rows = self.rows_read, offset, "End of table data");
                    return Ok(None);
                }
                Err(source) => {
                    self.finished = true;
                    return Err(RowError {
                        row_index: self.rows_read,
                        column: column.name.clone(),
                        offset,
                        partial_row: row,
                        source,
                    }
                    .into());
                }
            }
        }

        self.rows_read += 1;
        Ok(Some(row))
    }

    /// The columns each row is decoded with.
    pub fn columns(&self) -> &[TableColumn] {
        &self.columns
    }

    /// Number of rows decoded so far.
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Bytes consumed from the stream so far.
    pub fn offset(&self) -> u64 {
        self.cursor.offset()
    }

    /// Whether the reader has stopped, at the end of the data or on an error.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Get the configuration being used.
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// The payload corrections in use, for registering custom ones.
    pub fn corrections_mut(&mut self) -> &mut CorrectionSet {
        &mut self.corrections
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &R {
        self.cursor.get_ref()
    }

    /// Unwrap the underlying stream.
    pub fn into_inner(self) -> R {
        self.cursor.into_inner()
    }
}

impl<R: Read> Iterator for BcpRowReader<R> {
    type Item = Result<Vec<ExtractedColumn>, ReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next_row().transpose()
    }
}

impl<R: Read> std::iter::FusedIterator for BcpRowReader<R> {}
