//! Workarounds for columns whose byte stream contains spurious bytes.
//!
//! Some exports interleave junk into the stream of particular columns: a run
//! of `0xFF` bytes in front of a NOT NULL integer, or zero bytes shaped like a
//! size prefix in front of a short NOT NULL `char`. Nothing in the data
//! announces this, so the heuristics here only run for columns flagged
//! adulterated by an exception list, and they will mangle legitimate values
//! that happen to match the signature (an `int` of -1, a `char` starting with
//! U+0000). They patch over an incompletely understood format; they are not a
//! general fix.

use std::collections::HashMap;
use std::fmt;

use tracing::warn;

use super::cursor::ByteSource;
use crate::error::DecodeError;
use crate::schema::{DataType, TableColumn};

/// A post-read fix-up applied to one column's payload.
pub trait PayloadCorrection: fmt::Debug + Send + Sync {
    /// Short name used in log events.
    fn name(&self) -> &'static str;

    /// Inspect `payload` for the corruption signature and, if present,
    /// discard the junk and read replacement bytes from `source`.
    fn correct(
        &self,
        column: &TableColumn,
        payload: Vec<u8>,
        source: &mut dyn ByteSource,
    ) -> Result<Vec<u8>, DecodeError>;
}

/// Shift off leading `junk` bytes, topping the payload back up from the
/// stream, until it starts with something else.
///
/// Single-byte payloads are left alone: there is nothing to tell junk from data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpuriousRunCorrection {
    /// The byte the spurious run consists of.
    pub junk: u8,
    /// Maximum bytes discarded before giving up.
    pub limit: usize,
}

impl SpuriousRunCorrection {
    /// Runs of `0xFF` ahead of integer payloads.
    pub fn ff_run(limit: usize) -> Self {
        Self { junk: 0xFF, limit }
    }

    /// Zero bytes ahead of fixed `char` payloads.
    pub fn leading_nulls(limit: usize) -> Self {
        Self { junk: 0x00, limit }
    }
}

impl PayloadCorrection for SpuriousRunCorrection {
    fn name(&self) -> &'static str {
        if self.junk == 0xFF {
            "ff-run"
        } else {
            "leading-nulls"
        }
    }

    fn correct(
        &self,
        column: &TableColumn,
        mut payload: Vec<u8>,
        source: &mut dyn ByteSource,
    ) -> Result<Vec<u8>, DecodeError> {
        let mut discarded = 0;
        while payload.len() > 1 && payload[0] == self.junk {
            if discarded == self.limit {
                return Err(DecodeError::malformed(
                    &column.name,
                    format!(
                        "more than {} spurious 0x{:02X} bytes before the value",
                        self.limit, self.junk
                    ),
                ));
            }
            let next = source.read_bytes(1)?;
            payload.rotate_left(1);
            if let Some(last) = payload.last_mut() {
                *last = next[0];
            }
            discarded += 1;
        }

        if discarded > 0 {
            warn!(
                column = %column.name,
                correction = self.name(),
                discarded,
                offset = source.offset(),
                "Discarded spurious bytes"
            );
        }
        Ok(payload)
    }
}

/// Settings for choosing corrections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrectionConfig {
    /// Maximum bytes a correction may discard per value.
    pub limit: usize,
    /// Longest declared `char` length that receives the leading-null fix.
    pub char_max_length: usize,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            limit: 16,
            char_max_length: 16,
        }
    }
}

/// The built-in correction for an adulterated column, if its type has one.
pub fn correction_for(
    column: &TableColumn,
    config: &CorrectionConfig,
) -> Option<Box<dyn PayloadCorrection>> {
    if column.is_nullable {
        return None;
    }
    match column.data_type {
        DataType::TinyInt | DataType::SmallInt | DataType::Int | DataType::BigInt => {
            Some(Box::new(SpuriousRunCorrection::ff_run(config.limit)))
        }
        DataType::Char | DataType::NChar if column.length <= config.char_max_length => {
            Some(Box::new(SpuriousRunCorrection::leading_nulls(config.limit)))
        }
        _ => None,
    }
}

/// Corrections keyed by column name.
#[derive(Debug, Default)]
pub struct CorrectionSet {
    by_column: HashMap<String, Box<dyn PayloadCorrection>>,
}

impl CorrectionSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in corrections for every adulterated column in `columns`.
    pub fn for_columns(columns: &[TableColumn], config: &CorrectionConfig) -> Self {
        let mut set = Self::new();
        for column in columns.iter().filter(|c| c.is_adulterated) {
            match correction_for(column, config) {
                Some(correction) => set.insert(&column.name, correction),
                None => warn!(
                    column = %column.name,
                    data_type = %column.data_type,
                    nullable = column.is_nullable,
                    "Column is flagged adulterated but has no correction"
                ),
            }
        }
        set
    }

    /// Register (or replace) the correction for `column`.
    pub fn insert(&mut self, column: &str, correction: Box<dyn PayloadCorrection>) {
        self.by_column.insert(column.to_string(), correction);
    }

    /// The correction registered for `column`.
    pub fn get(&self, column: &str) -> Option<&dyn PayloadCorrection> {
        self.by_column.get(column).map(|c| c.as_ref())
    }

    /// Number of columns with a correction.
    pub fn len(&self) -> usize {
        self.by_column.len()
    }

    /// Whether no column has a correction.
    pub fn is_empty(&self) -> bool {
        self.by_column.is_empty()
    }
}
