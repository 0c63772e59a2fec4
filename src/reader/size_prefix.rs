//! Size prefixes: how many payload bytes follow, and whether the value is NULL.
//!
//! Every value in a BCP file is either written bare (NOT NULL columns of a
//! fixed size) or preceded by a 1, 2, 4 or 8 byte little-endian length. The
//! prefix is zero-padded at the high end, and a prefix filled with `0xFF`
//! marks NULL. A zero length is a present but empty value, which is how an
//! empty string differs from NULL.

use tracing::trace;

use super::cursor::ByteSource;
use super::le::{le_u64, strip_trailing_nulls};
use super::preview::preview_hex;
use crate::error::DecodeError;
use crate::schema::TableColumn;

/// Rule used to recognise a NULL size prefix.
///
/// Captured exports have been read successfully with both rules; they differ
/// only for prefixes such as `[0xFF, 0x00]`, which `AllBytes` reads as a
/// length of 255 and `FirstStrippedByte` reads as NULL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullSentinel {
    /// Every raw prefix byte is `0xFF`.
    #[default]
    AllBytes,
    /// The first byte of the prefix, after stripping trailing zero bytes, is `0xFF`.
    FirstStrippedByte,
}

impl NullSentinel {
    /// Whether `prefix` is a NULL marker under this rule.
    pub fn is_null(&self, prefix: &[u8]) -> bool {
        if prefix.is_empty() {
            return false;
        }
        match self {
            NullSentinel::AllBytes => prefix.iter().all(|&b| b == 0xFF),
            NullSentinel::FirstStrippedByte => strip_trailing_nulls(prefix)[0] == 0xFF,
        }
    }
}

/// Result of reading a column's size prefix.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoredSize {
    /// Number of payload bytes to read next.
    pub byte_count: usize,
    /// Whether the prefix marked the value NULL.
    pub is_null: bool,
    /// The raw prefix bytes (empty when no prefix was read).
    pub size_bytes: Vec<u8>,
}

/// Determine how many payload bytes follow for `column`.
///
/// * `width` - size of the length prefix in bytes (1, 2, 4 or 8)
/// * `default` - fixed payload size of the type, or 0 if it has none
///
/// NOT NULL columns with a fixed size carry no prefix at all, so nothing is
/// read and the byte count is `default`. Everything else reads `width`
/// prefix bytes.
///
/// # Errors
/// - `DecodeError::UnexpectedEof` / `DecodeError::Io` from the stream
/// - `DecodeError::Malformed` if the prefix does not fit in `usize`
pub fn read_stored_size<S: ByteSource + ?Sized>(
    source: &mut S,
    column: &TableColumn,
    width: usize,
    default: usize,
    sentinel: NullSentinel,
) -> Result<StoredSize, DecodeError> {
    if !column.is_nullable && default > 0 {
        return Ok(StoredSize {
            byte_count: default,
            is_null: false,
            size_bytes: Vec::new(),
        });
    }

    let size_bytes = source.read_bytes(width)?;
    trace!(column = %column.name, prefix = %preview_hex(&size_bytes, 0), "Read size prefix");

    if sentinel.is_null(&size_bytes) {
        return Ok(StoredSize {
            byte_count: 0,
            is_null: true,
            size_bytes,
        });
    }

    let byte_count = le_u64(&size_bytes)
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| {
            DecodeError::malformed(
                &column.name,
                format!("size prefix {:02X?} is out of range", size_bytes),
            )
        })?;

    Ok(StoredSize {
        byte_count,
        is_null: false,
        size_bytes,
    })
}
