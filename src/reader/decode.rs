//! Per-type column decoders.
//!
//! Every column is decoded in the same three steps:
//! - read the size prefix with the type's `(width, default)` layout
//! - read exactly that many payload bytes
//! - render the payload as canonical text
//!
//! Multi-byte numbers are little-endian throughout. Text is the only output
//! form; numeric and temporal interpretation is left to the consumer.

use std::fmt::Write;

use tracing::trace;

use super::correction::PayloadCorrection;
use super::cursor::ByteSource;
use super::extracted::ExtractedColumn;
use super::le::{le_signed, le_u128, le_u64};
use super::preview::preview_hex;
use super::size_prefix::{read_stored_size, NullSentinel};
use super::temporal;
use crate::error::DecodeError;
use crate::schema::{DataType, TableColumn};

/// `money` and `smallmoney` always carry four decimal places.
const MONEY_SCALE: u8 = 4;

/// Size-prefix layout of a column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixLayout {
    /// Width of the length prefix in bytes.
    pub width: usize,
    /// Payload size of NOT NULL values, which carry no prefix; 0 if variable.
    pub default: usize,
    /// Payload size every non-NULL value must have.
    pub expected: Option<usize>,
}

impl PrefixLayout {
    const fn fixed(width: usize, size: usize) -> Self {
        Self {
            width,
            default: size,
            expected: Some(size),
        }
    }

    const fn loose(width: usize, default: usize) -> Self {
        Self {
            width,
            default,
            expected: None,
        }
    }
}

/// Storage width of a `float` column: 4 bytes up to precision 24, else 8.
///
/// An undeclared precision (0) falls in the 4 byte range.
pub fn float_width(precision: u8) -> usize {
    if precision <= 24 {
        4
    } else {
        8
    }
}

/// The size-prefix layout used for `column`.
///
/// # Errors
/// `DecodeError::UnsupportedType` for types without a decoder.
pub fn prefix_layout(column: &TableColumn) -> Result<PrefixLayout, DecodeError> {
    let layout = match column.data_type {
        DataType::TinyInt | DataType::SmallInt | DataType::Int | DataType::BigInt => {
            let width = column.data_type.integer_width().unwrap_or(8);
            PrefixLayout::fixed(1, width)
        }
        DataType::Bit => PrefixLayout::fixed(1, 1),
        DataType::Real => PrefixLayout::fixed(1, 4),
        DataType::Float => PrefixLayout::fixed(1, float_width(column.precision)),
        DataType::Decimal | DataType::Numeric => PrefixLayout::loose(1, 0),
        DataType::Money => PrefixLayout::fixed(1, 8),
        DataType::SmallMoney => PrefixLayout::fixed(1, 4),
        DataType::Datetime => PrefixLayout::fixed(1, 8),
        DataType::SmallDatetime => PrefixLayout::fixed(1, 4),
        DataType::Date => PrefixLayout::fixed(1, 3),
        DataType::Time => PrefixLayout::loose(1, 5),
        DataType::Datetime2 => PrefixLayout::loose(1, 8),
        DataType::UniqueIdentifier => PrefixLayout::fixed(1, 16),
        DataType::Char | DataType::NChar => PrefixLayout::loose(2, 2 * column.length),
        DataType::Varchar | DataType::NVarchar | DataType::NText => PrefixLayout::loose(2, 0),
        DataType::Text => PrefixLayout::loose(4, 0),
        DataType::Binary => PrefixLayout::loose(2, 0),
        DataType::Varbinary | DataType::Geography => PrefixLayout::loose(8, 0),
        DataType::DatetimeOffset | DataType::SQLVariant => {
            return Err(DecodeError::UnsupportedType {
                column: column.name.clone(),
                data_type: column.type_name.clone(),
            })
        }
    };
    Ok(layout)
}

/// Per-scan settings that affect how a single column is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Rule for recognising NULL size prefixes.
    pub null_sentinel: NullSentinel,
    /// Emit a trace event with the payload bytes of every column.
    pub trace_bytes: bool,
    /// Maximum length of byte previews in log events.
    pub preview_len: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            null_sentinel: NullSentinel::default(),
            trace_bytes: false,
            preview_len: 30,
        }
    }
}

/// Decode the next value of `column` from `source`.
///
/// `correction`, when given, runs on the payload before it is rendered.
///
/// # Errors
/// - `DecodeError::UnexpectedEof` / `DecodeError::Io` from the stream
/// - `DecodeError::SizeMismatch` when a fixed-width type has the wrong byte count
/// - `DecodeError::UnsupportedType` for types without a decoder
/// - `DecodeError::Malformed` for payloads the type cannot represent
pub fn decode_column<S: ByteSource>(
    source: &mut S,
    column: &TableColumn,
    options: &DecodeOptions,
    correction: Option<&dyn PayloadCorrection>,
) -> Result<ExtractedColumn, DecodeError> {
    let layout = prefix_layout(column)?;
    let size = read_stored_size(
        source,
        column,
        layout.width,
        layout.default,
        options.null_sentinel,
    )?;
    if size.is_null {
        return Ok(ExtractedColumn::null(column));
    }

    if let Some(expected) = layout.expected {
        if size.byte_count != expected {
            return Err(DecodeError::SizeMismatch {
                column: column.name.clone(),
                expected,
                actual: size.byte_count,
            });
        }
    }
    check_declared_length(column, size.byte_count)?;

    let mut payload = source.read_bytes(size.byte_count)?;
    if options.trace_bytes {
        trace!(
            column = %column.name,
            payload = %preview_hex(&payload, options.preview_len),
            "Read payload"
        );
    }
    if let Some(correction) = correction {
        payload = correction.correct(column, payload, source)?;
    }

    render(column, payload)
}

/// Character and binary values may not exceed their declared length.
/// A declared length of 0 means unbounded.
fn check_declared_length(column: &TableColumn, byte_count: usize) -> Result<(), DecodeError> {
    let limit = match column.data_type {
        t if t.is_character() => {
            if byte_count % 2 != 0 {
                return Err(DecodeError::malformed(
                    &column.name,
                    format!("odd byte count {} for a two-byte character type", byte_count),
                ));
            }
            2 * column.length
        }
        DataType::Binary | DataType::Varbinary => column.length,
        _ => 0,
    };
    if limit > 0 && byte_count > limit {
        return Err(DecodeError::malformed(
            &column.name,
            format!(
                "{} bytes exceeds the declared length {}",
                byte_count, column.length
            ),
        ));
    }
    Ok(())
}

fn render(column: &TableColumn, payload: Vec<u8>) -> Result<ExtractedColumn, DecodeError> {
    let value = match column.data_type {
        DataType::TinyInt | DataType::SmallInt | DataType::Int | DataType::BigInt => {
            decode_integer(column, &payload)?
        }
        DataType::Bit => decode_bit(&payload),
        DataType::Real | DataType::Float => decode_float(column, &payload)?,
        DataType::Decimal | DataType::Numeric => decode_decimal(column, &payload)?,
        DataType::Money | DataType::SmallMoney => decode_money(column, &payload)?,
        DataType::Datetime => temporal::decode_datetime(column, &payload)?,
        DataType::SmallDatetime => temporal::decode_smalldatetime(column, &payload)?,
        DataType::Date => temporal::decode_date(column, &payload)?,
        DataType::Time => temporal::decode_time(column, &payload)?,
        DataType::Datetime2 => temporal::decode_datetime2(column, &payload)?,
        DataType::UniqueIdentifier => decode_guid(column, &payload)?,
        t if t.is_character() => decode_utf16(&payload),
        DataType::Binary | DataType::Varbinary => {
            let text = hex_upper(&payload);
            return Ok(ExtractedColumn::with_value(column, text).with_raw(payload));
        }
        DataType::Geography => {
            let text = decode_geography(column, &payload)?;
            return Ok(ExtractedColumn::with_value(column, text).with_raw(payload));
        }
        _ => {
            return Err(DecodeError::UnsupportedType {
                column: column.name.clone(),
                data_type: column.type_name.clone(),
            })
        }
    };
    Ok(ExtractedColumn::with_value(column, value))
}

// ============================================================================
// Numeric types
// ============================================================================

/// Integers: `tinyint` is unsigned, the wider types are two's complement.
pub fn decode_integer(column: &TableColumn, payload: &[u8]) -> Result<String, DecodeError> {
    let width = column.data_type.integer_width().unwrap_or(payload.len());
    let value = if column.data_type == DataType::TinyInt {
        le_u64(payload).map(|v| v.to_string())
    } else {
        le_signed(payload, width).map(|v| v.to_string())
    };
    value.ok_or_else(|| {
        DecodeError::malformed(
            &column.name,
            format!("{} bytes is not a {}-byte integer", payload.len(), width),
        )
    })
}

/// `bit`: any nonzero byte is true.
pub fn decode_bit(payload: &[u8]) -> String {
    if payload.iter().any(|&b| b != 0) {
        "1".to_string()
    } else {
        "0".to_string()
    }
}

/// `real` and `float`: IEEE-754, 4 or 8 bytes, always with a fractional part.
pub fn decode_float(column: &TableColumn, payload: &[u8]) -> Result<String, DecodeError> {
    match payload.len() {
        4 => {
            let bytes = [payload[0], payload[1], payload[2], payload[3]];
            Ok(format_float(f32::from_le_bytes(bytes) as f64, || {
                format!("{:?}", f32::from_le_bytes(bytes))
            }))
        }
        8 => {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(payload);
            let v = f64::from_le_bytes(bytes);
            Ok(format_float(v, || format!("{:?}", v)))
        }
        n => Err(DecodeError::malformed(
            &column.name,
            format!("{} bytes is not a 4 or 8 byte float", n),
        )),
    }
}

fn format_float(value: f64, render: impl FnOnce() -> String) -> String {
    let mut s = render();
    if value.is_finite() && !s.contains('.') && !s.contains('e') {
        s.push_str(".0");
    }
    s
}

/// Insert a decimal point `scale` digits from the right of `magnitude`,
/// zero-padding so at least one digit precedes the point.
pub fn format_scaled(negative: bool, magnitude: u128, scale: u8) -> String {
    let digits = magnitude.to_string();
    let sign = if negative && magnitude != 0 { "-" } else { "" };
    let scale = scale as usize;
    if scale == 0 {
        return format!("{}{}", sign, digits);
    }
    let padded = format!("{:0>width$}", digits, width = scale + 1);
    let (int_part, frac_part) = padded.split_at(padded.len() - scale);
    format!("{}{}.{}", sign, int_part, frac_part)
}

/// `decimal` and `numeric`: `[precision, scale, sign, magnitude...]` where a
/// sign byte of 0 means negative.
pub fn decode_decimal(column: &TableColumn, payload: &[u8]) -> Result<String, DecodeError> {
    if payload.len() < 3 {
        return Err(DecodeError::malformed(
            &column.name,
            format!("{} bytes is too short for a decimal", payload.len()),
        ));
    }
    let scale = payload[1];
    let negative = payload[2] == 0x00;
    let magnitude = le_u128(&payload[3..]).ok_or_else(|| {
        DecodeError::malformed(&column.name, "decimal magnitude exceeds 16 bytes")
    })?;
    Ok(format_scaled(negative, magnitude, scale))
}

/// `money` (8 bytes) and `smallmoney` (4 bytes): signed integers in units
/// of 1/10000.
pub fn decode_money(column: &TableColumn, payload: &[u8]) -> Result<String, DecodeError> {
    let value = le_signed(payload, payload.len()).ok_or_else(|| {
        DecodeError::malformed(
            &column.name,
            format!("{} bytes is not a money value", payload.len()),
        )
    })?;
    Ok(format_scaled(
        value < 0,
        value.unsigned_abs() as u128,
        MONEY_SCALE,
    ))
}

// ============================================================================
// Identifiers, text and binary
// ============================================================================

/// `uniqueidentifier`: the first three groups are little-endian integers,
/// the last eight bytes are in stored order. No separators.
pub fn decode_guid(column: &TableColumn, payload: &[u8]) -> Result<String, DecodeError> {
    if payload.len() != 16 {
        return Err(DecodeError::SizeMismatch {
            column: column.name.clone(),
            expected: 16,
            actual: payload.len(),
        });
    }
    let data1 = u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]);
    let data2 = u16::from_le_bytes([payload[4], payload[5]]);
    let data3 = u16::from_le_bytes([payload[6], payload[7]]);
    Ok(format!(
        "{:08X}{:04X}{:04X}{}",
        data1,
        data2,
        data3,
        hex_upper(&payload[8..])
    ))
}

/// Two-byte little-endian code units. Unpaired surrogates become U+FFFD.
pub fn decode_utf16(payload: &[u8]) -> String {
    let units = payload
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
    char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Uppercase hex without separators.
pub fn hex_upper(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{:02X}", b);
    }
    out
}

/// `geography`: a little-endian SRID, then the shape. Only single points
/// (22 byte payloads) are understood; anything else is rendered as hex.
pub fn decode_geography(column: &TableColumn, payload: &[u8]) -> Result<String, DecodeError> {
    if payload.len() < 4 {
        return Err(DecodeError::malformed(
            &column.name,
            format!("{} bytes is too short for a geography", payload.len()),
        ));
    }
    let srid = u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]);
    if payload.len() == 22 {
        let lat = read_f64(&payload[6..14]);
        let lon = read_f64(&payload[14..22]);
        return Ok(format!("SRID={};POINT({} {})", srid, lon, lat));
    }
    Ok(format!("SRID={};{}", srid, hex_upper(&payload[4..])))
}

fn read_f64(bytes: &[u8]) -> f64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    f64::from_le_bytes(buf)
}
