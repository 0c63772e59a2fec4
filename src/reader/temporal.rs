//! Date and time payloads.
//!
//! SQL Server uses two epochs: `datetime` and `smalldatetime` count days from
//! 1900-01-01, while `date`, `time` and `datetime2` count days from
//! 0001-01-01 and time of day in units of 10^-scale seconds.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use super::le::le_u64;
use crate::error::DecodeError;
use crate::schema::TableColumn;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// `num_days_from_ce` of 1900-01-01.
const DAYS_CE_TO_1900: i64 = 693_596;

/// `datetime` stores the time of day in 1/300 second ticks.
const DATETIME_TICKS_PER_SECOND: i64 = 300;

/// Largest fractional-second scale of `time` and `datetime2`.
pub const MAX_TIME_SCALE: u8 = 7;

const SECONDS_PER_DAY: u64 = 86_400;

fn date_from_ce(column: &TableColumn, days_from_ce: i64) -> Result<NaiveDate, DecodeError> {
    i32::try_from(days_from_ce)
        .ok()
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .ok_or_else(|| {
            DecodeError::malformed(
                &column.name,
                format!("day number {} is out of range", days_from_ce),
            )
        })
}

fn add_seconds(
    column: &TableColumn,
    date: NaiveDate,
    seconds: i64,
) -> Result<NaiveDateTime, DecodeError> {
    NaiveDateTime::new(date, NaiveTime::MIN)
        .checked_add_signed(Duration::seconds(seconds))
        .ok_or_else(|| DecodeError::malformed(&column.name, "time of day is out of range"))
}

fn expect_len(column: &TableColumn, payload: &[u8], len: usize) -> Result<(), DecodeError> {
    if payload.len() != len {
        return Err(DecodeError::SizeMismatch {
            column: column.name.clone(),
            expected: len,
            actual: payload.len(),
        });
    }
    Ok(())
}

/// Split a tick count at `scale` into whole seconds and the fraction digits.
///
/// | scale | tick  |
/// |-------|-------|
/// | 0     | 1s    |
/// | 1     | 100ms |
/// | 2     | 10ms  |
/// | 3     | 1ms   |
/// | 4     | 100us |
/// | 5     | 10us  |
/// | 6     | 1us   |
/// | 7     | 100ns |
pub fn split_ticks(column: &TableColumn, ticks: u64, scale: u8) -> Result<(u64, u64), DecodeError> {
    if scale > MAX_TIME_SCALE {
        return Err(DecodeError::malformed(
            &column.name,
            format!("unknown time scale {}", scale),
        ));
    }
    let per_second = 10u64.pow(scale as u32);
    Ok((ticks / per_second, ticks % per_second))
}

fn push_fraction(out: &mut String, fraction: u64, scale: u8) {
    if scale > 0 {
        out.push_str(&format!(".{:0width$}", fraction, width = scale as usize));
    }
}

/// `datetime`: 4 byte signed day count since 1900-01-01, then 4 byte
/// 1/300 second ticks since midnight. Rendered `YYYY-MM-DD HH:MM:SS`.
pub fn decode_datetime(column: &TableColumn, payload: &[u8]) -> Result<String, DecodeError> {
    expect_len(column, payload, 8)?;
    let days = i32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]) as i64;
    let ticks = i32::from_le_bytes([payload[4], payload[5], payload[6], payload[7]]) as i64;

    let date = date_from_ce(column, DAYS_CE_TO_1900 + days)?;
    let dt = add_seconds(column, date, ticks / DATETIME_TICKS_PER_SECOND)?;
    Ok(dt.format(DATETIME_FORMAT).to_string())
}

/// `smalldatetime`: 2 byte day count since 1900-01-01, then 2 byte minutes
/// since midnight.
pub fn decode_smalldatetime(column: &TableColumn, payload: &[u8]) -> Result<String, DecodeError> {
    expect_len(column, payload, 4)?;
    let days = u16::from_le_bytes([payload[0], payload[1]]) as i64;
    let minutes = u16::from_le_bytes([payload[2], payload[3]]) as i64;

    let date = date_from_ce(column, DAYS_CE_TO_1900 + days)?;
    let dt = add_seconds(column, date, minutes * 60)?;
    Ok(dt.format(DATETIME_FORMAT).to_string())
}

/// `date`: 3 byte day count since 0001-01-01. Rendered `YYYY-MM-DD`.
pub fn decode_date(column: &TableColumn, payload: &[u8]) -> Result<String, DecodeError> {
    expect_len(column, payload, 3)?;
    let days = le_u64(payload).unwrap_or_default() as i64;
    let date = date_from_ce(column, days + 1)?;
    Ok(date.format(DATE_FORMAT).to_string())
}

/// `time`: little-endian ticks since midnight at the column's scale.
/// Rendered `HH:MM:SS` plus `scale` fraction digits.
pub fn decode_time(column: &TableColumn, payload: &[u8]) -> Result<String, DecodeError> {
    let ticks = le_u64(payload)
        .ok_or_else(|| DecodeError::malformed(&column.name, "time payload is too long"))?;
    let (seconds, fraction) = split_ticks(column, ticks, column.scale)?;
    if seconds >= SECONDS_PER_DAY {
        return Err(DecodeError::malformed(
            &column.name,
            format!("{} seconds is past midnight", seconds),
        ));
    }

    let mut out = format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds / 60) % 60,
        seconds % 60
    );
    push_fraction(&mut out, fraction, column.scale);
    Ok(out)
}

/// `datetime2`: time ticks as for `time`, followed by a 3 byte day count
/// since 0001-01-01. Rendered `YYYY-MM-DD HH:MM:SS` plus `scale` fraction
/// digits.
pub fn decode_datetime2(column: &TableColumn, payload: &[u8]) -> Result<String, DecodeError> {
    if payload.len() < 3 {
        return Err(DecodeError::malformed(
            &column.name,
            format!("{} bytes is too short for a datetime2", payload.len()),
        ));
    }
    let (time_bytes, date_bytes) = payload.split_at(payload.len() - 3);

    let ticks = le_u64(time_bytes)
        .ok_or_else(|| DecodeError::malformed(&column.name, "datetime2 payload is too long"))?;
    let days = le_u64(date_bytes).unwrap_or_default() as i64;

    let (seconds, fraction) = split_ticks(column, ticks, column.scale)?;
    let seconds = i64::try_from(seconds)
        .map_err(|_| DecodeError::malformed(&column.name, "time of day is out of range"))?;

    let date = date_from_ce(column, days + 1)?;
    let dt = add_seconds(column, date, seconds)?;

    let mut out = dt.format(DATETIME_FORMAT).to_string();
    push_fraction(&mut out, fraction, column.scale);
    Ok(out)
}
