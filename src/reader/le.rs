//! Little-endian integer reconstruction.
//!
//! BCP files store integers little-endian and, for size prefixes and some
//! magnitudes, zero-pad the high-order bytes they do not need. Values are
//! rebuilt by dropping those trailing zero bytes and OR-ing each remaining
//! byte into place:
//!
//! ```text
//! [0x39, 0x30, 0x00, 0x00]  ->  [0x39, 0x30]  ->  0x3039 = 12345
//! ```

/// Drop trailing zero bytes, always keeping at least one byte.
///
/// An all-zero input therefore becomes `[0x00]`, which still decodes as 0.
#[inline]
pub fn strip_trailing_nulls(bytes: &[u8]) -> &[u8] {
    let mut end = bytes.len();
    while end > 1 && bytes[end - 1] == 0x00 {
        end -= 1;
    }
    &bytes[..end]
}

/// Decode an unsigned little-endian integer of at most 8 significant bytes.
///
/// Returns `None` if more than 8 bytes remain after stripping.
#[inline]
pub fn le_u64(bytes: &[u8]) -> Option<u64> {
    let bytes = strip_trailing_nulls(bytes);
    if bytes.len() > 8 {
        return None;
    }
    Some(
        bytes
            .iter()
            .enumerate()
            .fold(0u64, |acc, (i, &b)| acc | (b as u64) << (8 * i)),
    )
}

/// Decode an unsigned little-endian integer of at most 16 significant bytes.
///
/// Decimal magnitudes of precision 38 need the full 128 bits.
#[inline]
pub fn le_u128(bytes: &[u8]) -> Option<u128> {
    let bytes = strip_trailing_nulls(bytes);
    if bytes.len() > 16 {
        return None;
    }
    Some(
        bytes
            .iter()
            .enumerate()
            .fold(0u128, |acc, (i, &b)| acc | (b as u128) << (8 * i)),
    )
}

/// Decode a two's complement little-endian integer `width` bytes wide.
///
/// `bytes` must be exactly `width` long, with `width` between 1 and 8.
#[inline]
pub fn le_signed(bytes: &[u8], width: usize) -> Option<i64> {
    if bytes.len() != width || width == 0 || width > 8 {
        return None;
    }
    let raw = le_u64(bytes)?;
    let shift = 64 - 8 * width as u32;
    Some(((raw << shift) as i64) >> shift)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_trailing_nulls() {
        assert_eq!(strip_trailing_nulls(&[0x04, 0x00]), &[0x04]);
        assert_eq!(strip_trailing_nulls(&[0x00, 0x01, 0x00, 0x00]), &[0x00, 0x01]);
        assert_eq!(strip_trailing_nulls(&[0x00, 0x00]), &[0x00]);
        assert_eq!(strip_trailing_nulls(&[0xFF]), &[0xFF]);
        assert_eq!(strip_trailing_nulls(&[]), &[] as &[u8]);
    }

    #[test]
    fn test_le_u64() {
        assert_eq!(le_u64(&[0x39, 0x30, 0x00, 0x00]), Some(12345));
        assert_eq!(le_u64(&[0x00, 0x00]), Some(0));
        assert_eq!(le_u64(&[]), Some(0));
        assert_eq!(le_u64(&[0xFF; 8]), Some(u64::MAX));
        assert_eq!(le_u64(&[0x01; 9]), None);
        // Padding beyond eight bytes is fine once stripped.
        assert_eq!(le_u64(&[0x01, 0, 0, 0, 0, 0, 0, 0, 0, 0]), Some(1));
    }

    #[test]
    fn test_le_u128() {
        let mut bytes = [0u8; 16];
        bytes[15] = 0x01;
        assert_eq!(le_u128(&bytes), Some(1u128 << 120));
        assert_eq!(le_u128(&[0x01; 17]), None);
    }

    #[test]
    fn test_le_signed() {
        assert_eq!(le_signed(&[0xFF, 0xFF, 0xFF, 0xFF], 4), Some(-1));
        assert_eq!(le_signed(&[0xFE, 0xFF], 2), Some(-2));
        assert_eq!(le_signed(&[0x00, 0x00, 0x00, 0x80], 4), Some(i32::MIN as i64));
        assert_eq!(le_signed(&[0x2A, 0x00, 0x00, 0x00], 4), Some(42));
        assert_eq!(
            le_signed(&i64::MIN.to_le_bytes(), 8),
            Some(i64::MIN)
        );
        assert_eq!(le_signed(&[0x01, 0x00], 4), None);
    }
}
