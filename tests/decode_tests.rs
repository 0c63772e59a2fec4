//! Column decoding tests against hand-built BCP byte sequences.
//!
//! Each test encodes values the way SQL Server's bulk-copy export writes
//! them and checks the text the decoder produces.

use bactract::reader::{
    decode_column, prefix_layout, ByteCursor, ByteSource, DecodeOptions, NullSentinel,
};
use bactract::{DataType, DecodeError, ExtractedColumn, TableColumn};

fn decode_with(
    column: &TableColumn,
    data: &[u8],
    options: &DecodeOptions,
) -> Result<(ExtractedColumn, u64), DecodeError> {
    let mut cursor = ByteCursor::new(data);
    let value = decode_column(&mut cursor, column, options, None)?;
    Ok((value, cursor.offset()))
}

fn decode(column: &TableColumn, data: &[u8]) -> ExtractedColumn {
    decode_with(column, data, &DecodeOptions::default())
        .unwrap()
        .0
}

// ============================================================================
// Integers
// ============================================================================

#[test]
fn test_not_null_integers_round_trip() {
    let cases: [(DataType, i64); 7] = [
        (DataType::SmallInt, i16::MIN as i64),
        (DataType::SmallInt, i16::MAX as i64),
        (DataType::Int, -123_456),
        (DataType::Int, i32::MAX as i64),
        (DataType::BigInt, i64::MIN),
        (DataType::BigInt, 0),
        (DataType::BigInt, 9_007_199_254_740_993),
    ];
    for (data_type, v) in cases {
        let width = data_type.integer_width().unwrap();
        let column = TableColumn::new("n", data_type).not_null();
        let bytes = &v.to_le_bytes()[..width];
        let (value, consumed) = decode_with(&column, bytes, &DecodeOptions::default()).unwrap();
        assert!(!value.is_null);
        assert_eq!(value.value, v.to_string(), "{:?}", data_type);
        assert_eq!(consumed, width as u64);
    }
}

#[test]
fn test_not_null_integer_never_empty() {
    let column = TableColumn::new("n", DataType::Int).not_null();
    let value = decode(&column, &[0x00, 0x00, 0x00, 0x00]);
    assert_eq!(value.value, "0");
    assert!(!value.is_null);
}

// ============================================================================
// NULL prefixes
// ============================================================================

#[test]
fn test_all_ff_prefix_is_null_for_every_type() {
    for data_type in DataType::ALL {
        let column = TableColumn::new("c", data_type).with_length(4);
        let Ok(layout) = prefix_layout(&column) else {
            continue;
        };
        let prefix = vec![0xFF; layout.width];
        let (value, consumed) =
            decode_with(&column, &prefix, &DecodeOptions::default()).unwrap();
        assert!(value.is_null, "{:?}", data_type);
        assert_eq!(value.value, "");
        assert_eq!(value.as_str(), None);
        assert_eq!(consumed, layout.width as u64);
    }
}

#[test]
fn test_first_stripped_byte_sentinel() {
    let column = TableColumn::new("s", DataType::NVarchar);
    let options = DecodeOptions {
        null_sentinel: NullSentinel::FirstStrippedByte,
        ..DecodeOptions::default()
    };
    let (value, _) = decode_with(&column, &[0xFF, 0x00], &options).unwrap();
    assert!(value.is_null);
}

// ============================================================================
// Decimal and money
// ============================================================================

#[test]
fn test_decimal_sign_byte() {
    let column = TableColumn::new("price", DataType::Decimal)
        .with_precision(5)
        .with_scale(2);
    let positive = [0x05, 0x05, 0x02, 0x01, 0x39, 0x30];
    let negative = [0x05, 0x05, 0x02, 0x00, 0x39, 0x30];
    assert_eq!(decode(&column, &positive).value, "123.45");
    assert_eq!(decode(&column, &negative).value, "-123.45");
}

#[test]
fn test_decimal_wide_magnitude() {
    let column = TableColumn::new("big", DataType::Numeric)
        .with_precision(38)
        .with_scale(0);
    let magnitude: u128 = 10u128.pow(37);
    let mut data = vec![19, 38, 0, 1];
    data.extend_from_slice(&magnitude.to_le_bytes());
    assert_eq!(decode(&column, &data).value, magnitude.to_string());
}

#[test]
fn test_money_values() {
    let column = TableColumn::new("total", DataType::Money).not_null();
    assert_eq!(decode(&column, &1_234_567i64.to_le_bytes()).value, "123.4567");
    assert_eq!(decode(&column, &42i64.to_le_bytes()).value, "0.0042");

    let nullable = TableColumn::new("total", DataType::SmallMoney);
    let mut data = vec![0x04];
    data.extend_from_slice(&(-50i32).to_le_bytes());
    assert_eq!(decode(&nullable, &data).value, "-0.0050");
}

// ============================================================================
// Dates and times
// ============================================================================

#[test]
fn test_datetime_values() {
    let column = TableColumn::new("created", DataType::Datetime);

    let mut epoch = vec![0x08];
    epoch.extend_from_slice(&[0u8; 8]);
    assert_eq!(decode(&column, &epoch).value, "1900-01-01 00:00:00");

    let mut next = vec![0x08];
    next.extend_from_slice(&1i32.to_le_bytes());
    next.extend_from_slice(&300i32.to_le_bytes());
    assert_eq!(decode(&column, &next).value, "1900-01-02 00:00:01");
}

#[test]
fn test_datetime2_with_prefix() {
    let column = TableColumn::new("at", DataType::Datetime2).with_scale(3);
    // 00:00:01.500 at scale 3 is 1500 ticks, in 4 bytes
    let mut data = vec![0x07];
    data.extend_from_slice(&1500u32.to_le_bytes());
    data.extend_from_slice(&[0x00, 0x00, 0x00]);
    assert_eq!(decode(&column, &data).value, "0001-01-01 00:00:01.500");
}

// ============================================================================
// Identifiers and text
// ============================================================================

#[test]
fn test_guid_rendering() {
    let column = TableColumn::new("id", DataType::UniqueIdentifier);
    let mut data = vec![0x10];
    data.extend_from_slice(&[
        0x71, 0xE2, 0x05, 0xCC, 0xCF, 0xBA, 0x72, 0x44, 0x90, 0x1C, 0x95, 0x75, 0x68, 0x48, 0x44,
        0x05,
    ]);
    assert_eq!(
        decode(&column, &data).value,
        "CC05E271BACF4472901C957568484405"
    );
}

#[test]
fn test_wide_characters() {
    let column = TableColumn::new("code", DataType::NChar).with_length(2).not_null();
    assert_eq!(decode(&column, &[0x41, 0x00, 0x42, 0x00]).value, "AB");
}

#[test]
fn test_odd_wide_payload_rejected() {
    let column = TableColumn::new("name", DataType::NVarchar);
    let result = decode_with(
        &column,
        &[0x03, 0x00, 0x41, 0x00, 0x42],
        &DecodeOptions::default(),
    );
    match result {
        Err(DecodeError::Malformed { column, .. }) => assert_eq!(column, "name"),
        other => panic!("expected Malformed, got {:?}", other),
    }
}

#[test]
fn test_non_ascii_text() {
    let column = TableColumn::new("city", DataType::NVarchar).with_length(20);
    let text = "K\u{f8}benhavn \u{6771}\u{4eac}";
    let units: Vec<u8> = text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
    let mut data = (units.len() as u16).to_le_bytes().to_vec();
    data.extend_from_slice(&units);
    assert_eq!(decode(&column, &data).value, text);
}

#[test]
fn test_binary_keeps_raw_bytes() {
    let column = TableColumn::new("hash", DataType::Binary).with_length(4);
    let data = [0x04, 0x00, 0x00, 0x01, 0xAB, 0xFF];
    let value = decode(&column, &data);
    assert_eq!(value.value, "0001ABFF");
    assert_eq!(value.raw.as_deref(), Some(&data[2..]));
}

#[test]
fn test_unsupported_type_names_declared_type() {
    let column = TableColumn::new("v", DataType::SQLVariant).with_type_name("sql_variant");
    let mut cursor = ByteCursor::new(&[0x00u8][..]);
    match decode_column(&mut cursor, &column, &DecodeOptions::default(), None) {
        Err(DecodeError::UnsupportedType { column, data_type }) => {
            assert_eq!(column, "v");
            assert_eq!(data_type, "sql_variant");
        }
        other => panic!("expected UnsupportedType, got {:?}", other),
    }
    assert_eq!(cursor.offset(), 0);
}
