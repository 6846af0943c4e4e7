use indexmap::IndexMap;
use num_bigint::BigInt;
use ubjson::{decode_from_slice, encode_to_vec, DecodeOptions, EncodeOptions, Value};

fn roundtrip(value: &Value) -> Value {
    let bytes = encode_to_vec(value, &EncodeOptions::default()).unwrap();
    decode_from_slice(&bytes, &DecodeOptions::default()).unwrap()
}

#[test]
fn literal_scalars() {
    assert_eq!(
        encode_to_vec(&Value::Bool(true), &EncodeOptions::default()).unwrap(),
        vec![0x54]
    );
    assert_eq!(
        encode_to_vec(&Value::Bool(false), &EncodeOptions::default()).unwrap(),
        vec![0x46]
    );
    assert_eq!(
        encode_to_vec(&Value::Null, &EncodeOptions::default()).unwrap(),
        vec![0x5A]
    );
}

#[test]
fn short_string() {
    let bytes = encode_to_vec(&Value::from("ab"), &EncodeOptions::default()).unwrap();
    assert_eq!(bytes, vec![0x53, 0x55, 0x02, 0x61, 0x62]);
}

#[test]
fn high_precision_decimal() {
    let decimal: rust_decimal::Decimal = "-1.5".parse().unwrap();
    let bytes = encode_to_vec(&Value::HighPrecision(decimal), &EncodeOptions::default()).unwrap();
    assert_eq!(bytes, vec![0x48, 0x55, 0x04, 0x2D, 0x31, 0x2E, 0x35]);
}

#[test]
fn typed_null_array() {
    let bytes = [0x5B, 0x24, 0x5A, 0x23, 0x55, 0x05];
    let value = decode_from_slice(&bytes, &DecodeOptions::default()).unwrap();
    assert_eq!(value, Value::array(vec![Value::Null; 5]));
}

#[test]
fn typed_int_object() {
    let bytes = [
        0x7B, 0x24, 0x69, 0x23, 0x55, 0x03, 0x55, 0x02, 0x61, 0x61, 0x01, 0x55, 0x02, 0x62, 0x62,
        0x02, 0x55, 0x02, 0x63, 0x63, 0x03,
    ];
    let value = decode_from_slice(&bytes, &DecodeOptions::default()).unwrap();
    let mut expected = IndexMap::new();
    expected.insert("aa".to_string(), Value::Integer(BigInt::from(1)));
    expected.insert("bb".to_string(), Value::Integer(BigInt::from(2)));
    expected.insert("cc".to_string(), Value::Integer(BigInt::from(3)));
    assert_eq!(value, Value::object(expected));
}

#[test]
fn invalid_fixed_type_marker() {
    let bytes = [0x5B, 0x24, 0x01];
    assert!(decode_from_slice(&bytes, &DecodeOptions::default()).is_err());
}

#[test]
fn round_trip_preserves_scalars() {
    let values = vec![
        Value::Null,
        Value::Bool(true),
        Value::Bool(false),
        Value::Char('q'),
        Value::Integer(BigInt::from(-1)),
        Value::Integer(BigInt::from(70_000)),
        Value::Integer("9999999999999999999999999999999999999".parse().unwrap()),
        Value::Float(3.5),
        Value::Float(f64::NAN),
        Value::Float(f64::INFINITY),
        Value::Float(f64::NEG_INFINITY),
        Value::from("héllo"),
        Value::Bytes(vec![0, 255, 128]),
    ];
    for value in values {
        assert_eq!(roundtrip(&value), value);
    }
}

#[test]
fn round_trip_preserves_nested_containers() {
    let mut entry = IndexMap::new();
    entry.insert("name".to_string(), Value::from("crate"));
    entry.insert(
        "versions".to_string(),
        Value::array(vec![
            Value::Integer(BigInt::from(1)),
            Value::Integer(BigInt::from(2)),
        ]),
    );
    let value = Value::object(entry);
    assert_eq!(roundtrip(&value), value);
}

#[test]
fn counted_and_delimited_forms_decode_to_the_same_value() {
    let mut entry = IndexMap::new();
    entry.insert("x".to_string(), Value::Integer(BigInt::from(1)));
    entry.insert("y".to_string(), Value::Integer(BigInt::from(2)));
    let value = Value::object(entry);

    let delimited = encode_to_vec(&value, &EncodeOptions::default()).unwrap();
    let counted = encode_to_vec(
        &value,
        &EncodeOptions {
            container_count: true,
            ..EncodeOptions::default()
        },
    )
    .unwrap();

    let from_delimited = decode_from_slice(&delimited, &DecodeOptions::default()).unwrap();
    let from_counted = decode_from_slice(&counted, &DecodeOptions::default()).unwrap();
    assert_eq!(from_delimited, from_counted);
}

#[test]
fn sort_keys_is_order_independent_on_input() {
    let mut a = IndexMap::new();
    a.insert("b".to_string(), Value::Integer(BigInt::from(2)));
    a.insert("a".to_string(), Value::Integer(BigInt::from(1)));
    let mut b = IndexMap::new();
    b.insert("a".to_string(), Value::Integer(BigInt::from(1)));
    b.insert("b".to_string(), Value::Integer(BigInt::from(2)));

    let options = EncodeOptions {
        sort_keys: true,
        ..EncodeOptions::default()
    };
    let encoded_a = encode_to_vec(&Value::object(a), &options).unwrap();
    let encoded_b = encode_to_vec(&Value::object(b), &options).unwrap();
    assert_eq!(encoded_a, encoded_b);
}

#[test]
fn trailing_bytes_are_ignored() {
    let bytes = [0x54u8; 10];
    let value = decode_from_slice(&bytes, &DecodeOptions::default()).unwrap();
    assert_eq!(value, Value::Bool(true));
}

#[test]
fn self_referential_array_is_rejected_by_the_encoder() {
    let arr = Value::array(vec![Value::Null]);
    if let Value::Array(rc) = &arr {
        rc.borrow_mut().push(arr.clone());
    }
    assert!(encode_to_vec(&arr, &EncodeOptions::default()).is_err());
}

#[test]
fn reading_from_an_io_reader_matches_reading_from_a_slice() {
    let value = Value::from("streamed");
    let bytes = encode_to_vec(&value, &EncodeOptions::default()).unwrap();

    let mut writer = Vec::new();
    ubjson::encode_to_writer(&value, &mut writer, &EncodeOptions::default()).unwrap();
    assert_eq!(writer, bytes);

    let mut cursor = std::io::Cursor::new(bytes);
    let decoded = ubjson::decode_from_reader(&mut cursor, &DecodeOptions::default()).unwrap();
    assert_eq!(decoded, value);
}
