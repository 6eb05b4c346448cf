use super::*;

#[test]
fn round_trip_string_key_string_value() {
    let encoded = encode_cell(TYPE_STRING, b"hello", TYPE_STRING, b"world");
    let decoded = decode_cell(&encoded).unwrap();
    assert_eq!(decoded.cell_len as usize, encoded.len());
    assert_eq!(decoded.key_type, "string");
    assert_eq!(decoded.key_bytes, b"hello");
    assert_eq!(decoded.value_type, "string");
    assert_eq!(decoded.value_bytes, b"world");
}

#[test]
fn round_trip_int_key_int_value() {
    let key_bytes = pack_i32(1);
    let value_bytes = pack_i32(2);
    let encoded = encode_cell(TYPE_INT, &key_bytes, TYPE_INT, &value_bytes);
    let decoded = decode_cell(&encoded).unwrap();
    assert_eq!(decoded.key_type, "int");
    assert_eq!(unpack_i32(&decoded.key_bytes).unwrap(), 1);
    assert_eq!(decoded.value_type, "int");
    assert_eq!(unpack_i32(&decoded.value_bytes).unwrap(), 2);
}

#[test]
fn round_trip_file_value() {
    let payload = vec![0xDEu8, 0xAD, 0xBE, 0xEF, 0x00, 0x01];
    let encoded = encode_cell(TYPE_STRING, b"blob", TYPE_FILE, &payload);
    let decoded = decode_cell(&encoded).unwrap();
    assert_eq!(decoded.value_type, "file");
    assert_eq!(decoded.value_bytes, payload);
}

#[test]
fn encode_decode_encode_is_byte_identical() {
    let encoded = encode_cell(TYPE_STRING, b"k", TYPE_STRING, b"v");
    let decoded = decode_cell(&encoded).unwrap();
    let re_encoded = encode_cell(&decoded.key_type, &decoded.key_bytes, &decoded.value_type, &decoded.value_bytes);
    assert_eq!(encoded, re_encoded);
}

#[test]
fn decode_ignores_trailing_bytes_past_cell_len() {
    let mut encoded = encode_cell(TYPE_STRING, b"k", TYPE_STRING, b"v");
    encoded.extend_from_slice(b"garbage-that-follows-in-the-data-region");
    let decoded = decode_cell(&encoded).unwrap();
    assert_eq!(decoded.key_bytes, b"k");
    assert_eq!(decoded.value_bytes, b"v");
}

#[test]
fn decode_rejects_invalid_utf8_string_value() {
    let invalid = vec![0xFFu8, 0xFE];
    let encoded = encode_cell(TYPE_STRING, b"k", TYPE_STRING, &invalid);
    // The codec itself only validates the type tags as UTF-8; the facade is
    // responsible for decoding a string *value*'s bytes and surfacing the
    // failure. Exercise that path directly here.
    let decoded = decode_cell(&encoded).unwrap();
    assert!(decode_utf8(&decoded.value_bytes).is_err());
}

#[test]
fn decode_rejects_truncated_cell() {
    let encoded = encode_cell(TYPE_STRING, b"hello", TYPE_STRING, b"world");
    let truncated = &encoded[..encoded.len() - 3];
    assert!(decode_cell(truncated).is_err());
}

#[test]
fn decode_rejects_int_key_with_wrong_length() {
    // Hand-build a malformed cell: key_type "int" but key_len 3.
    let mut buf = Vec::new();
    write_len_prefixed_for_test(&mut buf, b"int");
    write_u32_for_test(&mut buf, 3);
    buf.extend_from_slice(b"abc");
    write_len_prefixed_for_test(&mut buf, b"int");
    write_u32_for_test(&mut buf, 4);
    buf.extend_from_slice(&[0, 0, 0, 1]);
    let mut cell = Vec::new();
    write_u32_for_test(&mut cell, (4 + buf.len()) as u32);
    cell.extend_from_slice(&buf);
    assert!(decode_cell(&cell).is_err());
}

fn write_u32_for_test(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn write_len_prefixed_for_test(buf: &mut Vec<u8>, bytes: &[u8]) {
    write_u32_for_test(buf, bytes.len() as u32);
    buf.extend_from_slice(bytes);
}
