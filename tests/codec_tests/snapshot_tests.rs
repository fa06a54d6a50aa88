//! Snapshot Codec Tests
//!
//! Tests for snapshot encoding/decoding and the on-disk byte layout.

use std::collections::{BTreeSet, HashMap};
use std::io::Cursor;

use prefstore::codec::{
    decode_snapshot, encode_snapshot, read_snapshot, write_snapshot, TypeTag, MAX_UTF_LEN,
};
use prefstore::{PrefError, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn set_of(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn all_kinds() -> Vec<(String, Value)> {
    let large: BTreeSet<String> = (0..5000).map(|i| format!("member-{:05}", i)).collect();
    vec![
        ("bool_false".to_string(), Value::Bool(false)),
        ("bool_true".to_string(), Value::Bool(true)),
        ("string".to_string(), Value::String("hello world".to_string())),
        ("empty_string".to_string(), Value::String(String::new())),
        ("unicode".to_string(), Value::String("héllo ✓ 日本".to_string())),
        ("int_min".to_string(), Value::Int(i32::MIN)),
        ("int_max".to_string(), Value::Int(i32::MAX)),
        ("long".to_string(), Value::Long(-9_876_543_210)),
        ("float".to_string(), Value::Float(3.25)),
        ("float_neg_zero".to_string(), Value::Float(-0.0)),
        ("set_empty".to_string(), Value::StringSet(BTreeSet::new())),
        ("set_small".to_string(), Value::StringSet(set_of(&["a", "b", "c"]))),
        ("set_large".to_string(), Value::StringSet(large)),
    ]
}

// =============================================================================
// Round-trip Tests
// =============================================================================

#[test]
fn test_round_trip_all_value_kinds() {
    let entries = all_kinds();
    let bytes = encode_snapshot(&entries).unwrap();
    let decoded = decode_snapshot(&bytes).unwrap();

    let expected: HashMap<_, _> = entries.into_iter().collect();
    let actual: HashMap<_, _> = decoded.into_iter().collect();
    assert_eq!(actual, expected);
}

#[test]
fn test_round_trip_through_stream() {
    let entries = all_kinds();
    let mut buffer = Vec::new();
    write_snapshot(&mut buffer, &entries).unwrap();

    let decoded = read_snapshot(&mut Cursor::new(buffer)).unwrap();
    assert_eq!(decoded.len(), entries.len());
}

#[test]
fn test_max_length_string_round_trips() {
    let longest = "z".repeat(MAX_UTF_LEN);
    let entries = vec![("k".to_string(), Value::String(longest.clone()))];

    let decoded = decode_snapshot(&encode_snapshot(&entries).unwrap()).unwrap();
    assert_eq!(decoded[0].1, Value::String(longest));
}

// =============================================================================
// Byte Layout Tests
// =============================================================================

#[test]
fn test_layout_is_big_endian() {
    let entries = vec![
        ("i".to_string(), Value::Int(0x01020304)),
        ("l".to_string(), Value::Long(0x0102030405060708)),
        ("f".to_string(), Value::Float(1.0)),
    ];
    let bytes = encode_snapshot(&entries).unwrap();

    let expected: Vec<u8> = [
        &[0, 0, 0, 3][..],
        &[0, 1, b'i', TypeTag::Int as u8, 1, 2, 3, 4],
        &[0, 1, b'l', TypeTag::Long as u8, 1, 2, 3, 4, 5, 6, 7, 8],
        &[0, 1, b'f', TypeTag::Float as u8, 0x3f, 0x80, 0, 0],
    ]
    .concat();
    assert_eq!(&bytes[..], &expected[..]);
}

#[test]
fn test_layout_of_string_and_set() {
    let entries = vec![
        ("s".to_string(), Value::String("ab".to_string())),
        ("t".to_string(), Value::StringSet(set_of(&["x"]))),
    ];
    let bytes = encode_snapshot(&entries).unwrap();

    let expected: Vec<u8> = [
        &[0, 0, 0, 2][..],
        &[0, 1, b's', 0x02, 0, 2, b'a', b'b'],
        &[0, 1, b't', 0x06, 0, 0, 0, 1, 0, 1, b'x'],
    ]
    .concat();
    assert_eq!(&bytes[..], &expected[..]);
}

#[test]
fn test_type_tag_values() {
    assert_eq!(TypeTag::of(&Value::Bool(false)) as u8, 0);
    assert_eq!(TypeTag::of(&Value::Bool(true)) as u8, 1);
    assert_eq!(TypeTag::of(&Value::String(String::new())) as u8, 2);
    assert_eq!(TypeTag::of(&Value::Int(0)) as u8, 3);
    assert_eq!(TypeTag::of(&Value::Long(0)) as u8, 4);
    assert_eq!(TypeTag::of(&Value::Float(0.0)) as u8, 5);
    assert_eq!(TypeTag::of(&Value::StringSet(BTreeSet::new())) as u8, 6);
}

// =============================================================================
// Decode Failure Tests
// =============================================================================

#[test]
fn test_unknown_tag_fails_whole_file() {
    // One valid entry followed by one with tag 7
    let bytes = [0, 0, 0, 2, 0, 1, b'a', 0x01, 0, 1, b'b', 0x07];
    let err = decode_snapshot(&bytes).unwrap_err();
    assert!(matches!(err, PrefError::Decode(_)));
}

#[test]
fn test_truncated_input_fails() {
    let bytes = encode_snapshot(&all_kinds()).unwrap();
    for cut in [0, 3, 5, bytes.len() / 2, bytes.len() - 1] {
        assert!(
            decode_snapshot(&bytes[..cut]).is_err(),
            "decode of {} / {} bytes should fail",
            cut,
            bytes.len()
        );
    }
}

#[test]
fn test_invalid_utf8_fails() {
    let bytes = [0, 0, 0, 1, 0, 2, 0xff, 0xfe, 0x01];
    assert!(matches!(decode_snapshot(&bytes), Err(PrefError::Decode(_))));
}

#[test]
fn test_trailing_bytes_ignored() {
    let entries = vec![("k".to_string(), Value::Int(1))];
    let mut bytes = encode_snapshot(&entries).unwrap().to_vec();
    bytes.extend_from_slice(&[0, 0xff, 0x13]);

    assert_eq!(decode_snapshot(&bytes).unwrap(), entries);
}

#[test]
fn test_negative_set_size_fails() {
    let bytes = [0, 0, 0, 1, 0, 1, b's', 0x06, 0x80, 0, 0, 0];
    assert!(decode_snapshot(&bytes).is_err());
}

#[test]
fn test_huge_count_does_not_preallocate() {
    // Claims i32::MAX entries but carries none
    let bytes = [0x7f, 0xff, 0xff, 0xff];
    assert!(decode_snapshot(&bytes).is_err());
}

#[test]
fn test_empty_input_fails() {
    assert!(decode_snapshot(&[]).is_err());
}
