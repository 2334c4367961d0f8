//! Transcoder Tests
//!
//! These tests verify:
//! - Canonical decimal encoding for numeric values
//! - decode(encode(v)) == v for each transcoder
//! - Failures on payloads the transcoder cannot read
//! - Reply mapping through a transcoder, including nil

use bytes::Bytes;
use proptest::prelude::*;
use redline::transcoder::{
    DoubleTranscoder, IntegerTranscoder, LongTranscoder, RawTranscoder, SerializingTranscoder,
    StringTranscoder, Transcoder,
};
use redline::{RedlineError, Reply};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Profile {
    id: u64,
    name: String,
    tags: Vec<String>,
    score: Option<f32>,
}

fn sample_profile() -> Profile {
    Profile {
        id: 7,
        name: "thor".to_string(),
        tags: vec!["cache".to_string(), "redis".to_string()],
        score: Some(0.5),
    }
}

// =============================================================================
// Numeric Encoding
// =============================================================================

#[test]
fn test_integer_encodes_canonical_decimal() {
    assert_eq!(IntegerTranscoder.encode(&42).unwrap(), Bytes::from("42"));
    assert_eq!(IntegerTranscoder.encode(&0).unwrap(), Bytes::from("0"));
    assert_eq!(IntegerTranscoder.encode(&-17).unwrap(), Bytes::from("-17"));
    assert_eq!(IntegerTranscoder.encode(&i32::MIN).unwrap(), Bytes::from("-2147483648"));
}

#[test]
fn test_integer_round_trip_example() {
    let encoded = IntegerTranscoder.encode(&42).unwrap();
    assert_eq!(&encoded[..], b"42");
    assert_eq!(IntegerTranscoder.decode(encoded).unwrap(), 42);
}

#[test]
fn test_long_encodes_canonical_decimal() {
    assert_eq!(LongTranscoder.encode(&i64::MAX).unwrap(), Bytes::from("9223372036854775807"));
    assert_eq!(LongTranscoder.encode(&-1).unwrap(), Bytes::from("-1"));
}

#[test]
fn test_integer_decode_rejects_non_numeric() {
    for bad in ["", "abc", "4.2", "+4", " 4", "4 ", "--4"] {
        assert!(
            matches!(IntegerTranscoder.decode(Bytes::from(bad)), Err(RedlineError::Transcoder(_))),
            "{bad:?} should fail"
        );
    }
}

#[test]
fn test_integer_decode_rejects_overflow() {
    assert!(IntegerTranscoder.decode(Bytes::from("2147483648")).is_err());
    assert_eq!(LongTranscoder.decode(Bytes::from("2147483648")).unwrap(), 2147483648);
}

#[test]
fn test_double_encoding() {
    assert_eq!(DoubleTranscoder.encode(&3.5).unwrap(), Bytes::from("3.5"));
    assert_eq!(DoubleTranscoder.encode(&-0.25).unwrap(), Bytes::from("-0.25"));
    assert_eq!(DoubleTranscoder.encode(&10.0).unwrap(), Bytes::from("10"));
    assert_eq!(DoubleTranscoder.encode(&f64::INFINITY).unwrap(), Bytes::from("inf"));
    assert_eq!(DoubleTranscoder.encode(&f64::NEG_INFINITY).unwrap(), Bytes::from("-inf"));
}

#[test]
fn test_double_rejects_nan() {
    assert!(matches!(DoubleTranscoder.encode(&f64::NAN), Err(RedlineError::Transcoder(_))));
    assert!(DoubleTranscoder.decode(Bytes::from("nan")).is_err());
}

#[test]
fn test_double_decodes_integers_and_fractions() {
    assert_eq!(DoubleTranscoder.decode(Bytes::from("10")).unwrap(), 10.0);
    assert_eq!(DoubleTranscoder.decode(Bytes::from("10.5")).unwrap(), 10.5);
    assert_eq!(DoubleTranscoder.decode(Bytes::from("-0.125")).unwrap(), -0.125);
    assert_eq!(DoubleTranscoder.decode(Bytes::from("1.5e3")).unwrap(), 1500.0);
    assert_eq!(DoubleTranscoder.decode(Bytes::from("inf")).unwrap(), f64::INFINITY);
}

#[test]
fn test_double_decode_rejects_non_numeric() {
    for bad in ["", "ten", "1.2.3", "1,5", "0x1p3"] {
        assert!(DoubleTranscoder.decode(Bytes::from(bad)).is_err(), "{bad:?} should fail");
    }
}

// =============================================================================
// Raw / String / Object
// =============================================================================

#[test]
fn test_raw_is_identity() {
    let data = Bytes::from_static(&[0, 1, 2, 0xFF]);
    assert_eq!(RawTranscoder.encode(&data).unwrap(), data);
    assert_eq!(RawTranscoder.decode(data.clone()).unwrap(), data);
}

#[test]
fn test_string_rejects_invalid_utf8() {
    let bad = Bytes::from_static(&[0xC3, 0x28]);
    assert!(matches!(StringTranscoder.decode(bad), Err(RedlineError::Transcoder(_))));
}

#[test]
fn test_object_round_trip() {
    let transcoder = SerializingTranscoder::<Profile>::new();
    let encoded = transcoder.encode(&sample_profile()).unwrap();
    assert_eq!(transcoder.decode(encoded).unwrap(), sample_profile());
}

#[test]
fn test_object_decode_rejects_garbage() {
    let transcoder = SerializingTranscoder::<Profile>::new();
    assert!(matches!(
        transcoder.decode(Bytes::from_static(b"\x01")),
        Err(RedlineError::Transcoder(_))
    ));
}

// =============================================================================
// Reply Mapping
// =============================================================================

#[test]
fn test_nil_bulk_is_none_for_every_transcoder() {
    assert_eq!(Reply::Bulk(None).decode_with(&IntegerTranscoder).unwrap(), None);
    assert_eq!(Reply::Bulk(None).decode_with(&LongTranscoder).unwrap(), None);
    assert_eq!(Reply::Bulk(None).decode_with(&DoubleTranscoder).unwrap(), None);
    assert_eq!(Reply::Bulk(None).decode_with(&RawTranscoder).unwrap(), None);
    assert_eq!(Reply::Bulk(None).decode_with(&StringTranscoder).unwrap(), None);
    assert_eq!(
        Reply::Bulk(None)
            .decode_with(&SerializingTranscoder::<Profile>::new())
            .unwrap(),
        None
    );
}

#[test]
fn test_nil_multi_bulk_is_empty_sequence() {
    assert!(Reply::MultiBulk(None).decode_all_with(&LongTranscoder).unwrap().is_empty());
}

#[test]
fn test_multi_bulk_maps_each_element() {
    let reply = Reply::MultiBulk(Some(vec![Reply::bulk("1"), Reply::Bulk(None), Reply::bulk("3")]));
    assert_eq!(
        reply.decode_all_with(&IntegerTranscoder).unwrap(),
        vec![Some(1), None, Some(3)]
    );
}

#[test]
fn test_integer_reply_feeds_numeric_transcoder() {
    assert_eq!(Reply::Integer(12).decode_with(&LongTranscoder).unwrap(), Some(12));
}

#[test]
fn test_error_reply_maps_to_server_error() {
    let reply = Reply::Error("WRONGTYPE Operation against a key".into());
    assert!(matches!(reply.decode_with(&RawTranscoder), Err(RedlineError::Server(_))));
}

#[test]
fn test_unexpected_shape_is_transcoder_error() {
    assert!(matches!(Reply::Status("OK".into()).into_integer(), Err(RedlineError::Transcoder(_))));
    assert!(matches!(Reply::Integer(1).decode_all_with(&RawTranscoder), Err(RedlineError::Transcoder(_))));
}

#[test]
fn test_status_and_flag_mapping() {
    assert_eq!(Reply::Status("OK".into()).into_status().unwrap(), "OK");
    assert_eq!(Reply::bulk("hi").into_status().unwrap(), "hi");
    assert!(Reply::Integer(1).into_bool().unwrap());
    assert!(!Reply::Integer(0).into_bool().unwrap());
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_integer_round_trip(v in any::<i32>()) {
        prop_assert_eq!(IntegerTranscoder.decode(IntegerTranscoder.encode(&v).unwrap()).unwrap(), v);
    }

    #[test]
    fn prop_long_round_trip(v in any::<i64>()) {
        let encoded = LongTranscoder.encode(&v).unwrap();
        // Canonical: no leading zeros, no '+'
        prop_assert!(!encoded.starts_with(b"+"));
        prop_assert!(encoded.len() == 1 || !encoded.starts_with(b"0"));
        prop_assert!(!encoded.starts_with(b"-0"));
        prop_assert_eq!(LongTranscoder.decode(encoded).unwrap(), v);
    }

    #[test]
    fn prop_double_round_trip(v in prop::num::f64::NORMAL | prop::num::f64::ZERO | prop::num::f64::SUBNORMAL) {
        let decoded = DoubleTranscoder.decode(DoubleTranscoder.encode(&v).unwrap()).unwrap();
        prop_assert_eq!(decoded, v);
    }

    #[test]
    fn prop_raw_round_trip(v in prop::collection::vec(any::<u8>(), 0..256)) {
        let data = Bytes::from(v);
        prop_assert_eq!(RawTranscoder.decode(RawTranscoder.encode(&data).unwrap()).unwrap(), data);
    }

    #[test]
    fn prop_string_round_trip(v in ".*") {
        prop_assert_eq!(StringTranscoder.decode(StringTranscoder.encode(&v).unwrap()).unwrap(), v);
    }

    #[test]
    fn prop_object_round_trip(
        id in any::<u64>(),
        name in ".{0,32}",
        tags in prop::collection::vec("[a-z]{1,8}", 0..4),
        score in prop::option::of(-1000.0f32..1000.0),
    ) {
        let transcoder = SerializingTranscoder::<Profile>::new();
        let profile = Profile { id, name, tags, score };
        let decoded = transcoder.decode(transcoder.encode(&profile).unwrap()).unwrap();
        prop_assert_eq!(decoded, profile);
    }
}
