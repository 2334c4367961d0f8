//! Decoder Tests
//!
//! These tests verify:
//! - Each reply shape and its nil form
//! - Nested multi-bulk replies
//! - Reassembly of frames split across reads
//! - Protocol errors on malformed input

use bytes::Bytes;
use proptest::prelude::*;
use redline::protocol::ReplyDecoder;
use redline::{RedlineError, Reply};

// =============================================================================
// Helper Functions
// =============================================================================

fn decode_one(input: &[u8]) -> Reply {
    let mut decoder = ReplyDecoder::new();
    decoder.extend(input);
    let reply = decoder.decode().unwrap().expect("complete reply");
    assert_eq!(decoder.buffered(), 0, "frame fully consumed");
    reply
}

fn decode_err(input: &[u8]) -> RedlineError {
    let mut decoder = ReplyDecoder::new();
    decoder.extend(input);
    decoder.decode().unwrap_err()
}

// =============================================================================
// Reply Shapes
// =============================================================================

#[test]
fn test_decode_status() {
    assert_eq!(decode_one(b"+OK\r\n"), Reply::Status("OK".into()));
}

#[test]
fn test_decode_error() {
    assert_eq!(
        decode_one(b"-WRONGTYPE Operation against a key\r\n"),
        Reply::Error("WRONGTYPE Operation against a key".into())
    );
}

#[test]
fn test_decode_integer() {
    assert_eq!(decode_one(b":1000\r\n"), Reply::Integer(1000));
    assert_eq!(decode_one(b":-42\r\n"), Reply::Integer(-42));
    assert_eq!(decode_one(b":9223372036854775807\r\n"), Reply::Integer(i64::MAX));
}

#[test]
fn test_decode_bulk() {
    assert_eq!(decode_one(b"$5\r\nhello\r\n"), Reply::bulk("hello"));
}

#[test]
fn test_decode_bulk_with_crlf_in_payload() {
    assert_eq!(decode_one(b"$4\r\na\r\nb\r\n"), Reply::bulk("a\r\nb"));
}

#[test]
fn test_decode_empty_bulk_is_not_nil() {
    assert_eq!(decode_one(b"$0\r\n\r\n"), Reply::Bulk(Some(Bytes::new())));
}

#[test]
fn test_decode_nil_bulk() {
    let reply = decode_one(b"$-1\r\n");
    assert_eq!(reply, Reply::Bulk(None));
    assert!(reply.is_nil());
}

#[test]
fn test_decode_multi_bulk() {
    assert_eq!(
        decode_one(b"*3\r\n$3\r\nfoo\r\n$-1\r\n:7\r\n"),
        Reply::MultiBulk(Some(vec![
            Reply::bulk("foo"),
            Reply::Bulk(None),
            Reply::Integer(7),
        ]))
    );
}

#[test]
fn test_decode_empty_multi_bulk() {
    assert_eq!(decode_one(b"*0\r\n"), Reply::MultiBulk(Some(vec![])));
}

#[test]
fn test_decode_nil_multi_bulk() {
    let reply = decode_one(b"*-1\r\n");
    assert_eq!(reply, Reply::MultiBulk(None));
    assert!(reply.is_nil());
}

#[test]
fn test_decode_nested_multi_bulk() {
    let input = b"*2\r\n*2\r\n:1\r\n+two\r\n*1\r\n*-1\r\n";
    assert_eq!(
        decode_one(input),
        Reply::MultiBulk(Some(vec![
            Reply::MultiBulk(Some(vec![Reply::Integer(1), Reply::Status("two".into())])),
            Reply::MultiBulk(Some(vec![Reply::MultiBulk(None)])),
        ]))
    );
}

#[test]
fn test_decode_error_inside_multi_bulk() {
    assert_eq!(
        decode_one(b"*2\r\n+OK\r\n-ERR nope\r\n"),
        Reply::MultiBulk(Some(vec![
            Reply::Status("OK".into()),
            Reply::Error("ERR nope".into()),
        ]))
    );
}

// =============================================================================
// Streaming / Reassembly
// =============================================================================

#[test]
fn test_decode_empty_buffer_is_none() {
    let mut decoder = ReplyDecoder::new();
    assert!(decoder.decode().unwrap().is_none());
}

#[test]
fn test_partial_frame_is_not_emitted() {
    let mut decoder = ReplyDecoder::new();
    decoder.extend(b"$5\r\nhel");
    assert!(decoder.decode().unwrap().is_none());
    assert_eq!(decoder.buffered(), 7, "nothing consumed");

    decoder.extend(b"lo\r");
    assert!(decoder.decode().unwrap().is_none());

    decoder.extend(b"\n");
    assert_eq!(decoder.decode().unwrap(), Some(Reply::bulk("hello")));
}

#[test]
fn test_partial_multi_bulk_waits_for_last_element() {
    let mut decoder = ReplyDecoder::new();
    decoder.extend(b"*2\r\n:1\r\n");
    assert!(decoder.decode().unwrap().is_none());

    decoder.extend(b":2\r\n");
    assert_eq!(
        decoder.decode().unwrap(),
        Some(Reply::MultiBulk(Some(vec![Reply::Integer(1), Reply::Integer(2)])))
    );
}

#[test]
fn test_several_frames_in_one_read_decode_in_order() {
    let mut decoder = ReplyDecoder::new();
    decoder.extend(b"+OK\r\n:1\r\n$1\r\nx\r\n-ERR bad\r\n");

    assert_eq!(decoder.decode().unwrap(), Some(Reply::Status("OK".into())));
    assert_eq!(decoder.decode().unwrap(), Some(Reply::Integer(1)));
    assert_eq!(decoder.decode().unwrap(), Some(Reply::bulk("x")));
    assert_eq!(decoder.decode().unwrap(), Some(Reply::Error("ERR bad".into())));
    assert_eq!(decoder.decode().unwrap(), None);
}

#[test]
fn test_byte_at_a_time() {
    let input = b"*3\r\n$3\r\nfoo\r\n*1\r\n:5\r\n$-1\r\n+PONG\r\n";
    let mut decoder = ReplyDecoder::new();
    let mut replies = Vec::new();

    for byte in input.iter() {
        decoder.extend(std::slice::from_ref(byte));
        while let Some(reply) = decoder.decode().unwrap() {
            replies.push(reply);
        }
    }

    assert_eq!(
        replies,
        vec![
            Reply::MultiBulk(Some(vec![
                Reply::bulk("foo"),
                Reply::MultiBulk(Some(vec![Reply::Integer(5)])),
                Reply::Bulk(None),
            ])),
            Reply::Status("PONG".into()),
        ]
    );
}

#[test]
fn test_large_multi_bulk_in_small_chunks() {
    let count = 2000;
    let mut input = format!("*{}\r\n", count).into_bytes();
    for i in 0..count {
        let item = format!("value-{}", i);
        input.extend(format!("${}\r\n{}\r\n", item.len(), item).into_bytes());
    }
    input.extend_from_slice(b":42\r\n");

    let mut decoder = ReplyDecoder::new();
    let mut replies = Vec::new();
    for chunk in input.chunks(7) {
        decoder.extend(chunk);
        while let Some(reply) = decoder.decode().unwrap() {
            replies.push(reply);
        }
    }

    assert_eq!(replies.len(), 2);
    match &replies[0] {
        Reply::MultiBulk(Some(items)) => {
            assert_eq!(items.len(), count);
            assert_eq!(items[count - 1], Reply::bulk(format!("value-{}", count - 1)));
        }
        other => panic!("expected multi-bulk, got {:?}", other),
    }
    assert_eq!(replies[1], Reply::Integer(42));
    assert_eq!(decoder.buffered(), 0);
}

proptest! {
    /// Any split of a valid stream yields the same replies as one read
    #[test]
    fn prop_chunking_does_not_change_replies(
        values in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 1..8),
        cuts in prop::collection::vec(1usize..16, 0..32),
    ) {
        let mut stream = Vec::new();
        let mut expected = Vec::new();
        for value in &values {
            stream.extend(format!("${}\r\n", value.len()).into_bytes());
            stream.extend(value);
            stream.extend(b"\r\n");
            expected.push(Reply::bulk(value.clone()));
        }

        let mut decoder = ReplyDecoder::new();
        let mut replies = Vec::new();
        let mut rest = stream.as_slice();
        for cut in cuts {
            if rest.is_empty() {
                break;
            }
            let (head, tail) = rest.split_at(cut.min(rest.len()));
            decoder.extend(head);
            rest = tail;
            while let Some(reply) = decoder.decode().unwrap() {
                replies.push(reply);
            }
        }
        decoder.extend(rest);
        while let Some(reply) = decoder.decode().unwrap() {
            replies.push(reply);
        }

        prop_assert_eq!(replies, expected);
    }
}

// =============================================================================
// Malformed Input
// =============================================================================

#[test]
fn test_unknown_sigil_is_protocol_error() {
    assert!(matches!(decode_err(b"?what\r\n"), RedlineError::Protocol(_)));
}

#[test]
fn test_unknown_sigil_fails_before_line_is_complete() {
    assert!(matches!(decode_err(b"!"), RedlineError::Protocol(_)));
}

#[test]
fn test_bad_length_prefix_is_protocol_error() {
    assert!(matches!(decode_err(b"$abc\r\n"), RedlineError::Protocol(_)));
    assert!(matches!(decode_err(b"*x\r\n"), RedlineError::Protocol(_)));
    assert!(matches!(decode_err(b"$\r\n"), RedlineError::Protocol(_)));
}

#[test]
fn test_negative_length_other_than_nil_is_protocol_error() {
    assert!(matches!(decode_err(b"$-2\r\n"), RedlineError::Protocol(_)));
    assert!(matches!(decode_err(b"*-5\r\n"), RedlineError::Protocol(_)));
}

#[test]
fn test_bad_integer_is_protocol_error() {
    assert!(matches!(decode_err(b":12z\r\n"), RedlineError::Protocol(_)));
}

#[test]
fn test_bulk_without_trailing_crlf_is_protocol_error() {
    assert!(matches!(decode_err(b"$3\r\nfooXY"), RedlineError::Protocol(_)));
}

#[test]
fn test_bad_element_inside_multi_bulk_is_protocol_error() {
    assert!(matches!(decode_err(b"*2\r\n:1\r\n~nope\r\n"), RedlineError::Protocol(_)));
}

#[test]
fn test_bulk_over_limit_is_protocol_error() {
    let mut decoder = ReplyDecoder::with_limits(4, 8);
    decoder.extend(b"$5\r\n");
    assert!(matches!(decoder.decode(), Err(RedlineError::Protocol(_))));
}

#[test]
fn test_nesting_over_limit_is_protocol_error() {
    let mut decoder = ReplyDecoder::with_limits(1024, 2);
    decoder.extend(b"*1\r\n*1\r\n*1\r\n:1\r\n");
    assert!(matches!(decoder.decode(), Err(RedlineError::Protocol(_))));

    let mut decoder = ReplyDecoder::with_limits(1024, 2);
    decoder.extend(b"*1\r\n*1\r\n:1\r\n");
    assert!(decoder.decode().unwrap().is_some());
}

#[test]
fn test_nesting_limit_holds_across_reads() {
    let mut decoder = ReplyDecoder::with_limits(1024, 2);
    decoder.extend(b"*1\r\n*1\r\n");
    assert_eq!(decoder.decode().unwrap(), None);

    decoder.extend(b"*1\r\n:1\r\n");
    assert!(matches!(decoder.decode(), Err(RedlineError::Protocol(_))));
}
