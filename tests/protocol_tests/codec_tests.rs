//! Codec Tests
//!
//! Tests for length-prefixed framing and response text.

use std::io::Cursor;

use mtkv::protocol::{encode_frame, read_frame, write_frame, Response, LENGTH_PREFIX_SIZE};
use mtkv::KvError;

// =============================================================================
// Helper Functions
// =============================================================================

fn frame_with_len(len: i32, payload: &[u8]) -> Vec<u8> {
    let mut bytes = len.to_ne_bytes().to_vec();
    bytes.extend_from_slice(payload);
    bytes
}

// =============================================================================
// Framing Tests
// =============================================================================

#[test]
fn test_encode_frame_layout() {
    let frame = encode_frame(b"PUT:station.5:42").unwrap();

    assert_eq!(frame.len(), LENGTH_PREFIX_SIZE + 16);
    assert_eq!(&frame[..LENGTH_PREFIX_SIZE], &16i32.to_ne_bytes());
    assert_eq!(&frame[LENGTH_PREFIX_SIZE..], b"PUT:station.5:42");
}

#[test]
fn test_write_then_read_frame() {
    let mut buf = Vec::<u8>::new();
    write_frame(&mut buf, b"GET:station.5").unwrap();

    let mut cursor = Cursor::new(buf);
    let payload = read_frame(&mut cursor, 1024).unwrap().unwrap();
    assert_eq!(payload, b"GET:station.5");
}

#[test]
fn test_read_empty_payload() {
    let mut cursor = Cursor::new(frame_with_len(0, b""));
    let payload = read_frame(&mut cursor, 1024).unwrap().unwrap();
    assert!(payload.is_empty());
}

#[test]
fn test_read_consecutive_frames() {
    let mut buf = Vec::<u8>::new();
    write_frame(&mut buf, b"first").unwrap();
    write_frame(&mut buf, b"second").unwrap();

    let mut cursor = Cursor::new(buf);
    assert_eq!(read_frame(&mut cursor, 1024).unwrap().unwrap(), b"first");
    assert_eq!(read_frame(&mut cursor, 1024).unwrap().unwrap(), b"second");
    assert!(read_frame(&mut cursor, 1024).unwrap().is_none());
}

#[test]
fn test_clean_eof_is_none() {
    let mut cursor = Cursor::new(Vec::<u8>::new());
    assert!(read_frame(&mut cursor, 1024).unwrap().is_none());
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[test]
fn test_truncated_prefix() {
    let mut cursor = Cursor::new(vec![5u8, 0]);
    let result = read_frame(&mut cursor, 1024);
    assert!(matches!(result, Err(KvError::Protocol(_))));
}

#[test]
fn test_truncated_payload() {
    let mut cursor = Cursor::new(frame_with_len(10, b"short"));
    let result = read_frame(&mut cursor, 1024);
    assert!(matches!(result, Err(KvError::Protocol(_))));
}

#[test]
fn test_negative_length() {
    let mut cursor = Cursor::new(frame_with_len(-1, b"whatever"));
    let result = read_frame(&mut cursor, 1024);
    assert!(matches!(result, Err(KvError::Protocol(_))));
}

#[test]
fn test_frame_too_large() {
    let mut cursor = Cursor::new(frame_with_len(2048, &[b'x'; 2048]));
    let result = read_frame(&mut cursor, 1024);
    assert!(matches!(result, Err(KvError::Protocol(_))));
}

#[test]
fn test_frame_at_max_size() {
    let mut cursor = Cursor::new(frame_with_len(1024, &[b'x'; 1024]));
    let payload = read_frame(&mut cursor, 1024).unwrap().unwrap();
    assert_eq!(payload.len(), 1024);
}

// =============================================================================
// Response Text Tests
// =============================================================================

#[test]
fn test_response_wire_text() {
    assert_eq!(Response::GetOk(b"42".to_vec()).to_bytes(), b"GET OK: 42\n");
    assert_eq!(Response::GetError.to_bytes(), b"GET ERROR\n");
    assert_eq!(Response::PutOk.to_bytes(), b"PUT OK\n");
    assert_eq!(Response::PutError.to_bytes(), b"PUT ERROR\n");
    assert_eq!(Response::FormatError.to_bytes(), b"FORMAT ERROR\n");
    assert_eq!(Response::UnknownOperation.to_bytes(), b"UNKNOWN OPERATION\n");
}

#[test]
fn test_response_parse() {
    assert_eq!(
        Response::parse(b"GET OK: -7\n").unwrap(),
        Response::GetOk(b"-7".to_vec())
    );
    assert_eq!(Response::parse(b"PUT OK\n").unwrap(), Response::PutOk);
    assert_eq!(Response::parse(b"FORMAT ERROR").unwrap(), Response::FormatError);
}

#[test]
fn test_response_parse_empty_value() {
    assert_eq!(
        Response::parse(b"GET OK: \n").unwrap(),
        Response::GetOk(Vec::new())
    );
}

#[test]
fn test_response_parse_garbage() {
    assert!(matches!(
        Response::parse(b"HELLO\n"),
        Err(KvError::Protocol(_))
    ));
}

#[test]
fn test_response_display_drops_newline() {
    assert_eq!(Response::GetOk(b"21".to_vec()).to_string(), "GET OK: 21");
    assert_eq!(Response::GetError.to_string(), "GET ERROR");
}

#[test]
fn test_response_is_ok() {
    assert!(Response::PutOk.is_ok());
    assert!(Response::GetOk(Vec::new()).is_ok());
    assert!(!Response::GetError.is_ok());
    assert!(!Response::FormatError.is_ok());
}
