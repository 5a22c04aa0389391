//! Request Parser Tests
//!
//! Tests for splitting `OP:key[:value]` messages into requests.

use mtkv::protocol::{parse_request, FieldLimits, Operation, Request};
use mtkv::ParseError;

fn parse(raw: &[u8]) -> Result<Request, ParseError> {
    parse_request(raw, FieldLimits::default())
}

// =============================================================================
// Well-formed Requests
// =============================================================================

#[test]
fn test_parse_get() {
    let request = parse(b"GET:station.5").unwrap();
    assert_eq!(
        request,
        Request::Get {
            key: b"station.5".to_vec()
        }
    );
    assert_eq!(request.operation(), Operation::Get);
}

#[test]
fn test_parse_put() {
    let request = parse(b"PUT:station.5:42").unwrap();
    assert_eq!(
        request,
        Request::Put {
            key: b"station.5".to_vec(),
            value: b"42".to_vec()
        }
    );
    assert_eq!(request.operation(), Operation::Put);
}

#[test]
fn test_parse_negative_value() {
    let request = parse(b"PUT:station.0:-20").unwrap();
    match request {
        Request::Put { value, .. } => assert_eq!(value, b"-20"),
        _ => panic!("Expected PUT request"),
    }
}

#[test]
fn test_extra_fields_are_ignored() {
    let request = parse(b"PUT:k:v:extra:more").unwrap();
    assert_eq!(
        request,
        Request::Put {
            key: b"k".to_vec(),
            value: b"v".to_vec()
        }
    );

    let request = parse(b"GET:k:ignored").unwrap();
    assert_eq!(request, Request::Get { key: b"k".to_vec() });
}

#[test]
fn test_empty_fields_are_skipped() {
    assert_eq!(
        parse(b"PUT::k::v").unwrap(),
        Request::Put {
            key: b"k".to_vec(),
            value: b"v".to_vec()
        }
    );
    assert_eq!(parse(b":GET:k").unwrap(), Request::Get { key: b"k".to_vec() });
}

// =============================================================================
// Malformed Requests
// =============================================================================

#[test]
fn test_unknown_operation() {
    assert_eq!(
        parse(b"DELETE:k"),
        Err(ParseError::UnknownOperation("DELETE".to_string()))
    );
}

#[test]
fn test_operation_is_case_sensitive() {
    assert!(matches!(
        parse(b"get:k"),
        Err(ParseError::UnknownOperation(_))
    ));
}

#[test]
fn test_operation_needs_exact_match() {
    assert!(matches!(
        parse(b"GETX:k"),
        Err(ParseError::UnknownOperation(_))
    ));
    assert!(matches!(
        parse(b"PU:k:v"),
        Err(ParseError::UnknownOperation(_))
    ));
}

#[test]
fn test_get_without_key() {
    assert_eq!(parse(b"GET"), Err(ParseError::MissingKey));
    assert_eq!(parse(b"GET:"), Err(ParseError::MissingKey));
}

#[test]
fn test_put_without_value() {
    assert_eq!(parse(b"PUT:k"), Err(ParseError::MissingValue));
    assert_eq!(parse(b"PUT:k:"), Err(ParseError::MissingValue));
}

#[test]
fn test_only_delimiters() {
    assert!(matches!(
        parse(b":::"),
        Err(ParseError::UnknownOperation(_))
    ));
}

// =============================================================================
// Truncation
// =============================================================================

#[test]
fn test_key_and_value_truncated() {
    let limits = FieldLimits {
        max_key_size: 4,
        max_value_size: 2,
    };

    let request = parse_request(b"PUT:station.5:4242", limits).unwrap();
    assert_eq!(
        request,
        Request::Put {
            key: b"stat".to_vec(),
            value: b"42".to_vec()
        }
    );
}

#[test]
fn test_default_limits_truncate_long_key() {
    let mut raw = b"GET:".to_vec();
    raw.extend(std::iter::repeat(b'k').take(300));

    let request = parse(&raw).unwrap();
    assert_eq!(request.key().len(), 128);
}
