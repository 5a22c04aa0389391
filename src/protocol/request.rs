//! Request definitions
//!
//! Turns a raw `OP:key[:value]` message into a typed request.

use std::borrow::Cow;
use std::fmt;

use crate::error::ParseError;

/// Field separator of request messages
pub const DELIMITER: u8 = b':';

/// Operation types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Get,
    Put,
}

impl Operation {
    /// The tag used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Get => "GET",
            Operation::Put => "PUT",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maximum key and value sizes applied while parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLimits {
    pub max_key_size: usize,
    pub max_value_size: usize,
}

impl Default for FieldLimits {
    fn default() -> Self {
        Self {
            max_key_size: 128,
            max_value_size: 1024,
        }
    }
}

/// A parsed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Get a value by key
    Get { key: Vec<u8> },

    /// Put a key-value pair
    Put { key: Vec<u8>, value: Vec<u8> },
}

impl Request {
    /// Parse a raw message, see [`parse_request`]
    pub fn parse(raw: &[u8], limits: FieldLimits) -> Result<Self, ParseError> {
        parse_request(raw, limits)
    }

    /// Get the operation type
    pub fn operation(&self) -> Operation {
        match self {
            Request::Get { .. } => Operation::Get,
            Request::Put { .. } => Operation::Put,
        }
    }

    /// The request key
    pub fn key(&self) -> &[u8] {
        match self {
            Request::Get { key } | Request::Put { key, .. } => key,
        }
    }

    /// Render the request in wire form
    pub fn to_message(&self) -> Vec<u8> {
        let mut message = self.operation().as_str().as_bytes().to_vec();
        message.push(DELIMITER);
        message.extend_from_slice(self.key());
        if let Request::Put { value, .. } = self {
            message.push(DELIMITER);
            message.extend_from_slice(value);
        }
        message
    }

    /// Key as text, for logging
    pub fn key_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.key())
    }
}

/// Parse a raw request message
///
/// The message is split on `:`. Empty fields are skipped, so `GET::k` reads
/// key `k`, and anything after the third field is ignored. There is no
/// escaping: a key containing `:` is split like any other message.
///
/// Key and value are truncated to the configured maxima.
///
/// # Errors
/// - `ParseError::UnknownOperation` unless the tag is exactly `PUT` or `GET`
/// - `ParseError::MissingKey` if no key follows the tag
/// - `ParseError::MissingValue` for a `PUT` without a value
pub fn parse_request(raw: &[u8], limits: FieldLimits) -> Result<Request, ParseError> {
    let mut fields = raw
        .split(|b| *b == DELIMITER)
        .filter(|field| !field.is_empty());

    let operation = match fields.next() {
        Some(b"PUT") => Operation::Put,
        Some(b"GET") => Operation::Get,
        Some(other) => {
            return Err(ParseError::UnknownOperation(
                String::from_utf8_lossy(other).into_owned(),
            ))
        }
        None => return Err(ParseError::UnknownOperation(String::new())),
    };

    let key = fields
        .next()
        .map(|key| truncate(key, limits.max_key_size))
        .ok_or(ParseError::MissingKey)?;

    match operation {
        Operation::Get => Ok(Request::Get { key }),
        Operation::Put => {
            let value = fields
                .next()
                .map(|value| truncate(value, limits.max_value_size))
                .ok_or(ParseError::MissingValue)?;
            Ok(Request::Put { key, value })
        }
    }
}

fn truncate(field: &[u8], max: usize) -> Vec<u8> {
    field[..field.len().min(max)].to_vec()
}
