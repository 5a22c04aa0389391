//! Response definitions
//!
//! Represents replies to clients.

use std::fmt;

use crate::error::{KvError, Result};

const GET_OK_PREFIX: &[u8] = b"GET OK: ";

/// A reply sent back on the request's connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Key found, carries the stored value
    GetOk(Vec<u8>),

    /// Key absent (or lookup failed)
    GetError,

    /// Value stored
    PutOk,

    /// Store rejected the write
    PutError,

    /// Request could not be read or parsed
    FormatError,

    /// Operation the server does not implement
    UnknownOperation,
}

impl Response {
    /// Wire text of the response, newline terminated
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Response::GetOk(value) => {
                let mut bytes = Vec::with_capacity(GET_OK_PREFIX.len() + value.len() + 1);
                bytes.extend_from_slice(GET_OK_PREFIX);
                bytes.extend_from_slice(value);
                bytes.push(b'\n');
                bytes
            }
            Response::GetError => b"GET ERROR\n".to_vec(),
            Response::PutOk => b"PUT OK\n".to_vec(),
            Response::PutError => b"PUT ERROR\n".to_vec(),
            Response::FormatError => b"FORMAT ERROR\n".to_vec(),
            Response::UnknownOperation => b"UNKNOWN OPERATION\n".to_vec(),
        }
    }

    /// Parse the wire text of a response
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let line = bytes.strip_suffix(b"\n").unwrap_or(bytes);

        if let Some(value) = line.strip_prefix(GET_OK_PREFIX) {
            return Ok(Response::GetOk(value.to_vec()));
        }

        match line {
            b"GET ERROR" => Ok(Response::GetError),
            b"PUT OK" => Ok(Response::PutOk),
            b"PUT ERROR" => Ok(Response::PutError),
            b"FORMAT ERROR" => Ok(Response::FormatError),
            b"UNKNOWN OPERATION" => Ok(Response::UnknownOperation),
            _ => Err(KvError::Protocol(format!(
                "Unrecognized response: {:?}",
                String::from_utf8_lossy(bytes)
            ))),
        }
    }

    /// Whether the request succeeded
    pub fn is_ok(&self) -> bool {
        matches!(self, Response::GetOk(_) | Response::PutOk)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.to_bytes();
        f.write_str(String::from_utf8_lossy(&bytes).trim_end_matches('\n'))
    }
}
