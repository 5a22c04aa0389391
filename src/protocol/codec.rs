//! Protocol codec
//!
//! Length-prefixed framing over a byte stream.
//!
//! ## Wire Format
//! ```text
//! ┌──────────────────┬─────────────────────────────┐
//! │ Len (4, native)  │         Payload             │
//! └──────────────────┴─────────────────────────────┘
//! ```
//!
//! The prefix is a signed 32-bit integer in host byte order, matching the
//! clients this server was written for. A stream that ends before the first
//! prefix byte is a clean "no data" close, anything shorter after that is a
//! framing error.

use std::io::{ErrorKind, Read, Write};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{KvError, Result};

/// Size of the length prefix in bytes
pub const LENGTH_PREFIX_SIZE: usize = 4;

// =============================================================================
// Encoding
// =============================================================================

/// Encode a payload into a single frame
pub fn encode_frame(payload: &[u8]) -> Result<Bytes> {
    let len = i32::try_from(payload.len()).map_err(|_| {
        KvError::Protocol(format!(
            "Payload too large to frame: {} bytes",
            payload.len()
        ))
    })?;

    let mut frame = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    frame.put_slice(&len.to_ne_bytes());
    frame.put_slice(payload);

    Ok(frame.freeze())
}

/// Write a payload as one frame and flush it
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<()> {
    let frame = encode_frame(payload)?;
    writer.write_all(&frame)?;
    writer.flush()?;
    Ok(())
}

// =============================================================================
// Decoding
// =============================================================================

/// Read one frame from a stream
///
/// Returns `Ok(None)` when the peer closed the stream before sending any
/// length byte. Short reads are reassembled until the full frame arrived.
///
/// # Errors
/// - `KvError::Protocol` on a truncated prefix or payload, a negative length,
///   or a length above `max_len`
/// - `KvError::Io` on any other read failure
pub fn read_frame<R: Read>(reader: &mut R, max_len: usize) -> Result<Option<Vec<u8>>> {
    let prefix = match read_prefix(reader)? {
        Some(prefix) => prefix,
        None => return Ok(None),
    };

    let len = i32::from_ne_bytes(prefix);
    if len < 0 {
        return Err(KvError::Protocol(format!("Negative frame length: {}", len)));
    }

    let len = len as usize;
    if len > max_len {
        return Err(KvError::Protocol(format!(
            "Frame too large: {} bytes (max {})",
            len, max_len
        )));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => KvError::Protocol(format!(
            "Truncated payload: expected {} bytes",
            len
        )),
        _ => KvError::Io(e),
    })?;

    Ok(Some(payload))
}

/// Fill the length prefix, distinguishing "nothing sent" from "cut short"
fn read_prefix<R: Read>(reader: &mut R) -> Result<Option<[u8; LENGTH_PREFIX_SIZE]>> {
    let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
    let mut filled = 0;

    while filled < LENGTH_PREFIX_SIZE {
        match reader.read(&mut prefix[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => {
                return Err(KvError::Protocol(format!(
                    "Truncated length prefix: got {} of {} bytes",
                    filled, LENGTH_PREFIX_SIZE
                )))
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(Some(prefix))
}
