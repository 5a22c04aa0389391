//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Framing
//! ```text
//! ┌──────────────────┬─────────────────────────────┐
//! │ Len (4, native)  │         Payload             │
//! └──────────────────┴─────────────────────────────┘
//! ```
//!
//! One connection carries exactly one request frame and one response frame.
//!
//! ### Requests
//! - `PUT:<key>:<value>`
//! - `GET:<key>`
//!
//! ### Responses
//! - `GET OK: <value>\n`
//! - `GET ERROR\n`
//! - `PUT OK\n`
//! - `PUT ERROR\n`
//! - `FORMAT ERROR\n`
//! - `UNKNOWN OPERATION\n`

mod codec;
mod request;
mod response;

pub use codec::{encode_frame, read_frame, write_frame, LENGTH_PREFIX_SIZE};
pub use request::{parse_request, FieldLimits, Operation, Request, DELIMITER};
pub use response::Response;
