// (c) 2026 The rfetch developers
//! 📖 The rfetch wire protocol
//!
//! The protocol runs over a single TCP connection. It is a sequence of
//! request/response exchanges, strictly in order: the server does not read the next request
//! until it has completely sent the response to the current one. There is no pipelining.
//!
//! ## Requests
//!
//! A request is a single line of text:
//!
//! ```text
//! <COMMAND>[ <arg>]*\n
//! ```
//!
//! The command and each argument are separated by exactly one ASCII space.
//! A trailing `\r` before the `\n` is tolerated. There is no quoting or escaping,
//! so arguments cannot contain spaces or line terminators. See [`Request`].
//!
//! The following commands are defined:
//!
//! ### GET
//!
//! `GET <path>` retrieves a file, relative to the server's root directory.
//!
//! * Client ➡️ Server: `GET <path>\n`
//! * S ➡️ C: a [`ResponseHeader`]
//!   * On success: `DATA 200 OK \r\n` then `content-length: <N>\r\n`, then exactly N bytes of file data.
//!   * On failure: `DATA 404 Not found \r\n`, and nothing else.
//!
//! There is no payload terminator. The client relies entirely on the declared length
//! to know where the payload ends.
//!
//! A zero length is legal on the wire, but clients reject it: an empty file
//! cannot be told apart from a broken server.
//!
//! ### CLOSE
//!
//! `CLOSE` ends the session. The server closes the connection without replying.
//!
//! ### Anything else
//!
//! Unrecognised commands (including blank lines) are silently ignored.
//! The server does not reply and carries on reading requests.

pub mod common;
mod request;
mod response;

pub use request::{MAX_REQUEST_LINE, Request, Verb};
pub use response::{MAX_HEADER_LINE, ResponseHeader, Status};

use thiserror::Error;

/// Things that can go wrong when encoding or decoding protocol traffic
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A line exceeded the permitted length before its terminator was seen
    #[error("line exceeds {0} bytes")]
    LineTooLong(usize),
    /// A request argument (or command) cannot be represented in a request line
    #[error("{0:?} cannot be sent in a request line")]
    UnencodableArgument(String),
    /// The first line of a response header was not understood
    #[error("malformed status line {0:?}")]
    MalformedStatus(String),
    /// The response status code is not one we know
    #[error("unknown status code {0}")]
    UnknownStatus(u16),
    /// The second line of a response header was not a `key: value` field
    #[error("malformed header field {0:?}")]
    MalformedField(String),
    /// The header field was well-formed but was not `content-length`
    #[error("expected content-length, found {0:?}")]
    MissingContentLength(String),
    /// The content-length value was not a decimal integer
    #[error("content-length {0:?} is not a valid length")]
    InvalidContentLength(String),
    /// The content-length was zero, which we do not accept
    #[error("content-length is zero; no file retrieved")]
    ZeroContentLength,
    /// The underlying stream failed, or closed in the middle of a message
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
