// (c) 2026 The rfetch developers
//! Response headers (server ➡️ client)

use tokio::io::AsyncWriteExt as _;

use super::ProtocolError;
use super::common::{ReceivingStream, SendingStream, read_line_limited, strip_terminator};

/// The longest response header line a client will accept, including its terminator
pub const MAX_HEADER_LINE: usize = 1024;

const DATA_TAG: &str = "DATA";
const CONTENT_LENGTH: &str = "content-length";

/// Response status
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Status {
    /// The file follows
    #[strum(to_string = "200 OK")]
    Ok,
    /// The file could not be served, for whatever reason
    #[strum(to_string = "404 Not found")]
    NotFound,
}

impl Status {
    /// Numeric status code, as it appears on the wire
    #[must_use]
    pub fn code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::NotFound => 404,
        }
    }

    /// Reason phrase, as it appears on the wire
    #[must_use]
    pub fn reason(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::NotFound => "Not found",
        }
    }

    fn from_code(code: u16) -> Result<Self, ProtocolError> {
        match code {
            200 => Ok(Status::Ok),
            404 => Ok(Status::NotFound),
            other => Err(ProtocolError::UnknownStatus(other)),
        }
    }
}

/// The header of a response to GET
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHeader {
    /// Outcome
    pub status: Status,
    /// Payload length. Always present when status is [`Status::Ok`], never otherwise.
    pub content_length: Option<u64>,
}

impl ResponseHeader {
    /// A success header announcing a payload of `length` bytes
    #[must_use]
    pub fn ok(length: u64) -> Self {
        Self {
            status: Status::Ok,
            content_length: Some(length),
        }
    }

    /// A failure header
    #[must_use]
    pub fn not_found() -> Self {
        Self {
            status: Status::NotFound,
            content_length: None,
        }
    }

    /// Renders this header exactly as it is sent.
    ///
    /// The status line ends with a space before its `\r\n`; that space is part of the wire format.
    #[must_use]
    pub fn to_wire(&self) -> String {
        let mut out = format!(
            "{DATA_TAG} {} {} \r\n",
            self.status.code(),
            self.status.reason()
        );
        if let Some(len) = self.content_length {
            out.push_str(&format!("{CONTENT_LENGTH}: {len}\r\n"));
        }
        out
    }

    /// Sends this header.
    ///
    /// The stream is not flushed, as a payload usually follows.
    pub async fn write_to<W: SendingStream>(&self, send: &mut W) -> std::io::Result<()> {
        send.write_all(self.to_wire().as_bytes()).await
    }

    /// Reads and parses a response header.
    ///
    /// On success the stream is positioned at the first byte of the payload (if any).
    /// A peer that closes the stream before the header is complete is reported as
    /// [`ProtocolError::Io`] with kind [`UnexpectedEof`](std::io::ErrorKind::UnexpectedEof).
    pub async fn read_from<R: ReceivingStream>(recv: &mut R) -> Result<Self, ProtocolError> {
        let status_line = read_header_line(recv).await?;
        let status = parse_status_line(&status_line)?;
        if status == Status::NotFound {
            return Ok(Self::not_found());
        }
        let field_line = read_header_line(recv).await?;
        let length = parse_content_length(&field_line)?;
        if length == 0 {
            return Err(ProtocolError::ZeroContentLength);
        }
        Ok(Self::ok(length))
    }
}

async fn read_header_line<R: ReceivingStream>(recv: &mut R) -> Result<String, ProtocolError> {
    match read_line_limited(recv, MAX_HEADER_LINE).await? {
        Some(line) if line.ends_with('\n') => Ok(line),
        _ => Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "connection closed during response header",
        )
        .into()),
    }
}

fn parse_status_line(line: &str) -> Result<Status, ProtocolError> {
    let malformed = || ProtocolError::MalformedStatus(strip_terminator(line).to_owned());
    let mut tokens = line.split_whitespace();
    if tokens.next() != Some(DATA_TAG) {
        return Err(malformed());
    }
    let code = tokens
        .next()
        .and_then(|t| t.parse::<u16>().ok())
        .ok_or_else(malformed)?;
    Status::from_code(code)
}

fn parse_content_length(line: &str) -> Result<u64, ProtocolError> {
    let line = strip_terminator(line);
    let (key, value) = line
        .split_once(':')
        .ok_or_else(|| ProtocolError::MalformedField(line.to_owned()))?;
    if !key.trim().eq_ignore_ascii_case(CONTENT_LENGTH) {
        return Err(ProtocolError::MissingContentLength(key.to_owned()));
    }
    let value = value.trim();
    value
        .parse::<u64>()
        .map_err(|_| ProtocolError::InvalidContentLength(value.to_owned()))
}
