// (c) 2026 The rfetch developers

//! Stream plumbing shared by the client and server
//!
//! # Buffering
//!
//! The protocol mixes text lines with raw payload on the same stream, so a reader that
//! pulls in a chunk of bytes looking for a line terminator may well have pulled in the
//! start of the payload too. Those bytes must not be lost.
//!
//! We handle this by requiring every [`ReceivingStream`] to be buffered ([`AsyncBufRead`]),
//! and by keeping the same buffered reader for the whole life of a connection.
//! Lines are read out of the buffer, and whatever follows is read out of the same buffer.

use tokio::io::{AsyncBufRead, AsyncBufReadExt as _, AsyncReadExt as _, AsyncWrite, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use super::ProtocolError;

/////////////////////////////////////////////////////////////////////////////////////////////
// STREAM TYPEDEFS

/// Marker trait for streams used for sending data
pub trait SendingStream: AsyncWrite + Send + Unpin {}
impl SendingStream for OwnedWriteHalf {}

#[cfg(test)]
impl SendingStream for Vec<u8> {}

/// Marker trait for streams used for receiving data.
///
/// These must be buffered; see the module documentation.
pub trait ReceivingStream: AsyncBufRead + Send + Unpin {}
impl ReceivingStream for BufReader<OwnedReadHalf> {}

#[cfg(test)]
impl ReceivingStream for BufReader<tokio_test::io::Mock> {}
#[cfg(test)]
impl ReceivingStream for &[u8] {}

/// Syntactic sugar helper type
#[derive(Debug)]
pub struct SendReceivePair<S: SendingStream, R: ReceivingStream> {
    /// outbound data
    pub send: S,
    /// inbound data
    pub recv: R,
}

impl<S: SendingStream, R: ReceivingStream> From<(S, R)> for SendReceivePair<S, R> {
    fn from(value: (S, R)) -> Self {
        Self {
            send: value.0,
            recv: value.1,
        }
    }
}

/// A TCP connection, split into halves, with a buffered inbound half
pub type TcpStreamPair = SendReceivePair<OwnedWriteHalf, BufReader<OwnedReadHalf>>;

impl TcpStreamPair {
    /// Splits a connected TCP stream.
    /// `buffer_size` sets the capacity of the inbound buffer.
    #[must_use]
    pub fn from_tcp(stream: TcpStream, buffer_size: usize) -> Self {
        let (recv, send) = stream.into_split();
        (send, BufReader::with_capacity(buffer_size, recv)).into()
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////
// LINE READING

/// Reads a single line from a receiving stream, consuming no more than `limit` bytes.
///
/// The returned line includes its terminator, if there was one.
/// A final line without a terminator (because the peer closed the stream) is returned as-is.
///
/// # Return
/// * `Ok(None)` if the stream was already at end of file
/// * `Err(LineTooLong)` if `limit` bytes were read without finding a `\n`
///
/// Bytes which are not valid UTF-8 are replaced; they cannot form part of a valid message anyway.
pub(crate) async fn read_line_limited<R>(
    recv: &mut R,
    limit: usize,
) -> Result<Option<String>, ProtocolError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let n = (&mut *recv)
        .take(limit as u64)
        .read_until(b'\n', &mut buf)
        .await?;
    if n == 0 {
        return Ok(None);
    }
    if buf.last() != Some(&b'\n') && n >= limit {
        return Err(ProtocolError::LineTooLong(limit));
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

/// Strips a single line terminator (`\n` or `\r\n`) from the end of a string, if present
pub(crate) fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}
