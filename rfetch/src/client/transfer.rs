//! Client side of a single GET
// (c) 2026 The rfetch developers

use std::path::Path;

use indicatif::ProgressBar;
use tokio::fs::File;
use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
use tracing::{debug, trace, warn};

use super::ClientError;
use crate::protocol::common::{ReceivingStream, SendReceivePair, SendingStream};
use crate::protocol::{ProtocolError, Request, ResponseHeader, Status};

/// Retrieves `source` from the server into the local file `dest`.
///
/// `progress` is called once the payload length is known, to obtain a progress bar.
///
/// The destination is not created, or touched, unless the server sends a valid success header.
/// If anything goes wrong after that, the partial file is removed.
///
/// Exactly the declared number of payload bytes is consumed from the stream, even when
/// the destination cannot be written, so the connection remains usable unless the
/// error says otherwise (see [`ClientError::is_fatal`]).
///
/// # Return
/// The number of bytes retrieved
pub(super) async fn fetch<S, R, F>(
    stream: &mut SendReceivePair<S, R>,
    source: &str,
    dest: &Path,
    buffer_size: usize,
    progress: F,
) -> Result<u64, ClientError>
where
    S: SendingStream,
    R: ReceivingStream,
    F: FnOnce(u64) -> ProgressBar,
{
    let request = Request::get(source)?;
    trace!("sending {request:?}");
    request.write_to(&mut stream.send).await?;

    let header = ResponseHeader::read_from(&mut stream.recv).await?;
    trace!("received {header:?}");
    if header.status == Status::NotFound {
        return Err(ClientError::NotFound(source.to_owned()));
    }
    let length = header
        .content_length
        .ok_or_else(|| ProtocolError::MissingContentLength(String::new()))?;

    let mut file = match File::create(dest).await {
        Ok(f) => f,
        Err(source) => {
            discard_payload(&mut stream.recv, length).await?;
            return Err(ClientError::Destination {
                path: dest.to_owned(),
                source,
            });
        }
    };

    let bar = progress(length);
    let result =
        receive_payload(&mut stream.recv, &mut file, dest, length, buffer_size, &bar).await;
    bar.finish_and_clear();
    drop(file);
    if result.is_err() {
        if let Err(e) = tokio::fs::remove_file(dest).await {
            warn!("could not remove partial file {}: {e}", dest.display());
        } else {
            debug!("removed partial file {}", dest.display());
        }
    }
    result.map(|()| length)
}

/// Copies exactly `length` payload bytes from the stream to the file.
///
/// Never reads beyond the payload, whatever else may already be waiting in the stream.
async fn receive_payload<R: ReceivingStream>(
    recv: &mut R,
    file: &mut File,
    dest: &Path,
    length: u64,
    buffer_size: usize,
    bar: &ProgressBar,
) -> Result<(), ClientError> {
    let capacity = usize::try_from(length).map_or(buffer_size, |l| l.min(buffer_size));
    let mut buffer = vec![0u8; capacity];
    let mut remaining = length;
    let destination_error = |source| ClientError::Destination {
        path: dest.to_owned(),
        source,
    };

    while remaining > 0 {
        let want = usize::try_from(remaining).map_or(capacity, |r| r.min(capacity));
        let n = recv.read(&mut buffer[..want]).await?;
        if n == 0 {
            return Err(ClientError::Truncated {
                expected: length,
                received: length - remaining,
            });
        }
        if let Err(e) = file.write_all(&buffer[..n]).await {
            remaining -= n as u64;
            discard_payload(recv, remaining).await?;
            return Err(destination_error(e));
        }
        remaining -= n as u64;
        bar.inc(n as u64);
    }
    file.flush().await.map_err(destination_error)?;
    Ok(())
}

/// Reads and drops the rest of a payload, keeping the stream in step
async fn discard_payload<R: ReceivingStream>(
    recv: &mut R,
    length: u64,
) -> Result<(), ClientError> {
    let discarded =
        tokio::io::copy(&mut (&mut *recv).take(length), &mut tokio::io::sink()).await?;
    if discarded < length {
        return Err(ClientError::Truncated {
            expected: length,
            received: discarded,
        });
    }
    Ok(())
}
