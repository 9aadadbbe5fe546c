//! Handler for a single client connection
// (c) 2026 The rfetch developers

use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _, BufReader};
use tracing::{Instrument as _, debug, info, info_span, trace};

use crate::protocol::common::{ReceivingStream, SendReceivePair, SendingStream};
use crate::protocol::{Request, ResponseHeader, Verb};
use crate::util::resolve_under_root;

/// Serves requests on a connection until the client sends CLOSE or goes away.
///
/// Requests are handled strictly in order; the next request is not read
/// until the response to the current one has been completely sent.
/// However the session ends, our side of the stream is shut down.
///
/// # Return
/// `Ok` on CLOSE or a clean end of stream between requests.
/// Any error means the connection is no longer usable.
pub(crate) async fn handle_connection<S, R>(
    mut sp: SendReceivePair<S, R>,
    root: &Path,
    buffer_size: usize,
) -> anyhow::Result<()>
where
    S: SendingStream,
    R: ReceivingStream,
{
    let result = serve_requests(&mut sp, root, buffer_size).await;
    let _ = sp.send.shutdown().await;
    result
}

async fn serve_requests<S, R>(
    sp: &mut SendReceivePair<S, R>,
    root: &Path,
    buffer_size: usize,
) -> anyhow::Result<()>
where
    S: SendingStream,
    R: ReceivingStream,
{
    loop {
        let Some(request) = Request::read_from(&mut sp.recv).await? else {
            debug!("client closed the stream");
            return Ok(());
        };
        trace!("received {request:?}");
        match request.verb() {
            Some(Verb::Get) => {
                let path = request.args.first().map_or("", String::as_str);
                send_file(&mut sp.send, root, path, buffer_size)
                    .instrument(info_span!("GET", path))
                    .await?;
            }
            Some(Verb::Close) => {
                debug!("client requested close");
                return Ok(());
            }
            None => debug!("ignoring unrecognised command {:?}", request.command),
        }
    }
}

/// Responds to a single GET
async fn send_file<S: SendingStream>(
    send: &mut S,
    root: &Path,
    requested: &str,
    buffer_size: usize,
) -> anyhow::Result<()> {
    let Some((file, length)) = open_requested(root, requested).await else {
        ResponseHeader::not_found().write_to(send).await?;
        send.flush().await?;
        info!("not found");
        return Ok(());
    };

    ResponseHeader::ok(length).write_to(send).await?;
    trace!("sending {length} bytes");
    // Bytes beyond the length we announced are never sent, even if the file has grown.
    let mut reader = BufReader::with_capacity(buffer_size, file.take(length));
    let sent = tokio::io::copy_buf(&mut reader, send).await?;
    send.flush().await?;
    anyhow::ensure!(
        sent == length,
        "file shrank during transfer; sent {sent} of {length} bytes"
    );
    info!("sent {length} bytes");
    Ok(())
}

/// Opens the file a client asked for, if we are willing and able to serve it.
///
/// Everything that prevents us from serving it collapses to `None`, which becomes a 404.
async fn open_requested(root: &Path, requested: &str) -> Option<(File, u64)> {
    let path = resolve_under_root(root, requested)
        .inspect_err(|e| debug!("refusing {requested:?}: {e}"))
        .ok()?;
    let file = File::open(&path)
        .await
        .inspect_err(|e| debug!("cannot open {path:?}: {e}"))
        .ok()?;
    let meta = file
        .metadata()
        .await
        .inspect_err(|e| debug!("cannot stat {path:?}: {e}"))
        .ok()?;
    if !meta.is_file() {
        debug!("{path:?} is not a regular file");
        return None;
    }
    Some((file, meta.len()))
}
