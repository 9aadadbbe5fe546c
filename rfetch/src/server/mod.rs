//! server-side event loop
// (c) 2026 The rfetch developers

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{Instrument as _, debug, error, info, info_span, warn};

use crate::config::Configuration;
use crate::protocol::common::TcpStreamPair;
use crate::util::require_directory;

mod connection;
pub(crate) use connection::handle_connection;

/// How long to wait before accepting again, after accept fails (typically for lack of file descriptors)
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// A file server, bound to its listening socket
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    root: PathBuf,
    buffer_size: usize,
}

impl Server {
    /// Binds the listening socket.
    ///
    /// `root` must be an existing directory. It is canonicalised here, so later
    /// changes to the working directory do not affect what is served.
    pub async fn bind(addr: SocketAddr, root: &Path, buffer_size: usize) -> anyhow::Result<Self> {
        let root = require_directory(root, "server root")?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to listen on {addr}"))?;
        Ok(Self {
            listener,
            root,
            buffer_size,
        })
    }

    /// The address we are actually listening on. Useful when binding to port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// The directory being served
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Accepts and serves connections, forever.
    ///
    /// Each connection is served by its own task, so a slow client does not hold up any other.
    /// The failure of a connection is logged and does not affect the server.
    pub async fn run(self) -> anyhow::Result<()> {
        info!(
            "serving {root} on {addr}",
            root = self.root.display(),
            addr = self.local_addr()?
        );
        let mut tasks = JoinSet::new();
        loop {
            // reap finished connections
            while let Some(result) = tasks.try_join_next() {
                if let Err(e) = result {
                    error!("connection task failed: {e}");
                }
            }

            let (stream, peer) = match self.listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    warn!("accept failed: {e}");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            };
            if let Err(e) = stream.set_nodelay(true) {
                debug!("could not set TCP_NODELAY for {peer}: {e}");
            }
            let pair = TcpStreamPair::from_tcp(stream, self.buffer_size);
            let root = self.root.clone();
            let buffer_size = self.buffer_size;
            let _ = tasks.spawn(
                async move {
                    info!("connected");
                    match handle_connection(pair, &root, buffer_size).await {
                        Ok(()) => info!("disconnected"),
                        Err(e) => error!("connection terminated: {e:#}"),
                    }
                }
                .instrument(info_span!("CONN", %peer)),
            );
        }
    }
}

/// Server entrypoint.
///
/// Runs until interrupted.
#[allow(clippy::module_name_repetitions)]
#[cfg_attr(coverage_nightly, coverage(off))] // This is a thin adaptor, not worth testing
pub(crate) async fn server_main(config: &Configuration) -> anyhow::Result<()> {
    let addr = SocketAddr::new(config.bind_address, config.port);
    let server = Server::bind(addr, &config.server_root, config.buffer_size).await?;
    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted; shutting down");
            Ok(())
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod test {
    use std::net::SocketAddr;

    use pretty_assertions::assert_eq;
    use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
    use tokio::net::TcpStream;

    use super::Server;

    fn loopback() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    async fn fetch_raw(addr: SocketAddr, requests: &[u8]) -> Vec<u8> {
        let mut conn = TcpStream::connect(addr).await.unwrap();
        conn.write_all(requests).await.unwrap();
        let mut out = Vec::new();
        let _ = conn.read_to_end(&mut out).await.unwrap();
        out
    }

    #[tokio::test]
    async fn bind_requires_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = Server::bind(loopback(), &dir.path().join("missing"), 4096)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("server root"), "{err}");
    }

    #[tokio::test]
    async fn serves_over_tcp() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"abc").unwrap();
        let server = Server::bind(loopback(), dir.path(), 4096).await.unwrap();
        assert_eq!(server.root(), dir.path().canonicalize().unwrap());
        let addr = server.local_addr().unwrap();
        let task = tokio::spawn(server.run());

        let out = fetch_raw(addr, b"GET /a.txt\nCLOSE\n").await;
        assert_eq!(out, b"DATA 200 OK \r\ncontent-length: 3\r\nabc");
        task.abort();
    }

    #[tokio::test]
    async fn connections_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"abc").unwrap();
        let server = Server::bind(loopback(), dir.path(), 4096).await.unwrap();
        let addr = server.local_addr().unwrap();
        let task = tokio::spawn(server.run());

        // An idle connection does not block anybody else
        let mut idle = TcpStream::connect(addr).await.unwrap();
        let out = fetch_raw(addr, b"GET a.txt\nCLOSE\n").await;
        assert_eq!(out, b"DATA 200 OK \r\ncontent-length: 3\r\nabc");

        // and is still served afterwards
        idle.write_all(b"GET nope\nCLOSE\n").await.unwrap();
        let mut out = Vec::new();
        let _ = idle.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"DATA 404 Not found \r\n");

        // A client that vanishes mid-session does not upset the server
        drop(TcpStream::connect(addr).await.unwrap());
        let out = fetch_raw(addr, b"GET a.txt\nCLOSE\n").await;
        assert_eq!(out, b"DATA 200 OK \r\ncontent-length: 3\r\nabc");
        task.abort();
    }
}
