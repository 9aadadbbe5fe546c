//! Client connection state machine
// (c) 2026 The rfetch developers

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use indicatif::{MultiProgress, ProgressBar};
use tokio::io::{AsyncWriteExt as _, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing::{Instrument as _, debug, info, info_span, warn};

use super::{ClientError, ConnectionError, UsageError, progress, transfer};
use crate::config::Configuration;
use crate::protocol::Request;
use crate::protocol::common::{ReceivingStream, SendReceivePair, SendingStream, TcpStreamPair};
use crate::util::{AddressFamily, lookup_host_by_family, require_directory, resolve_under_root};

/// Connection state of a [`Session`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display)]
pub enum State {
    /// No connection
    #[default]
    Disconnected,
    /// A connection attempt is in progress
    Connecting,
    /// Connected; requests may be made
    Connected,
}

/// A client session: at most one connection to a server, and the files fetched through it.
///
/// ```text
/// Disconnected ── connect() ──> Connecting ── ok ──> Connected
///      ^                            │                    │
///      └────────── failure ─────────┘                    │
///      └──────── close(), or a broken connection ────────┘
/// ```
///
/// Operations which make no sense in the current state fail with a [`UsageError`]
/// before any network traffic happens.
#[derive(Debug)]
pub struct Session<S = OwnedWriteHalf, R = BufReader<OwnedReadHalf>>
where
    S: SendingStream,
    R: ReceivingStream,
{
    state: State,
    stream: Option<SendReceivePair<S, R>>,
    peer: Option<SocketAddr>,
    client_root: PathBuf,
    address_family: AddressFamily,
    connect_timeout: u16,
    buffer_size: usize,
    display: MultiProgress,
    quiet: bool,
}

impl Session {
    /// Creates a disconnected session.
    ///
    /// The configured `client_root` must be an existing directory.
    /// If `quiet` is set, no progress is shown on `display`.
    pub fn new(
        config: &Configuration,
        display: MultiProgress,
        quiet: bool,
    ) -> anyhow::Result<Self> {
        Self::configure(config, display, quiet)
    }

    /// Opens a connection to a server.
    ///
    /// A host name is looked up, restricted to the configured address family.
    ///
    /// # Return
    /// The address we connected to
    pub async fn connect(&mut self, host: &str, port: u16) -> Result<SocketAddr, ClientError> {
        if self.state == State::Connected {
            return Err(UsageError::AlreadyConnected.into());
        }
        self.state = State::Connecting;
        let spinner = self.bar(|d, q| progress::spinner(d, &format!("Connecting to {host}"), q));
        let result = self
            .establish(host, port)
            .instrument(info_span!("OPEN", host, port))
            .await;
        spinner.finish_and_clear();
        match result {
            Ok((pair, addr)) => {
                info!("connected to {addr}");
                self.stream = Some(pair);
                self.peer = Some(addr);
                self.state = State::Connected;
                Ok(addr)
            }
            Err(e) => {
                self.state = State::Disconnected;
                Err(e)
            }
        }
    }

    async fn establish(
        &self,
        host: &str,
        port: u16,
    ) -> Result<(TcpStreamPair, SocketAddr), ClientError> {
        let family = self.address_family;
        let lookup_host = host.to_owned();
        let ip = tokio::task::spawn_blocking(move || lookup_host_by_family(&lookup_host, family))
            .await
            .map_err(|e| ConnectionError::Lookup {
                host: host.to_owned(),
                source: std::io::Error::other(e),
            })??;
        let addr = SocketAddr::new(ip, port);
        debug!("connecting to {addr}");

        let timeout = std::time::Duration::from_secs(self.connect_timeout.into());
        let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| ConnectionError::Timeout {
                addr,
                secs: self.connect_timeout,
            })?
            .map_err(|source| ConnectionError::Connect { addr, source })?;
        if let Err(e) = stream.set_nodelay(true) {
            debug!("could not set TCP_NODELAY: {e}");
        }
        Ok((TcpStreamPair::from_tcp(stream, self.buffer_size), addr))
    }
}

impl<S: SendingStream, R: ReceivingStream> Session<S, R> {
    fn configure(
        config: &Configuration,
        display: MultiProgress,
        quiet: bool,
    ) -> anyhow::Result<Self> {
        let client_root = require_directory(&config.client_root, "client root")?;
        Ok(Self {
            state: State::Disconnected,
            stream: None,
            peer: None,
            client_root,
            address_family: config.address_family,
            connect_timeout: config.connect_timeout,
            buffer_size: config.buffer_size,
            display,
            quiet,
        })
    }

    /// Current connection state
    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    /// The server we are connected to, if any
    #[must_use]
    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Whether progress and summaries are suppressed
    pub(crate) fn quiet(&self) -> bool {
        self.quiet
    }

    /// The directory destinations are written under
    #[must_use]
    pub fn client_root(&self) -> &Path {
        &self.client_root
    }

    /// Retrieves the file `source` from the server, writing it to `destination` under the client root.
    ///
    /// `source` is sent to the server as-is. `destination` is resolved under the client root
    /// in the same way the server resolves paths: a leading `/` is ignored and `..` is refused.
    /// The destination's directory must already exist.
    ///
    /// Failures that break the connection (see [`ClientError::is_fatal`]) leave the session disconnected.
    ///
    /// # Return
    /// The number of bytes retrieved
    pub async fn get(&mut self, source: &str, destination: &str) -> Result<u64, ClientError> {
        if self.state != State::Connected {
            return Err(UsageError::NotConnected.into());
        }
        let dest = resolve_under_root(&self.client_root, destination)
            .map_err(|e| UsageError::BadDestination(destination.to_owned(), e))?;
        let Some(stream) = self.stream.as_mut() else {
            return Err(UsageError::NotConnected.into());
        };

        let display = self.display.clone();
        let quiet = self.quiet;
        let result = transfer::fetch(stream, source, &dest, self.buffer_size, |length| {
            progress::transfer_bar(&display, source, length, quiet)
                .unwrap_or_else(|_| ProgressBar::hidden())
        })
        .instrument(info_span!("GET", path = source))
        .await;

        match &result {
            Ok(length) => info!("retrieved {length} bytes into {}", dest.display()),
            Err(e) if e.is_fatal() => {
                warn!("connection lost: {e}");
                self.disconnect();
            }
            Err(e) => debug!("get failed: {e}"),
        }
        result
    }

    /// Ends the session politely, then disconnects
    pub async fn close(&mut self) -> Result<(), ClientError> {
        let Some(mut stream) = self.stream.take() else {
            return Err(UsageError::NotConnected.into());
        };
        self.disconnect();
        Request::close().write_to(&mut stream.send).await?;
        stream.send.shutdown().await?;
        info!("connection closed");
        Ok(())
    }

    /// Drops the connection without telling the server
    fn disconnect(&mut self) {
        self.stream = None;
        self.peer = None;
        self.state = State::Disconnected;
    }

    fn bar<F>(&self, make: F) -> ProgressBar
    where
        F: FnOnce(&MultiProgress, bool) -> anyhow::Result<ProgressBar>,
    {
        make(&self.display, self.quiet).unwrap_or_else(|e| {
            debug!("progress display unavailable: {e}");
            ProgressBar::hidden()
        })
    }

    /// Attaches an already-connected stream
    #[cfg(test)]
    pub(crate) fn attach(&mut self, pair: SendReceivePair<S, R>) {
        self.stream = Some(pair);
        self.state = State::Connected;
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod test {
    use std::net::SocketAddr;

    use indicatif::{MultiProgress, ProgressDrawTarget};
    use pretty_assertions::assert_eq;
    use tokio::io::{
        AsyncBufReadExt as _, AsyncWriteExt as _, BufReader, ReadHalf, SimplexStream, WriteHalf,
    };

    use super::{Session, State};
    use crate::client::{ClientError, ConnectionError, UsageError};
    use crate::config::Configuration;
    use crate::protocol::ProtocolError;
    use crate::server::{Server, handle_connection};
    use crate::util::PathError;
    use crate::util::test_protocol::test_plumbing;

    type TestSession = Session<WriteHalf<SimplexStream>, BufReader<ReadHalf<SimplexStream>>>;

    struct Fixture {
        server_dir: tempfile::TempDir,
        client_dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let server_dir = tempfile::tempdir().unwrap();
            std::fs::write(server_dir.path().join("a.txt"), b"alpha").unwrap();
            std::fs::write(server_dir.path().join("b.txt"), b"bravo!").unwrap();
            Self {
                server_dir,
                client_dir: tempfile::tempdir().unwrap(),
            }
        }

        fn config(&self) -> Configuration {
            let mut config = Configuration::system_default().clone();
            config.client_root = self.client_dir.path().to_owned();
            config.buffer_size = 1024;
            config
        }

        fn display() -> MultiProgress {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        }

        /// A session connected to a connection handler over in-memory pipes
        fn plumbed(&self) -> TestSession {
            let (client, server) = test_plumbing();
            let root = self.server_dir.path().to_owned();
            let _ = tokio::spawn(async move { handle_connection(server, &root, 1024).await });
            let mut session =
                TestSession::configure(&self.config(), Self::display(), true).unwrap();
            session.attach(client);
            session
        }

        async fn tcp_server(&self) -> u16 {
            let addr = "127.0.0.1:0".parse().unwrap();
            let server = Server::bind(addr, self.server_dir.path(), 1024).await.unwrap();
            let port = server.local_addr().unwrap().port();
            let _ = tokio::spawn(server.run());
            port
        }

        fn fetched(&self, name: &str) -> Vec<u8> {
            std::fs::read(self.client_dir.path().join(name)).unwrap()
        }
    }

    #[test]
    fn client_root_must_exist() {
        let f = Fixture::new();
        let mut config = f.config();
        config.client_root = f.client_dir.path().join("missing");
        let err = Session::new(&config, Fixture::display(), true).unwrap_err();
        assert!(err.to_string().contains("client root"), "{err}");
    }

    #[tokio::test]
    async fn usage_errors_when_disconnected() {
        let f = Fixture::new();
        let mut session = Session::new(&f.config(), Fixture::display(), true).unwrap();
        assert_eq!(session.state(), State::Disconnected);
        let err = session.get("/a.txt", "a.txt").await.unwrap_err();
        assert!(matches!(err, ClientError::Usage(UsageError::NotConnected)));
        assert!(!f.client_dir.path().join("a.txt").exists());
        let err = session.close().await.unwrap_err();
        assert!(matches!(err, ClientError::Usage(UsageError::NotConnected)));
    }

    #[tokio::test]
    async fn sequential_gets_keep_the_connection() {
        let f = Fixture::new();
        let mut session = f.plumbed();
        assert_eq!(session.get("/a.txt", "a.txt").await.unwrap(), 5);
        let err = session.get("/missing", "m.txt").await.unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
        assert_eq!(session.state(), State::Connected);
        assert_eq!(session.get("b.txt", "/sub-b.txt").await.unwrap(), 6);
        assert_eq!(f.fetched("a.txt"), b"alpha");
        assert_eq!(f.fetched("sub-b.txt"), b"bravo!");
        assert!(!f.client_dir.path().join("m.txt").exists());
        session.close().await.unwrap();
        assert_eq!(session.state(), State::Disconnected);
    }

    #[tokio::test]
    async fn same_get_twice_is_idempotent() {
        let f = Fixture::new();
        let mut session = f.plumbed();
        let _ = session.get("a.txt", "copy").await.unwrap();
        let first = f.fetched("copy");
        let _ = session.get("a.txt", "copy").await.unwrap();
        assert_eq!(f.fetched("copy"), first);
    }

    #[tokio::test]
    async fn destination_confined_to_client_root() {
        let f = Fixture::new();
        let mut session = f.plumbed();
        let err = session.get("a.txt", "../escape").await.unwrap_err();
        assert!(
            matches!(
                err,
                ClientError::Usage(UsageError::BadDestination(_, PathError::ParentComponent))
            ),
            "{err:?}"
        );
        // nothing was sent, so the connection is still in step
        assert_eq!(session.get("a.txt", "a.txt").await.unwrap(), 5);
    }

    #[tokio::test]
    async fn truncation_disconnects() {
        let f = Fixture::new();
        let (client, mut server) = test_plumbing();
        let _ = tokio::spawn(async move {
            let mut line = String::new();
            let _ = server.recv.read_line(&mut line).await.unwrap();
            server
                .send
                .write_all(b"DATA 200 OK \r\ncontent-length: 10\r\nabc")
                .await
                .unwrap();
            server.send.shutdown().await.unwrap();
        });
        let mut session = TestSession::configure(&f.config(), Fixture::display(), true).unwrap();
        session.attach(client);
        let err = session.get("x", "x").await.unwrap_err();
        assert!(matches!(err, ClientError::Truncated { .. }), "{err:?}");
        assert_eq!(session.state(), State::Disconnected);
        assert!(!f.client_dir.path().join("x").exists());
    }

    #[tokio::test]
    async fn unreadable_header_disconnects() {
        let f = Fixture::new();
        let (client, mut server) = test_plumbing();
        let _ = tokio::spawn(async move {
            let mut line = String::new();
            let _ = server.recv.read_line(&mut line).await.unwrap();
            // a header we cannot parse, with a payload of unknown length behind it
            server
                .send
                .write_all(b"DATA 200 OK \r\ncontent-type: x\r\nhello\n")
                .await
                .unwrap();
        });
        let mut session = TestSession::configure(&f.config(), Fixture::display(), true).unwrap();
        session.attach(client);
        let err = session.get("x", "x").await.unwrap_err();
        assert!(
            matches!(
                err,
                ClientError::Protocol(ProtocolError::MissingContentLength(_))
            ),
            "{err:?}"
        );
        assert_eq!(session.state(), State::Disconnected);
        // the leftover payload is never read as the next response
        let err = session.get("y", "y").await.unwrap_err();
        assert!(matches!(err, ClientError::Usage(UsageError::NotConnected)));
        assert!(!f.client_dir.path().join("x").exists());
        assert!(!f.client_dir.path().join("y").exists());
    }

    #[tokio::test]
    async fn tcp_lifecycle() {
        let f = Fixture::new();
        let port = f.tcp_server().await;
        let mut session = Session::new(&f.config(), Fixture::display(), true).unwrap();

        let addr = session.connect("127.0.0.1", port).await.unwrap();
        assert_eq!(addr.port(), port);
        assert_eq!(session.peer(), Some(addr));
        assert_eq!(session.state(), State::Connected);

        // a second OPEN is refused, and the connection survives
        let err = session.connect("127.0.0.1", port).await.unwrap_err();
        assert!(matches!(err, ClientError::Usage(UsageError::AlreadyConnected)));
        assert_eq!(session.get("a.txt", "a.txt").await.unwrap(), 5);

        session.close().await.unwrap();
        assert_eq!(session.peer(), None);
        let err = session.get("a.txt", "a.txt").await.unwrap_err();
        assert!(matches!(err, ClientError::Usage(UsageError::NotConnected)));

        // and we can connect again
        let _ = session.connect("127.0.0.1", port).await.unwrap();
        assert_eq!(session.get("b.txt", "b.txt").await.unwrap(), 6);
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn refused_connection() {
        let f = Fixture::new();
        // find a port nobody is listening on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        drop(listener);

        let mut session = Session::new(&f.config(), Fixture::display(), true).unwrap();
        let err = session.connect("127.0.0.1", addr.port()).await.unwrap_err();
        assert!(
            matches!(err, ClientError::Connection(ConnectionError::Connect { .. })),
            "{err:?}"
        );
        assert_eq!(session.state(), State::Disconnected);
    }

    #[tokio::test]
    async fn unknown_host() {
        let f = Fixture::new();
        let mut session = Session::new(&f.config(), Fixture::display(), true).unwrap();
        let err = session.connect("no.such.host.invalid", 1).await.unwrap_err();
        assert!(
            matches!(err, ClientError::Connection(ConnectionError::Lookup { .. })),
            "{err:?}"
        );
        assert_eq!(session.state(), State::Disconnected);
    }
}
