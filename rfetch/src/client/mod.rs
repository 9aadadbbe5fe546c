//! client-side (_initiator_) state machine, transfer engine and command interpreter
// (c) 2026 The rfetch developers

use std::net::SocketAddr;
use std::path::PathBuf;

use indicatif::MultiProgress;
use thiserror::Error;

use crate::cli::Parameters;
use crate::config::Configuration;
use crate::protocol::ProtocolError;
use crate::util::{AddressFamily, PathError};

pub(crate) mod progress;
pub(crate) mod repl;
mod session;
mod transfer;

pub(crate) use progress::MAX_UPDATE_FPS;
pub use session::{Session, State};

/// Failure to establish a connection
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The name lookup failed outright
    #[error("failed to look up {host}: {source}")]
    Lookup {
        /// The host we tried to look up
        host: String,
        /// What went wrong
        source: std::io::Error,
    },
    /// The name lookup succeeded, but returned nothing we can use
    #[error("host {host} has no {family} address")]
    NoAddress {
        /// The host we looked up
        host: String,
        /// The address family we wanted
        family: AddressFamily,
    },
    /// The connection attempt failed (typically, it was refused)
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        /// Where we tried to connect
        addr: SocketAddr,
        /// What went wrong
        source: std::io::Error,
    },
    /// The connection attempt took too long
    #[error("timed out connecting to {addr} after {secs}s")]
    Timeout {
        /// Where we tried to connect
        addr: SocketAddr,
        /// How long we waited
        secs: u16,
    },
}

/// Operations that make no sense in the current state, or with the arguments given.
///
/// These are detected before any network I/O takes place.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    /// There is no connection to use
    #[error("not connected")]
    NotConnected,
    /// A connection is already open. Close it first.
    #[error("already connected; close the current connection first")]
    AlreadyConnected,
    /// The destination path cannot be used
    #[error("bad destination {0:?}: {1}")]
    BadDestination(String, PathError),
}

/// Things that can go wrong in a client session
#[derive(Debug, Error)]
pub enum ClientError {
    /// We could not connect
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    /// The server said something we did not understand, or that we do not accept
    #[error("protocol error: {0}")]
    Protocol(ProtocolError),
    /// The server does not have (or will not serve) the requested file
    #[error("{0}: not found on server")]
    NotFound(String),
    /// The stream ended before the whole payload arrived
    #[error("transfer truncated: received {received} of {expected} bytes")]
    Truncated {
        /// The length the server announced
        expected: u64,
        /// What we actually received
        received: u64,
    },
    /// The stream failed
    #[error("connection failed: {0}")]
    Transport(std::io::Error),
    /// The destination file could not be written
    #[error("cannot write {}: {source}", .path.display())]
    Destination {
        /// The file we tried to write
        path: PathBuf,
        /// What went wrong
        source: std::io::Error,
    },
    /// The operation was rejected before any I/O
    #[error(transparent)]
    Usage(#[from] UsageError),
}

impl ClientError {
    /// Returns true if this error leaves the connection unusable.
    ///
    /// A response header we could not make sense of may be followed by a payload of unknown
    /// length, so the stream can no longer be trusted. The exceptions are a zero length,
    /// where no payload follows, and a request we refused to send.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            ClientError::Transport(_) | ClientError::Truncated { .. } => true,
            ClientError::Protocol(e) => !matches!(
                e,
                ProtocolError::ZeroContentLength | ProtocolError::UnencodableArgument(_)
            ),
            _ => false,
        }
    }
}

impl From<ProtocolError> for ClientError {
    fn from(value: ProtocolError) -> Self {
        match value {
            ProtocolError::Io(e) => ClientError::Transport(e),
            other => ClientError::Protocol(other),
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(value: std::io::Error) -> Self {
        ClientError::Transport(value)
    }
}

/// Client mode entrypoint: runs the interactive interpreter on stdin and stdout.
///
/// # Return value
/// `true` if the session ended normally.
#[allow(clippy::module_name_repetitions)]
#[cfg_attr(coverage_nightly, coverage(off))] // This is a thin adaptor, not worth testing
pub(crate) async fn client_main(
    config: &Configuration,
    params: &Parameters,
    display: MultiProgress,
) -> anyhow::Result<bool> {
    let session = Session::new(config, display, params.quiet)?;
    let input = tokio::io::BufReader::new(tokio::io::stdin());
    repl::run(session, input, anstream::stdout()).await
}
