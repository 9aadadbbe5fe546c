// (c) 2026 The rfetch developers

//! `rfetch` is a minimal remote file fetch utility.
//!
//! It has two halves, both in the one binary:
//!
//! * A **server** (`rfetch --server`) which serves the files under a root directory
//!   to anybody who connects to its TCP port.
//! * An interactive **client** (`rfetch`) which opens a connection to a server,
//!   fetches named files into a local root directory, and closes the session.
//!
//! ## 📖 Documentation
//!
//! * [About the wire protocol](protocol)
//! * [Configuring rfetch](config)
//!
//! ## Interactive client
//!
//! ```text
//! rfetch> OPEN fileserver.example.com 23657
//! rfetch> GET /reports/2015.pdf /2015.pdf
//! rfetch> CLOSE
//! rfetch> EXIT
//! ```
//!
//! Source paths are interpreted by the server, relative to its root directory.
//! Destination paths are relative to the client's root directory (`--client-root`).
//! Neither side will follow a path out of its root.
//!
//! #### What rfetch is not
//!
//! * Secure. There is no authentication and no encryption; anybody who can reach the port can read the served files.
//! * A sync tool. There is no directory listing, resumption, compression or checksumming.
//!   The only integrity check is that the number of bytes received matches the number declared.
//!
//! ## Library use
//!
//! The [`Server`] and [`Session`] types can be used directly, for example in tests:
//!
//! ```no_run
//! # async fn demo() -> anyhow::Result<()> {
//! use rfetch::{Configuration, Server, Session};
//! use indicatif::{MultiProgress, ProgressDrawTarget};
//!
//! let mut config = Configuration::system_default().clone();
//! config.server_root = "/srv/files".into();
//! config.client_root = "/tmp/downloads".into();
//!
//! let server = Server::bind("127.0.0.1:0".parse()?, &config.server_root, config.buffer_size).await?;
//! let port = server.local_addr()?.port();
//! let _task = tokio::spawn(server.run());
//!
//! let display = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
//! let mut session = Session::new(&config, display, true)?;
//! let _ = session.connect("127.0.0.1", port).await?;
//! let bytes = session.get("/hello.txt", "/hello.txt").await?;
//! session.close().await?;
//! # let _ = bytes;
//! # Ok(())
//! # }
//! ```
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub(crate) mod cli;
pub use cli::cli as main;
pub use cli::styles;

pub mod client;
pub use client::{ClientError, ConnectionError, Session, State as SessionState, UsageError};

pub mod config;
pub use config::Configuration;

pub mod protocol;

pub mod server;
pub use server::Server;

pub mod util;
