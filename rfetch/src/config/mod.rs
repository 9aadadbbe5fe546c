// (c) 2026 The rfetch developers
//! # 📖 Configuration management
//!
//! rfetch obtains run-time configuration from the following sources, in order of increasing priority:
//! 1. Hard-wired defaults
//! 2. The system-wide configuration file
//!    * On Unix, this is `/etc/rfetch.toml`
//!    * On Windows, this is `%ProgramData%\rfetch.toml`
//! 3. The user's configuration file
//!    * On Unix, this is `~/.config/rfetch/rfetch.toml`
//!    * On Windows, this is `%AppData%\Roaming\rfetch\rfetch.toml`
//! 4. Environment variables: `RFETCH_` followed by the field name, e.g. `RFETCH_PORT=9000`
//! 5. Command-line options
//!
//! A value from a higher priority source replaces the same value from a lower one.
//!
//! Run `rfetch --config-files` for a list of which files we read.
//!
//! ## File format
//!
//! Configuration files are [TOML](https://toml.io/). Each key is the name of a field of
//! [`Configuration`], in `snake_case`. Unknown keys are ignored.
//!
//! ```toml
//! # Serve the shared area to the local network only
//! bind_address = "192.168.1.10"
//! server_root = "/srv/shared"
//! buffer_size = 262144
//! ```
//!
//! ## Configurable options
//!
//! The set of supported fields is the [`Configuration`] structure.
//!
//! * `rfetch --show-config` outputs a list of supported fields, their current values, and where each value came from.
//! * For an explanation of each field, refer to `rfetch --help` .
//! * `rfetch --config-files` outputs the list of configuration files for the current user and platform.
//!
//! ## Validation
//!
//! Some fields have constraints beyond their type:
//!
//! * `buffer_size` must be between 1 KiB and 16 MiB.
//! * `connect_timeout` must be at least 1 second.
//! * `server_root` (server mode) and `client_root` (client mode) must be existing directories.
//!
//! rfetch refuses to start if any of these is violated.

mod structure;
pub use structure::{Configuration, ConfigurationOverrides};

mod sysdefault;
use sysdefault::SystemDefault;

mod manager;
pub use manager::Manager;

mod prettyprint;
pub use prettyprint::DisplayAdapter;

pub(crate) const BASE_CONFIG_FILENAME: &str = "rfetch.toml";

/// Prefix for environment variables which set configuration fields
pub(crate) const ENV_PREFIX: &str = "RFETCH_";
