//! Configuration structure
// (c) 2026 The rfetch developers

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::Result;
use human_repr::HumanCount as _;
use serde::{Deserialize, Serialize};
use struct_field_names_as_array::FieldNamesAsSlice;

use crate::{
    cli::styles::{RESET, info},
    util::{AddressFamily, TimeFormat},
};

/// Smallest transfer buffer we accept
pub(crate) const MINIMUM_BUFFER_SIZE: usize = 1024;
/// Largest transfer buffer we accept
pub(crate) const MAXIMUM_BUFFER_SIZE: usize = 16 * 1024 * 1024;

/// The set of configurable options supported by rfetch.
///
/// ### Configuration files
///
/// Files are in TOML. Field names are as below, in `snake_case`:
///
/// ```toml
/// port = 23657
/// server_root = "/srv/files"
/// buffer_size = 65536
/// ```
///
/// [More details about the configuration mechanism](crate::config).
///
/// ### Command line
///
/// All configurable options may be used on the command line, in kebab-case.
/// See [`ConfigurationOverrides`].
///
/// ### Developer notes
/// There is no `default()`.
/// You can access rfetch's hard-wired configuration defaults through [`Configuration::system_default()`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, FieldNamesAsSlice)]
pub struct Configuration {
    // SERVER ======================================================================================
    /// The TCP port the server listens on
    pub port: u16,
    /// The local address the server binds to
    pub bind_address: IpAddr,
    /// The directory whose contents the server offers.
    /// Requested paths are resolved beneath it and may not escape it.
    pub server_root: PathBuf,

    // CLIENT ======================================================================================
    /// The directory beneath which the client writes the files it fetches
    pub client_root: PathBuf,
    /// Restricts the address family used when the client looks up a server name
    pub address_family: AddressFamily,
    /// Client connection timeout, in seconds
    pub connect_timeout: u16,

    // COMMON ======================================================================================
    /// Size of the buffer used to move file data, in bytes
    pub buffer_size: usize,
    /// The time format to use when printing log messages
    pub time_format: TimeFormat,
}

static SYSTEM_DEFAULT_CONFIG: LazyLock<Configuration> = LazyLock::new(|| Configuration {
    port: 23657,
    bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
    server_root: PathBuf::from("."),
    client_root: PathBuf::from("."),
    address_family: AddressFamily::Any,
    connect_timeout: 10,
    buffer_size: 100 * 1024,
    time_format: TimeFormat::Local,
});

impl Configuration {
    /// Returns the system default settings
    #[must_use]
    pub fn system_default() -> &'static Self {
        &SYSTEM_DEFAULT_CONFIG
    }

    /// Connection timeout, as a Duration
    #[must_use]
    pub fn connect_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.connect_timeout.into())
    }

    /// Performs additional validation checks on a configuration object
    pub fn try_validate(&self) -> Result<()> {
        if !(MINIMUM_BUFFER_SIZE..=MAXIMUM_BUFFER_SIZE).contains(&self.buffer_size) {
            anyhow::bail!(
                "The buffer size ({INFO}buffer_size {val}{RESET}) must be between {min} and {max}",
                val = self.buffer_size,
                min = MINIMUM_BUFFER_SIZE.human_count_bytes(),
                max = MAXIMUM_BUFFER_SIZE.human_count_bytes(),
                INFO = info(),
            );
        }
        if self.connect_timeout == 0 {
            anyhow::bail!(
                "The connection timeout ({INFO}connect_timeout{RESET}) must be at least 1 second",
                INFO = info(),
            );
        }
        Ok(())
    }

    /// Performs additional validation checks on the configuration.
    pub fn validate(self) -> Result<Self> {
        self.try_validate()?;
        Ok(self)
    }
}

/// Command-line overrides for [`Configuration`].
///
/// Every field is optional; anything not given on the command line falls through
/// to configuration files, the environment and the system defaults.
#[derive(Debug, Clone, Default, PartialEq, clap::Args, Serialize)]
pub struct ConfigurationOverrides {
    /// The TCP port to listen on (server) [default: 23657]
    #[arg(short = 'p', long, value_name = "PORT", help_heading("Server"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// The local address to listen on (server) [default: 0.0.0.0]
    #[arg(long, value_name = "ADDR", help_heading("Server"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_address: Option<IpAddr>,

    /// The directory to serve files from (server) [default: current directory]
    #[arg(long, value_name = "DIR", help_heading("Server"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_root: Option<PathBuf>,

    /// The directory to write fetched files beneath (client) [default: current directory]
    #[arg(long, value_name = "DIR", help_heading("Client"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_root: Option<PathBuf>,

    /// Forces use of a particular IP version when looking up a server (client) [default: any]
    #[arg(long, value_name = "FAMILY", help_heading("Client"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_family: Option<AddressFamily>,

    /// Connection timeout in seconds (client) [default: 10]
    #[arg(long, value_name = "SEC", help_heading("Client"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<u16>,

    /// Transfer buffer size in bytes [default: 102400]
    #[arg(long, value_name = "BYTES", help_heading("Tuning"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_size: Option<usize>,

    /// The time format to use when printing messages to the console or to file
    /// [default: local]
    #[arg(
        short = 'T',
        long,
        value_name("FORMAT"),
        help_heading("Output"),
        next_line_help(true)
    )]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_format: Option<TimeFormat>,
}

impl figment::Provider for ConfigurationOverrides {
    fn metadata(&self) -> figment::Metadata {
        figment::Metadata::named("command line")
    }

    fn data(
        &self,
    ) -> std::result::Result<
        figment::value::Map<figment::Profile, figment::value::Dict>,
        figment::Error,
    > {
        figment::providers::Serialized::defaults(self).data()
    }
}
