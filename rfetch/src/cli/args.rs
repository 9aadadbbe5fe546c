//! Command line argument definitions
// (c) 2026 The rfetch developers

use std::path::PathBuf;

use clap::{Args, Parser};

use super::styles::{CLAP_STYLES, ColourMode};
use crate::config::ConfigurationOverrides;

/// Options which may be provided on the command line, but are not persistent configuration options.
#[derive(Debug, Args, Clone, Default)]
pub struct Parameters {
    /// Enable detailed debug output
    ///
    /// This has the same effect as setting `RUST_LOG=rfetch=debug` in the environment.
    /// If present, `RUST_LOG` overrides this option.
    #[arg(short, long, action, help_heading("Debug"), display_order(0))]
    pub debug: bool,

    /// Log to a file
    ///
    /// By default the log receives everything printed to stderr.
    /// To override this behaviour, set the environment variable `RUST_LOG_FILE_DETAIL` (same semantics as `RUST_LOG`).
    #[arg(
        short('l'),
        long,
        action,
        value_name("FILE"),
        help_heading("Output"),
        next_line_help(true),
        display_order(0)
    )]
    pub log_file: Option<PathBuf>,

    /// Quiet mode
    ///
    /// Switches off progress display and transfer summaries; reports only errors
    #[arg(short, long, action, conflicts_with("debug"), help_heading("Output"))]
    pub quiet: bool,
}

/// Minimal remote file fetch utility
///
/// Without `--server`, starts an interactive client. Type `HELP` at the prompt for a list of commands.
#[derive(Debug, Parser, Clone)]
#[command(
    author,
    version,
    about,
    styles = CLAP_STYLES,
    infer_long_args(true),
    max_term_width(100)
)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct CliArgs {
    // MODE SELECTION ======================================================================
    /// Runs the server, serving files from `--server-root` on `--port`
    #[arg(long, action, help_heading("Modes"), display_order(0))]
    pub server: bool,

    /// Outputs the configuration, then exits.
    ///
    /// This shows every configurable option, its current value, and where the value came from.
    #[arg(
        long,
        action,
        help_heading("Configuration"),
        conflicts_with_all(["server", "config_files"]),
        display_order(0)
    )]
    pub show_config: bool,

    /// Outputs the paths to configuration file(s), then exits
    #[arg(
        long,
        action,
        help_heading("Configuration"),
        conflicts_with("server"),
        display_order(0)
    )]
    pub config_files: bool,

    /// Colour mode for console output (default: auto)
    ///
    /// Passing `--color` without a value is equivalent to `--color always`.
    ///
    /// rfetch also supports the `CLICOLOR`, `CLICOLOR_FORCE` and `NO_COLOR` environment variables.
    /// See [https://bixense.com/clicolors/](https://bixense.com/clicolors/) for more details.
    #[arg(
        long,
        alias("colour"),
        default_missing_value("always"),
        num_args(0..=1),
        value_name("mode"),
        help_heading("Output")
    )]
    pub color: Option<ColourMode>,

    // PARAMETERS ==========================================================================
    #[command(flatten)]
    pub params: Parameters,

    // CONFIGURATION =======================================================================
    #[command(flatten)]
    pub config: ConfigurationOverrides,
}

/// What are we doing this run?
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MainMode {
    Server,
    Client,
    ShowConfig,
    ShowConfigFiles,
}

impl CliArgs {
    /// Works out the mode from the options given
    pub(crate) fn mode(&self) -> MainMode {
        if self.show_config {
            MainMode::ShowConfig
        } else if self.config_files {
            MainMode::ShowConfigFiles
        } else if self.server {
            MainMode::Server
        } else {
            MainMode::Client
        }
    }
}
