//! Command Line Interface for rfetch
// (c) 2026 The rfetch developers
mod args;
pub(crate) use args::{CliArgs, Parameters};
mod cli_main;
pub mod styles;
pub use cli_main::cli;
