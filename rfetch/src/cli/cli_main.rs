//! Main CLI for rfetch
// (c) 2026 The rfetch developers

use std::ffi::OsString;
use std::io::Write as _;
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use clap::Parser as _;
use indicatif::{MultiProgress, ProgressDrawTarget};

use super::args::{CliArgs, MainMode, Parameters};
use crate::{
    cli::styles::{RESET, configure_colours, error, use_colours},
    client::MAX_UPDATE_FPS,
    config::{Configuration, Manager},
    util::{ConsoleSink, setup_tracing, trace_level},
};

/// Main CLI entrypoint
///
/// Call this from `main`, passing the arguments to use.
/// Normally you will call `cli(std::env::args_os())` but you can pass in alternate arguments for CLI testing.
///
/// # Safety
/// - This function may start a tokio runtime and perform work in it.
/// - This function is not safe to call from multi-threaded code.
#[must_use]
pub fn cli<I, T>(args: I) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    cli_inner(args)
        .inspect_err(|e| {
            if crate::util::tracing_is_initialised() {
                tracing::error!("{e:#}");
            } else {
                let _ = writeln!(
                    anstream::stderr(),
                    "{ERROR}Error:{RESET} {e:#}",
                    ERROR = error(),
                );
            }
        })
        .map_or(ExitCode::FAILURE, |success| {
            if success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        })
}

/// Inner CLI logic
///
/// # Return
/// true indicates success. false indicates a failure where the callee has output to stderr.
fn cli_inner<I, T>(args: I) -> Result<bool>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let Some(args) = parse_args(args)? else {
        return Ok(true); // help/version shown; exit
    };
    configure_colours(args.color);

    let mut config_manager = Manager::standard();
    config_manager.apply_overrides(&args.config);

    handle_mode(args.mode(), &config_manager, &args.params)
}

fn parse_args<I, T>(args: I) -> Result<Option<Box<CliArgs>>>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    use clap::error::ErrorKind::{DisplayHelp, DisplayVersion};
    match CliArgs::try_parse_from(args) {
        Ok(args) => Ok(Some(Box::new(args))),
        Err(e) if matches!(e.kind(), DisplayHelp | DisplayVersion) => {
            e.print()?;
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

// MODE HANDLERS ///////////////////////////////////////////////////////////

fn handle_mode(mode: MainMode, config_manager: &Manager, params: &Parameters) -> Result<bool> {
    match mode {
        MainMode::ShowConfigFiles => {
            let mut out = anstream::stdout();
            for file in Manager::config_files() {
                writeln!(out, "{}", file.display())?;
            }
            Ok(true)
        }
        MainMode::ShowConfig => show_config(config_manager),
        MainMode::Server => {
            let config = load_configuration(config_manager)?;
            run_server(&config, params)
        }
        MainMode::Client => {
            let config = load_configuration(config_manager)?;
            run_client(&config, params)
        }
    }
}

fn load_configuration(config_manager: &Manager) -> Result<Configuration> {
    config_manager
        .get::<Configuration>()
        .context("invalid configuration")?
        .validate()
}

fn show_config(config_manager: &Manager) -> Result<bool> {
    write!(anstream::stdout(), "{}", show_config_data(config_manager))?;
    let _ = load_configuration(config_manager)?;
    Ok(true)
}

fn show_config_data(config_manager: &Manager) -> String {
    format!(
        "Configuration:\n{}",
        config_manager.to_display_adapter()
    )
}

#[tokio::main]
async fn run_server(config: &Configuration, params: &Parameters) -> Result<bool> {
    setup_tracing(
        trace_level(params),
        ConsoleSink::Stderr,
        params.log_file.as_deref(),
        config.time_format,
        use_colours(),
    )?;
    crate::server::server_main(config)
        .await
        .context("[Server] failed")?;
    Ok(true)
}

#[tokio::main(flavor = "current_thread")]
async fn run_client(config: &Configuration, params: &Parameters) -> Result<bool> {
    let progress = if params.quiet {
        MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
    } else {
        MultiProgress::with_draw_target(ProgressDrawTarget::stderr_with_hz(MAX_UPDATE_FPS))
    };
    setup_tracing(
        trace_level(params),
        ConsoleSink::Progress(progress.clone()),
        params.log_file.as_deref(),
        config.time_format,
        use_colours(),
    )?;

    // this mode may return false
    crate::client::client_main(config, params, progress).await
}
