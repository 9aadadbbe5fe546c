//! Log output setup
// (c) 2026 The rfetch developers

use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Context as _;
use indicatif::MultiProgress;
use serde::{Deserialize, Serialize, de};
use strum::VariantNames as _;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::{ChronoLocal, ChronoUtc, FormatTime};
use tracing_subscriber::{EnvFilter, Layer, Registry, prelude::*};

use crate::cli::styles::maybe_strip_color;

static TRACING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Filter directives for the console, e.g. `RUST_LOG=rfetch=trace`
const CONSOLE_FILTER_VAR: &str = "RUST_LOG";
/// Filter directives for the log file, if different from the console
const FILE_FILTER_VAR: &str = "RUST_LOG_FILE_DETAIL";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Works out the default log level from the command line
pub(crate) fn trace_level(params: &crate::cli::Parameters) -> &'static str {
    match (params.debug, params.quiet) {
        (true, _) => "debug",
        (false, true) => "error",
        (false, false) => "info",
    }
}

/// Selects the format of time stamps in output messages
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Eq,
    PartialEq,
    strum::Display,
    strum::EnumString,
    strum::VariantNames,
    clap::ValueEnum,
    Serialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "kebab-case")]
pub enum TimeFormat {
    /// Local time, as "year-month-day HH:MM:SS"
    #[default]
    Local,
    /// UTC, as "year-month-day HH:MM:SS"
    Utc,
    /// Local time in [RFC 3339](https://datatracker.ietf.org/doc/html/rfc3339) format,
    /// e.g. `2010-03-14T18:32:03+01:00`
    Rfc3339,
}

// Config files and environment variables are forgiving about case
impl<'de> Deserialize<'de> for TimeFormat {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.to_ascii_lowercase()
            .parse()
            .map_err(|_| de::Error::unknown_variant(&s, TimeFormat::VARIANTS))
    }
}

/// Time stamp writer for a [`TimeFormat`]
enum Timestamp {
    Local(ChronoLocal),
    Utc(ChronoUtc),
}

impl From<TimeFormat> for Timestamp {
    fn from(format: TimeFormat) -> Self {
        match format {
            TimeFormat::Local => Timestamp::Local(ChronoLocal::new("%Y-%m-%d %H:%M:%SL".into())),
            TimeFormat::Utc => Timestamp::Utc(ChronoUtc::new("%Y-%m-%d %H:%M:%SZ".into())),
            TimeFormat::Rfc3339 => Timestamp::Local(ChronoLocal::rfc_3339()),
        }
    }
}

impl FormatTime for Timestamp {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        match self {
            Timestamp::Local(t) => t.format_time(w),
            Timestamp::Utc(t) => t.format_time(w),
        }
    }
}

/// Where console log output goes
#[derive(Debug)]
pub(crate) enum ConsoleSink {
    /// Straight to stderr
    Stderr,
    /// Above the progress bars of a [`MultiProgress`]
    Progress(MultiProgress),
    /// Nowhere
    #[allow(dead_code)] // used by tests
    Off,
}

/// Picks the filter to use for an output.
///
/// If the environment variable `var` is set, it wins, and we also show event targets
/// because the user may have asked for events from other crates.
/// Otherwise we log our own events at `level`.
fn choose_filter(var: &str, level: &str) -> anyhow::Result<(EnvFilter, bool)> {
    match std::env::var(var) {
        Ok(directives) => {
            let filter = EnvFilter::try_new(&directives).with_context(|| {
                format!("{var}={directives:?} (set in environment) was not understood")
            })?;
            Ok((filter, true))
        }
        Err(_) => Ok((EnvFilter::try_new(format!("rfetch={level}"))?, false)),
    }
}

fn output_layer<W>(
    writer: W,
    filter: EnvFilter,
    show_target: bool,
    time_format: TimeFormat,
    ansi: bool,
) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .compact()
        .with_target(show_target)
        .with_ansi(ansi)
        .with_timer(Timestamp::from(time_format))
        .with_writer(writer)
        .with_filter(filter)
        .boxed()
}

fn build_layers(
    level: &str,
    console: ConsoleSink,
    log_file: Option<&Path>,
    time_format: TimeFormat,
    colour: bool,
) -> anyhow::Result<Vec<BoxedLayer>> {
    let mut layers = Vec::new();

    let (filter, from_env) = choose_filter(CONSOLE_FILTER_VAR, level)?;
    match console {
        ConsoleSink::Off => (),
        ConsoleSink::Stderr => layers.push(output_layer(
            std::io::stderr,
            filter,
            from_env,
            time_format,
            colour,
        )),
        ConsoleSink::Progress(display) => layers.push(output_layer(
            Mutex::new(ProgressLines(display)),
            filter,
            from_env,
            time_format,
            colour,
        )),
    }

    if let Some(path) = log_file {
        let file = File::create(path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        let var = if std::env::var_os(FILE_FILTER_VAR).is_some() {
            FILE_FILTER_VAR
        } else {
            CONSOLE_FILTER_VAR
        };
        let (filter, from_env) = choose_filter(var, level)?;
        layers.push(output_layer(Arc::new(file), filter, from_env, time_format, false));
    }
    Ok(layers)
}

/// Sets up log output to the console and, optionally, to a file.
///
/// By default only our own events are logged, at `level`.
/// The `RUST_LOG` environment variable overrides this; see
/// <https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html>.
/// `RUST_LOG_FILE_DETAIL`, if set, applies to the log file instead.
///
/// Logging can only be set up once per process. Later calls log a warning and do nothing.
///
/// If this fails, nothing has been set up; the caller must report the error some other way.
pub(crate) fn setup(
    level: &str,
    console: ConsoleSink,
    log_file: Option<&Path>,
    time_format: TimeFormat,
    colour: bool,
) -> anyhow::Result<()> {
    if is_initialized() {
        tracing::warn!("logging is already set up; ignoring second setup");
        return Ok(());
    }
    let layers = build_layers(level, console, log_file, time_format, colour)?;
    if TRACING_INITIALIZED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }
    tracing_subscriber::registry().with(layers).init();
    Ok(())
}

/// Has logging been set up?
pub(crate) fn is_initialized() -> bool {
    TRACING_INITIALIZED.load(Ordering::SeqCst)
}

/// Routes log lines above the progress bars, so they do not tear the display
struct ProgressLines(MultiProgress);

impl Write for ProgressLines {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        let line = maybe_strip_color(text.trim_end_matches('\n'));
        if self.0.is_hidden() {
            eprintln!("{line}");
        } else {
            self.0.println(line)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
