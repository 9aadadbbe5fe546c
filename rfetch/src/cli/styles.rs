// (c) 2026 The rfetch developers
//! Terminal styling
//!
//! Each kind of message has an accessor (e.g. [`error()`]) returning an [`anstyle::Style`]
//! which can be interpolated into `format!` strings; follow the message with [`RESET`].
//! The accessors return a plain style when colours are turned off.

use std::borrow::Cow;
use std::io::IsTerminal as _;

use anstream::ColorChoice;
use anstyle::{AnsiColor, Color, Style};
use clap::builder::styling::Styles;
use serde::Serialize;

const fn coloured(colour: AnsiColor) -> Style {
    Style::new().fg_color(Some(Color::Ansi(colour)))
}

const ERROR: Style = coloured(AnsiColor::Red).bold();
const WARNING: Style = coloured(AnsiColor::Yellow).bold();
const INFO: Style = coloured(AnsiColor::Cyan);
const SUCCESS: Style = coloured(AnsiColor::Green);
const HEADER: Style = coloured(AnsiColor::Yellow).underline();
const PROMPT: Style = Style::new().bold();

/// Ends a styled span. This is [`anstyle::Reset`].
pub use anstyle::Reset as RESET;

/// Styling for `--help` output. clap makes its own decision about colour.
pub(crate) const CLAP_STYLES: Styles = Styles::styled()
    .usage(HEADER)
    .header(HEADER)
    .literal(Style::new().bold())
    .invalid(WARNING)
    .error(ERROR)
    .valid(INFO.bold().underline())
    .placeholder(INFO);

/// Defines an accessor which returns a style only when colours are on
macro_rules! when_colourful {
    ($(#[$meta:meta])* $func:ident => $style:ident) => {
        $(#[$meta])*
        #[must_use]
        pub fn $func() -> Style {
            if use_colours() { $style } else { Style::new() }
        }
    };
}

when_colourful!(
    /// Style for error messages
    error => ERROR
);
when_colourful!(
    /// Style for informational messages
    info => INFO
);
when_colourful!(
    /// Style for reporting a successful operation
    success => SUCCESS
);
when_colourful!(
    /// Style for the interactive prompt
    prompt => PROMPT
);

/// Are terminal colours turned on?
#[must_use]
pub fn use_colours() -> bool {
    console::colors_enabled()
}

/// Terminal colour modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, Serialize, strum::VariantNames)]
#[serde(rename_all = "kebab-case")]
pub enum ColourMode {
    /// Always use colours (aliases: `on`, `yes`)
    #[value(alias = "on", alias = "yes")]
    Always,
    /// Never use colours (aliases: `off`, `no`, `none`)
    #[value(alias = "off", alias = "no", alias = "none")]
    Never,
    /// Use colours when stdout is a terminal, unless the environment says otherwise
    Auto,
}

/// Works out whether to use colours from the environment.
///
/// `NO_COLOR` beats `CLICOLOR_FORCE`, which beats terminal detection.
/// See <https://bixense.com/clicolors/> and <https://no-color.org/>.
pub(crate) fn autodetect_colour() -> bool {
    let is_set = |var: &str| std::env::var_os(var).is_some_and(|v| !v.is_empty());
    if is_set("NO_COLOR") {
        false
    } else if is_set("CLICOLOR_FORCE") {
        true
    } else {
        std::io::stdout().is_terminal()
    }
}

/// Applies a colour mode to everything that writes to the terminal.
///
/// `None` means the same as [`ColourMode::Auto`].
pub fn configure_colours(mode: Option<ColourMode>) {
    let on = match mode.unwrap_or(ColourMode::Auto) {
        ColourMode::Always => true,
        ColourMode::Never => false,
        ColourMode::Auto => autodetect_colour(),
    };
    console::set_colors_enabled(on);
    console::set_colors_enabled_stderr(on);
    let choice = if on {
        ColorChoice::Always
    } else {
        ColorChoice::Never
    };
    choice.write_global();
}

/// Removes escape sequences from a string, unless colours are turned on
pub(crate) fn maybe_strip_color(s: &str) -> Cow<'_, str> {
    if use_colours() {
        Cow::Borrowed(s)
    } else {
        console::strip_ansi_codes(s)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod test {
    use rusty_fork::rusty_fork_test;

    use super::{ColourMode, configure_colours, error, maybe_strip_color, prompt, use_colours};

    const STYLED: &str = "\x1b[1mbold\x1b[0m";

    // colour settings are global
    rusty_fork_test! {
        #[test]
        fn colours_forced_on() {
            configure_colours(Some(ColourMode::Always));
            assert!(use_colours());
            assert_ne!(error(), anstyle::Style::new());
            assert_ne!(prompt(), anstyle::Style::new());
            assert_eq!(maybe_strip_color(STYLED), STYLED);
        }

        #[test]
        fn colours_forced_off() {
            configure_colours(Some(ColourMode::Never));
            assert!(!use_colours());
            assert_eq!(error(), anstyle::Style::new());
            assert_eq!(maybe_strip_color(STYLED), "bold");
        }
    }
}
