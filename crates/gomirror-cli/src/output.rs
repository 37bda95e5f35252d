//! Colored diagnostic output for the CLI.
//!
//! Uses `termcolor` for cross-platform colored terminal output and
//! respects the `NO_COLOR` environment variable.

use std::io::Write;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Resolve the stderr `ColorChoice` from the environment.
///
/// Priority: `NO_COLOR` env > auto-detect TTY.
pub fn resolve_color_choice() -> ColorChoice {
    if std::env::var_os("NO_COLOR").is_some() {
        return ColorChoice::Never;
    }
    ColorChoice::Auto
}

/// Write a failure diagnostic to stderr, with the heading in red.
pub fn report_error(message: &str) {
    let mut stderr = StandardStream::stderr(resolve_color_choice());

    let mut spec = ColorSpec::new();
    spec.set_fg(Some(Color::Red)).set_bold(true);
    let _ = stderr.set_color(&spec);
    let _ = write!(stderr, "Error running gomirror:");
    let _ = stderr.reset();
    let _ = writeln!(stderr, "\n{message}");
}
