//! Colored terminal output.
//!
//! Respects the `NO_COLOR` environment variable and the `--color` flag.

use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Resolve `ColorChoice` from CLI flag and environment.
///
/// Priority: `NO_COLOR` env > `--color` flag > auto-detect TTY.
pub fn resolve_color_choice(flag: Option<&str>) -> ColorChoice {
    if std::env::var_os("NO_COLOR").is_some() {
        return ColorChoice::Never;
    }
    match flag {
        Some("always") => ColorChoice::Always,
        Some("never") => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}

/// Styled writer for status lines on stderr.
pub struct StyledOutput {
    stderr: StandardStream,
}

impl StyledOutput {
    pub fn new(choice: ColorChoice) -> Self {
        Self {
            stderr: StandardStream::stderr(choice),
        }
    }

    /// The underlying stream, for rendering diagnostics.
    pub fn stream(&mut self) -> &mut StandardStream {
        &mut self.stderr
    }

    fn write_styled(&mut self, text: &str, color: Option<Color>, bold: bool) {
        let mut spec = ColorSpec::new();
        spec.set_fg(color).set_bold(bold);
        let _ = self.stderr.set_color(&spec);
        let _ = write!(self.stderr, "{}", text);
        let _ = self.stderr.reset();
    }

    /// Green bold text.
    pub fn success(&mut self, text: &str) {
        self.write_styled(text, Some(Color::Green), true);
    }

    /// Red bold text.
    pub fn error(&mut self, text: &str) {
        self.write_styled(text, Some(Color::Red), true);
    }

    /// Yellow bold text.
    pub fn warning(&mut self, text: &str) {
        self.write_styled(text, Some(Color::Yellow), true);
    }

    /// Plain text (no color).
    pub fn plain(&mut self, text: &str) {
        let _ = write!(self.stderr, "{}", text);
    }

    pub fn newline(&mut self) {
        let _ = writeln!(self.stderr);
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// One-line outcome of a link or check run.
pub fn print_summary(out: &mut StyledOutput, classes: usize, errors: usize, warnings: usize) {
    if errors == 0 && warnings == 0 {
        out.plain(&format!("Linked {} class{}: ", classes, if classes == 1 { "" } else { "es" }));
        out.success("no issues found.");
        out.newline();
        return;
    }
    if errors > 0 {
        out.error(&format!("{} error{}", errors, plural(errors)));
    }
    if errors > 0 && warnings > 0 {
        out.plain(", ");
    }
    if warnings > 0 {
        out.warning(&format!("{} warning{}", warnings, plural(warnings)));
    }
    out.newline();
}
