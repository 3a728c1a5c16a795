//! Terminal styling helpers

use owo_colors::{OwoColorize, Stream, Style};

/// Prefix for robot narration lines
pub const ROBOT: &str = "🤖";

/// Styling shortcuts for terminal output
pub trait Stylize {
    /// Secondary text
    fn muted(&self) -> String;
    /// Warnings
    fn warn(&self) -> String;
    /// Errors and refusals
    fn error(&self) -> String;
    /// Names worth noticing (repos, branches)
    fn accent(&self) -> String;
}

fn paint(text: &str, style: Style) -> String {
    text.if_supports_color(Stream::Stdout, |t| t.style(style))
        .to_string()
}

impl<T: std::fmt::Display + ?Sized> Stylize for T {
    fn muted(&self) -> String {
        paint(&self.to_string(), Style::new().dimmed())
    }

    fn warn(&self) -> String {
        paint(&self.to_string(), Style::new().yellow())
    }

    fn error(&self) -> String {
        paint(&self.to_string(), Style::new().red().bold())
    }

    fn accent(&self) -> String {
        paint(&self.to_string(), Style::new().cyan())
    }
}
