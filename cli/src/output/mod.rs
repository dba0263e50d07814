//! Output formatting module
//!
//! Staging output follows the buildpack convention: top-level steps start
//! with `-----> ` and details are indented to line up beneath them.

pub mod json;
pub mod progress;
pub mod reporter;
pub mod styles;

use console::Term;
use owo_colors::OwoColorize as _;
pub use reporter::TerminalReporter;
pub use styles::Styles;

/// Marker for a top-level staging step.
pub const STEP_MARKER: &str = "----->";
/// Indentation aligning detail lines under the step text.
pub const DETAIL_INDENT: &str = "       ";

/// Output context carrying styling and terminal state.
pub struct OutputContext {
    /// Stylesheet for colored output.
    pub styles: Styles,
    /// Whether stdout is a TTY.
    pub is_tty: bool,
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether debug lines are shown (`BP_DEBUG`).
    pub debug: bool,
}

impl OutputContext {
    /// Create output context based on CLI flags and environment.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let is_tty = Term::stdout().is_term();
        let use_colors = !no_color && is_tty && std::env::var("NO_COLOR").is_err();

        let mut styles = Styles::default();
        if use_colors {
            styles.colorize();
        }

        Self {
            styles,
            is_tty,
            quiet,
            debug: false,
        }
    }

    /// Enable or disable debug lines.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Check if progress indicators should be shown.
    #[must_use]
    pub fn show_progress(&self) -> bool {
        self.is_tty && !self.quiet
    }

    /// `-----> message`
    #[must_use]
    pub fn format_step(&self, msg: &str) -> String {
        format!("{} {msg}", STEP_MARKER.style(self.styles.step))
    }

    /// Indented detail line.
    #[must_use]
    pub fn format_info(&self, msg: &str) -> String {
        format!("{DETAIL_INDENT}{msg}")
    }

    /// Indented warning line.
    #[must_use]
    pub fn format_warn(&self, msg: &str) -> String {
        format!("{DETAIL_INDENT}{} {msg}", "**WARNING**".style(self.styles.warning))
    }

    /// Print a step header. Suppressed when `quiet`.
    pub fn step(&self, msg: &str) {
        if !self.quiet {
            println!("{}", self.format_step(msg));
        }
    }

    /// Print an indented detail line. Suppressed when `quiet`.
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("{}", self.format_info(msg));
        }
    }

    /// Print a success message prefixed with `✓`. Suppressed when `quiet`.
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("{DETAIL_INDENT}{} {msg}", "✓".style(self.styles.success));
        }
    }

    /// Print a warning. Suppressed when `quiet`.
    pub fn warn(&self, msg: &str) {
        if !self.quiet {
            println!("{}", self.format_warn(msg));
        }
    }

    /// Print a dimmed line when debug output is enabled.
    pub fn debug(&self, msg: &str) {
        if self.debug && !self.quiet {
            println!("{DETAIL_INDENT}{}", msg.style(self.styles.dim));
        }
    }

    /// Print a key-value pair with the key dimmed. Suppressed when `quiet`.
    pub fn kv(&self, key: &str, value: &str) {
        if !self.quiet {
            println!("{DETAIL_INDENT}{}  {value}", key.style(self.styles.dim));
        }
    }
}
