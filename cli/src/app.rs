//! Application context — unified state passed to every command handler.
//!
//! Adding a new cross-cutting concern requires only one field change here;
//! command signatures stay the same.

use std::time::Duration;

use crate::application::ports::EnvSource;
use crate::domain::config::debug_enabled;
use crate::infra::env::ProcessEnv;
use crate::infra::fs::LocalFs;
use crate::infra::http::UreqFetcher;
use crate::output::{OutputContext, TerminalReporter, progress};

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Buildpack-style terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode, debug lines).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Process environment.
    pub env: ProcessEnv,
    /// Local filesystem ports.
    pub fs: LocalFs,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// JSON mode silences the step output so stdout carries only the JSON
    /// document. `BP_DEBUG` turns on debug lines.
    #[must_use]
    pub fn new(flags: &OutputFlags) -> Self {
        let env = ProcessEnv;
        let mode = if flags.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };
        let output = OutputContext::new(flags.no_color, flags.quiet || flags.json)
            .with_debug(debug_enabled(env.vars()));
        Self {
            output,
            mode,
            env,
            fs: LocalFs,
        }
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// HTTP fetcher with download progress when stdout is an interactive
    /// terminal.
    #[must_use]
    pub fn fetcher(&self, timeout: Duration) -> UreqFetcher {
        let fetcher = UreqFetcher::new(timeout);
        if self.output.show_progress() {
            fetcher.with_progress(Box::new(progress::download))
        } else {
            fetcher
        }
    }

    /// Staging output reporter for application services.
    #[must_use]
    pub fn reporter(&self) -> TerminalReporter<'_> {
        TerminalReporter::new(&self.output)
    }
}
