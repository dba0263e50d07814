//! AppDynamics buildpack CLI - installs the Java agent into a droplet

#![cfg_attr(test, allow(clippy::expect_used))]

use std::process::ExitCode;

use appd_buildpack::cli::Cli;
use appd_buildpack::domain::BuildpackError;
use appd_buildpack::domain::config::ENV_BP_DEBUG;
use appd_buildpack::output::json::format_error;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let json = cli.json;
    match cli.run() {
        Ok(code) => code,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            let message = format!("{e:#}");
            let rendered = json
                .then(|| format_error(&message, error_code(&e)).ok())
                .flatten();
            match rendered {
                Some(obj) => println!("{obj}"),
                None => eprintln!("Error: {message}"),
            }
            ExitCode::FAILURE
        }
    }
}

/// Diagnostics go to stderr so they never mix with buildpack output.
/// `RUST_LOG` wins; otherwise `BP_DEBUG` raises the default from `warn`
/// to `debug`.
fn init_tracing() {
    let default = if std::env::var_os(ENV_BP_DEBUG).is_some_and(|v| !v.is_empty()) {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .init();
}

fn error_code(e: &anyhow::Error) -> &'static str {
    e.downcast_ref::<BuildpackError>()
        .map_or("ERROR", BuildpackError::code)
}
