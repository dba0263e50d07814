//! `appd-buildpack detect` — decide whether the buildpack applies.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::detect::detect;
use crate::output::json;

/// Arguments for the detect command.
#[derive(Args)]
pub struct DetectArgs {
    /// Application build directory
    pub build_dir: PathBuf,
}

/// Run `appd-buildpack detect`. Exits 0 when detected, 1 otherwise.
///
/// # Errors
///
/// Returns an error if the settings cannot be parsed or the vendor
/// directory cannot be read.
pub fn run(app: &AppContext, args: &DetectArgs) -> Result<ExitCode> {
    let detection = detect(&app.fs, &app.env, &args.build_dir)?;
    tracing::debug!(?detection, build_dir = %args.build_dir.display(), "detect finished");

    if app.is_json() {
        json::print(&serde_json::json!({
            "detected": detection.is_some(),
            "reason": detection.as_ref().map(|d| d.describe()),
        }))?;
    } else if let Some(d) = &detection {
        app.output.step(&format!("AppDynamics detected: {}", d.describe()));
    } else {
        app.output.info("no AppDynamics service binding or agent package found");
    }

    Ok(if detection.is_some() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
