//! `appd-buildpack fetch` — download one resource.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::{EnvSource, Fetcher};
use crate::domain::BuildpackConfig;
use crate::output::json;

/// Arguments for the fetch command.
#[derive(Args)]
pub struct FetchArgs {
    /// URL to download
    pub url: String,

    /// Destination file, or existing directory to download into
    pub dest: PathBuf,
}

/// Run `appd-buildpack fetch`.
///
/// # Errors
///
/// Returns an error if the download fails; nothing is left at `dest`.
pub fn run(app: &AppContext, args: &FetchArgs) -> Result<ExitCode> {
    let config = BuildpackConfig::from_vars(app.env.vars())?;
    let fetcher = app.fetcher(config.http_timeout());

    app.output.step(&format!("Downloading {}", args.url));
    let fetched = fetcher.fetch(&args.url, &args.dest)?;

    if app.is_json() {
        json::print(&fetched)?;
    } else {
        app.output.kv("path", &fetched.path.display().to_string());
        app.output.kv("bytes", &fetched.bytes.to_string());
        app.output.kv("sha256", &fetched.sha256);
    }
    Ok(ExitCode::SUCCESS)
}
