//! `appd-buildpack extract` — unpack a zip below a directory.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::ArchiveExtractor;
use crate::output::json;

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Zip archive to extract
    pub archive: PathBuf,

    /// Directory to extract into
    pub dest: PathBuf,
}

/// Run `appd-buildpack extract`. Prints every extracted path.
///
/// # Errors
///
/// Returns an error if the archive cannot be opened, an entry escapes
/// `dest`, or a file cannot be written.
pub fn run(app: &AppContext, args: &ExtractArgs) -> Result<ExitCode> {
    let paths = app.fs.extract(&args.archive, &args.dest)?;

    if app.is_json() {
        json::print(&paths)?;
    } else {
        for path in &paths {
            app.output.info(&path.display().to_string());
        }
        app.output.success(&format!("extracted {} entries", paths.len()));
    }
    Ok(ExitCode::SUCCESS)
}
