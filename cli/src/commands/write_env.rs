//! `appd-buildpack write-env` — write an env file from explicit variables.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::EnvFileWriter;
use crate::domain::EnvVarSet;
use crate::output::json;

/// Arguments for the write-env command.
#[derive(Args)]
pub struct WriteEnvArgs {
    /// Agent install directory referenced by `-javaagent`
    pub install_dir: PathBuf,

    /// Env file to write
    pub env_file: PathBuf,

    /// Node name prefix for the node-name-reuse policy
    #[arg(long)]
    pub prefix: String,

    /// Variables to export, as NAME=VALUE; values are written literally
    #[arg(value_parser = parse_assignment)]
    pub vars: Vec<(String, String)>,
}

/// Split `NAME=VALUE` at the first `=`. The value may be empty.
///
/// # Errors
///
/// Returns an error if there is no `=` or the name is empty.
pub fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got {raw:?}")),
    }
}

/// Run `appd-buildpack write-env`. A repeated name keeps its last value.
///
/// # Errors
///
/// Returns an error if a variable is invalid or the file cannot be written.
pub fn run(app: &AppContext, args: &WriteEnvArgs) -> Result<ExitCode> {
    let vars: EnvVarSet = args.vars.iter().cloned().collect();
    app.fs
        .write_env_file(&vars, &args.install_dir, &args.env_file, &args.prefix)?;

    if app.is_json() {
        json::print(&serde_json::json!({
            "env_file": args.env_file,
            "variables": vars.len(),
        }))?;
    } else {
        app.output
            .success(&format!("wrote {} ({} variables)", args.env_file.display(), vars.len()));
    }
    Ok(ExitCode::SUCCESS)
}
