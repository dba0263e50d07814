//! `appd-buildpack supply` — install the agent and write the env file.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::{EnvSource, StagingFs};
use crate::application::services::supply::{SupplyPorts, SupplyReport, SupplyRequest, supply};
use crate::domain::BuildpackConfig;
use crate::domain::config::{ENV_FILE_NAME, PROFILE_DIR_NAME, runtime_install_dir};
use crate::output::json;

/// Arguments for the supply command.
#[derive(Args)]
pub struct SupplyArgs {
    /// Application build directory
    pub build_dir: PathBuf,

    /// Directory to extract the agent into [default: <BUILD_DIR>/.appdynamics]
    #[arg(long)]
    pub install_dir: Option<PathBuf>,

    /// Agent directory as seen by the running app [default: $HOME/<install dir
    /// relative to BUILD_DIR>]
    #[arg(long)]
    pub runtime_install_dir: Option<PathBuf>,

    /// Env file to write [default: <BUILD_DIR>/.profile.d/appd.sh]
    #[arg(long)]
    pub env_file: Option<PathBuf>,
}

/// Run `appd-buildpack supply`.
///
/// # Errors
///
/// Returns an error if any fatal step of the supply pipeline fails.
pub fn run(app: &AppContext, args: &SupplyArgs) -> Result<ExitCode> {
    let config = BuildpackConfig::from_vars(app.env.vars())?;
    let install_dir = args
        .install_dir
        .clone()
        .unwrap_or_else(|| args.build_dir.join(&config.install_dir_name));
    let runtime_dir = args
        .runtime_install_dir
        .clone()
        .unwrap_or_else(|| runtime_install_dir(&args.build_dir, &install_dir));
    let env_file = args
        .env_file
        .clone()
        .unwrap_or_else(|| args.build_dir.join(PROFILE_DIR_NAME).join(ENV_FILE_NAME));
    if let Some(parent) = env_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        app.fs.ensure_dirs(&[parent])?;
    }
    let download_dir = tempfile::tempdir().context("creating download directory")?;

    let fetcher = app.fetcher(config.http_timeout());
    let reporter = app.reporter();
    let ports = SupplyPorts {
        fetcher: &fetcher,
        extractor: &app.fs,
        writer: &app.fs,
        fs: &app.fs,
        hasher: &app.fs,
        env: &app.env,
        reporter: &reporter,
    };
    let request = SupplyRequest {
        build_dir: &args.build_dir,
        install_dir: &install_dir,
        runtime_install_dir: Some(&runtime_dir),
        download_dir: download_dir.path(),
        env_file: &env_file,
    };
    let report = supply(&ports, &request)?;
    tracing::info!(
        package = %report.package.display(),
        extracted = report.extracted,
        env_file = %report.env_file.display(),
        "supply finished"
    );

    if app.is_json() {
        json::print(&report)?;
    } else {
        print_summary(app, &report);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_summary(app: &AppContext, report: &SupplyReport) {
    let ctx = &app.output;
    if !report.config_files_skipped.is_empty() {
        ctx.kv("skipped", &report.config_files_skipped.join(", "));
    }
    if report.overrides_copied > 0 {
        ctx.kv("overrides", &report.overrides_copied.to_string());
    }
    ctx.kv("env file", &report.env_file.display().to_string());
}
