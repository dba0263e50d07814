//! CLI argument parsing with clap derive

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, OutputFlags};
use crate::commands;

/// Install the AppDynamics Java agent into an application droplet
#[derive(Parser)]
#[command(
    name = "appd-buildpack",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Exit 0 if the AppDynamics agent should be installed
    Detect(commands::detect::DetectArgs),

    /// Download and extract the agent and write the env file
    Supply(commands::supply::SupplyArgs),

    /// Download a URL to a file or directory
    Fetch(commands::fetch::FetchArgs),

    /// Extract a zip archive into a directory
    Extract(commands::extract::ExtractArgs),

    /// Write an agent env file from NAME=VALUE pairs
    #[command(name = "write-env")]
    WriteEnv(commands::write_env::WriteEnvArgs),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub fn run(self) -> Result<ExitCode> {
        let Cli {
            no_color,
            quiet,
            json,
            command,
        } = self;
        let app = AppContext::new(&OutputFlags {
            no_color,
            quiet,
            json,
        });
        match command {
            Command::Version => commands::version::run(&app),
            Command::Detect(args) => commands::detect::run(&app, &args),
            Command::Supply(args) => commands::supply::run(&app, &args),
            Command::Fetch(args) => commands::fetch::run(&app, &args),
            Command::Extract(args) => commands::extract::run(&app, &args),
            Command::WriteEnv(args) => commands::write_env::run(&app, &args),
        }
    }
}
