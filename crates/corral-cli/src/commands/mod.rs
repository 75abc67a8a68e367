//! CLI command definitions and dispatch.

pub mod inspect;
pub mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use corral_common::config::RuntimeConfig;
use corral_common::constants::{
    APP_NAME, CONTAINER_ROOT_ENV, DEFAULT_CONTAINER_ROOT, DEFAULT_IMAGE_ROOT, IMAGE_ROOT_ENV,
};

/// corral: run commands in isolated containers built from local images.
#[derive(Parser, Debug)]
#[command(name = APP_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding `{library}_{image}_{tag}` image directories.
    #[arg(long, global = true, env = IMAGE_ROOT_ENV, default_value = DEFAULT_IMAGE_ROOT)]
    pub image_dir: PathBuf,

    /// Directory where per-container directories are created.
    #[arg(long, global = true, env = CONTAINER_ROOT_ENV, default_value = DEFAULT_CONTAINER_ROOT)]
    pub container_dir: PathBuf,
}

impl Cli {
    /// Storage locations selected by the global flags.
    #[must_use]
    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            image_root: self.image_dir.clone(),
            container_root: self.container_dir.clone(),
        }
    }
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a command in a new container and wait for it to exit.
    Run(run::RunArgs),
    /// Show where an image's contents are expected on disk.
    Inspect(inspect::InspectArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = cli.runtime_config();
    match cli.command {
        Command::Run(args) => run::execute(args, config),
        Command::Inspect(args) => inspect::execute(&args, &config),
    }
}
