//! `corral run`: launch a container and wait for it.

use anyhow::Context;
use clap::Args;
use corral_common::config::RuntimeConfig;
use corral_common::error::CorralError;
use corral_common::types::{ContainerId, ContainerInitParams, ImageReference};
use corral_runtime::{LaunchOutcome, Launcher};

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Image reference: `[library/]image[:tag]`.
    pub image: String,

    /// Container id (also used as hostname). Generated when omitted.
    #[arg(long)]
    pub id: Option<String>,

    /// Command and arguments to execute inside the container.
    #[arg(trailing_var_arg = true, required = true)]
    pub command: Vec<String>,
}

/// Executes the `run` command.
///
/// Terminates the process with the container's exit status, or with the
/// setup failure's status when the container never reached its command.
///
/// # Errors
///
/// Returns an error if the arguments are invalid or the launch fails
/// before a child exists.
pub fn execute(args: RunArgs, config: RuntimeConfig) -> anyhow::Result<()> {
    let image: ImageReference = args.image.parse()?;
    let id = match args.id {
        Some(id) => ContainerId::parse(id)?,
        None => ContainerId::generate(),
    };
    let params = ContainerInitParams::new(image, args.command, id)?;

    let launcher = Launcher::new(config);
    let code = match launcher.launch(&params) {
        Ok(outcome) => {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("{} exited with status {}", outcome.pid, outcome.exit_code());
            }
            exit_code(outcome)
        }
        Err(err @ CorralError::ContainerSetup { .. }) => {
            tracing::error!(error = %err, "container setup failed");
            err.exit_code()
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to launch {}", params.image()));
        }
    };

    std::process::exit(code);
}

/// Shell-convention status for `outcome`, logging the signal name when the
/// container process was killed.
fn exit_code(outcome: LaunchOutcome) -> i32 {
    let code = outcome.exit_code();
    match outcome.into_exited() {
        Ok(status) => status,
        Err(err) => {
            tracing::warn!(error = %err, code, "container process killed");
            code
        }
    }
}

#[cfg(test)]
mod tests {
    use corral_runtime::ExitStatus;
    use nix::sys::signal::Signal;

    use super::*;

    #[test]
    fn exited_outcome_keeps_its_status() {
        let outcome = LaunchOutcome {
            pid: 10,
            status: ExitStatus::Exited(3),
        };
        assert_eq!(exit_code(outcome), 3);
    }

    #[test]
    fn killed_outcome_maps_to_128_plus_signal() {
        let outcome = LaunchOutcome {
            pid: 10,
            status: ExitStatus::Signaled(Signal::SIGTERM),
        };
        assert_eq!(exit_code(outcome), 143);
    }
}
