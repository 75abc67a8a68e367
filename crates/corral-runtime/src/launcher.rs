//! Container launch entry point.

use corral_common::config::RuntimeConfig;
use corral_common::error::{CorralError, Result};
use corral_common::types::ContainerInitParams;
use corral_core::namespace::{NamespaceConfig, mount};

use crate::process::{self, ExitStatus};
use crate::report::{self, SetupReport};

/// Result of a container that reached its target command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchOutcome {
    /// Host PID of the container process.
    pub pid: i32,
    /// How the container process terminated.
    pub status: ExitStatus,
}

impl LaunchOutcome {
    /// Exit status in shell convention.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        self.status.code()
    }

    /// Converts a signal termination into [`CorralError::ChildSignaled`].
    ///
    /// # Errors
    ///
    /// Returns the error when the process was killed by a signal.
    pub fn into_exited(self) -> Result<i32> {
        match self.status {
            ExitStatus::Exited(code) => Ok(code),
            ExitStatus::Signaled(signal) => Err(CorralError::ChildSignaled {
                pid: self.pid,
                signal: signal.as_str().to_owned(),
            }),
        }
    }
}

/// Launches containers from images stored under a [`RuntimeConfig`].
#[derive(Debug, Clone)]
pub struct Launcher {
    config: RuntimeConfig,
    namespaces: NamespaceConfig,
}

impl Launcher {
    /// Creates a launcher isolating PID, mount, UTS, and network namespaces.
    #[must_use]
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            namespaces: NamespaceConfig::default(),
        }
    }

    /// Runs `params.command()` in a fresh container and waits for it.
    ///
    /// Blocks until the container process exits. Concurrent calls from
    /// separate threads launch independent containers.
    ///
    /// # Errors
    ///
    /// - [`CorralError::Config`] if the caller is not root.
    /// - [`CorralError::Mount`] if the host root cannot be made private.
    /// - [`CorralError::Namespace`] if the child cannot be cloned or reaped.
    /// - [`CorralError::ContainerSetup`] if the child failed before exec.
    pub fn launch(&self, params: &ContainerInitParams) -> Result<LaunchOutcome> {
        if !nix::unistd::geteuid().is_root() {
            return Err(CorralError::Config {
                message: "launching a container requires root privileges".into(),
            });
        }

        mount::make_root_private()?;

        let (reader, writer) = report::channel()?;
        let pid = process::spawn_isolated(self.namespaces.to_clone_flags(), || {
            process::child_main(params, &self.config, &writer)
        })?;
        drop(writer);

        tracing::info!(
            id = %params.container_id(),
            image = %params.image(),
            pid = pid.as_raw(),
            "container process started"
        );

        // Read before reaping: EOF arrives at exec or exit, whichever first.
        let received = reader.receive();
        let status = process::wait_for_exit(pid)?;

        if let Some(report) = received? {
            return Err(setup_error(pid.as_raw(), report));
        }

        let outcome = LaunchOutcome {
            pid: pid.as_raw(),
            status,
        };
        tracing::info!(
            id = %params.container_id(),
            pid = outcome.pid,
            code = outcome.exit_code(),
            "container process exited"
        );
        Ok(outcome)
    }
}

fn setup_error(pid: i32, report: SetupReport) -> CorralError {
    CorralError::ContainerSetup {
        pid,
        phase: report.phase,
        kind: report.kind,
        exit_code: report.exit_code,
        errno: report.errno,
        message: report.message,
    }
}
