//! Isolated child creation and reaping.
//!
//! The child is created with `clone(2)` so it starts directly inside the
//! requested namespaces. It never returns into the caller's code: it
//! either execs the target command or exits with a [`FailureKind`] status.
//!
//! [`FailureKind`]: corral_common::error::FailureKind

use corral_common::config::RuntimeConfig;
use corral_common::constants::CHILD_STACK_SIZE;
use corral_common::error::{CorralError, Result};
use corral_common::types::ContainerInitParams;
use nix::errno::Errno;
use nix::sched::CloneFlags;
use nix::sys::signal::Signal;
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::Pid;

use crate::context::IsolationContext;
use crate::report::{ReportWriter, SetupReport};

/// How the container process terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Normal exit with the given status.
    Exited(i32),
    /// Killed by a signal.
    Signaled(Signal),
}

impl ExitStatus {
    /// Status in shell convention: signals map to `128 + signo`.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Exited(code) => code,
            Self::Signaled(signal) => 128 + signal as i32,
        }
    }
}

/// Clones a child into fresh namespaces and runs `child` in it.
///
/// The value returned by `child` becomes the child's exit status.
///
/// # Errors
///
/// Returns [`CorralError::Namespace`] if `clone(2)` fails, typically with
/// `EPERM` when the caller lacks `CAP_SYS_ADMIN`.
pub fn spawn_isolated<F>(flags: CloneFlags, mut child: F) -> Result<Pid>
where
    F: FnMut() -> i32,
{
    let mut stack = vec![0_u8; CHILD_STACK_SIZE];
    let cb = Box::new(|| child() as isize);
    // SAFETY: the child gets its own copy of the address space (no
    // CLONE_VM) and `stack` outlives the call in the parent.
    let pid = unsafe { nix::sched::clone(cb, &mut stack, flags, Some(Signal::SIGCHLD as i32)) }
        .map_err(|source| CorralError::Namespace {
            operation: "clone",
            source,
        })?;
    Ok(pid)
}

/// Blocks until `pid` terminates.
///
/// `EINTR` is retried.
///
/// # Errors
///
/// Returns [`CorralError::Namespace`] if `waitpid(2)` fails otherwise.
pub fn wait_for_exit(pid: Pid) -> Result<ExitStatus> {
    loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => return Ok(ExitStatus::Exited(code)),
            Ok(WaitStatus::Signaled(_, signal, _)) => return Ok(ExitStatus::Signaled(signal)),
            Ok(other) => {
                tracing::debug!(?other, "ignoring non-terminal wait status");
            }
            Err(Errno::EINTR) => {}
            Err(source) => {
                return Err(CorralError::Namespace {
                    operation: "waitpid",
                    source,
                });
            }
        }
    }
}

/// Entry point of the cloned child.
///
/// Runs the setup phases and execs. If any phase fails, the failure is
/// written to `report` and its exit status returned.
pub fn child_main(
    params: &ContainerInitParams,
    config: &RuntimeConfig,
    report: &ReportWriter,
) -> i32 {
    let mut ctx = IsolationContext::new(params, config);
    let Err(err) = ctx.run();
    let phase = ctx.phase();
    tracing::error!(id = %params.container_id(), %phase, error = %err, "container setup failed");

    let setup = SetupReport::from_error(phase, &err);
    if let Err(send_err) = report.send(&setup) {
        tracing::error!(error = %send_err, "failed to report setup failure");
    }
    setup.exit_code
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exited_status_keeps_code() {
        assert_eq!(ExitStatus::Exited(0).code(), 0);
        assert_eq!(ExitStatus::Exited(127).code(), 127);
    }

    #[test]
    fn signaled_status_uses_shell_convention() {
        assert_eq!(ExitStatus::Signaled(Signal::SIGKILL).code(), 137);
        assert_eq!(ExitStatus::Signaled(Signal::SIGTERM).code(), 143);
    }

    #[test]
    fn child_without_namespaces_reports_exit_code() {
        let pid = spawn_isolated(CloneFlags::empty(), || 7).unwrap();
        assert_eq!(wait_for_exit(pid).unwrap(), ExitStatus::Exited(7));
    }

    #[test]
    fn waiting_on_a_non_child_fails() {
        let err = wait_for_exit(Pid::from_raw(i32::MAX)).unwrap_err();
        assert!(matches!(
            err,
            CorralError::Namespace {
                operation: "waitpid",
                source: Errno::ECHILD
            }
        ));
    }
}
