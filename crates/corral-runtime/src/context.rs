//! Setup sequence executed inside the isolated child.
//!
//! Each phase's postcondition is the next phase's precondition, so they run
//! strictly in [`SetupPhase`] order and the context records the phase it is
//! in. On failure the child reads [`IsolationContext::phase`] to report
//! where it stopped.

use std::convert::Infallible;
use std::ffi::CString;

use corral_common::config::RuntimeConfig;
use corral_common::error::{CorralError, Result};
use corral_common::types::{ContainerDirectories, ContainerInitParams, SetupPhase};
use corral_core::filesystem::{devices, directories, overlayfs, pivot_root};
use corral_core::namespace::uts;
use nix::errno::Errno;

/// Per-child state threaded through the setup phases.
#[derive(Debug)]
pub struct IsolationContext<'a> {
    params: &'a ContainerInitParams,
    config: &'a RuntimeConfig,
    phase: SetupPhase,
    dirs: Option<ContainerDirectories>,
}

impl<'a> IsolationContext<'a> {
    /// Creates a context positioned before the first phase.
    #[must_use]
    pub const fn new(params: &'a ContainerInitParams, config: &'a RuntimeConfig) -> Self {
        Self {
            params,
            config,
            phase: SetupPhase::Hostname,
            dirs: None,
        }
    }

    /// Phase currently running, or the one that failed.
    #[must_use]
    pub const fn phase(&self) -> SetupPhase {
        self.phase
    }

    /// Runs every phase and replaces the process image.
    ///
    /// Only returns on failure.
    ///
    /// # Errors
    ///
    /// Returns the error of the first phase that fails.
    pub fn run(&mut self) -> Result<Infallible> {
        self.set_hostname()?;
        self.create_directories()?;
        self.mount_root()?;
        self.initialize_devices()?;
        self.switch_root()?;
        self.exec()
    }

    fn enter(&mut self, phase: SetupPhase) {
        self.phase = phase;
        tracing::debug!(id = %self.params.container_id(), %phase, "entering setup phase");
    }

    fn dirs(&self) -> Result<&ContainerDirectories> {
        self.dirs.as_ref().ok_or_else(|| CorralError::Config {
            message: format!("phase {} ran before directories were created", self.phase),
        })
    }

    fn set_hostname(&mut self) -> Result<()> {
        self.enter(SetupPhase::Hostname);
        uts::set_hostname(self.params.container_id())
    }

    fn create_directories(&mut self) -> Result<()> {
        self.enter(SetupPhase::Directories);
        let dirs = directories::create_container_directories(
            &self.config.container_root,
            self.params.container_id(),
        )?;
        self.dirs = Some(dirs);
        Ok(())
    }

    fn mount_root(&mut self) -> Result<()> {
        self.enter(SetupPhase::Overlay);
        let dirs = self.dirs()?;
        let _ = overlayfs::mount_image_root(self.params.image(), &self.config.image_root, dirs)?;
        Ok(())
    }

    fn initialize_devices(&mut self) -> Result<()> {
        self.enter(SetupPhase::Devices);
        devices::initialize_devices(&self.dirs()?.root_dir)
    }

    fn switch_root(&mut self) -> Result<()> {
        self.enter(SetupPhase::RootSwitch);
        pivot_root::switch_root(&self.dirs()?.root_dir)
    }

    fn exec(&mut self) -> Result<Infallible> {
        self.enter(SetupPhase::Exec);
        let command = self.params.command();
        let program = command.first().cloned().unwrap_or_default();
        let argv = to_cstrings(command).map_err(|source| CorralError::Exec {
            command: program.clone(),
            source,
        })?;
        let Some(file) = argv.first() else {
            return Err(CorralError::Exec {
                command: program,
                source: Errno::EINVAL,
            });
        };
        tracing::info!(id = %self.params.container_id(), command = ?command, "executing container command");
        nix::unistd::execvp(file, &argv).map_err(|source| CorralError::Exec {
            command: program,
            source,
        })
    }
}

fn to_cstrings(args: &[String]) -> std::result::Result<Vec<CString>, Errno> {
    args.iter()
        .map(|arg| CString::new(arg.as_bytes()).map_err(|_| Errno::EINVAL))
        .collect()
}
