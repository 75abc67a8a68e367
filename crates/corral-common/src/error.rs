//! Unified error types for the corral workspace.
//!
//! Setup errors raised inside the isolated child are classified by
//! [`FailureKind`], which also fixes the exit status the child dies with.
//! The parent never sees the child's [`CorralError`] value directly; it
//! rebuilds a [`CorralError::ContainerSetup`] from the report the child
//! sends back before exiting.

use std::fmt;
use std::path::PathBuf;

use nix::errno::Errno;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::SetupPhase;

/// Exit status conventionally used when a command cannot be found.
pub const EXIT_COMMAND_NOT_FOUND: i32 = 127;

/// Exit status used when the child fails outside any classified phase.
pub const EXIT_GENERIC_FAILURE: i32 = 1;

/// Classification of a failed container setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// Namespace creation or hostname assignment failed.
    Namespace,
    /// A container directory could not be created.
    DirectoryCreation,
    /// The image content directory is missing.
    ImageNotFound,
    /// An overlay, proc, sysfs, tmpfs, or devpts mount failed.
    Mount,
    /// A device node or `/dev` symlink could not be created.
    DeviceInit,
    /// The root pivot or old-root detach failed.
    RootSwitch,
    /// The target command could not be executed.
    Exec,
}

impl FailureKind {
    /// Exit status the child terminates with for this kind of failure.
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::DirectoryCreation => 120,
            Self::ImageNotFound => 121,
            Self::Mount => 122,
            Self::DeviceInit => 123,
            Self::RootSwitch => 124,
            Self::Namespace => 125,
            Self::Exec => 126,
        }
    }
}

impl From<SetupPhase> for FailureKind {
    fn from(phase: SetupPhase) -> Self {
        match phase {
            SetupPhase::Hostname => Self::Namespace,
            SetupPhase::Directories => Self::DirectoryCreation,
            SetupPhase::Overlay => Self::Mount,
            SetupPhase::Devices => Self::DeviceInit,
            SetupPhase::RootSwitch => Self::RootSwitch,
            SetupPhase::Exec => Self::Exec,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Namespace => "namespace error",
            Self::DirectoryCreation => "directory creation error",
            Self::ImageNotFound => "image not found",
            Self::Mount => "mount error",
            Self::DeviceInit => "device init error",
            Self::RootSwitch => "root switch error",
            Self::Exec => "exec error",
        };
        f.write_str(name)
    }
}

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum CorralError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A container directory could not be created.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreation {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The image has no materialized content directory.
    #[error("image {image} not found: {path} does not exist")]
    ImageNotFound {
        /// Image reference in `library/image:tag` form.
        image: String,
        /// Expected content directory.
        path: PathBuf,
    },

    /// A `mount(2)` call failed.
    #[error("failed to mount {fstype} at {target}: {source}")]
    Mount {
        /// Filesystem type being mounted.
        fstype: &'static str,
        /// Mount point.
        target: PathBuf,
        /// Kernel error.
        source: Errno,
    },

    /// A device node or symlink under `/dev` could not be created.
    #[error("failed to create device entry {path}: {source}")]
    DeviceInit {
        /// Device node or symlink path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A step of the root switch failed.
    #[error("root switch failed during {step} at {path}: {source}")]
    RootSwitch {
        /// Step that failed (`mkdir`, `pivot_root`, `chdir`, `umount`, `rmdir`).
        step: &'static str,
        /// Path the step operated on.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A namespace operation failed.
    #[error("{operation} failed: {source}")]
    Namespace {
        /// Operation that failed.
        operation: &'static str,
        /// Kernel error.
        source: Errno,
    },

    /// The target command could not be executed.
    #[error("failed to exec {command}: {source}")]
    Exec {
        /// Program that was executed.
        command: String,
        /// Kernel error.
        source: Errno,
    },

    /// The isolated child reported a setup failure before exec.
    #[error("container process {pid} failed during {phase} ({kind}, exit status {exit_code}): {message}")]
    ContainerSetup {
        /// Host PID of the failed child.
        pid: i32,
        /// Phase that failed.
        phase: SetupPhase,
        /// Classification of the failure.
        kind: FailureKind,
        /// Exit status the child terminated with.
        exit_code: i32,
        /// Raw OS error number, if the failure came from a syscall.
        errno: Option<i32>,
        /// Human-readable description from the child.
        message: String,
    },

    /// The container process was killed by a signal instead of exiting.
    #[error("container process {pid} terminated by signal {signal}")]
    ChildSignaled {
        /// Host PID of the child.
        pid: i32,
        /// Name of the terminating signal.
        signal: String,
    },

    /// An image reference could not be parsed.
    #[error("invalid image reference {input:?}: {reason}")]
    InvalidImageReference {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A container id is unusable as a path component or hostname.
    #[error("invalid container id {id:?}: {reason}")]
    InvalidContainerId {
        /// The rejected id.
        id: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl CorralError {
    /// Classifies the error, if it belongs to a container setup phase.
    #[must_use]
    pub const fn kind(&self) -> Option<FailureKind> {
        match self {
            Self::DirectoryCreation { .. } => Some(FailureKind::DirectoryCreation),
            Self::ImageNotFound { .. } => Some(FailureKind::ImageNotFound),
            Self::Mount { .. } => Some(FailureKind::Mount),
            Self::DeviceInit { .. } => Some(FailureKind::DeviceInit),
            Self::RootSwitch { .. } => Some(FailureKind::RootSwitch),
            Self::Namespace { .. } => Some(FailureKind::Namespace),
            Self::Exec { .. } => Some(FailureKind::Exec),
            Self::ContainerSetup { kind, .. } => Some(*kind),
            Self::Io { .. }
            | Self::ChildSignaled { .. }
            | Self::InvalidImageReference { .. }
            | Self::InvalidContainerId { .. }
            | Self::Config { .. }
            | Self::Serialization { .. } => None,
        }
    }

    /// Raw OS error number carried by the error, if any.
    #[must_use]
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Mount { source, .. } | Self::Namespace { source, .. } | Self::Exec { source, .. } => {
                Some(*source as i32)
            }
            Self::Io { source, .. }
            | Self::DirectoryCreation { source, .. }
            | Self::DeviceInit { source, .. }
            | Self::RootSwitch { source, .. } => source.raw_os_error(),
            Self::ContainerSetup { errno, .. } => *errno,
            Self::ImageNotFound { .. }
            | Self::ChildSignaled { .. }
            | Self::InvalidImageReference { .. }
            | Self::InvalidContainerId { .. }
            | Self::Config { .. }
            | Self::Serialization { .. } => None,
        }
    }

    /// Exit status a child terminates with when setup fails with this error.
    ///
    /// A missing executable maps to 127, following the shell convention.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Exec {
                source: Errno::ENOENT,
                ..
            } => EXIT_COMMAND_NOT_FOUND,
            Self::ContainerSetup { exit_code, .. } => *exit_code,
            other => other.kind().map_or(EXIT_GENERIC_FAILURE, FailureKind::exit_code),
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, CorralError>;
