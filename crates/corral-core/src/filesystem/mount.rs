//! Pseudo-filesystem mounts inside the container root.
//!
//! Handles `/proc`, `/sys`, `/dev`, and `/dev/pts`. Targets are computed
//! against the not-yet-pivoted root, so these mounts must happen before
//! [`switch_root`](super::pivot_root::switch_root).

use std::path::Path;

use corral_common::error::{CorralError, Result};
use nix::mount::{MsFlags, mount};

/// One pseudo-filesystem mounted under the container root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemMount {
    /// Mount source (informational for pseudo filesystems).
    pub source: &'static str,
    /// Mount point relative to the container root.
    pub target: &'static str,
    /// Filesystem type passed to `mount(2)`.
    pub fstype: &'static str,
    /// Mount flags.
    pub flags: MsFlags,
    /// Filesystem-specific options.
    pub data: Option<&'static str>,
}

/// Pseudo-filesystems in mount order. `dev/pts` lives on the `dev` tmpfs,
/// so it must follow it.
#[must_use]
pub fn system_mounts() -> [SystemMount; 4] {
    [
        SystemMount {
            source: "proc",
            target: "proc",
            fstype: "proc",
            flags: MsFlags::empty(),
            data: None,
        },
        SystemMount {
            source: "sysfs",
            target: "sys",
            fstype: "sysfs",
            flags: MsFlags::empty(),
            data: None,
        },
        SystemMount {
            source: "tmpfs",
            target: "dev",
            fstype: "tmpfs",
            flags: MsFlags::MS_NOSUID | MsFlags::MS_STRICTATIME,
            data: Some("mode=755"),
        },
        SystemMount {
            source: "devpts",
            target: "dev/pts",
            fstype: "devpts",
            flags: MsFlags::empty(),
            data: None,
        },
    ]
}

/// Mounts every entry of [`system_mounts`] under `rootfs`, creating the
/// mount points that are missing.
///
/// # Errors
///
/// Returns [`CorralError::DeviceInit`] if a mount point cannot be
/// created, or [`CorralError::Mount`] if a mount fails.
pub fn mount_system_filesystems(rootfs: &Path) -> Result<()> {
    for entry in system_mounts() {
        let target = rootfs.join(entry.target);
        if !target.is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| CorralError::DeviceInit {
                path: target.clone(),
                source: e,
            })?;
        }
        mount(
            Some(entry.source),
            &target,
            Some(entry.fstype),
            entry.flags,
            entry.data,
        )
        .map_err(|e| CorralError::Mount {
            fstype: entry.fstype,
            target: target.clone(),
            source: e,
        })?;
        tracing::debug!(fstype = entry.fstype, target = %target.display(), "mounted");
    }
    Ok(())
}
