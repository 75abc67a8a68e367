//! Minimal `/dev` for the container.
//!
//! After the pseudo-filesystems are mounted, the fresh `dev` tmpfs is
//! filled with the standard character devices and the stdio symlinks.

use std::os::unix::fs::{PermissionsExt, symlink};
use std::path::Path;

use corral_common::error::{CorralError, Result};
use nix::sys::stat::{Mode, SFlag, makedev, mknod};

use super::mount::mount_system_filesystems;

/// Permission bits of every device node.
pub const DEVICE_MODE: u32 = 0o666;

/// A device node created under `/dev`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceNode {
    /// File name under `/dev`.
    pub name: &'static str,
    /// Node type (character device).
    pub kind: SFlag,
    /// Device major number.
    pub major: u64,
    /// Device minor number.
    pub minor: u64,
}

impl DeviceNode {
    const fn chr(name: &'static str, major: u64, minor: u64) -> Self {
        Self {
            name,
            kind: SFlag::S_IFCHR,
            major,
            minor,
        }
    }

    /// Encoded device number.
    #[must_use]
    pub fn dev(&self) -> u64 {
        makedev(self.major, self.minor)
    }
}

/// Device nodes every container gets.
pub const DEVICE_NODES: &[DeviceNode] = &[
    DeviceNode::chr("null", 1, 3),
    DeviceNode::chr("zero", 1, 5),
    DeviceNode::chr("random", 1, 8),
    DeviceNode::chr("urandom", 1, 9),
    DeviceNode::chr("console", 136, 1),
    DeviceNode::chr("tty", 5, 0),
    DeviceNode::chr("full", 1, 7),
];

/// Symlinks under `/dev` and their targets.
pub const DEV_SYMLINKS: &[(&str, &str)] = &[
    ("stdin", "/proc/self/fd/0"),
    ("stdout", "/proc/self/fd/1"),
    ("stderr", "/proc/self/fd/2"),
    ("fd", "/proc/self/fd"),
];

/// Mounts `/proc`, `/sys`, `/dev`, `/dev/pts` under `rootfs` and populates
/// `rootfs/dev`.
///
/// # Errors
///
/// Returns [`CorralError::Mount`] if a pseudo-filesystem cannot be mounted,
/// or [`CorralError::DeviceInit`] if a node or symlink cannot be created.
pub fn initialize_devices(rootfs: &Path) -> Result<()> {
    mount_system_filesystems(rootfs)?;
    let dev = rootfs.join("dev");
    create_dev_symlinks(&dev)?;
    create_device_nodes(&dev)?;
    tracing::info!(rootfs = %rootfs.display(), nodes = DEVICE_NODES.len(), "devices initialized");
    Ok(())
}

/// Creates the [`DEV_SYMLINKS`] entries in `dev_dir`.
///
/// # Errors
///
/// Returns [`CorralError::DeviceInit`] if a symlink cannot be created.
pub fn create_dev_symlinks(dev_dir: &Path) -> Result<()> {
    for (name, target) in DEV_SYMLINKS {
        let link = dev_dir.join(name);
        symlink(target, &link).map_err(|e| CorralError::DeviceInit {
            path: link.clone(),
            source: e,
        })?;
    }
    Ok(())
}

/// Creates the [`DEVICE_NODES`] in `dev_dir` with mode `0666`.
///
/// The mode is applied explicitly after `mknod(2)` so the process umask
/// cannot narrow it.
///
/// # Errors
///
/// Returns [`CorralError::DeviceInit`] if `mknod(2)` or `chmod(2)` fails;
/// creating device nodes requires `CAP_MKNOD`.
pub fn create_device_nodes(dev_dir: &Path) -> Result<()> {
    for node in DEVICE_NODES {
        let path = dev_dir.join(node.name);
        mknod(
            &path,
            node.kind,
            Mode::from_bits_truncate(DEVICE_MODE),
            node.dev(),
        )
        .map_err(|e| CorralError::DeviceInit {
            path: path.clone(),
            source: e.into(),
        })?;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(DEVICE_MODE))
            .map_err(|e| CorralError::DeviceInit {
                path: path.clone(),
                source: e,
            })?;
        tracing::debug!(device = node.name, major = node.major, minor = node.minor, "created device node");
    }
    Ok(())
}
