//! Root filesystem switching via `pivot_root(2)`.
//!
//! Unlike `chroot`, this moves the root mount itself, so once the old root
//! is detached nothing of the host tree stays reachable.

use std::path::{Path, PathBuf};

use corral_common::constants::OLD_ROOT_DIR_NAME;
use corral_common::error::{CorralError, Result};
use nix::mount::{MntFlags, umount2};

/// Makes `new_root` the process root and drops the old one.
///
/// `new_root` must be a mount point (the overlay) whose parent mount is not
/// shared. On return the working directory is `/` and `/old_root` no longer
/// exists.
///
/// # Errors
///
/// Returns [`CorralError::RootSwitch`] naming the step that failed.
pub fn switch_root(new_root: &Path) -> Result<()> {
    let put_old = new_root.join(OLD_ROOT_DIR_NAME);
    std::fs::create_dir_all(&put_old).map_err(|e| root_switch_error("mkdir", &put_old, e))?;

    nix::unistd::pivot_root(new_root, &put_old)
        .map_err(|e| root_switch_error("pivot_root", new_root, e.into()))?;
    tracing::debug!(new_root = %new_root.display(), "pivot_root done");

    let root = Path::new("/");
    std::env::set_current_dir(root).map_err(|e| root_switch_error("chdir", root, e))?;

    let old_root = root.join(OLD_ROOT_DIR_NAME);
    umount2(&old_root, MntFlags::MNT_DETACH)
        .map_err(|e| root_switch_error("umount", &old_root, e.into()))?;
    std::fs::remove_dir(&old_root).map_err(|e| root_switch_error("rmdir", &old_root, e))?;

    tracing::info!("root switched, old root detached");
    Ok(())
}

fn root_switch_error(step: &'static str, path: &Path, source: std::io::Error) -> CorralError {
    CorralError::RootSwitch {
        step,
        path: PathBuf::from(path),
        source,
    }
}
