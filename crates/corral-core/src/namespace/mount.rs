//! Mount namespace propagation.
//!
//! A fresh mount namespace starts as a copy of its parent, including the
//! propagation type of each mount. If `/` is shared, mounts made inside the
//! container would leak to the host, so `/` is remarked private first.

use std::path::Path;

use corral_common::error::{CorralError, Result};
use nix::mount::{MsFlags, mount};

/// Recursively marks `/` of the calling process as a private mount.
///
/// Must run before the namespace `clone(2)`, since the child inherits the
/// propagation type of every mount.
///
/// # Errors
///
/// Returns [`CorralError::Mount`] if the `mount(2)` call fails, typically
/// because the caller lacks `CAP_SYS_ADMIN`.
pub fn make_root_private() -> Result<()> {
    let root = Path::new("/");
    mount(
        None::<&str>,
        root,
        None::<&str>,
        MsFlags::MS_PRIVATE | MsFlags::MS_REC,
        None::<&str>,
    )
    .map_err(|e| CorralError::Mount {
        fstype: "none",
        target: root.to_path_buf(),
        source: e,
    })?;
    tracing::debug!("root mount marked recursively private");
    Ok(())
}
