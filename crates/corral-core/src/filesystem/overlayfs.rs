//! `OverlayFS` root construction.
//!
//! The image's extracted contents form the read-only lower layer; writes
//! land in the container's own upper directory.

use std::path::{Path, PathBuf};

use corral_common::error::{CorralError, Result};
use corral_common::types::{ContainerDirectories, ImageReference};
use nix::mount::{MsFlags, mount};

/// Configuration for an `OverlayFS` mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayConfig {
    /// Read-only lower layers (top to bottom, as overlay lists them).
    pub lower_dirs: Vec<PathBuf>,
    /// Writable upper layer directory.
    pub upper_dir: PathBuf,
    /// Work directory required by `OverlayFS`; same filesystem as `upper_dir`.
    pub work_dir: PathBuf,
    /// Final merged mount point.
    pub merged_dir: PathBuf,
}

impl OverlayConfig {
    /// Builds the overlay of one image over one container's directories.
    #[must_use]
    pub fn for_container(image_contents: PathBuf, dirs: &ContainerDirectories) -> Self {
        Self {
            lower_dirs: vec![image_contents],
            upper_dir: dirs.rw_dir.clone(),
            work_dir: dirs.work_dir.clone(),
            merged_dir: dirs.root_dir.clone(),
        }
    }

    /// Serializes the layers into the `data` argument of `mount(2)`.
    #[must_use]
    pub fn mount_options(&self) -> String {
        let lowers = self
            .lower_dirs
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(":");
        format!(
            "lowerdir={},upperdir={},workdir={}",
            lowers,
            self.upper_dir.display(),
            self.work_dir.display()
        )
    }
}

/// Mounts the image as the container root at `dirs.root_dir`.
///
/// The directories must already exist (see
/// [`create_container_directories`](super::directories::create_container_directories)).
///
/// # Errors
///
/// Returns [`CorralError::ImageNotFound`] if the image has no
/// `layers/contents` directory, or [`CorralError::Mount`] if the overlay
/// mount itself fails.
pub fn mount_image_root(
    image: &ImageReference,
    image_root: &Path,
    dirs: &ContainerDirectories,
) -> Result<OverlayConfig> {
    let contents = image.contents_path(image_root);
    if !contents.is_dir() {
        return Err(CorralError::ImageNotFound {
            image: image.to_string(),
            path: contents,
        });
    }
    let config = OverlayConfig::for_container(contents, dirs);
    mount_overlay(&config)?;
    Ok(config)
}

/// Mounts an `OverlayFS` with the given configuration.
///
/// The mount is `nodev`: device files in the image or upper layer cannot
/// be opened through it.
///
/// # Errors
///
/// Returns [`CorralError::Mount`] if the mount syscall fails.
pub fn mount_overlay(config: &OverlayConfig) -> Result<()> {
    let opts = config.mount_options();
    tracing::debug!(merged = %config.merged_dir.display(), options = %opts, "mounting overlayfs");

    mount(
        Some("overlay"),
        &config.merged_dir,
        Some("overlay"),
        MsFlags::MS_NODEV,
        Some(opts.as_str()),
    )
    .map_err(|e| CorralError::Mount {
        fstype: "overlay",
        target: config.merged_dir.clone(),
        source: e,
    })?;

    tracing::info!(merged = %config.merged_dir.display(), "overlayfs mounted");
    Ok(())
}
