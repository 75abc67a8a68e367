//! Filesystem management for container isolation.
//!
//! Covers the per-container directory layout, the `OverlayFS` root built
//! from an image, the pseudo-filesystems and device nodes a userspace
//! needs, and the final `pivot_root` into the new tree.

pub mod devices;
pub mod directories;
pub mod mount;
pub mod overlayfs;
pub mod pivot_root;
