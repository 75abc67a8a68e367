//! System-wide constants and default paths.

/// Default directory holding materialized images
/// (`{library}_{image}_{tag}/layers/contents`).
pub const DEFAULT_IMAGE_ROOT: &str = "/var/opt/app/images";

/// Default directory holding per-container overlay directories.
pub const DEFAULT_CONTAINER_ROOT: &str = "/var/opt/app/container";

/// Library used when an image reference omits one.
pub const DEFAULT_LIBRARY: &str = "library";

/// Tag used when an image reference omits one.
pub const DEFAULT_TAG: &str = "latest";

/// Subdirectory of an image holding the merged, extracted layers.
pub const IMAGE_CONTENTS_SUBDIR: &str = "layers/contents";

/// Mount point of the merged overlay inside a container directory.
pub const ROOTFS_DIR_NAME: &str = "rootfs";
/// Writable overlay layer inside a container directory.
pub const COW_RW_DIR_NAME: &str = "cow_rw";
/// Overlay work directory inside a container directory.
pub const COW_WORKDIR_NAME: &str = "cow_workdir";

/// Directory under the new root that receives the old root during the pivot.
pub const OLD_ROOT_DIR_NAME: &str = "old_root";

/// Maximum container id length, bounded by the kernel hostname limit.
pub const MAX_CONTAINER_ID_LEN: usize = 64;

/// Stack size handed to the cloned child.
pub const CHILD_STACK_SIZE: usize = 1024 * 1024;

/// Binary and command name.
pub const APP_NAME: &str = "corral";

/// Environment variable overriding the image root.
pub const IMAGE_ROOT_ENV: &str = "CORRAL_IMAGE_DIR";
/// Environment variable overriding the container root.
pub const CONTAINER_ROOT_ENV: &str = "CORRAL_CONTAINER_DIR";
