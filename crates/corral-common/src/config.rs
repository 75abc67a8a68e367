//! Runtime configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CONTAINER_ROOT, DEFAULT_IMAGE_ROOT};

/// Locations the launcher reads images from and writes container state to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Directory holding `{library}_{image}_{tag}` image directories.
    pub image_root: PathBuf,
    /// Directory holding `{container_id}/{rootfs,cow_rw,cow_workdir}`.
    pub container_root: PathBuf,
}

impl RuntimeConfig {
    /// Places both roots under a single data directory
    /// (`dir/images` and `dir/container`).
    #[must_use]
    pub fn with_data_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            image_root: dir.join("images"),
            container_root: dir.join("container"),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            image_root: PathBuf::from(DEFAULT_IMAGE_ROOT),
            container_root: PathBuf::from(DEFAULT_CONTAINER_ROOT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_uses_system_paths() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.image_root, PathBuf::from("/var/opt/app/images"));
        assert_eq!(cfg.container_root, PathBuf::from("/var/opt/app/container"));
    }

    #[test]
    fn with_data_dir_nests_both_roots() {
        let cfg = RuntimeConfig::with_data_dir("/srv/corral");
        assert_eq!(cfg.image_root, PathBuf::from("/srv/corral/images"));
        assert_eq!(cfg.container_root, PathBuf::from("/srv/corral/container"));
    }

    #[test]
    fn config_survives_json() {
        let cfg = RuntimeConfig::with_data_dir("/tmp/x");
        let json = serde_json::to_string(&cfg).unwrap();
        let back: RuntimeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }
}
