//! Domain primitive types used across the corral workspace.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{
    COW_RW_DIR_NAME, COW_WORKDIR_NAME, DEFAULT_LIBRARY, DEFAULT_TAG, IMAGE_CONTENTS_SUBDIR,
    MAX_CONTAINER_ID_LEN, ROOTFS_DIR_NAME,
};
use crate::error::{CorralError, Result};

/// Unique identifier for a container instance.
///
/// The id doubles as the container hostname and as a directory name under
/// the container root, so it must be non-empty, contain no `/`, and fit the
/// kernel hostname limit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContainerId(String);

impl ContainerId {
    /// Validates and wraps a container id.
    ///
    /// # Errors
    ///
    /// Returns [`CorralError::InvalidContainerId`] if the id is empty,
    /// contains `/` or NUL, is `.` or `..`, or exceeds 64 bytes.
    pub fn parse(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let reason = if id.is_empty() {
            Some("must not be empty")
        } else if id.len() > MAX_CONTAINER_ID_LEN {
            Some("must be at most 64 bytes")
        } else if id.contains(['/', '\0']) {
            Some("must not contain '/' or NUL")
        } else if id == "." || id == ".." {
            Some("must not be a relative path component")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(CorralError::InvalidContainerId { id, reason }),
            None => Ok(Self(id)),
        }
    }

    /// Generates a random container id (UUID v4).
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ContainerId {
    type Error = CorralError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<ContainerId> for String {
    fn from(id: ContainerId) -> Self {
        id.0
    }
}

impl FromStr for ContainerId {
    type Err = CorralError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of an image already materialized on disk.
///
/// Parsed from `[library/]image[:tag]`; a missing library defaults to
/// `library` and a missing or empty tag to `latest`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference {
    library: String,
    image: String,
    tag: String,
}

impl ImageReference {
    /// Creates a reference from its three components.
    ///
    /// # Errors
    ///
    /// Returns [`CorralError::InvalidImageReference`] if any component is
    /// empty or contains `/`, `:`, or whitespace.
    pub fn new(
        library: impl Into<String>,
        image: impl Into<String>,
        tag: impl Into<String>,
    ) -> Result<Self> {
        let reference = Self {
            library: library.into(),
            image: image.into(),
            tag: tag.into(),
        };
        for part in [&reference.library, &reference.image, &reference.tag] {
            if let Err(reason) = check_component(part) {
                return Err(CorralError::InvalidImageReference {
                    input: reference.to_string(),
                    reason,
                });
            }
        }
        Ok(reference)
    }

    /// Library (namespace) of the image, e.g. `library`.
    #[must_use]
    pub fn library(&self) -> &str {
        &self.library
    }

    /// Image name, e.g. `alpine`.
    #[must_use]
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Image tag, e.g. `latest`.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Directory name of the image under the image root.
    #[must_use]
    pub fn dir_name(&self) -> String {
        format!("{}_{}_{}", self.library, self.image, self.tag)
    }

    /// Path of the image directory under `image_root`.
    #[must_use]
    pub fn image_path(&self, image_root: &Path) -> PathBuf {
        image_root.join(self.dir_name())
    }

    /// Path of the merged layer contents used as the overlay lower layer.
    #[must_use]
    pub fn contents_path(&self, image_root: &Path) -> PathBuf {
        self.image_path(image_root).join(IMAGE_CONTENTS_SUBDIR)
    }
}

fn check_component(part: &str) -> std::result::Result<(), &'static str> {
    if part.is_empty() {
        return Err("empty component");
    }
    if part.contains(['/', ':']) {
        return Err("unexpected separator");
    }
    if part.chars().any(char::is_whitespace) {
        return Err("whitespace is not allowed");
    }
    Ok(())
}

impl FromStr for ImageReference {
    type Err = CorralError;

    fn from_str(input: &str) -> Result<Self> {
        let invalid = |reason| CorralError::InvalidImageReference {
            input: input.to_string(),
            reason,
        };

        let (library, rest) = input.split_once('/').unwrap_or(("", input));
        if rest.contains('/') {
            return Err(invalid("too many '/' separators"));
        }
        let (image, tag) = rest.split_once(':').unwrap_or((rest, ""));
        if image.is_empty() {
            return Err(invalid("missing image name"));
        }

        let library = if library.is_empty() { DEFAULT_LIBRARY } else { library };
        let tag = if tag.is_empty() { DEFAULT_TAG } else { tag };
        for part in [library, image, tag] {
            check_component(part).map_err(invalid)?;
        }

        Ok(Self {
            library: library.to_string(),
            image: image.to_string(),
            tag: tag.to_string(),
        })
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.library, self.image, self.tag)
    }
}

/// Everything the isolated child needs to set up and run a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInitParams {
    image: ImageReference,
    command: Vec<String>,
    container_id: ContainerId,
}

impl ContainerInitParams {
    /// Bundles an image, argv, and container id.
    ///
    /// # Errors
    ///
    /// Returns [`CorralError::Config`] if `command` is empty or its first
    /// element is empty.
    pub fn new(image: ImageReference, command: Vec<String>, container_id: ContainerId) -> Result<Self> {
        if command.first().is_none_or(String::is_empty) {
            return Err(CorralError::Config {
                message: "container command must not be empty".into(),
            });
        }
        Ok(Self {
            image,
            command,
            container_id,
        })
    }

    /// Image the container root is built from.
    #[must_use]
    pub const fn image(&self) -> &ImageReference {
        &self.image
    }

    /// Argv of the container process; never empty.
    #[must_use]
    pub fn command(&self) -> &[String] {
        &self.command
    }

    /// Unique id of this container instance.
    #[must_use]
    pub const fn container_id(&self) -> &ContainerId {
        &self.container_id
    }
}

/// The three overlay directories owned by one container instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerDirectories {
    /// Mount point of the merged root filesystem.
    pub root_dir: PathBuf,
    /// Writable upper layer.
    pub rw_dir: PathBuf,
    /// Overlay work directory.
    pub work_dir: PathBuf,
}

impl ContainerDirectories {
    /// Derives the directory layout of `id` under `container_root`.
    ///
    /// Pure path computation; nothing is created on disk.
    #[must_use]
    pub fn for_container(container_root: &Path, id: &ContainerId) -> Self {
        let base = container_root.join(id.as_str());
        Self {
            root_dir: base.join(ROOTFS_DIR_NAME),
            rw_dir: base.join(COW_RW_DIR_NAME),
            work_dir: base.join(COW_WORKDIR_NAME),
        }
    }

    /// All three directories, in creation order.
    #[must_use]
    pub fn all(&self) -> [&Path; 3] {
        [&self.root_dir, &self.rw_dir, &self.work_dir]
    }
}

/// Ordered phases the isolated child walks through before exec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SetupPhase {
    /// Setting the container hostname.
    Hostname,
    /// Creating the container directories.
    Directories,
    /// Mounting the overlay root.
    Overlay,
    /// Mounting pseudo-filesystems and populating `/dev`.
    Devices,
    /// Pivoting into the new root.
    RootSwitch,
    /// Replacing the process image.
    Exec,
}

impl fmt::Display for SetupPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Hostname => "hostname",
            Self::Directories => "directories",
            Self::Overlay => "overlay",
            Self::Devices => "devices",
            Self::RootSwitch => "root-switch",
            Self::Exec => "exec",
        };
        f.write_str(name)
    }
}
