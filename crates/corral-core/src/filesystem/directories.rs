//! Per-container directory creation.

use std::path::Path;

use corral_common::error::{CorralError, Result};
use corral_common::types::{ContainerDirectories, ContainerId};

/// Creates the root, upper, and work directories of a container.
///
/// Missing directories are created recursively; existing ones are left
/// untouched, so calling this twice for the same id is harmless.
///
/// # Errors
///
/// Returns [`CorralError::DirectoryCreation`] if a directory cannot be
/// created (permissions, disk full, a file in the way).
pub fn create_container_directories(
    container_root: &Path,
    id: &ContainerId,
) -> Result<ContainerDirectories> {
    let dirs = ContainerDirectories::for_container(container_root, id);
    for dir in dirs.all() {
        if dir.is_dir() {
            continue;
        }
        std::fs::create_dir_all(dir).map_err(|e| CorralError::DirectoryCreation {
            path: dir.to_path_buf(),
            source: e,
        })?;
    }
    tracing::info!(id = %id, root = %dirs.root_dir.display(), "container directories ready");
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_all_three_directories() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let id = ContainerId::parse("c1").expect("id");
        let dirs = create_container_directories(tmp.path(), &id).expect("create");
        for dir in dirs.all() {
            assert!(dir.is_dir(), "{} missing", dir.display());
        }
        assert!(dirs.root_dir.starts_with(tmp.path().join("c1")));
    }

    #[test]
    fn second_call_is_idempotent() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let id = ContainerId::parse("c2").expect("id");
        let first = create_container_directories(tmp.path(), &id).expect("first");
        std::fs::write(first.rw_dir.join("marker"), b"x").expect("write");
        let second = create_container_directories(tmp.path(), &id).expect("second");
        assert_eq!(first, second);
        assert!(second.rw_dir.join("marker").exists());
    }

    #[test]
    fn file_in_the_way_is_a_directory_creation_error() {
        let tmp = tempfile::tempdir().expect("tempdir");
        std::fs::write(tmp.path().join("c3"), b"not a dir").expect("write");
        let id = ContainerId::parse("c3").expect("id");
        let err = create_container_directories(tmp.path(), &id).unwrap_err();
        assert!(matches!(err, CorralError::DirectoryCreation { .. }));
    }
}
