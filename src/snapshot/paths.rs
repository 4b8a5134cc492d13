//! Artifact path resolution.
//!
//! An artifact lives at `<dir>/<name>_<config id>[suffix].png`, where `<dir>`
//! is derived from the store root and the folder holding the test file:
//!
//! - relative root: `<test folder>/<root>/<test folder name>`
//! - absolute root: `<root>/<test folder, without its root>`
//!
//! The test folder name is only appended when the directory does not
//! already end in it.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use super::types::{ArtifactKey, SnapshotResult};

/// Extension of every artifact file
pub const IMAGE_EXT: &str = "png";

/// Suffix of the reference copy filed next to a mismatching actual image
pub const REFERENCE_COPY_SUFFIX: &str = "__REF";

/// Folder that contains the test file
fn test_folder(file_path: &Path) -> &Path {
    file_path.parent().unwrap_or(Path::new(""))
}

/// Append `folder` to `dir` unless it is empty, `.`, `..`, or already the last component
fn append_folder_if_needed(dir: PathBuf, folder: Option<&OsStr>) -> PathBuf {
    let Some(folder) = folder else {
        return dir;
    };
    if folder.is_empty() || folder == "." || folder == ".." || dir.file_name() == Some(folder) {
        return dir;
    }
    dir.join(folder)
}

/// Directory holding the artifacts of `key` under the store `root`
pub fn artifact_dir(root: &Path, key: &ArtifactKey) -> PathBuf {
    let folder = test_folder(&key.file_path);
    let dir = if root.is_absolute() {
        let mut dir = root.to_path_buf();
        for component in folder.components() {
            if let Component::Normal(part) = component {
                dir.push(part);
            }
        }
        dir
    } else {
        folder.join(root)
    };
    append_folder_if_needed(dir, folder.file_name())
}

/// Full artifact path; `suffix` is appended to the filename stem
pub fn artifact_path(root: &Path, key: &ArtifactKey, suffix: &str) -> PathBuf {
    artifact_dir(root, key).join(format!("{}{}.{}", key.stem(), suffix, IMAGE_EXT))
}

/// Resolve an artifact path, creating its directory if it does not exist yet
pub async fn resolve(root: &Path, key: &ArtifactKey, suffix: &str) -> SnapshotResult<PathBuf> {
    let dir = artifact_dir(root, key);
    if !tokio::fs::try_exists(&dir).await? {
        tokio::fs::create_dir_all(&dir).await?;
        tracing::debug!(dir = %dir.display(), "created artifact directory");
    }
    Ok(dir.join(format!("{}{}.{}", key.stem(), suffix, IMAGE_EXT)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn key(file: &str) -> ArtifactKey {
        ArtifactKey::new(Path::new(file), "Foo", "iphone_dark")
    }

    #[test]
    fn test_absolute_root_mirrors_test_folder() {
        let path = artifact_path(Path::new("/R"), &key("/a/b/MyTests.swift"), "");
        assert_eq!(path, PathBuf::from("/R/a/b/Foo_iphone_dark.png"));
    }

    #[test]
    fn test_relative_root_nests_under_test_folder() {
        let path = artifact_path(Path::new("__Snapshots__"), &key("/a/b/tests.rs"), "");
        assert_eq!(
            path,
            PathBuf::from("/a/b/__Snapshots__/b/Foo_iphone_dark.png")
        );
    }

    #[test]
    fn test_no_duplicate_trailing_folder() {
        let path = artifact_path(Path::new("b"), &key("/a/b/tests.rs"), "");
        assert_eq!(path, PathBuf::from("/a/b/b/Foo_iphone_dark.png"));
    }

    #[test]
    fn test_redundant_folder_segments_skipped() {
        let path = artifact_path(Path::new("snaps"), &key("./tests.rs"), "");
        assert_eq!(path, PathBuf::from("./snaps/Foo_iphone_dark.png"));

        let path = artifact_path(Path::new("snaps"), &key("tests.rs"), "");
        assert_eq!(path, PathBuf::from("snaps/Foo_iphone_dark.png"));
    }

    #[test]
    fn test_suffix() {
        let path = artifact_path(
            Path::new("/R"),
            &key("/a/b/MyTests.swift"),
            REFERENCE_COPY_SUFFIX,
        );
        assert_eq!(path, PathBuf::from("/R/a/b/Foo_iphone_dark__REF.png"));
    }

    #[tokio::test]
    async fn test_resolve_creates_directory_once() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("refs");
        let key = key("/suite/ui/tests.rs");

        let first = resolve(&root, &key, "").await.unwrap();
        assert!(first.parent().unwrap().is_dir());
        assert!(!first.exists());

        let second = resolve(&root, &key, "").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first, root.join("suite/ui/Foo_iphone_dark.png"));
    }
}
