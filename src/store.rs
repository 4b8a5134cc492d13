//! Failure store maintenance.
//!
//! Walks a failure-store directory tree to list, approve or clear the
//! artifacts that failing verifications left behind.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::snapshot::{IMAGE_EXT, REFERENCE_COPY_SUFFIX};

/// An actual image left in the failure store, with its reference copy if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureArtifact {
    /// Image rendered by the failing verification
    pub actual: PathBuf,
    /// `__REF` copy of the reference, present for mismatches
    pub reference_copy: Option<PathBuf>,
}

impl FailureArtifact {
    /// Whether the failure was a mismatch (as opposed to a missing reference)
    pub fn is_mismatch(&self) -> bool {
        self.reference_copy.is_some()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension().map(|e| e == IMAGE_EXT).unwrap_or(false)
}

fn is_reference_copy(path: &Path) -> bool {
    path.file_stem()
        .map(|s| s.to_string_lossy().ends_with(REFERENCE_COPY_SUFFIX))
        .unwrap_or(false)
}

fn reference_copy_of(actual: &Path) -> Option<PathBuf> {
    let stem = actual.file_stem()?.to_string_lossy();
    Some(actual.with_file_name(format!("{}{}.{}", stem, REFERENCE_COPY_SUFFIX, IMAGE_EXT)))
}

/// Image files under `root`, in file-name order. Symlinks are not followed,
/// so a link back into the store cannot list an artifact twice.
fn collect_images(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && is_image(entry.path()) {
            images.push(entry.into_path());
        }
    }
    Ok(images)
}

/// List all failure artifacts under `root`, sorted by path
pub fn list_failures(root: &Path) -> std::io::Result<Vec<FailureArtifact>> {
    if !root.exists() {
        return Ok(Vec::new());
    }
    let mut images = collect_images(root)?;
    images.sort();

    let artifacts = images
        .into_iter()
        .filter(|path| !is_reference_copy(path))
        .map(|actual| {
            let reference_copy = reference_copy_of(&actual).filter(|copy| copy.exists());
            FailureArtifact {
                actual,
                reference_copy,
            }
        })
        .collect();
    Ok(artifacts)
}

/// Promote every actual image under `failure_root` to the same relative
/// location under `reference_root`, removing both failure artifacts.
///
/// Returns the reference paths written.
pub fn approve_failures(failure_root: &Path, reference_root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut approved = Vec::new();
    for artifact in list_failures(failure_root)? {
        let relative = artifact
            .actual
            .strip_prefix(failure_root)
            .map_err(std::io::Error::other)?;
        let destination = reference_root.join(relative);
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&artifact.actual, &destination)?;
        fs::remove_file(&artifact.actual)?;
        if let Some(copy) = &artifact.reference_copy {
            fs::remove_file(copy)?;
        }
        tracing::info!(
            from = %artifact.actual.display(),
            to = %destination.display(),
            "approved snapshot"
        );
        approved.push(destination);
    }
    Ok(approved)
}

/// Delete the failure store; returns how many images it held
pub fn clean_failures(root: &Path) -> std::io::Result<usize> {
    if !root.exists() {
        return Ok(0);
    }
    let images = collect_images(root)?;
    fs::remove_dir_all(root)?;
    tracing::info!(root = %root.display(), removed = images.len(), "cleaned failure store");
    Ok(images.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"png").unwrap();
    }

    #[test]
    fn test_list_pairs_reference_copies() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(&root.join("a/Card_phone_light.png"));
        touch(&root.join("a/Card_phone_light__REF.png"));
        touch(&root.join("a/b/List_tablet_dark.png"));
        touch(&root.join("a/notes.txt"));

        let artifacts = list_failures(root).unwrap();
        assert_eq!(
            artifacts,
            vec![
                FailureArtifact {
                    actual: root.join("a/Card_phone_light.png"),
                    reference_copy: Some(root.join("a/Card_phone_light__REF.png")),
                },
                FailureArtifact {
                    actual: root.join("a/b/List_tablet_dark.png"),
                    reference_copy: None,
                },
            ]
        );
        assert!(artifacts[0].is_mismatch());
    }

    #[test]
    fn test_list_missing_root() {
        let tmp = TempDir::new().unwrap();
        assert!(list_failures(&tmp.path().join("absent")).unwrap().is_empty());
    }

    #[test]
    fn test_approve_mirrors_paths() {
        let tmp = TempDir::new().unwrap();
        let failures = tmp.path().join("fail");
        let references = tmp.path().join("ref");
        touch(&failures.join("suite/Card_phone_light.png"));
        touch(&failures.join("suite/Card_phone_light__REF.png"));

        let approved = approve_failures(&failures, &references).unwrap();
        assert_eq!(approved, vec![references.join("suite/Card_phone_light.png")]);
        assert!(approved[0].exists());
        assert!(list_failures(&failures).unwrap().is_empty());
        assert!(!failures.join("suite/Card_phone_light__REF.png").exists());
    }

    #[test]
    fn test_clean_counts_images() {
        let tmp = TempDir::new().unwrap();
        let failures = tmp.path().join("fail");
        touch(&failures.join("x/A_phone_light.png"));
        touch(&failures.join("x/A_phone_light__REF.png"));
        assert_eq!(clean_failures(&failures).unwrap(), 2);
        assert!(!failures.exists());
        assert_eq!(clean_failures(&failures).unwrap(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directory_is_not_walked() {
        let tmp = TempDir::new().unwrap();
        let failures = tmp.path().join("fail");
        let references = tmp.path().join("ref");
        touch(&failures.join("suite/Card_phone_light.png"));
        std::os::unix::fs::symlink(&failures, failures.join("suite/loop")).unwrap();

        let artifacts = list_failures(&failures).unwrap();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].actual, failures.join("suite/Card_phone_light.png"));

        let approved = approve_failures(&failures, &references).unwrap();
        assert_eq!(approved, vec![references.join("suite/Card_phone_light.png")]);
        assert!(!references.join("suite/loop").exists());
    }
}
