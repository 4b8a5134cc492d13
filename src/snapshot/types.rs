// Define core types for snapshot verification

use image::RgbaImage;
use serde::ser::SerializeMap;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::configuration::Configuration;

/// A single snapshot request: which test produced it, and how to build the view.
///
/// `F` is the view factory understood by the renderer in use.
#[derive(Debug, Clone)]
pub struct TestCase<F> {
    /// Path of the calling test file; its folder anchors the artifact directories
    pub file_path: PathBuf,

    /// Identifier of the test, used as the filename prefix
    pub name: String,

    /// How long to let the view settle before capture
    pub render_delay: Duration,

    /// Capability producing the view to render
    pub view_factory: F,
}

impl<F> TestCase<F> {
    /// Create a test case with the given render delay
    pub fn new(
        file_path: impl Into<PathBuf>,
        name: impl Into<String>,
        render_delay: Duration,
        view_factory: F,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            name: name.into(),
            render_delay,
            view_factory,
        }
    }

    /// Artifact key of this test case under one configuration
    pub fn key(&self, config: &Configuration) -> ArtifactKey {
        ArtifactKey::new(&self.file_path, &self.name, config.id())
    }
}

/// A test case rendered under one configuration.
#[derive(Debug, Clone)]
pub struct ExecutedTestCase {
    /// Path of the calling test file
    pub file_path: PathBuf,

    /// Identifier of the test
    pub name: String,

    /// Configuration the image was rendered with
    pub config: Configuration,

    /// Rendered pixels
    pub image: RgbaImage,
}

impl ExecutedTestCase {
    /// Artifact key shared by the reference and failure stores
    pub fn key(&self) -> ArtifactKey {
        ArtifactKey::new(&self.file_path, &self.name, self.config.id())
    }
}

/// Everything the path resolver needs to address one (test, configuration) artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactKey {
    /// Path of the test file the artifact belongs to
    pub file_path: PathBuf,
    /// Test name
    pub name: String,
    /// Configuration id (`<device>_<style>`)
    pub config_id: String,
}

impl ArtifactKey {
    /// Build a key from its parts
    pub fn new(file_path: &Path, name: &str, config_id: impl Into<String>) -> Self {
        Self {
            file_path: file_path.to_path_buf(),
            name: name.to_string(),
            config_id: config_id.into(),
        }
    }

    /// Filename stem without suffix or extension: `<name>_<config id>`
    pub fn stem(&self) -> String {
        let mut stem = String::new();
        if !self.name.is_empty() {
            stem.push_str(&self.name);
        }
        stem.push('_');
        stem.push_str(&self.config_id);
        stem
    }
}

/// Result type for snapshot operations
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Error types for snapshot operations
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// No reference image exists yet; the actual image went to the failure store
    #[error("Reference image does not exist: {}", .path.display())]
    ReferenceMissing {
        /// Where the reference was expected
        path: PathBuf,
    },

    /// Rendered image differs from the reference by more than the tolerance
    #[error("Snapshot differs from reference: diff {diff} exceeds tolerance {tolerance}")]
    MismatchExceedsTolerance {
        /// Computed difference metric
        diff: f64,
        /// Configured tolerance
        tolerance: f64,
    },

    /// Reference exists but could not be read or decoded
    #[error("Failed to load snapshot {}: {reason}", .path.display())]
    LoadFailure {
        /// File that failed to load
        path: PathBuf,
        /// Underlying cause
        reason: String,
    },

    /// Image could not be turned into comparable pixels or PNG bytes
    #[error("Encoding error: {0}")]
    EncodingFailure(String),

    /// Renderer could not produce an image
    #[error("Render error: {0}")]
    RenderFailure(String),

    /// Record mode wrote a new reference; never a pass
    #[error("Recorded snapshot to {}; disable record mode to verify", .path.display())]
    DidRecord {
        /// Reference file that was written
        path: PathBuf,
    },

    /// I/O error while writing, copying or removing artifacts
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SnapshotError {
    /// Short, stable identifier of the variant
    pub fn kind(&self) -> &'static str {
        match self {
            SnapshotError::ReferenceMissing { .. } => "reference_missing",
            SnapshotError::MismatchExceedsTolerance { .. } => "mismatch_exceeds_tolerance",
            SnapshotError::LoadFailure { .. } => "load_failure",
            SnapshotError::EncodingFailure(_) => "encoding_failure",
            SnapshotError::RenderFailure(_) => "render_failure",
            SnapshotError::DidRecord { .. } => "did_record",
            SnapshotError::Io(_) => "io",
        }
    }

    /// Whether this is the record-mode sentinel rather than a real failure
    pub fn is_recorded(&self) -> bool {
        matches!(self, SnapshotError::DidRecord { .. })
    }

    /// The difference metric, for mismatches
    pub fn diff(&self) -> Option<f64> {
        match self {
            SnapshotError::MismatchExceedsTolerance { diff, .. } => Some(*diff),
            _ => None,
        }
    }
}

// Errors go into JSON reports as `{ "kind": ..., "message": ... }`
impl Serialize for SnapshotError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("kind", self.kind())?;
        map.serialize_entry("message", &self.to_string())?;
        if let Some(diff) = self.diff() {
            map.serialize_entry("diff", &diff)?;
        }
        map.end()
    }
}

impl From<image::ImageError> for SnapshotError {
    fn from(err: image::ImageError) -> Self {
        SnapshotError::EncodingFailure(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_stem() {
        let key = ArtifactKey::new(Path::new("/a/b/tests.rs"), "Login", "phone_dark");
        assert_eq!(key.stem(), "Login_phone_dark");
    }

    #[test]
    fn test_key_stem_without_name() {
        let key = ArtifactKey::new(Path::new("/a/b/tests.rs"), "", "phone_dark");
        assert_eq!(key.stem(), "_phone_dark");
    }

    #[test]
    fn test_error_serializes_kind_and_diff() {
        let err = SnapshotError::MismatchExceedsTolerance {
            diff: 12.5,
            tolerance: 1.0,
        };
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["kind"], "mismatch_exceeds_tolerance");
        assert_eq!(value["diff"], 12.5);
        assert!(value["message"].as_str().unwrap().contains("12.5"));
    }

    #[test]
    fn test_did_record_is_recorded() {
        let err = SnapshotError::DidRecord {
            path: PathBuf::from("/tmp/x.png"),
        };
        assert!(err.is_recorded());
        assert!(!SnapshotError::RenderFailure("boom".into()).is_recorded());
    }
}
