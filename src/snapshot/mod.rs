pub mod compare;
pub mod configuration;
pub mod engine;
pub mod paths;
pub mod render;
pub mod types;

pub use compare::{DIFF_SCALE, ImageDiff, compare, diff_images};
pub use configuration::{Configuration, ConfigurationSet, Device, InterfaceStyle};
pub use engine::SnapshotEngine;
pub use paths::{IMAGE_EXT, REFERENCE_COPY_SUFFIX, artifact_dir, artifact_path, resolve};
pub use render::{Canvas, CanvasRenderer, Frame, Palette, Renderer, TextCard, View, ViewFactory, view_factory};
pub use types::{ArtifactKey, ExecutedTestCase, SnapshotError, SnapshotResult, TestCase};
