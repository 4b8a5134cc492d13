//! Visual Snapshot - visual regression verification for rendered views.
//!
//! This crate provides:
//! - Record/verify lifecycle of reference images per test and configuration
//! - Multi-configuration fan-out that lets every configuration file its diagnostics
//! - Failure store with the actual image and a `__REF` copy of the reference on mismatch
//! - Tolerance-based image comparison
//! - A software canvas renderer behind a pluggable `Renderer` trait
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use visual_snapshot::config::Settings;
//! use visual_snapshot::snapshot::{
//!     CanvasRenderer, Configuration, ConfigurationSet, Device, InterfaceStyle, SnapshotEngine,
//!     TestCase, TextCard, view_factory,
//! };
//!
//! # async fn run() -> visual_snapshot::SnapshotResult<()> {
//! let engine = SnapshotEngine::new(Settings::from_env(), CanvasRenderer);
//! let configs = ConfigurationSet::default()
//!     .add(Configuration::new(Device::tablet(), InterfaceStyle::Dark));
//!
//! // waits SNAPSHOT_RENDER_DELAY_MS before capture
//! let welcome = engine.test_case(file!(), "Welcome", view_factory(|| TextCard::new("Welcome", "Hello")));
//! engine.verify_all(&welcome, &configs).await?;
//!
//! // per-test override of the settle delay
//! let banner = TestCase::new(
//!     file!(),
//!     "Banner",
//!     Duration::from_millis(50),
//!     view_factory(|| TextCard::new("Banner", "Sale")),
//! );
//! engine.verify_all(&banner, &configs).await
//! # }
//! ```

pub mod config;
pub mod report;
pub mod snapshot;
pub mod store;

// Re-export settings
pub use config::Settings;

// Re-export report types
pub use report::{ConfigurationOutcome, OutcomeStatus, VerificationReport, first_error};

// Re-export snapshot types
pub use snapshot::{
    ArtifactKey, Canvas, CanvasRenderer, Configuration, ConfigurationSet, Device, ExecutedTestCase,
    InterfaceStyle, Renderer, SnapshotEngine, SnapshotError, SnapshotResult, TestCase, View,
    ViewFactory,
};

// Re-export failure store maintenance
pub use store::{FailureArtifact, approve_failures, clean_failures, list_failures};
