//! Record/verify lifecycle of snapshot artifacts.
//!
//! Three locations are addressed by the same (test, configuration) key:
//! the reference image, the actual image in the failure store, and the
//! `__REF` copy of the reference next to it. Verification keeps them
//! consistent:
//!
//! | Situation | Failure store afterwards | Error |
//! |-----------|--------------------------|-------|
//! | reference missing | actual image | `ReferenceMissing` |
//! | reference unreadable | actual image | `LoadFailure` |
//! | diff above tolerance | actual image + `__REF` copy | `MismatchExceedsTolerance` |
//! | diff within tolerance | nothing | none |
//!
//! Record mode only writes the reference store and always ends in
//! `DidRecord`.

use image::RgbaImage;
use std::path::{Path, PathBuf};

use super::compare;
use super::configuration::{Configuration, ConfigurationSet};
use super::paths::{self, REFERENCE_COPY_SUFFIX};
use super::render::Renderer;
use super::types::{ArtifactKey, ExecutedTestCase, SnapshotError, SnapshotResult, TestCase};
use crate::config::Settings;
use crate::report::{ConfigurationOutcome, first_error};

/// Drives a renderer through the record/verify state machine.
#[derive(Debug, Clone)]
pub struct SnapshotEngine<R> {
    settings: Settings,
    renderer: R,
}

impl<R> SnapshotEngine<R> {
    /// Create an engine
    pub fn new(settings: Settings, renderer: R) -> Self {
        Self { settings, renderer }
    }

    /// Build a test case that waits the configured render delay
    pub fn test_case<F>(
        &self,
        file_path: impl Into<PathBuf>,
        name: impl Into<String>,
        view_factory: F,
    ) -> TestCase<F> {
        TestCase::new(file_path, name, self.settings.render_delay, view_factory)
    }

    /// Verify every configuration of `configs`, surfacing the first error.
    ///
    /// All configurations run even when an earlier one fails, so each gets
    /// to write its failure artifacts.
    pub async fn verify_all<F>(
        &self,
        test_case: &TestCase<F>,
        configs: &ConfigurationSet,
    ) -> SnapshotResult<()>
    where
        R: Renderer<F>,
    {
        first_error(self.verify_each(test_case, configs).await)
    }

    /// Verify every configuration of `configs` in order and return all outcomes
    pub async fn verify_each<F>(
        &self,
        test_case: &TestCase<F>,
        configs: &ConfigurationSet,
    ) -> Vec<ConfigurationOutcome>
    where
        R: Renderer<F>,
    {
        if configs.is_empty() {
            tracing::warn!(test = %test_case.name, "configuration set is empty, nothing verified");
        }
        let mut outcomes = Vec::with_capacity(configs.count());
        for (index, config) in configs.iter().enumerate() {
            let result = self.verify(test_case, config).await;
            match &result {
                Ok(()) => {}
                Err(err) if err.is_recorded() => {}
                Err(err) => tracing::warn!(
                    test = %test_case.name,
                    config = %config.id(),
                    index,
                    error = %err,
                    "snapshot verification failed"
                ),
            }
            outcomes.push(ConfigurationOutcome {
                index,
                config: config.clone(),
                result,
            });
        }
        outcomes
    }

    /// Verify one configuration, or record it when record mode is on
    pub async fn verify<F>(&self, test_case: &TestCase<F>, config: &Configuration) -> SnapshotResult<()>
    where
        R: Renderer<F>,
    {
        if self.settings.record_mode {
            return self.record(test_case, config).await;
        }

        let executed = self.execute(test_case, config).await?;

        let reference = match self.load(&self.settings.reference_dir, &executed).await {
            Ok(reference) => reference,
            Err(err) => {
                self.save(&self.settings.failure_dir, &executed).await?;
                return Err(err);
            }
        };

        match compare::compare(&executed.image, &reference, self.settings.tolerance) {
            Ok(diff) => {
                tracing::debug!(
                    test = %executed.name,
                    config = %executed.config.id(),
                    diff,
                    "snapshot matches reference"
                );
                self.delete_failures(&executed.key()).await
            }
            Err(err) => {
                self.save(&self.settings.failure_dir, &executed).await?;
                self.copy_reference(&executed.key()).await?;
                Err(err)
            }
        }
    }

    /// Render and write a new reference image.
    ///
    /// Does nothing unless record mode is on; otherwise always fails with
    /// `DidRecord` after writing.
    pub async fn record<F>(&self, test_case: &TestCase<F>, config: &Configuration) -> SnapshotResult<()>
    where
        R: Renderer<F>,
    {
        if !self.settings.record_mode {
            return Ok(());
        }
        let executed = self.execute(test_case, config).await?;
        let path = self.save(&self.settings.reference_dir, &executed).await?;
        Err(SnapshotError::DidRecord { path })
    }

    /// Promote the failure-store image of `key` to the reference store and
    /// clear the failure artifacts. Returns the reference path.
    pub async fn approve(&self, key: &ArtifactKey) -> SnapshotResult<PathBuf> {
        let actual = paths::artifact_path(&self.settings.failure_dir, key, "");
        if !tokio::fs::try_exists(&actual).await? {
            return Err(SnapshotError::LoadFailure {
                path: actual,
                reason: "no failure artifact to approve".to_string(),
            });
        }
        let reference = paths::resolve(&self.settings.reference_dir, key, "").await?;
        tokio::fs::copy(&actual, &reference).await?;
        tracing::info!(
            from = %actual.display(),
            to = %reference.display(),
            "approved snapshot"
        );
        self.delete_failures(key).await?;
        Ok(reference)
    }

    async fn execute<F>(&self, test_case: &TestCase<F>, config: &Configuration) -> SnapshotResult<ExecutedTestCase>
    where
        R: Renderer<F>,
    {
        let image = self
            .renderer
            .render(test_case, config, self.settings.render_offset)
            .await?;
        Ok(ExecutedTestCase {
            file_path: test_case.file_path.clone(),
            name: test_case.name.clone(),
            config: config.clone(),
            image,
        })
    }

    async fn save(&self, root: &Path, executed: &ExecutedTestCase) -> SnapshotResult<PathBuf> {
        let data = compare::encode_png(&executed.image)?;
        let path = paths::resolve(root, &executed.key(), "").await?;
        tokio::fs::write(&path, data).await?;
        tracing::info!(path = %path.display(), "saved snapshot");
        Ok(path)
    }

    async fn load(&self, root: &Path, executed: &ExecutedTestCase) -> SnapshotResult<RgbaImage> {
        let path = paths::artifact_path(root, &executed.key(), "");
        let exists = tokio::fs::try_exists(&path)
            .await
            .map_err(|e| SnapshotError::LoadFailure {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        if !exists {
            return Err(SnapshotError::ReferenceMissing { path });
        }
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| SnapshotError::LoadFailure {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        compare::decode(&bytes).map_err(|e| SnapshotError::LoadFailure {
            path,
            reason: e.to_string(),
        })
    }

    async fn copy_reference(&self, key: &ArtifactKey) -> SnapshotResult<()> {
        let source = paths::artifact_path(&self.settings.reference_dir, key, "");
        let destination = paths::resolve(&self.settings.failure_dir, key, REFERENCE_COPY_SUFFIX).await?;
        remove_if_exists(&destination).await?;
        tokio::fs::copy(&source, &destination).await?;
        tracing::info!(path = %destination.display(), "copied reference into failure store");
        Ok(())
    }

    async fn delete_failures(&self, key: &ArtifactKey) -> SnapshotResult<()> {
        for suffix in ["", REFERENCE_COPY_SUFFIX] {
            let path = paths::artifact_path(&self.settings.failure_dir, key, suffix);
            if remove_if_exists(&path).await? {
                tracing::info!(path = %path.display(), "removed stale failure artifact");
            }
        }
        Ok(())
    }
}

/// Remove a file if present; returns whether something was removed
async fn remove_if_exists(path: &Path) -> SnapshotResult<bool> {
    if !tokio::fs::try_exists(path).await? {
        return Ok(false);
    }
    tokio::fs::remove_file(path).await?;
    Ok(true)
}
