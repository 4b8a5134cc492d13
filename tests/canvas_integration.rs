//! Integration tests for the canvas renderer driven through the engine

use std::time::Duration;
use tempfile::TempDir;

use visual_snapshot::config::Settings;
use visual_snapshot::snapshot::{
    CanvasRenderer, Configuration, ConfigurationSet, Device, InterfaceStyle, SnapshotEngine,
    SnapshotError, TestCase, TextCard, view_factory,
};
use visual_snapshot::store::{approve_failures, list_failures};
use visual_snapshot::{OutcomeStatus, VerificationReport};

fn settings(tmp: &TempDir) -> Settings {
    Settings::defaults()
        .with_reference_dir(tmp.path().join("ref"))
        .with_failure_dir(tmp.path().join("fail"))
        .with_render_offset(12)
}

fn configs() -> ConfigurationSet {
    ConfigurationSet::matrix(
        &[Device::new("small", 96, 64)],
        &[InterfaceStyle::Light, InterfaceStyle::Dark],
    )
}

fn card(body: &'static str) -> TestCase<visual_snapshot::ViewFactory> {
    TestCase::new(
        "/suite/cards/tests.rs",
        "Card",
        Duration::from_millis(1),
        view_factory(move || TextCard::new("Title", body)),
    )
}

#[tokio::test]
async fn test_record_verify_and_regress() {
    let tmp = TempDir::new().unwrap();
    let recorder = SnapshotEngine::new(
        settings(&tmp).with_record_mode(true),
        CanvasRenderer,
    );
    let err = recorder.verify_all(&card("v1"), &configs()).await.unwrap_err();
    assert!(err.is_recorded());

    let recorded = image::open(tmp.path().join("ref/suite/cards/Card_small_dark.png")).unwrap();
    assert_eq!((recorded.width(), recorded.height()), (96, 64));

    let verifier = SnapshotEngine::new(settings(&tmp), CanvasRenderer);
    verifier.verify_all(&card("v1"), &configs()).await.unwrap();

    let outcomes = verifier.verify_each(&card("v2"), &configs()).await;
    let report = VerificationReport::new("Card", "/suite/cards/tests.rs", outcomes);
    assert!(!report.success);
    assert_eq!(report.count(OutcomeStatus::Failed), 2);

    let failures = list_failures(&tmp.path().join("fail")).unwrap();
    assert_eq!(failures.len(), 2);
    assert!(failures.iter().all(|f| f.is_mismatch()));
}

#[tokio::test]
async fn test_approve_failures_accepts_new_look() {
    let tmp = TempDir::new().unwrap();
    let engine = SnapshotEngine::new(settings(&tmp), CanvasRenderer);

    let err = engine.verify_all(&card("fresh"), &configs()).await.unwrap_err();
    assert!(matches!(err, SnapshotError::ReferenceMissing { .. }));

    let approved = approve_failures(&tmp.path().join("fail"), &tmp.path().join("ref")).unwrap();
    assert_eq!(approved.len(), 2);

    engine.verify_all(&card("fresh"), &configs()).await.unwrap();
    assert!(list_failures(&tmp.path().join("fail")).unwrap().is_empty());
}

#[tokio::test]
async fn test_default_configuration_set() {
    let tmp = TempDir::new().unwrap();
    let engine = SnapshotEngine::new(settings(&tmp), CanvasRenderer);
    let set = ConfigurationSet::default();
    assert_eq!(set.count(), 1);

    let err = engine.verify_all(&card("x"), &set).await.unwrap_err();
    match err {
        SnapshotError::ReferenceMissing { path } => {
            assert!(path.ends_with(format!("Card_{}.png", Configuration::default().id())))
        }
        other => panic!("expected ReferenceMissing, got {:?}", other),
    }
}
