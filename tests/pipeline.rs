mod common;

use std::sync::Arc;

use dump_severity::{
    AnalysisConfig, SeverityBand, SeverityEngine, VolumeClass, WasteCategory,
    error::DecodeError,
    pipeline::AnalysisPipeline,
    report::{Badge, display::{AnalysisStatus, StatusBoard}},
    storage::{
        DEFAULT_RECENT_LIMIT, MemoryStore, ReportStore, file::JsonLinesStore,
        worker::PersistenceWorker,
    },
};
use image::{Rgb, RgbImage};

use common::{encode_png, uniform_png};

#[tokio::test]
async fn dark_square_photo_is_moderate() {
    let pipeline = AnalysisPipeline::default();
    let outcome = pipeline
        .analyze_bytes(uniform_png(1000, 1000, [20, 20, 20]), Some("dump.png".into()))
        .await
        .unwrap();

    let report = &outcome.report;
    assert_eq!(report.metrics().total_pixels, 262_144);
    assert_eq!(report.metrics().dark_ratio, 1.0);
    assert_eq!(report.severity_band(), SeverityBand::Moderate);
    assert_eq!(report.severity_score(), 7);
    assert_eq!(report.volume_class(), VolumeClass::Medium);
    assert_eq!(report.category_guess(), WasteCategory::HouseholdConstruction);
    assert!(outcome.presentation.has_badge(Badge::Hazard));
    assert_eq!(outcome.context.origin.as_deref(), Some("dump.png"));
    assert!(outcome.persistence.is_none());
}

#[tokio::test]
async fn small_white_photo_is_low() {
    let pipeline = AnalysisPipeline::default();
    let outcome = pipeline
        .analyze_reader(&uniform_png(100, 100, [255, 255, 255])[..], None)
        .await
        .unwrap();

    assert_eq!(outcome.report.severity_band(), SeverityBand::Low);
    assert_eq!(outcome.report.severity_score(), 4);
    assert_eq!(outcome.report.metrics().rounded_brightness, 255);
    assert_eq!(
        outcome.report.category_guess(),
        WasteCategory::PlasticPackagingLitter
    );
    assert!(!outcome.presentation.has_badge(Badge::Hazard));
}

#[tokio::test]
async fn bad_input_never_reaches_storage() {
    let store = Arc::new(MemoryStore::new());
    let (handle, worker) = PersistenceWorker::spawn(store.clone());
    let pipeline = AnalysisPipeline::default().with_persistence(handle);

    let empty = pipeline.analyze_bytes(Vec::new(), None).await;
    assert!(matches!(empty, Err(DecodeError::Empty)));

    let garbage = pipeline.analyze_bytes(b"GIF89a-truncated".to_vec(), None).await;
    assert!(garbage.is_err());

    drop(pipeline);
    let stats = worker.await.unwrap();
    assert_eq!(stats.stored + stats.failed, 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn successful_analysis_is_persisted_once() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonLinesStore::new(dir.path().join("results.jsonl")));
    let (handle, worker) = PersistenceWorker::spawn(store.clone());
    let pipeline = AnalysisPipeline::default().with_persistence(handle);

    let outcome = pipeline
        .analyze_bytes(uniform_png(64, 64, [200, 200, 200]), Some("pile.png".into()))
        .await
        .unwrap();
    let id = outcome.persistence.unwrap().outcome().await.unwrap();

    drop(pipeline);
    assert_eq!(worker.await.unwrap().stored, 1);

    let recent = store.list_recent(DEFAULT_RECENT_LIMIT).unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].id, id);
    assert_eq!(recent[0].report, outcome.report);
    assert_eq!(recent[0].context.origin.as_deref(), Some("pile.png"));
}

#[tokio::test]
async fn file_input_uses_file_name_as_origin() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("street-corner.png");
    std::fs::write(&path, uniform_png(30, 20, [150, 150, 150])).unwrap();

    let outcome = AnalysisPipeline::default().analyze_file(&path).await.unwrap();
    assert_eq!(outcome.context.origin.as_deref(), Some("street-corner.png"));
    assert_eq!(outcome.report.category_guess(), WasteCategory::HouseholdOrganic);
}

#[tokio::test]
async fn missing_file_is_decode_error() {
    let result = AnalysisPipeline::default()
        .analyze_file("/definitely/not/here.png")
        .await;
    assert!(matches!(result, Err(DecodeError::Io(_))));
}

#[tokio::test]
async fn concurrent_analyses_are_independent() {
    let pipeline = AnalysisPipeline::default();
    let dark = pipeline.analyze_bytes(uniform_png(1000, 1000, [10, 10, 10]), None);
    let bright = pipeline.analyze_bytes(uniform_png(50, 50, [250, 250, 250]), None);

    let (dark, bright) = tokio::join!(dark, bright);
    assert_eq!(dark.unwrap().report.severity_band(), SeverityBand::Moderate);
    assert_eq!(bright.unwrap().report.severity_band(), SeverityBand::Low);
}

#[tokio::test]
async fn status_board_follows_pipeline() {
    let pipeline = AnalysisPipeline::default();
    let mut board = StatusBoard::new();

    board.image_loaded("broken.bin");
    board.analysing();
    match pipeline.analyze_bytes(b"nope".to_vec(), None).await {
        Ok(outcome) => board.show(&outcome.presentation),
        Err(_) => board.fail(),
    }
    assert_eq!(board.status(), AnalysisStatus::Failed);

    board.image_loaded("dump.png");
    board.analysing();
    match pipeline.analyze_bytes(uniform_png(20, 20, [0, 0, 0]), None).await {
        Ok(outcome) => board.show(&outcome.presentation),
        Err(_) => board.fail(),
    }
    assert_eq!(board.status(), AnalysisStatus::Analysed);
    assert!(board.is_badge_visible(Badge::Low));
}

#[test]
fn downscale_matches_aspect_rule() {
    let config = AnalysisConfig {
        sample_count: 50,
        seed: Some(3),
        ..AnalysisConfig::default()
    };
    let engine = SeverityEngine::new(config).unwrap();

    for (width, height, expected) in [
        (2000, 1000, 512 * 256),
        (600, 1200, 256 * 512),
        (300, 200, 300 * 200),
        (3, 900, 512),
    ] {
        let report = engine
            .analyze(&uniform_png(width, height, [128, 128, 128]))
            .unwrap();
        assert_eq!(report.metrics().total_pixels, expected, "{}x{}", width, height);
    }
}

#[test]
fn half_dark_raster_estimate_is_close() {
    let mut image = RgbImage::from_pixel(200, 200, Rgb([255, 255, 255]));
    for y in 0..200 {
        for x in 0..100 {
            image.put_pixel(x, y, Rgb([0, 0, 0]));
        }
    }
    let config = AnalysisConfig {
        seed: Some(11),
        ..AnalysisConfig::default()
    };
    let profile_engine = SeverityEngine::new(config).unwrap();
    let report = profile_engine.analyze(&encode_png(image)).unwrap();

    let ratio = report.metrics().dark_ratio;
    assert!((0.4..=0.6).contains(&ratio), "dark ratio {}", ratio);
}
