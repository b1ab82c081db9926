mod common;

use book_splitter::classify::{classify_slices, ClassifierParams};
use book_splitter::diagnostics::{EventKind, EventLog};
use book_splitter::image::ImageRgba;
use book_splitter::segment::segment_image;
use book_splitter::stages::{analyze_image, AnalyzerParams};
use book_splitter::{AbortHandle, PageSplitter, SplitError, SplitterParams};
use common::synthetic_image::{
    banded_strip_rgba, paint_bands, rgba_to_rgb, text_page_rgba, Band,
};

const WHITE: [u8; 3] = [250, 250, 250];

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn text_strip(width: usize, height: usize, bands: &[Band]) -> Vec<u8> {
    let mut img = text_page_rgba(width, height, 7);
    paint_bands(&mut img, width, bands);
    img
}

#[test]
fn two_gray_bands_split_into_three_pages() {
    init_logger();
    let data = banded_strip_rgba(
        60,
        1000,
        WHITE,
        &[Band::gray(300, 320, 128), Band::gray(600, 620, 128)],
    );
    let image = ImageRgba::new(60, 1000, 4, &data).unwrap();
    let report = PageSplitter::default().split(&image, Some(3)).unwrap();

    assert_eq!(report.detection.points.as_slice(), &[0, 310, 610, 1000]);
    let heights: Vec<usize> = report.pages().map(|p| p.height).collect();
    assert_eq!(heights, vec![310, 300, 390]);
    assert!(report.detection.candidates.iter().all(|c| c.score > 90.0));
    assert_eq!(report.detection.selection.synthesized_count(), 0);
}

#[test]
fn blank_strip_has_no_automatic_split_points() {
    init_logger();
    let data = banded_strip_rgba(40, 500, [255, 255, 255], &[]);
    let image = ImageRgba::new(40, 500, 4, &data).unwrap();
    let err = PageSplitter::default().detect(&image, None).unwrap_err();
    match err {
        SplitError::NoSplitPointsFound {
            candidates,
            best_score,
            min_page_height,
            ..
        } => {
            assert_eq!(candidates, 0);
            assert_eq!(best_score, None);
            assert_eq!(min_page_height, 15);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn single_band_with_four_pages_is_repaired() {
    init_logger();
    let data = banded_strip_rgba(40, 1000, WHITE, &[Band::gray(490, 510, 128)]);
    let image = ImageRgba::new(40, 1000, 4, &data).unwrap();
    let report = PageSplitter::default().detect(&image, Some(4)).unwrap();

    assert_eq!(report.points.as_slice(), &[0, 250, 500, 750, 1000]);
    assert!(report.selection.repaired);
    assert_eq!(report.selection.synthesized_count(), 2);
    assert!(report
        .events
        .iter()
        .any(|e| e.kind == EventKind::InsufficientCandidates));
    assert_eq!(
        report
            .events
            .iter()
            .filter(|e| e.kind == EventKind::SyntheticSplit)
            .count(),
        2
    );
}

#[test]
fn thin_uniform_gray_slice_is_filtered() {
    init_logger();
    let data = text_strip(80, 1000, &[Band::gray(400, 415, 150)]);
    let image = ImageRgba::new(80, 1000, 4, &data).unwrap();
    let mut events = EventLog::new();
    let slices = segment_image(&image, &[0, 400, 415, 1000], &mut events).unwrap();
    let classification =
        classify_slices(&slices, 1000, &ClassifierParams::default(), &mut events);

    let flagged: Vec<bool> = classification.verdicts.iter().map(|v| v.filtered).collect();
    assert_eq!(flagged, vec![false, true, false]);
    assert!(classification.verdicts[1].uniform_gray);
    assert!(!classification.fallback_to_unfiltered);
    assert_eq!(classification.kept_count(), 2);
}

#[test]
fn tall_gray_slices_are_never_flagged_as_separators() {
    let data = banded_strip_rgba(30, 1000, [150, 150, 150], &[]);
    let image = ImageRgba::new(30, 1000, 4, &data).unwrap();
    let mut events = EventLog::new();
    let slices = segment_image(&image, &[0, 150, 1000], &mut events).unwrap();
    let classification =
        classify_slices(&slices, 1000, &ClassifierParams::default(), &mut events);
    assert!(classification
        .verdicts
        .iter()
        .all(|v| !v.gray_separator && !v.uniform_gray && !v.filtered));
}

#[test]
fn all_flagged_slices_fall_back_to_the_unfiltered_set() {
    let data = banded_strip_rgba(30, 100, [150, 150, 150], &[]);
    let image = ImageRgba::new(30, 100, 4, &data).unwrap();
    let mut events = EventLog::new();
    let slices = segment_image(&image, &[0, 50, 100], &mut events).unwrap();
    let classification =
        classify_slices(&slices, 10_000, &ClassifierParams::default(), &mut events);
    assert!(classification.verdicts.iter().all(|v| v.filtered));
    assert!(classification.fallback_to_unfiltered);
    assert_eq!(classification.kept_count(), 2);
    assert!(events.contains(EventKind::AllSlicesFiltered));
}

#[test]
fn automatic_mode_finds_bands_between_text_pages() {
    init_logger();
    let data = text_strip(
        120,
        3000,
        &[Band::gray(1000, 1020, 128), Band::gray(2000, 2020, 128)],
    );
    let image = ImageRgba::new(120, 3000, 4, &data).unwrap();
    let report = PageSplitter::default().split(&image, None).unwrap();

    assert_eq!(report.detection.points.as_slice(), &[0, 1010, 2010, 3000]);
    assert_eq!(report.detection.candidates.len(), 2);
    assert_eq!(report.pages().count(), 3);
    let total: f32 = report.detection.pages.iter().map(|p| p.percent).sum();
    assert!((total - 100.0).abs() < 1e-3);
}

#[test]
fn guided_mode_returns_exactly_one_point_less_than_pages() {
    let data = text_strip(
        64,
        2000,
        &[
            Band::gray(380, 400, 128),
            Band::gray(395 + 400, 410 + 400, 140),
            Band::gray(1590, 1600, 120),
        ],
    );
    let image = ImageRgba::new(64, 2000, 4, &data).unwrap();
    let splitter = PageSplitter::default();
    for pages in 1..=9 {
        let report = splitter.detect(&image, Some(pages)).unwrap();
        let points = report.points.as_slice();
        assert_eq!(points.len(), pages + 1, "pages={pages}");
        assert_eq!(points[0], 0);
        assert_eq!(points[pages], 2000);
        assert!(points.windows(2).all(|w| w[0] < w[1]), "pages={pages}");
    }
}

#[test]
fn candidates_respect_separator_height_bounds() {
    let bands = [
        Band::gray(100, 103, 128),
        Band::gray(300, 308, 128),
        Band::gray(500, 530, 128),
        Band::gray(700, 760, 128),
    ];
    let data = text_strip(50, 1000, &bands);
    let image = ImageRgba::new(50, 1000, 4, &data).unwrap();
    let params = SplitterParams::default();
    let report = PageSplitter::new(params.clone())
        .detect(&image, Some(2))
        .unwrap();

    let mut heights: Vec<usize> = report.candidates.iter().map(|c| c.height).collect();
    heights.sort_unstable();
    assert_eq!(heights, vec![8, 30]);
    assert!(report.candidates.iter().all(|c| {
        c.height >= params.min_separator_height && c.height <= params.max_separator_height
    }));
}

#[test]
fn detection_is_idempotent() {
    let data = text_strip(
        90,
        1500,
        &[Band::gray(500, 512, 128), Band::gray(990, 1030, 160)],
    );
    let image = ImageRgba::new(90, 1500, 4, &data).unwrap();
    let splitter = PageSplitter::default();
    let first = splitter.detect(&image, Some(3)).unwrap();
    let second = splitter.detect(&image, Some(3)).unwrap();
    assert_eq!(first.points, second.points);
    assert_eq!(first.candidates, second.candidates);
    assert_eq!(first.selection, second.selection);
}

#[test]
fn rgb_input_matches_rgba_input() {
    let rgba = banded_strip_rgba(
        40,
        800,
        WHITE,
        &[Band::gray(200, 215, 128), Band::gray(500, 515, 128)],
    );
    let rgb = rgba_to_rgb(&rgba);
    let splitter = PageSplitter::default();
    let a = splitter
        .detect(&ImageRgba::new(40, 800, 4, &rgba).unwrap(), Some(3))
        .unwrap();
    let b = splitter
        .detect(&ImageRgba::new(40, 800, 3, &rgb).unwrap(), Some(3))
        .unwrap();
    assert_eq!(a.points, b.points);
    assert_eq!(a.points.as_slice(), &[0, 207, 507, 800]);
}

#[test]
fn abort_raised_from_another_thread_stops_the_run() {
    let data = banded_strip_rgba(16, 5000, WHITE, &[]);
    let image = ImageRgba::new(16, 5000, 4, &data).unwrap();
    let handle = AbortHandle::new();
    let remote = handle.clone();
    std::thread::spawn(move || remote.abort()).join().unwrap();

    let err = PageSplitter::default()
        .with_abort(handle)
        .split(&image, Some(2))
        .unwrap_err();
    assert!(matches!(err, SplitError::Aborted { .. }));
}

#[test]
fn analyzer_points_at_gray_band() {
    init_logger();
    let data = text_strip(100, 600, &[Band::gray(300, 306, 128)]);
    let image = ImageRgba::new(100, 600, 4, &data).unwrap();
    let mut events = EventLog::new();
    let report = analyze_image(&image, &AnalyzerParams::default(), None, &mut events).unwrap();
    assert_eq!(report.row_stride, 1);
    assert!(report
        .possible_separators
        .iter()
        .any(|s| s.y == 303 && s.gray_ratio > 0.99));
    assert!(report.diagnosis.is_empty());
}
