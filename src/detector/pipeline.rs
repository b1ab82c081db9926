//! Splitter pipeline orchestrating detection and segmentation.
//!
//! The [`PageSplitter`] exposes a small API: feed an RGBA strip and get the
//! split points with detailed diagnostics, or the cut and classified pages.
//!
//! Typical usage:
//! ```no_run
//! use book_splitter::{PageSplitter, SplitterParams};
//! use book_splitter::image::ImageRgba;
//!
//! # fn example(strip: ImageRgba<'_>) -> book_splitter::SplitResult<()> {
//! let splitter = PageSplitter::new(SplitterParams::default());
//! let report = splitter.split(&strip, Some(4))?;
//! for page in report.pages() {
//!     println!("page {}: rows {}..{}", page.index + 1, page.start_y, page.end_y);
//! }
//! # Ok(())
//! # }
//! ```

// Stages
// - Features: one RowFeature per row, chunked by 1000 rows (parallel).
// - Candidates: FSM scan over the features, scored and ranked.
// - Selection: guided (expected page count) or automatic (score gate).
// - Segmentation: full-width crops between adjacent split points.
// - Classification: drop slices that look like separators or slivers.

use super::params::SplitterParams;
use crate::abort::AbortHandle;
use crate::analyzer::{analyze_image, ImageReport};
use crate::candidates::find_candidates;
use crate::classify::classify_slices;
use crate::diagnostics::{
    page_distribution, DetectionReport, EventKind, EventLog, InputDescriptor, SplitReport, Stage,
    TimingBreakdown,
};
use crate::error::{ScanSummary, SplitError, SplitResult};
use crate::features::extract_row_features;
use crate::image::ImageRgba;
use crate::segment::segment_image;
use crate::split::select_split_points;
use std::time::Instant;

/// Gray-separator page splitter.
///
/// Holds no per-image state; one instance may process many strips, from
/// several threads at once.
#[derive(Clone, Debug, Default)]
pub struct PageSplitter {
    params: SplitterParams,
    abort: Option<AbortHandle>,
}

impl PageSplitter {
    pub fn new(params: SplitterParams) -> Self {
        Self {
            params,
            abort: None,
        }
    }

    /// Poll `handle` at every row-chunk checkpoint.
    pub fn with_abort(mut self, handle: AbortHandle) -> Self {
        self.abort = Some(handle);
        self
    }

    pub fn params(&self) -> &SplitterParams {
        &self.params
    }

    pub fn set_params(&mut self, params: SplitterParams) {
        self.params = params;
    }

    /// Detect split points.
    ///
    /// `expected_pages` of `None` or `Some(0)` selects automatic mode.
    pub fn detect(
        &self,
        image: &ImageRgba<'_>,
        expected_pages: Option<usize>,
    ) -> SplitResult<DetectionReport> {
        let mut events = EventLog::new();
        let mut timings = TimingBreakdown::default();
        self.detect_with(image, expected_pages, &mut events, &mut timings)
            .map(|report| DetectionReport {
                events: events.into_events(),
                timings,
                ..report
            })
    }

    /// Detect, cut and classify.
    pub fn split(
        &self,
        image: &ImageRgba<'_>,
        expected_pages: Option<usize>,
    ) -> SplitResult<SplitReport> {
        let mut events = EventLog::new();
        let mut timings = TimingBreakdown::default();
        let detection = self.detect_with(image, expected_pages, &mut events, &mut timings)?;

        let start = Instant::now();
        let slices = segment_image(image, detection.points.as_slice(), &mut events)?;
        timings.record("segment", start);

        let start = Instant::now();
        let classification =
            classify_slices(&slices, image.h, &self.params.classifier, &mut events);
        timings.record("classify", start);

        log::debug!(
            "split {}x{} into {} slices, kept {} in {:.3} ms",
            image.w,
            image.h,
            slices.len(),
            classification.kept_count(),
            timings.total_ms
        );
        Ok(SplitReport {
            detection: DetectionReport {
                events: events.into_events(),
                timings,
                ..detection
            },
            slices,
            classification,
        })
    }

    /// Whole-image diagnostic scan; independent of detection.
    pub fn analyze(&self, image: &ImageRgba<'_>) -> SplitResult<(ImageReport, EventLog)> {
        let mut events = EventLog::new();
        let report = analyze_image(image, &self.params.analyzer, self.abort.as_ref(), &mut events)?;
        Ok((report, events))
    }

    fn detect_with(
        &self,
        image: &ImageRgba<'_>,
        expected_pages: Option<usize>,
        events: &mut EventLog,
        timings: &mut TimingBreakdown,
    ) -> SplitResult<DetectionReport> {
        image.validate()?;
        self.params.validate()?;
        let pages = expected_pages.unwrap_or(0);
        if pages > image.h {
            return Err(SplitError::InvalidParameter(format!(
                "cannot split {} rows into {pages} pages",
                image.h
            )));
        }
        let min_page_height = self.params.resolve_min_page_height(image.h);

        if image.pixel_count() > self.params.analyzer.max_pixels {
            events.warn(
                Stage::Input,
                EventKind::OversizedImage,
                format!(
                    "{}x{} ({:.1}M pixels) is above the {:.1}M pixel budget",
                    image.w,
                    image.h,
                    image.pixel_count() as f64 / 1e6,
                    self.params.analyzer.max_pixels as f64 / 1e6
                ),
            );
        }

        let start = Instant::now();
        let rows = extract_row_features(image, &self.params.to_row_options(), self.abort.as_ref())?;
        let ms = timings.record("features", start);
        let separator_rows = rows.iter().filter(|r| r.is_separator_row()).count();
        let separator_runs = rows
            .iter()
            .enumerate()
            .filter(|(i, r)| r.is_separator_row() && (*i == 0 || !rows[i - 1].is_separator_row()))
            .count();
        let scan = ScanSummary {
            rows: rows.len(),
            separator_rows,
            separator_runs,
            min_separator_height: self.params.min_separator_height,
            max_separator_height: self.params.max_separator_height,
        };
        events.info(
            Stage::Features,
            EventKind::StageSummary,
            format!(
                "{} rows, {separator_rows} separator rows ({ms:.3} ms)",
                rows.len()
            ),
        );

        let start = Instant::now();
        let candidates = find_candidates(&rows, &self.params.to_candidate_options());
        timings.record("candidates", start);
        events.info(
            Stage::Candidates,
            EventKind::StageSummary,
            format!(
                "{} candidates with height in [{}, {}]",
                candidates.len(),
                self.params.min_separator_height,
                self.params.max_separator_height
            ),
        );

        let start = Instant::now();
        let selection = select_split_points(
            &candidates,
            pages,
            image.h,
            min_page_height,
            &self.params.selection,
            events,
        )
        .map_err(|e| e.with_scan(scan))?;
        timings.record("select", start);

        let points = selection.points.clone();
        Ok(DetectionReport {
            input: InputDescriptor {
                width: image.w,
                height: image.h,
                channels: image.channels,
                expected_pages: expected_pages.filter(|&p| p > 0),
                min_page_height,
            },
            pages: page_distribution(&points),
            points,
            candidates,
            selection,
            events: Vec::new(),
            timings: TimingBreakdown::default(),
        })
    }
}
