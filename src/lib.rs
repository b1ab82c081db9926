#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod abort;
pub mod config;
pub mod detector;
pub mod diagnostics;
pub mod error;
pub mod image;

// Stage modules; public for tools and tests that drive a single stage.
pub mod analyzer;
pub mod candidates;
pub mod classify;
pub mod features;
pub mod score;
pub mod segment;
pub mod split;

// --- High-level re-exports -------------------------------------------------

// Main entry points: splitter + results.
pub use crate::abort::AbortHandle;
pub use crate::detector::{PageSplitter, SplitterParams};
pub use crate::error::{ScanSummary, SplitError, SplitResult};
pub use crate::segment::PageSlice;
pub use crate::split::{SplitCandidate, SplitPoints};

// Reports returned by the splitter.
pub use crate::analyzer::ImageReport;
pub use crate::diagnostics::{DetectionReport, SplitReport};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use book_splitter::prelude::*;
///
/// # fn main() -> Result<(), SplitError> {
/// let (w, h) = (64usize, 400usize);
/// let rgba = vec![255u8; w * h * 4];
/// let img = ImageRgba::new(w, h, 4, &rgba)?;
///
/// let splitter = PageSplitter::new(SplitterParams::default());
/// let report = splitter.detect(&img, Some(2))?;
/// println!("points={:?}", report.points.as_slice());
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::image::{ImageRgba, RgbaBuffer};
    pub use crate::{PageSplitter, SplitError, SplitResult, SplitterParams};
}

// --- Stage-level API (for tools & advanced users) --------------------------

pub mod stages {
    pub use crate::analyzer::{analyze_image, AnalyzerParams, Diagnosis, PossibleSeparator};
    pub use crate::candidates::{find_candidates, Candidate, CandidateOptions, ScanState};
    pub use crate::classify::{
        analyze_region, classify_slices, Classification, ClassifierParams, SliceAnalysis,
        SliceVerdict,
    };
    pub use crate::features::{extract_row_features, RowFeature, RowFeatureOptions};
    pub use crate::score::{BandFeatures, ScoreWeights};
    pub use crate::segment::segment_image;
    pub use crate::split::{select_split_points, Selection, SelectionMode, SelectionOptions};

    pub use crate::diagnostics::{
        DiagnosticEvent, EventKind, EventLevel, EventLog, InputDescriptor, PageSpan, Stage,
        StageTiming, TimingBreakdown,
    };
}
