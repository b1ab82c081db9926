//! Error types for the splitting pipeline.

use thiserror::Error;

/// Errors surfaced by detection and segmentation.
///
/// Conditions the pipeline recovers from on its own (too few guided
/// candidates, a slice with no sampled pixels) are reported as
/// [`DiagnosticEvent`](crate::diagnostics::DiagnosticEvent)s instead and never
/// show up here.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SplitError {
    /// Zero-sized image or a pixel buffer that does not match its geometry.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// Inconsistent configuration or page count.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Automatic mode found nothing above the score gate.
    #[error(
        "no split points found: {candidates} candidates, best score {}, gate {min_score:.1}, min page height {min_page_height}px{}",
        format_score(.best_score),
        format_scan(.scan)
    )]
    NoSplitPointsFound {
        candidates: usize,
        best_score: Option<f32>,
        min_score: f32,
        min_page_height: usize,
        /// Row scan behind the candidates; filled in by the splitter.
        scan: Option<ScanSummary>,
    },

    /// Every interval between split points was empty.
    #[error("segmentation produced no slices from {intervals} intervals")]
    EmptySegmentation { intervals: usize },

    /// The caller raised the abort flag.
    #[error("run aborted at row {row}")]
    Aborted { row: usize },
}

/// Row statistics of a detection run, attached to selection failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanSummary {
    pub rows: usize,
    /// Rows that are both gray and uniform.
    pub separator_rows: usize,
    /// Runs of separator rows, whatever their height.
    pub separator_runs: usize,
    pub min_separator_height: usize,
    pub max_separator_height: usize,
}

impl SplitError {
    /// Attach row statistics to a `NoSplitPointsFound`; other errors pass through.
    pub fn with_scan(self, summary: ScanSummary) -> Self {
        match self {
            SplitError::NoSplitPointsFound {
                candidates,
                best_score,
                min_score,
                min_page_height,
                ..
            } => SplitError::NoSplitPointsFound {
                candidates,
                best_score,
                min_score,
                min_page_height,
                scan: Some(summary),
            },
            other => other,
        }
    }
}

fn format_scan(scan: &Option<ScanSummary>) -> String {
    match scan {
        Some(s) => format!(
            "; {} of {} rows look like separators in {} runs, accepted run height {}..={}",
            s.separator_rows, s.rows, s.separator_runs, s.min_separator_height, s.max_separator_height
        ),
        None => String::new(),
    }
}

fn format_score(score: &Option<f32>) -> String {
    score
        .map(|s| format!("{s:.2}"))
        .unwrap_or_else(|| "-".to_string())
}

/// Result type for pipeline operations.
pub type SplitResult<T> = Result<T, SplitError>;
