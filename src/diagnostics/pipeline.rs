use crate::candidates::Candidate;
use crate::classify::Classification;
use crate::diagnostics::{DiagnosticEvent, TimingBreakdown};
use crate::segment::PageSlice;
use crate::split::{Selection, SplitPoints};
use serde::Serialize;

/// Result produced by [`PageSplitter::detect`](crate::PageSplitter::detect).
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionReport {
    pub input: InputDescriptor,
    pub points: SplitPoints,
    /// Every candidate, best first.
    pub candidates: Vec<Candidate>,
    pub selection: Selection,
    pub pages: Vec<PageSpan>,
    pub events: Vec<DiagnosticEvent>,
    pub timings: TimingBreakdown,
}

impl DetectionReport {
    /// The `n` best-ranked candidates.
    pub fn top_candidates(&self, n: usize) -> &[Candidate] {
        &self.candidates[..n.min(self.candidates.len())]
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDescriptor {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_pages: Option<usize>,
    pub min_page_height: usize,
}

/// One page of the distribution summary; `index` is 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSpan {
    pub index: usize,
    pub start_y: usize,
    pub end_y: usize,
    pub height: usize,
    /// Share of the image height in percent.
    pub percent: f32,
}

/// Page distribution implied by a set of split points.
pub fn page_distribution(points: &SplitPoints) -> Vec<PageSpan> {
    let total = points.height().max(1) as f32;
    points
        .intervals()
        .enumerate()
        .map(|(i, (start, end))| PageSpan {
            index: i + 1,
            start_y: start,
            end_y: end,
            height: end - start,
            percent: (end - start) as f32 * 100.0 / total,
        })
        .collect()
}

/// Result produced by [`PageSplitter::split`](crate::PageSplitter::split).
///
/// Events and timings of the segmentation and classification stages are
/// appended to the embedded detection report.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitReport {
    pub detection: DetectionReport,
    #[serde(skip)]
    pub slices: Vec<PageSlice>,
    pub classification: Classification,
}

impl SplitReport {
    /// Slices that survived classification, in top-to-bottom order.
    ///
    /// When every slice was flagged this is the unfiltered set.
    pub fn pages(&self) -> impl Iterator<Item = &PageSlice> + '_ {
        self.slices
            .iter()
            .enumerate()
            .filter(|(i, _)| self.classification.keeps(*i))
            .map(|(_, s)| s)
    }

    pub fn into_pages(self) -> Vec<PageSlice> {
        let classification = self.classification;
        self.slices
            .into_iter()
            .enumerate()
            .filter(|(i, _)| classification.keeps(*i))
            .map(|(_, s)| s)
            .collect()
    }
}
