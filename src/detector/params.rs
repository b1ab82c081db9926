//! Parameter types configuring the splitter stages.
//!
//! The separator height bounds and the gray/uniform thresholds drive row
//! feature extraction and the candidate scan. Score weights, selection knobs
//! and classifier thresholds are grouped in their own structs so that a JSON
//! config can override any subset of them.
//!
//! For tuning, start with [`SplitterParams::from_sensitivity`] and adjust the
//! separator height bounds.

use crate::analyzer::AnalyzerParams;
use crate::candidates::CandidateOptions;
use crate::classify::ClassifierParams;
use crate::error::{SplitError, SplitResult};
use crate::features::{BrightnessBand, GrayCriteria, RowFeatureOptions};
use crate::score::ScoreWeights;
use crate::split::SelectionOptions;
use serde::{Deserialize, Serialize};

/// Lowest and highest accepted sensitivity preset.
pub const SENSITIVITY_RANGE: (u8, u8) = (1, 10);
/// Preset used when none is given.
pub const DEFAULT_SENSITIVITY: u8 = 5;

/// Splitter-wide parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitterParams {
    /// Thinnest band accepted as a separator (rows).
    pub min_separator_height: usize,
    /// Thickest band accepted as a separator (rows).
    pub max_separator_height: usize,
    /// Minimum spacing between split points. `None` means 3% of the image
    /// height, never below one row.
    pub min_page_height: Option<usize>,
    /// Maximum channel spread of a gray pixel.
    pub gray_tolerance: f32,
    /// Maximum colour spread of a uniform row.
    pub uniform_threshold: f32,
    /// Maximum brightness range of a uniform row.
    pub range_threshold: f32,
    /// Target number of sampled columns per row.
    pub sample_columns: usize,
    /// Minimum share of gray pixels in a gray row.
    pub gray_row_ratio: f32,
    /// Brightness band of gray pixels and gray rows.
    pub gray_band: BrightnessBand,
    pub weights: ScoreWeights,
    pub selection: SelectionOptions,
    pub classifier: ClassifierParams,
    pub analyzer: AnalyzerParams,
}

impl Default for SplitterParams {
    fn default() -> Self {
        Self {
            min_separator_height: 5,
            max_separator_height: 50,
            min_page_height: None,
            gray_tolerance: 30.0,
            uniform_threshold: 20.0,
            range_threshold: 30.0,
            sample_columns: 100,
            gray_row_ratio: 0.7,
            gray_band: BrightnessBand::new(80.0, 220.0),
            weights: ScoreWeights::default(),
            selection: SelectionOptions::default(),
            classifier: ClassifierParams::default(),
            analyzer: AnalyzerParams::default(),
        }
    }
}

impl SplitterParams {
    /// Defaults with separator bounds taken from a 1..=10 sensitivity preset.
    ///
    /// Higher sensitivity accepts thinner and thicker bands:
    /// `min = max(3, 11 - s)`, `max = min(100, 10 * s)`.
    pub fn from_sensitivity(sensitivity: u8) -> SplitResult<Self> {
        let (lo, hi) = SENSITIVITY_RANGE;
        if !(lo..=hi).contains(&sensitivity) {
            return Err(SplitError::InvalidParameter(format!(
                "sensitivity must be in {lo}..={hi}, got {sensitivity}"
            )));
        }
        let s = sensitivity as usize;
        Ok(Self {
            min_separator_height: (11 - s).max(3),
            max_separator_height: (10 * s).min(100),
            ..Self::default()
        })
    }

    pub fn with_separator_height(mut self, min: usize, max: usize) -> Self {
        self.min_separator_height = min;
        self.max_separator_height = max;
        self
    }

    pub fn with_min_page_height(mut self, rows: usize) -> Self {
        self.min_page_height = Some(rows);
        self
    }

    pub fn with_gray_tolerance(mut self, tolerance: f32) -> Self {
        self.gray_tolerance = tolerance;
        self
    }

    pub fn with_uniform_threshold(mut self, threshold: f32) -> Self {
        self.uniform_threshold = threshold;
        self
    }

    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_selection(mut self, selection: SelectionOptions) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_classifier(mut self, classifier: ClassifierParams) -> Self {
        self.classifier = classifier;
        self
    }

    /// Reject inconsistent knobs before any pixel is read.
    pub fn validate(&self) -> SplitResult<()> {
        let fail = |msg: String| Err(SplitError::InvalidParameter(msg));
        if self.min_separator_height == 0 {
            return fail("min_separator_height must be at least 1".to_string());
        }
        if self.min_separator_height > self.max_separator_height {
            return fail(format!(
                "min_separator_height {} exceeds max_separator_height {}",
                self.min_separator_height, self.max_separator_height
            ));
        }
        if self.sample_columns == 0 {
            return fail("sample_columns must be at least 1".to_string());
        }
        let thresholds = [
            ("gray_tolerance", self.gray_tolerance),
            ("uniform_threshold", self.uniform_threshold),
            ("range_threshold", self.range_threshold),
            ("gray_row_ratio", self.gray_row_ratio),
            ("min_score", self.selection.min_score),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() || value < 0.0 {
                return fail(format!("{name} must be finite and non-negative, got {value}"));
            }
        }
        if self.gray_band.low >= self.gray_band.high {
            return fail(format!(
                "gray_band is empty: ({}, {})",
                self.gray_band.low, self.gray_band.high
            ));
        }
        for (name, value) in [
            ("covered_fraction", self.selection.covered_fraction),
            ("search_fraction", self.selection.search_fraction),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return fail(format!("{name} must be in (0, 1], got {value}"));
            }
        }
        Ok(())
    }

    /// Effective minimum page height for an image `height` rows tall.
    pub fn resolve_min_page_height(&self, height: usize) -> usize {
        self.min_page_height
            .unwrap_or((height as f64 * 0.03).floor() as usize)
            .max(1)
    }

    pub fn to_row_options(&self) -> RowFeatureOptions {
        RowFeatureOptions {
            sample_columns: self.sample_columns,
            gray: GrayCriteria {
                tolerance: self.gray_tolerance,
                band: self.gray_band,
            },
            range_threshold: self.range_threshold,
            uniform_threshold: self.uniform_threshold,
            gray_row_ratio: self.gray_row_ratio,
            gray_row_band: self.gray_band,
        }
    }

    pub fn to_candidate_options(&self) -> CandidateOptions {
        CandidateOptions {
            min_height: self.min_separator_height,
            max_height: self.max_separator_height,
            weights: self.weights,
        }
    }
}
