//! Per-row pixel statistics.
//!
//! Each row is reduced to a [`RowFeature`]: mean colour, mean brightness, the
//! share of gray pixels, the brightness range and a colour-spread metric.
//! Pixels are sampled horizontally at `max(1, width / sample_columns)`, so a
//! row costs roughly `sample_columns` pixel reads regardless of width.
//!
//! Rows are processed in contiguous chunks of [`CHECKPOINT_ROWS`]; with the
//! `parallel` feature the chunks run on the rayon pool and are concatenated
//! back in row order. The same [`PixelAccumulator`] also backs the slice
//! classifier, which only differs in its gray brightness band.

use crate::abort::{checkpoint, AbortHandle, CHECKPOINT_ROWS};
use crate::error::SplitResult;
use crate::image::ImageRgba;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Open brightness interval `(low, high)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BrightnessBand {
    pub low: f32,
    pub high: f32,
}

impl BrightnessBand {
    pub const fn new(low: f32, high: f32) -> Self {
        Self { low, high }
    }

    #[inline]
    pub fn contains(&self, brightness: f32) -> bool {
        brightness > self.low && brightness < self.high
    }
}

/// What counts as a gray pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GrayCriteria {
    /// Maximum pairwise channel difference (exclusive).
    pub tolerance: f32,
    /// Brightness band a gray pixel must fall into.
    pub band: BrightnessBand,
}

impl GrayCriteria {
    #[inline]
    pub fn is_gray(&self, rgb: [u8; 3], brightness: f32) -> bool {
        channel_spread(rgb) < self.tolerance && self.band.contains(brightness)
    }
}

/// Largest pairwise channel difference `max(|r-g|, |g-b|, |r-b|)`.
#[inline]
pub fn channel_spread([r, g, b]: [u8; 3]) -> f32 {
    let (r, g, b) = (r as i16, g as i16, b as i16);
    (r - g).abs().max((g - b).abs()).max((r - b).abs()) as f32
}

#[inline]
pub fn brightness([r, g, b]: [u8; 3]) -> f32 {
    (r as f32 + g as f32 + b as f32) / 3.0
}

/// Running sums over a set of sampled pixels.
#[derive(Clone, Debug)]
pub(crate) struct PixelAccumulator {
    r_sum: f64,
    g_sum: f64,
    b_sum: f64,
    variance_sum: f64,
    gray: usize,
    count: usize,
    min_brightness: f32,
    max_brightness: f32,
}

/// Means and extrema produced by [`PixelAccumulator::finish`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct PixelSummary {
    pub avg_r: f32,
    pub avg_g: f32,
    pub avg_b: f32,
    pub brightness: f32,
    pub gray_ratio: f32,
    pub spread: f32,
    pub min_brightness: f32,
    pub max_brightness: f32,
    pub count: usize,
}

impl PixelSummary {
    #[inline]
    pub fn brightness_range(&self) -> f32 {
        self.max_brightness - self.min_brightness
    }
}

impl PixelAccumulator {
    pub fn new() -> Self {
        Self {
            r_sum: 0.0,
            g_sum: 0.0,
            b_sum: 0.0,
            variance_sum: 0.0,
            gray: 0,
            count: 0,
            min_brightness: 255.0,
            max_brightness: 0.0,
        }
    }

    #[inline]
    pub fn push(&mut self, rgb: [u8; 3], criteria: &GrayCriteria) {
        let [r, g, b] = rgb;
        let (rf, gf, bf) = (r as f32, g as f32, b as f32);
        let lum = brightness(rgb);
        self.r_sum += rf as f64;
        self.g_sum += gf as f64;
        self.b_sum += bf as f64;
        self.min_brightness = self.min_brightness.min(lum);
        self.max_brightness = self.max_brightness.max(lum);
        let var = ((rf - lum).powi(2) + (gf - lum).powi(2) + (bf - lum).powi(2)) / 3.0;
        self.variance_sum += var as f64;
        if criteria.is_gray(rgb, lum) {
            self.gray += 1;
        }
        self.count += 1;
    }

    /// `None` when nothing was sampled.
    pub fn finish(&self) -> Option<PixelSummary> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f64;
        let avg_r = (self.r_sum / n) as f32;
        let avg_g = (self.g_sum / n) as f32;
        let avg_b = (self.b_sum / n) as f32;
        Some(PixelSummary {
            avg_r,
            avg_g,
            avg_b,
            brightness: (avg_r + avg_g + avg_b) / 3.0,
            gray_ratio: (self.gray as f64 / n) as f32,
            spread: (self.variance_sum / n).sqrt() as f32,
            min_brightness: self.min_brightness,
            max_brightness: self.max_brightness,
            count: self.count,
        })
    }
}

/// Knobs for row feature extraction.
#[derive(Clone, Copy, Debug)]
pub struct RowFeatureOptions {
    /// Target number of sampled columns per row.
    pub sample_columns: usize,
    /// Gray pixel test used for `gray_ratio`.
    pub gray: GrayCriteria,
    /// A row is uniform when its brightness range is below this.
    pub range_threshold: f32,
    /// ... and its colour spread is below this.
    pub uniform_threshold: f32,
    /// Minimum `gray_ratio` for a gray row.
    pub gray_row_ratio: f32,
    /// Mean brightness band for a gray row.
    pub gray_row_band: BrightnessBand,
}

impl Default for RowFeatureOptions {
    fn default() -> Self {
        let band = BrightnessBand::new(80.0, 220.0);
        Self {
            sample_columns: 100,
            gray: GrayCriteria {
                tolerance: 30.0,
                band,
            },
            range_threshold: 30.0,
            uniform_threshold: 20.0,
            gray_row_ratio: 0.7,
            gray_row_band: band,
        }
    }
}

/// Statistics of a single image row.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowFeature {
    pub y: usize,
    pub avg_r: f32,
    pub avg_g: f32,
    pub avg_b: f32,
    pub brightness: f32,
    pub gray_ratio: f32,
    pub brightness_range: f32,
    pub spread: f32,
    pub is_uniform: bool,
    pub is_gray_row: bool,
}

impl RowFeature {
    /// Row qualifies as part of a separator band.
    #[inline]
    pub fn is_separator_row(&self) -> bool {
        self.is_gray_row && self.is_uniform
    }

    fn from_summary(y: usize, s: &PixelSummary, opts: &RowFeatureOptions) -> Self {
        let brightness_range = s.brightness_range();
        Self {
            y,
            avg_r: s.avg_r,
            avg_g: s.avg_g,
            avg_b: s.avg_b,
            brightness: s.brightness,
            gray_ratio: s.gray_ratio,
            brightness_range,
            spread: s.spread,
            is_uniform: brightness_range < opts.range_threshold
                && s.spread < opts.uniform_threshold,
            is_gray_row: s.gray_ratio > opts.gray_row_ratio
                && opts.gray_row_band.contains(s.brightness),
        }
    }
}

/// Horizontal sampling step for a row of `width` pixels.
#[inline]
pub fn column_stride(width: usize, sample_columns: usize) -> usize {
    (width / sample_columns.max(1)).max(1)
}

/// Compute the feature of row `y`, sampling every `stride`-th column.
pub fn row_feature(
    image: &ImageRgba<'_>,
    y: usize,
    stride: usize,
    opts: &RowFeatureOptions,
) -> RowFeature {
    let mut acc = PixelAccumulator::new();
    for x in (0..image.w).step_by(stride.max(1)) {
        acc.push(image.rgb(x, y), &opts.gray);
    }
    // width > 0 is validated upstream, so at least one pixel was sampled.
    let summary = acc.finish().unwrap_or_default();
    RowFeature::from_summary(y, &summary, opts)
}

/// Extract one feature per row, in row order.
pub fn extract_row_features(
    image: &ImageRgba<'_>,
    opts: &RowFeatureOptions,
    abort: Option<&AbortHandle>,
) -> SplitResult<Vec<RowFeature>> {
    image.validate()?;
    let stride = column_stride(image.w, opts.sample_columns);
    let chunks = row_chunks(image.h, CHECKPOINT_ROWS);

    let compute = |rows: &Range<usize>| -> SplitResult<Vec<RowFeature>> {
        checkpoint(abort, rows.start)?;
        Ok(rows
            .clone()
            .map(|y| row_feature(image, y, stride, opts))
            .collect())
    };

    #[cfg(feature = "parallel")]
    let parts: Vec<Vec<RowFeature>> = chunks
        .par_iter()
        .map(compute)
        .collect::<SplitResult<_>>()?;
    #[cfg(not(feature = "parallel"))]
    let parts: Vec<Vec<RowFeature>> = chunks.iter().map(compute).collect::<SplitResult<_>>()?;

    Ok(parts.into_iter().flatten().collect())
}

/// Split `0..height` into contiguous ranges of at most `chunk` rows.
pub(crate) fn row_chunks(height: usize, chunk: usize) -> Vec<Range<usize>> {
    let chunk = chunk.max(1);
    (0..height)
        .step_by(chunk)
        .map(|start| start..(start + chunk).min(height))
        .collect()
}
