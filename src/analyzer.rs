//! Whole-image diagnostic analysis.
//!
//! Samples every `min(10, max(1, height / 10000))`-th row at full width and
//! collects brightness, colour variance (mean max-pairwise channel
//! difference) and gray/white/black ratios. Interior rows that stand out from
//! their predecessor or from the global averages are listed as possible
//! separators. When nothing stands out, a short diagnosis explains why
//! detection is likely to fail. Nothing here feeds back into segmentation.

use crate::abort::{checkpoint, AbortHandle, CHECKPOINT_ROWS};
use crate::diagnostics::{EventKind, EventLog, Stage};
use crate::error::SplitResult;
use crate::features::{brightness, channel_spread, BrightnessBand};
use crate::image::ImageRgba;
use serde::{Deserialize, Serialize};

/// Thresholds for the diagnostic scan.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerParams {
    pub max_row_stride: usize,
    pub rows_per_stride: usize,
    pub gray_tolerance: f32,
    pub gray_band: BrightnessBand,
    pub white_above: f32,
    pub black_below: f32,
    pub brightness_jump: f32,
    pub variance_jump: f32,
    pub gray_row_ratio: f32,
    pub darker_factor: f32,
    pub high_variance_factor: f32,
    /// Inputs above this many pixels get an oversize warning.
    pub max_pixels: usize,
}

impl Default for AnalyzerParams {
    fn default() -> Self {
        Self {
            max_row_stride: 10,
            rows_per_stride: 10_000,
            gray_tolerance: 30.0,
            gray_band: BrightnessBand::new(100.0, 230.0),
            white_above: 240.0,
            black_below: 15.0,
            brightness_jump: 5.0,
            variance_jump: 2.0,
            gray_row_ratio: 0.1,
            darker_factor: 0.9,
            high_variance_factor: 1.5,
            max_pixels: 200_000_000,
        }
    }
}

/// Statistics of one sampled row.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowSample {
    pub y: usize,
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub brightness: f32,
    pub variance: f32,
    pub gray_ratio: f32,
    pub white_ratio: f32,
    pub black_ratio: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    pub min_brightness: f32,
    pub max_brightness: f32,
    pub avg_brightness: f32,
    pub min_variance: f32,
    pub max_variance: f32,
    pub avg_variance: f32,
    pub total_rows: usize,
}

impl GlobalStats {
    pub fn brightness_range(&self) -> f32 {
        self.max_brightness - self.min_brightness
    }

    pub fn variance_range(&self) -> f32 {
        self.max_variance - self.min_variance
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SeparatorKind {
    Gray,
    Darker,
    HighVariance,
    AbruptChange,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PossibleSeparator {
    pub y: usize,
    pub brightness: f32,
    pub brightness_delta: f32,
    pub variance: f32,
    pub variance_delta: f32,
    pub gray_ratio: f32,
    pub white_ratio: f32,
    pub kind: SeparatorKind,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "issue", rename_all = "camelCase")]
pub enum Diagnosis {
    /// Every sampled row read as pure black.
    AllZeroPixels,
    NearBlank { brightness_range: f32 },
    NearUniformColor { avg_variance: f32 },
    MostlyWhite { white_ratio: f32 },
    NoGrayRegions { gray_ratio: f32 },
    Unknown,
}

impl Diagnosis {
    pub fn advice(&self) -> &'static str {
        match self {
            Diagnosis::AllZeroPixels => "re-export the image; the decoder returned only zeros",
            Diagnosis::NearBlank { .. } => "image is a single flat colour; check that it loaded",
            Diagnosis::NearUniformColor { .. } => "colours barely vary; mark split points by hand",
            Diagnosis::MostlyWhite { .. } => "image is almost entirely white; blank page?",
            Diagnosis::NoGrayRegions { .. } => {
                "separators may not be gray or may be very thin; raise sensitivity"
            }
            Diagnosis::Unknown => "no obvious features; try different detection parameters",
        }
    }
}

/// Full diagnostic report.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageReport {
    pub width: usize,
    pub height: usize,
    pub row_stride: usize,
    pub stats: GlobalStats,
    pub rows: Vec<RowSample>,
    pub possible_separators: Vec<PossibleSeparator>,
    pub diagnosis: Vec<Diagnosis>,
}

/// Vertical sampling step for an image `height` rows tall.
#[inline]
pub fn row_stride(height: usize, params: &AnalyzerParams) -> usize {
    (height / params.rows_per_stride.max(1)).clamp(1, params.max_row_stride.max(1))
}

/// Sample one row at full width.
pub fn sample_row(image: &ImageRgba<'_>, y: usize, params: &AnalyzerParams) -> RowSample {
    let (mut r, mut g, mut b) = (0f64, 0f64, 0f64);
    let (mut lum_sum, mut var_sum) = (0f64, 0f64);
    let (mut gray, mut white, mut black) = (0usize, 0usize, 0usize);
    for x in 0..image.w {
        let rgb = image.rgb(x, y);
        let lum = brightness(rgb);
        let diff = channel_spread(rgb);
        r += rgb[0] as f64;
        g += rgb[1] as f64;
        b += rgb[2] as f64;
        lum_sum += lum as f64;
        var_sum += diff as f64;
        if diff < params.gray_tolerance && params.gray_band.contains(lum) {
            gray += 1;
        }
        if lum > params.white_above {
            white += 1;
        }
        if lum < params.black_below {
            black += 1;
        }
    }
    let n = image.w.max(1) as f64;
    RowSample {
        y,
        r: (r / n) as f32,
        g: (g / n) as f32,
        b: (b / n) as f32,
        brightness: (lum_sum / n) as f32,
        variance: (var_sum / n) as f32,
        gray_ratio: (gray as f64 / n) as f32,
        white_ratio: (white as f64 / n) as f32,
        black_ratio: (black as f64 / n) as f32,
    }
}

/// Run the diagnostic scan.
pub fn analyze_image(
    image: &ImageRgba<'_>,
    params: &AnalyzerParams,
    abort: Option<&AbortHandle>,
    events: &mut EventLog,
) -> SplitResult<ImageReport> {
    image.validate()?;
    if image.pixel_count() > params.max_pixels {
        events.warn(
            Stage::Input,
            EventKind::OversizedImage,
            format!(
                "{:.1}M pixels exceeds {:.1}M; consider downscaling first",
                image.pixel_count() as f64 / 1e6,
                params.max_pixels as f64 / 1e6
            ),
        );
    }

    let stride = row_stride(image.h, params);
    let total = image.h.div_ceil(stride);
    let mut rows = Vec::with_capacity(total);
    for (i, y) in (0..image.h).step_by(stride).enumerate() {
        if i % CHECKPOINT_ROWS == 0 {
            checkpoint(abort, y)?;
            if i > 0 {
                log::debug!("analyzed {i}/{total} rows");
            }
        }
        rows.push(sample_row(image, y, params));
    }

    let stats = global_stats(&rows);
    events.info(
        Stage::Analysis,
        EventKind::StageSummary,
        format!(
            "brightness {:.2}..{:.2} (avg {:.2}), variance {:.2}..{:.2} (avg {:.2}) over {} rows",
            stats.min_brightness,
            stats.max_brightness,
            stats.avg_brightness,
            stats.min_variance,
            stats.max_variance,
            stats.avg_variance,
            stats.total_rows
        ),
    );

    if stats.max_brightness == 0.0 && stats.min_brightness == 0.0 {
        return Ok(ImageReport {
            width: image.w,
            height: image.h,
            row_stride: stride,
            stats,
            rows,
            possible_separators: Vec::new(),
            diagnosis: vec![Diagnosis::AllZeroPixels],
        });
    }

    let possible_separators = possible_separators(&rows, &stats, params);
    let diagnosis = if possible_separators.is_empty() {
        diagnose(&rows, &stats)
    } else {
        Vec::new()
    };
    Ok(ImageReport {
        width: image.w,
        height: image.h,
        row_stride: stride,
        stats,
        rows,
        possible_separators,
        diagnosis,
    })
}

fn global_stats(rows: &[RowSample]) -> GlobalStats {
    let mut stats = GlobalStats {
        min_brightness: 255.0,
        max_brightness: 0.0,
        avg_brightness: 0.0,
        min_variance: f32::INFINITY,
        max_variance: 0.0,
        avg_variance: 0.0,
        total_rows: rows.len(),
    };
    if rows.is_empty() {
        stats.min_variance = 0.0;
        return stats;
    }
    let (mut lum, mut var) = (0f64, 0f64);
    for row in rows {
        stats.min_brightness = stats.min_brightness.min(row.brightness);
        stats.max_brightness = stats.max_brightness.max(row.brightness);
        stats.min_variance = stats.min_variance.min(row.variance);
        stats.max_variance = stats.max_variance.max(row.variance);
        lum += row.brightness as f64;
        var += row.variance as f64;
    }
    stats.avg_brightness = (lum / rows.len() as f64) as f32;
    stats.avg_variance = (var / rows.len() as f64) as f32;
    stats
}

/// Interior rows that stand out; kinds are checked gray, darker, high variance.
pub fn possible_separators(
    rows: &[RowSample],
    stats: &GlobalStats,
    params: &AnalyzerParams,
) -> Vec<PossibleSeparator> {
    if rows.len() < 3 {
        return Vec::new();
    }
    let mut found = Vec::new();
    for i in 1..rows.len() - 1 {
        let (prev, curr) = (&rows[i - 1], &rows[i]);
        let brightness_delta = (curr.brightness - prev.brightness).abs();
        let variance_delta = (curr.variance - prev.variance).abs();
        let gray = curr.gray_ratio > params.gray_row_ratio;
        let darker = curr.brightness < stats.avg_brightness * params.darker_factor;
        let high_variance = curr.variance > stats.avg_variance * params.high_variance_factor;
        let abrupt =
            brightness_delta > params.brightness_jump || variance_delta > params.variance_jump;
        if !(gray || darker || high_variance || abrupt) {
            continue;
        }
        let kind = if gray {
            SeparatorKind::Gray
        } else if darker {
            SeparatorKind::Darker
        } else if high_variance {
            SeparatorKind::HighVariance
        } else {
            SeparatorKind::AbruptChange
        };
        found.push(PossibleSeparator {
            y: curr.y,
            brightness: curr.brightness,
            brightness_delta,
            variance: curr.variance,
            variance_delta,
            gray_ratio: curr.gray_ratio,
            white_ratio: curr.white_ratio,
            kind,
        });
    }
    found
}

/// Explain a scan that flagged nothing.
pub fn diagnose(rows: &[RowSample], stats: &GlobalStats) -> Vec<Diagnosis> {
    let mut out = Vec::new();
    if stats.brightness_range() < 10.0 {
        out.push(Diagnosis::NearBlank {
            brightness_range: stats.brightness_range(),
        });
    }
    if stats.avg_variance < 5.0 {
        out.push(Diagnosis::NearUniformColor {
            avg_variance: stats.avg_variance,
        });
    }
    if !rows.is_empty() {
        let n = rows.len() as f32;
        let gray_ratio = rows.iter().map(|r| r.gray_ratio).sum::<f32>() / n;
        let white_ratio = rows.iter().map(|r| r.white_ratio).sum::<f32>() / n;
        if white_ratio > 0.95 {
            out.push(Diagnosis::MostlyWhite { white_ratio });
        }
        if gray_ratio < 0.01 {
            out.push(Diagnosis::NoGrayRegions { gray_ratio });
        }
    }
    if out.is_empty() {
        out.push(Diagnosis::Unknown);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip(w: usize, h: usize, fill: impl Fn(usize) -> [u8; 3]) -> Vec<u8> {
        let mut data = Vec::with_capacity(w * h * 4);
        for y in 0..h {
            let [r, g, b] = fill(y);
            for _ in 0..w {
                data.extend_from_slice(&[r, g, b, 255]);
            }
        }
        data
    }

    #[test]
    fn row_stride_scales_with_height() {
        let p = AnalyzerParams::default();
        assert_eq!(row_stride(500, &p), 1);
        assert_eq!(row_stride(35_000, &p), 3);
        assert_eq!(row_stride(1_000_000, &p), 10);
    }

    #[test]
    fn white_image_is_diagnosed() {
        let data = strip(20, 50, |_| [255, 255, 255]);
        let img = ImageRgba::new(20, 50, 4, &data).unwrap();
        let mut events = EventLog::new();
        let report = analyze_image(&img, &AnalyzerParams::default(), None, &mut events).unwrap();
        assert!(report.possible_separators.is_empty());
        assert!(report
            .diagnosis
            .iter()
            .any(|d| matches!(d, Diagnosis::NearBlank { .. })));
        assert!(report
            .diagnosis
            .iter()
            .any(|d| matches!(d, Diagnosis::MostlyWhite { .. })));
        assert!(report
            .diagnosis
            .iter()
            .any(|d| matches!(d, Diagnosis::NoGrayRegions { .. })));
    }

    #[test]
    fn black_image_reports_zero_pixels() {
        let data = strip(10, 10, |_| [0, 0, 0]);
        let img = ImageRgba::new(10, 10, 4, &data).unwrap();
        let mut events = EventLog::new();
        let report = analyze_image(&img, &AnalyzerParams::default(), None, &mut events).unwrap();
        assert_eq!(report.diagnosis, vec![Diagnosis::AllZeroPixels]);
    }

    #[test]
    fn gray_band_is_flagged() {
        let data = strip(20, 100, |y| {
            if (40..45).contains(&y) {
                [128, 128, 128]
            } else {
                [250, 250, 250]
            }
        });
        let img = ImageRgba::new(20, 100, 4, &data).unwrap();
        let mut events = EventLog::new();
        let report = analyze_image(&img, &AnalyzerParams::default(), None, &mut events).unwrap();
        let gray_rows: Vec<usize> = report
            .possible_separators
            .iter()
            .filter(|s| s.kind == SeparatorKind::Gray)
            .map(|s| s.y)
            .collect();
        assert_eq!(gray_rows, vec![40, 41, 42, 43, 44]);
        assert!(report.diagnosis.is_empty());
        // The first white row after the band is an abrupt change.
        assert!(report
            .possible_separators
            .iter()
            .any(|s| s.y == 45 && s.kind == SeparatorKind::AbruptChange));
    }

    #[test]
    fn stats_track_extremes() {
        let data = strip(4, 30, |y| if y < 15 { [100, 100, 100] } else { [200, 200, 200] });
        let img = ImageRgba::new(4, 30, 4, &data).unwrap();
        let mut events = EventLog::new();
        let report = analyze_image(&img, &AnalyzerParams::default(), None, &mut events).unwrap();
        assert_eq!(report.stats.total_rows, 30);
        assert!((report.stats.min_brightness - 100.0).abs() < 1e-4);
        assert!((report.stats.max_brightness - 200.0).abs() < 1e-4);
        assert!((report.stats.avg_brightness - 150.0).abs() < 1e-3);
    }
}
