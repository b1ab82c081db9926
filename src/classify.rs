//! Post-crop classifier that recognises leftover separator slivers.
//!
//! Each slice is summarised over at most `max_sample_pixels` pixels (row-major
//! order, fixed stride). A slice is flagged when it is too short relative to
//! the whole strip, or when it is short and looks like a gray or uniform
//! band. Flagging never removes data; callers read [`Classification`] to
//! decide which slices to keep, and get the full set back when every slice
//! was flagged.

use crate::diagnostics::{EventKind, EventLog, Stage};
use crate::features::{BrightnessBand, GrayCriteria, PixelAccumulator};
use crate::image::ImageRgba;
use crate::segment::{PageSlice, SliceDescriptor};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierParams {
    /// Upper bound on inspected pixels per slice.
    pub max_sample_pixels: usize,
    pub gray_tolerance: f32,
    /// Brightness band of a gray pixel.
    pub gray_band: BrightnessBand,
    /// `is_uniform` needs a brightness range below this...
    pub uniform_range: f32,
    /// ...and a colour variance below this.
    pub uniform_variance: f32,
    /// Slices shorter than this share of the strip height are dropped.
    pub min_page_fraction: f32,
    /// Gray/uniform rules only apply below this height.
    pub separator_max_height: usize,
    pub gray_separator_ratio: f32,
    pub gray_separator_variance: f32,
    /// Mean brightness band of a uniform separator.
    pub uniform_brightness: BrightnessBand,
}

impl Default for ClassifierParams {
    fn default() -> Self {
        Self {
            max_sample_pixels: 100_000,
            gray_tolerance: 30.0,
            gray_band: BrightnessBand::new(100.0, 230.0),
            uniform_range: 30.0,
            uniform_variance: 15.0,
            min_page_fraction: 0.02,
            separator_max_height: 100,
            gray_separator_ratio: 0.6,
            gray_separator_variance: 20.0,
            uniform_brightness: BrightnessBand::new(100.0, 200.0),
        }
    }
}

impl ClassifierParams {
    fn gray_criteria(&self) -> GrayCriteria {
        GrayCriteria {
            tolerance: self.gray_tolerance,
            band: self.gray_band,
        }
    }

    /// Minimum height of a real page, `floor(fraction * total)`.
    pub fn min_page_height(&self, total_height: usize) -> usize {
        (total_height as f32 * self.min_page_fraction).floor() as usize
    }
}

/// Region statistics of a slice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SliceAnalysis {
    pub avg_r: f32,
    pub avg_g: f32,
    pub avg_b: f32,
    pub avg_brightness: f32,
    pub color_variance: f32,
    pub gray_ratio: f32,
    pub brightness_range: f32,
    pub min_brightness: f32,
    pub max_brightness: f32,
    pub is_uniform: bool,
    pub sampled: usize,
}

impl SliceAnalysis {
    /// All zeros and not uniform; never trips the gray/uniform rules.
    pub fn neutral() -> Self {
        Self::default()
    }

    pub fn is_degenerate(&self) -> bool {
        self.sampled == 0
    }
}

/// Sampling step for a region of `pixel_count` pixels.
#[inline]
pub fn sample_stride(pixel_count: usize, max_samples: usize) -> usize {
    (pixel_count / max_samples.max(1)).max(1)
}

/// Analyse a region; a region with no sampled pixels gets the neutral result.
pub fn analyze_region(region: &ImageRgba<'_>, params: &ClassifierParams) -> SliceAnalysis {
    let pixel_count = region.pixel_count();
    if pixel_count == 0 {
        return SliceAnalysis::neutral();
    }
    let criteria = params.gray_criteria();
    let stride = sample_stride(pixel_count, params.max_sample_pixels);
    let mut acc = PixelAccumulator::new();
    for i in (0..pixel_count).step_by(stride) {
        acc.push(region.rgb(i % region.w, i / region.w), &criteria);
    }
    match acc.finish() {
        Some(s) => {
            let brightness_range = s.brightness_range();
            SliceAnalysis {
                avg_r: s.avg_r,
                avg_g: s.avg_g,
                avg_b: s.avg_b,
                avg_brightness: s.brightness,
                color_variance: s.spread,
                gray_ratio: s.gray_ratio,
                brightness_range,
                min_brightness: s.min_brightness,
                max_brightness: s.max_brightness,
                is_uniform: brightness_range < params.uniform_range
                    && s.spread < params.uniform_variance,
                sampled: s.count,
            }
        }
        None => SliceAnalysis::neutral(),
    }
}

/// Classifier decision for one slice.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SliceVerdict {
    pub slice: SliceDescriptor,
    pub analysis: SliceAnalysis,
    pub too_short: bool,
    pub gray_separator: bool,
    pub uniform_gray: bool,
    pub filtered: bool,
}

/// Apply the three separator rules to an analysed slice.
pub fn judge(
    slice: SliceDescriptor,
    analysis: SliceAnalysis,
    total_height: usize,
    params: &ClassifierParams,
) -> SliceVerdict {
    let short = slice.height < params.separator_max_height;
    let too_short = slice.height < params.min_page_height(total_height);
    let gray_separator = analysis.gray_ratio > params.gray_separator_ratio
        && analysis.color_variance < params.gray_separator_variance
        && short;
    let uniform_gray = analysis.is_uniform
        && params.uniform_brightness.contains(analysis.avg_brightness)
        && short;
    SliceVerdict {
        slice,
        analysis,
        too_short,
        gray_separator,
        uniform_gray,
        filtered: too_short || gray_separator || uniform_gray,
    }
}

/// Verdicts for a slice list, in slice order.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub verdicts: Vec<SliceVerdict>,
    /// Every slice was flagged, so none are filtered.
    pub fallback_to_unfiltered: bool,
}

impl Classification {
    /// Whether the slice at position `i` survives.
    pub fn keeps(&self, i: usize) -> bool {
        self.fallback_to_unfiltered || self.verdicts.get(i).is_some_and(|v| !v.filtered)
    }

    pub fn kept_count(&self) -> usize {
        (0..self.verdicts.len()).filter(|&i| self.keeps(i)).count()
    }

    pub fn filtered_count(&self) -> usize {
        self.verdicts.len() - self.kept_count()
    }
}

/// Analyse and judge every slice of a strip `total_height` rows tall.
pub fn classify_slices(
    slices: &[PageSlice],
    total_height: usize,
    params: &ClassifierParams,
    events: &mut EventLog,
) -> Classification {
    let analyse = |slice: &PageSlice| analyze_region(&slice.pixels.as_view(), params);

    #[cfg(feature = "parallel")]
    let analyses: Vec<SliceAnalysis> = slices.par_iter().map(analyse).collect();
    #[cfg(not(feature = "parallel"))]
    let analyses: Vec<SliceAnalysis> = slices.iter().map(analyse).collect();

    let mut verdicts = Vec::with_capacity(slices.len());
    for (slice, analysis) in slices.iter().zip(analyses) {
        if analysis.is_degenerate() {
            events.warn(
                Stage::Classification,
                EventKind::DegenerateSample,
                format!("slice {} sampled no pixels, using neutral analysis", slice.index + 1),
            );
        }
        verdicts.push(judge(slice.descriptor(), analysis, total_height, params));
    }

    let flagged = verdicts.iter().filter(|v| v.filtered).count();
    let fallback_to_unfiltered = !verdicts.is_empty() && flagged == verdicts.len();
    if fallback_to_unfiltered {
        events.warn(
            Stage::Classification,
            EventKind::AllSlicesFiltered,
            format!("all {flagged} slices look like separators, keeping the unfiltered set"),
        );
    } else {
        events.info(
            Stage::Classification,
            EventKind::StageSummary,
            format!("filtered {} of {} slices", flagged, verdicts.len()),
        );
    }
    Classification {
        verdicts,
        fallback_to_unfiltered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::RgbaBuffer;

    fn solid_slice(index: usize, start: usize, w: usize, h: usize, rgb: [u8; 3]) -> PageSlice {
        let mut data = Vec::with_capacity(w * h * 4);
        for _ in 0..w * h {
            data.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
        }
        PageSlice {
            index,
            start_y: start,
            end_y: start + h,
            height: h,
            pixels: RgbaBuffer::new(w, h, 4, data).unwrap(),
        }
    }

    fn noisy_slice(index: usize, start: usize, w: usize, h: usize) -> PageSlice {
        let mut data = Vec::with_capacity(w * h * 4);
        for y in 0..h {
            for x in 0..w {
                let v = if (x / 3 + y / 3) % 2 == 0 { 20u8 } else { 250u8 };
                data.extend_from_slice(&[v, v / 2, 255 - v, 255]);
            }
        }
        PageSlice {
            index,
            start_y: start,
            end_y: start + h,
            height: h,
            pixels: RgbaBuffer::new(w, h, 4, data).unwrap(),
        }
    }

    #[test]
    fn uniform_gray_region_statistics() {
        let slice = solid_slice(0, 0, 40, 10, [150, 150, 150]);
        let a = analyze_region(&slice.pixels.as_view(), &ClassifierParams::default());
        assert_eq!(a.sampled, 400);
        assert!((a.avg_brightness - 150.0).abs() < 1e-4);
        assert!((a.gray_ratio - 1.0).abs() < 1e-6);
        assert_eq!(a.color_variance, 0.0);
        assert!(a.is_uniform);
    }

    #[test]
    fn sampling_is_capped() {
        assert_eq!(sample_stride(50_000, 100_000), 1);
        assert_eq!(sample_stride(1_000_000, 100_000), 10);
        let slice = solid_slice(0, 0, 500, 400, [10, 10, 10]);
        let a = analyze_region(&slice.pixels.as_view(), &ClassifierParams::default());
        assert!(a.sampled <= 100_000);
        assert!(a.sampled > 0);
    }

    #[test]
    fn short_gray_slice_is_flagged() {
        let slice = solid_slice(1, 300, 200, 15, [150, 150, 150]);
        let mut events = EventLog::new();
        let c = classify_slices(
            std::slice::from_ref(&slice),
            1000,
            &ClassifierParams::default(),
            &mut events,
        );
        let v = &c.verdicts[0];
        assert!(v.too_short);
        assert!(v.gray_separator);
        assert!(v.uniform_gray);
        assert!(v.filtered);
    }

    #[test]
    fn tall_gray_slice_survives_gray_rules() {
        let slice = solid_slice(0, 0, 50, 150, [150, 150, 150]);
        let v = judge(
            slice.descriptor(),
            analyze_region(&slice.pixels.as_view(), &ClassifierParams::default()),
            1000,
            &ClassifierParams::default(),
        );
        assert!(!v.gray_separator);
        assert!(!v.uniform_gray);
        assert!(!v.too_short);
        assert!(!v.filtered);
    }

    #[test]
    fn page_content_is_kept() {
        let slice = noisy_slice(0, 0, 60, 60);
        let mut events = EventLog::new();
        let c = classify_slices(
            &[slice, solid_slice(1, 60, 60, 940, [255, 255, 255])],
            1000,
            &ClassifierParams::default(),
            &mut events,
        );
        assert!(!c.verdicts[0].filtered, "{:?}", c.verdicts[0]);
        assert!(!c.verdicts[1].filtered);
        assert_eq!(c.kept_count(), 2);
    }

    #[test]
    fn all_flagged_falls_back_to_unfiltered() {
        let slices = vec![
            solid_slice(0, 0, 20, 10, [140, 140, 140]),
            solid_slice(1, 10, 20, 12, [140, 140, 140]),
        ];
        let mut events = EventLog::new();
        let c = classify_slices(&slices, 1000, &ClassifierParams::default(), &mut events);
        assert!(c.verdicts.iter().all(|v| v.filtered));
        assert!(c.fallback_to_unfiltered);
        assert_eq!(c.kept_count(), 2);
        assert!(events.contains(EventKind::AllSlicesFiltered));
    }

    #[test]
    fn neutral_analysis_never_trips_gray_rules() {
        let descriptor = SliceDescriptor {
            index: 0,
            start_y: 0,
            end_y: 50,
            height: 50,
            width: 10,
        };
        let v = judge(descriptor, SliceAnalysis::neutral(), 1000, &ClassifierParams::default());
        assert!(!v.gray_separator && !v.uniform_gray);
        assert!(!v.filtered);
    }

    #[test]
    fn empty_crop_gets_neutral_analysis_and_event() {
        let data = vec![200u8; 10 * 20 * 4];
        let image = ImageRgba::new(10, 20, 4, &data).unwrap();
        let empty = PageSlice {
            index: 0,
            start_y: 5,
            end_y: 5,
            height: 0,
            pixels: image.crop_rows(5, 5),
        };
        let slices = vec![empty, solid_slice(1, 5, 10, 995, [255, 255, 255])];
        let mut events = EventLog::new();
        let c = classify_slices(&slices, 1000, &ClassifierParams::default(), &mut events);

        assert_eq!(events.count(EventKind::DegenerateSample), 1);
        assert!(c.verdicts[0].analysis.is_degenerate());
        assert_eq!(c.verdicts[0].analysis, SliceAnalysis::neutral());
        assert!(!c.verdicts[0].gray_separator && !c.verdicts[0].uniform_gray);
        assert!(c.verdicts[0].too_short);
        assert!(!c.keeps(0));
        assert!(c.keeps(1));
    }
}
