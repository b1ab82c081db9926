//! Separator desirability score in `[0, 100]`.
//!
//! `gray * grayRatio + uniformity * uniformity
//!  + brightness * (1 - |b - target| / scale)
//!  + thinness * max(0, 1 - height / maxSeparatorHeight)`
//!
//! The default weights (40/30/20/10) favour fully gray, fully uniform,
//! mid-gray and thin bands.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub gray: f32,
    pub uniformity: f32,
    pub brightness: f32,
    pub thinness: f32,
    /// Preferred mean brightness of a separator.
    pub brightness_target: f32,
    /// Distance from the target at which the brightness term reaches zero.
    pub brightness_scale: f32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            gray: 40.0,
            uniformity: 30.0,
            brightness: 20.0,
            thinness: 10.0,
            brightness_target: 150.0,
            brightness_scale: 150.0,
        }
    }
}

/// Averaged features of a run of separator rows.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BandFeatures {
    pub gray_ratio: f32,
    pub uniformity: f32,
    pub brightness: f32,
    pub height: usize,
}

impl ScoreWeights {
    /// Score a band; `max_height` is the separator height ceiling.
    pub fn score(&self, band: &BandFeatures, max_height: usize) -> f32 {
        let scale = if self.brightness_scale > 0.0 {
            self.brightness_scale
        } else {
            1.0
        };
        let brightness_term = 1.0 - (band.brightness - self.brightness_target).abs() / scale;
        let thinness_term = if max_height > 0 {
            (1.0 - band.height as f32 / max_height as f32).max(0.0)
        } else {
            0.0
        };
        self.gray * band.gray_ratio
            + self.uniformity * band.uniformity
            + self.brightness * brightness_term
            + self.thinness * thinness_term
    }

    pub fn total(&self) -> f32 {
        self.gray + self.uniformity + self.brightness + self.thinness
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn default_weights_sum_to_hundred() {
        assert!(approx_eq(ScoreWeights::default().total(), 100.0));
    }

    #[test]
    fn ideal_band_scores_near_full_marks() {
        let band = BandFeatures {
            gray_ratio: 1.0,
            uniformity: 1.0,
            brightness: 150.0,
            height: 0,
        };
        assert!(approx_eq(ScoreWeights::default().score(&band, 50), 100.0));
    }

    #[test]
    fn mid_gray_band_matches_hand_computation() {
        // 40 + 30 + 20 * (1 - 22/150) + 10 * (1 - 20/50)
        let band = BandFeatures {
            gray_ratio: 1.0,
            uniformity: 1.0,
            brightness: 128.0,
            height: 20,
        };
        let expected = 40.0 + 30.0 + 20.0 * (1.0 - 22.0 / 150.0) + 10.0 * 0.6;
        assert!(approx_eq(ScoreWeights::default().score(&band, 50), expected));
    }

    #[test]
    fn thinness_term_never_goes_negative() {
        let thin = BandFeatures {
            gray_ratio: 1.0,
            uniformity: 1.0,
            brightness: 150.0,
            height: 50,
        };
        let tall = BandFeatures { height: 80, ..thin };
        let weights = ScoreWeights::default();
        assert!(approx_eq(weights.score(&thin, 50), weights.score(&tall, 50)));
    }

    #[test]
    fn darker_bands_score_lower() {
        let weights = ScoreWeights::default();
        let mid = BandFeatures {
            gray_ratio: 1.0,
            uniformity: 1.0,
            brightness: 150.0,
            height: 10,
        };
        let dark = BandFeatures {
            brightness: 90.0,
            ..mid
        };
        assert!(weights.score(&mid, 50) > weights.score(&dark, 50));
    }
}
