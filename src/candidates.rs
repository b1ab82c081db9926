//! Separator candidates from a row-feature sequence.
//!
//! The scan is a fold over the rows with two states, [`ScanState::Outside`]
//! and [`ScanState::InRun`]. A run opens on the first separator row
//! (gray and uniform) and closes on the first row that is not. Closed runs
//! whose height lies within `[min_height, max_height]` become scored
//! [`Candidate`]s. A run still open at the last row touches the bottom edge
//! and is dropped.

use crate::features::RowFeature;
use crate::score::{BandFeatures, ScoreWeights};
use serde::Serialize;
use std::cmp::Ordering;

/// A scored separator band `[start, end)`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub start: usize,
    pub end: usize,
    pub middle: usize,
    pub height: usize,
    pub gray_ratio: f32,
    pub uniformity: f32,
    pub brightness: f32,
    pub score: f32,
}

/// Height bounds and scoring used by [`find_candidates`].
#[derive(Clone, Copy, Debug)]
pub struct CandidateOptions {
    pub min_height: usize,
    pub max_height: usize,
    pub weights: ScoreWeights,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanState {
    Outside,
    InRun { start: usize },
}

/// Scan rows once and return candidates ordered by descending score.
///
/// Ties keep the candidate nearer the top first.
pub fn find_candidates(rows: &[RowFeature], opts: &CandidateOptions) -> Vec<Candidate> {
    let (_, mut candidates) = rows.iter().enumerate().fold(
        (ScanState::Outside, Vec::new()),
        |(state, mut acc), (i, row)| {
            let next = match (state, row.is_separator_row()) {
                (ScanState::Outside, true) => ScanState::InRun { start: i },
                (ScanState::InRun { start }, false) => {
                    if let Some(c) = close_run(rows, start, i, opts) {
                        acc.push(c);
                    }
                    ScanState::Outside
                }
                (s, _) => s,
            };
            (next, acc)
        },
    );
    candidates.sort_by(rank_order);
    candidates
}

/// Descending score, then ascending middle.
pub fn rank_order(a: &Candidate, b: &Candidate) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then(a.middle.cmp(&b.middle))
}

fn close_run(
    rows: &[RowFeature],
    start: usize,
    end: usize,
    opts: &CandidateOptions,
) -> Option<Candidate> {
    let height = end - start;
    if height < opts.min_height || height > opts.max_height {
        return None;
    }
    let run = &rows[start..end];
    let n = height as f32;
    let gray_ratio = run.iter().map(|r| r.gray_ratio).sum::<f32>() / n;
    let uniformity = run.iter().filter(|r| r.is_uniform).count() as f32 / n;
    let brightness = run.iter().map(|r| r.brightness).sum::<f32>() / n;
    let band = BandFeatures {
        gray_ratio,
        uniformity,
        brightness,
        height,
    };
    // Rows may be a sub-sequence; report image coordinates.
    let (start_y, end_y) = (rows[start].y, rows[end - 1].y + 1);
    Some(Candidate {
        start: start_y,
        end: end_y,
        middle: (start_y + end_y) / 2,
        height,
        gray_ratio,
        uniformity,
        brightness,
        score: opts.weights.score(&band, opts.max_height),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(y: usize, separator: bool, brightness: f32) -> RowFeature {
        RowFeature {
            y,
            avg_r: brightness,
            avg_g: brightness,
            avg_b: brightness,
            brightness,
            gray_ratio: if separator { 1.0 } else { 0.0 },
            brightness_range: 0.0,
            spread: 0.0,
            is_uniform: true,
            is_gray_row: separator,
        }
    }

    fn rows_with_bands(height: usize, bands: &[(usize, usize, f32)]) -> Vec<RowFeature> {
        (0..height)
            .map(|y| {
                bands
                    .iter()
                    .find(|(s, e, _)| y >= *s && y < *e)
                    .map(|(_, _, b)| row(y, true, *b))
                    .unwrap_or_else(|| row(y, false, 255.0))
            })
            .collect()
    }

    fn opts() -> CandidateOptions {
        CandidateOptions {
            min_height: 5,
            max_height: 50,
            weights: ScoreWeights::default(),
        }
    }

    #[test]
    fn finds_band_with_expected_geometry() {
        let rows = rows_with_bands(1000, &[(300, 320, 128.0)]);
        let found = find_candidates(&rows, &opts());
        assert_eq!(found.len(), 1);
        let c = &found[0];
        assert_eq!((c.start, c.end, c.middle, c.height), (300, 320, 310, 20));
        assert!((c.gray_ratio - 1.0).abs() < 1e-6);
        assert!((c.uniformity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn height_bounds_are_inclusive() {
        let rows = rows_with_bands(400, &[(10, 15, 150.0), (100, 150, 150.0), (200, 204, 150.0)]);
        let found = find_candidates(&rows, &opts());
        let heights: Vec<usize> = found.iter().map(|c| c.height).collect();
        assert!(heights.contains(&5));
        assert!(heights.contains(&50));
        assert!(!heights.contains(&4));
        assert!(found
            .iter()
            .all(|c| c.height >= 5 && c.height <= 50));
    }

    #[test]
    fn run_touching_bottom_edge_is_dropped() {
        let rows = rows_with_bands(100, &[(90, 100, 150.0)]);
        assert!(find_candidates(&rows, &opts()).is_empty());
    }

    #[test]
    fn ordered_by_score_then_position() {
        let rows = rows_with_bands(
            1000,
            &[(100, 110, 150.0), (300, 310, 100.0), (500, 510, 150.0)],
        );
        let found = find_candidates(&rows, &opts());
        let middles: Vec<usize> = found.iter().map(|c| c.middle).collect();
        assert_eq!(middles, vec![105, 505, 305]);
        assert!(found.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn adjacent_runs_stay_separate() {
        let mut rows = rows_with_bands(200, &[(50, 60, 150.0), (61, 70, 150.0)]);
        rows[60].is_uniform = false;
        let found = find_candidates(&rows, &opts());
        assert_eq!(found.len(), 2);
    }
}
