//! Split-point selection.
//!
//! Two modes, picked by the expected page count:
//! - guided (`pages > 0`): exactly `pages - 1` interior points, from the best
//!   spaced candidates, topped up by a repair pass around the evenly spaced
//!   positions `k * height / pages`, synthesizing placeholders where nothing
//!   is close enough;
//! - automatic (`pages == 0`): every candidate above a score gate that lies at
//!   least `min_page_height` below the previously accepted one, walked in
//!   score order.

use crate::candidates::Candidate;
use crate::diagnostics::{EventKind, EventLog, Stage};
use crate::error::{SplitError, SplitResult};
use serde::{Deserialize, Serialize};

/// A chosen cut, either a detected band or a placeholder.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SplitCandidate {
    Detected(Candidate),
    Synthesized { middle: usize },
}

impl SplitCandidate {
    pub fn middle(&self) -> usize {
        match self {
            SplitCandidate::Detected(c) => c.middle,
            SplitCandidate::Synthesized { middle } => *middle,
        }
    }

    /// Synthesized placeholders score zero.
    pub fn score(&self) -> f32 {
        match self {
            SplitCandidate::Detected(c) => c.score,
            SplitCandidate::Synthesized { .. } => 0.0,
        }
    }

    pub fn is_synthesized(&self) -> bool {
        matches!(self, SplitCandidate::Synthesized { .. })
    }
}

/// Strictly increasing row coordinates from `0` to the image height.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SplitPoints(Vec<usize>);

impl SplitPoints {
    /// Validate a full point list.
    pub fn new(points: Vec<usize>, height: usize) -> SplitResult<Self> {
        if points.len() < 2 || points[0] != 0 || points[points.len() - 1] != height {
            return Err(SplitError::InvalidParameter(format!(
                "split points must run from 0 to {height}, got {points:?}"
            )));
        }
        if points.windows(2).any(|w| w[0] >= w[1]) {
            return Err(SplitError::InvalidParameter(format!(
                "split points must be strictly increasing, got {points:?}"
            )));
        }
        Ok(Self(points))
    }

    /// Bracket sorted interior points with `0` and `height`.
    pub fn from_interior(interior: &[usize], height: usize) -> SplitResult<Self> {
        let mut points = Vec::with_capacity(interior.len() + 2);
        points.push(0);
        points.extend_from_slice(interior);
        points.push(height);
        Self::new(points, height)
    }

    /// `pages` equal bands (`floor(height * k / pages)`).
    pub fn even(height: usize, pages: usize) -> SplitResult<Self> {
        let interior: Vec<usize> = (1..pages).map(|k| height * k / pages).collect();
        Self::from_interior(&interior, height)
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn interior(&self) -> &[usize] {
        &self.0[1..self.0.len() - 1]
    }

    pub fn height(&self) -> usize {
        self.0[self.0.len() - 1]
    }

    pub fn page_count(&self) -> usize {
        self.0.len() - 1
    }

    /// Adjacent `(start, end)` pairs.
    pub fn intervals(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.0.windows(2).map(|w| (w[0], w[1]))
    }
}

/// Knobs for both selection modes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionOptions {
    /// Automatic-mode score gate.
    pub min_score: f32,
    /// Guided repair: an accepted point within this fraction of the average
    /// page height already covers an expected position.
    pub covered_fraction: f32,
    /// Guided repair: candidates within this fraction of the average page
    /// height may fill an expected position.
    pub search_fraction: f32,
}

impl Default for SelectionOptions {
    fn default() -> Self {
        Self {
            min_score: 60.0,
            covered_fraction: 0.3,
            search_fraction: 0.4,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionMode {
    Guided { pages: usize },
    Automatic,
}

/// Outcome of split selection.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub mode: SelectionMode,
    pub points: SplitPoints,
    /// Picks in top-to-bottom order.
    pub picks: Vec<SplitCandidate>,
    /// Guided mode only: the repair pass ran.
    pub repaired: bool,
    /// Guided mode only: no candidates, even division was used.
    pub even_division: bool,
}

impl Selection {
    pub fn synthesized_count(&self) -> usize {
        self.picks.iter().filter(|p| p.is_synthesized()).count()
    }
}

/// Dispatch on `expected_pages`: `0` is automatic, anything else guided.
pub fn select_split_points(
    candidates: &[Candidate],
    expected_pages: usize,
    height: usize,
    min_page_height: usize,
    opts: &SelectionOptions,
    events: &mut EventLog,
) -> SplitResult<Selection> {
    if expected_pages > 0 {
        select_guided(candidates, expected_pages, height, min_page_height, opts, events)
    } else {
        select_automatic(candidates, height, min_page_height, opts, events)
    }
}

/// Guided selection; always yields exactly `pages - 1` interior points.
pub fn select_guided(
    candidates: &[Candidate],
    pages: usize,
    height: usize,
    min_page_height: usize,
    opts: &SelectionOptions,
    events: &mut EventLog,
) -> SplitResult<Selection> {
    if pages == 0 {
        return Err(SplitError::InvalidParameter(
            "guided selection needs at least one page".to_string(),
        ));
    }
    if pages > height {
        return Err(SplitError::InvalidParameter(format!(
            "cannot split {height} rows into {pages} pages"
        )));
    }
    let mode = SelectionMode::Guided { pages };
    let need = pages - 1;

    // A cut at row 0 would leave an empty first page.
    let usable: Vec<&Candidate> = candidates.iter().filter(|c| c.middle > 0).collect();

    if need > 0 && usable.is_empty() {
        events.warn(
            Stage::Selection,
            EventKind::EvenDivision,
            format!("no candidates, dividing {height} rows evenly into {pages} pages"),
        );
        let points = SplitPoints::even(height, pages)?;
        let picks = points
            .interior()
            .iter()
            .map(|&middle| SplitCandidate::Synthesized { middle })
            .collect();
        return Ok(Selection {
            mode,
            points,
            picks,
            repaired: false,
            even_division: true,
        });
    }

    let mut picks: Vec<SplitCandidate> = Vec::with_capacity(need);
    for cand in &usable {
        if picks.len() >= need {
            break;
        }
        let too_close = picks
            .iter()
            .any(|p| p.middle().abs_diff(cand.middle) < min_page_height.max(1));
        if !too_close {
            picks.push(SplitCandidate::Detected((*cand).clone()));
        }
    }

    let repaired = picks.len() < need;
    if repaired {
        events.warn(
            Stage::Selection,
            EventKind::InsufficientCandidates,
            format!(
                "accepted {} of {} needed splits from {} candidates, repairing",
                picks.len(),
                need,
                candidates.len()
            ),
        );
        repair(&usable, &mut picks, pages, height, opts, events);
    }

    picks.sort_by_key(SplitCandidate::middle);
    picks.truncate(need);
    let interior: Vec<usize> = picks.iter().map(SplitCandidate::middle).collect();
    let points = SplitPoints::from_interior(&interior, height)?;
    Ok(Selection {
        mode,
        points,
        picks,
        repaired,
        even_division: false,
    })
}

fn repair(
    candidates: &[&Candidate],
    picks: &mut Vec<SplitCandidate>,
    pages: usize,
    height: usize,
    opts: &SelectionOptions,
    events: &mut EventLog,
) {
    let avg_page = height as f32 / pages as f32;
    let covered = avg_page * opts.covered_fraction;
    let window = avg_page * opts.search_fraction;

    for k in 1..pages {
        let expected = height * k / pages;
        let has_nearby = picks
            .iter()
            .any(|p| (p.middle().abs_diff(expected) as f32) < covered);
        if has_nearby {
            continue;
        }

        let mut best: Option<(&Candidate, usize)> = None;
        for cand in candidates {
            let taken = picks.iter().any(|p| match p {
                SplitCandidate::Detected(c) => c.middle == cand.middle,
                SplitCandidate::Synthesized { .. } => false,
            });
            if taken {
                continue;
            }
            let distance = cand.middle.abs_diff(expected);
            if (distance as f32) < window && best.map_or(true, |(_, d)| distance < d) {
                best = Some((*cand, distance));
            }
        }

        match best {
            Some((cand, _)) => picks.push(SplitCandidate::Detected(cand.clone())),
            None => {
                events.info(
                    Stage::Selection,
                    EventKind::SyntheticSplit,
                    format!("synthesized split at row {expected} (page boundary {k})"),
                );
                picks.push(SplitCandidate::Synthesized { middle: expected });
            }
        }
    }
}

/// Automatic selection over score-ordered candidates.
pub fn select_automatic(
    candidates: &[Candidate],
    height: usize,
    min_page_height: usize,
    opts: &SelectionOptions,
    events: &mut EventLog,
) -> SplitResult<Selection> {
    let min_gap = min_page_height.max(1);
    let mut last = 0usize;
    let mut picks = Vec::new();
    for cand in candidates {
        if cand.score >= opts.min_score && cand.middle >= last + min_gap && cand.middle < height {
            last = cand.middle;
            picks.push(SplitCandidate::Detected(cand.clone()));
        }
    }

    if picks.is_empty() {
        return Err(SplitError::NoSplitPointsFound {
            candidates: candidates.len(),
            best_score: candidates.first().map(|c| c.score),
            min_score: opts.min_score,
            min_page_height,
            scan: None,
        });
    }

    events.info(
        Stage::Selection,
        EventKind::StageSummary,
        format!(
            "accepted {} of {} candidates at score >= {:.1}",
            picks.len(),
            candidates.len(),
            opts.min_score
        ),
    );
    let interior: Vec<usize> = picks.iter().map(SplitCandidate::middle).collect();
    let points = SplitPoints::from_interior(&interior, height)?;
    Ok(Selection {
        mode: SelectionMode::Automatic,
        points,
        picks,
        repaired: false,
        even_division: false,
    })
}
