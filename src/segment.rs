//! Cutting the source image into page slices.

use crate::diagnostics::{EventKind, EventLog, Stage};
use crate::error::{SplitError, SplitResult};
use crate::image::{ImageRgba, RgbaBuffer};
use serde::Serialize;

/// Full-width crop of rows `[start_y, end_y)`.
#[derive(Clone, Debug, PartialEq)]
pub struct PageSlice {
    /// Index of the split interval this slice came from.
    pub index: usize,
    pub start_y: usize,
    pub end_y: usize,
    pub height: usize,
    pub pixels: RgbaBuffer,
}

impl PageSlice {
    pub fn descriptor(&self) -> SliceDescriptor {
        SliceDescriptor {
            index: self.index,
            start_y: self.start_y,
            end_y: self.end_y,
            height: self.height,
            width: self.pixels.width(),
        }
    }
}

/// Pixel-free summary of a slice for reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SliceDescriptor {
    pub index: usize,
    pub start_y: usize,
    pub end_y: usize,
    pub height: usize,
    pub width: usize,
}

/// One slice per adjacent pair of `points`.
///
/// Pairs with `end <= start` (after clamping to the image height) are
/// skipped with a warning; only a result with no slices at all is an error.
pub fn segment_image(
    image: &ImageRgba<'_>,
    points: &[usize],
    events: &mut EventLog,
) -> SplitResult<Vec<PageSlice>> {
    image.validate()?;
    let intervals = points.len().saturating_sub(1);
    let mut slices = Vec::with_capacity(intervals);
    for (index, pair) in points.windows(2).enumerate() {
        let start = pair[0].min(image.h);
        let end = pair[1].min(image.h);
        if end <= start {
            events.warn(
                Stage::Segmentation,
                EventKind::DroppedInterval,
                format!(
                    "skipping page {}: height {}",
                    index + 1,
                    pair[1] as i64 - pair[0] as i64
                ),
            );
            continue;
        }
        slices.push(PageSlice {
            index,
            start_y: start,
            end_y: end,
            height: end - start,
            pixels: image.crop_rows(start, end),
        });
    }

    if slices.is_empty() {
        return Err(SplitError::EmptySegmentation { intervals });
    }
    events.info(
        Stage::Segmentation,
        EventKind::StageSummary,
        format!("cut {} slices from {} intervals", slices.len(), intervals),
    );
    Ok(slices)
}
