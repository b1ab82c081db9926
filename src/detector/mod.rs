//! Page splitter orchestrating separator detection and segmentation.
//!
//! Overview
//! - Samples every row of the strip (about 100 columns per row) and records
//!   brightness, gray-pixel ratio and uniformity.
//! - Folds the rows into runs of gray, uniform rows; runs within the separator
//!   height bounds become scored candidates.
//! - Picks split points either guided by an expected page count (with a
//!   repair pass that fills missing boundaries) or automatically above a
//!   score gate.
//! - Cuts full-width slices and drops those that look like separators or
//!   slivers, unless that would drop everything.
//!
//! Modules
//! - [`params`] – configuration types used by the splitter and CLI.
//! - `pipeline` – the main [`PageSplitter`] implementation.

pub mod params;
mod pipeline;

pub use params::{SplitterParams, DEFAULT_SENSITIVITY, SENSITIVITY_RANGE};
pub use pipeline::PageSplitter;
