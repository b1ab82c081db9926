//! Diagnostics data model returned by the splitter and its tools.
//!
//! `DetectionReport` bundles the split points with the ranked candidates, the
//! selection trace, a page distribution summary, structured events and stage
//! timings. `SplitReport` extends it with the cut slices and their verdicts.

pub mod events;
pub mod pipeline;
pub mod timing;

pub use events::{DiagnosticEvent, EventKind, EventLevel, EventLog, Stage};
pub use pipeline::{page_distribution, DetectionReport, InputDescriptor, PageSpan, SplitReport};
pub use timing::{elapsed_ms, StageTiming, TimingBreakdown};
