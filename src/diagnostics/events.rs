use log::{debug, warn};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EventLevel {
    Info,
    Warning,
}

/// Pipeline stage that emitted an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    Input,
    Features,
    Candidates,
    Selection,
    Segmentation,
    Classification,
    Analysis,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    /// Informational per-stage summary.
    StageSummary,
    /// Guided mode accepted fewer candidates than it needs; repair runs.
    InsufficientCandidates,
    /// Guided mode had no candidates and fell back to even division.
    EvenDivision,
    /// A placeholder split was synthesized at an expected position.
    SyntheticSplit,
    /// A zero-height interval was skipped by the segmenter.
    DroppedInterval,
    /// A slice had no sampled pixels; a neutral analysis was used.
    DegenerateSample,
    /// The input exceeds the comfortable pixel budget.
    OversizedImage,
    /// The classifier flagged every slice; the unfiltered set is kept.
    AllSlicesFiltered,
}

/// One structured diagnostic emitted by the core.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticEvent {
    pub level: EventLevel,
    pub stage: Stage,
    pub kind: EventKind,
    pub message: String,
}

/// Ordered event collector handed through a run.
///
/// Every event is also forwarded to the `log` facade (`debug!` for info,
/// `warn!` for warnings); whoever installs a logger decides where it goes.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Vec<DiagnosticEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, stage: Stage, kind: EventKind, message: impl Into<String>) {
        let message = message.into();
        debug!("{stage:?}: {message}");
        self.events.push(DiagnosticEvent {
            level: EventLevel::Info,
            stage,
            kind,
            message,
        });
    }

    pub fn warn(&mut self, stage: Stage, kind: EventKind, message: impl Into<String>) {
        let message = message.into();
        warn!("{stage:?}: {message}");
        self.events.push(DiagnosticEvent {
            level: EventLevel::Warning,
            stage,
            kind,
            message,
        });
    }

    pub fn events(&self) -> &[DiagnosticEvent] {
        &self.events
    }

    pub fn contains(&self, kind: EventKind) -> bool {
        self.events.iter().any(|e| e.kind == kind)
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    pub fn into_events(self) -> Vec<DiagnosticEvent> {
        self.events
    }
}
