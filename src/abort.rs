//! Cooperative abort flag polled at row-chunk checkpoints.

use crate::error::{SplitError, SplitResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Rows processed between two checkpoints.
pub const CHECKPOINT_ROWS: usize = 1000;

/// Shared flag a caller can raise from another thread to stop a run.
///
/// Clones share the same flag. An aborted run returns
/// [`SplitError::Aborted`] and leaves nothing behind.
#[derive(Clone, Debug, Default)]
pub struct AbortHandle {
    flag: Arc<AtomicBool>,
}

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Fail with `Aborted` if the flag is raised; `row` is reported back.
    pub fn checkpoint(&self, row: usize) -> SplitResult<()> {
        if self.is_aborted() {
            Err(SplitError::Aborted { row })
        } else {
            Ok(())
        }
    }
}

/// Poll an optional handle.
#[inline]
pub(crate) fn checkpoint(handle: Option<&AbortHandle>, row: usize) -> SplitResult<()> {
    match handle {
        Some(h) => h.checkpoint(row),
        None => Ok(()),
    }
}
