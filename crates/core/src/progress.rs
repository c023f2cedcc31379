//! Progress reporting seam between the pipeline and whatever displays it.

use crate::types::VideoResult;

/// Receives informational progress updates. Both methods default to no-ops.
pub trait Progress {
    /// A human-readable status line such as "Parsing slide 3...".
    fn message(&self, _message: &str) {}

    /// The full result list, republished after every new result.
    fn results(&self, _results: &[VideoResult]) {}
}

/// A [`Progress`] that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {}
