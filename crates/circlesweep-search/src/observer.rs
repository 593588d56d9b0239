//! Search notifications: progress, status, and completion.
//!
//! A single [`SearchObserver`] receives all three channels. Every method
//! has a no-op default, so a caller implements only what it listens to,
//! and [`NullObserver`] listens to nothing. Whether or not anyone is
//! listening never changes the search itself.
//!
//! `progress` and `status` are called from worker threads, hence the
//! `Sync` bound. `completed` is called once, from the calling thread,
//! after all work (and any artifact export) has finished.

use serde::{Deserialize, Serialize};

use crate::types::{DetectedCircle, ParameterCombination, ScoredCandidate};

/// How serious a status message is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// Informational milestone.
    Info,
    /// A recovered failure; the search continues.
    Warning,
    /// A failure the caller should see; the search still completes.
    Error,
}

impl Severity {
    /// Returns `true` for [`Severity::Warning`] and [`Severity::Error`].
    #[must_use]
    pub const fn is_problem(self) -> bool {
        matches!(self, Self::Warning | Self::Error)
    }
}

/// Aggregate numbers attached to the completion notification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResultInfo {
    /// Grid cells evaluated.
    pub combinations_tested: usize,
    /// Qualifying circles published across the grid.
    pub circles_found: usize,
    /// Score of the winning candidate.
    pub score: Option<f64>,
    /// Diameter error of the winner in pixels.
    pub size_difference: Option<f64>,
    /// Distance of the winner from the image center in pixels.
    pub center_distance: Option<f64>,
    /// The search stopped early because it was cancelled.
    pub cancelled: bool,
}

/// Payload of [`SearchObserver::completed`].
///
/// Sent for every finished search, including searches with no match,
/// so callers can tell "nothing found" apart from "never finished".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompletionReport {
    /// The winning circle, if any.
    pub circle: Option<DetectedCircle>,
    /// The parameters that produced the winning circle, if any.
    pub parameters: Option<ParameterCombination>,
    /// Counters and error terms.
    pub info: ResultInfo,
}

impl CompletionReport {
    /// Build a report from the winner (if any) and the counters.
    #[must_use]
    pub fn new(
        best: Option<&ScoredCandidate>,
        combinations_tested: usize,
        circles_found: usize,
        cancelled: bool,
    ) -> Self {
        Self {
            circle: best.map(|c| c.circle),
            parameters: best.map(|c| c.parameters),
            info: ResultInfo {
                combinations_tested,
                circles_found,
                score: best.map(|c| c.score),
                size_difference: best.map(|c| c.size_difference),
                center_distance: best.map(|c| c.center_distance),
                cancelled,
            },
        }
    }
}

/// Receiver for search notifications.
pub trait SearchObserver: Sync {
    /// `current` of `total` grid cells have been evaluated.
    fn progress(&self, _current: usize, _total: usize, _message: Option<&str>) {}

    /// A status message, usually a recovered failure.
    fn status(&self, _message: &str, _severity: Severity) {}

    /// The search has finished.
    fn completed(&self, _report: &CompletionReport) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl SearchObserver for NullObserver {}
