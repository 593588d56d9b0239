//! Search results and a human-readable report.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::observer::CompletionReport;
use crate::types::{Dimensions, ScoredCandidate};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// How a search ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchOutcome<'a> {
    /// A qualifying circle was found.
    Found(&'a ScoredCandidate),
    /// The whole grid ran and nothing qualified.
    NoMatch,
    /// The search was cancelled before the grid was exhausted.
    Cancelled,
}

/// Everything a finished search produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// The global minimum-score candidate.
    pub best: Option<ScoredCandidate>,

    /// Every published candidate, in grid order.
    pub qualifying: Vec<ScoredCandidate>,

    /// Good matches retained for diagnostic export, best first.
    /// Empty unless candidate saving is enabled.
    pub export_candidates: Vec<ScoredCandidate>,

    /// Grid cells evaluated.
    pub combinations_tested: usize,

    /// Grid cells in total.
    pub total_combinations: usize,

    /// Raw circles returned by the detector across the grid.
    pub circles_detected: usize,

    /// Cells whose detector call failed.
    pub failures: usize,

    /// Source image dimensions.
    pub dimensions: Dimensions,

    /// Worker threads used.
    pub threads: usize,

    /// The search was cancelled before the grid was exhausted.
    pub cancelled: bool,

    /// Wall-clock duration of the evaluation (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

impl SearchResult {
    /// Number of qualifying circles published.
    #[must_use]
    pub fn circles_found(&self) -> usize {
        self.qualifying.len()
    }

    /// Found, no match, or cancelled.
    ///
    /// Cancellation takes precedence: a partial grid's winner is not a
    /// reliable answer.
    #[must_use]
    pub fn outcome(&self) -> SearchOutcome<'_> {
        if self.cancelled {
            SearchOutcome::Cancelled
        } else {
            self.best
                .as_ref()
                .map_or(SearchOutcome::NoMatch, SearchOutcome::Found)
        }
    }

    /// The payload for [`SearchObserver::completed`](crate::SearchObserver::completed).
    #[must_use]
    pub fn completion_report(&self) -> CompletionReport {
        CompletionReport::new(
            self.best.as_ref(),
            self.combinations_tested,
            self.circles_found(),
            self.cancelled,
        )
    }

    /// Format the result as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Circle Search Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{}",
            self.dimensions.width, self.dimensions.height
        ));
        lines.push(format!(
            "Combinations: {}/{} on {} threads in {:.3}ms",
            self.combinations_tested,
            self.total_combinations,
            self.threads,
            self.duration.as_secs_f64() * 1000.0,
        ));
        lines.push(format!(
            "Circles: {} detected, {} qualifying",
            self.circles_detected,
            self.circles_found(),
        ));
        if self.failures > 0 {
            lines.push(format!("Failed combinations: {}", self.failures));
        }
        lines.push(String::new());

        match self.outcome() {
            SearchOutcome::Found(best) => {
                lines.push("Best match".to_string());
                lines.push("-".repeat(40));
                lines.push(format!(
                    "Canny threshold:       {}",
                    best.parameters.canny_threshold
                ));
                lines.push(format!(
                    "Accumulator threshold: {}",
                    best.parameters.accumulator_threshold
                ));
                lines.push(format!(
                    "Center:                ({:.2}, {:.2})",
                    best.circle.center.x, best.circle.center.y
                ));
                lines.push(format!(
                    "Radius:                {:.2} (diameter {:.2})",
                    best.circle.radius,
                    best.circle.diameter()
                ));
                lines.push(format!(
                    "Size difference:       {:.2}px",
                    best.size_difference
                ));
                lines.push(format!(
                    "Center distance:       {:.2}px",
                    best.center_distance
                ));
                lines.push(format!("Score:                 {:.4}", best.score));
            }
            SearchOutcome::NoMatch => lines.push("No qualifying circle found.".to_string()),
            SearchOutcome::Cancelled => lines.push("Search cancelled.".to_string()),
        }

        lines.join("\n")
    }
}
