//! Parallel evaluation of the search grid.
//!
//! Every grid cell is an independent unit of work scheduled on the
//! current rayon pool. A unit calls the detector on a shared, read-only
//! image, keeps the best-scoring circle, and publishes it when it is
//! within the diameter tolerance. Publishing is rayon's `collect`,
//! which preserves grid order; the only other shared state is a set of
//! atomic counters.
//!
//! A detector failure is reported as a warning status and never stops
//! the remaining cells.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use image::GrayImage;
use rayon::prelude::*;

use crate::detect::{DetectRequest, Detector};
use crate::observer::{SearchObserver, Severity};
use crate::score::Scorer;
use crate::types::{ParameterCombination, ScoredCandidate};

/// Emit a progress notification every this many completed cells.
pub const PROGRESS_INTERVAL: usize = 100;

/// Shared inputs for one evaluation pass.
pub struct Evaluator<'a> {
    /// Source image, shared read-only by every unit of work.
    pub image: &'a GrayImage,
    /// Scorer built for this image and target.
    pub scorer: &'a Scorer,
    /// Detector invoked once per cell.
    pub detector: &'a dyn Detector,
    /// Receives progress and status notifications.
    pub observer: &'a dyn SearchObserver,
    /// Maximum accepted diameter error in pixels; `<= 0` disables the filter.
    pub diameter_tolerance: f64,
    /// Cooperative cancellation flag, checked before each cell.
    pub cancel: Option<&'a AtomicBool>,
}

/// Output of an evaluation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    /// Qualifying candidates, one at most per cell, in grid order.
    pub published: Vec<ScoredCandidate>,
    /// Cells evaluated (including cells whose detector call failed).
    pub processed: usize,
    /// Circles returned by the detector across all cells, before scoring.
    pub circles_detected: usize,
    /// Cells whose detector call failed.
    pub failures: usize,
    /// At least one cell was skipped because the cancel flag was set.
    pub cancelled: bool,
}

#[derive(Default)]
struct Counters {
    processed: AtomicUsize,
    found: AtomicUsize,
    detected: AtomicUsize,
    failures: AtomicUsize,
    skipped: AtomicUsize,
}

impl Evaluator<'_> {
    /// Evaluate every cell of `grid` on the current rayon pool.
    ///
    /// Returns only after every cell has finished, so the result can be
    /// reduced without further synchronization.
    pub fn run(&self, grid: &[ParameterCombination]) -> Evaluation {
        let total = grid.len();
        let counters = Counters::default();

        let published: Vec<ScoredCandidate> = grid
            .par_iter()
            .filter_map(|params| self.evaluate_cell(*params, total, &counters))
            .collect();

        Evaluation {
            published,
            processed: counters.processed.load(Ordering::Relaxed),
            circles_detected: counters.detected.load(Ordering::Relaxed),
            failures: counters.failures.load(Ordering::Relaxed),
            cancelled: counters.skipped.load(Ordering::Relaxed) > 0,
        }
    }

    fn evaluate_cell(
        &self,
        params: ParameterCombination,
        total: usize,
        counters: &Counters,
    ) -> Option<ScoredCandidate> {
        if self.cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
            counters.skipped.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        let request = DetectRequest::for_target(self.scorer.target_diameter(), params);
        let outcome = match self.detector.detect(self.image, &request) {
            Ok(circles) => {
                counters.detected.fetch_add(circles.len(), Ordering::Relaxed);
                self.scorer
                    .best_of(&circles, params)
                    .filter(|c| self.within_tolerance(c))
            }
            Err(e) => {
                counters.failures.fetch_add(1, Ordering::Relaxed);
                log::warn!(
                    "canny={} accumulator={}: {e}",
                    params.canny_threshold,
                    params.accumulator_threshold,
                );
                self.observer.status(
                    &format!(
                        "canny={} accumulator={}: {e}",
                        params.canny_threshold, params.accumulator_threshold,
                    ),
                    Severity::Warning,
                );
                None
            }
        };

        if let Some(ref c) = outcome {
            counters.found.fetch_add(1, Ordering::Relaxed);
            log::debug!(
                "canny={} accumulator={}: r={:.2} at ({:.1}, {:.1}) score={:.4}",
                params.canny_threshold,
                params.accumulator_threshold,
                c.circle.radius,
                c.circle.center.x,
                c.circle.center.y,
                c.score,
            );
        }

        let count = counters.processed.fetch_add(1, Ordering::Relaxed) + 1;
        if count.is_multiple_of(PROGRESS_INTERVAL) || count == total {
            let found = counters.found.load(Ordering::Relaxed);
            self.observer.progress(
                count,
                total,
                Some(&format!("{found} qualifying circles so far")),
            );
        }

        outcome
    }

    fn within_tolerance(&self, candidate: &ScoredCandidate) -> bool {
        self.diameter_tolerance <= 0.0 || candidate.size_difference <= self.diameter_tolerance
    }
}
