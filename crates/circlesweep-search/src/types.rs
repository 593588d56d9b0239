//! Shared types for the circlesweep parameter search.

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can hand images to the
/// search without depending on `image` directly.
pub use image::GrayImage;

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of a grayscale image.
    #[must_use]
    pub fn of(image: &GrayImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }

    /// Geometric center of the image.
    #[must_use]
    pub fn center(self) -> Point {
        Point::new(f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }

    /// Length of the image diagonal in pixels.
    #[must_use]
    pub fn diagonal(self) -> f64 {
        f64::from(self.width).hypot(f64::from(self.height))
    }

    /// Returns `true` if either side is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A circle reported by a [`Detector`](crate::Detector).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectedCircle {
    /// Circle center in image pixel coordinates.
    pub center: Point,
    /// Radius in pixels.
    pub radius: f64,
}

impl DetectedCircle {
    /// Create a new circle.
    #[must_use]
    pub const fn new(center: Point, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Diameter in pixels.
    #[must_use]
    pub fn diameter(&self) -> f64 {
        2.0 * self.radius
    }
}

/// One cell of the search grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterCombination {
    /// Canny edge detector (high) threshold.
    pub canny_threshold: f64,
    /// Minimum number of edge votes a circle needs to be reported.
    pub accumulator_threshold: f64,
}

impl ParameterCombination {
    /// Create a new combination.
    #[must_use]
    pub const fn new(canny_threshold: f64, accumulator_threshold: f64) -> Self {
        Self {
            canny_threshold,
            accumulator_threshold,
        }
    }
}

/// The best circle found for one [`ParameterCombination`], with its
/// error terms and combined score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    /// The detected circle.
    pub circle: DetectedCircle,
    /// The combination that produced it.
    pub parameters: ParameterCombination,
    /// `|2 * radius - target_diameter|` in pixels.
    pub size_difference: f64,
    /// Distance from the circle center to the image center in pixels.
    pub center_distance: f64,
    /// Weighted, normalized error. Lower is better.
    pub score: f64,
}

/// An inclusive, stepped threshold range.
///
/// The number of values is `floor((end - start) / step) + 1` when
/// `start <= end`, and zero otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRange {
    /// First value.
    pub start: f64,
    /// Last value (inclusive, if reachable by whole steps).
    pub end: f64,
    /// Increment between values.
    pub step: f64,
}

/// Rounding slack, in units of `f64::EPSILON`, scaled by the operands.
const STEP_SLACK_ULPS: f64 = 4.0;

impl ThresholdRange {
    /// Create a new range.
    #[must_use]
    pub const fn new(start: f64, end: f64, step: f64) -> Self {
        Self { start, end, step }
    }

    /// Number of values in the range, or `None` if the count does not
    /// fit in a `usize`.
    ///
    /// Returns `Some(0)` for a degenerate range (`start > end`) or a
    /// non-positive step; the latter is rejected by
    /// [`SearchConfig::validate`] before any search starts.
    ///
    /// `(end - start) / step` is floored after adding a slack bounded by
    /// the rounding error of the division itself, so `0.1..=0.3` step
    /// `0.1` yields three values while a quotient that is genuinely
    /// below a whole number still floors down.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn checked_len(&self) -> Option<usize> {
        if self.start > self.end || self.step <= 0.0 || !self.step.is_finite() {
            return Some(0);
        }
        let quotient = (self.end - self.start) / self.step;
        let slack = STEP_SLACK_ULPS * f64::EPSILON * (self.start.abs() + self.end.abs())
            / self.step;
        let steps = (quotient + slack).floor();
        if steps.is_nan() || steps >= usize::MAX as f64 {
            return None;
        }
        (steps as usize).checked_add(1)
    }

    /// Number of values in the range, saturating at `usize::MAX`.
    ///
    /// [`SearchConfig::validate`] rejects ranges whose count saturates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.checked_len().unwrap_or(usize::MAX)
    }

    /// Returns `true` if the range yields no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate the values in ascending order.
    ///
    /// Each value is computed as `start + i * step` so rounding error
    /// does not accumulate across the range.
    #[allow(clippy::cast_precision_loss)]
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.len()).map(|i| (i as f64).mul_add(self.step, self.start))
    }

    fn validate(&self, name: &str, problems: &mut Vec<String>) {
        if !(self.start.is_finite() && self.start > 0.0) {
            problems.push(format!("{name} start must be > 0 (got {})", self.start));
        }
        if !(self.end.is_finite() && self.end > 0.0) {
            problems.push(format!("{name} end must be > 0 (got {})", self.end));
        }
        if !(self.step.is_finite() && self.step > 0.0) {
            problems.push(format!("{name} step must be > 0 (got {})", self.step));
        }
    }
}

/// Configuration for a circle search.
///
/// Use [`SearchConfig::validate`] to check a hand-built or
/// deserialized config; [`search`](crate::search) validates before any
/// work starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Diameter of the circle being looked for, in pixels.
    pub target_diameter: f64,

    /// Maximum accepted `|diameter - target_diameter|` in pixels.
    /// Zero disables size filtering.
    pub diameter_tolerance: f64,

    /// Canny threshold axis of the grid (outer loop).
    pub canny: ThresholdRange,

    /// Accumulator threshold axis of the grid (inner loop).
    pub accumulator: ThresholdRange,

    /// Weight of the size error term. Renormalized with `center_weight`.
    pub size_weight: f64,

    /// Weight of the center distance term. Renormalized with `size_weight`.
    pub center_weight: f64,

    /// Worker thread limit. Zero uses all available hardware threads.
    pub max_threads: usize,

    /// Retain good matches for per-candidate diagnostic export.
    pub save_candidates: bool,

    /// Cap the number of exported candidates at `max_candidates`.
    pub limit_candidates: bool,

    /// Maximum number of exported candidates when `limit_candidates` is set.
    pub max_candidates: usize,

    /// Candidates scoring below this value count as good matches.
    pub good_match_score: f64,
}

impl SearchConfig {
    /// Default target diameter in pixels.
    pub const DEFAULT_TARGET_DIAMETER: f64 = 100.0;
    /// Default diameter tolerance (filtering disabled).
    pub const DEFAULT_DIAMETER_TOLERANCE: f64 = 0.0;
    /// Default Canny axis.
    pub const DEFAULT_CANNY: ThresholdRange = ThresholdRange::new(50.0, 200.0, 10.0);
    /// Default accumulator axis.
    pub const DEFAULT_ACCUMULATOR: ThresholdRange = ThresholdRange::new(20.0, 100.0, 5.0);
    /// Default size weight.
    pub const DEFAULT_SIZE_WEIGHT: f64 = 0.5;
    /// Default center weight.
    pub const DEFAULT_CENTER_WEIGHT: f64 = 0.5;
    /// Default candidate export cap.
    pub const DEFAULT_MAX_CANDIDATES: usize = 10;
    /// Default good-match cutoff.
    pub const DEFAULT_GOOD_MATCH_SCORE: f64 = 0.3;

    /// Number of grid cells this config produces, or `None` if the
    /// count overflows a `usize`.
    #[must_use]
    pub fn grid_size(&self) -> Option<usize> {
        crate::grid::grid_cells(&self.canny, &self.accumulator)
    }

    /// Check every field and report all violations at once.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidConfig`] listing each problem.
    pub fn validate(&self) -> Result<(), SearchError> {
        let mut problems = Vec::new();

        if !(self.target_diameter.is_finite() && self.target_diameter > 0.0) {
            problems.push(format!(
                "target diameter must be > 0 (got {})",
                self.target_diameter
            ));
        }
        if !(self.diameter_tolerance.is_finite() && self.diameter_tolerance >= 0.0) {
            problems.push(format!(
                "diameter tolerance must be >= 0 (got {})",
                self.diameter_tolerance
            ));
        }
        self.canny.validate("canny", &mut problems);
        self.accumulator.validate("accumulator", &mut problems);
        if self.grid_size().is_none() {
            problems.push(format!(
                "grid too large: {} canny x {} accumulator values overflow",
                self.canny.len(),
                self.accumulator.len()
            ));
        }
        if let Err(SearchError::InvalidConfig(msg)) =
            crate::score::Weights::normalized(self.size_weight, self.center_weight)
        {
            problems.push(msg);
        }
        if !(self.good_match_score.is_finite() && self.good_match_score >= 0.0) {
            problems.push(format!(
                "good match score must be >= 0 (got {})",
                self.good_match_score
            ));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(SearchError::InvalidConfig(problems.join("; ")))
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            target_diameter: Self::DEFAULT_TARGET_DIAMETER,
            diameter_tolerance: Self::DEFAULT_DIAMETER_TOLERANCE,
            canny: Self::DEFAULT_CANNY,
            accumulator: Self::DEFAULT_ACCUMULATOR,
            size_weight: Self::DEFAULT_SIZE_WEIGHT,
            center_weight: Self::DEFAULT_CENTER_WEIGHT,
            max_threads: 0,
            save_candidates: false,
            limit_candidates: true,
            max_candidates: Self::DEFAULT_MAX_CANDIDATES,
            good_match_score: Self::DEFAULT_GOOD_MATCH_SCORE,
        }
    }
}

/// Errors that stop a search before or while it starts.
///
/// Failures inside a single grid cell never surface here; they are
/// reported through [`SearchObserver::status`](crate::SearchObserver::status)
/// and counted in [`SearchResult::failures`](crate::SearchResult::failures).
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The search configuration is invalid.
    #[error("invalid search configuration: {0}")]
    InvalidConfig(String),

    /// The image has a zero width or height.
    #[error("image is empty ({width}x{height})")]
    EmptyImage {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },

    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
