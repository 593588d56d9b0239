//! Scoring: how well a detected circle matches the target.
//!
//! A score combines two normalized error terms:
//!
//! - **size**: `|2r - target| / target`, the fractional diameter error;
//! - **center**: distance from the circle center to the image center,
//!   divided by half the image diagonal (0 at the center, ~1 at a corner).
//!
//! `score = size_weight * size + center_weight * center`. Lower is
//! better and nothing is clamped, so a pathological circle can score
//! above 1. Both terms are dimensionless, which makes the score
//! invariant under uniform scaling of the image and target together.

use serde::{Deserialize, Serialize};

use crate::types::{
    DetectedCircle, Dimensions, ParameterCombination, Point, ScoredCandidate, SearchError,
};

/// Size and center weights, normalized to sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    size: f64,
    center: f64,
}

impl Weights {
    /// Normalize a raw weight pair so the two weights sum to 1.
    ///
    /// Pairs that already sum to 1 pass through unchanged (up to
    /// rounding); any other non-negative pair is rescaled
    /// proportionally.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidConfig`] if either weight is
    /// negative or non-finite, or if both are zero.
    pub fn normalized(size: f64, center: f64) -> Result<Self, SearchError> {
        if !(size.is_finite() && size >= 0.0 && center.is_finite() && center >= 0.0) {
            return Err(SearchError::InvalidConfig(format!(
                "weights must be finite and >= 0 (got size={size}, center={center})"
            )));
        }
        let total = size + center;
        if total <= 0.0 {
            return Err(SearchError::InvalidConfig(
                "size and center weights must not both be zero".to_string(),
            ));
        }
        Ok(Self {
            size: size / total,
            center: center / total,
        })
    }

    /// Normalized size weight.
    #[must_use]
    pub const fn size(&self) -> f64 {
        self.size
    }

    /// Normalized center weight.
    #[must_use]
    pub const fn center(&self) -> f64 {
        self.center
    }
}

/// Scores circles against a fixed target and image geometry.
///
/// Construct once per search; [`Scorer::score`] is then a cheap pure
/// function safe to call from any worker thread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scorer {
    target_diameter: f64,
    image_center: Point,
    half_diagonal: f64,
    weights: Weights,
}

impl Scorer {
    /// Create a scorer.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidConfig`] if `target_diameter` is not
    /// a positive finite number, or [`SearchError::EmptyImage`] if the
    /// image has a zero side.
    pub fn new(
        target_diameter: f64,
        dimensions: Dimensions,
        weights: Weights,
    ) -> Result<Self, SearchError> {
        if !(target_diameter.is_finite() && target_diameter > 0.0) {
            return Err(SearchError::InvalidConfig(format!(
                "target diameter must be > 0 (got {target_diameter})"
            )));
        }
        if dimensions.is_empty() {
            return Err(SearchError::EmptyImage {
                width: dimensions.width,
                height: dimensions.height,
            });
        }
        Ok(Self {
            target_diameter,
            image_center: dimensions.center(),
            half_diagonal: dimensions.diagonal() / 2.0,
            weights,
        })
    }

    /// Target diameter in pixels.
    #[must_use]
    pub const fn target_diameter(&self) -> f64 {
        self.target_diameter
    }

    /// The normalized weights in use.
    #[must_use]
    pub const fn weights(&self) -> Weights {
        self.weights
    }

    /// Absolute diameter error in pixels.
    #[must_use]
    pub fn size_difference(&self, circle: &DetectedCircle) -> f64 {
        (circle.diameter() - self.target_diameter).abs()
    }

    /// Distance from the circle center to the image center in pixels.
    #[must_use]
    pub fn center_distance(&self, circle: &DetectedCircle) -> f64 {
        circle.center.distance(self.image_center)
    }

    /// Combined score. Lower is better.
    #[must_use]
    pub fn score(&self, circle: &DetectedCircle) -> f64 {
        let size = self.size_difference(circle) / self.target_diameter;
        let center = self.center_distance(circle) / self.half_diagonal;
        self.weights
            .size
            .mul_add(size, self.weights.center * center)
    }

    /// Score a circle and package it with the parameters that found it.
    #[must_use]
    pub fn evaluate(
        &self,
        circle: DetectedCircle,
        parameters: ParameterCombination,
    ) -> ScoredCandidate {
        ScoredCandidate {
            circle,
            parameters,
            size_difference: self.size_difference(&circle),
            center_distance: self.center_distance(&circle),
            score: self.score(&circle),
        }
    }

    /// Pick the lowest-scoring circle from one detector call.
    ///
    /// On exactly equal scores the first circle in `circles` wins.
    /// Returns `None` for an empty slice.
    #[must_use]
    pub fn best_of(
        &self,
        circles: &[DetectedCircle],
        parameters: ParameterCombination,
    ) -> Option<ScoredCandidate> {
        circles
            .iter()
            .map(|c| self.evaluate(*c, parameters))
            .min_by(|a, b| a.score.total_cmp(&b.score))
    }
}

/// Score a single circle without building a [`Scorer`] first.
///
/// The weight pair is renormalized as in [`Weights::normalized`].
///
/// # Errors
///
/// Returns [`SearchError::InvalidConfig`] for a non-positive target
/// diameter or an invalid weight pair, and [`SearchError::EmptyImage`]
/// for a zero-sized image.
pub fn score(
    circle: &DetectedCircle,
    target_diameter: f64,
    image_size: Dimensions,
    size_weight: f64,
    center_weight: f64,
) -> Result<f64, SearchError> {
    let weights = Weights::normalized(size_weight, center_weight)?;
    Ok(Scorer::new(target_diameter, image_size, weights)?.score(circle))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    const DIMS: Dimensions = Dimensions {
        width: 100,
        height: 100,
    };

    fn scorer(target: f64) -> Scorer {
        Scorer::new(target, DIMS, Weights::normalized(0.5, 0.5).unwrap()).unwrap()
    }

    #[test]
    fn perfect_circle_scores_zero() {
        let circle = DetectedCircle::new(Point::new(50.0, 50.0), 30.0);
        assert_relative_eq!(scorer(60.0).score(&circle), 0.0);
    }

    #[test]
    fn weights_already_normalized_pass_through() {
        let w = Weights::normalized(0.3, 0.7).unwrap();
        assert_relative_eq!(w.size(), 0.3);
        assert_relative_eq!(w.center(), 0.7);
    }

    #[test]
    fn weights_are_renormalized() {
        for (a, b) in [(1.0, 1.0), (2.0, 6.0), (0.0, 5.0), (0.25, 0.25), (10.0, 0.1)] {
            let w = Weights::normalized(a, b).unwrap();
            assert_relative_eq!(w.size(), a / (a + b));
            assert_relative_eq!(w.center(), b / (a + b));
            assert_relative_eq!(w.size() + w.center(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn weights_reject_negative_and_zero_pairs() {
        assert!(Weights::normalized(-0.1, 1.0).is_err());
        assert!(Weights::normalized(0.0, 0.0).is_err());
        assert!(Weights::normalized(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn scorer_rejects_non_positive_target() {
        let w = Weights::normalized(0.5, 0.5).unwrap();
        assert!(matches!(
            Scorer::new(0.0, DIMS, w),
            Err(SearchError::InvalidConfig(_))
        ));
        assert!(matches!(
            Scorer::new(-3.0, DIMS, w),
            Err(SearchError::InvalidConfig(_))
        ));
    }

    #[test]
    fn scorer_rejects_empty_image() {
        let w = Weights::normalized(0.5, 0.5).unwrap();
        let empty = Dimensions {
            width: 0,
            height: 100,
        };
        assert!(matches!(
            Scorer::new(10.0, empty, w),
            Err(SearchError::EmptyImage { .. })
        ));
    }

    #[test]
    fn corner_circle_center_term_is_one() {
        let w = Weights::normalized(0.0, 1.0).unwrap();
        let s = Scorer::new(60.0, DIMS, w).unwrap();
        let circle = DetectedCircle::new(Point::new(0.0, 0.0), 30.0);
        assert_relative_eq!(s.score(&circle), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn size_term_is_fractional_error() {
        let w = Weights::normalized(1.0, 0.0).unwrap();
        let s = Scorer::new(60.0, DIMS, w).unwrap();
        let circle = DetectedCircle::new(Point::new(50.0, 50.0), 36.0);
        assert_relative_eq!(s.size_difference(&circle), 12.0);
        assert_relative_eq!(s.score(&circle), 0.2);
    }

    #[test]
    fn score_is_not_clamped() {
        let w = Weights::normalized(1.0, 0.0).unwrap();
        let s = Scorer::new(10.0, DIMS, w).unwrap();
        let circle = DetectedCircle::new(Point::new(50.0, 50.0), 40.0);
        assert!(s.score(&circle) > 1.0);
    }

    #[test]
    fn score_is_scale_invariant() {
        let circle = DetectedCircle::new(Point::new(31.0, 62.0), 17.0);
        let base = score(&circle, 40.0, DIMS, 0.4, 0.6).unwrap();

        for k in [2_u32, 3, 10] {
            let kf = f64::from(k);
            let scaled_circle =
                DetectedCircle::new(Point::new(31.0 * kf, 62.0 * kf), 17.0 * kf);
            let scaled_dims = Dimensions {
                width: DIMS.width * k,
                height: DIMS.height * k,
            };
            let scaled = score(&scaled_circle, 40.0 * kf, scaled_dims, 0.4, 0.6).unwrap();
            assert_relative_eq!(base, scaled, epsilon = 1e-12);
        }
    }

    #[test]
    fn free_score_renormalizes_weights() {
        let circle = DetectedCircle::new(Point::new(20.0, 50.0), 25.0);
        let raw = score(&circle, 60.0, DIMS, 2.0, 2.0).unwrap();
        let unit = score(&circle, 60.0, DIMS, 0.5, 0.5).unwrap();
        assert_relative_eq!(raw, unit);
    }

    #[test]
    fn evaluate_fills_error_terms() {
        let params = ParameterCombination::new(100.0, 50.0);
        let circle = DetectedCircle::new(Point::new(53.0, 54.0), 28.0);
        let c = scorer(60.0).evaluate(circle, params);
        assert_relative_eq!(c.size_difference, 4.0);
        assert_relative_eq!(c.center_distance, 5.0);
        assert_eq!(c.parameters, params);
    }

    #[test]
    fn best_of_picks_lowest_score() {
        let params = ParameterCombination::new(100.0, 50.0);
        let circles = [
            DetectedCircle::new(Point::new(10.0, 10.0), 30.0),
            DetectedCircle::new(Point::new(50.0, 50.0), 30.0),
            DetectedCircle::new(Point::new(50.0, 50.0), 20.0),
        ];
        let best = scorer(60.0).best_of(&circles, params).unwrap();
        assert_eq!(best.circle, circles[1]);
    }

    #[test]
    fn best_of_ties_keep_first_seen() {
        let params = ParameterCombination::new(100.0, 50.0);
        // Mirror images about the center score identically.
        let circles = [
            DetectedCircle::new(Point::new(40.0, 50.0), 30.0),
            DetectedCircle::new(Point::new(60.0, 50.0), 30.0),
        ];
        let best = scorer(60.0).best_of(&circles, params).unwrap();
        assert_eq!(best.circle, circles[0]);
    }

    #[test]
    fn best_of_empty_is_none() {
        let params = ParameterCombination::new(100.0, 50.0);
        assert!(scorer(60.0).best_of(&[], params).is_none());
    }
}
