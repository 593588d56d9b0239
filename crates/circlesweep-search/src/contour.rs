//! Contour-based circle detector backed by `imageproc`.
//!
//! 1. Canny edges via [`imageproc::edges::canny`], with the low threshold
//!    at half the high one.
//! 2. Suzuki-Abe border following via [`imageproc::contours::find_contours`].
//! 3. One circle per contour: centroid of the border points, mean
//!    distance as radius.
//! 4. Edge support: border points within [`INLIER_TOLERANCE`] of the
//!    fitted circle. A circle is reported when its support reaches the
//!    accumulator threshold and covers at least [`MIN_INLIER_FRACTION`]
//!    of the contour.
//! 5. Greedy separation: strongest circles first, dropping any circle
//!    whose center lies within `min_separation` of one already kept.
//!    This also merges the inner and outer borders of one edge ring.

use image::GrayImage;

use crate::detect::DetectRequest;
use crate::types::{DetectedCircle, Point};

/// Minimum allowed Canny threshold.
///
/// Non-maximum suppression leaves the outermost pixel ring at zero, so
/// a positive low threshold keeps hysteresis away from the image border.
pub const MIN_THRESHOLD: f32 = 1.0;
const _: () = assert!(MIN_THRESHOLD > 0.0);

/// Contours with fewer border points are ignored.
pub const MIN_CONTOUR_POINTS: usize = 8;

/// Maximum distance in pixels between a border point and the fitted
/// circle for the point to count as support.
pub const INLIER_TOLERANCE: f64 = 1.5;

/// Minimum share of a contour's points that must support its circle.
pub const MIN_INLIER_FRACTION: f64 = 0.6;

/// A fitted circle and the number of border points supporting it.
#[derive(Debug, Clone, Copy)]
struct Fit {
    circle: DetectedCircle,
    support: usize,
}

/// Detect circles for one parameter combination.
#[must_use]
pub fn detect_circles(image: &GrayImage, request: &DetectRequest) -> Vec<DetectedCircle> {
    let edges = canny(image, request.canny_threshold);

    let contours: Vec<imageproc::contours::Contour<u32>> =
        imageproc::contours::find_contours(&edges);

    let mut fits: Vec<Fit> = contours
        .iter()
        .filter(|c| c.points.len() >= MIN_CONTOUR_POINTS)
        .filter_map(|c| {
            let points: Vec<Point> = c
                .points
                .iter()
                .map(|p| Point::new(f64::from(p.x), f64::from(p.y)))
                .collect();
            fit_circle(&points)
        })
        .filter(|fit| accepts(fit, request))
        .collect();

    log::trace!(
        "canny={} accumulator={}: {} contours, {} fits",
        request.canny_threshold,
        request.accumulator_threshold,
        contours.len(),
        fits.len(),
    );

    // Stable sort keeps contour order among equally supported fits.
    fits.sort_by(|a, b| b.support.cmp(&a.support));
    separate(&fits, request.min_separation)
}

/// Canny edge map with the high threshold clamped to [`MIN_THRESHOLD`]
/// and the low threshold at half of it (but not below the minimum).
#[allow(clippy::cast_possible_truncation)]
fn canny(image: &GrayImage, high_threshold: f64) -> GrayImage {
    let high = (high_threshold as f32).max(MIN_THRESHOLD);
    let low = (high / 2.0).max(MIN_THRESHOLD);
    imageproc::edges::canny(image, low, high)
}

/// Centroid and mean-distance circle through a set of border points.
///
/// Returns `None` for an empty set or a zero radius.
#[allow(clippy::cast_precision_loss)]
fn fit_circle(points: &[Point]) -> Option<Fit> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let cx = points.iter().map(|p| p.x).sum::<f64>() / n;
    let cy = points.iter().map(|p| p.y).sum::<f64>() / n;
    let center = Point::new(cx, cy);

    let radius = points.iter().map(|p| p.distance(center)).sum::<f64>() / n;
    if radius <= 0.0 {
        return None;
    }

    let support = points
        .iter()
        .filter(|p| (p.distance(center) - radius).abs() <= INLIER_TOLERANCE)
        .count();

    Some(Fit {
        circle: DetectedCircle::new(center, radius),
        support,
    })
}

/// Radius bounds, accumulator threshold and inlier share.
#[allow(clippy::cast_precision_loss)]
fn accepts(fit: &Fit, request: &DetectRequest) -> bool {
    let radius = fit.circle.radius;
    let in_bounds =
        radius >= f64::from(request.min_radius) && radius <= f64::from(request.max_radius);
    let support = fit.support as f64;
    // Border points expected for a full ring of this radius.
    let expected = (2.0 * std::f64::consts::PI * radius).max(1.0);
    in_bounds
        && support >= request.accumulator_threshold
        && support / expected >= MIN_INLIER_FRACTION
}

/// Greedy non-maximum suppression on center distance.
fn separate(fits: &[Fit], min_separation: f64) -> Vec<DetectedCircle> {
    let mut kept: Vec<DetectedCircle> = Vec::new();
    for fit in fits {
        let crowded = kept
            .iter()
            .any(|k| k.center.distance(fit.circle.center) < min_separation);
        if !crowded {
            kept.push(fit.circle);
        }
    }
    kept
}
