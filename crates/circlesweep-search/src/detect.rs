//! Circle detection seam.
//!
//! This module defines the [`Detector`] trait the search calls once per
//! grid cell, and the [`DetectorKind`] enum for selecting a built-in
//! implementation at runtime.
//!
//! # Strategy pattern
//!
//! The search never looks inside a detector: it hands over an image and
//! a [`DetectRequest`] and scores whatever circles come back. Tests plug
//! in deterministic closures; the CLI uses [`DetectorKind::Contour`].

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::contour;
use crate::types::{DetectedCircle, ParameterCombination};

/// Lower radius bound as a fraction of the target radius.
pub const MIN_RADIUS_FACTOR: f64 = 0.7;

/// Upper radius bound as a fraction of the target radius.
pub const MAX_RADIUS_FACTOR: f64 = 1.3;

/// Minimum center separation as a fraction of the target diameter.
pub const MIN_SEPARATION_FACTOR: f64 = 0.5;

const _: () = assert!(MIN_RADIUS_FACTOR < 1.0 && MAX_RADIUS_FACTOR > 1.0);

/// Everything a detector needs besides the image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectRequest {
    /// Smallest radius to report, in pixels.
    pub min_radius: u32,
    /// Largest radius to report, in pixels.
    pub max_radius: u32,
    /// Canny (high) threshold.
    pub canny_threshold: f64,
    /// Minimum edge support for a reported circle.
    pub accumulator_threshold: f64,
    /// Minimum distance between reported circle centers, in pixels.
    pub min_separation: f64,
}

impl DetectRequest {
    /// Derive radius bounds and separation from the target diameter
    /// using [`MIN_RADIUS_FACTOR`], [`MAX_RADIUS_FACTOR`] and
    /// [`MIN_SEPARATION_FACTOR`].
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn for_target(target_diameter: f64, parameters: ParameterCombination) -> Self {
        let target_radius = target_diameter / 2.0;
        Self {
            min_radius: (target_radius * MIN_RADIUS_FACTOR).floor().max(0.0) as u32,
            max_radius: (target_radius * MAX_RADIUS_FACTOR).ceil().max(1.0) as u32,
            canny_threshold: parameters.canny_threshold,
            accumulator_threshold: parameters.accumulator_threshold,
            min_separation: target_diameter * MIN_SEPARATION_FACTOR,
        }
    }

    /// The grid cell this request was built from.
    #[must_use]
    pub const fn parameters(&self) -> ParameterCombination {
        ParameterCombination::new(self.canny_threshold, self.accumulator_threshold)
    }
}

/// A detector failure for a single grid cell.
///
/// Recovered by the search: the cell is counted as processed and
/// reported as a warning, and the rest of the grid carries on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("circle detection failed: {0}")]
pub struct DetectError(pub String);

/// Trait for circle detection strategies.
///
/// Implementations are shared across worker threads and must not
/// mutate `image`. Any number of circles may be returned in any order.
pub trait Detector: Sync {
    /// Detect circles in `image` for one parameter combination.
    ///
    /// # Errors
    ///
    /// Returns [`DetectError`] if detection fails for this combination.
    fn detect(
        &self,
        image: &GrayImage,
        request: &DetectRequest,
    ) -> Result<Vec<DetectedCircle>, DetectError>;
}

impl<F> Detector for F
where
    F: Fn(&GrayImage, &DetectRequest) -> Result<Vec<DetectedCircle>, DetectError> + Sync,
{
    fn detect(
        &self,
        image: &GrayImage,
        request: &DetectRequest,
    ) -> Result<Vec<DetectedCircle>, DetectError> {
        self(image, request)
    }
}

/// Selects which built-in detector to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DetectorKind {
    /// Canny edges and border following via `imageproc`, one circle fit
    /// per traced contour. See [`crate::contour`].
    #[default]
    Contour,
}

impl Detector for DetectorKind {
    fn detect(
        &self,
        image: &GrayImage,
        request: &DetectRequest,
    ) -> Result<Vec<DetectedCircle>, DetectError> {
        match *self {
            Self::Contour => Ok(contour::detect_circles(image, request)),
        }
    }
}
