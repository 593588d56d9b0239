//! circlesweep-search: Parallel threshold grid search (sans-IO).
//!
//! Finds the circle in an image whose diameter best matches a target
//! and whose center lies closest to the image center, by running a
//! circle detector over every (Canny, accumulator) threshold pair:
//!
//! config validation -> grid generation -> parallel evaluation ->
//! reduction -> completion notification.
//!
//! This crate has **no I/O dependencies** -- it operates on an
//! in-memory [`GrayImage`] and returns structured data. Loading images
//! and writing artifacts lives in `circlesweep-io`.

pub mod contour;
pub mod detect;
pub mod evaluate;
pub mod grid;
pub mod observer;
pub mod reduce;
pub mod result;
pub mod score;
pub mod types;

use std::num::NonZeroUsize;
use std::sync::atomic::AtomicBool;
use std::time::Instant;

pub use detect::{DetectError, DetectRequest, Detector, DetectorKind};
pub use evaluate::{Evaluation, Evaluator};
pub use grid::{build_grid, grid_cells};
pub use observer::{CompletionReport, NullObserver, ResultInfo, SearchObserver, Severity};
pub use result::{SearchOutcome, SearchResult};
pub use score::{Scorer, Weights, score};
pub use types::{
    DetectedCircle, Dimensions, GrayImage, ParameterCombination, Point, ScoredCandidate,
    SearchConfig, SearchError, ThresholdRange,
};

/// Run a complete search and notify `observer` when it finishes.
///
/// Equivalent to [`run`] without a cancel flag, followed by
/// [`SearchObserver::completed`]. The completion notification fires
/// for every search that gets past validation, with or without a match.
///
/// # Errors
///
/// Returns [`SearchError::InvalidConfig`] or [`SearchError::EmptyImage`]
/// before any work starts, and [`SearchError::ThreadPool`] if the worker
/// pool cannot be built.
pub fn search(
    image: &GrayImage,
    config: &SearchConfig,
    detector: &dyn Detector,
    observer: &dyn SearchObserver,
) -> Result<SearchResult, SearchError> {
    let result = run(image, config, detector, observer, None)?;
    observer.completed(&result.completion_report());
    Ok(result)
}

/// Run a search without sending the completion notification.
///
/// Callers that export artifacts after the search (see
/// `circlesweep-io`) use this and send the completion themselves once
/// the artifacts are written.
///
/// # Pipeline steps
///
/// 1. Validate the config and normalize the weights
/// 2. Build the scorer for this image
/// 3. Build the (Canny, accumulator) grid
/// 4. Evaluate every cell on a bounded rayon pool
/// 5. Reduce to the minimum-score candidate
/// 6. Select good matches for diagnostic export
///
/// When `cancel` is set while the grid is running, remaining cells are
/// skipped and [`SearchResult::outcome`] reports
/// [`SearchOutcome::Cancelled`].
///
/// # Errors
///
/// See [`search`].
pub fn run(
    image: &GrayImage,
    config: &SearchConfig,
    detector: &dyn Detector,
    observer: &dyn SearchObserver,
    cancel: Option<&AtomicBool>,
) -> Result<SearchResult, SearchError> {
    // 1. Validate before any work starts.
    config.validate()?;
    let weights = Weights::normalized(config.size_weight, config.center_weight)?;

    // 2. Scorer for this image.
    let dimensions = Dimensions::of(image);
    let scorer = Scorer::new(config.target_diameter, dimensions, weights)?;

    // 3. Grid.
    let grid = build_grid(&config.canny, &config.accumulator)?;
    let threads = resolve_threads(config.max_threads);
    log::info!(
        "searching {} combinations on {threads} threads ({}x{} image, target diameter {})",
        grid.len(),
        dimensions.width,
        dimensions.height,
        config.target_diameter,
    );

    // 4. Parallel evaluation. `install` returns after every cell finishes.
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()?;
    let evaluator = Evaluator {
        image,
        scorer: &scorer,
        detector,
        observer,
        diameter_tolerance: config.diameter_tolerance,
        cancel,
    };
    let started = Instant::now();
    let evaluation = pool.install(|| evaluator.run(&grid));
    let duration = started.elapsed();

    // 5. Reduction.
    let best = reduce::best_candidate(&evaluation.published).copied();

    // 6. Candidates for diagnostic export.
    let export_candidates = if config.save_candidates {
        reduce::export_candidates(
            &evaluation.published,
            config.good_match_score,
            config.limit_candidates.then_some(config.max_candidates),
        )
    } else {
        Vec::new()
    };

    if evaluation.cancelled {
        log::warn!(
            "search cancelled after {} of {} combinations",
            evaluation.processed,
            grid.len()
        );
    }
    match &best {
        Some(b) => log::info!(
            "best: canny={} accumulator={} score={:.4} ({} qualifying of {} tested)",
            b.parameters.canny_threshold,
            b.parameters.accumulator_threshold,
            b.score,
            evaluation.published.len(),
            evaluation.processed,
        ),
        None => log::info!(
            "no qualifying circle in {} combinations",
            evaluation.processed
        ),
    }

    Ok(SearchResult {
        best,
        export_candidates,
        combinations_tested: evaluation.processed,
        total_combinations: grid.len(),
        circles_detected: evaluation.circles_detected,
        failures: evaluation.failures,
        dimensions,
        threads,
        cancelled: evaluation.cancelled,
        duration,
        qualifying: evaluation.published,
    })
}

/// Resolve a worker limit: zero means every available hardware thread.
#[must_use]
pub fn resolve_threads(max_threads: usize) -> usize {
    if max_threads == 0 {
        std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
    } else {
        max_threads
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Completions(Mutex<Vec<CompletionReport>>);

    impl SearchObserver for Completions {
        fn completed(&self, report: &CompletionReport) {
            self.0.lock().unwrap().push(*report);
        }
    }

    fn nothing(_: &GrayImage, _: &DetectRequest) -> Result<Vec<DetectedCircle>, DetectError> {
        Ok(Vec::new())
    }

    #[test]
    fn resolve_threads_zero_uses_hardware() {
        assert!(resolve_threads(0) >= 1);
        assert_eq!(resolve_threads(3), 3);
    }

    #[test]
    fn invalid_config_fails_before_work() {
        let config = SearchConfig {
            target_diameter: 0.0,
            ..SearchConfig::default()
        };
        let observer = Completions::default();
        let result = search(&GrayImage::new(10, 10), &config, &nothing, &observer);
        assert!(matches!(result, Err(SearchError::InvalidConfig(_))));
        assert!(observer.0.lock().unwrap().is_empty());
    }

    #[test]
    fn empty_image_is_rejected() {
        let result = search(
            &GrayImage::new(0, 0),
            &SearchConfig::default(),
            &nothing,
            &NullObserver,
        );
        assert!(matches!(result, Err(SearchError::EmptyImage { .. })));
    }

    #[test]
    fn completion_fires_without_match() {
        let observer = Completions::default();
        let config = SearchConfig {
            max_threads: 2,
            ..SearchConfig::default()
        };
        let result = search(&GrayImage::new(32, 32), &config, &nothing, &observer).unwrap();
        assert!(result.best.is_none());
        let completions = observer.0.lock().unwrap();
        assert_eq!(completions.len(), 1);
        assert!(completions[0].circle.is_none());
        assert_eq!(
            Some(completions[0].info.combinations_tested),
            config.grid_size()
        );
    }

    #[test]
    fn run_does_not_send_completion() {
        let observer = Completions::default();
        run(
            &GrayImage::new(32, 32),
            &SearchConfig::default(),
            &nothing,
            &observer,
            None,
        )
        .unwrap();
        assert!(observer.0.lock().unwrap().is_empty());
    }

    #[test]
    fn builtin_detector_on_blank_image() {
        let config = SearchConfig {
            target_diameter: 20.0,
            canny: ThresholdRange::new(50.0, 100.0, 50.0),
            accumulator: ThresholdRange::new(10.0, 20.0, 10.0),
            max_threads: 1,
            ..SearchConfig::default()
        };
        let image = GrayImage::from_pixel(40, 40, image::Luma([90]));
        let result = search(&image, &config, &DetectorKind::Contour, &NullObserver).unwrap();
        assert_eq!(result.combinations_tested, 4);
        assert!(result.best.is_none());
    }
}
