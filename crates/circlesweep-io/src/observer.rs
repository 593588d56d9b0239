//! Observer that forwards search notifications to the `log` facade.

use circlesweep_search::{CompletionReport, SearchObserver};

/// Logs progress at `info` and the completion report as a one-line
/// summary.
///
/// Status messages are not repeated here: the search and the artifact
/// writer already log them at the matching level where they are raised.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl SearchObserver for LogObserver {
    fn progress(&self, current: usize, total: usize, message: Option<&str>) {
        match message {
            Some(message) => log::info!("[{current}/{total}] {message}"),
            None => log::info!("[{current}/{total}]"),
        }
    }

    fn completed(&self, report: &CompletionReport) {
        let info = &report.info;
        if info.cancelled {
            log::warn!(
                "completed: cancelled after {} combinations",
                info.combinations_tested
            );
            return;
        }
        match (report.circle, report.parameters, info.score) {
            (Some(circle), Some(params), Some(score)) => log::info!(
                "completed: circle r={:.2} at ({:.1}, {:.1}) with canny={} accumulator={}, \
                 score {score:.4} ({} combinations, {} qualifying)",
                circle.radius,
                circle.center.x,
                circle.center.y,
                params.canny_threshold,
                params.accumulator_threshold,
                info.combinations_tested,
                info.circles_found,
            ),
            _ => log::info!(
                "completed: no circle found ({} combinations)",
                info.combinations_tested
            ),
        }
    }
}
