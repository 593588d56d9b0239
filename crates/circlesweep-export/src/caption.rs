//! Diagnostic caption for a winning circle.

use circlesweep_search::ScoredCandidate;

/// Human-readable caption lines describing `candidate`.
///
/// Shared by the SVG overlay and the text summary so both describe a
/// result the same way.
#[must_use]
pub fn caption_lines(candidate: &ScoredCandidate, target_diameter: f64) -> Vec<String> {
    vec![
        format!(
            "canny={} accumulator={}",
            candidate.parameters.canny_threshold, candidate.parameters.accumulator_threshold,
        ),
        format!(
            "diameter {:.2}px (target {:.2}px, off by {:.2}px)",
            candidate.circle.diameter(),
            target_diameter,
            candidate.size_difference,
        ),
        format!(
            "center ({:.1}, {:.1}), {:.2}px from image center",
            candidate.circle.center.x, candidate.circle.center.y, candidate.center_distance,
        ),
        format!("score {:.4}", candidate.score),
    ]
}

#[cfg(test)]
mod tests {
    use circlesweep_search::{DetectedCircle, ParameterCombination, Point};

    use super::*;

    #[test]
    fn caption_names_parameters_and_errors() {
        let candidate = ScoredCandidate {
            circle: DetectedCircle::new(Point::new(52.0, 50.0), 31.0),
            parameters: ParameterCombination::new(100.0, 50.0),
            size_difference: 2.0,
            center_distance: 2.0,
            score: 0.0312,
        };
        let lines = caption_lines(&candidate, 60.0);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "canny=100 accumulator=50");
        assert_eq!(lines[1], "diameter 62.00px (target 60.00px, off by 2.00px)");
        assert_eq!(lines[2], "center (52.0, 50.0), 2.00px from image center");
        assert_eq!(lines[3], "score 0.0312");
    }
}
