//! Plain-text summary file.

use std::fmt::Write;

use circlesweep_search::{SearchConfig, SearchResult, ThresholdRange};

use crate::caption::caption_lines;

/// Render a plain-text summary: source, configuration, counters and the
/// winning parameters (or the absence of one).
#[must_use]
pub fn summary(config: &SearchConfig, result: &SearchResult, source: Option<&str>) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Circle search summary");
    if let Some(source) = source {
        let _ = writeln!(out, "Source: {source}");
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Configuration");
    let _ = writeln!(out, "  target diameter:     {}", config.target_diameter);
    let _ = writeln!(out, "  diameter tolerance:  {}", config.diameter_tolerance);
    let _ = writeln!(out, "  canny:               {}", range(&config.canny));
    let _ = writeln!(out, "  accumulator:         {}", range(&config.accumulator));
    let _ = writeln!(
        out,
        "  weights:             size {} / center {}",
        config.size_weight, config.center_weight
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "{}", result.report());

    if let Some(best) = &result.best {
        let _ = writeln!(out);
        for line in caption_lines(best, config.target_diameter) {
            let _ = writeln!(out, "{line}");
        }
    }

    if !result.export_candidates.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Good matches (score < {}):",
            config.good_match_score
        );
        for (i, c) in result.export_candidates.iter().enumerate() {
            let _ = writeln!(
                out,
                "  {:>3}. canny={} accumulator={} score={:.4}",
                i + 1,
                c.parameters.canny_threshold,
                c.parameters.accumulator_threshold,
                c.score,
            );
        }
    }

    out
}

fn range(r: &ThresholdRange) -> String {
    format!("{}..={} step {} ({} values)", r.start, r.end, r.step, r.len())
}
