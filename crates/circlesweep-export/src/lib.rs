//! circlesweep-export: Result renderers (sans-IO)
//!
//! Turns a finished search into artifacts: an annotated raster image
//! with the diagnostic caption printed on it, an SVG overlay carrying the
//! same caption as text, and a plain-text summary. Every function
//! returns in-memory data; writing files is the caller's job.

pub mod annotate;
pub mod caption;
pub mod overlay;
pub mod summary;

pub use annotate::{AnnotationStyle, annotate};
pub use caption::caption_lines;
pub use overlay::{OverlayMetadata, to_overlay_svg};
pub use summary::summary;

/// Errors from rendering an artifact.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The raster canvas could not be allocated.
    #[error("cannot allocate a {width}x{height} canvas")]
    Canvas {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },

    /// The annotation style is unusable.
    #[error("invalid annotation style: {0}")]
    Style(String),

    /// The embedded caption font could not be parsed.
    #[error("caption font: {0}")]
    Font(#[from] ab_glyph::InvalidFont),
}

/// Deterministic file name for an exported candidate.
///
/// `rank` is 1-based (1 is the best candidate). The score is embedded
/// with four decimals so a directory listing sorts by rank and still
/// shows how good each candidate was.
///
/// ```
/// use circlesweep_export::candidate_file_name;
///
/// assert_eq!(candidate_file_name(3, 0.0512, "png"), "candidate_003_score_0.0512.png");
/// ```
#[must_use]
pub fn candidate_file_name(rank: usize, score: f64, extension: &str) -> String {
    format!("candidate_{rank:03}_score_{score:.4}.{extension}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_names_sort_by_rank() {
        let mut names = vec![
            candidate_file_name(10, 0.2, "png"),
            candidate_file_name(2, 0.05, "png"),
            candidate_file_name(1, 0.01, "png"),
        ];
        names.sort();
        assert_eq!(
            names,
            vec![
                "candidate_001_score_0.0100.png",
                "candidate_002_score_0.0500.png",
                "candidate_010_score_0.2000.png",
            ]
        );
    }

    #[test]
    fn candidate_name_is_stable() {
        assert_eq!(
            candidate_file_name(1, 0.123_456, "png"),
            candidate_file_name(1, 0.123_456, "png")
        );
    }
}
