//! Writing search artifacts to disk.
//!
//! Runs single-threaded after the search has finished. A failed write
//! is reported through the observer and never fails the search: the
//! annotated image, overlay and summary report [`Severity::Error`], a
//! single diagnostic candidate reports [`Severity::Warning`] and the
//! remaining candidates are still written.

use std::path::{Path, PathBuf};

use circlesweep_export::{
    AnnotationStyle, ExportError, OverlayMetadata, annotate, candidate_file_name, caption_lines,
    summary, to_overlay_svg,
};
use circlesweep_search::{
    Dimensions, GrayImage, ScoredCandidate, SearchConfig, SearchObserver, SearchResult, Severity,
};
use image::DynamicImage;

/// Where to write artifacts. Every output is optional.
#[derive(Debug, Clone, Default)]
pub struct OutputOptions {
    /// Annotated copy of the source image. The format follows the
    /// extension (PNG, JPEG, BMP, WebP).
    pub annotated_path: Option<PathBuf>,
    /// Plain-text summary.
    pub summary_path: Option<PathBuf>,
    /// SVG overlay with the diagnostic caption.
    pub svg_path: Option<PathBuf>,
    /// Directory for per-candidate diagnostic images. Used only when
    /// the search config enables candidate saving.
    pub candidates_dir: Option<PathBuf>,
}

impl OutputOptions {
    /// Returns `true` if no output is configured.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.annotated_path.is_none()
            && self.summary_path.is_none()
            && self.svg_path.is_none()
            && self.candidates_dir.is_none()
    }
}

/// Errors from writing a single artifact.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// Rendering failed.
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Encoding or saving an image failed.
    #[error("cannot save image: {0}")]
    Image(#[from] image::ImageError),

    /// A filesystem operation failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Everything needed to render artifacts for one search.
pub struct ArtifactWriter<'a> {
    /// Source image the search ran on.
    pub image: &'a GrayImage,
    /// Config the search ran with.
    pub config: &'a SearchConfig,
    /// The finished search.
    pub result: &'a SearchResult,
    /// Source image path, shown in the summary and overlay title.
    pub source: Option<&'a Path>,
}

impl ArtifactWriter<'_> {
    /// Write every configured artifact and return how many were written.
    ///
    /// Nothing is written when the search found no circle or was
    /// cancelled.
    pub fn write_all(&self, output: &OutputOptions, observer: &dyn SearchObserver) -> usize {
        let Some(best) = self.result.best.as_ref().filter(|_| !self.result.cancelled) else {
            if !output.is_empty() {
                log::info!("no winning circle; skipping artifacts");
            }
            return 0;
        };

        let mut written = 0;
        let mut attempt = |what: &str, path: &Path, outcome: Result<(), WriteError>| match outcome
        {
            Ok(()) => {
                log::info!("{what} written to {}", path.display());
                written += 1;
            }
            Err(e) => report(
                observer,
                Severity::Error,
                &format!("cannot write {what} to {}: {e}", path.display()),
            ),
        };

        if let Some(path) = &output.annotated_path {
            attempt("annotated image", path, self.write_annotated(best, path));
        }
        if let Some(path) = &output.svg_path {
            attempt("overlay", path, self.write_overlay(best, path));
        }
        if let Some(path) = &output.summary_path {
            attempt(
                "summary",
                path,
                std::fs::write(path, summary(self.config, self.result, self.source_name()))
                    .map_err(WriteError::from),
            );
        }
        if self.config.save_candidates
            && let Some(dir) = &output.candidates_dir
        {
            written += self.write_candidates(dir, observer);
        }

        written
    }

    fn write_annotated(&self, candidate: &ScoredCandidate, path: &Path) -> Result<(), WriteError> {
        let style = AnnotationStyle::for_dimensions(Dimensions::of(self.image));
        let caption = caption_lines(candidate, self.config.target_diameter);
        let annotated = annotate(self.image, candidate, &caption, &style)?;
        // Opaque RGB encodes in every supported format, including JPEG.
        DynamicImage::ImageRgba8(annotated).to_rgb8().save(path)?;
        Ok(())
    }

    fn write_overlay(&self, best: &ScoredCandidate, path: &Path) -> Result<(), WriteError> {
        let caption = caption_lines(best, self.config.target_diameter);
        let config_json = serde_json::to_string(self.config).ok();
        let metadata = OverlayMetadata {
            title: self.source_name(),
            description: config_json.as_deref(),
        };
        let svg = to_overlay_svg(self.result.dimensions, Some(best), &caption, &metadata);
        std::fs::write(path, svg)?;
        Ok(())
    }

    fn write_candidates(&self, dir: &Path, observer: &dyn SearchObserver) -> usize {
        if let Err(e) = std::fs::create_dir_all(dir) {
            report(
                observer,
                Severity::Error,
                &format!("cannot create {}: {e}", dir.display()),
            );
            return 0;
        }

        let mut written = 0;
        for (i, candidate) in self.result.export_candidates.iter().enumerate() {
            let path = dir.join(candidate_file_name(i + 1, candidate.score, "png"));
            match self.write_annotated(candidate, &path) {
                Ok(()) => written += 1,
                Err(e) => report(
                    observer,
                    Severity::Warning,
                    &format!("cannot write candidate {}: {e}", path.display()),
                ),
            }
        }
        log::info!(
            "{written} of {} candidates written to {}",
            self.result.export_candidates.len(),
            dir.display()
        );
        written
    }

    fn source_name(&self) -> Option<&str> {
        self.source
            .and_then(Path::file_name)
            .and_then(|name| name.to_str())
    }
}

fn report(observer: &dyn SearchObserver, severity: Severity, message: &str) {
    match severity {
        Severity::Error => log::error!("{message}"),
        Severity::Warning => log::warn!("{message}"),
        Severity::Info => log::info!("{message}"),
    }
    observer.status(message, severity);
}
