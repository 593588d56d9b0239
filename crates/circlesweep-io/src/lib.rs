//! circlesweep-io: Filesystem boundary for circlesweep.
//!
//! Loads the source image, runs the search from `circlesweep-search`,
//! writes the artifacts rendered by `circlesweep-export`, and sends the
//! completion notification once everything is on disk.

pub mod artifacts;
pub mod load;
pub mod observer;

use std::path::{Path, PathBuf};

use circlesweep_search::{Detector, SearchConfig, SearchError, SearchObserver, SearchResult};

pub use artifacts::{ArtifactWriter, OutputOptions, WriteError};
pub use load::load_image;
pub use observer::LogObserver;

/// Errors that stop [`find_best_circle`] before a result exists.
#[derive(Debug, thiserror::Error)]
pub enum FindError {
    /// The image path does not name a file.
    #[error("image not found: {}", path.display())]
    MissingImage {
        /// The path that was looked up.
        path: PathBuf,
    },

    /// The file exists but is not a decodable image.
    #[error("cannot decode {}: {source}", path.display())]
    Decode {
        /// The file that failed to decode.
        path: PathBuf,
        /// The decoder error.
        source: image::ImageError,
    },

    /// The search rejected its input.
    #[error(transparent)]
    Search(#[from] SearchError),
}

/// Find the best circle in the image at `path` and write artifacts.
///
/// # Sequence
///
/// 1. Validate `config` (before touching the filesystem)
/// 2. Load the image as grayscale
/// 3. Run the parallel grid search
/// 4. Write the configured artifacts when a circle was found
/// 5. Send [`SearchObserver::completed`], with or without a circle
///
/// Artifact write failures are reported through
/// [`SearchObserver::status`] and do not fail the call.
///
/// # Errors
///
/// Returns [`FindError::Search`] for an invalid config or empty image,
/// [`FindError::MissingImage`] and [`FindError::Decode`] when the image
/// cannot be loaded. No completion is sent in these cases.
pub fn find_best_circle(
    path: &Path,
    config: &SearchConfig,
    detector: &dyn Detector,
    observer: &dyn SearchObserver,
    output: &OutputOptions,
) -> Result<SearchResult, FindError> {
    config.validate()?;
    let image = load_image(path)?;

    let result = circlesweep_search::run(&image, config, detector, observer, None)?;

    let writer = ArtifactWriter {
        image: &image,
        config,
        result: &result,
        source: Some(path),
    };
    let written = writer.write_all(output, observer);
    if written > 0 {
        log::debug!("{written} artifacts written");
    }

    observer.completed(&result.completion_report());
    Ok(result)
}
