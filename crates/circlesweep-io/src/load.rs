//! Image loading.

use std::path::Path;

use circlesweep_search::GrayImage;

use crate::FindError;

/// Load `path` and convert it to 8-bit grayscale.
///
/// A path that does not name a file is reported as
/// [`FindError::MissingImage`] before any decoding is attempted.
///
/// # Errors
///
/// Returns [`FindError::MissingImage`] or [`FindError::Decode`].
pub fn load_image(path: &Path) -> Result<GrayImage, FindError> {
    if !path.is_file() {
        return Err(FindError::MissingImage {
            path: path.to_path_buf(),
        });
    }
    let image = image::open(path).map_err(|source| FindError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!(
        "loaded {} ({}x{}, {:?})",
        path.display(),
        image.width(),
        image.height(),
        image.color(),
    );
    Ok(image.to_luma8())
}
