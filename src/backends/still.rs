// SPDX-License-Identifier: MPL-2.0

//! Still images loaded from disk

use crate::constants::files;
use crate::errors::{AppResult, OperationError};
use crate::media::Frame;
use std::path::Path;
use tracing::{debug, info};

/// Decode an image file into a color frame
///
/// Gray and alpha inputs are converted to three channels, matching what a
/// camera frame looks like.
pub fn load_image(path: &Path) -> AppResult<Frame> {
    debug!(path = %path.display(), "Loading image");
    let image = image::open(path).map_err(|e| match e {
        image::ImageError::IoError(io) => {
            crate::errors::AppError::Storage(format!("{}: {}", path.display(), io))
        }
        other => OperationError::Decode(format!("{}: {}", path.display(), other)).into(),
    })?;
    let frame = Frame::from_dynamic(image)?;
    info!(
        path = %path.display(),
        width = frame.width(),
        height = frame.height(),
        "Image loaded"
    );
    Ok(frame)
}

/// Whether the file picker should offer this path
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(files::is_image_extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use image::{GrayImage, Luma};
    use std::path::PathBuf;

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported_image(Path::new("a/b/photo.JPG")));
        assert!(is_supported_image(Path::new("scan.bmp")));
        assert!(!is_supported_image(Path::new("movie.avi")));
        assert!(!is_supported_image(Path::new("noext")));
    }

    #[test]
    fn test_gray_file_loads_as_color() {
        let path = std::env::temp_dir().join(format!("vislab-still-{}.png", std::process::id()));
        GrayImage::from_pixel(3, 2, Luma([77])).save(&path).unwrap();

        let frame = load_image(&path).unwrap();
        assert!(!frame.is_gray());
        assert_eq!(frame.dimensions(), (3, 2));
        assert_eq!(frame.to_rgb().get_pixel(1, 1).0, [77, 77, 77]);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_is_storage_error() {
        let err = load_image(&PathBuf::from("/nonexistent/vislab.png")).unwrap_err();
        assert!(matches!(err, AppError::Storage(_)), "got {:?}", err);
    }
}
