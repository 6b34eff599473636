//! Loading inputs as 8-bit grayscale and saving rendered outputs.

use std::path::Path;

use image::{ColorType, DynamicImage, GrayImage};

use crate::error::{Error, Result};

/// Open any format the `image` crate decodes and convert it to 8-bit luma.
///
/// 16-bit and float inputs are rescaled by the conversion, not clipped.
pub fn load_grayscale(path: &Path) -> Result<GrayImage> {
    let image = image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;

    if !matches!(image.color(), ColorType::L8) {
        tracing::debug!(
            "Converting {} from {:?} to 8-bit grayscale",
            path.display(),
            image.color()
        );
    }
    Ok(image.into_luma8())
}

/// Save an image, format chosen from the extension.
pub fn save_image(image: impl Into<DynamicImage>, path: &Path) -> Result<()> {
    image
        .into()
        .save(path)
        .map_err(|source| Error::ImageSave {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::debug!("Saved {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use image::{Luma, Rgb, RgbImage};

    use super::*;

    #[test]
    fn test_gray_png_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.png");
        let image = GrayImage::from_fn(16, 8, |x, y| Luma([(x * 10 + y) as u8]));

        save_image(image.clone(), &path).unwrap();
        let loaded = load_grayscale(&path).unwrap();

        assert_eq!(loaded, image);
    }

    #[test]
    fn test_rgb_input_is_converted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rgb.png");
        save_image(RgbImage::from_pixel(4, 4, Rgb([90, 90, 90])), &path).unwrap();

        let loaded = load_grayscale(&path).unwrap();

        assert_eq!(loaded.dimensions(), (4, 4));
        assert_eq!(loaded.get_pixel(1, 1).0[0], 90);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_grayscale(Path::new("/nonexistent/spheroid.png")).unwrap_err();
        match &err {
            Error::ImageLoad { path, .. } => assert!(path.ends_with("spheroid.png")),
            other => panic!("unexpected error {:?}", other),
        }
        assert!(err.to_string().contains("spheroid.png"));
    }

    #[test]
    fn test_unknown_extension_fails_to_save() {
        let dir = tempfile::tempdir().unwrap();
        let err = save_image(GrayImage::new(2, 2), &dir.path().join("out.unknown")).unwrap_err();
        assert!(matches!(err, Error::ImageSave { .. }));
    }
}
