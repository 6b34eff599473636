//! Per-image geometry shared by every bead: mask, centroid and contour.

use glam::DVec2;
use image::GrayImage;

use crate::centroid::centroid;
use crate::config::MaskConfig;
use crate::contour::Contour;
use crate::error::Result;
use crate::mask::{build_mask, SpheroidMask};

#[derive(Debug, Clone)]
pub struct SpheroidAnalysis {
    pub mask: SpheroidMask,
    pub centroid: DVec2,
    /// Boundary with angles measured around [`SpheroidAnalysis::centroid`].
    pub contour: Contour,
}

/// Segment the spheroid and trace its boundary.
pub fn analyze(image: &GrayImage, config: &MaskConfig) -> Result<SpheroidAnalysis> {
    let mask = build_mask(image, config)?;
    let centroid = centroid(mask.mask())?;
    let contour = Contour::trace(&mask, centroid)?;

    tracing::info!(
        "Spheroid area {} px, centroid ({:.2}, {:.2}), {} boundary points",
        mask.area(),
        centroid.x,
        centroid.y,
        contour.len()
    );

    Ok(SpheroidAnalysis {
        mask,
        centroid,
        contour,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::testing::dark_disk_image;

    #[test]
    fn test_disk_geometry() {
        let center = DVec2::new(100.0, 90.0);
        let image = dark_disk_image(200, 180, center, 50.0, 210, 60);
        let config = MaskConfig {
            threshold_scale: 0.9,
            ..Default::default()
        };

        let analysis = analyze(&image, &config).unwrap();

        assert!(analysis.centroid.distance(center) < 1.0);
        assert_eq!(analysis.contour.center(), analysis.centroid);
        let mean = analysis.contour.mean_center().unwrap();
        assert!(mean.distance(center) < 1.5, "contour mean {:?}", mean);
        for p in analysis.contour.positions() {
            let r = p.distance(analysis.centroid);
            assert!(r > 45.0 && r < 52.0, "boundary point at radius {}", r);
        }
    }

    #[test]
    fn test_blank_image_has_no_spheroid() {
        let image = GrayImage::from_pixel(64, 64, image::Luma([128]));
        let err = analyze(&image, &MaskConfig::default()).unwrap_err();
        assert!(matches!(err, Error::MissingContour));
    }
}
