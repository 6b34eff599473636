//! Synthetic inputs shared by unit tests.

use glam::DVec2;
use image::{GrayImage, Luma};

use crate::contour::Contour;

/// Uniform background with a dark filled disk.
pub fn dark_disk_image(
    width: u32,
    height: u32,
    center: DVec2,
    radius: f64,
    background: u8,
    foreground: u8,
) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        let d = DVec2::new(x as f64, y as f64).distance(center);
        Luma([if d <= radius { foreground } else { background }])
    })
}

/// Horizontal illumination ramp from `left` to `right` with a disk whose
/// brightness is `contrast` times the local illumination.
pub fn vignetted_disk_image(
    width: u32,
    height: u32,
    center: DVec2,
    radius: f64,
    left: f64,
    right: f64,
    contrast: f64,
) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        let t = x as f64 / (width.max(2) - 1) as f64;
        let illumination = left + (right - left) * t;
        let d = DVec2::new(x as f64, y as f64).distance(center);
        let value = if d <= radius {
            illumination * contrast
        } else {
            illumination
        };
        Luma([value.round().clamp(0.0, 255.0) as u8])
    })
}

/// Binary mask of a filled disk.
pub fn disk_mask(width: u32, height: u32, center: DVec2, radius: f64) -> GrayImage {
    dark_disk_image(width, height, center, radius, 0, 255)
}

/// `n` points evenly spaced on a circle, starting half a step past angle 0 so
/// that no point sits on a whole-degree window bound.
pub fn circle_points(center: DVec2, radius: f64, n: usize) -> Vec<DVec2> {
    (0..n)
        .map(|i| {
            let theta = ((i as f64 + 0.5) * 360.0 / n as f64).to_radians();
            center + radius * DVec2::new(theta.cos(), theta.sin())
        })
        .collect()
}

/// Circle contour with angles measured from its own center.
pub fn circle_contour(center: DVec2, radius: f64, n: usize) -> Contour {
    Contour::from_points(circle_points(center, radius, n), center)
}
