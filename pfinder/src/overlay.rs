//! Annotated RGB renderings for checking a run by eye.

use glam::DVec2;
use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_cross_mut, draw_hollow_circle_mut, draw_line_segment_mut};

use crate::contour::Contour;
use crate::correction::CorrectionReport;
use crate::fit::{FitAxis, WindowFit};
use crate::mask::SpheroidMask;

pub mod colors {
    use image::Rgb;

    pub const GREEN: Rgb<u8> = Rgb([0, 255, 0]); // Contour
    pub const RED: Rgb<u8> = Rgb([255, 50, 50]); // Rejected contours
    pub const BLUE: Rgb<u8> = Rgb([50, 100, 255]); // Fitted windows
    pub const YELLOW: Rgb<u8> = Rgb([255, 255, 0]); // Reference beads
    pub const CYAN: Rgb<u8> = Rgb([0, 255, 255]); // Corrected beads
    pub const MAGENTA: Rgb<u8> = Rgb([255, 0, 255]); // Centroid
    pub const ORANGE: Rgb<u8> = Rgb([255, 165, 0]); // Raw displacement
}

const BEAD_RADIUS: i32 = 3;
const CURVE_SAMPLES: usize = 16;

/// Contour, centroid, fitted windows and each bead's reference and corrected
/// position drawn over `image`.
///
/// The raw displacement is drawn in orange, the normal-projected one in cyan.
pub fn render_overlay(
    image: &GrayImage,
    contour: &Contour,
    centroid: DVec2,
    report: &CorrectionReport,
) -> RgbImage {
    let mut canvas = gray_to_rgb(image);

    draw_polyline(&mut canvas, contour.positions(), colors::GREEN);

    for bead in &report.beads {
        draw_window_fit(&mut canvas, contour, &bead.projection.fit);

        let reference = bead.bead.reference;
        draw_segment(&mut canvas, reference, bead.bead.moving, colors::ORANGE);
        draw_segment(&mut canvas, reference, bead.corrected, colors::CYAN);

        let (rx, ry) = pixel(reference);
        draw_hollow_circle_mut(&mut canvas, (rx, ry), BEAD_RADIUS, colors::YELLOW);
        let (cx, cy) = pixel(bead.corrected);
        draw_cross_mut(&mut canvas, colors::CYAN, cx, cy);
    }

    for skipped in &report.skipped {
        tracing::trace!("Bead {} not drawn: {}", skipped.index, skipped.reason);
    }

    let (x, y) = pixel(centroid);
    draw_cross_mut(&mut canvas, colors::MAGENTA, x, y);
    draw_hollow_circle_mut(&mut canvas, (x, y), BEAD_RADIUS * 2, colors::MAGENTA);

    canvas
}

/// Threshold preview: the filled mask tinted over `image`, the selected
/// contour in green and every rejected external contour in red.
pub fn render_mask_preview(image: &GrayImage, mask: &SpheroidMask) -> RgbImage {
    let mut canvas = gray_to_rgb(image);

    for (px, m) in canvas.pixels_mut().zip(mask.mask().pixels()) {
        if m.0[0] != 0 {
            let [r, g, b] = px.0;
            *px = Rgb([r / 2, g / 2 + 64, b / 2]);
        }
    }

    for (i, contour) in mask.contours().iter().enumerate() {
        let color = if i == mask.selected_index() {
            colors::GREEN
        } else {
            colors::RED
        };
        draw_polyline(&mut canvas, contour.points.iter().map(|p| p.as_dvec2()), color);
    }

    canvas
}

fn gray_to_rgb(image: &GrayImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let v = image.get_pixel(x, y).0[0];
        Rgb([v, v, v])
    })
}

/// Closed polyline through `points`.
fn draw_polyline(canvas: &mut RgbImage, points: impl Iterator<Item = DVec2>, color: Rgb<u8>) {
    let points: Vec<DVec2> = points.collect();
    match points.len() {
        0 => {}
        1 => {
            let (x, y) = pixel(points[0]);
            if x >= 0 && y >= 0 && (x as u32) < canvas.width() && (y as u32) < canvas.height() {
                canvas.put_pixel(x as u32, y as u32, color);
            }
        }
        n => {
            for i in 0..n {
                draw_segment(canvas, points[i], points[(i + 1) % n], color);
            }
        }
    }
}

/// The fitted curve sampled across the extent of the window's points.
fn draw_window_fit(canvas: &mut RgbImage, contour: &Contour, fit: &WindowFit) {
    let along = |p: DVec2| match fit.axis {
        FitAxis::YOfX => p.x,
        FitAxis::XOfY => p.y,
    };
    let (lo, hi) = fit
        .window
        .select(contour)
        .map(|p| along(p.position))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !(lo < hi) {
        return;
    }

    let curve: Vec<DVec2> = (0..=CURVE_SAMPLES)
        .map(|i| {
            let t = lo + (hi - lo) * i as f64 / CURVE_SAMPLES as f64;
            let v = fit.polynomial.evaluate(t);
            match fit.axis {
                FitAxis::YOfX => DVec2::new(t, v),
                FitAxis::XOfY => DVec2::new(v, t),
            }
        })
        .collect();
    for pair in curve.windows(2) {
        draw_segment(canvas, pair[0], pair[1], colors::BLUE);
    }
}

fn draw_segment(canvas: &mut RgbImage, from: DVec2, to: DVec2, color: Rgb<u8>) {
    draw_line_segment_mut(
        canvas,
        (from.x as f32, from.y as f32),
        (to.x as f32, to.y as f32),
        color,
    );
}

fn pixel(p: DVec2) -> (i32, i32) {
    (p.x.round() as i32, p.y.round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CorrectionConfig, MaskConfig};
    use crate::correction::{correct_beads, BeadPair};
    use crate::mask::build_mask;
    use crate::testing::{circle_contour, dark_disk_image};

    #[test]
    fn test_overlay_marks_contour_centroid_and_beads() {
        let center = DVec2::new(64.0, 64.0);
        let image = GrayImage::from_pixel(128, 128, image::Luma([100]));
        let contour = circle_contour(center, 40.0, 360);
        let beads = [BeadPair::new(
            DVec2::new(104.0, 64.0),
            DVec2::new(112.0, 64.0),
        )];
        let report =
            correct_beads(&beads, &contour, center, &CorrectionConfig::default()).unwrap();

        let overlay = render_overlay(&image, &contour, center, &report);

        assert_eq!(overlay.dimensions(), image.dimensions());
        assert_eq!(*overlay.get_pixel(64, 64), colors::MAGENTA);
        // Cross arm at the corrected position.
        assert_eq!(*overlay.get_pixel(112, 63), colors::CYAN);
        // Contour away from any bead.
        assert_eq!(*overlay.get_pixel(64, 24), colors::GREEN);
        // Untouched background keeps its gray level.
        assert_eq!(*overlay.get_pixel(5, 5), Rgb([100, 100, 100]));
    }

    #[test]
    fn test_overlay_with_no_beads_draws_contour_only() {
        let center = DVec2::new(32.0, 32.0);
        let image = GrayImage::new(64, 64);
        let contour = circle_contour(center, 20.0, 180);
        let report =
            correct_beads(&[], &contour, center, &CorrectionConfig::default()).unwrap();

        let overlay = render_overlay(&image, &contour, center, &report);
        let colored = overlay.pixels().filter(|p| **p == colors::GREEN).count();
        assert!(colored > 80, "only {} contour pixels", colored);
        assert!(!overlay.pixels().any(|p| *p == colors::CYAN));
    }

    #[test]
    fn test_mask_preview_tints_foreground() {
        let image = dark_disk_image(128, 128, DVec2::new(64.0, 64.0), 30.0, 200, 50);
        let config = MaskConfig {
            threshold_scale: 0.9,
            ..Default::default()
        };
        let mask = build_mask(&image, &config).unwrap();

        let preview = render_mask_preview(&image, &mask);

        assert_eq!(*preview.get_pixel(64, 64), Rgb([25, 89, 25]));
        assert_eq!(*preview.get_pixel(2, 2), Rgb([200, 200, 200]));
        assert!(preview.pixels().any(|p| *p == colors::GREEN));
    }
}
