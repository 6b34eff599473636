//! Spheroid segmentation for low and uneven contrast images.
//!
//! # Algorithm
//!
//! 1. **Denoise**: Gaussian blur with a fixed sigma.
//! 2. **Local threshold**: Gaussian-weighted mean over a `block_size`
//!    neighbourhood minus a constant offset. A single global threshold does
//!    not survive the illumination falloff across the field of view.
//! 3. **Binarize**: inverted polarity, the spheroid is darker than its
//!    surroundings: `pixel < local_threshold * threshold_scale`.
//! 4. **Despeckle**: drop components below `min_object_size`, joined by
//!    `despeckle_connectivity` (4-connected by default).
//! 5. **Close**: morphological closing with a disk of `closing_radius`.
//! 6. **Select**: keep the external contour with the largest enclosed area
//!    and fill it. A boundary cut off by the image frame is closed along the
//!    frame before filling, so a spheroid half out of view is filled too.
//!
//! `threshold_scale` has no automatic estimate; it is meant to be tuned by
//! rerunning [`build_mask`] and looking at the result.


use std::collections::VecDeque;

use glam::{DVec2, IVec2};
use image::{GrayImage, ImageBuffer, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::distance_transform::Norm;
use imageproc::region_labelling::{connected_components, Connectivity};
use rayon::prelude::*;

use crate::config::{MaskConfig, PixelConnectivity};
use crate::error::{Error, Result};

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

type FloatImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Grey levels a pixel must sit below its threshold. Blurring a flat region
/// leaves rounding noise far smaller than this.
const FLAT_TOLERANCE: f32 = 0.05;

impl From<PixelConnectivity> for Connectivity {
    fn from(value: PixelConnectivity) -> Self {
        match value {
            PixelConnectivity::Four => Connectivity::Four,
            PixelConnectivity::Eight => Connectivity::Eight,
        }
    }
}

/// An external (outermost) border found in the cleaned binary image.
#[derive(Debug, Clone)]
pub struct ExternalContour {
    pub points: Vec<IVec2>,
    /// Enclosed area from the shoelace formula, in square pixels.
    pub area: f64,
}

/// Result of [`build_mask`].
#[derive(Debug, Clone)]
pub struct SpheroidMask {
    mask: GrayImage,
    contours: Vec<ExternalContour>,
    selected: usize,
}

impl SpheroidMask {
    /// Filled region of the selected contour: 255 inside, 0 outside.
    pub fn mask(&self) -> &GrayImage {
        &self.mask
    }

    pub fn into_mask(self) -> GrayImage {
        self.mask
    }

    /// Every external contour of the cleaned binary image.
    pub fn contours(&self) -> &[ExternalContour] {
        &self.contours
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected(&self) -> &ExternalContour {
        &self.contours[self.selected]
    }

    pub fn area(&self) -> usize {
        self.mask.pixels().filter(|p| p[0] != BACKGROUND).count()
    }
}

/// Segment the spheroid in `image`.
///
/// Fails with [`Error::MissingContour`] when nothing survives thresholding and
/// cleanup, rather than handing back an empty mask.
pub fn build_mask(image: &GrayImage, config: &MaskConfig) -> Result<SpheroidMask> {
    config.validate()?;

    let binary = threshold_foreground(image, config);
    let contours: Vec<ExternalContour> = external_contours(&binary)
        .into_iter()
        .map(|points| {
            let area = polygon_area(&points);
            ExternalContour { points, area }
        })
        .collect();

    let selected = largest_contour(&contours).ok_or(Error::MissingContour)?;
    tracing::debug!(
        "Found {} external contours, selected #{} with area {:.1}",
        contours.len(),
        selected,
        contours[selected].area
    );

    let mask = fill_component(&binary, contours[selected].points[0]);

    Ok(SpheroidMask {
        mask,
        contours,
        selected,
    })
}

/// Steps 1-5: binary foreground after thresholding, despeckling and closing.
pub fn threshold_foreground(image: &GrayImage, config: &MaskConfig) -> GrayImage {
    let (width, height) = image.dimensions();

    let pixels: Vec<f32> = image.as_raw().iter().map(|&v| v as f32).collect();
    let pixels = FloatImage::from_raw(width, height, pixels)
        .expect("pixel count matches image dimensions");

    let blurred = imageproc::filter::gaussian_blur_f32(&pixels, config.blur_sigma);
    let local = imageproc::filter::gaussian_blur_f32(&blurred, config.local_sigma());

    let mut binary = binarize(&blurred, &local, config.threshold_offset, config.threshold_scale);
    remove_small_objects(
        &mut binary,
        config.min_object_size,
        config.despeckle_connectivity.into(),
    );

    if config.closing_radius == 0 {
        return binary;
    }
    imageproc::morphology::close(&binary, Norm::L2, config.closing_radius)
}

/// Inverted local threshold: foreground where the pixel is darker than the
/// scaled local threshold by more than [`FLAT_TOLERANCE`].
fn binarize(blurred: &FloatImage, local: &FloatImage, offset: f32, scale: f32) -> GrayImage {
    let (width, height) = blurred.dimensions();
    let mut out = GrayImage::new(width, height);
    if width == 0 {
        return out;
    }
    let row_len = width as usize;

    out.par_chunks_mut(row_len)
        .zip(blurred.as_raw().par_chunks(row_len))
        .zip(local.as_raw().par_chunks(row_len))
        .for_each(|((out_row, px_row), local_row)| {
            for ((o, &px), &mean) in out_row.iter_mut().zip(px_row).zip(local_row) {
                *o = if px < (mean - offset) * scale - FLAT_TOLERANCE {
                    FOREGROUND
                } else {
                    BACKGROUND
                };
            }
        });

    out
}

/// Clear foreground components smaller than `min_size` pixels.
fn remove_small_objects(binary: &mut GrayImage, min_size: usize, connectivity: Connectivity) {
    if min_size <= 1 {
        return;
    }

    let labels = connected_components(&*binary, connectivity, Luma([BACKGROUND]));
    let max_label = labels.pixels().map(|p| p[0]).max().unwrap_or(0) as usize;
    if max_label == 0 {
        return;
    }

    let mut sizes = vec![0usize; max_label + 1];
    for p in labels.pixels() {
        sizes[p[0] as usize] += 1;
    }

    let mut removed = 0usize;
    for (px, label) in binary.pixels_mut().zip(labels.pixels()) {
        let label = label[0] as usize;
        if label != 0 && sizes[label] < min_size {
            px[0] = BACKGROUND;
            removed += 1;
        }
    }

    if removed > 0 {
        tracing::debug!("Removed {} speckle pixels below {} px", removed, min_size);
    }
}

/// Index of the contour with the largest area. First one wins ties.
fn largest_contour(contours: &[ExternalContour]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, c) in contours.iter().enumerate() {
        match best {
            Some(b) if contours[b].area >= c.area => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Outer borders of the top-level foreground components, in image
/// coordinates.
///
/// Traced on a copy framed by one background pixel: the border follower only
/// starts an outer border after a background pixel, so a component reaching
/// column 0 would otherwise be missed.
pub(crate) fn external_contours(binary: &GrayImage) -> Vec<Vec<IVec2>> {
    let (width, height) = binary.dimensions();
    let mut framed = GrayImage::new(width + 2, height + 2);
    image::imageops::replace(&mut framed, binary, 1, 1);

    find_contours::<i32>(&framed)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| c.points.iter().map(|p| IVec2::new(p.x - 1, p.y - 1)).collect())
        .collect()
}

/// Absolute shoelace area of a closed polygon.
pub(crate) fn polygon_area(points: &[IVec2]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0i64;
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        twice_area += a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64;
    }
    (twice_area as f64 / 2.0).abs()
}

/// Mask of the 8-connected component containing `seed`, with every hole
/// inside it filled.
///
/// Holes are the non-component pixels that cannot reach the image border
/// through 4-connected steps over non-component pixels. Where the component
/// touches an image edge, the edge pixels between its first and last contact
/// count as component, closing a boundary the frame cuts through.
fn fill_component(binary: &GrayImage, seed: IVec2) -> GrayImage {
    let (width, height) = binary.dimensions();
    let labels = connected_components(binary, Connectivity::Eight, Luma([BACKGROUND]));
    let target = labels.get_pixel(seed.x as u32, seed.y as u32)[0];
    debug_assert_ne!(target, 0, "contour seed must be a foreground pixel");

    let w = width as usize;
    let h = height as usize;
    let mut in_component: Vec<bool> = labels.pixels().map(|p| p[0] == target).collect();
    seal_image_edges(&mut in_component, w, h);

    let mut outside = vec![false; w * h];
    let mut queue = VecDeque::new();
    for x in 0..w {
        visit_outside(x, 0, w, &in_component, &mut outside, &mut queue);
        visit_outside(x, h - 1, w, &in_component, &mut outside, &mut queue);
    }
    for y in 0..h {
        visit_outside(0, y, w, &in_component, &mut outside, &mut queue);
        visit_outside(w - 1, y, w, &in_component, &mut outside, &mut queue);
    }

    while let Some((x, y)) = queue.pop_front() {
        if x > 0 {
            visit_outside(x - 1, y, w, &in_component, &mut outside, &mut queue);
        }
        if x + 1 < w {
            visit_outside(x + 1, y, w, &in_component, &mut outside, &mut queue);
        }
        if y > 0 {
            visit_outside(x, y - 1, w, &in_component, &mut outside, &mut queue);
        }
        if y + 1 < h {
            visit_outside(x, y + 1, w, &in_component, &mut outside, &mut queue);
        }
    }

    let pixels = outside
        .into_iter()
        .map(|o| if o { BACKGROUND } else { FOREGROUND })
        .collect();
    GrayImage::from_raw(width, height, pixels).expect("pixel count matches image dimensions")
}

/// Marks the edge pixels between the first and last component pixel on each
/// side of the image.
fn seal_image_edges(in_component: &mut [bool], width: usize, height: usize) {
    let sides: [Vec<usize>; 4] = [
        (0..width).collect(),
        (0..width).map(|x| (height - 1) * width + x).collect(),
        (0..height).map(|y| y * width).collect(),
        (0..height).map(|y| y * width + width - 1).collect(),
    ];
    for side in &sides {
        let first = side.iter().position(|&i| in_component[i]);
        let last = side.iter().rposition(|&i| in_component[i]);
        if let (Some(first), Some(last)) = (first, last) {
            for &i in &side[first..=last] {
                in_component[i] = true;
            }
        }
    }
}

#[inline]
fn visit_outside(
    x: usize,
    y: usize,
    width: usize,
    in_component: &[bool],
    outside: &mut [bool],
    queue: &mut VecDeque<(usize, usize)>,
) {
    let idx = y * width + x;
    if !in_component[idx] && !outside[idx] {
        outside[idx] = true;
        queue.push_back((x, y));
    }
}

/// Bounding box of the foreground pixels as `(min, max)` inclusive corners.
pub fn foreground_bounds(mask: &GrayImage) -> Option<(DVec2, DVec2)> {
    let mut min = DVec2::splat(f64::INFINITY);
    let mut max = DVec2::splat(f64::NEG_INFINITY);
    let mut any = false;
    for (x, y, p) in mask.enumerate_pixels() {
        if p[0] != BACKGROUND {
            let pos = DVec2::new(x as f64, y as f64);
            min = min.min(pos);
            max = max.max(pos);
            any = true;
        }
    }
    any.then_some((min, max))
}
