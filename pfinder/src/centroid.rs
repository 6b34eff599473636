//! Area centroid of a binary mask from raw image moments.

use glam::DVec2;
use image::GrayImage;

use crate::error::{Error, Result};

/// Center of mass of all nonzero pixels: `(m10 / m00, m01 / m00)`.
///
/// Every foreground pixel counts once regardless of which connected region it
/// belongs to. Fails with [`Error::DegenerateMask`] when there is none.
pub fn centroid(mask: &GrayImage) -> Result<DVec2> {
    let mut m00 = 0u64;
    let mut m10 = 0u64;
    let mut m01 = 0u64;

    for (x, y, p) in mask.enumerate_pixels() {
        if p[0] != 0 {
            m00 += 1;
            m10 += x as u64;
            m01 += y as u64;
        }
    }

    if m00 == 0 {
        return Err(Error::DegenerateMask);
    }

    let area = m00 as f64;
    Ok(DVec2::new(m10 as f64 / area, m01 as f64 / area))
}
