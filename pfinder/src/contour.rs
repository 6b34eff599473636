//! Ordered spheroid boundary with polar angles.
//!
//! Angles follow one convention everywhere: `atan2(y - cy, x - cx)` in
//! degrees, shifted by +180° and wrapped into `[0, 360)`. A point straight to
//! the right of the center therefore sits at 180°, one straight to the left
//! at 0°.

use glam::DVec2;

use crate::error::{Error, Result};
use crate::mask::{external_contours, polygon_area, SpheroidMask};

/// Polar angle of `point` around `center`, in degrees within `[0, 360)`.
#[inline]
pub fn polar_angle_deg(point: DVec2, center: DVec2) -> f64 {
    let d = point - center;
    (d.y.atan2(d.x).to_degrees() + 180.0).rem_euclid(360.0)
}

/// Smallest absolute difference between two angles in degrees, within `[0, 180]`.
#[inline]
pub fn angular_distance_deg(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourPoint {
    pub position: DVec2,
    pub angle_deg: f64,
}

/// Boundary points in tracing order, with angles relative to [`Contour::center`].
///
/// The order is the border-following order, not angle order. Angles are only
/// ever computed together with the center they refer to.
#[derive(Debug, Clone)]
pub struct Contour {
    points: Vec<ContourPoint>,
    center: DVec2,
}

impl Contour {
    /// Outer boundary of the filled spheroid mask.
    pub fn trace(mask: &SpheroidMask, center: DVec2) -> Result<Self> {
        let boundary = external_contours(mask.mask())
            .into_iter()
            .max_by(|a, b| polygon_area(a).total_cmp(&polygon_area(b)))
            .ok_or(Error::MissingContour)?;

        let positions = boundary.iter().map(|p| p.as_dvec2()).collect();
        let contour = Self::from_points(positions, center);
        tracing::debug!(
            "Traced {} boundary points around ({:.2}, {:.2})",
            contour.len(),
            center.x,
            center.y
        );
        Ok(contour)
    }

    pub fn from_points(positions: Vec<DVec2>, center: DVec2) -> Self {
        let points = positions
            .into_iter()
            .map(|position| ContourPoint {
                position,
                angle_deg: polar_angle_deg(position, center),
            })
            .collect();
        Self { points, center }
    }

    /// Same points with every angle recomputed around `center`.
    pub fn with_center(&self, center: DVec2) -> Self {
        Self::from_points(self.positions().collect(), center)
    }

    pub fn center(&self) -> DVec2 {
        self.center
    }

    pub fn points(&self) -> &[ContourPoint] {
        &self.points
    }

    pub fn positions(&self) -> impl Iterator<Item = DVec2> + '_ {
        self.points.iter().map(|p| p.position)
    }

    pub fn get(&self, index: usize) -> Option<&ContourPoint> {
        self.points.get(index)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Mean of the point coordinates, `None` for an empty contour.
    ///
    /// Differs from the mask's moment centroid: boundary pixels are weighted
    /// equally, so stretches traced more densely pull it towards them.
    pub fn mean_center(&self) -> Option<DVec2> {
        if self.points.is_empty() {
            return None;
        }
        let sum: DVec2 = self.positions().sum();
        Some(sum / self.points.len() as f64)
    }

    /// Index of the point whose angle is circularly closest to `angle_deg`.
    pub fn nearest_by_angle(&self, angle_deg: f64) -> Option<usize> {
        self.points
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                angular_distance_deg(a.angle_deg, angle_deg)
                    .total_cmp(&angular_distance_deg(b.angle_deg, angle_deg))
            })
            .map(|(i, _)| i)
    }
}
