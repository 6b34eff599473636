//! Angular selection of contour points with wraparound at 0°/360°.

use crate::contour::{Contour, ContourPoint};

/// Open angular interval `(center - half_range, center + half_range)`, wrapped
/// around the circle when it crosses 0°/360°.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngularWindow {
    pub center_deg: f64,
    pub half_range_deg: f64,
}

impl AngularWindow {
    pub fn new(center_deg: f64, half_range_deg: f64) -> Self {
        Self {
            center_deg,
            half_range_deg,
        }
    }

    /// Whether `angle_deg` (in `[0, 360)`) lies strictly inside the window.
    ///
    /// Three cases, each bound exclusive:
    /// - `a < h`: `(360 - (h - a), 360) ∪ [0, a + h)`
    /// - `a > 360 - h`: `(a - h, 360) ∪ [0, h - (360 - a))`
    /// - otherwise: `(a - h, a + h)`
    #[inline]
    pub fn contains(&self, angle_deg: f64) -> bool {
        let a = self.center_deg;
        let h = self.half_range_deg;

        if a < h {
            angle_deg > 360.0 - (h - a) || angle_deg < a + h
        } else if a > 360.0 - h {
            angle_deg > a - h || angle_deg < h - (360.0 - a)
        } else {
            angle_deg > a - h && angle_deg < a + h
        }
    }

    /// Points of `contour` inside the window, in contour order.
    pub fn select<'a>(&self, contour: &'a Contour) -> impl Iterator<Item = &'a ContourPoint> {
        let window = *self;
        contour
            .points()
            .iter()
            .filter(move |p| window.contains(p.angle_deg))
    }
}
