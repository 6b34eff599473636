//! Projection of bead displacements onto the local boundary normal.
//!
//! Pressure-driven bead motion is assumed to be along the normal of the
//! spheroid surface, so the tangential component of each displacement is
//! discarded.

use glam::DVec2;

use crate::config::FitConfig;
use crate::contour::{polar_angle_deg, Contour};
use crate::error::Result;
use crate::fit::{fit_window, AngularWindow, WindowFit};

/// Direction of a line in image coordinates.
///
/// Horizontal and vertical lines are tagged so that neither a zero nor an
/// infinite slope ever has to be compared as a float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineDirection {
    /// Slope 0.
    Horizontal,
    /// Infinite slope.
    Vertical,
    /// Finite, nonzero `dy/dx`.
    Sloped(f64),
}

impl LineDirection {
    /// From `dy/dx`. Non-finite slopes are vertical.
    pub fn from_slope(dy_dx: f64) -> Self {
        if dy_dx == 0.0 {
            Self::Horizontal
        } else if !dy_dx.is_finite() {
            Self::Vertical
        } else {
            Self::Sloped(dy_dx)
        }
    }

    /// From `dx/dy`, the slope of a curve fitted as `x = g(y)`.
    pub fn from_inverse_slope(dx_dy: f64) -> Self {
        if dx_dy == 0.0 {
            Self::Vertical
        } else if !dx_dy.is_finite() {
            Self::Horizontal
        } else {
            Self::from_slope(1.0 / dx_dy)
        }
    }

    /// The perpendicular direction.
    pub fn normal(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
            Self::Sloped(m) => Self::from_slope(-1.0 / m),
        }
    }

    /// `dy/dx`, infinite for [`LineDirection::Vertical`].
    pub fn slope(self) -> f64 {
        match self {
            Self::Horizontal => 0.0,
            Self::Vertical => f64::INFINITY,
            Self::Sloped(m) => m,
        }
    }

    /// Unit vector along the line, pointing towards +x (or +y when vertical).
    pub fn unit_vector(self) -> DVec2 {
        match self {
            Self::Horizontal => DVec2::new(1.0, 0.0),
            Self::Vertical => DVec2::new(0.0, 1.0),
            Self::Sloped(m) => DVec2::new(1.0, m) / 1.0f64.hypot(m),
        }
    }
}

/// Normal-projected displacement of one bead.
#[derive(Debug, Clone)]
pub struct Projection {
    /// Angle of the reference point around the center used for window selection.
    pub bead_angle_deg: f64,
    pub fit: WindowFit,
    pub tangent: LineDirection,
    pub normal: LineDirection,
    /// Signed length of the displacement along the unit normal.
    pub length: f64,
    /// `reference + length * normal`.
    pub corrected: DVec2,
}

/// Keep only the component of `moving - reference` along `normal`.
///
/// Returns the signed projection length and the corrected point. A zero
/// displacement returns `reference` unchanged.
pub fn project_displacement(reference: DVec2, moving: DVec2, normal: LineDirection) -> (f64, DVec2) {
    let n = normal.unit_vector();
    let length = (moving - reference).dot(n);
    (length, reference + length * n)
}

/// Fit the boundary around `reference` and project the bead's displacement
/// onto its normal.
///
/// The fit window is centered on the angle of `reference` around
/// `angle_center`. Contour point angles keep whatever center the contour was
/// built with; the two centers are not required to match.
pub fn project_onto_normal(
    reference: DVec2,
    moving: DVec2,
    contour: &Contour,
    angle_center: DVec2,
    config: &FitConfig,
) -> Result<Projection> {
    let bead_angle_deg = polar_angle_deg(reference, angle_center);
    let window = AngularWindow::new(bead_angle_deg, config.half_range_deg);
    let fit = fit_window(contour, window, config)?;

    let tangent = fit.tangent_at(reference);
    let normal = tangent.normal();
    let (length, corrected) = project_displacement(reference, moving, normal);

    Ok(Projection {
        bead_angle_deg,
        fit,
        tangent,
        normal,
        length,
        corrected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::testing::circle_contour;

    #[test]
    fn test_zero_tangent_gives_vertical_normal() {
        let tangent = LineDirection::from_slope(0.0);
        assert_eq!(tangent, LineDirection::Horizontal);

        let normal = tangent.normal();
        assert_eq!(normal, LineDirection::Vertical);
        assert_eq!(normal.slope(), f64::INFINITY);
        assert_eq!(normal.unit_vector(), DVec2::new(0.0, 1.0));
    }

    #[test]
    fn test_infinite_tangent_gives_horizontal_normal() {
        let tangent = LineDirection::from_slope(f64::INFINITY);
        assert_eq!(tangent, LineDirection::Vertical);

        let normal = tangent.normal();
        assert_eq!(normal, LineDirection::Horizontal);
        assert_eq!(normal.slope(), 0.0);
        assert_eq!(normal.unit_vector(), DVec2::new(1.0, 0.0));
    }

    #[test]
    fn test_inverse_slope_tags() {
        assert_eq!(LineDirection::from_inverse_slope(0.0), LineDirection::Vertical);
        assert_eq!(
            LineDirection::from_inverse_slope(f64::INFINITY),
            LineDirection::Horizontal
        );
        assert_eq!(
            LineDirection::from_inverse_slope(0.5),
            LineDirection::Sloped(2.0)
        );
    }

    #[test]
    fn test_sloped_normal_is_perpendicular_unit() {
        for m in [0.25, -3.0, 1e-3, 40.0] {
            let tangent = LineDirection::Sloped(m);
            let normal = tangent.normal();
            assert_eq!(normal, LineDirection::Sloped(-1.0 / m));

            let t = tangent.unit_vector();
            let n = normal.unit_vector();
            assert!((n.length() - 1.0).abs() < 1e-12);
            assert!(t.dot(n).abs() < 1e-12, "not perpendicular for m = {}", m);
        }
    }

    #[test]
    fn test_steep_slope_does_not_overflow() {
        let n = LineDirection::Sloped(1e200).unit_vector();
        assert!(n.is_finite());
        assert!((n.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_displacement_returns_reference() {
        let reference = DVec2::new(123.25, -7.5);
        for normal in [
            LineDirection::Horizontal,
            LineDirection::Vertical,
            LineDirection::Sloped(0.3),
        ] {
            let (length, corrected) = project_displacement(reference, reference, normal);
            assert_eq!(length, 0.0);
            assert_eq!(corrected, reference);
        }
    }

    #[test]
    fn test_tangential_motion_is_discarded() {
        let reference = DVec2::new(10.0, 10.0);
        let (length, corrected) =
            project_displacement(reference, DVec2::new(13.0, 14.0), LineDirection::Vertical);
        assert_eq!(length, 4.0);
        assert_eq!(corrected, DVec2::new(10.0, 14.0));
    }

    #[test]
    fn test_radial_bead_on_circle_side() {
        let contour = circle_contour(DVec2::ZERO, 100.0, 360);
        let projection = project_onto_normal(
            DVec2::new(100.0, 0.0),
            DVec2::new(105.0, 0.0),
            &contour,
            contour.mean_center().unwrap(),
            &FitConfig::default(),
        )
        .unwrap();

        assert!((projection.bead_angle_deg - 180.0).abs() < 1e-9);
        assert!(
            projection.corrected.distance(DVec2::new(105.0, 0.0)) < 1e-9,
            "corrected {:?}",
            projection.corrected
        );
        assert!((projection.length.abs() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_diagonal_bead_keeps_radial_component_only() {
        let contour = circle_contour(DVec2::ZERO, 200.0, 720);
        let radial = DVec2::new(1.0, 1.0).normalize();
        let tangential = radial.perp();
        let reference = 200.0 * radial;
        let moving = reference + 4.0 * radial + 3.0 * tangential;

        let projection =
            project_onto_normal(reference, moving, &contour, DVec2::ZERO, &FitConfig::default())
                .unwrap();

        let expected = reference + 4.0 * radial;
        assert!(
            projection.corrected.distance(expected) < 5e-2,
            "corrected {:?}, expected {:?}",
            projection.corrected,
            expected
        );
    }

    #[test]
    fn test_fit_failure_propagates() {
        let contour = circle_contour(DVec2::ZERO, 100.0, 8);
        let err = project_onto_normal(
            DVec2::new(100.0, 0.0),
            DVec2::new(101.0, 0.0),
            &contour,
            DVec2::ZERO,
            &FitConfig {
                half_range_deg: 1.0,
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::InsufficientPoints { .. }));
    }
}
