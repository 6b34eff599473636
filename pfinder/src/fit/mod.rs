//! Local boundary fits inside an angular window.
//!
//! The spheroid outline is irregular, so instead of a global shape model the
//! boundary around each bead is approximated by a low-degree polynomial
//! through the contour points whose angle falls in a window around the bead.

mod polynomial;
mod window;

pub use polynomial::Polynomial;
pub use window::AngularWindow;

use glam::DVec2;
use strum_macros::Display;

use crate::config::{FitConfig, FitOrientation};
use crate::contour::Contour;
use crate::error::{Error, Result};
use crate::normal::LineDirection;

/// Fewer selected points than this make a window unusable.
pub const MIN_WINDOW_POINTS: usize = 2;

/// Independent variable of a fitted polynomial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum FitAxis {
    /// `y = p(x)`
    #[strum(serialize = "y(x)")]
    YOfX,
    /// `x = p(y)`
    #[strum(serialize = "x(y)")]
    XOfY,
}

/// Polynomial fitted through the contour points of one window.
#[derive(Debug, Clone)]
pub struct WindowFit {
    pub window: AngularWindow,
    pub axis: FitAxis,
    pub polynomial: Polynomial,
    /// Number of contour points the fit used.
    pub points: usize,
}

impl WindowFit {
    /// Tangent direction of the fitted curve at the abscissa of `point`.
    pub fn tangent_at(&self, point: DVec2) -> LineDirection {
        match self.axis {
            FitAxis::YOfX => LineDirection::from_slope(self.polynomial.slope_at(point.x)),
            FitAxis::XOfY => LineDirection::from_inverse_slope(self.polynomial.slope_at(point.y)),
        }
    }
}

/// Fit the contour points inside `window`.
///
/// Fails with [`Error::InsufficientPoints`] when fewer than
/// [`MIN_WINDOW_POINTS`] points are selected.
pub fn fit_window(contour: &Contour, window: AngularWindow, config: &FitConfig) -> Result<WindowFit> {
    let selected: Vec<DVec2> = window.select(contour).map(|p| p.position).collect();

    if selected.len() < MIN_WINDOW_POINTS {
        return Err(Error::InsufficientPoints {
            center_deg: window.center_deg,
            half_range_deg: window.half_range_deg,
            selected: selected.len(),
            required: MIN_WINDOW_POINTS,
        });
    }

    let axis = choose_axis(&selected, config.orientation);
    let (xs, ys): (Vec<f64>, Vec<f64>) = match axis {
        FitAxis::YOfX => selected.iter().map(|p| (p.x, p.y)).unzip(),
        FitAxis::XOfY => selected.iter().map(|p| (p.y, p.x)).unzip(),
    };

    let polynomial = Polynomial::fit(&xs, &ys, config.degree).ok_or(Error::DegenerateFit {
        degree: config.degree,
        points: selected.len(),
    })?;

    tracing::trace!(
        "Fitted {} over {} points in window {:.2}±{:.2}",
        axis,
        selected.len(),
        window.center_deg,
        window.half_range_deg
    );

    Ok(WindowFit {
        window,
        axis,
        polynomial,
        points: selected.len(),
    })
}

fn choose_axis(points: &[DVec2], orientation: FitOrientation) -> FitAxis {
    match orientation {
        FitOrientation::YOfX => FitAxis::YOfX,
        FitOrientation::XOfY => FitAxis::XOfY,
        FitOrientation::Auto => {
            let min = points.iter().fold(DVec2::splat(f64::INFINITY), |m, p| m.min(*p));
            let max = points
                .iter()
                .fold(DVec2::splat(f64::NEG_INFINITY), |m, p| m.max(*p));
            let spread = max - min;
            if spread.y > spread.x {
                FitAxis::XOfY
            } else {
                FitAxis::YOfX
            }
        }
    }
}
