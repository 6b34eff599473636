//! Pfinder - spheroid boundary geometry for bead-displacement pressure inference.
//!
//! Given a registered microscope image of a spheroid and a table of bead
//! positions before and after deformation, this library:
//! - segments the spheroid with a local adaptive threshold
//! - computes the mask centroid and traces the ordered boundary
//! - fits the boundary locally around each bead and projects the bead's
//!   displacement onto the boundary normal
//! - normalizes distance and displacement by the local radius
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use pfinder::{analyze, correct_beads, read_beads, write_records, Config};
//!
//! let config = Config::default();
//! let image = pfinder::load_grayscale("spheroid.png".as_ref())?;
//! let analysis = analyze(&image, &config.mask)?;
//!
//! let beads = read_beads("beads.csv".as_ref())?;
//! let report = correct_beads(&beads, &analysis.contour, analysis.centroid, &config.correction)?;
//! write_records("records.csv".as_ref(), &report, false)?;
//!
//! println!("{}", report.summary());
//! ```

mod analysis;
mod centroid;
mod config;
mod contour;
mod correction;
mod error;
mod fit;
mod image_io;
mod mask;
mod normal;
pub mod overlay;
mod table;

#[cfg(test)]
mod testing;

// ============================================================================
// Configuration and errors
// ============================================================================

pub use config::{
    CenterReference, Config, CorrectionConfig, FitConfig, FitOrientation, MaskConfig,
    PixelConnectivity, RadiusJoin,
};
pub use error::{Error, Result};

// ============================================================================
// Segmentation
// ============================================================================

pub use analysis::{analyze, SpheroidAnalysis};
pub use centroid::centroid;
pub use contour::{angular_distance_deg, polar_angle_deg, Contour, ContourPoint};
pub use mask::{
    build_mask, foreground_bounds, threshold_foreground, ExternalContour, SpheroidMask,
    BACKGROUND, FOREGROUND,
};

// ============================================================================
// Fitting and correction
// ============================================================================

pub use correction::{
    correct_beads, BeadPair, CorrectedBead, CorrectionReport, CorrectionSummary,
    NormalizedRecord, SkippedBead,
};
pub use fit::{fit_window, AngularWindow, FitAxis, Polynomial, WindowFit, MIN_WINDOW_POINTS};
pub use normal::{project_displacement, project_onto_normal, LineDirection, Projection};

// ============================================================================
// I/O
// ============================================================================

pub use image_io::{load_grayscale, save_image};
pub use table::{read_beads, read_beads_from, write_records, write_records_to};
