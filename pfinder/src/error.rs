//! Error types for the correction pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while segmenting the spheroid or correcting bead displacements.
///
/// [`Error::InsufficientPoints`], [`Error::DegenerateFit`],
/// [`Error::ContourIndexOutOfRange`] and [`Error::ZeroRadius`] concern a single bead and are recovered by the batch
/// corrector (see [`Error::is_per_bead`]). Everything else aborts the run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Mask has zero foreground area, centroid is undefined")]
    DegenerateMask,

    #[error("No external contour found in the thresholded image")]
    MissingContour,

    #[error(
        "Angular window {center_deg:.2}°±{half_range_deg:.2}° selected {selected} contour point(s), need at least {required}"
    )]
    InsufficientPoints {
        center_deg: f64,
        half_range_deg: f64,
        selected: usize,
        required: usize,
    },

    #[error("Polynomial fit of degree {degree} over {points} point(s) did not converge")]
    DegenerateFit { degree: usize, points: usize },

    #[error("Contour index {index} is out of range for a contour of {len} point(s)")]
    ContourIndexOutOfRange { index: usize, len: usize },

    #[error("Local radius at contour point {index} is zero")]
    ZeroRadius { index: usize },

    #[error("Malformed bead table '{path}' at line {line}: {reason}")]
    MalformedTable {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load image '{path}': {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to save image '{path}': {source}")]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to read or write table '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether the error concerns a single bead and the batch may continue.
    pub fn is_per_bead(&self) -> bool {
        matches!(
            self,
            Error::InsufficientPoints { .. }
                | Error::DegenerateFit { .. }
                | Error::ContourIndexOutOfRange { .. }
                | Error::ZeroRadius { .. }
        )
    }
}
