//! Batch correction of bead displacements.
//!
//! Each bead is projected independently. Failures that concern one bead
//! (see [`Error::is_per_bead`]) are logged and recorded as skipped, the rest
//! of the batch continues. Output order follows input order.

use std::fmt;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::config::{CenterReference, CorrectionConfig, RadiusJoin};
use crate::contour::{polar_angle_deg, Contour};
use crate::error::{Error, Result};
use crate::normal::{project_onto_normal, LineDirection, Projection};

/// Reference and displaced position of one bead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeadPair {
    pub reference: DVec2,
    pub moving: DVec2,
    /// Contour point whose distance to the centroid is the bead's local
    /// radius. `None` lets [`RadiusJoin`] pick one.
    pub contour_index: Option<usize>,
}

impl BeadPair {
    pub fn new(reference: DVec2, moving: DVec2) -> Self {
        Self {
            reference,
            moving,
            contour_index: None,
        }
    }

    pub fn with_contour_index(mut self, index: usize) -> Self {
        self.contour_index = Some(index);
        self
    }
}

/// Distance and displacement of a bead, both divided by the local radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub c_dist: f64,
    pub c_disp: f64,
    pub r: f64,
}

#[derive(Debug, Clone)]
pub struct CorrectedBead {
    /// Position of the bead in the input.
    pub index: usize,
    pub bead: BeadPair,
    pub corrected: DVec2,
    pub normal: LineDirection,
    /// Contour point the radius was taken from.
    pub contour_index: usize,
    pub record: NormalizedRecord,
    pub projection: Projection,
}

#[derive(Debug)]
pub struct SkippedBead {
    pub index: usize,
    pub reason: Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionSummary {
    pub total: usize,
    pub corrected: usize,
    pub skipped_indices: Vec<usize>,
}

impl fmt::Display for CorrectionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} bead(s) corrected",
            self.corrected, self.total
        )?;
        if !self.skipped_indices.is_empty() {
            let indices: Vec<String> = self.skipped_indices.iter().map(|i| i.to_string()).collect();
            write!(
                f,
                ", {} skipped (indices {})",
                self.skipped_indices.len(),
                indices.join(", ")
            )?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct CorrectionReport {
    pub beads: Vec<CorrectedBead>,
    pub skipped: Vec<SkippedBead>,
    /// Center the bead angles were measured around.
    pub angle_center: DVec2,
    pub centroid: DVec2,
}

impl CorrectionReport {
    pub fn records(&self) -> impl Iterator<Item = &NormalizedRecord> + '_ {
        self.beads.iter().map(|b| &b.record)
    }

    pub fn summary(&self) -> CorrectionSummary {
        let mut skipped_indices: Vec<usize> = self.skipped.iter().map(|s| s.index).collect();
        skipped_indices.sort_unstable();
        CorrectionSummary {
            total: self.beads.len() + self.skipped.len(),
            corrected: self.beads.len(),
            skipped_indices,
        }
    }
}

/// Correct every bead against `contour` and normalize by the local radius
/// around `centroid`.
///
/// Fails only on invalid configuration or an empty contour. Per-bead errors
/// end up in [`CorrectionReport::skipped`].
pub fn correct_beads(
    beads: &[BeadPair],
    contour: &Contour,
    centroid: DVec2,
    config: &CorrectionConfig,
) -> Result<CorrectionReport> {
    config.validate()?;

    let contour_mean = contour.mean_center().ok_or(Error::MissingContour)?;
    let angle_center = match config.center {
        CenterReference::ContourMean => contour_mean,
        CenterReference::Centroid => centroid,
    };
    tracing::debug!(
        "Centroid ({:.2}, {:.2}), contour mean ({:.2}, {:.2}), using {}",
        centroid.x,
        centroid.y,
        contour_mean.x,
        contour_mean.y,
        config.center
    );

    let joiner = RadiusJoiner::new(contour, centroid, config.radius_join);

    let mut report = CorrectionReport {
        beads: Vec::with_capacity(beads.len()),
        skipped: Vec::new(),
        angle_center,
        centroid,
    };

    for (index, bead) in beads.iter().enumerate() {
        match correct_bead(index, bead, contour, centroid, angle_center, &joiner, config) {
            Ok(corrected) => report.beads.push(corrected),
            Err(err) if err.is_per_bead() => {
                tracing::warn!("Skipping bead {}: {}", index, err);
                report.skipped.push(SkippedBead { index, reason: err });
            }
            Err(err) => return Err(err),
        }
    }

    tracing::info!("{}", report.summary());
    Ok(report)
}

fn correct_bead(
    index: usize,
    bead: &BeadPair,
    contour: &Contour,
    centroid: DVec2,
    angle_center: DVec2,
    joiner: &RadiusJoiner,
    config: &CorrectionConfig,
) -> Result<CorrectedBead> {
    let projection = project_onto_normal(
        bead.reference,
        bead.moving,
        contour,
        angle_center,
        &config.fit,
    )?;

    let contour_index = joiner.index_for(index, bead)?;
    let boundary = contour
        .get(contour_index)
        .ok_or(Error::ContourIndexOutOfRange {
            index: contour_index,
            len: contour.len(),
        })?
        .position;

    let r = boundary.distance(centroid);
    if r == 0.0 {
        return Err(Error::ZeroRadius {
            index: contour_index,
        });
    }

    let record = NormalizedRecord {
        c_dist: bead.reference.distance(centroid) / r,
        c_disp: projection.corrected.distance(bead.reference) / r,
        r,
    };

    Ok(CorrectedBead {
        index,
        bead: *bead,
        corrected: projection.corrected,
        normal: projection.normal,
        contour_index,
        record,
        projection,
    })
}

/// Picks the contour point a bead's radius is measured to.
enum RadiusJoiner {
    Positional,
    /// Contour re-centred on the centroid.
    NearestAngle(Contour),
}

impl RadiusJoiner {
    fn new(contour: &Contour, centroid: DVec2, mode: RadiusJoin) -> Self {
        match mode {
            RadiusJoin::Positional => Self::Positional,
            RadiusJoin::NearestAngle if contour.center() == centroid => {
                Self::NearestAngle(contour.clone())
            }
            RadiusJoin::NearestAngle => Self::NearestAngle(contour.with_center(centroid)),
        }
    }

    fn index_for(&self, bead_index: usize, bead: &BeadPair) -> Result<usize> {
        if let Some(index) = bead.contour_index {
            return Ok(index);
        }
        match self {
            Self::Positional => Ok(bead_index),
            Self::NearestAngle(around_centroid) => around_centroid
                .nearest_by_angle(polar_angle_deg(bead.reference, around_centroid.center()))
                .ok_or(Error::MissingContour),
        }
    }
}
