//! Configuration types for the correction pipeline.
//!
//! Every tunable that used to be adjusted interactively (`threshold_scale`,
//! `half_range_deg`) lives here as a plain value passed into each call.
//! Re-running a stage with different values is up to the caller.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::{Error, Result};

// ============================================================================
// Enums
// ============================================================================

/// Which axis is treated as the independent variable of a local boundary fit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum FitOrientation {
    /// Always fit `y = f(x)`.
    YOfX,
    /// Always fit `x = g(y)`.
    XOfY,
    /// Fit `x = g(y)` when the window spans more rows than columns, `y = f(x)`
    /// otherwise. Keeps near-vertical stretches of boundary well-posed.
    #[default]
    Auto,
}

/// Center used to compute a bead's angle when choosing its fit window.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CenterReference {
    /// Mean of the contour point coordinates.
    #[default]
    ContourMean,
    /// Moment centroid of the mask.
    Centroid,
}

/// How a bead without an explicit `contour_index` is matched to the contour
/// point whose distance to the centroid gives its local radius.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum RadiusJoin {
    /// Contour point whose angle around the centroid is closest to the bead's.
    #[default]
    NearestAngle,
    /// Bead `i` uses contour point `i`.
    Positional,
}

/// Pixel adjacency used when measuring components for despeckling.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum PixelConnectivity {
    /// Edge neighbours only.
    #[default]
    Four,
    /// Edge and corner neighbours.
    Eight,
}

// ============================================================================
// Mask
// ============================================================================

/// Parameters of the spheroid segmentation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskConfig {
    /// Sigma of the denoising blur, in pixels.
    pub blur_sigma: f32,
    /// Side of the neighbourhood the local threshold is averaged over. Odd.
    pub block_size: u32,
    /// Constant subtracted from the local mean.
    pub threshold_offset: f32,
    /// A pixel is foreground when `pixel < local_threshold * threshold_scale`.
    pub threshold_scale: f32,
    /// Connected components with fewer pixels are dropped before closing.
    pub min_object_size: usize,
    /// Adjacency that joins pixels into one component for `min_object_size`.
    pub despeckle_connectivity: PixelConnectivity,
    /// Radius of the disk used for morphological closing.
    pub closing_radius: u8,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            blur_sigma: 2.0,
            block_size: 51,
            threshold_offset: 0.0,
            threshold_scale: 0.9,
            min_object_size: 64,
            despeckle_connectivity: PixelConnectivity::Four,
            closing_radius: 3,
        }
    }
}

impl MaskConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.blur_sigma > 0.0) {
            return Err(invalid(format!(
                "blur_sigma must be positive, got {}",
                self.blur_sigma
            )));
        }
        if self.block_size < 3 || self.block_size % 2 == 0 {
            return Err(invalid(format!(
                "block_size must be odd and >= 3, got {}",
                self.block_size
            )));
        }
        if !(self.threshold_scale > 0.0) || !self.threshold_scale.is_finite() {
            return Err(invalid(format!(
                "threshold_scale must be positive, got {}",
                self.threshold_scale
            )));
        }
        if !self.threshold_offset.is_finite() {
            return Err(invalid(format!(
                "threshold_offset must be finite, got {}",
                self.threshold_offset
            )));
        }
        Ok(())
    }

    /// Sigma of the Gaussian weighting of the local threshold neighbourhood.
    pub fn local_sigma(&self) -> f32 {
        (self.block_size - 1) as f32 / 6.0
    }
}

// ============================================================================
// Fit
// ============================================================================

/// Parameters of the local boundary fit around one bead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Half width of the angular window, in degrees.
    pub half_range_deg: f64,
    /// Degree of the fitted polynomial, at most [`FitConfig::MAX_DEGREE`].
    pub degree: usize,
    pub orientation: FitOrientation,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            half_range_deg: 10.0,
            degree: 2,
            orientation: FitOrientation::Auto,
        }
    }
}

impl FitConfig {
    pub const MAX_DEGREE: usize = 10;

    pub fn validate(&self) -> Result<()> {
        if !(self.half_range_deg > 0.0 && self.half_range_deg <= 180.0) {
            return Err(invalid(format!(
                "half_range_deg must be in (0, 180], got {}",
                self.half_range_deg
            )));
        }
        if !(1..=Self::MAX_DEGREE).contains(&self.degree) {
            return Err(invalid(format!(
                "degree must be in 1..={}, got {}",
                Self::MAX_DEGREE,
                self.degree
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Correction
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionConfig {
    pub fit: FitConfig,
    pub center: CenterReference,
    pub radius_join: RadiusJoin,
}

impl CorrectionConfig {
    pub fn validate(&self) -> Result<()> {
        self.fit.validate()
    }
}

// ============================================================================
// Top level
// ============================================================================

/// Full pipeline configuration, loadable from YAML or JSON.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mask: MaskConfig,
    pub correction: CorrectionConfig,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        self.mask.validate()?;
        self.correction.validate()
    }
}

fn invalid(reason: String) -> Error {
    Error::InvalidConfig(reason)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_local_sigma_follows_block_size() {
        let config = MaskConfig {
            block_size: 51,
            ..Default::default()
        };
        assert!((config.local_sigma() - 50.0 / 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_even_block_size_rejected() {
        let config = MaskConfig {
            block_size: 50,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_non_positive_threshold_scale_rejected() {
        for scale in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let config = MaskConfig {
                threshold_scale: scale,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "scale {} accepted", scale);
        }
    }

    #[test]
    fn test_half_range_bounds() {
        for half_range_deg in [0.0, -5.0, 181.0] {
            let config = FitConfig {
                half_range_deg,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "{} accepted", half_range_deg);
        }
        FitConfig {
            half_range_deg: 180.0,
            ..Default::default()
        }
        .validate()
        .unwrap();
    }

    #[test]
    fn test_degree_bounds() {
        for degree in [0, FitConfig::MAX_DEGREE + 1, 120] {
            let config = FitConfig {
                degree,
                ..Default::default()
            };
            assert!(
                matches!(config.validate(), Err(Error::InvalidConfig(_))),
                "degree {} accepted",
                degree
            );
        }
        FitConfig {
            degree: FitConfig::MAX_DEGREE,
            ..Default::default()
        }
        .validate()
        .unwrap();
    }

    #[test]
    fn test_default_threshold_scale_is_below_one() {
        let config = MaskConfig::default();
        assert!(config.threshold_scale < 1.0);
        assert_eq!(config.despeckle_connectivity, PixelConnectivity::Four);
    }

    #[test]
    fn test_enum_names_round_trip_through_strings() {
        assert_eq!(CenterReference::ContourMean.to_string(), "contour-mean");
        assert_eq!(
            CenterReference::from_str("centroid").unwrap(),
            CenterReference::Centroid
        );
        assert_eq!(
            RadiusJoin::from_str("nearest-angle").unwrap(),
            RadiusJoin::NearestAngle
        );
        assert_eq!(FitOrientation::from_str("y-of-x").unwrap(), FitOrientation::YOfX);
        assert_eq!(
            PixelConnectivity::from_str("eight").unwrap(),
            PixelConnectivity::Eight
        );
        assert!(FitOrientation::from_str("sideways").is_err());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: Config = common::config_file::from_str(
            "mask:\n  threshold_scale: 0.85\ncorrection:\n  center: centroid\n",
            common::config_file::ConfigFormat::Yaml,
            std::path::Path::new("inline.yaml"),
        )
        .unwrap();

        assert_eq!(config.mask.threshold_scale, 0.85);
        assert_eq!(config.mask.block_size, 51);
        assert_eq!(config.correction.center, CenterReference::Centroid);
        assert_eq!(config.correction.fit, FitConfig::default());
    }
}
