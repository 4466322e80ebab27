//! Configuration types for the registration core.
//!
//! All configuration structs and related enums live here; submodules import
//! the types they need. Every struct round-trips through serde so a session
//! can be configured from a YAML/JSON/bin file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RegistrationError, Result};

/// Highest accepted triangulation level (4 * 2^12 = 16384 outline points).
pub const MAX_TRIANGULATION_LEVEL: u32 = 12;

// =============================================================================
// Interpolation configuration
// =============================================================================

/// Interpolation method for image resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InterpolationMethod {
    /// Nearest neighbor - fastest, for masks and label images
    Nearest,
    /// Bilinear interpolation - reference behavior
    #[default]
    Bilinear,
    /// Bicubic (Catmull-Rom) interpolation
    Bicubic,
}

impl InterpolationMethod {
    /// Returns the kernel radius for this interpolation method.
    #[inline]
    pub fn kernel_radius(&self) -> usize {
        match self {
            InterpolationMethod::Nearest => 1,
            InterpolationMethod::Bilinear => 1,
            InterpolationMethod::Bicubic => 2,
        }
    }
}

/// Configuration for image warping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarpConfig {
    /// Interpolation method to use
    pub method: InterpolationMethod,
    /// Value to use for pixels whose preimage falls outside the source image
    pub border_value: f32,
}

impl Default for WarpConfig {
    fn default() -> Self {
        Self {
            method: InterpolationMethod::default(),
            border_value: 0.0,
        }
    }
}

// =============================================================================
// Thin-plate spline configuration
// =============================================================================

/// Configuration for thin-plate spline fitting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TpsConfig {
    /// Regularization parameter (lambda), in normalized coordinates.
    /// Each control point gets `regularization / weight` on the kernel
    /// diagonal, so heavier points are followed more closely.
    /// Default: 0.0 (exact interpolation, weights have no effect)
    pub regularization: f64,
}

impl Default for TpsConfig {
    fn default() -> Self {
        Self {
            regularization: 0.0,
        }
    }
}

// =============================================================================
// Correspondence configuration
// =============================================================================

/// How two equal-length outlines are paired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MatchStrategy {
    /// Start both outlines at the point straight above their centroid and
    /// pair by index.
    #[default]
    Positional,
    /// Try every cyclic offset of the section outline and keep the one with
    /// the smallest total pair distance.
    RotationSearch,
}

// =============================================================================
// Registration configuration
// =============================================================================

/// Parameters of one warp cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    /// Outline density: both outlines are resampled to `4 * 2^level` points.
    pub triangulation_level: u32,
    pub match_strategy: MatchStrategy,
    /// Half-width of the outlier acceptance band, in standard deviations.
    pub outlier_sigma: f64,
    /// Fit weight of every boundary pair.
    pub boundary_weight: f64,
    /// Fit weight of the centroid anchor pair.
    pub centroid_weight: f64,
    pub tps: TpsConfig,
    pub warp: WarpConfig,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            triangulation_level: 4,
            match_strategy: MatchStrategy::default(),
            outlier_sigma: 2.0,
            boundary_weight: 1.0,
            centroid_weight: 10.0,
            tps: TpsConfig {
                regularization: 0.01,
            },
            warp: WarpConfig::default(),
        }
    }
}

impl RegistrationConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<()> {
        if self.triangulation_level > MAX_TRIANGULATION_LEVEL {
            return Err(RegistrationError::InvalidConfiguration(format!(
                "triangulation_level must be at most {}, got {}",
                MAX_TRIANGULATION_LEVEL, self.triangulation_level
            )));
        }
        if !(self.outlier_sigma.is_finite() && self.outlier_sigma > 0.0) {
            return Err(RegistrationError::InvalidConfiguration(format!(
                "outlier_sigma must be positive, got {}",
                self.outlier_sigma
            )));
        }
        for (name, weight) in [
            ("boundary_weight", self.boundary_weight),
            ("centroid_weight", self.centroid_weight),
        ] {
            if !(weight.is_finite() && weight > 0.0) {
                return Err(RegistrationError::InvalidConfiguration(format!(
                    "{name} must be positive, got {weight}"
                )));
            }
        }
        if !(self.tps.regularization.is_finite() && self.tps.regularization >= 0.0) {
            return Err(RegistrationError::InvalidConfiguration(format!(
                "tps.regularization must be non-negative, got {}",
                self.tps.regularization
            )));
        }
        Ok(())
    }

    /// Load and validate a config from a `.yaml`, `.yml`, `.json` or `.bin` file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: Self = common::serde::load_file(path).map_err(|e| {
            RegistrationError::InvalidConfiguration(format!("{}: {e:#}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::FileFormat;

    #[test]
    fn test_default_is_valid() {
        RegistrationConfig::default().validate().unwrap();
    }

    #[test]
    fn test_rejects_level_above_max() {
        let config = RegistrationConfig {
            triangulation_level: MAX_TRIANGULATION_LEVEL + 1,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RegistrationError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_rejects_non_positive_weights() {
        let config = RegistrationConfig {
            centroid_weight: 0.0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("centroid_weight"));
    }

    #[test]
    fn test_rejects_negative_regularization() {
        let config = RegistrationConfig {
            tps: TpsConfig {
                regularization: -1.0,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registration.yaml");
        std::fs::write(
            &path,
            "triangulation_level: 6\nmatch_strategy: RotationSearch\n",
        )
        .unwrap();

        let config = RegistrationConfig::from_file(&path).unwrap();
        assert_eq!(config.triangulation_level, 6);
        assert_eq!(config.match_strategy, MatchStrategy::RotationSearch);
        assert_eq!(config.outlier_sigma, 2.0);
        assert_eq!(config.warp.method, InterpolationMethod::Bilinear);
    }

    #[test]
    fn test_from_file_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registration.json");
        let config = RegistrationConfig {
            outlier_sigma: -2.0,
            ..Default::default()
        };
        let bytes = common::serde::serialize(&config, FileFormat::Json).unwrap();
        std::fs::write(&path, bytes).unwrap();

        assert!(matches!(
            RegistrationConfig::from_file(&path),
            Err(RegistrationError::InvalidConfiguration(_))
        ));
    }
}
