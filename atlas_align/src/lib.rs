//! Atlas Align - contour-driven registration of tissue sections to a
//! reference atlas.
//!
//! One warp cycle turns two binary outlines (the atlas slice and the
//! section) into a pair of thin-plate splines:
//! - outline sampling: ordered, evenly spaced boundary points plus centroid
//! - correspondence: index pairing with a centroid anchor
//! - outlier rejection: mean ± k·sd band on pair distance
//! - weighted thin-plate spline fit, forward and backward
//!
//! The splines resample images, score the alignment (NSSD) and persist as a
//! versioned [`MappingState`] blob.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use atlas_align::{Affine2D, PlaneOfSection, RegistrationConfig, VolumeSection,
//!     VoxelResolution, WarpSession};
//!
//! let mut session = WarpSession::new(
//!     RegistrationConfig::default(),
//!     PlaneOfSection::Coronal,
//!     VoxelResolution::isotropic(25.0),
//!     VolumeSection::from_plane(PlaneOfSection::Coronal, 264.0),
//! )?;
//! session.warp(&atlas_outline, &section_outline, &Affine2D::identity())?;
//! session.mapping_state()?.save_to_file("section_264.atlm")?;
//! ```

pub mod config;
pub mod correspondence;
pub mod error;
pub mod interpolation;
pub mod mapping;
pub(crate) mod math;
pub mod metrics;
pub mod outline;
pub mod outliers;
pub mod session;
pub mod tps;
pub mod transform;

// ============================================================================
// Configuration and errors
// ============================================================================

pub use config::{
    InterpolationMethod, MatchStrategy, RegistrationConfig, TpsConfig, WarpConfig,
    MAX_TRIANGULATION_LEVEL,
};
pub use error::{RegistrationError, Result, SessionError, Stage};

// ============================================================================
// Pipeline
// ============================================================================

pub use correspondence::{match_outlines, CorrespondenceSet};
pub use interpolation::{warp_image, warp_image_into};
pub use metrics::nssd;
pub use outline::{outline_from_mask, MaskGenerator, Outline, ThresholdMask};
pub use outliers::{filter_outliers, DistanceBand, OutlierSplit};
pub use tps::ThinPlateSpline;
pub use transform::{Affine2D, PointTransform};

// ============================================================================
// Session and persistence
// ============================================================================

pub use mapping::{
    MappingState, PlaneOfSection, VolumeSection, VoxelResolution, MAPPING_MAGIC, MAPPING_VERSION,
};
pub use math::AffineTransform3D;
pub use session::{DifferenceRecord, Registration, ResultsLog, WarpSession};

// Shared grid types used in the public API.
pub use common::{BitBuffer2, Buffer2};
