//! Persisted result of an alignment session.
//!
//! Blob layout:
//!
//! ```text
//! b"ATLM" | version: u16 LE | payload
//! ```
//!
//! The payload is the state encoded with `common::serde` in the binary
//! format (bincode, lz4-compressed). Affine poses are stored as their
//! row-major coefficients and both splines as their solved coefficients, so
//! loading never refits anything.

mod volume_section;


use std::path::Path;

use serde::{Deserialize, Serialize};

use common::FileFormat;

use crate::error::{RegistrationError, Result};
use crate::math::AffineTransform3D;
use crate::tps::ThinPlateSpline;

pub use volume_section::{PlaneOfSection, VolumeSection, VoxelResolution};

pub const MAPPING_MAGIC: [u8; 4] = *b"ATLM";
pub const MAPPING_VERSION: u16 = 1;
const HEADER_LEN: usize = MAPPING_MAGIC.len() + 2;

/// Everything needed to map between a section and the atlas without
/// re-running the registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingState {
    plane: PlaneOfSection,
    resolution: VoxelResolution,
    section: VolumeSection,
    section_pose: AffineTransform3D,
    reference_pose: AffineTransform3D,
    /// Reference → section.
    forward: ThinPlateSpline,
    /// Section → reference.
    backward: ThinPlateSpline,
}

impl MappingState {
    pub fn new(
        plane: PlaneOfSection,
        resolution: VoxelResolution,
        section: VolumeSection,
        section_pose: AffineTransform3D,
        reference_pose: AffineTransform3D,
        forward: ThinPlateSpline,
        backward: ThinPlateSpline,
    ) -> Self {
        Self {
            plane,
            resolution,
            section,
            section_pose,
            reference_pose,
            forward,
            backward,
        }
    }

    pub fn plane(&self) -> PlaneOfSection {
        self.plane
    }

    pub fn resolution(&self) -> VoxelResolution {
        self.resolution
    }

    pub fn section(&self) -> &VolumeSection {
        &self.section
    }

    pub fn section_pose(&self) -> &AffineTransform3D {
        &self.section_pose
    }

    pub fn reference_pose(&self) -> &AffineTransform3D {
        &self.reference_pose
    }

    pub fn forward(&self) -> &ThinPlateSpline {
        &self.forward
    }

    pub fn backward(&self) -> &ThinPlateSpline {
        &self.backward
    }

    /// Encode into a versioned blob.
    pub fn save(&self) -> Result<Vec<u8>> {
        let mut blob = Vec::with_capacity(HEADER_LEN);
        blob.extend_from_slice(&MAPPING_MAGIC);
        blob.extend_from_slice(&MAPPING_VERSION.to_le_bytes());
        common::serde::serialize_into(self, FileFormat::Bin, &mut blob)
            .map_err(|e| RegistrationError::corrupt_mapping(format!("encode failed: {e:#}")))?;
        Ok(blob)
    }

    /// Decode a blob written by [`MappingState::save`].
    pub fn load(blob: &[u8]) -> Result<Self> {
        if blob.len() < HEADER_LEN {
            return Err(RegistrationError::corrupt_mapping(format!(
                "blob is {} bytes, shorter than the {HEADER_LEN}-byte header",
                blob.len()
            )));
        }
        let (header, payload) = blob.split_at(HEADER_LEN);
        if header[..MAPPING_MAGIC.len()] != MAPPING_MAGIC {
            return Err(RegistrationError::corrupt_mapping("bad magic bytes"));
        }
        let version = u16::from_le_bytes([header[4], header[5]]);
        if version != MAPPING_VERSION {
            return Err(RegistrationError::VersionMismatch {
                found: version,
                supported: MAPPING_VERSION,
            });
        }

        common::serde::deserialize(payload, FileFormat::Bin)
            .map_err(|e| RegistrationError::corrupt_mapping(format!("decode failed: {e:#}")))
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let blob = self.save()?;
        std::fs::write(path, &blob).map_err(|e| RegistrationError::io(path, e))?;
        tracing::info!(path = %path.display(), bytes = blob.len(), "Saved mapping state");
        Ok(())
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let blob = std::fs::read(path).map_err(|e| RegistrationError::io(path, e))?;
        Self::load(&blob)
    }
}
