//! Interactive warp session.
//!
//! A [`WarpSession`] owns all state of one section being aligned: the
//! configuration, the section's pose in the volume and the result of the
//! last successful warp cycle. A failed cycle never touches that result.

mod results_log;


use glam::DVec2;

use common::{BitBuffer2, Buffer2};

use crate::config::RegistrationConfig;
use crate::correspondence::{match_outlines, CorrespondenceSet};
use crate::error::{RegistrationError, Result, SessionError, Stage};
use crate::interpolation::warp_image;
use crate::mapping::{MappingState, PlaneOfSection, VolumeSection, VoxelResolution};
use crate::math::AffineTransform3D;
use crate::metrics;
use crate::outline::{self, outline_from_mask, MaskGenerator};
use crate::outliers::filter_outliers;
use crate::tps::ThinPlateSpline;
use crate::transform::PointTransform;

pub use results_log::{DifferenceRecord, ResultsLog, RESULTS_HEADER};

/// Outcome of one successful warp cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    /// Pairs the splines were fitted to, anchor last.
    pub correspondences: CorrespondenceSet,
    /// Pairs rejected by the outlier filter.
    pub removed: Vec<(DVec2, DVec2)>,
    /// Reference → section.
    pub forward: ThinPlateSpline,
    /// Section → reference.
    pub backward: ThinPlateSpline,
}

fn at(stage: Stage) -> impl FnOnce(RegistrationError) -> SessionError {
    move |source| SessionError::new(stage, source)
}

#[derive(Debug, Clone)]
pub struct WarpSession {
    config: RegistrationConfig,
    plane: PlaneOfSection,
    resolution: VoxelResolution,
    section: VolumeSection,
    section_pose: AffineTransform3D,
    reference_pose: AffineTransform3D,
    registration: Option<Registration>,
}

impl WarpSession {
    pub fn new(
        config: RegistrationConfig,
        plane: PlaneOfSection,
        resolution: VoxelResolution,
        section: VolumeSection,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            plane,
            resolution,
            section,
            section_pose: AffineTransform3D::identity(),
            reference_pose: AffineTransform3D::identity(),
            registration: None,
        })
    }

    pub fn config(&self) -> &RegistrationConfig {
        &self.config
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

    /// Last successful cycle, if any.
    pub fn registration(&self) -> Option<&Registration> {
        self.registration.as_ref()
    }

    pub fn set_section_pose(&mut self, pose: AffineTransform3D) {
        self.section_pose = pose;
    }

    pub fn set_reference_pose(&mut self, pose: AffineTransform3D) {
        self.reference_pose = pose;
    }

    /// Move the section plane by `transform` and fold it into the section pose.
    pub fn transform_section(&mut self, transform: &AffineTransform3D) {
        self.section = self.section.transformed(transform);
        self.section_pose = transform.compose(&self.section_pose);
    }

    /// Run one warp cycle on two binary outline images.
    ///
    /// `reference_to_section` maps reference image coordinates into the
    /// section's local frame. On failure the previous registration is kept.
    pub fn warp(
        &mut self,
        reference_outline: &BitBuffer2,
        section_outline: &BitBuffer2,
        reference_to_section: &impl PointTransform,
    ) -> std::result::Result<&Registration, SessionError> {
        match self.run_cycle(reference_outline, section_outline, reference_to_section) {
            Ok(registration) => {
                tracing::info!(
                    kept = registration.correspondences.boundary_len(),
                    removed = registration.removed.len(),
                    bending_energy = registration.forward.bending_energy(),
                    "Warp cycle complete"
                );
                let stored: &Registration = self.registration.insert(registration);
                Ok(stored)
            }
            Err(err) => {
                tracing::warn!(stage = %err.stage, error = %err.source, "Warp cycle failed");
                Err(err)
            }
        }
    }

    /// Threshold both images with `masker`, outline the masks and warp.
    pub fn warp_images(
        &mut self,
        reference_image: &Buffer2<f32>,
        section_image: &Buffer2<f32>,
        masker: &impl MaskGenerator,
        reference_to_section: &impl PointTransform,
    ) -> std::result::Result<&Registration, SessionError> {
        let reference_outline = outline_from_mask(&masker.generate(reference_image));
        let section_outline = outline_from_mask(&masker.generate(section_image));
        self.warp(&reference_outline, &section_outline, reference_to_section)
    }

    fn run_cycle(
        &self,
        reference_outline: &BitBuffer2,
        section_outline: &BitBuffer2,
        reference_to_section: &impl PointTransform,
    ) -> std::result::Result<Registration, SessionError> {
        let level = self.config.triangulation_level;

        let reference = outline::sample(reference_outline, level)
            .map_err(at(Stage::SampleReference))?
            .mapped(reference_to_section);
        let section = outline::sample(section_outline, level).map_err(at(Stage::SampleSection))?;

        let pairs = match_outlines(&reference, &section, self.config.match_strategy)
            .map_err(at(Stage::Match))?;
        let split =
            filter_outliers(&pairs, self.config.outlier_sigma).map_err(at(Stage::FilterOutliers))?;

        let weights = split
            .kept
            .weights(self.config.boundary_weight, self.config.centroid_weight);
        let forward = ThinPlateSpline::fit(&split.kept, &weights, self.config.tps)
            .map_err(at(Stage::FitForward))?;
        let backward = ThinPlateSpline::fit(&split.kept.swapped(), &weights, self.config.tps)
            .map_err(at(Stage::FitBackward))?;

        Ok(Registration {
            correspondences: split.kept,
            removed: split.removed,
            forward,
            backward,
        })
    }

    fn require_registration(&self) -> Result<&Registration> {
        self.registration
            .as_ref()
            .ok_or(RegistrationError::NoRegistration)
    }

    /// Resample a reference image into section space with the backward
    /// spline. The image must already be in the section's local frame (the
    /// frame `reference_to_section` mapped the reference outline into).
    pub fn warp_image(&self, reference_image: &Buffer2<f32>) -> Result<Buffer2<f32>> {
        let registration = self.require_registration()?;
        Ok(warp_image(
            reference_image,
            &registration.backward,
            &self.config.warp,
        ))
    }

    /// Resample a section image into the reference frame with the forward
    /// spline.
    pub fn warp_section_image(&self, section_image: &Buffer2<f32>) -> Result<Buffer2<f32>> {
        let registration = self.require_registration()?;
        Ok(warp_image(
            section_image,
            &registration.forward,
            &self.config.warp,
        ))
    }

    /// NSSD between `a` and `b`, recorded in `log` under `path`.
    pub fn compute_difference(
        &self,
        path: &str,
        section_index: usize,
        a: &Buffer2<f32>,
        b: &Buffer2<f32>,
        log: &ResultsLog,
    ) -> Result<f64> {
        let nssd = metrics::nssd(a, b)?;
        log.append(&DifferenceRecord {
            path: path.to_string(),
            plane: self.plane,
            section_index,
            nssd,
            warped: self.registration.is_some(),
        })?;
        tracing::info!(path, section_index, nssd, "Computed image difference");
        Ok(nssd)
    }

    /// Snapshot of the session for persistence.
    pub fn mapping_state(&self) -> Result<MappingState> {
        let registration = self.require_registration()?;
        Ok(MappingState::new(
            self.plane,
            self.resolution,
            self.section,
            self.section_pose,
            self.reference_pose,
            registration.forward.clone(),
            registration.backward.clone(),
        ))
    }
}
