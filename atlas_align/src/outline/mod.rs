//! Ordered boundary samples of a single closed outline.
//!
//! An [`Outline`] is produced from a 1-pixel binary outline image by a
//! boundary walk ([`trace`]) and, usually, an even arc-length resampling to
//! `4 * 2^level` points ([`sample`]). Every outline is oriented clockwise as
//! displayed (image y axis down) so two outlines can be paired by index.

mod mask;
mod trace;


use glam::DVec2;
use serde::{Deserialize, Serialize};

use common::BitBuffer2;

use crate::config::MAX_TRIANGULATION_LEVEL;
use crate::error::{RegistrationError, Result};
use crate::math::polygon;
use crate::transform::PointTransform;

pub use mask::{outline_from_mask, MaskGenerator, ThresholdMask};

/// Direction from the centroid at which positional matching starts an outline:
/// straight up in image space.
pub const CANONICAL_START_DIRECTION: DVec2 = DVec2::new(0.0, -1.0);

/// Number of points an outline is resampled to at `level`.
#[inline]
pub fn points_for_level(level: u32) -> usize {
    4usize << level
}

/// Ordered closed ring of boundary points plus the centroid of the boundary
/// pixels it was traced from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    points: Vec<DVec2>,
    centroid: DVec2,
}

impl Outline {
    /// Build an outline from an ordered ring and an explicit centroid.
    ///
    /// The ring is reversed (keeping its first point) if it runs
    /// counter-clockwise as displayed.
    pub fn from_points(points: Vec<DVec2>, centroid: DVec2) -> Self {
        let mut outline = Self { points, centroid };
        outline.orient_clockwise();
        outline
    }

    /// Build an outline whose centroid is the mean of its own points.
    pub fn from_ring(points: Vec<DVec2>) -> Self {
        let centroid = polygon::vertex_mean(&points);
        Self::from_points(points, centroid)
    }

    pub fn points(&self) -> &[DVec2] {
        &self.points
    }

    pub fn centroid(&self) -> DVec2 {
        self.centroid
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Shoelace area; positive for every outline built by this module unless
    /// the ring is degenerate.
    pub fn signed_area(&self) -> f64 {
        polygon::signed_area(&self.points)
    }

    pub fn perimeter(&self) -> f64 {
        polygon::perimeter(&self.points)
    }

    /// Map every point and the centroid through `transform`.
    ///
    /// A reflecting transform flips the traversal direction; the result is
    /// re-oriented so it still runs clockwise.
    pub fn mapped(&self, transform: &impl PointTransform) -> Self {
        Self::from_points(
            transform.apply_all(&self.points),
            transform.apply(self.centroid),
        )
    }

    /// Resample evenly by arc length to `count` points. Centroid is kept.
    pub fn resampled(&self, count: usize) -> Self {
        Self {
            points: polygon::resample_closed(&self.points, count),
            centroid: self.centroid,
        }
    }

    /// Index of the point whose direction from the centroid is closest to
    /// [`CANONICAL_START_DIRECTION`]. Ties go to the lowest index.
    pub fn canonical_start_index(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &p) in self.points.iter().enumerate() {
            let score = (p - self.centroid)
                .try_normalize()
                .map_or(f64::NEG_INFINITY, |d| d.dot(CANONICAL_START_DIRECTION));
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((i, score));
            }
        }
        best.map(|(i, _)| i)
    }

    /// Same ring, cyclically shifted so that `points[start]` comes first.
    pub fn rotated_to_start(&self, start: usize) -> Self {
        let mut points = self.points.clone();
        let len = points.len();
        if len > 0 {
            points.rotate_left(start % len);
        }
        Self {
            points,
            centroid: self.centroid,
        }
    }

    fn orient_clockwise(&mut self) {
        if polygon::signed_area(&self.points) < 0.0 {
            self.points[1..].reverse();
        }
    }
}

/// Trace the raw boundary of a binary outline image.
///
/// The walk starts at the topmost-leftmost set pixel and runs clockwise as
/// displayed. The centroid is the mean of all set pixels.
pub fn trace(image: &BitBuffer2) -> Result<Outline> {
    let ring = trace::trace_closed_ring(image)?;

    let (sum, count) = image
        .iter_set()
        .fold((DVec2::ZERO, 0usize), |(sum, count), (x, y)| {
            (sum + DVec2::new(x as f64, y as f64), count + 1)
        });
    let centroid = sum / count as f64;

    Ok(Outline::from_points(ring, centroid))
}

/// Trace `image` and resample the boundary to exactly `4 * 2^level` points.
pub fn sample(image: &BitBuffer2, level: u32) -> Result<Outline> {
    if level > MAX_TRIANGULATION_LEVEL {
        return Err(RegistrationError::InvalidConfiguration(format!(
            "triangulation level must be at most {MAX_TRIANGULATION_LEVEL}, got {level}"
        )));
    }

    let raw = trace(image)?;
    let outline = raw.resampled(points_for_level(level));

    tracing::debug!(
        raw_points = raw.len(),
        sampled_points = outline.len(),
        level,
        "Sampled outline"
    );
    Ok(outline)
}
