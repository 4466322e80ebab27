//! Distance-band rejection of mismatched correspondence pairs.
//!
//! A boundary pair is kept when its length lies within `sigma` sample
//! standard deviations of the mean pair length. The centroid anchor is
//! never rejected.

#[cfg(test)]
mod tests;

use glam::DVec2;

use crate::correspondence::CorrespondenceSet;
use crate::error::{RegistrationError, Result};
use crate::math::statistics;

/// Default band half-width in standard deviations.
pub const DEFAULT_OUTLIER_SIGMA: f64 = 2.0;

/// Inclusive acceptance band on pair distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceBand {
    pub mean: f64,
    pub std_dev: f64,
    pub low: f64,
    pub high: f64,
}

impl DistanceBand {
    /// Band `[mean - sigma * sd, mean + sigma * sd]` over `distances`.
    /// `None` when `distances` is empty.
    pub fn from_distances(distances: &[f64], sigma: f64) -> Option<Self> {
        let mean = statistics::mean(distances)?;
        let std_dev = statistics::sample_std_dev(distances, mean);
        Some(Self {
            mean,
            std_dev,
            low: mean - sigma * std_dev,
            high: mean + sigma * std_dev,
        })
    }

    #[inline]
    pub fn contains(&self, distance: f64) -> bool {
        distance >= self.low && distance <= self.high
    }
}

/// Result of [`filter_outliers`].
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierSplit {
    /// Surviving pairs, original order, anchor still last.
    pub kept: CorrespondenceSet,
    /// Rejected `(source, target)` pairs in original order.
    pub removed: Vec<(DVec2, DVec2)>,
    pub band: DistanceBand,
}

/// Split `set` into pairs inside the distance band and pairs outside it.
pub fn filter_outliers(set: &CorrespondenceSet, sigma: f64) -> Result<OutlierSplit> {
    let distances = set.boundary_distances();
    let band = DistanceBand::from_distances(&distances, sigma)
        .ok_or(RegistrationError::EmptyCorrespondence)?;

    let reject: Vec<bool> = distances.iter().map(|&d| !band.contains(d)).collect();
    let removed_count = reject.iter().filter(|&&r| r).count();

    let keep_len = set.len() - removed_count;
    let mut source = Vec::with_capacity(keep_len);
    let mut target = Vec::with_capacity(keep_len);
    let mut removed = Vec::with_capacity(removed_count);
    for (i, (s, t)) in set.source().iter().zip(set.target()).enumerate() {
        // Indices past the boundary pairs belong to the anchor.
        if reject.get(i).copied().unwrap_or(false) {
            removed.push((*s, *t));
        } else {
            source.push(*s);
            target.push(*t);
        }
    }

    tracing::debug!(
        removed = removed.len(),
        kept = source.len(),
        mean = band.mean,
        std_dev = band.std_dev,
        "Filtered correspondence outliers"
    );

    Ok(OutlierSplit {
        kept: CorrespondenceSet::from_parts(source, target, set.is_anchored()),
        removed,
        band,
    })
}
