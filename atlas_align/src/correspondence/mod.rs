//! Point-to-point pairing of two outlines.
//!
//! The reference outline (already mapped into section space) becomes the
//! `source` side, the section outline the `target` side. After the boundary
//! pairs comes one anchor pair joining the two centroids.


use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::config::MatchStrategy;
use crate::error::{RegistrationError, Result};
use crate::outline::Outline;

/// Two equal-length point sequences paired by index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrespondenceSet {
    source: Vec<DVec2>,
    target: Vec<DVec2>,
    /// Whether the last pair is the centroid anchor.
    anchored: bool,
}

impl CorrespondenceSet {
    /// Pair `source[i]` with `target[i]`. No anchor pair.
    pub fn new(source: Vec<DVec2>, target: Vec<DVec2>) -> Result<Self> {
        if source.len() != target.len() {
            return Err(RegistrationError::LengthMismatch {
                reference: source.len(),
                section: target.len(),
            });
        }
        Ok(Self {
            source,
            target,
            anchored: false,
        })
    }

    /// Append a pair marked as the centroid anchor. An existing anchor is
    /// replaced.
    pub fn with_anchor(mut self, source: DVec2, target: DVec2) -> Self {
        if self.anchored {
            self.source.pop();
            self.target.pop();
        }
        self.source.push(source);
        self.target.push(target);
        self.anchored = true;
        self
    }

    pub(crate) fn from_parts(source: Vec<DVec2>, target: Vec<DVec2>, anchored: bool) -> Self {
        debug_assert_eq!(source.len(), target.len());
        Self {
            source,
            target,
            anchored,
        }
    }

    pub fn source(&self) -> &[DVec2] {
        &self.source
    }

    pub fn target(&self) -> &[DVec2] {
        &self.target
    }

    /// Total number of pairs, anchor included.
    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    /// Number of pairs excluding the anchor.
    pub fn boundary_len(&self) -> usize {
        self.len() - usize::from(self.anchored)
    }

    pub fn boundary_source(&self) -> &[DVec2] {
        &self.source[..self.boundary_len()]
    }

    pub fn boundary_target(&self) -> &[DVec2] {
        &self.target[..self.boundary_len()]
    }

    pub fn boundary_pairs(&self) -> impl Iterator<Item = (DVec2, DVec2)> + '_ {
        self.boundary_source()
            .iter()
            .copied()
            .zip(self.boundary_target().iter().copied())
    }

    pub fn anchor(&self) -> Option<(DVec2, DVec2)> {
        if self.anchored {
            Some((*self.source.last()?, *self.target.last()?))
        } else {
            None
        }
    }

    /// Euclidean length of every boundary pair.
    pub fn boundary_distances(&self) -> Vec<f64> {
        self.boundary_pairs().map(|(s, t)| s.distance(t)).collect()
    }

    /// Per-pair fit weights: `boundary_weight` for boundary pairs and
    /// `anchor_weight` for the anchor.
    pub fn weights(&self, boundary_weight: f64, anchor_weight: f64) -> Vec<f64> {
        let mut weights = vec![boundary_weight; self.boundary_len()];
        if self.anchored {
            weights.push(anchor_weight);
        }
        weights
    }

    /// Same pairs with source and target exchanged.
    pub fn swapped(&self) -> Self {
        Self {
            source: self.target.clone(),
            target: self.source.clone(),
            anchored: self.anchored,
        }
    }
}

/// Pair `reference` (source side) with `section` (target side) and append
/// the centroid anchor pair.
pub fn match_outlines(
    reference: &Outline,
    section: &Outline,
    strategy: MatchStrategy,
) -> Result<CorrespondenceSet> {
    if reference.len() != section.len() {
        return Err(RegistrationError::LengthMismatch {
            reference: reference.len(),
            section: section.len(),
        });
    }
    let (Some(ref_start), Some(sec_start)) = (
        reference.canonical_start_index(),
        section.canonical_start_index(),
    ) else {
        return Err(RegistrationError::EmptyCorrespondence);
    };

    let source = reference.rotated_to_start(ref_start);
    let target = match strategy {
        MatchStrategy::Positional => section.rotated_to_start(sec_start),
        MatchStrategy::RotationSearch => {
            let (offset, cost) = best_cyclic_offset(source.points(), section.points());
            tracing::debug!(offset, cost, "Rotation search picked offset");
            section.rotated_to_start(offset)
        }
    };

    let set = CorrespondenceSet::new(source.points().to_vec(), target.points().to_vec())?
        .with_anchor(reference.centroid(), section.centroid());

    tracing::debug!(
        pairs = set.boundary_len(),
        ?strategy,
        "Matched outlines"
    );
    Ok(set)
}

/// Cyclic shift `k` of `target` minimizing `Σ |source[i] - target[(i + k) % n]|`.
/// Ties resolve to the smallest `k`.
fn best_cyclic_offset(source: &[DVec2], target: &[DVec2]) -> (usize, f64) {
    let n = target.len();
    let mut best = (0, f64::INFINITY);
    for offset in 0..n {
        let cost: f64 = source
            .iter()
            .enumerate()
            .map(|(i, s)| s.distance(target[(i + offset) % n]))
            .sum();
        if cost < best.1 {
            best = (offset, cost);
        }
    }
    best
}
