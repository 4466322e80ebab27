//! Tests for correspondence outlier rejection.

use super::*;
use crate::config::MatchStrategy;
use crate::correspondence::match_outlines;
use crate::outline::Outline;
use std::f64::consts::TAU;

// ============================================================================
// Helpers
// ============================================================================

fn circle(n: usize, center: DVec2, radius: f64) -> Outline {
    let points = (0..n)
        .map(|i| {
            let a = TAU * i as f64 / n as f64;
            center + radius * DVec2::new(a.cos(), a.sin())
        })
        .collect();
    Outline::from_points(points, center)
}

/// Boundary pairs shifted by `offsets[i]` along x, plus an anchor.
fn shifted_pairs(offsets: &[f64]) -> CorrespondenceSet {
    let source: Vec<DVec2> = (0..offsets.len())
        .map(|i| DVec2::new(0.0, i as f64 * 5.0))
        .collect();
    let target = source
        .iter()
        .zip(offsets)
        .map(|(s, &dx)| *s + DVec2::new(dx, 0.0))
        .collect();
    CorrespondenceSet::new(source, target)
        .unwrap()
        .with_anchor(DVec2::ZERO, DVec2::ZERO)
}

// ============================================================================
// Filtering
// ============================================================================

#[test]
fn test_concentric_circles_keep_everything() {
    let reference = circle(50, DVec2::ZERO, 10.0);
    let section = circle(50, DVec2::new(1.0, 1.0), 12.0);
    let set = match_outlines(&reference, &section, MatchStrategy::Positional).unwrap();

    let split = filter_outliers(&set, DEFAULT_OUTLIER_SIGMA).unwrap();
    assert!(split.removed.is_empty());
    assert_eq!(split.kept, set);
}

#[test]
fn test_single_far_pair_is_removed() {
    let mut offsets = vec![2.0; 20];
    for (i, d) in offsets.iter_mut().enumerate() {
        *d += 0.01 * (i % 3) as f64;
    }
    offsets[7] = 100.0;
    let set = shifted_pairs(&offsets);

    let split = filter_outliers(&set, DEFAULT_OUTLIER_SIGMA).unwrap();
    assert_eq!(split.removed.len(), 1);
    assert_eq!(split.removed[0].0, set.source()[7]);
    assert_eq!(split.removed[0].1, set.target()[7]);
    assert_eq!(split.kept.boundary_len(), 19);
    assert!(split.kept.is_anchored());
}

#[test]
fn test_partition_and_band_membership() {
    let offsets = [1.0, 1.2, 0.9, 1.1, 6.0, 1.0, 0.2, 1.05, 1.3, 0.95, 1.0, 1.1];
    let set = shifted_pairs(&offsets);
    let split = filter_outliers(&set, DEFAULT_OUTLIER_SIGMA).unwrap();

    assert_eq!(
        split.kept.boundary_len() + split.removed.len(),
        set.boundary_len()
    );

    let band = DistanceBand::from_distances(&set.boundary_distances(), 2.0).unwrap();
    assert_eq!(split.band, band);
    for (s, t) in &split.removed {
        assert!(!band.contains(s.distance(*t)));
    }
    for d in split.kept.boundary_distances() {
        assert!(band.contains(d));
    }
}

#[test]
fn test_removed_keep_original_order() {
    let mut offsets = vec![1.0; 30];
    offsets[25] = 40.0;
    offsets[3] = 45.0;
    let split = filter_outliers(&shifted_pairs(&offsets), 1.0).unwrap();

    let ys: Vec<f64> = split.removed.iter().map(|(s, _)| s.y).collect();
    assert_eq!(ys, vec![15.0, 125.0]);
}

#[test]
fn test_equal_distances_are_all_kept() {
    let split = filter_outliers(&shifted_pairs(&[3.0; 6]), DEFAULT_OUTLIER_SIGMA).unwrap();
    assert_eq!(split.band.std_dev, 0.0);
    assert!(split.removed.is_empty());
    assert_eq!(split.kept.boundary_len(), 6);
}

#[test]
fn test_single_pair_has_zero_spread() {
    let split = filter_outliers(&shifted_pairs(&[4.0]), DEFAULT_OUTLIER_SIGMA).unwrap();
    assert_eq!(split.band.low, 4.0);
    assert_eq!(split.band.high, 4.0);
    assert!(split.removed.is_empty());
}

#[test]
fn test_anchor_is_exempt() {
    let set = CorrespondenceSet::new(vec![DVec2::ZERO; 4], vec![DVec2::X; 4])
        .unwrap()
        .with_anchor(DVec2::ZERO, DVec2::splat(1000.0));
    let split = filter_outliers(&set, DEFAULT_OUTLIER_SIGMA).unwrap();
    assert!(split.removed.is_empty());
    assert_eq!(split.kept.anchor(), Some((DVec2::ZERO, DVec2::splat(1000.0))));
}

#[test]
fn test_no_boundary_pairs_is_an_error() {
    let anchor_only = CorrespondenceSet::new(Vec::new(), Vec::new())
        .unwrap()
        .with_anchor(DVec2::ZERO, DVec2::ONE);
    assert!(matches!(
        filter_outliers(&anchor_only, DEFAULT_OUTLIER_SIGMA),
        Err(RegistrationError::EmptyCorrespondence)
    ));
}
