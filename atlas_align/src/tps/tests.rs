//! Tests for the weighted thin-plate spline.

use super::*;
use crate::config::{MatchStrategy, RegistrationConfig};
use crate::correspondence::match_outlines;
use crate::outline::Outline;
use crate::outliers::filter_outliers;
use std::f64::consts::TAU;

// ============================================================================
// Helpers
// ============================================================================

/// 4-corner + center source grid on [0,100]x[0,100].
fn square_source_5() -> Vec<DVec2> {
    vec![
        DVec2::new(0.0, 0.0),
        DVec2::new(100.0, 0.0),
        DVec2::new(0.0, 100.0),
        DVec2::new(100.0, 100.0),
        DVec2::new(50.0, 50.0),
    ]
}

/// Assert that point `a` is within `tol` of point `b` (per-component).
fn assert_dvec2_near(a: DVec2, b: DVec2, tol: f64, msg: &str) {
    assert!(
        (a - b).abs().max_element() < tol,
        "{msg}: got {a:?} expected {b:?}"
    );
}

fn unit_weights(n: usize) -> Vec<f64> {
    vec![1.0; n]
}

/// Fit with unit weights and no regularization.
fn fit_exact(source: &[DVec2], target: &[DVec2]) -> ThinPlateSpline {
    ThinPlateSpline::fit_points(source, target, &unit_weights(source.len()), TpsConfig::default())
        .unwrap()
}

fn circle(n: usize, center: DVec2, radius: f64) -> Outline {
    let points = (0..n)
        .map(|i| {
            let a = TAU * i as f64 / n as f64;
            center + radius * DVec2::new(a.cos(), a.sin())
        })
        .collect();
    Outline::from_points(points, center)
}

fn assert_singular(result: Result<ThinPlateSpline>) {
    assert!(
        matches!(result, Err(RegistrationError::SingularSystem { .. })),
        "expected SingularSystem, got {result:?}"
    );
}

// ============================================================================
// tps_kernel
// ============================================================================

#[test]
fn test_tps_kernel_known_values() {
    assert_eq!(tps_kernel(0.0), 0.0);
    assert_eq!(tps_kernel(1e-11), 0.0);
    assert!(tps_kernel(1.0).abs() < 1e-15);

    let e = std::f64::consts::E;
    assert!((tps_kernel(e) - e * e).abs() < 1e-12);
    assert!((tps_kernel(2.0) - 4.0 * 2.0_f64.ln()).abs() < 1e-12);
    // Negative below r = 1.
    assert!(tps_kernel(0.5) < 0.0);
}

// ============================================================================
// Normalization
// ============================================================================

#[test]
fn test_normalization_uses_larger_half_extent() {
    let points = vec![
        DVec2::new(10.0, 20.0),
        DVec2::new(210.0, 20.0),
        DVec2::new(10.0, 80.0),
    ];
    let norm = Normalization::from_points(&points).unwrap();
    assert_dvec2_near(norm.center, DVec2::new(110.0, 50.0), 1e-12, "center");
    assert!((norm.scale - 100.0).abs() < 1e-12);
    assert_dvec2_near(norm.invert(norm.apply(points[1])), points[1], 1e-12, "roundtrip");
}

#[test]
fn test_normalization_rejects_coincident_points() {
    let points = vec![DVec2::new(42.0, 17.0); 3];
    assert!(matches!(
        Normalization::from_points(&points),
        Err(RegistrationError::SingularSystem { .. })
    ));
}

// ============================================================================
// LU decomposition
// ============================================================================

#[test]
fn test_lu_solves_2x2() {
    // 2x + y = 5, x + 3y = 7  =>  x = 1.6, y = 1.8
    let lu = LuDecomposition::factor(vec![2.0, 1.0, 1.0, 3.0], 2).unwrap();
    let x = lu.solve(&[5.0, 7.0]);
    assert!((x[0] - 1.6).abs() < 1e-12);
    assert!((x[1] - 1.8).abs() < 1e-12);
}

#[test]
fn test_lu_pivots_on_zero_diagonal() {
    // [0 1; 1 0] needs a row swap.
    let lu = LuDecomposition::factor(vec![0.0, 1.0, 1.0, 0.0], 2).unwrap();
    assert_eq!(lu.solve(&[3.0, 4.0]), vec![4.0, 3.0]);
}

#[test]
fn test_lu_singular() {
    let result = LuDecomposition::factor(vec![1.0, 2.0, 2.0, 4.0], 2);
    assert!(matches!(result, Err(RegistrationError::SingularSystem { .. })));
}

// ============================================================================
// Fit rejection
// ============================================================================

#[test]
fn test_fit_two_points_is_singular() {
    let s = vec![DVec2::new(0.0, 0.0), DVec2::new(100.0, 100.0)];
    let t = vec![DVec2::new(1.0, 1.0), DVec2::new(101.0, 101.0)];
    assert_singular(ThinPlateSpline::fit_points(&s, &t, &unit_weights(2), TpsConfig::default()));
}

#[test]
fn test_fit_collinear_is_singular() {
    let s = vec![
        DVec2::new(0.0, 0.0),
        DVec2::new(50.0, 50.0),
        DVec2::new(100.0, 100.0),
    ];
    let t: Vec<DVec2> = s.iter().map(|&p| p + DVec2::X).collect();
    assert_singular(ThinPlateSpline::fit_points(&s, &t, &unit_weights(3), TpsConfig::default()));
}

#[test]
fn test_fit_duplicate_points_without_regularization_is_singular() {
    let mut s = square_source_5();
    s.push(s[2]);
    let mut t = s.clone();
    t[5] += DVec2::new(3.0, 0.0);
    assert_singular(ThinPlateSpline::fit_points(&s, &t, &unit_weights(6), TpsConfig::default()));
}

#[test]
fn test_fit_rejects_bad_weights() {
    let s = square_source_5();
    let zero_weight = [1.0, 1.0, 0.0, 1.0, 1.0];
    assert_singular(ThinPlateSpline::fit_points(&s, &s, &zero_weight, TpsConfig::default()));
    assert_singular(ThinPlateSpline::fit_points(&s, &s, &unit_weights(4), TpsConfig::default()));
}

#[test]
fn test_fit_mismatched_counts() {
    let s = square_source_5();
    let result = ThinPlateSpline::fit_points(&s, &s[..4], &unit_weights(5), TpsConfig::default());
    assert!(matches!(result, Err(RegistrationError::LengthMismatch { .. })));
}

// ============================================================================
// Exact interpolation and affine reproduction
// ============================================================================

#[test]
fn test_three_non_collinear_points_fit() {
    let source = vec![
        DVec2::new(0.0, 0.0),
        DVec2::new(100.0, 0.0),
        DVec2::new(50.0, 100.0),
    ];
    let target: Vec<DVec2> = source.iter().map(|&p| p + DVec2::new(3.0, 7.0)).collect();
    let tps = fit_exact(&source, &target);
    assert_eq!(tps.num_control_points(), 3);
    for (s, t) in source.iter().zip(&target) {
        assert_dvec2_near(tps.transform(*s), *t, 1e-9, "control point");
    }
}

#[test]
fn test_exact_interpolation_without_regularization() {
    let source = square_source_5();
    let target = vec![
        DVec2::new(5.0, 3.0),
        DVec2::new(102.0, 1.0),
        DVec2::new(2.0, 98.0),
        DVec2::new(105.0, 103.0),
        DVec2::new(52.0, 51.0),
    ];
    let tps = fit_exact(&source, &target);
    for r in tps.compute_residuals(&target) {
        assert!(r < 1e-8, "residual {r}");
    }
    assert!(tps.bending_energy() > 0.0);
}

#[test]
fn test_affine_map_is_reproduced_everywhere() {
    let source = square_source_5();
    let map = |p: DVec2| DVec2::new(1.1 * p.x - 0.2 * p.y + 4.0, 0.1 * p.x + 0.9 * p.y - 3.0);
    let target: Vec<DVec2> = source.iter().map(|&p| map(p)).collect();
    let tps = fit_exact(&source, &target);

    for p in [DVec2::new(25.0, 75.0), DVec2::new(-40.0, 130.0)] {
        assert_dvec2_near(tps.transform(p), map(p), 1e-6, "affine reproduction");
    }
    assert!(tps.bending_energy().abs() < 1e-9);
}

#[test]
fn test_control_points_are_returned_in_input_units() {
    let source = square_source_5();
    let tps = fit_exact(&source, &source);
    for (a, b) in tps.control_points().iter().zip(&source) {
        assert_dvec2_near(*a, *b, 1e-12, "control point");
    }
}

#[test]
fn test_fit_is_deterministic() {
    let source = square_source_5();
    let target: Vec<DVec2> = source
        .iter()
        .enumerate()
        .map(|(i, &p)| p + DVec2::new(i as f64, -(i as f64) * 0.5))
        .collect();
    let config = TpsConfig {
        regularization: 0.05,
    };
    let a = ThinPlateSpline::fit_points(&source, &target, &unit_weights(5), config).unwrap();
    let b = ThinPlateSpline::fit_points(&source, &target, &unit_weights(5), config).unwrap();
    assert_eq!(a, b);
}

// ============================================================================
// Weights and regularization
// ============================================================================

#[test]
fn test_heavier_point_is_followed_more_closely() {
    let source = square_source_5();
    let mut target = source.clone();
    // Only the centre moves; a smoothing fit cannot follow it exactly.
    target[4] += DVec2::new(10.0, 0.0);
    let config = TpsConfig {
        regularization: 1.0,
    };

    let light = ThinPlateSpline::fit_points(&source, &target, &unit_weights(5), config).unwrap();
    let heavy_weights = [1.0, 1.0, 1.0, 1.0, 100.0];
    let heavy = ThinPlateSpline::fit_points(&source, &target, &heavy_weights, config).unwrap();

    let light_err = light.transform(source[4]).distance(target[4]);
    let heavy_err = heavy.transform(source[4]).distance(target[4]);
    assert!(heavy_err < light_err, "heavy {heavy_err} vs light {light_err}");
}

#[test]
fn test_regularization_admits_duplicate_points() {
    let mut s = square_source_5();
    s.push(s[4]);
    let t = s.clone();
    let config = TpsConfig {
        regularization: 0.1,
    };
    let tps = ThinPlateSpline::fit_points(&s, &t, &unit_weights(6), config).unwrap();
    assert_dvec2_near(tps.transform(s[4]), s[4], 1e-6, "identity with duplicate");
}

// ============================================================================
// Registration scenarios
// ============================================================================

#[test]
fn test_concentric_circles_map_centroid() {
    let reference = circle(50, DVec2::ZERO, 10.0);
    let section = circle(50, DVec2::new(1.0, 1.0), 12.0);
    let config = RegistrationConfig::default();

    let set = match_outlines(&reference, &section, MatchStrategy::Positional).unwrap();
    let split = filter_outliers(&set, config.outlier_sigma).unwrap();
    assert!(split.removed.is_empty());

    let weights = split.kept.weights(config.boundary_weight, config.centroid_weight);
    let forward = ThinPlateSpline::fit(&split.kept, &weights, config.tps).unwrap();
    assert!(forward.transform(DVec2::ZERO).distance(DVec2::new(1.0, 1.0)) < 0.5);

    let backward = ThinPlateSpline::fit(&split.kept.swapped(), &weights, config.tps).unwrap();
    assert!(backward.transform(DVec2::new(1.0, 1.0)).length() < 0.5);
}

#[test]
fn test_point_transform_impl_matches_transform() {
    let source = square_source_5();
    let target: Vec<DVec2> = source.iter().map(|&p| p * 0.9 + DVec2::splat(2.0)).collect();
    let tps = fit_exact(&source, &target);
    let p = DVec2::new(33.0, 61.0);
    assert_eq!(PointTransform::apply(&tps, p), tps.transform(p));
    assert_eq!(tps.apply_all(&[p]), tps.transform_points(&[p]));
}
