//! Descriptive statistics over `f64` samples.

/// Arithmetic mean. Returns `None` for an empty slice.
#[inline]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator) around `mean`.
///
/// A single sample has no spread, so it yields 0.
#[inline]
pub fn sample_std_dev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let sum_sq: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

/// Min and max of an `f32` slice, ignoring NaN. `None` when nothing finite remains.
pub fn min_max_f32(values: &[f32]) -> Option<(f32, f32)> {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_known_values() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[4.0]), Some(4.0));
        assert_eq!(mean(&[1.0, 2.0, 3.0, 6.0]), Some(3.0));
    }

    #[test]
    fn test_sample_std_dev_uses_bessel_correction() {
        // values 2,4,4,4,5,5,7,9: mean 5, sum of squares 32
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let sd = sample_std_dev(&values, 5.0);
        assert!((sd - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_sample_std_dev_single_value_is_zero() {
        assert_eq!(sample_std_dev(&[3.5], 3.5), 0.0);
    }

    #[test]
    fn test_min_max_skips_nan() {
        assert_eq!(min_max_f32(&[3.0, f32::NAN, -1.0, 2.0]), Some((-1.0, 3.0)));
        assert_eq!(min_max_f32(&[f32::NAN]), None);
        assert_eq!(min_max_f32(&[]), None);
    }
}
