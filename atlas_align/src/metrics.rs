//! Image similarity between a warped reference and its section.

use common::Buffer2;

use crate::error::{RegistrationError, Result};
use crate::math::statistics;

/// Rescale pixel values to [0, 1] by the image's own min and max.
///
/// A constant image (or one with no finite-range values) becomes all zeros.
pub fn normalize_min_max(image: &Buffer2<f32>) -> Buffer2<f32> {
    match statistics::min_max_f32(image.pixels()) {
        Some((lo, hi)) if hi > lo => {
            let inv_range = 1.0 / (hi - lo);
            image.map(|&v| (v - lo) * inv_range)
        }
        _ => image.map(|_| 0.0),
    }
}

/// Normalized sum of squared differences: mean squared difference of the
/// min-max normalized images. 0 for identical images, at most 1.
///
/// Pixel pairs where either image is NaN are left out of the mean; with no
/// comparable pair left the result is 0.
pub fn nssd(a: &Buffer2<f32>, b: &Buffer2<f32>) -> Result<f64> {
    if !a.same_size(b) {
        return Err(RegistrationError::DimensionMismatch {
            a_width: a.width(),
            a_height: a.height(),
            b_width: b.width(),
            b_height: b.height(),
        });
    }
    if a.is_empty() {
        return Ok(0.0);
    }

    let na = normalize_min_max(a);
    let nb = normalize_min_max(b);
    let (sum_sq, count) = na
        .pixels()
        .iter()
        .zip(nb.pixels())
        .filter(|(x, y)| !x.is_nan() && !y.is_nan())
        .fold((0.0f64, 0usize), |(sum, n), (&x, &y)| {
            let d = f64::from(x) - f64::from(y);
            (sum + d * d, n + 1)
        });
    if count == 0 {
        return Ok(0.0);
    }
    Ok(sum_sq / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(width: usize, height: usize) -> Buffer2<f32> {
        Buffer2::from_fn(width, height, |x, y| (x + 3 * y) as f32)
    }

    #[test]
    fn test_nssd_of_image_with_itself_is_zero() {
        let image = ramp(8, 6);
        assert_eq!(nssd(&image, &image).unwrap(), 0.0);
    }

    #[test]
    fn test_nssd_ignores_affine_intensity_change() {
        let image = ramp(8, 6);
        let brighter = image.map(|&v| 3.5 * v + 20.0);
        assert!(nssd(&image, &brighter).unwrap() < 1e-10);
    }

    #[test]
    fn test_nssd_of_inverted_images() {
        let a = Buffer2::new(2, 1, vec![0.0, 1.0]);
        let b = Buffer2::new(2, 1, vec![1.0, 0.0]);
        assert!((nssd(&a, &b).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_image_normalizes_to_zero() {
        let flat = Buffer2::new_filled(3, 3, 42.0);
        assert!(normalize_min_max(&flat).pixels().iter().all(|&v| v == 0.0));

        // Against a ramp, only the ramp's normalized values contribute.
        let a = Buffer2::new(2, 1, vec![5.0, 5.0]);
        let b = Buffer2::new(2, 1, vec![0.0, 2.0]);
        assert!((nssd(&a, &b).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_nan_pixels_are_skipped() {
        let a = Buffer2::new(3, 1, vec![0.0, f32::NAN, 1.0]);
        let b = Buffer2::new(3, 1, vec![1.0, 0.5, 1.0]);
        // b normalizes to [1, 0, 1]; only pixels 0 and 2 are compared.
        let score = nssd(&a, &b).unwrap();
        assert!((score - 0.5).abs() < 1e-12, "{score}");

        let all_nan = Buffer2::new_filled(2, 2, f32::NAN);
        assert_eq!(nssd(&all_nan, &all_nan).unwrap(), 0.0);
    }

    #[test]
    fn test_size_mismatch() {
        let err = nssd(&ramp(4, 4), &ramp(4, 5)).unwrap_err();
        assert!(matches!(
            err,
            RegistrationError::DimensionMismatch {
                a_height: 4,
                b_height: 5,
                ..
            }
        ));
    }
}
