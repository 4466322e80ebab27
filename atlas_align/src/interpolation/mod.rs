//! Image resampling through an arbitrary point transform.
//!
//! Output pixel `p` receives `input(transform(p))`, so the transform passed
//! in maps output coordinates to input coordinates. To bring the reference
//! image into section space, pass the section→reference (backward) spline.
//!
//! # Interpolation Methods
//!
//! - **Bilinear**: default. Linear interpolation in both dimensions.
//! - **Bicubic**: Catmull-Rom cubic, sharper but may overshoot at edges.
//! - **Nearest**: no interpolation. For masks and label images.

use glam::DVec2;
use rayon::prelude::*;

use common::Buffer2;

use crate::config::{InterpolationMethod, WarpConfig};
use crate::transform::PointTransform;


/// Number of rows to process per parallel chunk.
const ROWS_PER_CHUNK: usize = 32;

/// Bicubic kernel value (Catmull-Rom spline, a = -0.5).
///
/// ```text
/// W(x) = (a+2)|x|³ - (a+3)|x|² + 1        for |x| <= 1
/// W(x) = a|x|³ - 5a|x|² + 8a|x| - 4a      for 1 < |x| < 2
/// W(x) = 0                                otherwise
/// ```
#[inline]
pub(crate) fn bicubic_kernel(x: f32) -> f32 {
    const A: f32 = -0.5;

    let abs_x = x.abs();
    if abs_x <= 1.0 {
        ((A + 2.0) * abs_x - (A + 3.0)) * abs_x * abs_x + 1.0
    } else if abs_x < 2.0 {
        ((A * abs_x - 5.0 * A) * abs_x + 8.0 * A) * abs_x - 4.0 * A
    } else {
        0.0
    }
}

#[inline]
fn sample_pixel(data: &Buffer2<f32>, x: i64, y: i64, border: f32) -> f32 {
    data.get_checked(x, y).copied().unwrap_or(border)
}

#[inline]
fn interpolate_nearest(data: &Buffer2<f32>, x: f32, y: f32, border: f32) -> f32 {
    sample_pixel(data, x.round() as i64, y.round() as i64, border)
}

#[inline]
fn interpolate_bilinear(data: &Buffer2<f32>, x: f32, y: f32, border: f32) -> f32 {
    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = sample_pixel(data, x0, y0, border);
    let p10 = sample_pixel(data, x0 + 1, y0, border);
    let p01 = sample_pixel(data, x0, y0 + 1, border);
    let p11 = sample_pixel(data, x0 + 1, y0 + 1, border);

    let top = p00 + fx * (p10 - p00);
    let bottom = p01 + fx * (p11 - p01);
    top + fy * (bottom - top)
}

fn interpolate_bicubic(data: &Buffer2<f32>, x: f32, y: f32, border: f32) -> f32 {
    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let weights = |f: f32| {
        [
            bicubic_kernel(f + 1.0),
            bicubic_kernel(f),
            bicubic_kernel(f - 1.0),
            bicubic_kernel(f - 2.0),
        ]
    };
    let wx = weights(fx);
    let wy = weights(fy);

    let mut sum = 0.0;
    for (j, &wyj) in wy.iter().enumerate() {
        let py = y0 - 1 + j as i64;
        for (i, &wxi) in wx.iter().enumerate() {
            let px = x0 - 1 + i as i64;
            sum += sample_pixel(data, px, py, border) * wxi * wyj;
        }
    }
    sum
}

/// Interpolate `data` at sub-pixel position `p`.
///
/// Positions whose interpolation support leaves the image blend in
/// `border`. Non-finite positions, and positions farther than the kernel
/// radius outside the image, return `border`.
#[inline]
pub fn interpolate_pixel(
    data: &Buffer2<f32>,
    p: DVec2,
    method: InterpolationMethod,
    border: f32,
) -> f32 {
    if !p.is_finite() {
        return border;
    }
    // Every tap lies outside past this distance.
    let radius = method.kernel_radius() as f64;
    if p.x < -radius
        || p.y < -radius
        || p.x > data.width() as f64 + radius
        || p.y > data.height() as f64 + radius
    {
        return border;
    }
    let (x, y) = (p.x as f32, p.y as f32);
    match method {
        InterpolationMethod::Nearest => interpolate_nearest(data, x, y, border),
        InterpolationMethod::Bilinear => interpolate_bilinear(data, x, y, border),
        InterpolationMethod::Bicubic => interpolate_bicubic(data, x, y, border),
    }
}

/// Resample `input` into `output` through `transform`.
///
/// `output` may have any size; each of its pixels is pulled from
/// `input(transform(x, y))`. Rows are processed in parallel.
pub fn warp_image_into(
    input: &Buffer2<f32>,
    output: &mut Buffer2<f32>,
    transform: &(impl PointTransform + Sync),
    config: &WarpConfig,
) {
    let width = output.width();
    if width == 0 {
        return;
    }
    let method = config.method;
    let border = config.border_value;

    output
        .pixels_mut()
        .par_chunks_mut(width * ROWS_PER_CHUNK)
        .enumerate()
        .for_each(|(chunk_idx, chunk): (usize, &mut [f32])| {
            let start_y = chunk_idx * ROWS_PER_CHUNK;
            for (row_in_chunk, row) in chunk.chunks_exact_mut(width).enumerate() {
                let y = (start_y + row_in_chunk) as f64;
                for (x, out) in row.iter_mut().enumerate() {
                    let src = transform.apply(DVec2::new(x as f64, y));
                    *out = interpolate_pixel(input, src, method, border);
                }
            }
        });
}

/// Resample `input` through `transform` into an image of the same size.
pub fn warp_image(
    input: &Buffer2<f32>,
    transform: &(impl PointTransform + Sync),
    config: &WarpConfig,
) -> Buffer2<f32> {
    let mut output = Buffer2::new_filled(input.width(), input.height(), config.border_value);
    warp_image_into(input, &mut output, transform, config);
    output
}
