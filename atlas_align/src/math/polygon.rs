//! Closed-polygon geometry on `DVec2` vertex rings.

use glam::DVec2;

/// Shoelace signed area of a closed ring.
///
/// Positive when the ring turns counter-clockwise in a y-up frame, which is
/// clockwise as displayed in image coordinates (y down).
pub fn signed_area(points: &[DVec2]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for (i, &p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        twice_area += p.perp_dot(q);
    }
    twice_area * 0.5
}

/// Total edge length of a closed ring, including the closing edge.
pub fn perimeter(points: &[DVec2]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.distance(*b))
        .sum()
}

/// Arithmetic mean of the vertices. Zero for an empty ring.
pub fn vertex_mean(points: &[DVec2]) -> DVec2 {
    if points.is_empty() {
        return DVec2::ZERO;
    }
    points.iter().copied().sum::<DVec2>() / points.len() as f64
}

/// Resample a closed ring to `count` points evenly spaced by arc length,
/// starting at `points[0]`.
pub fn resample_closed(points: &[DVec2], count: usize) -> Vec<DVec2> {
    if points.is_empty() || count == 0 {
        return Vec::new();
    }
    let total = perimeter(points);
    if points.len() == 1 || total <= f64::EPSILON {
        return vec![points[0]; count];
    }

    let step = total / count as f64;
    let mut out = Vec::with_capacity(count);
    let mut edge = 0;
    let mut edge_start = 0.0;
    let n = points.len();

    for k in 0..count {
        let target = k as f64 * step;
        loop {
            let a = points[edge % n];
            let b = points[(edge + 1) % n];
            let len = a.distance(b);
            if target <= edge_start + len || edge + 1 >= n {
                let t = if len > 0.0 {
                    ((target - edge_start) / len).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                out.push(a.lerp(b, t));
                break;
            }
            edge_start += len;
            edge += 1;
        }
    }
    out
}
