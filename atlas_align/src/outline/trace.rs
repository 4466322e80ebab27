//! Ordered boundary walk over a binary outline image.
//!
//! Moore-neighbour tracing with Jacob's stopping criterion: the walk ends
//! when it re-enters the start pixel by the same move it first left it.

use glam::DVec2;

use common::BitBuffer2;

use crate::error::{RegistrationError, Result};
use crate::math::polygon;

/// Neighbour offsets in clockwise order as displayed (y down), starting west.
const NEIGHBOURS: [(i64, i64); 8] = [
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
];

/// A trace whose distinct-pixel share falls below this retraces itself
/// (an open arc walks both of its sides).
const MIN_DISTINCT_RATIO: f64 = 0.75;

/// Smallest enclosed area, in pixels², accepted as a closed loop.
const MIN_ENCLOSED_AREA: f64 = 0.5;

/// Pixel neighbourhood used for component counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Connectivity {
    Four,
    Eight,
}

impl Connectivity {
    fn offsets(self) -> &'static [(i64, i64)] {
        match self {
            Connectivity::Four => &[(1, 0), (0, 1), (-1, 0), (0, -1)],
            Connectivity::Eight => &NEIGHBOURS,
        }
    }
}

/// Count connected components of set pixels.
pub(crate) fn count_components(image: &BitBuffer2, connectivity: Connectivity) -> usize {
    let mut visited = BitBuffer2::new_default(image.width(), image.height());
    let mut stack = Vec::new();
    let mut components = 0;

    for (x, y) in image.iter_set() {
        if visited.get_xy(x, y) {
            continue;
        }
        components += 1;
        visited.set_xy(x, y, true);
        stack.push((x as i64, y as i64));

        while let Some((cx, cy)) = stack.pop() {
            for &(dx, dy) in connectivity.offsets() {
                let (nx, ny) = (cx + dx, cy + dy);
                if image.get_or_false(nx, ny) && !visited.get_xy(nx as usize, ny as usize) {
                    visited.set_xy(nx as usize, ny as usize, true);
                    stack.push((nx, ny));
                }
            }
        }
    }
    components
}

fn neighbour_index(dx: i64, dy: i64) -> usize {
    NEIGHBOURS
        .iter()
        .position(|&d| d == (dx, dy))
        .unwrap_or_else(|| unreachable!("({dx}, {dy}) is not a unit neighbour offset"))
}

/// Walk the boundary of the single component starting at its topmost-leftmost
/// pixel. Returns pixel coordinates in walk order, start not repeated.
pub(crate) fn moore_trace(image: &BitBuffer2) -> Vec<(i64, i64)> {
    let Some((sx, sy)) = image.iter_set().next() else {
        return Vec::new();
    };
    let start = (sx as i64, sy as i64);
    // Raster order guarantees the west neighbour of the start is background.
    let mut backtrack = 0usize;
    let mut current = start;
    let mut path = vec![start];
    let mut first_move: Option<(i64, i64)> = None;

    let max_steps = 4 * image.count_ones() + 16;
    for _ in 0..max_steps {
        let mut next = None;
        for i in 1..=8 {
            let k = (backtrack + i) % 8;
            let (dx, dy) = NEIGHBOURS[k];
            let candidate = (current.0 + dx, current.1 + dy);
            if image.get_or_false(candidate.0, candidate.1) {
                let (bx, by) = NEIGHBOURS[(k + 7) % 8];
                let back_pos = (current.0 + bx, current.1 + by);
                next = Some((candidate, back_pos));
                break;
            }
        }

        let Some((candidate, back_pos)) = next else {
            // Isolated pixel.
            break;
        };

        if current == start {
            match first_move {
                None => first_move = Some(candidate),
                Some(first) if first == candidate => break,
                Some(_) => {}
            }
        }

        backtrack = neighbour_index(back_pos.0 - candidate.0, back_pos.1 - candidate.1);
        current = candidate;
        if current != start {
            path.push(current);
        }
    }
    path
}

/// Trace `image` into an ordered closed ring of pixel centres.
///
/// Fails when the outline is empty, split into several pieces, or does not
/// enclose any area.
pub(crate) fn trace_closed_ring(image: &BitBuffer2) -> Result<Vec<DVec2>> {
    let pixel_count = image.count_ones();
    if pixel_count == 0 {
        return Err(RegistrationError::malformed_mask("outline is empty"));
    }

    let components = count_components(image, Connectivity::Eight);
    if components != 1 {
        return Err(RegistrationError::malformed_mask(format!(
            "outline has {components} disconnected pieces, expected one closed loop"
        )));
    }

    let path = moore_trace(image);
    let ring: Vec<DVec2> = path
        .iter()
        .map(|&(x, y)| DVec2::new(x as f64, y as f64))
        .collect();

    let distinct = {
        let mut seen = BitBuffer2::new_default(image.width(), image.height());
        path.iter()
            .filter(|&&(x, y)| {
                let fresh = !seen.get_xy(x as usize, y as usize);
                seen.set_xy(x as usize, y as usize, true);
                fresh
            })
            .count()
    };
    let distinct_ratio = distinct as f64 / path.len() as f64;
    let area = polygon::signed_area(&ring).abs();

    if distinct_ratio < MIN_DISTINCT_RATIO || area < MIN_ENCLOSED_AREA {
        let touches_border = image.iter_set().any(|(x, y)| {
            x == 0 || y == 0 || x + 1 == image.width() || y + 1 == image.height()
        });
        let reason = if touches_border {
            "outline is open where it touches the image border"
        } else {
            "outline is not a closed loop"
        };
        return Err(RegistrationError::malformed_mask(format!(
            "{reason} (enclosed area {area:.1} px², {distinct} distinct of {} traced pixels)",
            path.len()
        )));
    }

    Ok(ring)
}
