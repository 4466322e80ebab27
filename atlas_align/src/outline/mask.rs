//! From grayscale image to binary outline.

use common::{BitBuffer2, Buffer2};

/// Produces a binary foreground mask from a grayscale image.
///
/// Real pipelines smooth, threshold, fill holes and isolate the largest blob;
/// the registration core only needs the resulting mask.
pub trait MaskGenerator {
    fn generate(&self, image: &Buffer2<f32>) -> BitBuffer2;
}

/// Foreground is every pixel strictly brighter than `threshold`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdMask {
    pub threshold: f32,
}

impl ThresholdMask {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }
}

impl MaskGenerator for ThresholdMask {
    fn generate(&self, image: &Buffer2<f32>) -> BitBuffer2 {
        BitBuffer2::from_fn(image.width(), image.height(), |x, y| {
            image[(x, y)] > self.threshold
        })
    }
}

/// Morphological outline of a foreground mask: every set pixel that has a
/// background pixel among its 8 neighbours. Pixels outside the image count
/// as background, so a mask touching the border keeps its edge pixels.
pub fn outline_from_mask(mask: &BitBuffer2) -> BitBuffer2 {
    let mut outline = BitBuffer2::new_default(mask.width(), mask.height());
    for (x, y) in mask.iter_set() {
        let (xi, yi) = (x as i64, y as i64);
        let on_edge = (-1..=1)
            .flat_map(|dy| (-1..=1).map(move |dx| (dx, dy)))
            .any(|(dx, dy)| !mask.get_or_false(xi + dx, yi + dy));
        if on_edge {
            outline.set_xy(x, y, true);
        }
    }
    outline
}
