//! RGB-to-luminance conversion.
//!
//! Uses the ITU-R BT.709 coefficients
//! `0.2126*R + 0.7152*G + 0.0722*B`. Values stay unrounded `f64` so
//! threshold comparisons see the exact weighted sum; alpha is ignored.

use crate::types::{Dimensions, RgbaImage};

/// BT.709 red weight.
pub const RED_WEIGHT: f64 = 0.2126;
/// BT.709 green weight.
pub const GREEN_WEIGHT: f64 = 0.7152;
/// BT.709 blue weight.
pub const BLUE_WEIGHT: f64 = 0.0722;

/// Luminance of one RGB sample.
///
/// Evaluated as three rounded products summed left to right, never
/// fused: gray 29 must sum to exactly 29.0.
#[must_use]
#[inline]
#[allow(clippy::suboptimal_flops)]
pub fn luminance(r: u8, g: u8, b: u8) -> f64 {
    RED_WEIGHT * f64::from(r) + GREEN_WEIGHT * f64::from(g) + BLUE_WEIGHT * f64::from(b)
}

/// Row-major luminance values for a whole image.
///
/// Computed once per run after preprocessing, then shared by every
/// layer so each mask is a single comparison per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct LuminancePlane {
    dimensions: Dimensions,
    values: Vec<f64>,
}

impl LuminancePlane {
    /// Convert every pixel of `image`.
    #[must_use = "returns the luminance plane"]
    pub fn from_rgba(image: &RgbaImage) -> Self {
        let values = image
            .pixels()
            .map(|p| luminance(p.0[0], p.0[1], p.0[2]))
            .collect();
        Self {
            dimensions: Dimensions::of(image),
            values,
        }
    }

    /// Plane dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Row-major values.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Luminance at `(x, y)`, or `None` outside the plane.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<f64> {
        if x >= self.dimensions.width || y >= self.dimensions.height {
            return None;
        }
        let index = y as usize * self.dimensions.width as usize + x as usize;
        self.values.get(index).copied()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn black_and_white_extremes() {
        assert!(luminance(0, 0, 0).abs() < 1e-9);
        assert!((luminance(255, 255, 255) - 255.0).abs() < 1e-9);
    }

    #[test]
    fn weights_follow_bt709() {
        assert!((luminance(255, 0, 0) - 54.213).abs() < 1e-9);
        assert!((luminance(0, 255, 0) - 182.376).abs() < 1e-9);
        assert!((luminance(0, 0, 255) - 18.411).abs() < 1e-9);
    }

    #[test]
    fn green_dominates_red_dominates_blue() {
        let r = luminance(255, 0, 0);
        let g = luminance(0, 255, 0);
        let b = luminance(0, 0, 255);
        assert!(g > r && r > b, "expected G > R > B, got R={r} G={g} B={b}");
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn weighted_sum_is_evaluated_left_to_right() {
        for v in 0..=255u8 {
            let x = f64::from(v);
            let plain = 0.2126 * x + 0.7152 * x + 0.0722 * x;
            assert_eq!(luminance(v, v, v), plain, "gray {v}");
        }
        for (r, g, b) in [(12, 200, 7), (255, 1, 254), (33, 99, 180)] {
            let plain = 0.2126 * f64::from(r) + 0.7152 * f64::from(g) + 0.0722 * f64::from(b);
            assert_eq!(luminance(r, g, b), plain, "rgb ({r}, {g}, {b})");
        }
    }

    #[test]
    fn values_are_not_rounded() {
        let l = luminance(1, 0, 0);
        assert!((l - 0.2126).abs() < 1e-12);
    }

    #[test]
    fn plane_matches_per_pixel_conversion() {
        let img = RgbaImage::from_fn(3, 2, |x, y| {
            #[allow(clippy::cast_possible_truncation)]
            let v = (x * 60 + y * 30) as u8;
            image::Rgba([v, v / 2, 255 - v, 7])
        });
        let plane = LuminancePlane::from_rgba(&img);
        assert_eq!(plane.dimensions(), Dimensions::new(3, 2));
        assert_eq!(plane.values().len(), 6);
        for (x, y, p) in img.enumerate_pixels() {
            let expected = luminance(p.0[0], p.0[1], p.0[2]);
            assert!((plane.get(x, y).unwrap() - expected).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn alpha_is_ignored() {
        let opaque = RgbaImage::from_pixel(1, 1, image::Rgba([90, 120, 30, 255]));
        let clear = RgbaImage::from_pixel(1, 1, image::Rgba([90, 120, 30, 0]));
        assert_eq!(
            LuminancePlane::from_rgba(&opaque),
            LuminancePlane::from_rgba(&clear),
        );
    }

    #[test]
    fn get_outside_plane_is_none() {
        let plane = LuminancePlane::from_rgba(&RgbaImage::new(2, 2));
        assert!(plane.get(2, 0).is_none());
        assert!(plane.get(0, 2).is_none());
    }
}
