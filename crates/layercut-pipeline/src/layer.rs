//! Binary mask generation, one mask per threshold point.
//!
//! A pixel is cut (255, paper-white) when its luminance is at or below
//! the threshold and kept (0, printable black) otherwise. White marks
//! the excised shape on the printed page.

use crate::luminance::LuminancePlane;
use crate::types::RgbaImage;

/// Mask value for pixels to cut.
pub const CUT: u8 = 255;

/// Mask value for pixels to keep.
pub const KEEP: u8 = 0;

/// Threshold `plane` at `threshold`.
///
/// Comparison uses the unrounded luminance, so a pixel at 100.0001 is
/// not cut at threshold 100.
#[must_use = "returns the binary mask"]
pub fn threshold_mask(plane: &LuminancePlane, threshold: u8) -> RgbaImage {
    let dims = plane.dimensions();
    let limit = f64::from(threshold);
    let values = plane.values();
    let width = dims.width as usize;
    RgbaImage::from_fn(dims.width, dims.height, |x, y| {
        let lum = values[y as usize * width + x as usize];
        let v = if lum <= limit { CUT } else { KEEP };
        image::Rgba([v, v, v, 255])
    })
}

/// Number of cut pixels in a mask (red channel at [`CUT`]).
#[must_use]
pub fn count_cut_pixels(mask: &RgbaImage) -> u64 {
    mask.pixels().map(|p| u64::from(p.0[0] == CUT)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::luminance::luminance;

    fn plane_from(pixels: &[[u8; 3]], w: u32) -> LuminancePlane {
        #[allow(clippy::cast_possible_truncation)]
        let h = pixels.len() as u32 / w;
        let img = RgbaImage::from_fn(w, h, |x, y| {
            let [r, g, b] = pixels[(y * w + x) as usize];
            image::Rgba([r, g, b, 255])
        });
        LuminancePlane::from_rgba(&img)
    }

    #[test]
    fn dark_pixels_are_cut() {
        let plane = plane_from(&[[10, 10, 10], [10, 10, 10], [200, 200, 200], [200, 200, 200]], 2);
        let mask = threshold_mask(&plane, 100);
        assert_eq!(mask.get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert_eq!(mask.get_pixel(1, 0).0, [255, 255, 255, 255]);
        assert_eq!(mask.get_pixel(0, 1).0, [0, 0, 0, 255]);
        assert_eq!(mask.get_pixel(1, 1).0, [0, 0, 0, 255]);
    }

    #[test]
    fn mask_values_are_binary_and_opaque() {
        let pixels: Vec<[u8; 3]> = (0..=255u8).map(|v| [v, 255 - v, v / 3]).collect();
        let plane = plane_from(&pixels, 16);
        for t in [0, 1, 64, 127, 128, 200, 255] {
            let mask = threshold_mask(&plane, t);
            for p in mask.pixels() {
                assert!(p.0[0] == CUT || p.0[0] == KEEP);
                assert_eq!(p.0[0], p.0[1]);
                assert_eq!(p.0[1], p.0[2]);
                assert_eq!(p.0[3], 255);
            }
        }
    }

    #[test]
    fn comparison_is_inclusive_and_unrounded() {
        let pixels = [[0, 100, 0], [0, 101, 0]];
        let plane = plane_from(&pixels, 2);
        // Green 100 -> 71.52, green 101 -> 72.2352.
        let at = threshold_mask(&plane, 72);
        assert_eq!(at.get_pixel(0, 0).0[0], CUT);
        assert_eq!(at.get_pixel(1, 0).0[0], KEEP);
        assert!(luminance(0, 101, 0) > 72.0);
    }

    #[test]
    fn grays_on_an_integer_threshold() {
        // Gray 29 sums to exactly 29.0, gray 9 to just above 9.0.
        let plane = plane_from(&[[29, 29, 29], [9, 9, 9]], 2);
        assert_eq!(threshold_mask(&plane, 29).get_pixel(0, 0).0[0], CUT);
        assert_eq!(threshold_mask(&plane, 9).get_pixel(1, 0).0[0], KEEP);
    }

    #[test]
    fn higher_threshold_cuts_superset() {
        let pixels: Vec<[u8; 3]> = (0..64u8).map(|v| [v * 4, v * 3, v * 2]).collect();
        let plane = plane_from(&pixels, 8);
        let low = threshold_mask(&plane, 60);
        let high = threshold_mask(&plane, 160);
        for (a, b) in low.pixels().zip(high.pixels()) {
            assert!(a.0[0] <= b.0[0]);
        }
        assert!(count_cut_pixels(&high) > count_cut_pixels(&low));
    }

    #[test]
    fn count_cut_pixels_counts_white() {
        let plane = plane_from(&[[0, 0, 0], [255, 255, 255], [0, 0, 0]], 3);
        assert_eq!(count_cut_pixels(&threshold_mask(&plane, 128)), 2);
    }
}
