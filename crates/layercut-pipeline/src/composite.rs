//! Composite preview: the inverted average of every layer mask.
//!
//! Each output pixel is `255 - round(mean)` where `mean` is the red
//! channel averaged across all masks at that position, rounding halves
//! up. The result is written to R, G, and B with opaque alpha.
//!
//! The compositor never thresholds on its own; it only combines masks a
//! run has already produced.

use crate::types::{Dimensions, PipelineError, RgbaImage};

/// Combine `masks` into one grayscale preview.
///
/// # Errors
///
/// Returns [`PipelineError::NoLayers`] if `masks` is empty and
/// [`PipelineError::DimensionMismatch`] if the masks differ in size.
pub fn composite<'a, I>(masks: I) -> Result<RgbaImage, PipelineError>
where
    I: IntoIterator<Item = &'a RgbaImage>,
{
    let mut masks = masks.into_iter();
    let first = masks.next().ok_or(PipelineError::NoLayers)?;
    let expected = Dimensions::of(first);

    let mut sums: Vec<u64> = first.pixels().map(|p| u64::from(p.0[0])).collect();
    let mut count: u64 = 1;

    for mask in masks {
        let actual = Dimensions::of(mask);
        if actual != expected {
            return Err(PipelineError::DimensionMismatch { expected, actual });
        }
        for (sum, p) in sums.iter_mut().zip(mask.pixels()) {
            *sum += u64::from(p.0[0]);
        }
        count += 1;
    }

    let width = expected.width as usize;
    Ok(RgbaImage::from_fn(expected.width, expected.height, |x, y| {
        let sum = sums[y as usize * width + x as usize];
        let v = 255 - rounded_mean(sum, count);
        image::Rgba([v, v, v, 255])
    }))
}

/// `round(sum / count)` with halves rounded up, in integer arithmetic.
fn rounded_mean(sum: u64, count: u64) -> u8 {
    let mean = (2 * sum + count) / (2 * count);
    u8::try_from(mean).unwrap_or(u8::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn uniform(w: u32, h: u32, v: u8) -> RgbaImage {
        RgbaImage::from_pixel(w, h, image::Rgba([v, v, v, 255]))
    }

    #[test]
    fn empty_input_is_an_error() {
        let masks: Vec<RgbaImage> = Vec::new();
        assert!(matches!(composite(&masks), Err(PipelineError::NoLayers)));
    }

    #[test]
    fn single_mask_composite_is_its_complement() {
        let mask = RgbaImage::from_fn(2, 2, |x, _| {
            let v = if x == 0 { 255 } else { 0 };
            image::Rgba([v, v, v, 255])
        });
        let out = composite([&mask]).unwrap();
        for (a, b) in mask.pixels().zip(out.pixels()) {
            assert_eq!(b.0[0], 255 - a.0[0]);
            assert_eq!(b.0[3], 255);
        }
    }

    #[test]
    fn half_mean_rounds_up_before_inverting() {
        // Mean of 255 and 0 is 127.5 -> 128 -> 127.
        let out = composite([&uniform(3, 3, 255), &uniform(3, 3, 0)]).unwrap();
        assert!(out.pixels().all(|p| p.0 == [127, 127, 127, 255]));
    }

    #[test]
    fn three_masks_average() {
        // (255 + 255 + 0) / 3 = 170 -> 85.
        let masks = [uniform(1, 1, 255), uniform(1, 1, 255), uniform(1, 1, 0)];
        let out = composite(&masks).unwrap();
        assert_eq!(out.get_pixel(0, 0).0, [85, 85, 85, 255]);
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let result = composite([&uniform(4, 4, 0), &uniform(4, 5, 0)]);
        assert!(matches!(
            result,
            Err(PipelineError::DimensionMismatch { expected, actual })
                if expected == Dimensions::new(4, 4) && actual == Dimensions::new(4, 5)
        ));
    }

    #[test]
    fn recomputation_is_bit_identical() {
        let a = RgbaImage::from_fn(9, 7, |x, y| {
            let v = if (x + y) % 3 == 0 { 255 } else { 0 };
            image::Rgba([v, v, v, 255])
        });
        let b = RgbaImage::from_fn(9, 7, |x, _| {
            let v = if x < 4 { 255 } else { 0 };
            image::Rgba([v, v, v, 255])
        });
        let first = composite([&a, &b]).unwrap();
        let second = composite([&a, &b]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rounded_mean_matches_float_rounding() {
        for count in 1..=4u64 {
            for sum in 0..=(255 * count) {
                #[allow(
                    clippy::cast_precision_loss,
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss
                )]
                let float = (sum as f64 / count as f64).round() as u8;
                assert_eq!(rounded_mean(sum, count), float, "sum {sum} count {count}");
            }
        }
    }
}
