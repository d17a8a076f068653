//! Resize the source image to the working resolution.
//!
//! The source is first scaled by the configured factor, then, if either
//! axis still exceeds the working-resolution cap, scaled down uniformly
//! to fit. Both results are floor-rounded and never drop below one
//! pixel.
//!
//! Segmenting at reduced resolution keeps single-pixel sensor noise
//! from turning into stencil artifacts and bounds the cost of every
//! later stage.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Dimensions, RgbaImage};

/// Slack added before flooring so products like `0.7 * 30` land on 21.
const FLOOR_EPSILON: f64 = 1e-9;

/// Resampling filter used when resizing.
///
/// Ordered from fastest/lowest-quality to slowest/highest-quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResampleFilter {
    /// Nearest-neighbor: fastest, blocky artifacts.
    Nearest,
    /// Bilinear interpolation: fast, decent quality.
    #[default]
    Triangle,
    /// Bicubic (Catmull-Rom): moderate speed, good quality.
    CatmullRom,
    /// Gaussian: moderate speed, smooth output.
    Gaussian,
    /// Lanczos with 3 lobes: slowest, sharpest/best for photos.
    Lanczos3,
}

impl ResampleFilter {
    /// Convert to the `image` crate's `FilterType`.
    const fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            Self::Nearest => image::imageops::FilterType::Nearest,
            Self::Triangle => image::imageops::FilterType::Triangle,
            Self::CatmullRom => image::imageops::FilterType::CatmullRom,
            Self::Gaussian => image::imageops::FilterType::Gaussian,
            Self::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

impl fmt::Display for ResampleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nearest => f.write_str("Nearest"),
            Self::Triangle => f.write_str("Triangle"),
            Self::CatmullRom => f.write_str("CatmullRom"),
            Self::Gaussian => f.write_str("Gaussian"),
            Self::Lanczos3 => f.write_str("Lanczos3"),
        }
    }
}

/// Working dimensions for a source of size `source`.
///
/// Applies `scale`, then fits the result inside a
/// `max_dimension`×`max_dimension` box preserving aspect ratio.
/// `scale` must be positive and finite and `max_dimension` non-zero;
/// [`PipelineConfig::validate`](crate::PipelineConfig::validate)
/// guarantees both before a run reaches this point.
#[must_use]
pub fn working_dimensions(source: Dimensions, scale: f64, max_dimension: u32) -> Dimensions {
    let scaled_w = scale_axis(source.width, scale);
    let scaled_h = scale_axis(source.height, scale);

    if scaled_w <= max_dimension && scaled_h <= max_dimension {
        return Dimensions::new(scaled_w, scaled_h);
    }

    // The longer axis lands exactly on the cap; the other is floored
    // with integer arithmetic so the ratio carries no float error.
    let cap = u64::from(max_dimension);
    if scaled_w >= scaled_h {
        let h = u64::from(scaled_h) * cap / u64::from(scaled_w);
        Dimensions::new(max_dimension, narrow(h))
    } else {
        let w = u64::from(scaled_w) * cap / u64::from(scaled_h);
        Dimensions::new(narrow(w), max_dimension)
    }
}

/// Scale one axis, flooring and clamping to at least one pixel.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn scale_axis(length: u32, scale: f64) -> u32 {
    let scaled = (f64::from(length) * scale + FLOOR_EPSILON).floor();
    if scaled >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        (scaled as u32).max(1)
    }
}

/// Narrow a floored axis length back to `u32`, never below one pixel.
fn narrow(length: u64) -> u32 {
    u32::try_from(length).unwrap_or(u32::MAX).max(1)
}

/// Resize `image` to its working resolution.
///
/// Returns the (possibly unchanged) image and whether resampling was
/// actually applied. An image whose working size equals its source
/// size is cloned without resampling.
#[must_use]
pub fn resize(
    image: &RgbaImage,
    scale: f64,
    max_dimension: u32,
    filter: ResampleFilter,
) -> (RgbaImage, bool) {
    let source = Dimensions::of(image);
    let target = working_dimensions(source, scale, max_dimension);

    if target == source {
        return (image.clone(), false);
    }

    let resized = image::imageops::resize(
        image,
        target.width,
        target.height,
        filter.to_image_filter(),
    );
    (resized, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_image(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, image::Rgba([128, 128, 128, 255]))
    }

    #[test]
    fn default_filter_is_triangle() {
        assert_eq!(ResampleFilter::default(), ResampleFilter::Triangle);
    }

    #[test]
    fn scale_is_floor_rounded() {
        let dims = working_dimensions(Dimensions::new(101, 33), 0.5, 1500);
        assert_eq!(dims, Dimensions::new(50, 16));
    }

    #[test]
    fn scale_absorbs_float_error() {
        // 0.7 * 30 is 20.999999999999996 in f64.
        let dims = working_dimensions(Dimensions::new(30, 30), 0.7, 1500);
        assert_eq!(dims, Dimensions::new(21, 21));
    }

    #[test]
    fn unit_scale_below_cap_keeps_size() {
        let dims = working_dimensions(Dimensions::new(640, 480), 1.0, 1500);
        assert_eq!(dims, Dimensions::new(640, 480));
    }

    #[test]
    fn cap_applies_after_scaling_landscape() {
        // 4000x3000 * 0.7 = 2800x2100, then fit into 1500: 1500x1125.
        let dims = working_dimensions(Dimensions::new(4000, 3000), 0.7, 1500);
        assert_eq!(dims, Dimensions::new(1500, 1125));
    }

    #[test]
    fn cap_applies_after_scaling_portrait() {
        let dims = working_dimensions(Dimensions::new(1000, 4000), 1.0, 1500);
        assert_eq!(dims, Dimensions::new(375, 1500));
    }

    #[test]
    fn cap_is_not_applied_when_scale_already_fits() {
        let dims = working_dimensions(Dimensions::new(2000, 1000), 0.5, 1500);
        assert_eq!(dims, Dimensions::new(1000, 500));
    }

    #[test]
    fn tiny_results_clamp_to_one_pixel() {
        let dims = working_dimensions(Dimensions::new(1, 3), 0.5, 1500);
        assert_eq!(dims, Dimensions::new(1, 1));

        let dims = working_dimensions(Dimensions::new(10_000, 2), 1.0, 1500);
        assert_eq!(dims, Dimensions::new(1500, 1));
    }

    #[test]
    fn resize_identity_skips_resampling() {
        let img = test_image(20, 10);
        let (result, applied) = resize(&img, 1.0, 1500, ResampleFilter::Triangle);
        assert!(!applied);
        assert_eq!(result, img);
    }

    #[test]
    fn resize_scales_image() {
        let img = test_image(100, 80);
        let (result, applied) = resize(&img, 0.5, 1500, ResampleFilter::Triangle);
        assert!(applied);
        assert_eq!(result.width(), 50);
        assert_eq!(result.height(), 40);
    }

    #[test]
    fn resize_preserves_uniform_color() {
        let img = test_image(64, 64);
        let (result, _) = resize(&img, 0.7, 1500, ResampleFilter::Lanczos3);
        for p in result.pixels() {
            let diff = i16::from(p.0[0]) - 128;
            assert!(diff.abs() <= 1, "expected ~128, got {}", p.0[0]);
        }
    }
}
