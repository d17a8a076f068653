//! Posterized band preview.
//!
//! Maps every pixel to the upper bound of the band its luminance falls
//! in, except the darkest band, which maps to 0. With points
//! `[85, 170]` the output holds only 0, 170, and 255. This shows all
//! bands in one image without producing per-layer masks.

use crate::luminance::LuminancePlane;
use crate::threshold::Thresholds;
use crate::types::{PipelineConfig, PipelineError, RgbaImage};

/// Posterize `plane` into the bands of `thresholds`.
#[must_use = "returns the posterized preview"]
pub fn posterize(plane: &LuminancePlane, thresholds: &Thresholds) -> RgbaImage {
    let bounds = thresholds.boundaries();
    let dims = plane.dimensions();
    let values = plane.values();
    let width = dims.width as usize;
    RgbaImage::from_fn(dims.width, dims.height, |x, y| {
        let v = band_value(values[y as usize * width + x as usize], &bounds);
        image::Rgba([v, v, v, 255])
    })
}

/// Preprocess `image` with `config` and posterize the result.
///
/// # Errors
///
/// Same as [`preprocess`](crate::preprocess::preprocess).
pub fn posterize_image(
    image: &RgbaImage,
    config: &PipelineConfig,
) -> Result<RgbaImage, PipelineError> {
    let preprocessed = crate::preprocess::preprocess(image, config)?;
    Ok(posterize(&preprocessed.luminance, &config.thresholds))
}

/// `bounds` is `[0, sorted points..., 255]`.
fn band_value(lum: f64, bounds: &[u8]) -> u8 {
    let mut upper = bounds.iter().skip(1).copied();
    match upper.next() {
        Some(first) if lum <= f64::from(first) => 0,
        _ => upper.find(|&b| lum <= f64::from(b)).unwrap_or(u8::MAX),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn gray_plane(values: &[u8]) -> LuminancePlane {
        let w = u32::try_from(values.len()).unwrap();
        let img = RgbaImage::from_fn(w, 1, |x, _| {
            let v = values[x as usize];
            image::Rgba([v, v, v, 255])
        });
        LuminancePlane::from_rgba(&img)
    }

    fn row(img: &RgbaImage) -> Vec<u8> {
        img.pixels().map(|p| p.0[0]).collect()
    }

    #[test]
    fn pixels_take_their_band_upper_bound() {
        let plane = gray_plane(&[0, 85, 86, 170, 171, 255]);
        let thresholds = Thresholds::new(vec![85, 170]).unwrap();
        assert_eq!(row(&posterize(&plane, &thresholds)), vec![0, 0, 170, 170, 255, 255]);
    }

    #[test]
    fn single_point_gives_two_levels() {
        let plane = gray_plane(&[10, 100, 101, 240]);
        let thresholds = Thresholds::new(vec![100]).unwrap();
        assert_eq!(row(&posterize(&plane, &thresholds)), vec![0, 0, 255, 255]);
    }

    #[test]
    fn output_only_holds_band_levels() {
        let values: Vec<u8> = (0..=255).collect();
        let plane = gray_plane(&values);
        let thresholds = Thresholds::new(vec![40, 90, 150, 220]).unwrap();
        let out = posterize(&plane, &thresholds);
        for p in out.pixels() {
            assert!([0, 90, 150, 220, 255].contains(&p.0[0]), "unexpected level {}", p.0[0]);
            assert_eq!(p.0[3], 255);
        }
    }

    #[test]
    fn posterize_image_uses_working_resolution() {
        let img = RgbaImage::from_pixel(20, 10, image::Rgba([200, 200, 200, 255]));
        let out = posterize_image(&img, &PipelineConfig::default()).unwrap();
        assert_eq!(out.dimensions(), (14, 7));
        assert!(out.pixels().all(|p| p.0[0] == 255));
    }
}
