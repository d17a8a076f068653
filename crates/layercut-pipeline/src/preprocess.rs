//! Working-resolution, noise-reduced copy of the source image.
//!
//! Resize then blur, then convert to a [`LuminancePlane`] that every
//! layer thresholds against. The caller's image is only read.

use crate::luminance::LuminancePlane;
use crate::types::{Dimensions, PipelineConfig, PipelineError, RgbaImage};

/// Output of the preprocessing step.
#[derive(Debug, Clone)]
pub struct Preprocessed {
    /// Resized and blurred RGBA image.
    pub working: RgbaImage,
    /// Luminance of `working`.
    pub luminance: LuminancePlane,
    /// Size of the source image before resizing.
    pub source: Dimensions,
    /// Whether resampling was applied.
    pub resized: bool,
}

impl Preprocessed {
    /// Working resolution.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.luminance.dimensions()
    }
}

/// Resize and blur `image` according to `config`.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if the config fails
/// [`PipelineConfig::validate`], and [`PipelineError::EmptyImage`] if
/// the source has zero width or height.
pub fn preprocess(
    image: &RgbaImage,
    config: &PipelineConfig,
) -> Result<Preprocessed, PipelineError> {
    config.validate()?;

    let source = Dimensions::of(image);
    if source.is_empty() {
        return Err(PipelineError::EmptyImage(source));
    }

    let (resized_image, resized) = crate::resize::resize(
        image,
        config.resize_scale,
        config.max_dimension,
        config.resample_filter,
    );
    let working = crate::blur::gaussian_blur_rgba(&resized_image, config.blur_radius);
    let luminance = LuminancePlane::from_rgba(&working);

    tracing::debug!(
        %source,
        working = %luminance.dimensions(),
        resized,
        blur_radius = config.blur_radius,
        "preprocessed source image",
    );

    Ok(Preprocessed {
        working,
        luminance,
        source,
        resized,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn gradient(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, _| {
            #[allow(clippy::cast_possible_truncation)]
            let v = (x * 255 / (w - 1).max(1)) as u8;
            image::Rgba([v, v, v, 255])
        })
    }

    #[test]
    fn identity_settings_leave_pixels_untouched() {
        let img = gradient(8, 4);
        let config = PipelineConfig {
            resize_scale: 1.0,
            blur_radius: 0.0,
            ..PipelineConfig::default()
        };
        let pre = preprocess(&img, &config).unwrap();
        assert!(!pre.resized);
        assert_eq!(pre.working, img);
        assert_eq!(pre.source, Dimensions::new(8, 4));
    }

    #[test]
    fn default_settings_shrink_to_seventy_percent() {
        let img = gradient(100, 50);
        let pre = preprocess(&img, &PipelineConfig::default()).unwrap();
        assert!(pre.resized);
        assert_eq!(pre.dimensions(), Dimensions::new(70, 35));
        assert_eq!(pre.working.dimensions(), (70, 35));
    }

    #[test]
    fn empty_image_is_rejected() {
        let img = RgbaImage::new(0, 5);
        let result = preprocess(&img, &PipelineConfig::default());
        assert!(matches!(result, Err(PipelineError::EmptyImage(_))));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = PipelineConfig {
            resize_scale: 0.0,
            ..PipelineConfig::default()
        };
        let result = preprocess(&gradient(4, 4), &config);
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }
}
