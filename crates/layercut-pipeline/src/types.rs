//! Shared types for the layercut stencil pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::resize::ResampleFilter;
use crate::threshold::Thresholds;

/// Re-export `RgbaImage` so downstream crates can reference source,
/// mask, and composite rasters without depending on `image` directly.
pub use image::RgbaImage;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create a new dimension pair.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Dimensions of an RGBA image.
    #[must_use]
    pub fn of(image: &RgbaImage) -> Self {
        Self::new(image.width(), image.height())
    }

    /// Total pixel count (`width * height`).
    #[must_use]
    pub fn pixel_count(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Returns `true` if either axis is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Named shortcut that sets the resize scale and blur radius as a pair.
///
/// [`QualityPreset::Low`] additionally disables median smoothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityPreset {
    /// Half resolution, light blur, no smoothing.
    Low,
    /// 70% resolution, moderate blur.
    #[default]
    Medium,
    /// Full resolution, strong blur.
    High,
}

impl QualityPreset {
    /// Resize factor applied to the source before segmentation.
    #[must_use]
    pub const fn resize_scale(self) -> f64 {
        match self {
            Self::Low => 0.5,
            Self::Medium => 0.7,
            Self::High => 1.0,
        }
    }

    /// Blur radius applied after resizing.
    #[must_use]
    pub const fn blur_radius(self) -> f32 {
        match self {
            Self::Low => 1.0,
            Self::Medium => 2.0,
            Self::High => 3.0,
        }
    }

    /// Whether the median smoothing step runs under this preset.
    #[must_use]
    pub const fn smoothing_enabled(self) -> bool {
        !matches!(self, Self::Low)
    }
}

impl fmt::Display for QualityPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => f.write_str("low"),
            Self::Medium => f.write_str("medium"),
            Self::High => f.write_str("high"),
        }
    }
}

/// Rank-filter strategy used to despeckle each mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MedianMode {
    /// Horizontal 1-D median followed by a vertical 1-D median.
    #[default]
    Separable,
    /// Full square-neighborhood median.
    Exact,
}

impl fmt::Display for MedianMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Separable => f.write_str("Separable"),
            Self::Exact => f.write_str("Exact"),
        }
    }
}

/// Configuration for one pipeline run.
///
/// The struct doubles as the snapshot a [`Pending`](crate::pipeline::Pending)
/// run carries: the session clones it when a parameter change starts a
/// new run, so later edits never leak into a run already in flight.
///
/// Numeric fields are validated by [`validate`](Self::validate) when a
/// run begins preprocessing. Threshold invariants are enforced by
/// [`Thresholds`] itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Ordered luminance boundary points (1-4 of them).
    pub thresholds: Thresholds,

    /// Gaussian blur radius (standard deviation, in working pixels).
    /// Zero disables the blur.
    pub blur_radius: f32,

    /// Resize factor applied to the source image before blurring.
    pub resize_scale: f64,

    /// Hard cap on either working axis after resizing.
    pub max_dimension: u32,

    /// Resampling kernel used by the resize step.
    pub resample_filter: ResampleFilter,

    /// Median window radius. Zero disables smoothing.
    pub smoothing_radius: u32,

    /// Which median implementation to use.
    pub median_mode: MedianMode,

    /// Preset the numeric parameters were last derived from.
    pub preset: QualityPreset,
}

impl PipelineConfig {
    /// Default blur radius (medium preset).
    pub const DEFAULT_BLUR_RADIUS: f32 = 2.0;

    /// Default resize scale (medium preset).
    pub const DEFAULT_RESIZE_SCALE: f64 = 0.7;

    /// Working-resolution ceiling on each axis.
    pub const DEFAULT_MAX_DIMENSION: u32 = 1500;

    /// Default median window radius.
    pub const DEFAULT_SMOOTHING_RADIUS: u32 = 1;

    /// Default resampling kernel.
    pub const DEFAULT_RESAMPLE_FILTER: ResampleFilter = ResampleFilter::Triangle;

    /// Build a config whose numeric parameters come from `preset`.
    #[must_use]
    pub fn from_preset(preset: QualityPreset) -> Self {
        let mut config = Self::default();
        config.apply_preset(preset);
        config
    }

    /// Overwrite the resize scale and blur radius with the preset pair.
    pub const fn apply_preset(&mut self, preset: QualityPreset) {
        self.preset = preset;
        self.resize_scale = preset.resize_scale();
        self.blur_radius = preset.blur_radius();
    }

    /// Median radius actually applied, accounting for the preset.
    #[must_use]
    pub const fn effective_smoothing_radius(&self) -> u32 {
        if self.preset.smoothing_enabled() {
            self.smoothing_radius
        } else {
            0
        }
    }

    /// Check numeric parameters.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if `resize_scale` is not a
    /// positive finite number, `blur_radius` is negative or not finite,
    /// or `max_dimension` is zero.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.resize_scale.is_finite() || self.resize_scale <= 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "resize_scale must be positive and finite, got {}",
                self.resize_scale
            )));
        }
        if !self.blur_radius.is_finite() || self.blur_radius < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "blur_radius must be non-negative and finite, got {}",
                self.blur_radius
            )));
        }
        if self.max_dimension == 0 {
            return Err(PipelineError::InvalidConfig(
                "max_dimension must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            blur_radius: Self::DEFAULT_BLUR_RADIUS,
            resize_scale: Self::DEFAULT_RESIZE_SCALE,
            max_dimension: Self::DEFAULT_MAX_DIMENSION,
            resample_filter: Self::DEFAULT_RESAMPLE_FILTER,
            smoothing_radius: Self::DEFAULT_SMOOTHING_RADIUS,
            median_mode: MedianMode::default(),
            preset: QualityPreset::default(),
        }
    }
}

/// One binary stencil layer.
///
/// Pixels are 255 (cut) where the working luminance is at or below
/// `threshold`, 0 elsewhere, replicated across R/G/B with opaque alpha.
#[derive(Debug, Clone)]
pub struct StencilLayer {
    /// Zero-based position in ascending threshold order.
    pub index: usize,
    /// Upper luminance bound this mask was cut at.
    pub threshold: u8,
    /// The binary mask.
    pub mask: RgbaImage,
}

impl StencilLayer {
    /// One-based ordinal, as shown to users and used in filenames.
    #[must_use]
    pub const fn ordinal(&self) -> usize {
        self.index + 1
    }
}

/// The batch produced by one completed run.
///
/// Masks and composite are published together; a run never exposes a
/// partial set.
#[derive(Debug, Clone)]
pub struct StencilResult {
    /// Generation of the run that produced this batch.
    pub generation: u64,
    /// One layer per threshold point, ascending.
    pub layers: Vec<StencilLayer>,
    /// Averaged, inverted preview of all layers.
    pub composite: RgbaImage,
    /// Working resolution shared by every layer and the composite.
    pub dimensions: Dimensions,
}

impl StencilResult {
    /// The layer at `index`, if any.
    #[must_use]
    pub fn layer(&self, index: usize) -> Option<&StencilLayer> {
        self.layers.get(index)
    }
}

/// Errors that can occur during pipeline processing.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    /// The source image has zero width or height.
    #[error("source image is empty ({0})")]
    EmptyImage(Dimensions),

    /// Compositing was requested without any layers.
    #[error("cannot composite zero layers")]
    NoLayers,

    /// Layers handed to the compositor differ in size.
    #[error("layer dimensions differ: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Size of the first layer.
        expected: Dimensions,
        /// Size of the offending layer.
        actual: Dimensions,
    },
}
