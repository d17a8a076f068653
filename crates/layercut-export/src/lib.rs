//! layercut-export: Pure PNG serializers and export naming (sans-IO).
//!
//! Turns a published [`StencilResult`] into named PNG byte buffers:
//! one mask by index, every mask in order, or the composite. Writing
//! the bytes somewhere (disk, browser download) is the caller's job.

pub mod naming;
pub mod png;

use layercut_pipeline::{RgbaImage, StencilLayer, StencilResult};

pub use naming::ExportNaming;
pub use png::encode_png;

/// Errors that can occur while exporting.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Export was requested before any result exists.
    #[error("no image loaded: upload an image first")]
    NoImage,

    /// The requested layer does not exist.
    #[error("layer index {index} out of range ({count} layers)")]
    LayerOutOfRange {
        /// Requested zero-based index.
        index: usize,
        /// Number of layers available.
        count: usize,
    },

    /// PNG encoding failed.
    #[error("PNG encoding failed: {0}")]
    PngEncode(String),
}

impl From<image::ImageError> for ExportError {
    fn from(err: image::ImageError) -> Self {
        Self::PngEncode(err.to_string())
    }
}

/// A named, encoded image ready to hand to a download or file writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedImage {
    /// Suggested filename.
    pub filename: String,
    /// PNG bytes.
    pub bytes: Vec<u8>,
}

/// Export the mask at `index`.
///
/// # Errors
///
/// Returns [`ExportError::NoImage`] if `result` is `None`,
/// [`ExportError::LayerOutOfRange`] for a bad index, and
/// [`ExportError::PngEncode`] if encoding fails.
pub fn export_mask(
    result: Option<&StencilResult>,
    index: usize,
    naming: &ExportNaming,
) -> Result<ExportedImage, ExportError> {
    let result = result.ok_or(ExportError::NoImage)?;
    let layer = result.layer(index).ok_or(ExportError::LayerOutOfRange {
        index,
        count: result.layers.len(),
    })?;
    export_layer(layer, naming)
}

/// Export every mask in ascending threshold order.
///
/// # Errors
///
/// Returns [`ExportError::NoImage`] if `result` is `None` and
/// [`ExportError::PngEncode`] if any encoding fails.
pub fn export_all_masks(
    result: Option<&StencilResult>,
    naming: &ExportNaming,
) -> Result<Vec<ExportedImage>, ExportError> {
    let result = result.ok_or(ExportError::NoImage)?;
    result
        .layers
        .iter()
        .map(|layer| export_layer(layer, naming))
        .collect()
}

/// Export the composite preview.
///
/// # Errors
///
/// Returns [`ExportError::NoImage`] if `result` is `None` and
/// [`ExportError::PngEncode`] if encoding fails.
pub fn export_composite(
    result: Option<&StencilResult>,
    naming: &ExportNaming,
) -> Result<ExportedImage, ExportError> {
    let result = result.ok_or(ExportError::NoImage)?;
    let exported = ExportedImage {
        filename: naming.composite_filename(),
        bytes: encode_png(&result.composite)?,
    };
    tracing::debug!(
        filename = %exported.filename,
        bytes = exported.bytes.len(),
        "exported composite",
    );
    Ok(exported)
}

/// Export a posterized band preview.
///
/// # Errors
///
/// Returns [`ExportError::PngEncode`] if encoding fails.
pub fn export_posterized(
    posterized: &RgbaImage,
    naming: &ExportNaming,
) -> Result<ExportedImage, ExportError> {
    Ok(ExportedImage {
        filename: naming.posterized_filename(),
        bytes: encode_png(posterized)?,
    })
}

fn export_layer(layer: &StencilLayer, naming: &ExportNaming) -> Result<ExportedImage, ExportError> {
    let exported = ExportedImage {
        filename: naming.mask_filename(layer),
        bytes: encode_png(&layer.mask)?,
    };
    tracing::debug!(
        filename = %exported.filename,
        threshold = layer.threshold,
        bytes = exported.bytes.len(),
        "exported mask",
    );
    Ok(exported)
}
