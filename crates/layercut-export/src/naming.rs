//! Export filenames.
//!
//! Masks are named `{stem}-layer-{ordinal}-t{threshold}.png` with a
//! one-based ordinal; the composite is `{stem}-composite.png` and the
//! posterized preview `{stem}-posterized.png`.

use layercut_pipeline::StencilLayer;

/// Filename scheme for exported images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportNaming {
    stem: String,
}

impl ExportNaming {
    /// Stem used when none is given.
    pub const DEFAULT_STEM: &str = "layercut";

    /// Create a scheme using `stem` as the filename prefix.
    ///
    /// Characters other than ASCII letters, digits, `-`, `_`, and `.`
    /// become `_`. A stem that is empty after trimming falls back to
    /// [`DEFAULT_STEM`](Self::DEFAULT_STEM).
    #[must_use]
    pub fn new(stem: &str) -> Self {
        let stem: String = stem
            .trim()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let stem = stem.trim_matches('.');
        if stem.is_empty() {
            Self::default()
        } else {
            Self {
                stem: stem.to_string(),
            }
        }
    }

    /// The sanitized stem.
    #[must_use]
    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Filename for one layer mask.
    #[must_use]
    pub fn mask_filename(&self, layer: &StencilLayer) -> String {
        format!(
            "{}-layer-{}-t{}.png",
            self.stem,
            layer.ordinal(),
            layer.threshold
        )
    }

    /// Filename for the composite preview.
    #[must_use]
    pub fn composite_filename(&self) -> String {
        format!("{}-composite.png", self.stem)
    }

    /// Filename for the posterized band preview.
    #[must_use]
    pub fn posterized_filename(&self) -> String {
        format!("{}-posterized.png", self.stem)
    }
}

impl Default for ExportNaming {
    fn default() -> Self {
        Self {
            stem: Self::DEFAULT_STEM.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use layercut_pipeline::RgbaImage;

    use super::*;

    fn layer(index: usize, threshold: u8) -> StencilLayer {
        StencilLayer {
            index,
            threshold,
            mask: RgbaImage::new(1, 1),
        }
    }

    #[test]
    fn default_names() {
        let naming = ExportNaming::default();
        assert_eq!(naming.mask_filename(&layer(0, 85)), "layercut-layer-1-t85.png");
        assert_eq!(naming.mask_filename(&layer(3, 240)), "layercut-layer-4-t240.png");
        assert_eq!(naming.composite_filename(), "layercut-composite.png");
        assert_eq!(naming.posterized_filename(), "layercut-posterized.png");
    }

    #[test]
    fn custom_stem() {
        let naming = ExportNaming::new("cherry-blossoms");
        assert_eq!(
            naming.mask_filename(&layer(1, 170)),
            "cherry-blossoms-layer-2-t170.png"
        );
    }

    #[test]
    fn unsafe_characters_are_replaced() {
        assert_eq!(ExportNaming::new("../my photo").stem(), "_my_photo");
        assert_eq!(ExportNaming::new("a/b\\c").stem(), "a_b_c");
    }

    #[test]
    fn empty_stem_falls_back_to_default() {
        assert_eq!(ExportNaming::new("  ").stem(), "layercut");
        assert_eq!(ExportNaming::new("..").stem(), "layercut");
    }
}
