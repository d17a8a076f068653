//! Run diagnostics: timing and counts for every step of a run.
//!
//! These diagnostics are permanent instrumentation intended for
//! parameter tuning. [`process_with_diagnostics`](crate::process_with_diagnostics)
//! collects them alongside the stencil result.
//!
//! Timestamps come from a [`Clock`]. [`SystemClock`] uses the `web-time`
//! crate, which maps to `performance.now()` on WASM and
//! `std::time::Instant` on native. Tests substitute a manual clock.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::layer::count_cut_pixels;
use crate::preprocess::Preprocessed;
use crate::types::{Dimensions, MedianMode, PipelineConfig, StencilLayer};

/// Source of timestamps for diagnostics and progress linger.
pub trait Clock {
    /// Opaque point in time.
    type Instant: Clone + fmt::Debug;

    /// The current time.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Wall clock backed by [`web_time::Instant`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    type Instant = web_time::Instant;

    fn now(&self) -> Self::Instant {
        web_time::Instant::now()
    }

    fn elapsed(&self, since: &Self::Instant) -> Duration {
        since.elapsed()
    }
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunDiagnostics {
    /// Generation of the run.
    pub generation: u64,
    /// Resize, blur, and luminance.
    pub preprocess: StageDiagnostics,
    /// One entry per layer, ascending threshold order.
    pub layers: Vec<StageDiagnostics>,
    /// Averaging masks into the preview.
    pub composite: StageDiagnostics,
    /// Wall-clock duration of the whole run (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary of inputs and outputs.
    pub summary: RunSummary,
}

/// Diagnostics for a single step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this step (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Step-specific metrics.
    pub metrics: StageMetrics,
}

/// Step-specific metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Resize + blur.
    Preprocess {
        /// Source size before resizing.
        source: Dimensions,
        /// Working resolution.
        working: Dimensions,
        /// Whether resampling was applied.
        resized: bool,
        /// Blur radius used.
        blur_radius: f32,
    },
    /// Threshold + median for one layer.
    Layer {
        /// Zero-based layer index.
        index: usize,
        /// Threshold the layer was cut at.
        threshold: u8,
        /// Pixels marked cut after smoothing.
        cut_pixel_count: u64,
        /// Pixels in the mask.
        total_pixel_count: u64,
        /// Median radius applied (0 when smoothing is off).
        smoothing_radius: u32,
        /// Median implementation used.
        median_mode: MedianMode,
    },
    /// Compositing.
    Composite {
        /// Number of masks averaged.
        layer_count: usize,
        /// Composite size.
        dimensions: Dimensions,
    },
}

impl StageMetrics {
    /// Metrics for a finished preprocessing step.
    #[must_use]
    pub fn preprocess(preprocessed: &Preprocessed, config: &PipelineConfig) -> Self {
        Self::Preprocess {
            source: preprocessed.source,
            working: preprocessed.dimensions(),
            resized: preprocessed.resized,
            blur_radius: config.blur_radius,
        }
    }

    /// Metrics for a finished layer.
    #[must_use]
    pub fn layer(layer: &StencilLayer, config: &PipelineConfig) -> Self {
        Self::Layer {
            index: layer.index,
            threshold: layer.threshold,
            cut_pixel_count: count_cut_pixels(&layer.mask),
            total_pixel_count: Dimensions::of(&layer.mask).pixel_count(),
            smoothing_radius: config.effective_smoothing_radius(),
            median_mode: config.median_mode,
        }
    }
}

/// High-level summary of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Source image size.
    pub source: Dimensions,
    /// Working resolution of every mask.
    pub working: Dimensions,
    /// Threshold points, ascending.
    pub thresholds: Vec<u8>,
    /// Number of masks produced.
    pub layer_count: usize,
}

impl RunDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Run Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {} -> {} working ({} pixels)",
            self.summary.source,
            self.summary.working,
            self.summary.working.pixel_count(),
        ));
        lines.push(format!(
            "Thresholds: {:?} ({} layers)",
            self.summary.thresholds, self.summary.layer_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);

        let mut stages: Vec<(String, &StageDiagnostics)> =
            vec![("Preprocess".to_string(), &self.preprocess)];
        for (i, diag) in self.layers.iter().enumerate() {
            stages.push((format!("Layer {}", i + 1), diag));
        }
        stages.push(("Composite".to_string(), &self.composite));

        for (name, diag) in &stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format step metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Preprocess {
            source,
            working,
            resized,
            blur_radius,
        } => {
            let resample = if *resized { "resized" } else { "native" };
            format!("{source} -> {working} ({resample}) blur={blur_radius:.2}")
        }
        StageMetrics::Layer {
            threshold,
            cut_pixel_count,
            total_pixel_count,
            smoothing_radius,
            median_mode,
            ..
        } => {
            #[allow(clippy::cast_precision_loss)]
            let density = if *total_pixel_count > 0 {
                *cut_pixel_count as f64 / *total_pixel_count as f64 * 100.0
            } else {
                0.0
            };
            format!(
                "t={threshold} cut={cut_pixel_count} ({density:.1}%) \
                 median={median_mode} r={smoothing_radius}",
            )
        }
        StageMetrics::Composite {
            layer_count,
            dimensions,
        } => format!("{layer_count} layers at {dimensions}"),
    }
}
