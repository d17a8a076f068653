//! layercut-pipeline: Pure image-to-stencil-layers pipeline (sans-IO).
//!
//! Splits a raster image into binary stencil layers, one per luminance
//! threshold point, through:
//! resize -> blur -> luminance -> threshold -> median smoothing ->
//! composite.
//!
//! This crate has **no I/O dependencies**. It operates on in-memory
//! RGBA buffers and returns structured data. Decoding files and
//! encoding PNGs live in `layercut-cli` and `layercut-export`.
//!
//! Three ways to run it:
//!
//! - [`process`]: one call, one [`StencilResult`].
//! - [`Pipeline`]: step-by-step, yielding to the host between layers.
//! - [`Session`]: interactive parameter edits that each start a new
//!   run, with stale results discarded on publish.
//!
//! [`posterize_image`] renders every band into one preview image.

pub mod blur;
pub mod composite;
pub mod diagnostics;
pub mod drag;
pub mod layer;
pub mod luminance;
pub mod median;
pub mod pipeline;
pub mod posterize;
pub mod preprocess;
pub mod progress;
pub mod resize;
pub mod session;
pub mod threshold;
pub mod types;

pub use diagnostics::{Clock, RunDiagnostics, StageDiagnostics, StageMetrics, SystemClock};
pub use drag::{AxisGeometry, ThresholdDrag};
pub use pipeline::{Pipeline, run_to_completion};
pub use posterize::posterize_image;
pub use progress::{Phase, Progress, ProgressIndicator};
pub use resize::ResampleFilter;
pub use session::{Session, SessionState};
pub use threshold::{ThresholdError, Thresholds};
pub use types::{
    Dimensions, MedianMode, PipelineConfig, PipelineError, QualityPreset, RgbaImage, StencilLayer,
    StencilResult,
};

/// Run the full pipeline on `image`.
///
/// # Pipeline steps
///
/// 1. Resize by `config.resize_scale`, capped at `config.max_dimension`
/// 2. Gaussian blur (noise reduction)
/// 3. BT.709 luminance
/// 4. One mask per threshold point, ascending
/// 5. Median smoothing of each mask (skipped under the low preset)
/// 6. Composite preview
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] for invalid numeric
/// parameters and [`PipelineError::EmptyImage`] for a zero-area image.
pub fn process(image: &RgbaImage, config: &PipelineConfig) -> Result<StencilResult, PipelineError> {
    let _span = tracing::info_span!("process", thresholds = ?config.thresholds.points()).entered();
    Pipeline::new(image.clone(), config.clone())
        .preprocess()?
        .composite()
        .map(pipeline::Composited::into_result)
}

/// Run the full pipeline, timing every step with `clock`.
///
/// # Errors
///
/// Same as [`process`].
pub fn process_with_diagnostics<C: Clock>(
    image: &RgbaImage,
    config: &PipelineConfig,
    clock: &C,
) -> Result<(StencilResult, RunDiagnostics), PipelineError> {
    let _span = tracing::info_span!(
        "process_with_diagnostics",
        thresholds = ?config.thresholds.points(),
    )
    .entered();
    let run_start = clock.now();

    let t = clock.now();
    let mut segmenting = Pipeline::new(image.clone(), config.clone()).preprocess()?;
    let preprocess = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::preprocess(segmenting.preprocessed(), config),
    };

    let mut layers = Vec::with_capacity(segmenting.total());
    while !segmenting.is_segmented() {
        let t = clock.now();
        segmenting = segmenting.segment_next();
        let duration = clock.elapsed(&t);
        if let Some(layer) = segmenting.layers().last() {
            layers.push(StageDiagnostics {
                duration,
                metrics: StageMetrics::layer(layer, config),
            });
        }
    }

    let t = clock.now();
    let composited = segmenting.composite()?;
    let composite_duration = clock.elapsed(&t);
    let total_duration = clock.elapsed(&run_start);

    let result = composited.into_result();
    let diagnostics = RunDiagnostics {
        generation: result.generation,
        preprocess,
        layers,
        composite: StageDiagnostics {
            duration: composite_duration,
            metrics: StageMetrics::Composite {
                layer_count: result.layers.len(),
                dimensions: result.dimensions,
            },
        },
        total_duration,
        summary: diagnostics::RunSummary {
            source: Dimensions::of(image),
            working: result.dimensions,
            thresholds: result.layers.iter().map(|l| l.threshold).collect(),
            layer_count: result.layers.len(),
        },
    };

    tracing::info!(
        layers = result.layers.len(),
        working = %result.dimensions,
        total_ms = total_duration.as_secs_f64() * 1000.0,
        "run complete",
    );

    Ok((result, diagnostics))
}
