//! Incremental pipeline: advance a run one step at a time.
//!
//! Unlike [`crate::process`] which runs everything in one call,
//! [`Pipeline`] lets the caller drive execution step by step and yield
//! to its own event loop in between:
//!
//! ```rust
//! # use layercut_pipeline::{Pipeline, PipelineConfig, PipelineError, RgbaImage};
//! # fn run(image: RgbaImage) -> Result<(), PipelineError> {
//! let mut segmenting = Pipeline::new(image, PipelineConfig::default()).preprocess()?;
//! while !segmenting.is_segmented() {
//!     segmenting = segmenting.segment_next();
//!     // yield to the host here
//! }
//! let result = segmenting.composite()?.into_result();
//! # Ok(())
//! # }
//! ```
//!
//! A run is Preprocessing once, Segmenting once per threshold point,
//! then Compositing once. Layers accumulate inside [`Segmenting`] and
//! are only handed out as a complete [`StencilResult`] batch, so a
//! half-finished run never exposes partial masks as a result.
//!
//! Each run carries its own snapshot of [`PipelineConfig`] and a
//! generation number. The source image is shared through an [`Arc`]
//! so starting a run does not copy pixels.

use std::sync::Arc;

use crate::diagnostics::StageMetrics;
use crate::preprocess::Preprocessed;
use crate::progress::{Phase, Progress};
use crate::types::{PipelineConfig, PipelineError, RgbaImage, StencilLayer, StencilResult};

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// A run before any processing has occurred.
///
/// Call [`preprocess`](Self::preprocess) to advance.
#[derive(Debug)]
#[must_use = "pipeline stages are consumed by advancing, call .preprocess() to continue"]
pub struct Pending {
    source: Arc<RgbaImage>,
    config: PipelineConfig,
    generation: u64,
}

impl Pending {
    /// The source image.
    #[must_use]
    pub fn source(&self) -> &RgbaImage {
        &self.source
    }

    /// The run's config snapshot.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Generation the run will stamp on its result.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Set the generation stamped on the result.
    pub const fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    /// Resize, blur, and compute luminance, then advance to
    /// [`Segmenting`].
    ///
    /// Threshold points are snapshotted in ascending order.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] for invalid numeric
    /// parameters and [`PipelineError::EmptyImage`] for a zero-area
    /// source.
    pub fn preprocess(self) -> Result<Segmenting, PipelineError> {
        let preprocessed = crate::preprocess::preprocess(&self.source, &self.config)?;
        let thresholds = self.config.thresholds.sorted();

        tracing::debug!(
            generation = self.generation,
            working = %preprocessed.dimensions(),
            layers = thresholds.len(),
            "run preprocessed",
        );

        Ok(Segmenting {
            layers: Vec::with_capacity(thresholds.len()),
            thresholds,
            preprocessed,
            config: self.config,
            generation: self.generation,
        })
    }
}

// ───────────────────────── Stage 1: Segmenting ───────────────────────

/// A run that has preprocessed its source and is producing masks.
///
/// Call [`segment_next`](Self::segment_next) once per threshold point,
/// then [`composite`](Self::composite).
#[derive(Debug)]
#[must_use = "pipeline stages are consumed by advancing, call .segment_next() or .composite() to continue"]
pub struct Segmenting {
    config: PipelineConfig,
    generation: u64,
    preprocessed: Preprocessed,
    thresholds: Vec<u8>,
    layers: Vec<StencilLayer>,
}

impl Segmenting {
    /// The preprocessed working image and its luminance.
    #[must_use]
    pub const fn preprocessed(&self) -> &Preprocessed {
        &self.preprocessed
    }

    /// The run's config snapshot.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Generation the run will stamp on its result.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Ascending threshold points this run segments at.
    #[must_use]
    pub fn thresholds(&self) -> &[u8] {
        &self.thresholds
    }

    /// Layers finished so far.
    #[must_use]
    pub fn layers(&self) -> &[StencilLayer] {
        &self.layers
    }

    /// Number of layers finished.
    #[must_use]
    pub const fn completed(&self) -> usize {
        self.layers.len()
    }

    /// Number of layers the run will produce.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.thresholds.len()
    }

    /// Whether every layer has been produced.
    #[must_use]
    pub const fn is_segmented(&self) -> bool {
        self.completed() >= self.total()
    }

    /// Threshold and smooth the next layer.
    ///
    /// Does nothing once every layer exists.
    pub fn segment_next(mut self) -> Self {
        let index = self.layers.len();
        let Some(&threshold) = self.thresholds.get(index) else {
            return self;
        };

        let radius = self.config.effective_smoothing_radius();
        let raw = crate::layer::threshold_mask(&self.preprocessed.luminance, threshold);
        let mask = crate::median::median_smooth(&raw, radius, self.config.median_mode);

        tracing::debug!(
            generation = self.generation,
            index,
            threshold,
            smoothing_radius = radius,
            "segmented layer",
        );

        self.layers.push(StencilLayer {
            index,
            threshold,
            mask,
        });
        self
    }

    /// Produce any remaining layers, then composite and advance to
    /// [`Composited`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NoLayers`] if the run has no threshold
    /// points.
    pub fn composite(mut self) -> Result<Composited, PipelineError> {
        while !self.is_segmented() {
            self = self.segment_next();
        }

        let composite = crate::composite::composite(self.layers.iter().map(|l| &l.mask))?;
        let dimensions = self.preprocessed.dimensions();

        tracing::debug!(
            generation = self.generation,
            layers = self.layers.len(),
            %dimensions,
            "composited layers",
        );

        Ok(Composited {
            config: self.config,
            preprocessed: self.preprocessed,
            result: StencilResult {
                generation: self.generation,
                layers: self.layers,
                composite,
                dimensions,
            },
        })
    }
}

// ───────────────────────── Stage 2: Composited ───────────────────────

/// A finished run.
#[derive(Debug)]
#[must_use = "call .into_result() to take the finished layers"]
pub struct Composited {
    config: PipelineConfig,
    preprocessed: Preprocessed,
    result: StencilResult,
}

impl Composited {
    /// The finished batch.
    #[must_use]
    pub const fn result(&self) -> &StencilResult {
        &self.result
    }

    /// The preprocessed working image the layers were cut from.
    #[must_use]
    pub const fn preprocessed(&self) -> &Preprocessed {
        &self.preprocessed
    }

    /// The run's config snapshot.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Generation stamped on the result.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.result.generation
    }

    /// Take the finished batch.
    #[must_use]
    pub fn into_result(self) -> StencilResult {
        self.result
    }
}

// ───────────────────────── Dynamic API ───────────────────────────────

/// Common interface implemented by every stage struct.
///
/// [`Stage`] delegates to whichever stage it holds, which makes the
/// run loopable:
///
/// ```rust
/// # use layercut_pipeline::{Pipeline, PipelineConfig, PipelineError, RgbaImage};
/// # use layercut_pipeline::pipeline::{Advance, Stage};
/// # fn run(image: RgbaImage) -> Result<(), PipelineError> {
/// let mut stage: Stage = Pipeline::new(image, PipelineConfig::default()).into();
/// loop {
///     match stage.advance()? {
///         Advance::Next(next) => stage = next,
///         Advance::Complete(done) => { stage = done; break; }
///     }
/// }
/// let result = stage.complete()?;
/// # Ok(())
/// # }
/// ```
pub trait PipelineStage: Sized {
    /// Short name of this stage.
    const NAME: &str;

    /// What the next step will do (or [`Phase::Done`]).
    fn phase(&self) -> Phase;

    /// Metrics for the work done to reach this state.
    ///
    /// `None` for [`Pending`], which has done nothing yet.
    fn metrics(&self) -> Option<StageMetrics>;

    /// Advance one step. `Ok(None)` once finished.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if the step fails.
    fn next(self) -> Result<Option<Stage>, PipelineError>;

    /// Run every remaining step.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if any remaining step fails.
    fn complete(self) -> Result<StencilResult, PipelineError>;
}

impl PipelineStage for Pending {
    const NAME: &str = "pending";

    fn phase(&self) -> Phase {
        Phase::Preprocessing
    }

    fn metrics(&self) -> Option<StageMetrics> {
        None
    }

    fn next(self) -> Result<Option<Stage>, PipelineError> {
        Ok(Some(Stage::Segmenting(self.preprocess()?)))
    }

    fn complete(self) -> Result<StencilResult, PipelineError> {
        self.preprocess()?.complete()
    }
}

impl PipelineStage for Segmenting {
    const NAME: &str = "segmenting";

    fn phase(&self) -> Phase {
        if self.is_segmented() {
            Phase::Compositing
        } else {
            Phase::Segmenting {
                completed: self.completed(),
                total: self.total(),
            }
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.layers.last().map_or_else(
            || StageMetrics::preprocess(&self.preprocessed, &self.config),
            |layer| StageMetrics::layer(layer, &self.config),
        ))
    }

    fn next(self) -> Result<Option<Stage>, PipelineError> {
        if self.is_segmented() {
            Ok(Some(Stage::Composited(self.composite()?)))
        } else {
            Ok(Some(Stage::Segmenting(self.segment_next())))
        }
    }

    fn complete(self) -> Result<StencilResult, PipelineError> {
        Ok(self.composite()?.into_result())
    }
}

impl PipelineStage for Composited {
    const NAME: &str = "composited";

    fn phase(&self) -> Phase {
        Phase::Done
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(StageMetrics::Composite {
            layer_count: self.result.layers.len(),
            dimensions: self.result.dimensions,
        })
    }

    fn next(self) -> Result<Option<Stage>, PipelineError> {
        Ok(None)
    }

    fn complete(self) -> Result<StencilResult, PipelineError> {
        Ok(self.into_result())
    }
}

/// Enum wrapping every stage for uniform, loopable access.
#[derive(Debug)]
#[must_use]
pub enum Stage {
    /// See [`Pending`].
    Pending(Pending),
    /// See [`Segmenting`].
    Segmenting(Segmenting),
    /// See [`Composited`].
    Composited(Composited),
}

/// Result of [`Stage::advance`]: either the next stage or the finished
/// stage returned unchanged.
#[derive(Debug)]
#[must_use]
pub enum Advance {
    /// The run advanced to this stage.
    Next(Stage),
    /// The run was already finished.
    Complete(Stage),
}

/// Delegate a method call to whichever `Stage` variant is active.
macro_rules! delegate {
    ($self:ident, $method:ident $(, $arg:expr)*) => {
        match $self {
            Self::Pending(s) => s.$method($($arg),*),
            Self::Segmenting(s) => s.$method($($arg),*),
            Self::Composited(s) => s.$method($($arg),*),
        }
    };
}

impl Stage {
    /// Short name of the current stage.
    #[must_use]
    pub fn name(&self) -> &'static str {
        delegate!(self, name)
    }

    /// Generation the run will stamp on its result.
    #[must_use]
    pub fn generation(&self) -> u64 {
        delegate!(self, generation)
    }

    /// What the next step will do.
    #[must_use]
    pub fn phase(&self) -> Phase {
        delegate!(self, phase)
    }

    /// Percentage plus phase, for progress display.
    #[must_use]
    pub fn progress(&self) -> Progress {
        self.phase().into()
    }

    /// Metrics for the work done to reach this state.
    #[must_use]
    pub fn metrics(&self) -> Option<StageMetrics> {
        delegate!(self, metrics)
    }

    /// Whether the run is finished.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Composited(_))
    }

    /// Advance one step. `Ok(None)` once finished (the finished stage is
    /// consumed).
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if the step fails.
    pub fn next(self) -> Result<Option<Self>, PipelineError> {
        delegate!(self, next)
    }

    /// Advance one step, returning `self` unchanged if already finished.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if the step fails.
    pub fn advance(self) -> Result<Advance, PipelineError> {
        match self {
            done @ Self::Composited(_) => Ok(Advance::Complete(done)),
            Self::Pending(s) => Ok(Advance::Next(Self::Segmenting(s.preprocess()?))),
            Self::Segmenting(s) if s.is_segmented() => {
                Ok(Advance::Next(Self::Composited(s.composite()?)))
            }
            Self::Segmenting(s) => Ok(Advance::Next(Self::Segmenting(s.segment_next()))),
        }
    }

    /// Run every remaining step.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if any remaining step fails.
    pub fn complete(self) -> Result<StencilResult, PipelineError> {
        delegate!(self, complete)
    }
}

// `PipelineStage::NAME` is an associated constant, which the macro
// cannot reach through `self`.
trait StageMetadata {
    fn name(&self) -> &'static str;
}

impl<T: PipelineStage> StageMetadata for T {
    fn name(&self) -> &'static str {
        T::NAME
    }
}

impl From<Pending> for Stage {
    fn from(s: Pending) -> Self {
        Self::Pending(s)
    }
}

impl From<Segmenting> for Stage {
    fn from(s: Segmenting) -> Self {
        Self::Segmenting(s)
    }
}

impl From<Composited> for Stage {
    fn from(s: Composited) -> Self {
        Self::Composited(s)
    }
}

/// Drive `stage` to completion, calling `on_step` with the initial
/// stage and again after every step.
///
/// `on_step` is the cooperative yield point: a host can redraw progress
/// or service input there. Layers are returned only when the whole run
/// has finished.
///
/// # Errors
///
/// Returns [`PipelineError`] if any step fails.
pub fn run_to_completion(
    stage: impl Into<Stage>,
    mut on_step: impl FnMut(&Stage),
) -> Result<StencilResult, PipelineError> {
    let mut stage = stage.into();
    on_step(&stage);
    loop {
        match stage.advance()? {
            Advance::Next(next) => {
                stage = next;
                on_step(&stage);
            }
            Advance::Complete(done) => return done.complete(),
        }
    }
}

// ───────────────────── Pipeline entry point ──────────────────────────

/// Entry point for a staged run.
///
/// [`Pipeline::new`] stores the source and a config snapshot without
/// processing anything.
pub struct Pipeline;

impl Pipeline {
    /// Create a pending run with generation 0.
    #[allow(clippy::new_ret_no_self)]
    pub fn new(source: impl Into<Arc<RgbaImage>>, config: PipelineConfig) -> Pending {
        Pending {
            source: source.into(),
            config,
            generation: 0,
        }
    }
}
