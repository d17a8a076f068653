//! Interactive session: the parameters, the loaded image, and the
//! latest published layers.
//!
//! Every edit that changes something while an image is loaded starts a
//! new run and returns it as a pending [`Stage`] for the host to drive
//! (see [`run_to_completion`](crate::pipeline::run_to_completion)).
//! Each run is stamped with a fresh generation. Results are accepted by
//! [`Session::publish`] only when they carry the current generation, so
//! a slow run that finishes after a newer edit can never overwrite
//! fresher layers.
//!
//! Without an image, edits only update parameters.

use std::sync::Arc;

use crate::drag::{AxisGeometry, ThresholdDrag};
use crate::pipeline::{Pipeline, Stage};
use crate::resize::ResampleFilter;
use crate::threshold::Thresholds;
use crate::types::{
    MedianMode, PipelineConfig, PipelineError, QualityPreset, RgbaImage, StencilResult,
};

/// Coarse session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No image has been loaded.
    NoImage,
    /// Nothing is in flight.
    Idle,
    /// A run with this generation has been started and not published.
    Running {
        /// Generation of the in-flight run.
        generation: u64,
    },
}

/// Parameters, source image, and published layers for one user.
#[derive(Debug, Default)]
pub struct Session {
    source: Option<Arc<RgbaImage>>,
    config: PipelineConfig,
    drag: ThresholdDrag,
    generation: u64,
    in_flight: Option<u64>,
    latest: Option<StencilResult>,
}

impl Session {
    /// Create a session with `config` and no image.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Current parameters.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Current threshold points, in array order.
    #[must_use]
    pub const fn thresholds(&self) -> &Thresholds {
        &self.config.thresholds
    }

    /// The loaded image, if any.
    #[must_use]
    pub fn source(&self) -> Option<&RgbaImage> {
        self.source.as_deref()
    }

    /// Generation of the most recently started run.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Current drag state.
    #[must_use]
    pub const fn drag(&self) -> ThresholdDrag {
        self.drag
    }

    /// The last accepted result.
    #[must_use]
    pub const fn latest(&self) -> Option<&StencilResult> {
        self.latest.as_ref()
    }

    /// Coarse state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        match (&self.source, self.in_flight) {
            (None, _) => SessionState::NoImage,
            (Some(_), Some(generation)) => SessionState::Running { generation },
            (Some(_), None) => SessionState::Idle,
        }
    }

    /// Load a new source image and start a run.
    ///
    /// Results for the previous image are dropped.
    pub fn load_image(&mut self, image: impl Into<Arc<RgbaImage>>) -> Option<Stage> {
        let image = image.into();
        tracing::debug!(width = image.width(), height = image.height(), "image loaded");
        self.source = Some(image);
        self.latest = None;
        self.start_run()
    }

    /// Replace every parameter at once.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] and leaves the session
    /// unchanged if `config` fails [`PipelineConfig::validate`].
    pub fn set_config(&mut self, config: PipelineConfig) -> Result<Option<Stage>, PipelineError> {
        config.validate()?;
        Ok(self.replace_config(config))
    }

    /// Insert a threshold point in the widest gap.
    pub fn add_threshold(&mut self) -> Option<Stage> {
        self.config.thresholds.add()?;
        self.start_run()
    }

    /// Remove the last threshold point.
    pub fn remove_threshold(&mut self) -> Option<Stage> {
        self.config.thresholds.remove()?;
        self.start_run()
    }

    /// Move point `index` toward `value`, clamped in place.
    pub fn move_threshold(&mut self, index: usize, value: i32) -> Option<Stage> {
        let before = self.config.thresholds.points().get(index).copied()?;
        let applied = self.config.thresholds.move_point(index, value)?;
        if applied == before {
            return None;
        }
        self.start_run()
    }

    /// Grab the handle for point `index`.
    ///
    /// Returns `false` if `index` is out of range.
    pub const fn begin_drag(&mut self, index: usize) -> bool {
        self.drag.begin(index, &self.config.thresholds)
    }

    /// Move the held handle to the pointer position on `axis`.
    pub fn drag_to(&mut self, pointer_x: f64, axis: AxisGeometry) -> Option<Stage> {
        let index = self.drag.index()?;
        let before = self.config.thresholds.points().get(index).copied()?;
        let applied = self.drag.update(pointer_x, axis, &mut self.config.thresholds)?;
        if applied == before {
            return None;
        }
        self.start_run()
    }

    /// Release the held handle and re-sort the points.
    pub fn end_drag(&mut self) -> Option<Stage> {
        let before = self.config.thresholds.clone();
        self.drag.end(&mut self.config.thresholds);
        if self.config.thresholds == before {
            return None;
        }
        self.start_run()
    }

    /// Set the blur radius.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] and leaves the session
    /// unchanged if `radius` is negative or not finite.
    pub fn set_blur_radius(&mut self, radius: f32) -> Result<Option<Stage>, PipelineError> {
        self.update_checked(|config| config.blur_radius = radius)
    }

    /// Set the resize scale.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] and leaves the session
    /// unchanged if `scale` is not positive and finite.
    pub fn set_resize_scale(&mut self, scale: f64) -> Result<Option<Stage>, PipelineError> {
        self.update_checked(|config| config.resize_scale = scale)
    }

    /// Set the median radius.
    pub fn set_smoothing_radius(&mut self, radius: u32) -> Option<Stage> {
        self.update(|config| config.smoothing_radius = radius)
    }

    /// Choose the median implementation.
    pub fn set_median_mode(&mut self, mode: MedianMode) -> Option<Stage> {
        self.update(|config| config.median_mode = mode)
    }

    /// Choose the resampling kernel.
    pub fn set_resample_filter(&mut self, filter: ResampleFilter) -> Option<Stage> {
        self.update(|config| config.resample_filter = filter)
    }

    /// Apply a quality preset's scale and blur pair.
    pub fn set_preset(&mut self, preset: QualityPreset) -> Option<Stage> {
        self.update(|config| config.apply_preset(preset))
    }

    /// Offer a finished run's result.
    ///
    /// Returns `true` if it was accepted as the latest result. Results
    /// from superseded runs are discarded.
    pub fn publish(&mut self, result: StencilResult) -> bool {
        if result.generation != self.generation || self.source.is_none() {
            tracing::debug!(
                stale = result.generation,
                current = self.generation,
                "discarding superseded run result",
            );
            return false;
        }
        self.in_flight = None;
        self.latest = Some(result);
        true
    }

    /// Forget the in-flight run `generation` after it failed.
    pub fn abandon(&mut self, generation: u64) {
        if self.in_flight == Some(generation) {
            tracing::debug!(generation, "run abandoned");
            self.in_flight = None;
        }
    }

    fn update(&mut self, edit: impl FnOnce(&mut PipelineConfig)) -> Option<Stage> {
        let mut config = self.config.clone();
        edit(&mut config);
        self.replace_config(config)
    }

    fn update_checked(
        &mut self,
        edit: impl FnOnce(&mut PipelineConfig),
    ) -> Result<Option<Stage>, PipelineError> {
        let mut config = self.config.clone();
        edit(&mut config);
        self.set_config(config)
    }

    fn replace_config(&mut self, config: PipelineConfig) -> Option<Stage> {
        if config == self.config {
            return None;
        }
        self.config = config;
        self.start_run()
    }

    fn start_run(&mut self) -> Option<Stage> {
        let source = Arc::clone(self.source.as_ref()?);
        self.generation += 1;
        self.in_flight = Some(self.generation);
        tracing::debug!(
            generation = self.generation,
            thresholds = ?self.config.thresholds.points(),
            "run started",
        );
        Some(
            Pipeline::new(source, self.config.clone())
                .with_generation(self.generation)
                .into(),
        )
    }
}
