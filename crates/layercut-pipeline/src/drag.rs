//! Handle-drag state machine for threshold points.
//!
//! `Idle -> Dragging { index } -> Idle`. While dragging, pointer
//! positions on the threshold axis are mapped to luminance values and
//! applied through [`Thresholds::move_point`], which clamps them in
//! place. Ending the drag re-sorts the set.

use crate::threshold::{AXIS_MAX, Thresholds};

/// On-screen extent of the threshold axis, in the pointer's coordinate
/// space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisGeometry {
    /// Left edge of the axis.
    pub left: f64,
    /// Width of the axis. Non-positive widths map every pointer to 0.
    pub width: f64,
}

impl AxisGeometry {
    /// Create an axis geometry.
    #[must_use]
    pub const fn new(left: f64, width: f64) -> Self {
        Self { left, width }
    }

    /// Luminance value under `pointer_x`, rounded and clamped to
    /// `[0, 255]`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn value_at(self, pointer_x: f64) -> i32 {
        if self.width <= 0.0 || !pointer_x.is_finite() {
            return 0;
        }
        let value = ((pointer_x - self.left) / self.width * f64::from(AXIS_MAX)).round();
        value.clamp(0.0, f64::from(AXIS_MAX)) as i32
    }
}

/// Horizontal handle position for `value`, as a percentage of the axis.
#[must_use]
pub fn position_percent(value: u8) -> f64 {
    f64::from(value) / f64::from(AXIS_MAX) * 100.0
}

/// Drag state for threshold handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThresholdDrag {
    /// No handle is held.
    #[default]
    Idle,
    /// The handle for point `index` is held.
    Dragging {
        /// Array index of the held point.
        index: usize,
    },
}

impl ThresholdDrag {
    /// Start dragging point `index`.
    ///
    /// Returns `false` and stays idle if `index` is out of range.
    pub const fn begin(&mut self, index: usize, thresholds: &Thresholds) -> bool {
        if index >= thresholds.len() {
            return false;
        }
        *self = Self::Dragging { index };
        true
    }

    /// Move the held point to the value under `pointer_x`.
    ///
    /// Returns the clamped value that was applied, or `None` when idle.
    pub fn update(
        &self,
        pointer_x: f64,
        axis: AxisGeometry,
        thresholds: &mut Thresholds,
    ) -> Option<u8> {
        match *self {
            Self::Idle => None,
            Self::Dragging { index } => thresholds.move_point(index, axis.value_at(pointer_x)),
        }
    }

    /// Release the held point and re-sort the set.
    ///
    /// Returns `true` if a drag was in progress.
    pub fn end(&mut self, thresholds: &mut Thresholds) -> bool {
        let was_dragging = self.is_dragging();
        *self = Self::Idle;
        thresholds.sort();
        was_dragging
    }

    /// Whether a handle is held.
    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        matches!(self, Self::Dragging { .. })
    }

    /// Index of the held point, if any.
    #[must_use]
    pub const fn index(&self) -> Option<usize> {
        match *self {
            Self::Idle => None,
            Self::Dragging { index } => Some(index),
        }
    }
}
