//! Ordered luminance boundary points.
//!
//! A [`Thresholds`] set holds 1-4 points in `[0, 255]`, sorted
//! ascending, with every adjacent pair at least [`MIN_GAP`] apart.
//! Band boundaries are derived on demand as `[0, points..., 255]`, so
//! the number of bands is always `len + 1` (2-5).
//!
//! Mutation goes through [`add`](Thresholds::add),
//! [`remove`](Thresholds::remove), and
//! [`move_point`](Thresholds::move_point). Capacity violations are
//! silently ignored and drag values are clamped in place, so none of
//! them can fail.

use serde::{Deserialize, Serialize};

/// Fewest threshold points a set may hold (two bands).
pub const MIN_POINTS: usize = 1;

/// Most threshold points a set may hold (five bands).
pub const MAX_POINTS: usize = 4;

/// Minimum distance between adjacent threshold points.
pub const MIN_GAP: u8 = 5;

/// Lower virtual boundary of the luminance axis.
pub const AXIS_MIN: u8 = 0;

/// Upper virtual boundary of the luminance axis.
pub const AXIS_MAX: u8 = 255;

/// Reasons a list of points cannot form a [`Thresholds`] set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ThresholdError {
    /// Too few or too many points.
    #[error("expected {MIN_POINTS} to {MAX_POINTS} threshold points, got {0}")]
    Count(usize),

    /// Two adjacent points are closer than [`MIN_GAP`].
    #[error("threshold points {lower} and {upper} are closer than {MIN_GAP}")]
    TooClose {
        /// The smaller of the two points.
        lower: u8,
        /// The larger of the two points.
        upper: u8,
    },
}

/// Ordered set of 1-4 luminance threshold points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Thresholds {
    points: Vec<u8>,
}

impl Thresholds {
    /// Build a set from arbitrary points.
    ///
    /// The points are sorted before validation, so input order does not
    /// matter.
    ///
    /// # Errors
    ///
    /// Returns [`ThresholdError::Count`] if there are fewer than
    /// [`MIN_POINTS`] or more than [`MAX_POINTS`] points, and
    /// [`ThresholdError::TooClose`] if any two neighbors are closer than
    /// [`MIN_GAP`].
    pub fn new(mut points: Vec<u8>) -> Result<Self, ThresholdError> {
        if !(MIN_POINTS..=MAX_POINTS).contains(&points.len()) {
            return Err(ThresholdError::Count(points.len()));
        }
        points.sort_unstable();
        if let Some(pair) = points.windows(2).find(|w| w[1] - w[0] < MIN_GAP) {
            return Err(ThresholdError::TooClose {
                lower: pair[0],
                upper: pair[1],
            });
        }
        Ok(Self { points })
    }

    /// The points in their current array order.
    ///
    /// This is ascending except transiently during a drag, where the
    /// moved point keeps its array slot until [`sort`](Self::sort).
    #[must_use]
    pub fn points(&self) -> &[u8] {
        &self.points
    }

    /// A sorted copy of the points.
    #[must_use]
    pub fn sorted(&self) -> Vec<u8> {
        let mut points = self.points.clone();
        points.sort_unstable();
        points
    }

    /// Number of points.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.points.len()
    }

    /// Always `false`; a set holds at least [`MIN_POINTS`] points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of luminance bands (`len + 1`).
    #[must_use]
    pub const fn band_count(&self) -> usize {
        self.points.len() + 1
    }

    /// Whether [`add`](Self::add) would insert a point.
    #[must_use]
    pub const fn can_add(&self) -> bool {
        self.points.len() < MAX_POINTS
    }

    /// Whether [`remove`](Self::remove) would drop a point.
    #[must_use]
    pub const fn can_remove(&self) -> bool {
        self.points.len() > MIN_POINTS
    }

    /// Band boundaries: `[0, sorted points..., 255]`.
    #[must_use]
    pub fn boundaries(&self) -> Vec<u8> {
        let mut bounds = Vec::with_capacity(self.points.len() + 2);
        bounds.push(AXIS_MIN);
        bounds.extend(self.sorted());
        bounds.push(AXIS_MAX);
        bounds
    }

    /// Inclusive `(lower, upper)` luminance range of every band.
    #[must_use]
    pub fn bands(&self) -> Vec<(u8, u8)> {
        self.boundaries().windows(2).map(|w| (w[0], w[1])).collect()
    }

    /// Insert a point at the midpoint of the widest gap.
    ///
    /// Gaps are measured between consecutive boundaries, including the
    /// virtual 0 and 255. Ties go to the leftmost gap. The midpoint is
    /// rounded half-to-even.
    ///
    /// Returns the inserted value, or `None` if the set is full.
    pub fn add(&mut self) -> Option<u8> {
        if !self.can_add() {
            return None;
        }

        let bounds = self.boundaries();
        let (lower, gap) = bounds
            .windows(2)
            .map(|w| (w[0], w[1] - w[0]))
            .fold((AXIS_MIN, 0u8), |best, candidate| {
                if candidate.1 > best.1 { candidate } else { best }
            });

        let midpoint = (f64::from(lower) + f64::from(gap) / 2.0).round_ties_even();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let value = midpoint as u8;

        self.points.push(value);
        self.sort();
        Some(value)
    }

    /// Drop the point in the highest array slot.
    ///
    /// Removal is positional: whatever currently occupies the last slot
    /// goes, whether or not it is the largest value.
    ///
    /// Returns the removed value, or `None` if only [`MIN_POINTS`]
    /// remain.
    pub fn remove(&mut self) -> Option<u8> {
        if !self.can_remove() {
            return None;
        }
        self.points.pop()
    }

    /// Move the point at `index` toward `proposed`.
    ///
    /// The value is clamped to `[0, 255]`, then snapped so it stays at
    /// least [`MIN_GAP`] away from its array neighbors. The point keeps
    /// its array slot; call [`sort`](Self::sort) once the drag ends.
    ///
    /// Returns the applied value, or `None` if `index` is out of range.
    pub fn move_point(&mut self, index: usize, proposed: i32) -> Option<u8> {
        if index >= self.points.len() {
            return None;
        }

        let gap = i32::from(MIN_GAP);
        let mut value = proposed.clamp(i32::from(AXIS_MIN), i32::from(AXIS_MAX));

        if let Some(&prev) = index.checked_sub(1).and_then(|i| self.points.get(i)) {
            let floor = i32::from(prev) + gap;
            if value <= floor {
                value = floor;
            }
        }
        if let Some(&next) = self.points.get(index + 1) {
            let ceiling = i32::from(next) - gap;
            if value >= ceiling {
                value = ceiling;
            }
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let value = value.clamp(i32::from(AXIS_MIN), i32::from(AXIS_MAX)) as u8;
        self.points[index] = value;
        Some(value)
    }

    /// Restore ascending order.
    pub fn sort(&mut self) {
        self.points.sort_unstable();
    }
}

impl Default for Thresholds {
    /// Two points splitting the axis into three even bands.
    fn default() -> Self {
        Self {
            points: vec![85, 170],
        }
    }
}

impl TryFrom<Vec<u8>> for Thresholds {
    type Error = ThresholdError;

    fn try_from(points: Vec<u8>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<Thresholds> for Vec<u8> {
    fn from(thresholds: Thresholds) -> Self {
        thresholds.points
    }
}
