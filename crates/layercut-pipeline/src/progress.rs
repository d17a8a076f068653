//! Run progress as a percentage plus a phase label, and the indicator
//! that keeps a finished bar on screen briefly before hiding it.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::diagnostics::Clock;

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Resizing, blurring, and computing luminance.
    Preprocessing,
    /// Thresholding and smoothing layer masks; `completed` of `total`
    /// are done.
    Segmenting {
        /// Masks finished so far.
        completed: usize,
        /// Masks the run will produce.
        total: usize,
    },
    /// Averaging masks into the preview.
    Compositing,
    /// Masks and composite are published.
    Done,
}

impl Phase {
    /// Percentage shown for this phase.
    ///
    /// Segmenting spans 10-90% in proportion to completed masks.
    #[must_use]
    pub fn percent(self) -> u8 {
        match self {
            Self::Preprocessing => 0,
            Self::Segmenting { completed, total } => {
                if total == 0 {
                    return 90;
                }
                let share = 80 * completed.min(total) / total;
                10 + u8::try_from(share).unwrap_or(80)
            }
            Self::Compositing => 90,
            Self::Done => 100,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preprocessing => f.write_str("Preprocessing image"),
            Self::Segmenting { completed, total } if completed < total => {
                write!(f, "Generating layer {} of {total}", completed + 1)
            }
            Self::Segmenting { total, .. } => write!(f, "Generated {total} layers"),
            Self::Compositing => f.write_str("Compositing preview"),
            Self::Done => f.write_str("Done"),
        }
    }
}

/// A progress report: percentage plus phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// 0-100.
    pub percent: u8,
    /// Phase the percentage belongs to.
    pub phase: Phase,
}

impl From<Phase> for Progress {
    fn from(phase: Phase) -> Self {
        Self {
            percent: phase.percent(),
            phase,
        }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>3}% {}", self.percent, self.phase)
    }
}

/// Tracks the latest [`Progress`] and decides whether it is visible.
///
/// An indicator becomes visible on the first update. Once a run reports
/// 100% it stays visible for [`linger`](Self::linger) and then hides.
/// Any later update restarts the cycle.
#[derive(Debug)]
pub struct ProgressIndicator<C: Clock> {
    clock: C,
    linger: Duration,
    current: Option<Progress>,
    finished_at: Option<C::Instant>,
}

impl<C: Clock> ProgressIndicator<C> {
    /// How long a completed bar stays up by default.
    pub const DEFAULT_LINGER: Duration = Duration::from_millis(600);

    /// Create a hidden indicator with the default linger.
    pub const fn new(clock: C) -> Self {
        Self::with_linger(clock, Self::DEFAULT_LINGER)
    }

    /// Create a hidden indicator with a custom linger.
    pub const fn with_linger(clock: C, linger: Duration) -> Self {
        Self {
            clock,
            linger,
            current: None,
            finished_at: None,
        }
    }

    /// Configured linger duration.
    #[must_use]
    pub const fn linger(&self) -> Duration {
        self.linger
    }

    /// Record a new report.
    pub fn update(&mut self, progress: Progress) {
        self.finished_at = if progress.percent >= 100 {
            Some(self.clock.now())
        } else {
            None
        };
        self.current = Some(progress);
    }

    /// The report to display, or `None` when hidden.
    #[must_use]
    pub fn visible(&self) -> Option<Progress> {
        let progress = self.current?;
        match &self.finished_at {
            Some(at) if self.clock.elapsed(at) >= self.linger => None,
            _ => Some(progress),
        }
    }

    /// Hide immediately and forget the last report.
    pub fn reset(&mut self) {
        self.current = None;
        self.finished_at = None;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    /// Manually advanced clock, counted in milliseconds.
    #[derive(Debug, Clone, Default)]
    struct FakeClock(Rc<Cell<u64>>);

    impl FakeClock {
        fn advance(&self, ms: u64) {
            self.0.set(self.0.get() + ms);
        }
    }

    impl Clock for FakeClock {
        type Instant = u64;

        fn now(&self) -> u64 {
            self.0.get()
        }

        fn elapsed(&self, since: &u64) -> Duration {
            Duration::from_millis(self.0.get() - since)
        }
    }

    #[test]
    fn phase_percentages() {
        assert_eq!(Phase::Preprocessing.percent(), 0);
        assert_eq!(
            Phase::Segmenting {
                completed: 0,
                total: 4
            }
            .percent(),
            10
        );
        assert_eq!(
            Phase::Segmenting {
                completed: 1,
                total: 4
            }
            .percent(),
            30
        );
        assert_eq!(
            Phase::Segmenting {
                completed: 4,
                total: 4
            }
            .percent(),
            90
        );
        assert_eq!(Phase::Compositing.percent(), 90);
        assert_eq!(Phase::Done.percent(), 100);
    }

    #[test]
    fn segmenting_percent_rounds_down() {
        let p = Phase::Segmenting {
            completed: 1,
            total: 3,
        };
        assert_eq!(p.percent(), 36);
    }

    #[test]
    fn labels() {
        assert_eq!(Phase::Preprocessing.to_string(), "Preprocessing image");
        assert_eq!(
            Phase::Segmenting {
                completed: 1,
                total: 3
            }
            .to_string(),
            "Generating layer 2 of 3"
        );
        assert_eq!(Phase::Done.to_string(), "Done");
        assert_eq!(Progress::from(Phase::Compositing).to_string(), " 90% Compositing preview");
    }

    #[test]
    fn hidden_until_first_update() {
        let indicator = ProgressIndicator::new(FakeClock::default());
        assert_eq!(indicator.visible(), None);
    }

    #[test]
    fn in_progress_stays_visible() {
        let clock = FakeClock::default();
        let mut indicator = ProgressIndicator::new(clock.clone());
        indicator.update(Phase::Compositing.into());
        clock.advance(10_000);
        assert_eq!(indicator.visible(), Some(Phase::Compositing.into()));
    }

    #[test]
    fn done_lingers_then_hides() {
        let clock = FakeClock::default();
        let mut indicator = ProgressIndicator::new(clock.clone());
        indicator.update(Phase::Done.into());

        clock.advance(599);
        assert_eq!(indicator.visible(), Some(Phase::Done.into()));

        clock.advance(1);
        assert_eq!(indicator.visible(), None);
    }

    #[test]
    fn new_run_after_done_restarts_visibility() {
        let clock = FakeClock::default();
        let mut indicator =
            ProgressIndicator::with_linger(clock.clone(), Duration::from_millis(50));
        indicator.update(Phase::Done.into());
        clock.advance(100);
        assert_eq!(indicator.visible(), None);

        indicator.update(Phase::Preprocessing.into());
        assert_eq!(indicator.visible(), Some(Phase::Preprocessing.into()));
    }

    #[test]
    fn reset_hides_immediately() {
        let mut indicator = ProgressIndicator::new(FakeClock::default());
        indicator.update(Phase::Preprocessing.into());
        indicator.reset();
        assert_eq!(indicator.visible(), None);
    }
}
