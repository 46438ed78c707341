use crate::Outcome;
use std::time::Duration;

/// Passes are re-triggered on a flat interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(3);

/// Decides when a workspace is reconciled again.
///
/// A single pass only makes one step of progress (or corrects drift once), so
/// the controller keeps re-invoking itself on a fixed cadence. Errors use the
/// same interval as successful passes; there is no backoff.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Leveling {
    interval: Duration,
}

impl Default for Leveling {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

impl Leveling {
    pub const fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the delay before the next pass, or `None` when the next pass
    /// should wait for the workspace to change.
    pub fn after(&self, outcome: &Outcome) -> Option<Duration> {
        match outcome {
            Outcome::Absent => None,
            Outcome::Created(_) | Outcome::Converged { .. } => Some(self.interval),
        }
    }

    pub fn after_error(&self) -> Duration {
        self.interval
    }
}
