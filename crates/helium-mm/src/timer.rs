//! Deferred strategy tasks.
//!
//! The strategy never sleeps; it asks the runtime to call it back later.

use std::time::Duration;

/// Work the runtime runs on the strategy's behalf after a delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerTask {
    /// End of warm-up: enable quoting.
    Enable,
    /// Recompute profit/loss.
    ComputePnl,
}

/// "Run at time T" primitive provided by the runtime.
pub trait TimerScheduler {
    fn run_after(&mut self, delay: Duration, task: TimerTask);
}

/// Collects scheduled tasks without running them.
///
/// Used where no runtime exists yet, and in tests.
#[derive(Debug, Default)]
pub struct RecordingScheduler {
    pub scheduled: Vec<(Duration, TimerTask)>,
}

impl TimerScheduler for RecordingScheduler {
    fn run_after(&mut self, delay: Duration, task: TimerTask) {
        self.scheduled.push((delay, task));
    }
}
