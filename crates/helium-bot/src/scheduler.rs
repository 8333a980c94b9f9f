//! Timer queue for deferred strategy tasks.

use std::time::Duration;

use futures_util::StreamExt;
use helium_mm::{TimerScheduler, TimerTask};
use tokio_util::time::DelayQueue;
use tracing::debug;

/// "Run at time T" queue driven by the application loop.
#[derive(Debug, Default)]
pub struct Scheduler {
    queue: DelayQueue<TimerTask>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Next expired task; `None` immediately when nothing is scheduled.
    pub async fn next_task(&mut self) -> Option<TimerTask> {
        self.queue.next().await.map(|expired| expired.into_inner())
    }
}

impl TimerScheduler for Scheduler {
    fn run_after(&mut self, delay: Duration, task: TimerTask) {
        debug!(?task, delay_ms = delay.as_millis() as u64, "Task scheduled");
        self.queue.insert(task, delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tasks_expire_in_deadline_order() {
        let mut scheduler = Scheduler::new();
        scheduler.run_after(Duration::from_millis(30), TimerTask::ComputePnl);
        scheduler.run_after(Duration::from_millis(5), TimerTask::Enable);
        assert_eq!(scheduler.len(), 2);

        assert_eq!(scheduler.next_task().await, Some(TimerTask::Enable));
        assert_eq!(scheduler.next_task().await, Some(TimerTask::ComputePnl));
        assert!(scheduler.is_empty());
    }

    #[tokio::test]
    async fn test_empty_queue_yields_none() {
        let mut scheduler = Scheduler::new();
        assert_eq!(scheduler.next_task().await, None);
    }
}
