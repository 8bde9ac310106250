// crates/nexus-daemon/src/scheduler.rs
//
// Periodic task scheduler for the NexusLink daemon.
//
// Each registered task runs on its own tokio task and interval. A shared
// watch channel carries the stop signal; a tick in progress is allowed to
// finish before its loop exits. Tick errors are logged and swallowed so one
// bad iteration never stops the simulation.

use std::sync::Arc;
use std::time::Duration;

use nexus_core::PeriodicTask;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Smallest interval a task may run at; zero would panic in `tokio::time::interval`.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Collects periodic tasks and starts them together.
pub struct TaskScheduler {
    tasks: Vec<(Arc<dyn PeriodicTask>, Duration)>,
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Register a task to run every `interval`.
    pub fn add(&mut self, task: Arc<dyn PeriodicTask>, interval: Duration) -> &mut Self {
        self.tasks.push((task, interval.max(MIN_INTERVAL)));
        self
    }

    /// Number of registered tasks.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Spawn every registered task. The first tick of each fires immediately.
    pub fn start(self) -> TaskHandle {
        let (stop_tx, stop_rx) = watch::channel(false);

        let joins = self
            .tasks
            .into_iter()
            .map(|(task, interval)| {
                tracing::info!(
                    "Starting periodic task {} (every {:?})",
                    task.name(),
                    interval
                );
                tokio::spawn(run_task(task, interval, stop_rx.clone()))
            })
            .collect();

        TaskHandle { stop_tx, joins }
    }
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Running tasks plus the means to stop them.
pub struct TaskHandle {
    stop_tx: watch::Sender<bool>,
    joins: Vec<JoinHandle<()>>,
}

impl TaskHandle {
    /// Signal every task to stop and wait for their loops to exit.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        for join in self.joins {
            if let Err(e) = join.await {
                tracing::warn!("Periodic task ended abnormally: {}", e);
            }
        }
        tracing::info!("Periodic tasks stopped");
    }
}

async fn run_task(
    task: Arc<dyn PeriodicTask>,
    interval: Duration,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                if let Err(e) = task.tick().await {
                    tracing::warn!("Periodic task {} failed: {}", task.name(), e);
                }
            }
        }
    }

    tracing::debug!("Periodic task {} exited", task.name());
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nexus_core::NexusError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTask {
        ticks: AtomicUsize,
        fail: bool,
    }

    impl CountingTask {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                ticks: AtomicUsize::new(0),
                fail,
            })
        }

        fn ticks(&self) -> usize {
            self.ticks.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PeriodicTask for CountingTask {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn tick(&self) -> Result<(), NexusError> {
            self.ticks.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(NexusError::Consensus("tick failed".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_tasks_tick_until_stopped() {
        let task = CountingTask::new(false);
        let mut scheduler = TaskScheduler::new();
        scheduler.add(task.clone(), Duration::from_millis(10));
        assert_eq!(scheduler.task_count(), 1);

        let handle = scheduler.start();
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.stop().await;

        let after_stop = task.ticks();
        assert!(after_stop >= 2, "expected several ticks, got {}", after_stop);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(task.ticks(), after_stop);
    }

    #[tokio::test]
    async fn test_errors_do_not_stop_the_task() {
        let task = CountingTask::new(true);
        let mut scheduler = TaskScheduler::new();
        scheduler.add(task.clone(), Duration::from_millis(10));

        let handle = scheduler.start();
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.stop().await;

        assert!(task.ticks() >= 2);
    }

    #[tokio::test]
    async fn test_first_tick_is_immediate() {
        let task = CountingTask::new(false);
        let mut scheduler = TaskScheduler::new();
        scheduler.add(task.clone(), Duration::from_secs(3600));

        let handle = scheduler.start();
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.stop().await;

        assert_eq!(task.ticks(), 1);
    }

    #[tokio::test]
    async fn test_zero_interval_is_clamped() {
        let task = CountingTask::new(false);
        let mut scheduler = TaskScheduler::new();
        scheduler.add(task.clone(), Duration::ZERO);

        let handle = scheduler.start();
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.stop().await;

        assert!(task.ticks() >= 1);
    }

    #[tokio::test]
    async fn test_stop_with_no_tasks() {
        let handle = TaskScheduler::default().start();
        handle.stop().await;
    }
}
