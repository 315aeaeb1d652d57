//! Fixed-interval scheduler driving the RSI monitor

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::core::clock::Sleeper;
use crate::core::cycle::{CycleOutcome, RsiMonitor};

/// Runs one cycle, then waits the full poll interval before the next.
/// Cycles never overlap.
pub struct PollScheduler {
    monitor: Arc<RsiMonitor>,
    interval: Duration,
    sleeper: Arc<dyn Sleeper>,
    handle: Arc<RwLock<Option<tokio::task::JoinHandle<()>>>>,
}

impl PollScheduler {
    pub fn new(monitor: Arc<RsiMonitor>, interval: Duration, sleeper: Arc<dyn Sleeper>) -> Self {
        info!(
            interval_secs = interval.as_secs(),
            symbol = %monitor.config().symbol,
            "PollScheduler: created with interval {}s",
            interval.as_secs()
        );
        Self {
            monitor,
            interval,
            sleeper,
            handle: Arc::new(RwLock::new(None)),
        }
    }

    /// Run exactly `cycles` cycles in the current task, sleeping between them
    pub async fn run_for(&self, cycles: usize) -> Vec<Option<CycleOutcome>> {
        let mut outcomes = Vec::with_capacity(cycles);
        for i in 0..cycles {
            if i > 0 {
                self.sleeper.sleep(self.interval).await;
            }
            outcomes.push(self.monitor.tick().await);
        }
        outcomes
    }

    /// Start the polling loop in the background
    pub async fn start(&self) {
        let monitor = self.monitor.clone();
        let sleeper = self.sleeper.clone();
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            info!("PollScheduler: started");
            loop {
                let outcome = monitor.tick().await;
                debug!(outcome = ?outcome, "PollScheduler: cycle complete, sleeping {}s", interval.as_secs());
                sleeper.sleep(interval).await;
            }
        });

        let mut h = self.handle.write().await;
        if let Some(previous) = h.replace(handle) {
            previous.abort();
        }
    }

    /// Stop the polling loop
    pub async fn stop(&self) {
        let mut handle = self.handle.write().await;
        if let Some(h) = handle.take() {
            h.abort();
            info!("PollScheduler: stopped");
        }
    }

    /// Check if the scheduler is running
    pub async fn is_running(&self) -> bool {
        let handle = self.handle.read().await;
        handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}
