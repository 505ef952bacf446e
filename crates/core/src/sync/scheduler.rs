//! Background scheduler for periodic wallet sync.
//!
//! The scheduler is an ordinary value owned by the host. It can be started,
//! stopped and reconfigured at runtime; nothing about it is process-global.

use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

use super::sync_model::{SyncError, SyncSummary};
use super::sync_traits::SyncJob;
use crate::constants::MAX_SYNC_INTERVAL_HOURS;
use crate::errors::{Error, Result};

/// Converts a configured interval in hours into a scheduler period.
pub fn interval_from_hours(hours: u64) -> Result<Duration> {
    if hours == 0 {
        return Err(Error::InvalidConfigValue(
            "Sync interval must be at least one hour".to_string(),
        ));
    }
    if hours > MAX_SYNC_INTERVAL_HOURS {
        return Err(Error::InvalidConfigValue(format!(
            "Sync interval must be at most {} hours",
            MAX_SYNC_INTERVAL_HOURS
        )));
    }
    hours
        .checked_mul(60 * 60)
        .map(Duration::from_secs)
        .ok_or_else(|| Error::InvalidConfigValue(format!("Sync interval of {} hours overflows", hours)))
}

struct RunningTask {
    period: Duration,
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Runs a [`SyncJob`] every `period` on a spawned tokio task.
///
/// The first run happens one full period after `start`; use
/// [`SyncScheduler::trigger_now`] for an immediate run.
pub struct SyncScheduler {
    job: Arc<dyn SyncJob>,
    running: Mutex<Option<RunningTask>>,
}

impl SyncScheduler {
    pub fn new(job: Arc<dyn SyncJob>) -> Self {
        Self {
            job,
            running: Mutex::new(None),
        }
    }

    pub async fn start(&self, period: Duration) -> Result<()> {
        validate_period(period)?;

        let mut running = self.running.lock().await;
        if running.is_some() {
            return Err(SyncError::AlreadyRunning.into());
        }

        *running = Some(self.spawn(period));
        info!("Sync scheduler started ({:?} interval)", period);
        Ok(())
    }

    pub async fn stop(&self) -> Result<()> {
        let task = self
            .running
            .lock()
            .await
            .take()
            .ok_or(SyncError::NotRunning)?;

        shutdown(task).await;
        info!("Sync scheduler stopped");
        Ok(())
    }

    /// Restarts the running scheduler with a new period.
    pub async fn reconfigure(&self, period: Duration) -> Result<()> {
        validate_period(period)?;

        let mut running = self.running.lock().await;
        let task = running.take().ok_or(SyncError::NotRunning)?;
        let previous = task.period;
        shutdown(task).await;

        *running = Some(self.spawn(period));
        info!(
            "Sync scheduler reconfigured from {:?} to {:?}",
            previous, period
        );
        Ok(())
    }

    /// Runs the job once, immediately, outside the schedule.
    pub async fn trigger_now(&self) -> Result<SyncSummary> {
        debug!("Manual sync triggered");
        self.job.run().await
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    pub async fn current_interval(&self) -> Option<Duration> {
        self.running.lock().await.as_ref().map(|task| task.period)
    }

    fn spawn(&self, period: Duration) -> RunningTask {
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(run_loop(self.job.clone(), period, stop_rx));
        RunningTask {
            period,
            stop_tx,
            handle,
        }
    }
}

fn validate_period(period: Duration) -> Result<()> {
    if period.is_zero() {
        return Err(Error::InvalidConfigValue(
            "Sync interval must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

async fn shutdown(task: RunningTask) {
    // The loop may already have exited; a closed channel is fine.
    let _ = task.stop_tx.send(true);
    if let Err(e) = task.handle.await {
        warn!("Sync scheduler task ended abnormally: {}", e);
    }
}

async fn run_loop(job: Arc<dyn SyncJob>, period: Duration, mut stop_rx: watch::Receiver<bool>) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => run_scheduled_sync(job.as_ref()).await,
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
        }
    }
}

async fn run_scheduled_sync(job: &dyn SyncJob) {
    info!("Running scheduled wallet sync...");
    match job.run().await {
        Ok(summary) => info!(
            "Scheduled wallet sync completed: {} synced, {} failed",
            summary.success, summary.failed
        ),
        Err(e) => warn!("Scheduled wallet sync failed: {}", e),
    }
}
