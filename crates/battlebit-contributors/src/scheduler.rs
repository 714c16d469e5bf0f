//! Background refresh schedule for the contributor cache

use crate::cache::ContributorCache;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

/// Default time between contributor refreshes
pub const DEFAULT_REFRESH_PERIOD: Duration = Duration::from_secs(12 * 60 * 60);

/// Handle to the repeating refresh task.
///
/// The first refresh runs immediately. Dropping the handle without calling
/// [`RefreshScheduler::shutdown`] also stops the schedule.
pub struct RefreshScheduler {
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl RefreshScheduler {
    pub fn spawn(cache: Arc<ContributorCache>, period: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(period_secs = period.as_secs(), "Contributor refresh scheduled");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match cache.refresh().await {
                            Ok(report) => debug!(
                                contributors = report.contributors,
                                failed_sources = report.failed_sources.len(),
                                "Contributor refresh complete"
                            ),
                            Err(e) => error!(error = %e, "Error fetching contributors"),
                        }
                    }
                    _ = &mut shutdown_rx => break,
                }
            }

            info!("Contributor refresh stopped");
        });

        Self {
            shutdown_tx,
            handle,
        }
    }

    /// Cancel the schedule, letting an in-flight refresh finish first
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.handle.await {
            error!(error = %e, "Contributor refresh task panicked");
        }
    }
}
