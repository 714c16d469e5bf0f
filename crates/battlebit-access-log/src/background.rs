//! Background flush and rotation tasks

use crate::logger::AccessLogger;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

/// Default time between queue flushes
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(1);

/// Default time between rotation passes
pub const DEFAULT_ROTATE_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);

/// Handles to the flusher and rotator tasks of one logger
pub struct LoggerTasks {
    logger: Arc<AccessLogger>,
    shutdown_tx: watch::Sender<bool>,
    flusher: JoinHandle<()>,
    rotator: JoinHandle<()>,
}

impl AccessLogger {
    /// Start flushing every `flush_every` (or as soon as a batch fills up)
    /// and rotating once now and then every `rotate_every`
    pub fn spawn_background(
        self: &Arc<Self>,
        flush_every: Duration,
        rotate_every: Duration,
    ) -> LoggerTasks {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let flusher = {
            let logger = self.clone();
            let mut shutdown_rx = shutdown_rx.clone();
            tokio::spawn(async move {
                let mut ticker = interval(flush_every);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {}
                        _ = logger.wake.notified() => {}
                        _ = shutdown_rx.changed() => break,
                    }
                    logger.flush().await;
                }
            })
        };

        let rotator = {
            let logger = self.clone();
            let mut shutdown_rx = shutdown_rx;
            tokio::spawn(async move {
                let mut ticker = interval(rotate_every);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            if let Err(e) = logger.rotate().await {
                                error!(log_dir = %logger.dir().display(), error = %e, "Access log rotation failed");
                            }
                        }
                        _ = shutdown_rx.changed() => break,
                    }
                }
            })
        };

        info!(
            flush_ms = flush_every.as_millis() as u64,
            rotate_secs = rotate_every.as_secs(),
            "Access log background tasks started"
        );

        LoggerTasks {
            logger: self.clone(),
            shutdown_tx,
            flusher,
            rotator,
        }
    }
}

impl LoggerTasks {
    /// Stop both tasks and write out whatever is still queued
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        for (name, task) in [("flusher", self.flusher), ("rotator", self.rotator)] {
            if let Err(e) = task.await {
                error!(task = name, error = %e, "Access log task panicked");
            }
        }

        let written = self.logger.flush().await;
        info!(lines = written, "Access log stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::LogEntry;
    use crate::partition::Partition;
    use chrono::{Days, Utc};
    use tempfile::tempdir;

    fn entry(path: &str) -> LogEntry {
        LogEntry {
            timestamp: Utc::now(),
            client: "127.0.0.1".to_string(),
            method: "GET".to_string(),
            path: path.to_string(),
            status: 404,
            size: None,
            duration: Duration::from_millis(2),
            user_agent: None,
        }
    }

    fn today_partition(dir: &std::path::Path) -> std::path::PathBuf {
        dir.join(Partition::plain(Utc::now().date_naive()).file_name())
    }

    #[tokio::test]
    async fn test_periodic_flush_writes_lines() {
        let dir = tempdir().unwrap();
        let logger = Arc::new(AccessLogger::new(dir.path()));
        let tasks = logger.spawn_background(Duration::from_millis(20), DEFAULT_ROTATE_INTERVAL);

        logger.log(&entry("/one"));
        logger.log(&entry("/two"));

        let mut flushed = false;
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            if logger.pending() == 0 && today_partition(dir.path()).exists() {
                flushed = true;
                break;
            }
        }
        tasks.shutdown().await;

        assert!(flushed);
        let contents = std::fs::read_to_string(today_partition(dir.path())).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_shutdown_flushes_remaining_lines() {
        let dir = tempdir().unwrap();
        let logger = Arc::new(AccessLogger::new(dir.path()));
        // Flush interval long enough that only the shutdown flush runs
        let tasks = logger.spawn_background(Duration::from_secs(3600), DEFAULT_ROTATE_INTERVAL);
        tokio::time::sleep(Duration::from_millis(50)).await;

        for i in 0..3 {
            logger.log(&entry(&format!("/{}", i)));
        }
        tasks.shutdown().await;

        assert_eq!(logger.pending(), 0);
        let contents = std::fs::read_to_string(today_partition(dir.path())).unwrap();
        assert_eq!(contents.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_rotation_runs_at_startup() {
        let dir = tempdir().unwrap();
        let yesterday = Utc::now()
            .date_naive()
            .checked_sub_days(Days::new(1))
            .unwrap();
        std::fs::write(dir.path().join(Partition::plain(yesterday).file_name()), "y\n").unwrap();
        let archive = dir.path().join(Partition::archive(yesterday).file_name());

        let logger = Arc::new(AccessLogger::new(dir.path()));
        let tasks = logger.spawn_background(DEFAULT_FLUSH_INTERVAL, DEFAULT_ROTATE_INTERVAL);

        let mut archived = false;
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            if archive.exists() {
                archived = true;
                break;
            }
        }
        tasks.shutdown().await;

        assert!(archived);
    }
}
