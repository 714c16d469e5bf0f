//! Queued access log writer

use crate::entry::LogEntry;
use crate::error::Result;
use crate::partition::Partition;
use crate::rotation::{rotate_dir, RotationPolicy, RotationReport};
use chrono::{NaiveDate, Utc};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Notify;
use tracing::{debug, error, info};

/// Default maximum number of lines written per batch
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Appends one line per request to a date-partitioned file.
///
/// `log` only enqueues; lines reach disk on the next `flush`. Lines still
/// queued when the process dies are lost.
pub struct AccessLogger {
    dir: PathBuf,
    batch_size: usize,
    policy: RotationPolicy,
    queue: Mutex<VecDeque<String>>,
    flush_lock: tokio::sync::Mutex<()>,
    pub(crate) wake: Notify,
}

impl AccessLogger {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            policy: RotationPolicy::default(),
            queue: Mutex::new(VecDeque::new()),
            flush_lock: tokio::sync::Mutex::new(()),
            wake: Notify::new(),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_rotation_policy(mut self, policy: RotationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the log directory if needed
    pub async fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;
        info!(log_dir = %self.dir.display(), "Access log initialized");
        Ok(())
    }

    /// Queue a line for the next flush. Never blocks on I/O and never fails.
    pub fn log(&self, entry: &LogEntry) {
        let pending = {
            let mut queue = self.queue();
            queue.push_back(entry.to_line());
            queue.len()
        };

        if pending >= self.batch_size {
            self.wake.notify_one();
        }
    }

    /// Number of lines waiting for a flush
    pub fn pending(&self) -> usize {
        self.queue().len()
    }

    /// Write queued lines into today's (UTC) partition
    pub async fn flush(&self) -> usize {
        self.flush_with(|| Utc::now().date_naive()).await
    }

    /// Write queued lines into the partition for `date`
    pub async fn flush_on(&self, date: NaiveDate) -> usize {
        self.flush_with(move || date).await
    }

    /// Drain the queue batch by batch, resolving the partition per batch.
    ///
    /// Only one flush runs at a time. A call that finds another in progress
    /// returns 0 at once; its lines are picked up by the running flush or
    /// the next one.
    async fn flush_with(&self, today: impl Fn() -> NaiveDate) -> usize {
        let Ok(_guard) = self.flush_lock.try_lock() else {
            debug!("Access log flush already in progress");
            return 0;
        };

        let mut written = 0;
        loop {
            let batch = self.take_batch();
            if batch.is_empty() {
                break;
            }

            let path = self.dir.join(Partition::plain(today()).file_name());
            match append_lines(&path, &batch).await {
                Ok(()) => written += batch.len(),
                Err(e) => error!(
                    partition = %path.display(),
                    lines = batch.len(),
                    error = %e,
                    "Failed to write access log batch, dropping lines"
                ),
            }
        }

        if written > 0 {
            debug!(lines = written, "Flushed access log");
        }
        written
    }

    /// Compress and expire past partitions relative to today's (UTC) date
    pub async fn rotate(&self) -> Result<RotationReport> {
        self.rotate_on(Utc::now().date_naive()).await
    }

    /// Rotate relative to `today`. Holds the flush lock for the whole pass
    /// so no batch is appended to a partition while it is being archived.
    pub async fn rotate_on(&self, today: NaiveDate) -> Result<RotationReport> {
        let _guard = self.flush_lock.lock().await;
        rotate_dir(&self.dir, today, self.policy).await
    }

    fn take_batch(&self) -> Vec<String> {
        let mut queue = self.queue();
        let n = queue.len().min(self.batch_size);
        queue.drain(..n).collect()
    }

    fn queue(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Append a batch with a single write so concurrent readers never see a
/// partial line from this batch
async fn append_lines(path: &Path, lines: &[String]) -> Result<()> {
    let mut buf = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
    for line in lines {
        buf.push_str(line);
        buf.push('\n');
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(buf.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::tempdir;

    fn entry(path: &str) -> LogEntry {
        LogEntry {
            timestamp: Utc::now(),
            client: "127.0.0.1".to_string(),
            method: "GET".to_string(),
            path: path.to_string(),
            status: 200,
            size: Some(10),
            duration: Duration::from_millis(1),
            user_agent: Some("test".to_string()),
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    fn read_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn test_log_only_enqueues() {
        let dir = tempdir().unwrap();
        let logger = AccessLogger::new(dir.path());

        logger.log(&entry("/"));
        logger.log(&entry("/api/contributors"));

        assert_eq!(logger.pending(), 2);
        assert!(!dir.path().join("access-2026-10-19.log").exists());
    }

    #[tokio::test]
    async fn test_flush_appends_in_call_order_after_prior_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("access-2026-10-19.log");
        std::fs::write(&path, "earlier line\n").unwrap();

        let logger = AccessLogger::new(dir.path());
        for i in 0..5 {
            logger.log(&entry(&format!("/page/{}", i)));
        }

        assert_eq!(logger.flush_on(date(19)).await, 5);

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "earlier line");
        for (i, line) in lines[1..].iter().enumerate() {
            assert!(line.contains(&format!(" /page/{} ", i)), "{}", line);
        }
        assert_eq!(logger.pending(), 0);
    }

    #[tokio::test]
    async fn test_flush_drains_in_batches() {
        let dir = tempdir().unwrap();
        let logger = AccessLogger::new(dir.path()).with_batch_size(3);
        for i in 0..7 {
            logger.log(&entry(&format!("/{}", i)));
        }

        assert_eq!(logger.flush_on(date(19)).await, 7);
        assert_eq!(read_lines(&dir.path().join("access-2026-10-19.log")).len(), 7);
    }

    #[tokio::test]
    async fn test_partition_is_chosen_at_flush_time() {
        let dir = tempdir().unwrap();
        let logger = AccessLogger::new(dir.path());

        // Queued "before midnight", flushed "after midnight"
        logger.log(&entry("/late"));
        logger.flush_on(date(20)).await;

        assert!(!dir.path().join("access-2026-10-19.log").exists());
        assert_eq!(read_lines(&dir.path().join("access-2026-10-20.log")).len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_flush_defers_to_running_one() {
        let dir = tempdir().unwrap();
        let logger = AccessLogger::new(dir.path());
        logger.log(&entry("/"));

        let guard = logger.flush_lock.lock().await;
        assert_eq!(logger.flush_on(date(19)).await, 0);
        assert_eq!(logger.pending(), 1);
        drop(guard);

        assert_eq!(logger.flush_on(date(19)).await, 1);
    }

    #[tokio::test]
    async fn test_write_failure_is_not_fatal() {
        let dir = tempdir().unwrap();
        // Log "directory" is a regular file, so every open fails
        let bogus = dir.path().join("not-a-dir");
        std::fs::write(&bogus, "").unwrap();

        let logger = AccessLogger::new(&bogus);
        logger.log(&entry("/"));

        assert_eq!(logger.flush_on(date(19)).await, 0);
        assert_eq!(logger.pending(), 0);
    }

    #[tokio::test]
    async fn test_full_batch_wakes_flusher() {
        let dir = tempdir().unwrap();
        let logger = AccessLogger::new(dir.path()).with_batch_size(2);

        logger.log(&entry("/a"));
        logger.log(&entry("/b"));

        // notify_one stores a permit when nobody is waiting yet
        tokio::time::timeout(Duration::from_secs(1), logger.wake.notified())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_flush_after_midnight_rotation_keeps_lines() {
        use flate2::read::MultiGzDecoder;
        use std::io::Read;

        let dir = tempdir().unwrap();
        let logger = AccessLogger::new(dir.path());

        logger.log(&entry("/before"));
        logger.flush_on(date(18)).await;
        logger.rotate_on(date(19)).await.unwrap();

        // Batch resolved to the 18th before midnight but written after the pass
        logger.log(&entry("/late"));
        logger.flush_on(date(18)).await;
        let report = logger.rotate_on(date(19)).await.unwrap();

        assert_eq!(report.compressed, 1);
        assert!(!dir.path().join("access-2026-10-18.log").exists());

        let mut archived = String::new();
        MultiGzDecoder::new(std::fs::File::open(dir.path().join("access-2026-10-18.log.gz")).unwrap())
            .read_to_string(&mut archived)
            .unwrap();
        let paths: Vec<&str> = archived
            .lines()
            .map(|l| l.split(' ').nth(3).unwrap())
            .collect();
        assert_eq!(paths, vec!["/before", "/late"]);
    }

    #[tokio::test]
    async fn test_rotation_waits_for_running_flush() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("access-2026-10-18.log"), "x\n").unwrap();
        let logger = Arc::new(AccessLogger::new(dir.path()));

        let guard = logger.flush_lock.lock().await;
        let rotation = tokio::spawn({
            let logger = logger.clone();
            async move { logger.rotate_on(date(19)).await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!rotation.is_finished());
        assert!(dir.path().join("access-2026-10-18.log").exists());

        drop(guard);
        let report = rotation.await.unwrap().unwrap();
        assert_eq!(report.compressed, 1);
    }

    #[tokio::test]
    async fn test_rotate_uses_logger_policy() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("access-2026-10-18.log"), "x\n").unwrap();

        let logger = AccessLogger::new(dir.path()).with_rotation_policy(RotationPolicy {
            retention_days: 2,
            keep_uncompressed: true,
        });
        let report = logger.rotate_on(date(19)).await.unwrap();

        assert_eq!(report.compressed, 1);
        assert!(dir.path().join("access-2026-10-18.log").exists());
        assert!(dir.path().join("access-2026-10-18.log.gz").exists());
    }
}
