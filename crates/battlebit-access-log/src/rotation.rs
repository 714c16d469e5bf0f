//! Compression and retention of past partitions

use crate::error::Result;
use crate::partition::{Partition, PartitionKind};
use chrono::{Days, NaiveDate};
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info};

/// Default number of days an archive is kept past its date
pub const DEFAULT_RETENTION_DAYS: u64 = 2;

/// What rotation does with past partitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Partitions dated before `today - retention_days` are deleted
    pub retention_days: u64,
    /// Leave the plain file next to its archive after compressing
    pub keep_uncompressed: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            retention_days: DEFAULT_RETENTION_DAYS,
            keep_uncompressed: false,
        }
    }
}

impl RotationPolicy {
    /// First date that is still retained
    pub fn cutoff(&self, today: NaiveDate) -> NaiveDate {
        today
            .checked_sub_days(Days::new(self.retention_days))
            .unwrap_or(NaiveDate::MIN)
    }
}

/// Counts of what one rotation pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RotationReport {
    pub compressed: usize,
    pub removed: usize,
    pub failed: usize,
}

/// Rotate every partition in `dir` relative to `today`.
///
/// Only listing the directory can fail the whole pass; failures on
/// individual files are logged and counted.
pub async fn rotate_dir(dir: &Path, today: NaiveDate, policy: RotationPolicy) -> Result<RotationReport> {
    let cutoff = policy.cutoff(today);
    let mut report = RotationReport::default();

    let mut plain = Vec::new();
    let mut archives = HashSet::new();

    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(partition) = name.to_str().and_then(Partition::parse) else {
            continue;
        };
        match partition.kind {
            PartitionKind::Plain => plain.push(partition.date),
            PartitionKind::Archive => {
                archives.insert(partition.date);
            }
        }
    }
    plain.sort();

    for date in plain {
        if date == today {
            continue;
        }
        let path = dir.join(Partition::plain(date).file_name());

        if !policy.keep_uncompressed && date < cutoff {
            // Past retention already; archiving it would only be deleted below
            remove(&path, &mut report).await;
            continue;
        }

        let archived = archives.contains(&date);
        if archived && policy.keep_uncompressed {
            continue;
        }

        // A plain file next to an existing archive holds lines written after
        // that archive was made; they are folded in rather than dropped
        let archive = dir.join(Partition::archive(date).file_name());
        match compress(&path, &archive, archived).await {
            Ok(()) => {
                info!(partition = %path.display(), merged = archived, "Compressed access log");
                report.compressed += 1;
                archives.insert(date);
            }
            Err(e) => {
                error!(partition = %path.display(), error = %e, "Failed to compress access log");
                report.failed += 1;
                continue;
            }
        }

        if !policy.keep_uncompressed {
            remove(&path, &mut report).await;
        }
    }

    let mut expired: Vec<_> = archives.into_iter().filter(|d| *d < cutoff).collect();
    expired.sort();
    for date in expired {
        let path = dir.join(Partition::archive(date).file_name());
        remove(&path, &mut report).await;
    }

    debug!(
        compressed = report.compressed,
        removed = report.removed,
        failed = report.failed,
        "Access log rotation pass finished"
    );
    Ok(report)
}

async fn remove(path: &Path, report: &mut RotationReport) {
    match fs::remove_file(path).await {
        Ok(()) => {
            info!(partition = %path.display(), "Removed access log");
            report.removed += 1;
        }
        Err(e) => {
            error!(partition = %path.display(), error = %e, "Failed to remove access log");
            report.failed += 1;
        }
    }
}

/// Gzip `source` into `target`, going through a temporary file so a crash
/// never leaves a truncated archive behind. With `merge`, the existing
/// contents of `target` come first.
async fn compress(source: &Path, target: &Path, merge: bool) -> Result<()> {
    let source = source.to_path_buf();
    let target = target.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<()> {
        let tmp = tmp_path(&target);
        let mut input = std::fs::File::open(&source)?;
        let output = std::fs::File::create(&tmp)?;

        let mut encoder = GzEncoder::new(output, Compression::default());
        let written = (|| -> std::io::Result<()> {
            if merge {
                let mut existing = MultiGzDecoder::new(std::fs::File::open(&target)?);
                std::io::copy(&mut existing, &mut encoder)?;
            }
            std::io::copy(&mut input, &mut encoder)?;
            encoder.finish()?.sync_all()
        })();
        if let Err(e) = written {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }

        std::fs::rename(&tmp, &target)?;
        Ok(())
    })
    .await?
}

fn tmp_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
