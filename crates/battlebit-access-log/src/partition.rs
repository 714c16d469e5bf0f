//! Date partition naming: `access-YYYY-MM-DD.log` and its `.gz` archive

use crate::error::{AccessLogError, Result};
use chrono::NaiveDate;
use std::path::Path;

const PREFIX: &str = "access-";
const PLAIN_SUFFIX: &str = ".log";
const ARCHIVE_SUFFIX: &str = ".log.gz";
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartitionKind {
    /// Plain text, appended to while its date is current
    Plain,
    /// Gzip-compressed, read-only
    Archive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Partition {
    pub date: NaiveDate,
    pub kind: PartitionKind,
}

impl Partition {
    pub fn plain(date: NaiveDate) -> Self {
        Self {
            date,
            kind: PartitionKind::Plain,
        }
    }

    pub fn archive(date: NaiveDate) -> Self {
        Self {
            date,
            kind: PartitionKind::Archive,
        }
    }

    pub fn file_name(&self) -> String {
        let suffix = match self.kind {
            PartitionKind::Plain => PLAIN_SUFFIX,
            PartitionKind::Archive => ARCHIVE_SUFFIX,
        };
        format!("{}{}{}", PREFIX, self.date.format(DATE_FORMAT), suffix)
    }

    /// Parse a partition from a file name, `None` for unrelated files
    pub fn parse(file_name: &str) -> Option<Self> {
        let rest = file_name.strip_prefix(PREFIX)?;
        let (date, kind) = if let Some(date) = rest.strip_suffix(ARCHIVE_SUFFIX) {
            (date, PartitionKind::Archive)
        } else {
            (rest.strip_suffix(PLAIN_SUFFIX)?, PartitionKind::Plain)
        };

        // Reject zero-padding variants so names round-trip exactly
        if date.len() != 10 {
            return None;
        }
        let date = NaiveDate::parse_from_str(date, DATE_FORMAT).ok()?;
        Some(Self { date, kind })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        path.file_name()
            .and_then(|n| n.to_str())
            .and_then(Self::parse)
            .ok_or_else(|| AccessLogError::InvalidPartition(path.to_path_buf()))
    }
}
