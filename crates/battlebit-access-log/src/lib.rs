//! Access log for the BattleBit community site
//!
//! Requests are queued in memory and appended in batches to one file per
//! UTC date (`access-YYYY-MM-DD.log`). Past days are gzipped and removed
//! once they fall outside the retention window.

mod background;
mod entry;
mod error;
mod logger;
mod partition;
mod rotation;

pub use background::{LoggerTasks, DEFAULT_FLUSH_INTERVAL, DEFAULT_ROTATE_INTERVAL};
pub use entry::LogEntry;
pub use error::{AccessLogError, Result};
pub use logger::{AccessLogger, DEFAULT_BATCH_SIZE};
pub use partition::{Partition, PartitionKind};
pub use rotation::{rotate_dir, RotationPolicy, RotationReport, DEFAULT_RETENTION_DAYS};
