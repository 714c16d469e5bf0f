//! Error types for the access log writer

use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum AccessLogError {
    Io(std::io::Error),
    /// A blocking compression task did not complete
    Task(String),
    /// File name does not follow the `access-YYYY-MM-DD.log` layout
    InvalidPartition(PathBuf),
}

impl fmt::Display for AccessLogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessLogError::Io(err) => write!(f, "IO error: {}", err),
            AccessLogError::Task(msg) => write!(f, "Background task error: {}", msg),
            AccessLogError::InvalidPartition(path) => {
                write!(f, "Not an access log partition: {}", path.display())
            }
        }
    }
}

impl std::error::Error for AccessLogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AccessLogError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for AccessLogError {
    fn from(err: std::io::Error) -> Self {
        AccessLogError::Io(err)
    }
}

impl From<tokio::task::JoinError> for AccessLogError {
    fn from(err: tokio::task::JoinError) -> Self {
        AccessLogError::Task(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AccessLogError>;
