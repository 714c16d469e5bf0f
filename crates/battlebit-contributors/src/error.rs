//! Error types for contributor and avatar fetching

use std::fmt;

/// Errors that can occur while talking to an upstream source
#[derive(Debug)]
pub enum ContributorError {
    /// Request could not be sent or its body not read (includes timeouts)
    Http(reqwest::Error),
    /// Upstream answered with a non-success status
    Status { source: String, status: u16 },
    /// Upstream payload could not be decoded
    Decode(String),
}

impl ContributorError {
    /// Whether the failure only affects the source that produced it.
    ///
    /// Source-local failures skip that source for the current cycle;
    /// anything else aborts the whole aggregation.
    pub fn is_source_local(&self) -> bool {
        match self {
            Self::Http(_) | Self::Status { .. } => true,
            Self::Decode(_) => false,
        }
    }
}

impl fmt::Display for ContributorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "HTTP error: {}", e),
            Self::Status { source, status } => {
                write!(f, "{} returned status {}", source, status)
            }
            Self::Decode(msg) => write!(f, "Decode error: {}", msg),
        }
    }
}

impl std::error::Error for ContributorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            _ => None,
        }
    }
}

/// Payloads are decoded with serde_json, so every reqwest failure is a
/// transport failure, including a timeout while the body is streaming.
impl From<reqwest::Error> for ContributorError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

impl From<serde_json::Error> for ContributorError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

/// Result type for contributor operations
pub type Result<T> = std::result::Result<T, ContributorError>;
