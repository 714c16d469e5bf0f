//! Error types for the site server

use std::fmt;

#[derive(Debug)]
pub enum SiteError {
    Config(String),
    Io(Box<std::io::Error>),
    AccessLog(battlebit_access_log::AccessLogError),
}

impl fmt::Display for SiteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteError::Config(msg) => write!(f, "Configuration error: {}", msg),
            SiteError::Io(err) => write!(f, "IO error: {}", err),
            SiteError::AccessLog(err) => write!(f, "Access log error: {}", err),
        }
    }
}

impl std::error::Error for SiteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SiteError::Io(err) => Some(err.as_ref()),
            SiteError::AccessLog(err) => Some(err),
            SiteError::Config(_) => None,
        }
    }
}

impl From<std::io::Error> for SiteError {
    fn from(err: std::io::Error) -> Self {
        SiteError::Io(Box::new(err))
    }
}

impl From<battlebit_access_log::AccessLogError> for SiteError {
    fn from(err: battlebit_access_log::AccessLogError) -> Self {
        SiteError::AccessLog(err)
    }
}

impl From<tracing_subscriber::filter::ParseError> for SiteError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        SiteError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SiteError>;
