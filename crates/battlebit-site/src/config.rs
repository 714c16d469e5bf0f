use crate::constants::*;
use crate::error::{Result, SiteError};
use battlebit_access_log::{RotationPolicy, DEFAULT_RETENTION_DAYS};
use battlebit_contributors::{DEFAULT_AVATAR_BASE_URL, DEFAULT_GITHUB_API_URL};
use serde::Serialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// How static files are served
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteMode {
    /// Built assets from the dist directory with SPA fallback
    Production,
    /// Raw public and source files, short-lived caching
    Development,
}

impl FromStr for SiteMode {
    type Err = SiteError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" | "serve" => Ok(SiteMode::Production),
            "development" | "dev" => Ok(SiteMode::Development),
            other => Err(SiteError::Config(format!("unknown SITE_MODE: {}", other))),
        }
    }
}

/// Upstream GitHub settings for the contributor cache
#[derive(Debug, Clone)]
pub struct GithubConfig {
    pub api_url: String,
    pub org: String,
    pub repos: Vec<String>,
    pub token: Option<String>,
    pub excluded: Vec<String>,
    pub team_avatars: Vec<String>,
    pub avatar_base_url: String,
    pub refresh_period: Duration,
    pub timeout: Duration,
}

/// Access log settings
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub dir: PathBuf,
    pub flush_interval: Duration,
    pub rotate_interval: Duration,
    pub rotation: RotationPolicy,
}

/// Application configuration parsed from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: SiteMode,
    pub port: u16,
    pub dist_dir: PathBuf,
    pub public_dir: PathBuf,
    pub source_dir: PathBuf,
    pub github: GithubConfig,
    pub log: LogConfig,
}

impl Config {
    /// Parse configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Parse configuration from any key lookup
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mode = match get("SITE_MODE") {
            Some(mode) => mode.parse()?,
            None if get("NODE_ENV").as_deref() == Some("development") => SiteMode::Development,
            None => SiteMode::Production,
        };

        let default_port = match mode {
            SiteMode::Production => DEFAULT_PRODUCTION_PORT,
            SiteMode::Development => DEFAULT_DEVELOPMENT_PORT,
        };
        let port = parse_or(&get, "PORT", default_port)?;

        let path_or = |key: &str, default: &str| {
            get(key)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(default))
        };

        let github = GithubConfig {
            api_url: get("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
            org: get("GITHUB_ORG").unwrap_or_else(|| DEFAULT_GITHUB_ORG.to_string()),
            repos: list_or(&get, "GITHUB_REPOS", DEFAULT_GITHUB_REPOS),
            token: get("GITHUB_TOKEN").filter(|t| !t.trim().is_empty()),
            excluded: list_or(&get, "EXCLUDED_CONTRIBUTORS", DEFAULT_EXCLUDED_CONTRIBUTORS),
            team_avatars: list_or(&get, "TEAM_AVATARS", DEFAULT_TEAM_AVATARS),
            avatar_base_url: get("AVATAR_BASE_URL")
                .unwrap_or_else(|| DEFAULT_AVATAR_BASE_URL.to_string()),
            refresh_period: Duration::from_secs(parse_or(
                &get,
                "CONTRIBUTOR_REFRESH_SECS",
                DEFAULT_REFRESH_SECS,
            )?),
            timeout: Duration::from_secs(parse_or(
                &get,
                "UPSTREAM_TIMEOUT_SECS",
                DEFAULT_UPSTREAM_TIMEOUT_SECS,
            )?),
        };

        if github.refresh_period.is_zero() {
            return Err(SiteError::Config(
                "CONTRIBUTOR_REFRESH_SECS must be greater than 0".to_string(),
            ));
        }

        let log = LogConfig {
            dir: path_or("LOG_DIR", "./logs"),
            flush_interval: Duration::from_millis(parse_or(
                &get,
                "LOG_FLUSH_MILLIS",
                DEFAULT_LOG_FLUSH_MILLIS,
            )?),
            rotate_interval: Duration::from_secs(parse_or(
                &get,
                "LOG_ROTATE_SECS",
                DEFAULT_LOG_ROTATE_SECS,
            )?),
            rotation: RotationPolicy {
                retention_days: parse_or(&get, "LOG_RETENTION_DAYS", DEFAULT_RETENTION_DAYS)?,
                keep_uncompressed: parse_or(&get, "LOG_KEEP_UNCOMPRESSED", false)?,
            },
        };

        if log.flush_interval.is_zero() || log.rotate_interval.is_zero() {
            return Err(SiteError::Config(
                "LOG_FLUSH_MILLIS and LOG_ROTATE_SECS must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            mode,
            port,
            dist_dir: path_or("DIST_DIR", "./dist"),
            public_dir: path_or("PUBLIC_DIR", "./public"),
            source_dir: path_or("SOURCE_DIR", "."),
            github,
            log,
        })
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| SiteError::Config(format!("invalid {} ({:?}): {}", key, raw, e))),
        None => Ok(default),
    }
}

fn list_or(get: &impl Fn(&str) -> Option<String>, key: &str, default: &[&str]) -> Vec<String> {
    match get(key) {
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        None => default.iter().map(|s| s.to_string()).collect(),
    }
}
