//! Response types for the site server

use battlebit_contributors::AvatarStats;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::SiteMode;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub mode: SiteMode,
    pub uptime_secs: u64,
    pub contributors: usize,
    pub last_refresh: Option<DateTime<Utc>>,
    pub avatars: AvatarStats,
}
