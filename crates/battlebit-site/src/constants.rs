// --- Upstream sources ---

/// GitHub organization whose repositories list the contributors.
pub const DEFAULT_GITHUB_ORG: &str = "BattleBit-Community-Servers";

/// Repositories aggregated, in priority order (first occurrence of a login wins).
pub const DEFAULT_GITHUB_REPOS: &[&str] =
    &["BattleBitAPIRunner", "BBModules-Backend", "BBModules-Frontend"];

/// Logins never shown on the site.
pub const DEFAULT_EXCLUDED_CONTRIBUTORS: &[&str] = &["JellisyWoes", "RainOrigami"];

/// Team member avatars pre-warmed alongside contributor avatars.
pub const DEFAULT_TEAM_AVATARS: &[&str] = &[
    "https://avatars.githubusercontent.com/u/35661279?v=4",
    "https://avatars.githubusercontent.com/u/51454971?v=4",
];

/// Timeout applied to every upstream request, in seconds.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

/// Time between contributor refreshes, in seconds (12 hours).
pub const DEFAULT_REFRESH_SECS: u64 = 12 * 60 * 60;

// --- Ports ---

pub const DEFAULT_PRODUCTION_PORT: u16 = 3100;
pub const DEFAULT_DEVELOPMENT_PORT: u16 = 6969;

// --- Access log ---

/// Time between access log flushes, in milliseconds.
pub const DEFAULT_LOG_FLUSH_MILLIS: u64 = 1000;

/// Time between access log rotation passes, in seconds (6 hours).
pub const DEFAULT_LOG_ROTATE_SECS: u64 = 6 * 60 * 60;

// --- Response caching ---

/// Cache-Control for proxied avatars.
pub const AVATAR_CACHE_CONTROL: &str = "public, max-age=86400";

/// Cache-Control for fingerprinted or rarely changing static assets.
pub const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Cache-Control for stylesheets served in development.
pub const DEV_CSS_CACHE_CONTROL: &str = "public, max-age=3600";
