//! One access log line

use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;
use std::time::Duration;

/// Metadata of one completed request
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub client: String,
    pub method: String,
    /// Path including the query string
    pub path: String,
    pub status: u16,
    /// Response body size in bytes, when known
    pub size: Option<u64>,
    pub duration: Duration,
    pub user_agent: Option<String>,
}

impl LogEntry {
    /// Format as a single space-separated line without trailing newline
    pub fn to_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let size = self
            .size
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());

        write!(
            f,
            "{} {} {} {} {} {} {}ms \"{}\"",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            field(&self.client),
            field(&self.method),
            field(&self.path),
            self.status,
            size,
            self.duration.as_millis(),
            quoted(self.user_agent.as_deref().unwrap_or("-")),
        )
    }
}

/// Unquoted fields must not contain separators
fn field(value: &str) -> String {
    if value.is_empty() {
        return "-".to_string();
    }
    value
        .chars()
        .map(|c| if c.is_whitespace() || c.is_control() { '_' } else { c })
        .collect()
}

fn quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c if c.is_control() => out.push(' '),
            c => out.push(c),
        }
    }
    out
}
