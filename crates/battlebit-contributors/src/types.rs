//! Contributor and cache statistics types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A contributor as returned by the GitHub contributors endpoint.
///
/// Only the fields the site renders are kept; everything else in the
/// upstream payload is ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub login: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub contributions: u64,
}

impl Contributor {
    /// Numeric GitHub user id embedded in the avatar URL (`.../u/{id}?v=4`)
    pub fn avatar_id(&self) -> Option<&str> {
        let (_, rest) = self.avatar_url.split_once("/u/")?;
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let id = &rest[..end];
        (!id.is_empty()).then_some(id)
    }
}

/// Outcome of one successful refresh cycle
#[derive(Debug, Clone, Default, Serialize)]
pub struct RefreshReport {
    pub contributors: usize,
    pub failed_sources: Vec<String>,
    pub avatars_warmed: usize,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Statistics about the avatar cache
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AvatarStats {
    pub entries: u64,
    pub hits: u64,
    pub misses: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contributor(avatar_url: &str) -> Contributor {
        Contributor {
            login: "octocat".to_string(),
            html_url: "https://github.com/octocat".to_string(),
            avatar_url: avatar_url.to_string(),
            contributions: 3,
        }
    }

    #[test]
    fn test_avatar_id_from_github_url() {
        let c = contributor("https://avatars.githubusercontent.com/u/35661279?v=4");
        assert_eq!(c.avatar_id(), Some("35661279"));
    }

    #[test]
    fn test_avatar_id_without_query() {
        let c = contributor("https://avatars.githubusercontent.com/u/42");
        assert_eq!(c.avatar_id(), Some("42"));
    }

    #[test]
    fn test_avatar_id_missing() {
        assert_eq!(contributor("").avatar_id(), None);
        assert_eq!(
            contributor("https://example.com/avatars/octocat.png").avatar_id(),
            None
        );
        assert_eq!(contributor("https://example.com/u/abc").avatar_id(), None);
    }

    #[test]
    fn test_contributor_ignores_extra_upstream_fields() {
        let json = r#"{
            "login": "octocat",
            "id": 583231,
            "node_id": "MDQ6VXNlcjU4MzIzMQ==",
            "avatar_url": "https://avatars.githubusercontent.com/u/583231?v=4",
            "html_url": "https://github.com/octocat",
            "type": "User",
            "site_admin": false,
            "contributions": 128
        }"#;

        let c: Contributor = serde_json::from_str(json).unwrap();
        assert_eq!(c.login, "octocat");
        assert_eq!(c.contributions, 128);

        let out = serde_json::to_value(&c).unwrap();
        let keys: Vec<_> = out.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 4);
        assert_eq!(out["avatar_url"], c.avatar_url.as_str());
    }
}
