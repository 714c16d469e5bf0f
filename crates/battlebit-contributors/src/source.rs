//! Upstream contributor sources

use crate::error::{ContributorError, Result};
use crate::types::Contributor;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Default GitHub REST API base URL
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

const CLIENT_USER_AGENT: &str = concat!("battlebit-site/", env!("CARGO_PKG_VERSION"));

/// A system that supplies a list of contributors
#[async_trait]
pub trait ContributorSource: Send + Sync {
    /// Human-readable identifier used in logs and refresh reports
    fn name(&self) -> &str;

    /// Fetch the full contributor list from this source
    async fn fetch(&self) -> Result<Vec<Contributor>>;
}

/// Contributors of one GitHub repository
pub struct GithubRepoSource {
    client: Client,
    api_url: String,
    name: String,
    token: Option<String>,
}

impl GithubRepoSource {
    /// Create a source for `owner/repo` against the public GitHub API
    pub fn new(owner: &str, repo: &str, timeout: Duration) -> Self {
        Self::with_api_url(DEFAULT_GITHUB_API_URL, owner, repo, timeout)
    }

    /// Create a source against a custom API base (GitHub Enterprise, tests)
    pub fn with_api_url(api_url: &str, owner: &str, repo: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            name: format!("{}/{}", owner, repo),
            token: None,
        }
    }

    /// Authenticate requests with a token (raises the API rate limit)
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn contributors_url(&self) -> String {
        format!("{}/repos/{}/contributors?per_page=100", self.api_url, self.name)
    }
}

#[async_trait]
impl ContributorSource for GithubRepoSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<Contributor>> {
        let url = self.contributors_url();
        debug!(source = %self.name, url = %url, "Fetching contributors");

        let mut request = self
            .client
            .get(&url)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .header(ACCEPT, "application/vnd.github+json");
        if let Some(ref token) = self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(ContributorError::Status {
                source: self.name.clone(),
                status: response.status().as_u16(),
            });
        }

        let body = response.bytes().await.map_err(ContributorError::Http)?;
        let contributors: Vec<Contributor> = serde_json::from_slice(&body)?;

        debug!(source = %self.name, count = contributors.len(), "Fetched contributors");
        Ok(contributors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avatar::tests::StubFetcher;
    use crate::avatar::AvatarCache;
    use crate::cache::ContributorCache;
    use crate::filter::ContributorFilter;
    use axum::{body::Body, http::StatusCode, routing::get, Json, Router};
    use bytes::Bytes;
    use futures::stream::{self, StreamExt};
    use serde_json::json;
    use std::sync::Arc;

    /// Serve a router on an ephemeral port and return its base URL
    async fn spawn_upstream(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_contributors_url() {
        let source = GithubRepoSource::with_api_url(
            "https://api.github.com/",
            "BattleBit-Community-Servers",
            "BattleBitAPIRunner",
            Duration::from_secs(5),
        );
        assert_eq!(source.name(), "BattleBit-Community-Servers/BattleBitAPIRunner");
        assert_eq!(
            source.contributors_url(),
            "https://api.github.com/repos/BattleBit-Community-Servers/BattleBitAPIRunner/contributors?per_page=100"
        );
    }

    #[tokio::test]
    async fn test_fetch_parses_contributors() {
        let router = Router::new().route(
            "/repos/org/repo/contributors",
            get(|| async {
                Json(json!([
                    {
                        "login": "alice",
                        "id": 1,
                        "avatar_url": "https://avatars.githubusercontent.com/u/1?v=4",
                        "html_url": "https://github.com/alice",
                        "contributions": 10
                    },
                    {
                        "login": "dependabot[bot]",
                        "id": 2,
                        "avatar_url": "https://avatars.githubusercontent.com/in/29110?v=4",
                        "html_url": "https://github.com/apps/dependabot",
                        "contributions": 4
                    }
                ]))
            }),
        );
        let base = spawn_upstream(router).await;

        let source = GithubRepoSource::with_api_url(&base, "org", "repo", Duration::from_secs(5));
        let contributors = source.fetch().await.unwrap();

        assert_eq!(contributors.len(), 2);
        assert_eq!(contributors[0].login, "alice");
        assert_eq!(contributors[0].contributions, 10);
        assert_eq!(contributors[1].login, "dependabot[bot]");
    }

    #[tokio::test]
    async fn test_fetch_non_success_status_is_source_local() {
        let router = Router::new().route(
            "/repos/org/repo/contributors",
            get(|| async { (StatusCode::FORBIDDEN, "rate limit exceeded") }),
        );
        let base = spawn_upstream(router).await;

        let source = GithubRepoSource::with_api_url(&base, "org", "repo", Duration::from_secs(5));
        let err = source.fetch().await.unwrap_err();

        assert!(matches!(err, ContributorError::Status { status: 403, .. }));
        assert!(err.is_source_local());
    }

    #[tokio::test]
    async fn test_fetch_malformed_payload_is_decode_error() {
        let router = Router::new().route(
            "/repos/org/repo/contributors",
            get(|| async { Json(json!({ "message": "Not an array" })) }),
        );
        let base = spawn_upstream(router).await;

        let source = GithubRepoSource::with_api_url(&base, "org", "repo", Duration::from_secs(5));
        let err = source.fetch().await.unwrap_err();

        assert!(matches!(err, ContributorError::Decode(_)));
        assert!(!err.is_source_local());
    }

    /// Upstream that sends the headers and an opening bracket, then stalls
    fn stalled_body_router() -> Router {
        Router::new().route(
            "/repos/org/stalled/contributors",
            get(|| async {
                let opening = async { Ok::<_, std::io::Error>(Bytes::from_static(b"[")) };
                let chunks = stream::once(opening).chain(stream::once(async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(Bytes::from_static(b"]"))
                }));
                Body::from_stream(chunks)
            }),
        )
    }

    #[tokio::test]
    async fn test_fetch_body_timeout_is_source_local() {
        let base = spawn_upstream(stalled_body_router()).await;

        let source =
            GithubRepoSource::with_api_url(&base, "org", "stalled", Duration::from_millis(500));
        let err = source.fetch().await.unwrap_err();

        assert!(matches!(err, ContributorError::Http(_)));
        assert!(err.is_source_local());
    }

    #[tokio::test]
    async fn test_body_timeout_keeps_other_sources() {
        let router = stalled_body_router().route(
            "/repos/org/healthy/contributors",
            get(|| async {
                Json(json!([{
                    "login": "alice",
                    "avatar_url": "https://avatars.githubusercontent.com/u/1?v=4",
                    "html_url": "https://github.com/alice",
                    "contributions": 3
                }]))
            }),
        );
        let base = spawn_upstream(router).await;
        let timeout = Duration::from_millis(500);

        let sources: Vec<Arc<dyn ContributorSource>> = vec![
            Arc::new(GithubRepoSource::with_api_url(&base, "org", "healthy", timeout)),
            Arc::new(GithubRepoSource::with_api_url(&base, "org", "stalled", timeout)),
        ];
        let cache = ContributorCache::new(
            sources,
            ContributorFilter::new(Vec::<String>::new()),
            Arc::new(AvatarCache::new(Arc::new(StubFetcher::default()))),
        );

        let report = cache.refresh().await.unwrap();

        assert_eq!(report.failed_sources, vec!["org/stalled"]);
        let snapshot = cache.get().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].login, "alice");
    }

    #[tokio::test]
    async fn test_fetch_unreachable_is_source_local() {
        // Bind then drop to get a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let source = GithubRepoSource::with_api_url(
            &format!("http://{}", addr),
            "org",
            "repo",
            Duration::from_secs(2),
        );
        let err = source.fetch().await.unwrap_err();

        assert!(matches!(err, ContributorError::Http(_)));
        assert!(err.is_source_local());
    }
}
